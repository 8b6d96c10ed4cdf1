use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use escrow_core::EscrowConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_STATE_FILE: &str = "escrow-state.json";

/// Operator settings: where the ledger state lives plus the ledger config.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CliConfig {
    pub state: PathBuf,
    pub escrow: EscrowConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            state: PathBuf::from(DEFAULT_STATE_FILE),
            escrow: EscrowConfig::default(),
        }
    }
}

impl CliConfig {
    /// File (if any), then environment, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.merge_with_env()?;
        config
            .escrow
            .validate()
            .context("invalid escrow configuration")?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&content)
                .with_context(|| format!("invalid TOML in {}", path.display())),
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("invalid JSON in {}", path.display())),
            _ => bail!("unsupported config format: {}", path.display()),
        }
    }

    pub fn merge_with_env(&mut self) -> Result<()> {
        if let Ok(state) = env::var("VOUCHER_ESCROW_STATE") {
            self.state = PathBuf::from(state);
        }
        if let Ok(ttl) = env::var("VOUCHER_ESCROW_VOUCHER_TTL_SECS") {
            self.escrow.voucher_ttl_secs = ttl
                .parse()
                .context("invalid VOUCHER_ESCROW_VOUCHER_TTL_SECS")?;
        }
        if let Ok(attesters) = env::var("VOUCHER_ESCROW_ATTESTERS") {
            self.escrow.trusted_attesters = attesters
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(())
    }
}

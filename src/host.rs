//! Local stand-in for the execution host: loads the ledger from a JSON state
//! file, runs one operation at a time, and writes the result back.

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{bail, Context, Result};
use ed25519_dalek::SigningKey;
use escrow_core::{
    Address, AttesterSet, EscrowConfig, EscrowEvent, EscrowLedger, Instruction, MemoryStore,
    StateSnapshot, TxContext,
};
use fd_lock::RwLock;
use tempfile::NamedTempFile;
use tracing::debug;

pub type Ledger = EscrowLedger<MemoryStore, AttesterSet>;

pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// A missing file is an empty ledger.
    pub fn load(&self, config: &EscrowConfig) -> Result<Ledger> {
        let verifier = config.attesters().context("loading trusted attesters")?;
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no state file, starting empty ledger");
            return Ok(EscrowLedger::new(
                MemoryStore::new(),
                verifier,
                config.clone(),
            ));
        }
        let bytes = fs::read(&self.path)
            .with_context(|| format!("failed to read state {}", self.path.display()))?;
        let snapshot = StateSnapshot::from_json(&bytes)
            .with_context(|| format!("corrupt state {}", self.path.display()))?;
        Ok(EscrowLedger::from_snapshot(snapshot, verifier, config.clone()))
    }

    /// Write to a fresh temp file beside the state and rename it over the old
    /// one, so readers only ever see a whole snapshot.
    pub fn save(&self, ledger: &Ledger) -> Result<()> {
        let bytes = ledger.snapshot().to_json()?;
        let dir = self.dir();
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }

    /// Run `f` against the ledger under an exclusive lock on `<state>.lock`.
    /// Invocations sharing a state file are serialized; the state is written
    /// back only if `f` succeeds.
    pub fn transact<T>(
        &self,
        config: &EscrowConfig,
        f: impl FnOnce(&mut Ledger) -> Result<T>,
    ) -> Result<T> {
        let dir = self.dir();
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
        let lock_path = self.lock_path();
        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("failed to open {}", lock_path.display()))?;
        let mut lock = RwLock::new(lock_file);
        let _guard = lock
            .write()
            .with_context(|| format!("failed to lock {}", lock_path.display()))?;

        let mut ledger = self.load(config)?;
        let out = f(&mut ledger)?;
        self.save(&ledger)?;
        Ok(out)
    }

    /// Load, execute one instruction, and persist only if it committed.
    pub fn execute(
        &self,
        config: &EscrowConfig,
        ctx: &TxContext,
        instruction: &Instruction,
    ) -> Result<EscrowEvent> {
        self.transact(config, |ledger| {
            ledger
                .execute(ctx, instruction)
                .with_context(|| format!("{} failed", instruction.name()))
        })
    }
}

pub fn unix_now() -> Result<i64> {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before unix epoch")?
        .as_secs();
    i64::try_from(secs).context("clock out of range")
}

pub fn parse_sk_hex(sk_hex: &str) -> Result<SigningKey> {
    let sk_bytes = hex::decode(sk_hex.trim()).context("invalid sk-hex")?;
    if sk_bytes.len() != 32 {
        bail!("sk-hex must be 32 bytes (64 hex chars)");
    }
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&sk_bytes);
    Ok(SigningKey::from_bytes(&arr))
}

/// `--sk-hex` wins over `--key`; one of them is required.
pub fn load_signer(sk_hex: Option<&str>, key_file: Option<&Path>) -> Result<SigningKey> {
    match (sk_hex, key_file) {
        (Some(hex), _) => parse_sk_hex(hex),
        (None, Some(path)) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read key {}", path.display()))?;
            parse_sk_hex(&content)
        }
        (None, None) => bail!("a signing key is required (--sk-hex or --key)"),
    }
}

pub fn identity(key: &SigningKey) -> Address {
    Address::from(&key.verifying_key())
}

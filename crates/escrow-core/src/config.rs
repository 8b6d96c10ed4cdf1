use serde::{Deserialize, Serialize};

use crate::attestation::AttesterSet;
use crate::error::EscrowError;

pub const DEFAULT_VOUCHER_TTL_SECS: i64 = 30 * 24 * 60 * 60;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EscrowConfig {
    /// Lifetime of a voucher from creation until it may be expired.
    pub voucher_ttl_secs: i64,
    /// Hex ed25519 public keys whose recipient proofs are accepted.
    pub trusted_attesters: Vec<String>,
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            voucher_ttl_secs: DEFAULT_VOUCHER_TTL_SECS,
            trusted_attesters: Vec::new(),
        }
    }
}

impl EscrowConfig {
    pub fn validate(&self) -> Result<(), EscrowError> {
        if self.voucher_ttl_secs <= 0 {
            return Err(EscrowError::InvalidConfig(format!(
                "voucher_ttl_secs must be positive, got {}",
                self.voucher_ttl_secs
            )));
        }
        self.attesters().map(|_| ())
    }

    pub fn attesters(&self) -> Result<AttesterSet, EscrowError> {
        AttesterSet::from_hex_keys(&self.trusted_attesters)
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::EscrowError;

pub const ORGANIZATION_SEED: &[u8] = b"organization";
pub const VOUCHER_SEED: &[u8] = b"voucher";

/// Upper bound on a single seed, in bytes.
pub const MAX_SEED_LEN: usize = 64;
pub const MAX_SEEDS: usize = 16;

/// 32-byte account address. Identities (ed25519 public keys) share the
/// same space, so an address doubles as the key of whoever owns a wallet.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; 32]);

impl Address {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s.trim(), &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<&ed25519_dalek::VerifyingKey> for Address {
    fn from(key: &ed25519_dalek::VerifyingKey) -> Self {
        Self(key.to_bytes())
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", &self.to_hex()[..12])
    }
}

impl FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_hex(&encoded).map_err(D::Error::custom)
    }
}

/// `sha256(tag ‖ seed_0 ‖ seed_1 ‖ …)`.
///
/// Pure and deterministic; fails only on malformed seed encoding.
pub fn derive_address(tag: &[u8], seeds: &[&[u8]]) -> Result<Address, EscrowError> {
    if seeds.len() > MAX_SEEDS {
        return Err(EscrowError::TooManySeeds {
            count: seeds.len(),
            max: MAX_SEEDS,
        });
    }
    let mut hasher = Sha256::new();
    hasher.update(tag);
    for seed in seeds {
        if seed.len() > MAX_SEED_LEN {
            return Err(EscrowError::SeedTooLong {
                len: seed.len(),
                max: MAX_SEED_LEN,
            });
        }
        hasher.update(seed);
    }
    Ok(Address(hasher.finalize().into()))
}

pub fn organization_address(org_external_id: u64) -> Address {
    // an 8-byte seed can never exceed the bound
    let seed = org_external_id.to_le_bytes();
    let mut hasher = Sha256::new();
    hasher.update(ORGANIZATION_SEED);
    hasher.update(seed);
    Address(hasher.finalize().into())
}

pub fn voucher_address(voucher_id: &str) -> Result<Address, EscrowError> {
    derive_address(VOUCHER_SEED, &[voucher_id.as_bytes()])
}

/// Recompute `expected` and reject the caller-supplied `actual` unless they agree.
pub fn ensure_address(
    slot: &'static str,
    expected: Address,
    actual: Address,
) -> Result<(), EscrowError> {
    if expected != actual {
        tracing::debug!(slot, %expected, %actual, "address substitution rejected");
        return Err(EscrowError::AddressMismatch {
            slot,
            expected,
            actual,
        });
    }
    Ok(())
}

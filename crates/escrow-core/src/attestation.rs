//! Recipient proofs.
//!
//! The ledger never authenticates a GitHub account itself. An off-ledger
//! attester that has done so signs a statement binding the external id to the
//! voucher and to the identity that will receive the payout; redemption only
//! checks that statement.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::address::Address;
use crate::error::EscrowError;

const PROOF_DOMAIN: &[u8] = b"voucher-redeem";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipientProof {
    pub recipient_external_id: u64,
    pub attester: Address,
    #[serde(with = "hex_signature")]
    pub signature: Vec<u8>,
}

impl RecipientProof {
    pub fn digest(voucher: &Address, recipient: &Address, recipient_external_id: u64) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(PROOF_DOMAIN);
        hasher.update(voucher.as_bytes());
        hasher.update(recipient.as_bytes());
        hasher.update(recipient_external_id.to_le_bytes());
        hasher.finalize().into()
    }

    pub fn sign(
        attester: &SigningKey,
        voucher: &Address,
        recipient: &Address,
        recipient_external_id: u64,
    ) -> Self {
        let digest = Self::digest(voucher, recipient, recipient_external_id);
        let signature = attester.sign(&digest);
        Self {
            recipient_external_id,
            attester: Address::from(&attester.verifying_key()),
            signature: signature.to_bytes().to_vec(),
        }
    }
}

/// Turns a proof into a verified external id, or refuses.
pub trait IdentityVerifier {
    fn verify(
        &self,
        proof: &RecipientProof,
        voucher: &Address,
        recipient: &Address,
    ) -> Result<u64, EscrowError>;
}

/// Accepts proofs signed by any key in the set.
#[derive(Clone, Debug, Default)]
pub struct AttesterSet {
    keys: Vec<VerifyingKey>,
}

impl AttesterSet {
    pub fn new(keys: Vec<VerifyingKey>) -> Self {
        Self { keys }
    }

    pub fn from_hex_keys<I, T>(keys: I) -> Result<Self, EscrowError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut parsed = Vec::new();
        for key in keys {
            let addr = Address::from_hex(key.as_ref())
                .map_err(|e| EscrowError::InvalidConfig(format!("bad attester key: {e}")))?;
            let vk = VerifyingKey::from_bytes(addr.as_bytes())
                .map_err(|_| EscrowError::InvalidConfig(format!("bad attester key: {addr}")))?;
            parsed.push(vk);
        }
        Ok(Self::new(parsed))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl IdentityVerifier for AttesterSet {
    fn verify(
        &self,
        proof: &RecipientProof,
        voucher: &Address,
        recipient: &Address,
    ) -> Result<u64, EscrowError> {
        let key = self
            .keys
            .iter()
            .find(|k| Address::from(*k) == proof.attester)
            .ok_or_else(|| {
                EscrowError::InvalidProof(format!("untrusted attester {}", proof.attester))
            })?;
        let signature = Signature::from_slice(&proof.signature)
            .map_err(|_| EscrowError::InvalidProof("malformed signature".into()))?;
        let digest = RecipientProof::digest(voucher, recipient, proof.recipient_external_id);
        key.verify_strict(&digest, &signature)
            .map_err(|_| EscrowError::InvalidProof("signature does not verify".into()))?;
        Ok(proof.recipient_external_id)
    }
}

mod hex_signature {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        hex::decode(&encoded).map_err(D::Error::custom)
    }
}

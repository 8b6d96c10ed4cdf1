use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::address::Address;
use crate::error::EscrowError;
use crate::events::EscrowEvent;
use crate::state::AccountRecord;

/// Durable keyed storage provided by the host.
///
/// `commit` must apply the whole batch or nothing; the ledger relies on it
/// for per-operation atomicity and never commits a failed operation.
pub trait AccountStore {
    fn get(&self, address: &Address) -> Option<AccountRecord>;

    fn commit(&mut self, writes: BTreeMap<Address, AccountRecord>) -> Result<(), EscrowError>;

    fn records(&self) -> Vec<(Address, AccountRecord)>;

    fn contains(&self, address: &Address) -> bool {
        self.get(address).is_some()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStore {
    accounts: BTreeMap<Address, AccountRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(accounts: BTreeMap<Address, AccountRecord>) -> Self {
        Self { accounts }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl AccountStore for MemoryStore {
    fn get(&self, address: &Address) -> Option<AccountRecord> {
        self.accounts.get(address).cloned()
    }

    fn commit(&mut self, writes: BTreeMap<Address, AccountRecord>) -> Result<(), EscrowError> {
        self.accounts.extend(writes);
        Ok(())
    }

    fn records(&self) -> Vec<(Address, AccountRecord)> {
        self.accounts
            .iter()
            .map(|(address, record)| (*address, record.clone()))
            .collect()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SnapshotMeta {
    pub height: u64,
    pub timestamp: i64,
}

/// Serializable image of a store plus the ledger journal.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateSnapshot {
    pub meta: SnapshotMeta,
    pub accounts: BTreeMap<Address, AccountRecord>,
    pub events: Vec<EscrowEvent>,
    #[serde(with = "hex_root")]
    pub state_root: [u8; 32],
}

impl StateSnapshot {
    pub fn capture<S: AccountStore + ?Sized>(
        store: &S,
        meta: SnapshotMeta,
        events: Vec<EscrowEvent>,
    ) -> Self {
        let accounts: BTreeMap<_, _> = store.records().into_iter().collect();
        let state_root = snapshot_root(&meta, &accounts, &events);
        Self {
            meta,
            accounts,
            events,
            state_root,
        }
    }

    /// Recompute the root and compare it with the recorded one. The root
    /// covers the accounts, the meta and the journal.
    pub fn verify_root(&self) -> Result<(), EscrowError> {
        let actual = snapshot_root(&self.meta, &self.accounts, &self.events);
        if actual != self.state_root {
            return Err(EscrowError::Storage(format!(
                "state root mismatch: recorded {}, computed {}",
                hex::encode(self.state_root),
                hex::encode(actual)
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<Vec<u8>, EscrowError> {
        serde_json::to_vec_pretty(self).map_err(|e| EscrowError::Storage(e.to_string()))
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, EscrowError> {
        let snapshot: Self =
            serde_json::from_slice(bytes).map_err(|e| EscrowError::Storage(e.to_string()))?;
        snapshot.verify_root()?;
        Ok(snapshot)
    }
}

pub fn compute_state_root(accounts: &BTreeMap<Address, AccountRecord>) -> [u8; 32] {
    let mut leaves: Vec<[u8; 32]> = Vec::with_capacity(accounts.len());
    for (address, record) in accounts {
        let mut hasher = Sha256::new();
        hasher.update(record.kind().as_bytes());
        hasher.update(address.as_bytes());
        // records are plain data, serialization cannot fail
        hasher.update(serde_json::to_vec(record).unwrap_or_default());
        leaves.push(hasher.finalize().into());
    }
    build_merkle(leaves)
}

/// Root over the account records, the journal and the height/timestamp meta.
pub fn snapshot_root(
    meta: &SnapshotMeta,
    accounts: &BTreeMap<Address, AccountRecord>,
    events: &[EscrowEvent],
) -> [u8; 32] {
    let journal: Vec<[u8; 32]> = events
        .iter()
        .map(|event| {
            let mut hasher = Sha256::new();
            hasher.update(b"event");
            hasher.update(serde_json::to_vec(event).unwrap_or_default());
            hasher.finalize().into()
        })
        .collect();

    let mut hasher = Sha256::new();
    hasher.update(b"snapshot");
    hasher.update(compute_state_root(accounts));
    hasher.update(meta.height.to_le_bytes());
    hasher.update(meta.timestamp.to_le_bytes());
    hasher.update(build_merkle(journal));
    hasher.finalize().into()
}

fn build_merkle(mut leaves: Vec<[u8; 32]>) -> [u8; 32] {
    if leaves.is_empty() {
        return Sha256::digest(b"escrow-ledger-empty").into();
    }
    while leaves.len() > 1 {
        let mut next = Vec::with_capacity(leaves.len().div_ceil(2));
        for chunk in leaves.chunks(2) {
            let mut hasher = Sha256::new();
            hasher.update(b"node");
            hasher.update(chunk[0]);
            hasher.update(chunk.get(1).unwrap_or(&chunk[0]));
            next.push(hasher.finalize().into());
        }
        leaves = next;
    }
    leaves[0]
}

mod hex_root {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        let mut out = [0u8; 32];
        hex::decode_to_slice(&encoded, &mut out).map_err(D::Error::custom)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::WalletAccount;

    fn wallet(lamports: u64) -> AccountRecord {
        AccountRecord::Wallet(WalletAccount { lamports })
    }

    #[test]
    fn state_root_is_deterministic_and_sensitive() {
        let mut store = MemoryStore::new();
        let mut writes = BTreeMap::new();
        writes.insert(Address::new([1; 32]), wallet(10));
        writes.insert(Address::new([2; 32]), wallet(20));
        store.commit(writes).unwrap();

        let a = StateSnapshot::capture(&store, SnapshotMeta::default(), vec![]);
        let b = StateSnapshot::capture(&store, SnapshotMeta::default(), vec![]);
        assert_eq!(a.state_root, b.state_root);

        let mut writes = BTreeMap::new();
        writes.insert(Address::new([2; 32]), wallet(21));
        store.commit(writes).unwrap();
        let c = StateSnapshot::capture(&store, SnapshotMeta::default(), vec![]);
        assert_ne!(a.state_root, c.state_root);
    }

    #[test]
    fn tampered_snapshot_is_rejected() {
        let mut store = MemoryStore::new();
        let mut writes = BTreeMap::new();
        writes.insert(Address::new([1; 32]), wallet(10));
        store.commit(writes).unwrap();
        let mut snapshot = StateSnapshot::capture(&store, SnapshotMeta::default(), vec![]);
        let bytes = snapshot.to_json().unwrap();
        assert_eq!(StateSnapshot::from_json(&bytes).unwrap(), snapshot);

        snapshot
            .accounts
            .insert(Address::new([1; 32]), wallet(1_000_000));
        let bytes = snapshot.to_json().unwrap();
        assert!(matches!(
            StateSnapshot::from_json(&bytes),
            Err(EscrowError::Storage(_))
        ));
    }

    #[test]
    fn edited_meta_or_journal_is_rejected() {
        let mut store = MemoryStore::new();
        let mut writes = BTreeMap::new();
        writes.insert(Address::new([1; 32]), wallet(10));
        store.commit(writes).unwrap();
        let meta = SnapshotMeta {
            height: 1,
            timestamp: 100,
        };
        let events = vec![EscrowEvent::Airdropped {
            wallet: Address::new([1; 32]),
            amount: 10,
        }];
        let snapshot = StateSnapshot::capture(&store, meta, events);
        snapshot.verify_root().unwrap();

        let mut taller = snapshot.clone();
        taller.meta.height = 7;
        assert!(taller.verify_root().is_err());

        let mut later = snapshot.clone();
        later.meta.timestamp = 101;
        assert!(later.verify_root().is_err());

        let mut rewritten = snapshot.clone();
        rewritten.events.clear();
        let bytes = rewritten.to_json().unwrap();
        assert!(matches!(
            StateSnapshot::from_json(&bytes),
            Err(EscrowError::Storage(_))
        ));
    }

    #[test]
    fn empty_store_has_fixed_root() {
        let root = compute_state_root(&BTreeMap::new());
        assert_eq!(root, <[u8; 32]>::from(Sha256::digest(b"escrow-ledger-empty")));
    }
}

use std::collections::{BTreeMap, BTreeSet};

use crate::address::Address;
use crate::error::EscrowError;
use crate::state::{AccountRecord, OrganizationAccount, VoucherAccount, WalletAccount};
use crate::store::AccountStore;

/// What the host guarantees to every operation: who authorized it and when
/// it runs. The host sequences operations one at a time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxContext {
    pub signers: BTreeSet<Address>,
    pub unix_timestamp: i64,
}

impl TxContext {
    pub fn new(signers: impl IntoIterator<Item = Address>, unix_timestamp: i64) -> Self {
        Self {
            signers: signers.into_iter().collect(),
            unix_timestamp,
        }
    }

    pub fn signed_by(signer: Address, unix_timestamp: i64) -> Self {
        Self::new([signer], unix_timestamp)
    }

    pub fn unsigned(unix_timestamp: i64) -> Self {
        Self {
            signers: BTreeSet::new(),
            unix_timestamp,
        }
    }

    pub fn require_signer(&self, slot: &'static str, identity: &Address) -> Result<(), EscrowError> {
        if !self.signers.contains(identity) {
            return Err(EscrowError::MissingSignature {
                slot,
                identity: *identity,
            });
        }
        Ok(())
    }
}

/// Write overlay over an [`AccountStore`].
///
/// Reads see the operation's own pending writes first. Nothing reaches the
/// store until the ledger commits the overlay, so dropping it discards the
/// whole operation.
pub struct Transaction<'a, S: AccountStore + ?Sized> {
    store: &'a S,
    ctx: &'a TxContext,
    writes: BTreeMap<Address, AccountRecord>,
}

impl<'a, S: AccountStore + ?Sized> Transaction<'a, S> {
    pub fn new(store: &'a S, ctx: &'a TxContext) -> Self {
        Self {
            store,
            ctx,
            writes: BTreeMap::new(),
        }
    }

    pub fn ctx(&self) -> &TxContext {
        self.ctx
    }

    pub fn now(&self) -> i64 {
        self.ctx.unix_timestamp
    }

    pub fn get(&self, address: &Address) -> Option<AccountRecord> {
        match self.writes.get(address) {
            Some(record) => Some(record.clone()),
            None => self.store.get(address),
        }
    }

    pub fn exists(&self, address: &Address) -> bool {
        self.writes.contains_key(address) || self.store.contains(address)
    }

    pub fn put(&mut self, address: Address, record: AccountRecord) {
        self.writes.insert(address, record);
    }

    pub fn organization(&self, address: &Address) -> Result<OrganizationAccount, EscrowError> {
        match self.get(address) {
            Some(AccountRecord::Organization(org)) => Ok(org),
            Some(_) => Err(EscrowError::AccountKindMismatch {
                address: *address,
                expected: "organization",
            }),
            None => Err(EscrowError::AccountNotFound { address: *address }),
        }
    }

    pub fn voucher(&self, address: &Address) -> Result<VoucherAccount, EscrowError> {
        match self.get(address) {
            Some(AccountRecord::Voucher(voucher)) => Ok(voucher),
            Some(_) => Err(EscrowError::AccountKindMismatch {
                address: *address,
                expected: "voucher",
            }),
            None => Err(EscrowError::AccountNotFound { address: *address }),
        }
    }

    /// Missing wallets read as empty; any identity can receive value.
    pub fn wallet(&self, address: &Address) -> Result<WalletAccount, EscrowError> {
        match self.get(address) {
            Some(AccountRecord::Wallet(wallet)) => Ok(wallet),
            Some(_) => Err(EscrowError::AccountKindMismatch {
                address: *address,
                expected: "wallet",
            }),
            None => Ok(WalletAccount::default()),
        }
    }

    pub fn put_organization(&mut self, address: Address, org: OrganizationAccount) {
        self.put(address, AccountRecord::Organization(org));
    }

    pub fn put_voucher(&mut self, address: Address, voucher: VoucherAccount) {
        self.put(address, AccountRecord::Voucher(voucher));
    }

    pub fn put_wallet(&mut self, address: Address, wallet: WalletAccount) {
        self.put(address, AccountRecord::Wallet(wallet));
    }

    pub fn into_writes(self) -> BTreeMap<Address, AccountRecord> {
        self.writes
    }
}

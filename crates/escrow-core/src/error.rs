use thiserror::Error;

use crate::address::Address;
use crate::state::VoucherStatus;

/// Every way a single ledger operation can be rejected.
///
/// A rejected operation never leaves a partial effect behind; the variants
/// only describe which check stopped it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EscrowError {
    /// An organization already lives at the derived address.
    #[error("organization {address} is already initialized")]
    AlreadyInitialized { address: Address },

    /// The caller supplied an account that does not match the recomputed address.
    #[error("address mismatch in `{slot}` slot: expected {expected}, got {actual}")]
    AddressMismatch {
        slot: &'static str,
        expected: Address,
        actual: Address,
    },

    /// The identity is neither the admin nor, where allowed, a listed maintainer.
    #[error("{identity} is not authorized to {action}")]
    Unauthorized {
        identity: Address,
        action: &'static str,
    },

    /// An identity slot was not signed for by the caller.
    #[error("identity {identity} in `{slot}` slot did not sign the operation")]
    MissingSignature {
        slot: &'static str,
        identity: Address,
    },

    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("arithmetic overflow updating balance of {account}")]
    Overflow { account: Address },

    #[error("insufficient funds in {account}: need {needed}, have {available}")]
    InsufficientFunds {
        account: Address,
        needed: u64,
        available: u64,
    },

    #[error("{identity} is already a maintainer")]
    AlreadyMaintainer { identity: Address },

    #[error("maintainer list is full (capacity {capacity})")]
    MaintainerListFull { capacity: usize },

    #[error("{identity} is not a maintainer")]
    UnknownMaintainer { identity: Address },

    /// A voucher already lives at the address derived from this id.
    #[error("voucher `{voucher_id}` already exists")]
    DuplicateVoucher { voucher_id: String },

    #[error("voucher is {actual}, expected {expected}")]
    InvalidStatus {
        expected: VoucherStatus,
        actual: VoucherStatus,
    },

    #[error("recipient identity mismatch: voucher is for {expected}, proof is for {actual}")]
    IdentityMismatch { expected: u64, actual: u64 },

    #[error("no account at {address}")]
    AccountNotFound { address: Address },

    #[error("account {address} is not a {expected} account")]
    AccountKindMismatch {
        address: Address,
        expected: &'static str,
    },

    #[error("seed of {len} bytes exceeds the {max} byte bound")]
    SeedTooLong { len: usize, max: usize },

    #[error("too many seeds: {count} (max {max})")]
    TooManySeeds { count: usize, max: usize },

    #[error("voucher id must not be empty")]
    EmptyVoucherId,

    #[error("voucher id is {len} bytes (max {max})")]
    VoucherIdTooLong { len: usize, max: usize },

    #[error("metadata is {len} bytes (max {max})")]
    MetadataTooLong { len: usize, max: usize },

    #[error("voucher expired at {expires_at} (now {now})")]
    VoucherExpired { expires_at: i64, now: i64 },

    #[error("voucher does not expire until {expires_at} (now {now})")]
    VoucherNotExpired { expires_at: i64, now: i64 },

    #[error("recipient proof rejected: {0}")]
    InvalidProof(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

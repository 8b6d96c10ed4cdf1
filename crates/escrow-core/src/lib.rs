//! Ledger state machine for the git voucher escrow.
//!
//! An organization pre-funds a shared balance, its admin authorizes a set of
//! maintainers, and maintainers move value out of that balance into
//! individually redeemable vouchers bound to an external (GitHub) identity.
//!
//! * [`address`]: deterministic account addressing from a namespace tag and
//!   seeds; there is no lookup table, every account is found by recomputing it.
//! * [`state`]: record layouts for organizations, vouchers and wallets.
//! * [`store`] / [`tx`]: the host side: keyed account storage, the transaction
//!   context handed to every operation, and the write overlay that makes each
//!   operation all-or-nothing.
//! * [`instruction`] / [`instructions`]: the operations themselves.
//! * [`attestation`]: recipient proofs checked at redemption.
//! * [`ledger`]: ties the pieces together and keeps the event journal.

pub mod address;
pub mod attestation;
pub mod config;
pub mod events;
pub mod instruction;
pub mod instructions;
pub mod ledger;
pub mod state;
pub mod store;
pub mod tx;

mod error;

pub use address::Address;
pub use attestation::{AttesterSet, IdentityVerifier, RecipientProof};
pub use config::EscrowConfig;
pub use error::EscrowError;
pub use events::EscrowEvent;
pub use instruction::Instruction;
pub use ledger::EscrowLedger;
pub use state::{AccountRecord, OrganizationAccount, VoucherAccount, VoucherStatus, WalletAccount};
pub use store::{AccountStore, MemoryStore, StateSnapshot};
pub use tx::{Transaction, TxContext};

/// Smallest-unit scale of the native token, for display only.
pub const NATIVE_SCALE: u64 = 1_000_000_000;

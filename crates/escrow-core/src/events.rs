use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Journal entry written for every committed operation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EscrowEvent {
    OrganizationInitialized {
        organization: Address,
        org_external_id: u64,
        admin: Address,
    },
    Deposited {
        organization: Address,
        depositor: Address,
        amount: u64,
        balance: u64,
    },
    MaintainerAdded {
        organization: Address,
        maintainer: Address,
        maintainers: usize,
    },
    MaintainerRemoved {
        organization: Address,
        maintainer: Address,
        maintainers: usize,
    },
    VoucherCreated {
        organization: Address,
        voucher: Address,
        voucher_id: String,
        recipient_external_id: u64,
        amount: u64,
        expires_at: i64,
    },
    VoucherRedeemed {
        voucher: Address,
        recipient: Address,
        recipient_external_id: u64,
        amount: u64,
    },
    VoucherCancelled {
        organization: Address,
        voucher: Address,
        amount: u64,
        balance: u64,
    },
    VoucherExpired {
        organization: Address,
        voucher: Address,
        amount: u64,
        balance: u64,
    },
    Withdrawn {
        organization: Address,
        admin: Address,
        amount: u64,
        balance: u64,
    },
    /// Host-level funding of a wallet; not produced by an operation.
    Airdropped { wallet: Address, amount: u64 },
}

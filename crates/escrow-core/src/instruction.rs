use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::attestation::RecipientProof;

/// Account slots shared by admin-only calls on an organization.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminAccounts {
    pub organization: Address,
    pub admin: Address,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DepositAccounts {
    pub organization: Address,
    pub depositor: Address,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssuerAccounts {
    pub organization: Address,
    pub voucher: Address,
    pub maintainer: Address,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RedeemAccounts {
    pub voucher: Address,
    pub recipient: Address,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExpireAccounts {
    pub organization: Address,
    pub voucher: Address,
}

/// A named call: fixed arguments plus caller-supplied account slots.
/// Every slot that names a ledger account is re-derived before use.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    InitializeOrganization {
        org_external_id: u64,
        accounts: AdminAccounts,
    },
    Deposit {
        amount: u64,
        accounts: DepositAccounts,
    },
    AddMaintainer {
        maintainer: Address,
        accounts: AdminAccounts,
    },
    RemoveMaintainer {
        maintainer: Address,
        accounts: AdminAccounts,
    },
    CreateVoucher {
        voucher_id: String,
        recipient_external_id: u64,
        amount: u64,
        metadata: String,
        accounts: IssuerAccounts,
    },
    RedeemVoucher {
        proof: RecipientProof,
        accounts: RedeemAccounts,
    },
    CancelVoucher {
        accounts: IssuerAccounts,
    },
    ExpireVoucher {
        accounts: ExpireAccounts,
    },
    Withdraw {
        amount: u64,
        accounts: AdminAccounts,
    },
}

impl Instruction {
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::InitializeOrganization { .. } => "initialize_organization",
            Instruction::Deposit { .. } => "deposit",
            Instruction::AddMaintainer { .. } => "add_maintainer",
            Instruction::RemoveMaintainer { .. } => "remove_maintainer",
            Instruction::CreateVoucher { .. } => "create_voucher",
            Instruction::RedeemVoucher { .. } => "redeem_voucher",
            Instruction::CancelVoucher { .. } => "cancel_voucher",
            Instruction::ExpireVoucher { .. } => "expire_voucher",
            Instruction::Withdraw { .. } => "withdraw",
        }
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::EscrowError;

pub const MAX_MAINTAINERS: usize = 10;
pub const MAX_VOUCHER_ID_LEN: usize = 64;
pub const MAX_METADATA_LEN: usize = 512;

/// Pooled balance, admin and maintainer set of one organization.
/// Address: `derive("organization", le8(org_external_id))`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrganizationAccount {
    pub org_external_id: u64,
    pub admin: Address,
    /// Liquid balance, smallest native unit.
    pub balance: u64,
    /// Insertion ordered, no duplicates, at most [`MAX_MAINTAINERS`].
    pub maintainers: Vec<Address>,
    pub total_vouchers_created: u64,
}

impl OrganizationAccount {
    /// Storage reserved at creation, sized for a full maintainer list.
    pub const SPACE: usize = 8 // discriminator
        + 8 // org_external_id
        + 32 // admin
        + 8 // balance
        + 4 + 32 * MAX_MAINTAINERS // maintainers
        + 8; // total_vouchers_created

    pub fn new(org_external_id: u64, admin: Address) -> Self {
        Self {
            org_external_id,
            admin,
            balance: 0,
            maintainers: Vec::with_capacity(MAX_MAINTAINERS),
            total_vouchers_created: 0,
        }
    }

    pub fn is_maintainer(&self, identity: &Address) -> bool {
        self.maintainers.contains(identity)
    }

    /// Admin has issuing authority by role, maintainers by list membership.
    pub fn can_issue(&self, identity: &Address) -> bool {
        self.admin == *identity || self.is_maintainer(identity)
    }

    pub fn add_maintainer(&mut self, identity: Address) -> Result<(), EscrowError> {
        if self.is_maintainer(&identity) {
            return Err(EscrowError::AlreadyMaintainer { identity });
        }
        if self.maintainers.len() >= MAX_MAINTAINERS {
            return Err(EscrowError::MaintainerListFull {
                capacity: MAX_MAINTAINERS,
            });
        }
        self.maintainers.push(identity);
        Ok(())
    }

    pub fn remove_maintainer(&mut self, identity: &Address) -> Result<(), EscrowError> {
        let before = self.maintainers.len();
        self.maintainers.retain(|m| m != identity);
        if self.maintainers.len() == before {
            return Err(EscrowError::UnknownMaintainer {
                identity: *identity,
            });
        }
        Ok(())
    }

    pub fn credit(&mut self, address: &Address, amount: u64) -> Result<(), EscrowError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(EscrowError::Overflow { account: *address })?;
        Ok(())
    }

    pub fn debit(&mut self, address: &Address, amount: u64) -> Result<(), EscrowError> {
        if self.balance < amount {
            return Err(EscrowError::InsufficientFunds {
                account: *address,
                needed: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VoucherStatus {
    Open,
    Redeemed,
    Cancelled,
    Expired,
}

impl VoucherStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, VoucherStatus::Open)
    }
}

impl fmt::Display for VoucherStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VoucherStatus::Open => "open",
            VoucherStatus::Redeemed => "redeemed",
            VoucherStatus::Cancelled => "cancelled",
            VoucherStatus::Expired => "expired",
        };
        f.write_str(name)
    }
}

/// One escrowed claim. Address: `derive("voucher", voucher_id)`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoucherAccount {
    pub voucher_id: String,
    /// Owning organization; re-checked by cancel and expire.
    pub organization: Address,
    pub recipient_external_id: u64,
    pub amount: u64,
    /// Opaque to the ledger.
    pub metadata: String,
    pub status: VoucherStatus,
    pub created_at: i64,
    pub expires_at: i64,
}

impl VoucherAccount {
    pub const SPACE: usize = 8 // discriminator
        + 4 + MAX_VOUCHER_ID_LEN // voucher_id
        + 32 // organization
        + 8 // recipient_external_id
        + 8 // amount
        + 4 + MAX_METADATA_LEN // metadata
        + 1 // status
        + 8 // created_at
        + 8; // expires_at

    pub fn ensure_open(&self) -> Result<(), EscrowError> {
        if self.status != VoucherStatus::Open {
            return Err(EscrowError::InvalidStatus {
                expected: VoucherStatus::Open,
                actual: self.status,
            });
        }
        Ok(())
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.expires_at
    }

    /// Move out of `Open`. Exactly one terminal transition is allowed.
    pub fn close(&mut self, status: VoucherStatus) -> Result<(), EscrowError> {
        self.ensure_open()?;
        debug_assert!(status.is_terminal());
        self.status = status;
        Ok(())
    }
}

/// Native-token holdings of an identity.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct WalletAccount {
    pub lamports: u64,
}

impl WalletAccount {
    pub fn credit(&mut self, address: &Address, amount: u64) -> Result<(), EscrowError> {
        self.lamports = self
            .lamports
            .checked_add(amount)
            .ok_or(EscrowError::Overflow { account: *address })?;
        Ok(())
    }

    pub fn debit(&mut self, address: &Address, amount: u64) -> Result<(), EscrowError> {
        if self.lamports < amount {
            return Err(EscrowError::InsufficientFunds {
                account: *address,
                needed: amount,
                available: self.lamports,
            });
        }
        self.lamports -= amount;
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccountRecord {
    Wallet(WalletAccount),
    Organization(OrganizationAccount),
    Voucher(VoucherAccount),
}

impl AccountRecord {
    pub fn kind(&self) -> &'static str {
        match self {
            AccountRecord::Wallet(_) => "wallet",
            AccountRecord::Organization(_) => "organization",
            AccountRecord::Voucher(_) => "voucher",
        }
    }

    /// Value held by the record that counts toward total supply.
    pub fn held_value(&self) -> u64 {
        match self {
            AccountRecord::Wallet(w) => w.lamports,
            AccountRecord::Organization(o) => o.balance,
            AccountRecord::Voucher(v) if v.status == VoucherStatus::Open => v.amount,
            AccountRecord::Voucher(_) => 0,
        }
    }
}

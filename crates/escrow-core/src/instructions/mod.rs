//! One handler per operation.
//!
//! Handlers validate first and write last; all writes go through the
//! [`Transaction`] overlay, so a handler that returns `Err` halfway leaves
//! nothing behind.

pub mod add_maintainer;
pub mod cancel_voucher;
pub mod create_voucher;
pub mod deposit;
pub mod expire_voucher;
pub mod initialize_organization;
pub mod redeem_voucher;
pub mod remove_maintainer;
pub mod withdraw;

use crate::address::{ensure_address, organization_address, voucher_address, Address};
use crate::error::EscrowError;
use crate::state::{AccountRecord, OrganizationAccount, VoucherAccount};
use crate::store::AccountStore;
use crate::tx::Transaction;

/// Load the organization in `address` and check it sits where its own
/// external id says it must.
pub(crate) fn load_organization<S: AccountStore + ?Sized>(
    tx: &Transaction<'_, S>,
    address: &Address,
) -> Result<OrganizationAccount, EscrowError> {
    let org = match tx.get(address) {
        Some(AccountRecord::Organization(org)) => org,
        // a voucher names the organization it was drawn from
        Some(AccountRecord::Voucher(voucher)) => {
            return Err(EscrowError::AddressMismatch {
                slot: "organization",
                expected: voucher.organization,
                actual: *address,
            })
        }
        _ => tx.organization(address)?,
    };
    ensure_address(
        "organization",
        organization_address(org.org_external_id),
        *address,
    )?;
    Ok(org)
}

/// Load the voucher in `address`, checking it against its own id.
pub(crate) fn load_voucher<S: AccountStore + ?Sized>(
    tx: &Transaction<'_, S>,
    address: &Address,
) -> Result<VoucherAccount, EscrowError> {
    let voucher = tx.voucher(address)?;
    ensure_address("voucher", voucher_address(&voucher.voucher_id)?, *address)?;
    Ok(voucher)
}

/// Load an organization together with one of its vouchers.
pub(crate) fn load_pair<S: AccountStore + ?Sized>(
    tx: &Transaction<'_, S>,
    organization: &Address,
    voucher: &Address,
) -> Result<(OrganizationAccount, VoucherAccount), EscrowError> {
    let org = load_organization(tx, organization)?;
    let voucher_account = load_voucher(tx, voucher)?;
    ensure_address("organization", voucher_account.organization, *organization)?;
    Ok((org, voucher_account))
}

pub(crate) fn ensure_admin(org: &OrganizationAccount, identity: &Address) -> Result<(), EscrowError> {
    if org.admin != *identity {
        return Err(EscrowError::Unauthorized {
            identity: *identity,
            action: "manage the organization",
        });
    }
    Ok(())
}

pub(crate) fn ensure_issuer(
    org: &OrganizationAccount,
    identity: &Address,
    action: &'static str,
) -> Result<(), EscrowError> {
    if !org.can_issue(identity) {
        return Err(EscrowError::Unauthorized {
            identity: *identity,
            action,
        });
    }
    Ok(())
}

pub(crate) fn ensure_positive(amount: u64) -> Result<(), EscrowError> {
    if amount == 0 {
        return Err(EscrowError::InvalidAmount);
    }
    Ok(())
}

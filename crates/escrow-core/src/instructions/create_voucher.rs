use super::{ensure_issuer, ensure_positive, load_organization};
use crate::address::{ensure_address, voucher_address};
use crate::error::EscrowError;
use crate::events::EscrowEvent;
use crate::instruction::IssuerAccounts;
use crate::state::{VoucherAccount, VoucherStatus, MAX_METADATA_LEN, MAX_VOUCHER_ID_LEN};
use crate::store::AccountStore;
use crate::tx::Transaction;

/// Caller-chosen voucher fields, frozen once the voucher exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoucherTerms<'a> {
    pub voucher_id: &'a str,
    pub recipient_external_id: u64,
    pub amount: u64,
    pub metadata: &'a str,
}

impl VoucherTerms<'_> {
    fn validate(&self) -> Result<(), EscrowError> {
        ensure_positive(self.amount)?;
        if self.voucher_id.is_empty() {
            return Err(EscrowError::EmptyVoucherId);
        }
        if self.voucher_id.len() > MAX_VOUCHER_ID_LEN {
            return Err(EscrowError::VoucherIdTooLong {
                len: self.voucher_id.len(),
                max: MAX_VOUCHER_ID_LEN,
            });
        }
        if self.metadata.len() > MAX_METADATA_LEN {
            return Err(EscrowError::MetadataTooLong {
                len: self.metadata.len(),
                max: MAX_METADATA_LEN,
            });
        }
        Ok(())
    }
}

/// Debit the organization and open a voucher at `derive("voucher", id)`.
/// Both writes land together or not at all.
pub fn handler<S: AccountStore + ?Sized>(
    tx: &mut Transaction<'_, S>,
    accounts: &IssuerAccounts,
    terms: &VoucherTerms<'_>,
    voucher_ttl_secs: i64,
) -> Result<EscrowEvent, EscrowError> {
    terms.validate()?;
    tx.ctx().require_signer("maintainer", &accounts.maintainer)?;
    let mut org = load_organization(tx, &accounts.organization)?;
    ensure_issuer(&org, &accounts.maintainer, "create vouchers")?;

    ensure_address("voucher", voucher_address(terms.voucher_id)?, accounts.voucher)?;
    if tx.exists(&accounts.voucher) {
        return Err(EscrowError::DuplicateVoucher {
            voucher_id: terms.voucher_id.to_string(),
        });
    }

    org.debit(&accounts.organization, terms.amount)?;
    org.total_vouchers_created = org
        .total_vouchers_created
        .checked_add(1)
        .ok_or(EscrowError::Overflow {
            account: accounts.organization,
        })?;

    let created_at = tx.now();
    let voucher = VoucherAccount {
        voucher_id: terms.voucher_id.to_string(),
        organization: accounts.organization,
        recipient_external_id: terms.recipient_external_id,
        amount: terms.amount,
        metadata: terms.metadata.to_string(),
        status: VoucherStatus::Open,
        created_at,
        expires_at: created_at.saturating_add(voucher_ttl_secs),
    };
    let expires_at = voucher.expires_at;

    tx.put_organization(accounts.organization, org);
    tx.put_voucher(accounts.voucher, voucher);

    Ok(EscrowEvent::VoucherCreated {
        organization: accounts.organization,
        voucher: accounts.voucher,
        voucher_id: terms.voucher_id.to_string(),
        recipient_external_id: terms.recipient_external_id,
        amount: terms.amount,
        expires_at,
    })
}

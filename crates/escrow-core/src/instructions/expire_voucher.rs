use super::load_pair;
use crate::error::EscrowError;
use crate::events::EscrowEvent;
use crate::instruction::ExpireAccounts;
use crate::state::VoucherStatus;
use crate::store::AccountStore;
use crate::tx::Transaction;

/// Permissionless once the voucher has outlived its window.
pub fn handler<S: AccountStore + ?Sized>(
    tx: &mut Transaction<'_, S>,
    accounts: &ExpireAccounts,
) -> Result<EscrowEvent, EscrowError> {
    let (mut org, mut voucher) = load_pair(tx, &accounts.organization, &accounts.voucher)?;
    voucher.ensure_open()?;
    let now = tx.now();
    if !voucher.is_expired_at(now) {
        return Err(EscrowError::VoucherNotExpired {
            expires_at: voucher.expires_at,
            now,
        });
    }

    voucher.close(VoucherStatus::Expired)?;
    org.credit(&accounts.organization, voucher.amount)?;

    let event = EscrowEvent::VoucherExpired {
        organization: accounts.organization,
        voucher: accounts.voucher,
        amount: voucher.amount,
        balance: org.balance,
    };
    tx.put_organization(accounts.organization, org);
    tx.put_voucher(accounts.voucher, voucher);
    Ok(event)
}

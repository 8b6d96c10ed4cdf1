use super::{ensure_admin, ensure_positive, load_organization};
use crate::error::EscrowError;
use crate::events::EscrowEvent;
use crate::instruction::AdminAccounts;
use crate::store::AccountStore;
use crate::tx::Transaction;

/// Admin pulls liquid balance back out. Escrowed voucher amounts are not
/// part of `balance` and cannot be withdrawn.
pub fn handler<S: AccountStore + ?Sized>(
    tx: &mut Transaction<'_, S>,
    accounts: &AdminAccounts,
    amount: u64,
) -> Result<EscrowEvent, EscrowError> {
    ensure_positive(amount)?;
    tx.ctx().require_signer("admin", &accounts.admin)?;
    let mut org = load_organization(tx, &accounts.organization)?;
    ensure_admin(&org, &accounts.admin)?;
    let mut wallet = tx.wallet(&accounts.admin)?;

    org.debit(&accounts.organization, amount)?;
    wallet.credit(&accounts.admin, amount)?;

    let balance = org.balance;
    tx.put_organization(accounts.organization, org);
    tx.put_wallet(accounts.admin, wallet);

    Ok(EscrowEvent::Withdrawn {
        organization: accounts.organization,
        admin: accounts.admin,
        amount,
        balance,
    })
}

use super::{ensure_positive, load_organization};
use crate::error::EscrowError;
use crate::events::EscrowEvent;
use crate::instruction::DepositAccounts;
use crate::store::AccountStore;
use crate::tx::Transaction;

/// Permissionless: anyone may fund the pool.
pub fn handler<S: AccountStore + ?Sized>(
    tx: &mut Transaction<'_, S>,
    accounts: &DepositAccounts,
    amount: u64,
) -> Result<EscrowEvent, EscrowError> {
    ensure_positive(amount)?;
    tx.ctx().require_signer("depositor", &accounts.depositor)?;
    let mut org = load_organization(tx, &accounts.organization)?;
    let mut wallet = tx.wallet(&accounts.depositor)?;

    org.credit(&accounts.organization, amount)?;
    wallet.debit(&accounts.depositor, amount)?;

    let balance = org.balance;
    tx.put_wallet(accounts.depositor, wallet);
    tx.put_organization(accounts.organization, org);

    Ok(EscrowEvent::Deposited {
        organization: accounts.organization,
        depositor: accounts.depositor,
        amount,
        balance,
    })
}

use super::{ensure_admin, load_organization};
use crate::address::Address;
use crate::error::EscrowError;
use crate::events::EscrowEvent;
use crate::instruction::AdminAccounts;
use crate::store::AccountStore;
use crate::tx::Transaction;

pub fn handler<S: AccountStore + ?Sized>(
    tx: &mut Transaction<'_, S>,
    accounts: &AdminAccounts,
    maintainer: Address,
) -> Result<EscrowEvent, EscrowError> {
    tx.ctx().require_signer("admin", &accounts.admin)?;
    let mut org = load_organization(tx, &accounts.organization)?;
    ensure_admin(&org, &accounts.admin)?;

    org.remove_maintainer(&maintainer)?;

    let maintainers = org.maintainers.len();
    tx.put_organization(accounts.organization, org);

    Ok(EscrowEvent::MaintainerRemoved {
        organization: accounts.organization,
        maintainer,
        maintainers,
    })
}

use crate::address::{ensure_address, organization_address};
use crate::error::EscrowError;
use crate::events::EscrowEvent;
use crate::instruction::AdminAccounts;
use crate::state::OrganizationAccount;
use crate::store::AccountStore;
use crate::tx::Transaction;

pub fn handler<S: AccountStore + ?Sized>(
    tx: &mut Transaction<'_, S>,
    accounts: &AdminAccounts,
    org_external_id: u64,
) -> Result<EscrowEvent, EscrowError> {
    tx.ctx().require_signer("admin", &accounts.admin)?;
    ensure_address(
        "organization",
        organization_address(org_external_id),
        accounts.organization,
    )?;
    // second initialization must fail, never reset
    if tx.exists(&accounts.organization) {
        return Err(EscrowError::AlreadyInitialized {
            address: accounts.organization,
        });
    }

    tx.put_organization(
        accounts.organization,
        OrganizationAccount::new(org_external_id, accounts.admin),
    );

    Ok(EscrowEvent::OrganizationInitialized {
        organization: accounts.organization,
        org_external_id,
        admin: accounts.admin,
    })
}

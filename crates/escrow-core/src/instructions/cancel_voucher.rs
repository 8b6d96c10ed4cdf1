use super::{ensure_issuer, load_pair};
use crate::error::EscrowError;
use crate::events::EscrowEvent;
use crate::instruction::IssuerAccounts;
use crate::state::VoucherStatus;
use crate::store::AccountStore;
use crate::tx::Transaction;

/// Return an open voucher's amount to its organization.
pub fn handler<S: AccountStore + ?Sized>(
    tx: &mut Transaction<'_, S>,
    accounts: &IssuerAccounts,
) -> Result<EscrowEvent, EscrowError> {
    tx.ctx().require_signer("maintainer", &accounts.maintainer)?;
    let (mut org, mut voucher) = load_pair(tx, &accounts.organization, &accounts.voucher)?;
    ensure_issuer(&org, &accounts.maintainer, "cancel vouchers")?;

    voucher.close(VoucherStatus::Cancelled)?;
    org.credit(&accounts.organization, voucher.amount)?;

    let event = EscrowEvent::VoucherCancelled {
        organization: accounts.organization,
        voucher: accounts.voucher,
        amount: voucher.amount,
        balance: org.balance,
    };
    tx.put_organization(accounts.organization, org);
    tx.put_voucher(accounts.voucher, voucher);
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{organization_address, voucher_address, Address};
    use crate::instructions::create_voucher::{self, VoucherTerms};
    use crate::instructions::fixtures::*;
    use crate::instructions::initialize_organization;
    use crate::instruction::AdminAccounts;
    use crate::store::{AccountStore, MemoryStore};
    use crate::tx::TxContext;

    fn issue(store: &mut MemoryStore, voucher_id: &str, amount: u64) {
        let ctx = TxContext::signed_by(maintainer(), 0);
        let mut tx = Transaction::new(&*store, &ctx);
        let accounts = accounts(voucher_id, maintainer());
        let terms = VoucherTerms {
            voucher_id,
            recipient_external_id: 1,
            amount,
            metadata: "",
        };
        create_voucher::handler(&mut tx, &accounts, &terms, 1_000).unwrap();
        let writes = tx.into_writes();
        store.commit(writes).unwrap();
    }

    fn accounts(voucher_id: &str, maintainer: Address) -> IssuerAccounts {
        IssuerAccounts {
            organization: organization_address(ORG_ID),
            voucher: voucher_address(voucher_id).unwrap(),
            maintainer,
        }
    }

    #[test]
    fn cancel_restores_balance_once() {
        let mut store = store_with_org(1_000, 0);
        issue(&mut store, "v1", 300);

        let ctx = TxContext::signed_by(maintainer(), 5);
        let mut tx = Transaction::new(&store, &ctx);
        let event = handler(&mut tx, &accounts("v1", maintainer())).unwrap();
        assert!(matches!(event, EscrowEvent::VoucherCancelled { balance: 1_000, .. }));
        assert_eq!(
            tx.voucher(&voucher_address("v1").unwrap()).unwrap().status,
            VoucherStatus::Cancelled
        );
        assert!(matches!(
            handler(&mut tx, &accounts("v1", maintainer())).unwrap_err(),
            EscrowError::InvalidStatus { .. }
        ));
        assert_eq!(
            tx.organization(&organization_address(ORG_ID)).unwrap().balance,
            1_000
        );
    }

    #[test]
    fn stranger_cannot_cancel() {
        let mut store = store_with_org(1_000, 0);
        issue(&mut store, "v1", 300);
        let ctx = TxContext::signed_by(stranger(), 5);
        let mut tx = Transaction::new(&store, &ctx);
        assert!(matches!(
            handler(&mut tx, &accounts("v1", stranger())).unwrap_err(),
            EscrowError::Unauthorized { .. }
        ));
    }

    #[test]
    fn voucher_of_another_organization_is_rejected() {
        let mut store = store_with_org(1_000, 0);
        issue(&mut store, "v1", 300);

        // a second organization run by the same admin
        let ctx = TxContext::signed_by(admin(), 0);
        let mut tx = Transaction::new(&store, &ctx);
        let init = AdminAccounts {
            organization: organization_address(99),
            admin: admin(),
        };
        initialize_organization::handler(&mut tx, &init, 99).unwrap();
        let writes = tx.into_writes();
        store.commit(writes).unwrap();

        let mut tx = Transaction::new(&store, &ctx);
        let wrong = IssuerAccounts {
            organization: organization_address(99),
            voucher: voucher_address("v1").unwrap(),
            maintainer: admin(),
        };
        let err = handler(&mut tx, &wrong).unwrap_err();
        assert_eq!(
            err,
            EscrowError::AddressMismatch {
                slot: "organization",
                expected: organization_address(ORG_ID),
                actual: organization_address(99)
            }
        );
    }
}

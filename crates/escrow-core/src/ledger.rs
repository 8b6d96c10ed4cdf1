use tracing::{debug, info, warn};

use crate::address::{organization_address, voucher_address, Address};
use crate::attestation::IdentityVerifier;
use crate::config::EscrowConfig;
use crate::error::EscrowError;
use crate::events::EscrowEvent;
use crate::instruction::Instruction;
use crate::instructions::{self, create_voucher::VoucherTerms};
use crate::state::{AccountRecord, OrganizationAccount, VoucherAccount};
use crate::store::{AccountStore, MemoryStore, SnapshotMeta, StateSnapshot};
use crate::tx::{Transaction, TxContext};

/// The ledger as the host sees it: a store, the recipient-proof verifier and
/// a journal of committed operations.
///
/// `execute` is the only way operations mutate state. Each call runs against
/// a fresh [`Transaction`] overlay and commits only on success, which is how
/// the all-or-nothing contract is met without any locking inside the core.
pub struct EscrowLedger<S: AccountStore, V: IdentityVerifier> {
    store: S,
    verifier: V,
    config: EscrowConfig,
    meta: SnapshotMeta,
    events: Vec<EscrowEvent>,
}

impl<S: AccountStore, V: IdentityVerifier> EscrowLedger<S, V> {
    pub fn new(store: S, verifier: V, config: EscrowConfig) -> Self {
        Self {
            store,
            verifier,
            config,
            meta: SnapshotMeta::default(),
            events: Vec::new(),
        }
    }

    pub fn execute(
        &mut self,
        ctx: &TxContext,
        instruction: &Instruction,
    ) -> Result<EscrowEvent, EscrowError> {
        let op = instruction.name();
        let outcome = {
            let mut tx = Transaction::new(&self.store, ctx);
            self.dispatch(&mut tx, instruction)
                .map(|event| (event, tx.into_writes()))
        };
        match outcome {
            Ok((event, writes)) => {
                debug!(op, writes = writes.len(), "committing");
                self.store.commit(writes)?;
                self.record(ctx.unix_timestamp, event.clone());
                info!(op, height = self.meta.height, ?event, "operation committed");
                Ok(event)
            }
            Err(err) => {
                warn!(op, error = %err, "operation rejected");
                Err(err)
            }
        }
    }

    fn dispatch(
        &self,
        tx: &mut Transaction<'_, S>,
        instruction: &Instruction,
    ) -> Result<EscrowEvent, EscrowError> {
        match instruction {
            Instruction::InitializeOrganization {
                org_external_id,
                accounts,
            } => instructions::initialize_organization::handler(tx, accounts, *org_external_id),
            Instruction::Deposit { amount, accounts } => {
                instructions::deposit::handler(tx, accounts, *amount)
            }
            Instruction::AddMaintainer {
                maintainer,
                accounts,
            } => instructions::add_maintainer::handler(tx, accounts, *maintainer),
            Instruction::RemoveMaintainer {
                maintainer,
                accounts,
            } => instructions::remove_maintainer::handler(tx, accounts, *maintainer),
            Instruction::CreateVoucher {
                voucher_id,
                recipient_external_id,
                amount,
                metadata,
                accounts,
            } => {
                let terms = VoucherTerms {
                    voucher_id,
                    recipient_external_id: *recipient_external_id,
                    amount: *amount,
                    metadata,
                };
                instructions::create_voucher::handler(
                    tx,
                    accounts,
                    &terms,
                    self.config.voucher_ttl_secs,
                )
            }
            Instruction::RedeemVoucher { proof, accounts } => {
                instructions::redeem_voucher::handler(tx, accounts, proof, &self.verifier)
            }
            Instruction::CancelVoucher { accounts } => {
                instructions::cancel_voucher::handler(tx, accounts)
            }
            Instruction::ExpireVoucher { accounts } => {
                instructions::expire_voucher::handler(tx, accounts)
            }
            Instruction::Withdraw { amount, accounts } => {
                instructions::withdraw::handler(tx, accounts, *amount)
            }
        }
    }

    /// Credit a wallet from outside the ledger (local faucet). Not an operation:
    /// it is the only way total supply grows.
    pub fn airdrop(
        &mut self,
        wallet: Address,
        amount: u64,
        unix_timestamp: i64,
    ) -> Result<EscrowEvent, EscrowError> {
        if amount == 0 {
            return Err(EscrowError::InvalidAmount);
        }
        let ctx = TxContext::unsigned(unix_timestamp);
        let writes = {
            let mut tx = Transaction::new(&self.store, &ctx);
            let mut account = tx.wallet(&wallet)?;
            account.credit(&wallet, amount)?;
            tx.put_wallet(wallet, account);
            tx.into_writes()
        };
        self.store.commit(writes)?;
        let event = EscrowEvent::Airdropped { wallet, amount };
        self.record(unix_timestamp, event.clone());
        info!(%wallet, amount, "airdrop");
        Ok(event)
    }

    fn record(&mut self, unix_timestamp: i64, event: EscrowEvent) {
        self.meta.height += 1;
        self.meta.timestamp = unix_timestamp;
        self.events.push(event);
    }

    pub fn organization(&self, address: &Address) -> Option<OrganizationAccount> {
        match self.store.get(address) {
            Some(AccountRecord::Organization(org)) => Some(org),
            _ => None,
        }
    }

    pub fn organization_by_id(&self, org_external_id: u64) -> Option<OrganizationAccount> {
        self.organization(&organization_address(org_external_id))
    }

    pub fn voucher(&self, address: &Address) -> Option<VoucherAccount> {
        match self.store.get(address) {
            Some(AccountRecord::Voucher(voucher)) => Some(voucher),
            _ => None,
        }
    }

    pub fn voucher_by_id(&self, voucher_id: &str) -> Option<VoucherAccount> {
        voucher_address(voucher_id)
            .ok()
            .and_then(|address| self.voucher(&address))
    }

    pub fn wallet_balance(&self, address: &Address) -> u64 {
        match self.store.get(address) {
            Some(AccountRecord::Wallet(wallet)) => wallet.lamports,
            _ => 0,
        }
    }

    /// Sum of wallets, organization balances and open voucher amounts.
    pub fn total_value(&self) -> u128 {
        self.store
            .records()
            .iter()
            .map(|(_, record)| u128::from(record.held_value()))
            .sum()
    }

    pub fn height(&self) -> u64 {
        self.meta.height
    }

    pub fn events(&self) -> &[EscrowEvent] {
        &self.events
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EscrowConfig {
        &self.config
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot::capture(&self.store, self.meta.clone(), self.events.clone())
    }
}

impl<V: IdentityVerifier> EscrowLedger<MemoryStore, V> {
    /// Rebuild a ledger from a snapshot whose state root has been checked.
    pub fn from_snapshot(snapshot: StateSnapshot, verifier: V, config: EscrowConfig) -> Self {
        Self {
            store: MemoryStore::from_records(snapshot.accounts),
            verifier,
            config,
            meta: snapshot.meta,
            events: snapshot.events,
        }
    }
}

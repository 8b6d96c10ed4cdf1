use super::load_voucher;
use crate::attestation::{IdentityVerifier, RecipientProof};
use crate::error::EscrowError;
use crate::events::EscrowEvent;
use crate::instruction::RedeemAccounts;
use crate::state::VoucherStatus;
use crate::store::AccountStore;
use crate::tx::Transaction;

/// Release an open voucher to the identity the proof vouches for.
pub fn handler<S, V>(
    tx: &mut Transaction<'_, S>,
    accounts: &RedeemAccounts,
    proof: &RecipientProof,
    verifier: &V,
) -> Result<EscrowEvent, EscrowError>
where
    S: AccountStore + ?Sized,
    V: IdentityVerifier + ?Sized,
{
    tx.ctx().require_signer("recipient", &accounts.recipient)?;
    let mut voucher = load_voucher(tx, &accounts.voucher)?;
    voucher.ensure_open()?;
    let now = tx.now();
    if voucher.is_expired_at(now) {
        return Err(EscrowError::VoucherExpired {
            expires_at: voucher.expires_at,
            now,
        });
    }

    let verified = verifier.verify(proof, &accounts.voucher, &accounts.recipient)?;
    if verified != voucher.recipient_external_id {
        return Err(EscrowError::IdentityMismatch {
            expected: voucher.recipient_external_id,
            actual: verified,
        });
    }

    let mut wallet = tx.wallet(&accounts.recipient)?;
    wallet.credit(&accounts.recipient, voucher.amount)?;
    voucher.close(VoucherStatus::Redeemed)?;

    let event = EscrowEvent::VoucherRedeemed {
        voucher: accounts.voucher,
        recipient: accounts.recipient,
        recipient_external_id: verified,
        amount: voucher.amount,
    };
    tx.put_wallet(accounts.recipient, wallet);
    tx.put_voucher(accounts.voucher, voucher);
    Ok(event)
}

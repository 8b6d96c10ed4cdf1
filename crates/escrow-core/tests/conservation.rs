use escrow_core::address::{organization_address, voucher_address};
use escrow_core::instruction::{
    AdminAccounts, DepositAccounts, ExpireAccounts, IssuerAccounts, RedeemAccounts,
};
use escrow_core::{
    Address, AttesterSet, EscrowConfig, EscrowEvent, EscrowLedger, Instruction, MemoryStore,
    RecipientProof, TxContext, VoucherStatus,
};

use ed25519_dalek::SigningKey;
use proptest::prelude::*;

const ORG_ID: u64 = 7;
const RECIPIENT_ID: u64 = 99;
const SUPPLY: u64 = 1_000_000;
const TTL: i64 = 50;

#[derive(Clone, Debug)]
enum Op {
    Deposit(u64),
    Create(u8, u64),
    Redeem(u8),
    Cancel(u8),
    Expire(u8),
    Withdraw(u64),
    Wait(i64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u64..200_000).prop_map(Op::Deposit),
        (0u8..6, 0u64..150_000).prop_map(|(id, amount)| Op::Create(id, amount)),
        (0u8..6).prop_map(Op::Redeem),
        (0u8..6).prop_map(Op::Cancel),
        (0u8..6).prop_map(Op::Expire),
        (0u64..100_000).prop_map(Op::Withdraw),
        (1i64..40).prop_map(Op::Wait),
    ]
}

fn voucher_id(idx: u8) -> String {
    format!("voucher-{idx}")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn value_is_conserved_under_any_sequence(ops in proptest::collection::vec(op(), 1..40)) {
        // fixed key keeps the property deterministic under shrinking
        let attester = SigningKey::from_bytes(&[7u8; 32]);
        let verifier = AttesterSet::new(vec![attester.verifying_key()]);
        let config = EscrowConfig { voucher_ttl_secs: TTL, ..EscrowConfig::default() };
        let mut ledger = EscrowLedger::new(MemoryStore::new(), verifier, config);

        let admin = Address::new([1; 32]);
        let recipient = Address::new([2; 32]);
        let org = organization_address(ORG_ID);
        let mut now = 0i64;

        ledger.airdrop(admin, SUPPLY, now).unwrap();
        ledger.execute(
            &TxContext::signed_by(admin, now),
            &Instruction::InitializeOrganization {
                org_external_id: ORG_ID,
                accounts: AdminAccounts { organization: org, admin },
            },
        ).unwrap();

        let (mut deposited, mut redeemed, mut withdrawn) = (0u64, 0u64, 0u64);

        for op in ops {
            let issuer = |idx: u8| IssuerAccounts {
                organization: org,
                voucher: voucher_address(&voucher_id(idx)).unwrap(),
                maintainer: admin,
            };
            let (signer, ix) = match op {
                Op::Wait(secs) => {
                    now += secs;
                    continue;
                }
                Op::Deposit(amount) => (Some(admin), Instruction::Deposit {
                    amount,
                    accounts: DepositAccounts { organization: org, depositor: admin },
                }),
                Op::Create(idx, amount) => (Some(admin), Instruction::CreateVoucher {
                    voucher_id: voucher_id(idx),
                    recipient_external_id: RECIPIENT_ID,
                    amount,
                    metadata: String::new(),
                    accounts: issuer(idx),
                }),
                Op::Redeem(idx) => {
                    let voucher = voucher_address(&voucher_id(idx)).unwrap();
                    let proof = RecipientProof::sign(&attester, &voucher, &recipient, RECIPIENT_ID);
                    (Some(recipient), Instruction::RedeemVoucher {
                        proof,
                        accounts: RedeemAccounts { voucher, recipient },
                    })
                }
                Op::Cancel(idx) => (Some(admin), Instruction::CancelVoucher { accounts: issuer(idx) }),
                Op::Expire(idx) => (None, Instruction::ExpireVoucher {
                    accounts: ExpireAccounts {
                        organization: org,
                        voucher: voucher_address(&voucher_id(idx)).unwrap(),
                    },
                }),
                Op::Withdraw(amount) => (Some(admin), Instruction::Withdraw {
                    amount,
                    accounts: AdminAccounts { organization: org, admin },
                }),
            };
            let ctx = match signer {
                Some(signer) => TxContext::signed_by(signer, now),
                None => TxContext::unsigned(now),
            };

            let before = ledger.snapshot();
            match ledger.execute(&ctx, &ix) {
                Ok(EscrowEvent::Deposited { amount, .. }) => deposited += amount,
                Ok(EscrowEvent::VoucherRedeemed { amount, .. }) => redeemed += amount,
                Ok(EscrowEvent::Withdrawn { amount, .. }) => withdrawn += amount,
                Ok(_) => {}
                Err(_) => {
                    prop_assert_eq!(ledger.snapshot(), before);
                }
            }

            let balance = ledger.organization(&org).unwrap().balance;
            let open: u64 = (0u8..6)
                .filter_map(|idx| ledger.voucher_by_id(&voucher_id(idx)))
                .filter(|v| v.status == VoucherStatus::Open)
                .map(|v| v.amount)
                .sum();
            prop_assert_eq!(balance + open, deposited - redeemed - withdrawn);
            prop_assert_eq!(ledger.total_value(), u128::from(SUPPLY));
        }
    }
}

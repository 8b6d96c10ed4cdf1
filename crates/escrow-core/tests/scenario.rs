use escrow_core::address::{organization_address, voucher_address};
use escrow_core::instruction::{
    AdminAccounts, DepositAccounts, ExpireAccounts, IssuerAccounts, RedeemAccounts,
};
use escrow_core::{
    Address, AttesterSet, EscrowConfig, EscrowError, EscrowLedger, Instruction, MemoryStore,
    RecipientProof, TxContext, VoucherStatus,
};

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;

const ORG_ID: u64 = 12345;
const RECIPIENT_ID: u64 = 67890;
const METADATA: &str = r#"{"repo":"owner/repo","pr":123}"#;

struct Harness {
    ledger: EscrowLedger<MemoryStore, AttesterSet>,
    attester: SigningKey,
    admin: Address,
    maintainer: Address,
    now: i64,
}

impl Harness {
    fn new() -> Self {
        let attester = SigningKey::generate(&mut OsRng);
        let verifier = AttesterSet::new(vec![attester.verifying_key()]);
        let config = EscrowConfig {
            voucher_ttl_secs: 3_600,
            ..EscrowConfig::default()
        };
        Self {
            ledger: EscrowLedger::new(MemoryStore::new(), verifier, config),
            attester,
            admin: Address::new([0x11; 32]),
            maintainer: Address::new([0x22; 32]),
            now: 1_700_000_000,
        }
    }

    fn org(&self) -> Address {
        organization_address(ORG_ID)
    }

    fn run(&mut self, signer: Address, ix: Instruction) -> Result<(), EscrowError> {
        self.ledger
            .execute(&TxContext::signed_by(signer, self.now), &ix)
            .map(|_| ())
    }

    fn init(&mut self) -> Result<(), EscrowError> {
        let ix = Instruction::InitializeOrganization {
            org_external_id: ORG_ID,
            accounts: AdminAccounts {
                organization: self.org(),
                admin: self.admin,
            },
        };
        self.run(self.admin, ix)
    }

    fn deposit(&mut self, amount: u64) -> Result<(), EscrowError> {
        let ix = Instruction::Deposit {
            amount,
            accounts: DepositAccounts {
                organization: self.org(),
                depositor: self.admin,
            },
        };
        self.run(self.admin, ix)
    }

    fn add_maintainer(&mut self, caller: Address, maintainer: Address) -> Result<(), EscrowError> {
        let ix = Instruction::AddMaintainer {
            maintainer,
            accounts: AdminAccounts {
                organization: self.org(),
                admin: caller,
            },
        };
        self.run(caller, ix)
    }

    fn create(&mut self, voucher_id: &str, amount: u64) -> Result<(), EscrowError> {
        let ix = Instruction::CreateVoucher {
            voucher_id: voucher_id.into(),
            recipient_external_id: RECIPIENT_ID,
            amount,
            metadata: METADATA.into(),
            accounts: IssuerAccounts {
                organization: self.org(),
                voucher: voucher_address(voucher_id).unwrap(),
                maintainer: self.maintainer,
            },
        };
        self.run(self.maintainer, ix)
    }

    fn cancel(&mut self, voucher_id: &str) -> Result<(), EscrowError> {
        let ix = Instruction::CancelVoucher {
            accounts: IssuerAccounts {
                organization: self.org(),
                voucher: voucher_address(voucher_id).unwrap(),
                maintainer: self.maintainer,
            },
        };
        self.run(self.maintainer, ix)
    }

    fn redeem(&mut self, voucher_id: &str, recipient: Address, github_id: u64) -> Result<(), EscrowError> {
        let voucher = voucher_address(voucher_id).unwrap();
        let proof = RecipientProof::sign(&self.attester, &voucher, &recipient, github_id);
        let ix = Instruction::RedeemVoucher {
            proof,
            accounts: RedeemAccounts { voucher, recipient },
        };
        self.run(recipient, ix)
    }

    fn balance(&self) -> u64 {
        self.ledger.organization(&self.org()).unwrap().balance
    }
}

#[test]
fn organization_lifecycle_matches_reference_scenario() {
    let mut h = Harness::new();
    h.ledger.airdrop(h.admin, 5_000_000_000, h.now).unwrap();

    h.init().unwrap();
    assert_eq!(h.balance(), 0);

    h.deposit(1_000_000_000).unwrap();
    assert_eq!(h.balance(), 1_000_000_000);

    let maintainer = h.maintainer;
    h.add_maintainer(h.admin, maintainer).unwrap();
    assert_eq!(
        h.ledger.organization(&h.org()).unwrap().maintainers,
        vec![maintainer]
    );

    h.create("v1", 100_000_000).unwrap();
    assert_eq!(h.balance(), 900_000_000);
    let voucher = h.ledger.voucher_by_id("v1").unwrap();
    assert_eq!(voucher.voucher_id, "v1");
    assert_eq!(voucher.recipient_external_id, RECIPIENT_ID);
    assert_eq!(voucher.amount, 100_000_000);
    assert_eq!(voucher.metadata, METADATA);
    assert_eq!(voucher.status, VoucherStatus::Open);

    assert_eq!(
        h.create("v1", 100_000_000).unwrap_err(),
        EscrowError::DuplicateVoucher {
            voucher_id: "v1".into()
        }
    );
    assert_eq!(h.balance(), 900_000_000);

    h.cancel("v1").unwrap();
    assert_eq!(h.balance(), 1_000_000_000);
    assert_eq!(
        h.ledger.voucher_by_id("v1").unwrap().status,
        VoucherStatus::Cancelled
    );

    let recipient = Address::new([0x33; 32]);
    assert_eq!(
        h.redeem("v1", recipient, RECIPIENT_ID).unwrap_err(),
        EscrowError::InvalidStatus {
            expected: VoucherStatus::Open,
            actual: VoucherStatus::Cancelled
        }
    );
}

#[test]
fn reinitialization_is_tolerated_by_rereading_state() {
    let mut h = Harness::new();
    h.ledger.airdrop(h.admin, 10, h.now).unwrap();
    h.init().unwrap();
    h.deposit(10).unwrap();

    // callers treat AlreadyInitialized as "exists" and carry on
    match h.init() {
        Err(EscrowError::AlreadyInitialized { address }) => assert_eq!(address, h.org()),
        other => panic!("expected AlreadyInitialized, got {other:?}"),
    }
    let org = h.ledger.organization_by_id(ORG_ID).unwrap();
    assert_eq!(org.org_external_id, ORG_ID);
    assert_eq!(org.balance, 10);
}

#[test]
fn admin_escape_hatch_and_authorization() {
    let mut h = Harness::new();
    h.ledger.airdrop(h.admin, 1_000, h.now).unwrap();
    h.init().unwrap();
    h.deposit(1_000).unwrap();

    // non-admin cannot touch the maintainer list
    let outsider = Address::new([0x44; 32]);
    let err = h.add_maintainer(outsider, outsider).unwrap_err();
    assert!(matches!(err, EscrowError::Unauthorized { .. }));
    assert!(h.ledger.organization(&h.org()).unwrap().maintainers.is_empty());

    // unlisted maintainer cannot issue
    assert!(matches!(
        h.create("x", 1).unwrap_err(),
        EscrowError::Unauthorized { .. }
    ));

    // admin lists itself, then a second attempt reports the duplicate
    let admin = h.admin;
    h.add_maintainer(admin, admin).unwrap();
    assert_eq!(
        h.add_maintainer(admin, admin).unwrap_err(),
        EscrowError::AlreadyMaintainer { identity: admin }
    );
}

#[test]
fn insufficient_funds_materializes_no_voucher() {
    let mut h = Harness::new();
    h.ledger.airdrop(h.admin, 50, h.now).unwrap();
    h.init().unwrap();
    h.deposit(50).unwrap();
    let maintainer = h.maintainer;
    h.add_maintainer(h.admin, maintainer).unwrap();

    let before = h.ledger.snapshot();
    assert!(matches!(
        h.create("big", 51).unwrap_err(),
        EscrowError::InsufficientFunds {
            needed: 51,
            available: 50,
            ..
        }
    ));
    assert!(h.ledger.voucher_by_id("big").is_none());
    assert_eq!(h.ledger.snapshot(), before);
}

#[test]
fn redeem_then_expire_paths() {
    let mut h = Harness::new();
    h.ledger.airdrop(h.admin, 1_000, h.now).unwrap();
    h.init().unwrap();
    h.deposit(1_000).unwrap();
    let maintainer = h.maintainer;
    h.add_maintainer(h.admin, maintainer).unwrap();
    h.create("paid", 300).unwrap();
    h.create("stale", 200).unwrap();

    let recipient = Address::new([0x55; 32]);
    assert!(matches!(
        h.redeem("paid", recipient, 1).unwrap_err(),
        EscrowError::IdentityMismatch {
            expected: RECIPIENT_ID,
            actual: 1
        }
    ));
    h.redeem("paid", recipient, RECIPIENT_ID).unwrap();
    assert_eq!(h.ledger.wallet_balance(&recipient), 300);

    let expire = Instruction::ExpireVoucher {
        accounts: ExpireAccounts {
            organization: h.org(),
            voucher: voucher_address("stale").unwrap(),
        },
    };
    assert!(matches!(
        h.ledger
            .execute(&TxContext::unsigned(h.now + 3_600), &expire)
            .unwrap_err(),
        EscrowError::VoucherNotExpired { .. }
    ));
    h.ledger
        .execute(&TxContext::unsigned(h.now + 3_601), &expire)
        .unwrap();
    assert_eq!(h.balance(), 700);
    assert_eq!(
        h.ledger.voucher_by_id("stale").unwrap().status,
        VoucherStatus::Expired
    );
    assert_eq!(h.ledger.total_value(), 1_000);
}

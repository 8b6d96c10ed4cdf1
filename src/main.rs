use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ed25519_dalek::SigningKey;
use escrow_core::{
    address::{organization_address, voucher_address},
    instruction::{AdminAccounts, DepositAccounts, ExpireAccounts, IssuerAccounts, RedeemAccounts},
    Address, EscrowError, EscrowEvent, Instruction, RecipientProof, TxContext, NATIVE_SCALE,
};
use rand::{rngs::OsRng, RngCore};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod host;

use config::CliConfig;
use host::StateFile;

#[derive(Parser)]
#[command(name = "voucher-escrow", version, about = "Git voucher escrow ledger operator CLI")]
struct Cli {
    /// Ledger state file (overrides config and VOUCHER_ESCROW_STATE)
    #[arg(long, global = true, value_name = "FILE")]
    state: Option<PathBuf>,

    /// TOML or JSON config file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Unix time used for the operation instead of the system clock
    #[arg(long, global = true, value_name = "SECS")]
    now: Option<i64>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct SignerArgs {
    /// ed25519 secret key, 64 hex chars
    #[arg(long, value_name = "HEX")]
    sk_hex: Option<String>,

    /// File holding the secret key as written by `keygen`
    #[arg(long, value_name = "FILE")]
    key: Option<PathBuf>,
}

impl SignerArgs {
    fn load(&self) -> Result<SigningKey> {
        host::load_signer(self.sk_hex.as_deref(), self.key.as_deref())
    }
}

#[derive(Subcommand)]
enum Command {
    /// Write a fresh keypair as sk.hex / pk.hex
    Keygen {
        #[arg(long)]
        out_dir: PathBuf,
    },
    /// Credit a wallet from the local faucet
    Airdrop {
        #[arg(long)]
        to: Address,
        #[arg(long)]
        amount: u64,
    },
    /// Print a derived ledger address
    Address {
        #[command(subcommand)]
        kind: AddressKind,
    },
    InitOrg {
        #[arg(long)]
        org_id: u64,
        #[command(flatten)]
        signer: SignerArgs,
    },
    Deposit {
        #[arg(long)]
        org_id: u64,
        #[arg(long)]
        amount: u64,
        #[command(flatten)]
        signer: SignerArgs,
    },
    AddMaintainer {
        #[arg(long)]
        org_id: u64,
        #[arg(long)]
        maintainer: Address,
        #[command(flatten)]
        signer: SignerArgs,
    },
    RemoveMaintainer {
        #[arg(long)]
        org_id: u64,
        #[arg(long)]
        maintainer: Address,
        #[command(flatten)]
        signer: SignerArgs,
    },
    CreateVoucher {
        #[arg(long)]
        org_id: u64,
        #[arg(long)]
        voucher_id: String,
        #[arg(long)]
        recipient_github_id: u64,
        #[arg(long)]
        amount: u64,
        #[arg(long, default_value = "")]
        metadata: String,
        #[command(flatten)]
        signer: SignerArgs,
    },
    /// Sign a recipient proof as a trusted attester
    Attest {
        #[arg(long)]
        voucher_id: String,
        #[arg(long)]
        recipient: Address,
        #[arg(long)]
        github_id: u64,
        /// Write the proof here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        #[command(flatten)]
        signer: SignerArgs,
    },
    /// Redeem a voucher to the signer's wallet
    Redeem {
        #[arg(long)]
        voucher_id: String,
        #[arg(long)]
        proof: PathBuf,
        #[command(flatten)]
        signer: SignerArgs,
    },
    Cancel {
        #[arg(long)]
        org_id: u64,
        #[arg(long)]
        voucher_id: String,
        #[command(flatten)]
        signer: SignerArgs,
    },
    /// Return an expired voucher's funds (no signature needed)
    Expire {
        #[arg(long)]
        org_id: u64,
        #[arg(long)]
        voucher_id: String,
    },
    Withdraw {
        #[arg(long)]
        org_id: u64,
        #[arg(long)]
        amount: u64,
        #[command(flatten)]
        signer: SignerArgs,
    },
    ShowOrg {
        #[arg(long)]
        org_id: u64,
    },
    ShowVoucher {
        #[arg(long)]
        voucher_id: String,
    },
    ShowWallet {
        #[arg(long)]
        address: Address,
    },
    /// Print state root and height, or export the full snapshot
    Snapshot {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum AddressKind {
    Org {
        #[arg(long)]
        id: u64,
    },
    Voucher {
        #[arg(long)]
        id: String,
    },
}

//==================== helpers ====================//

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn native(amount: u64) -> String {
    format!(
        "{}.{:09}",
        amount / NATIVE_SCALE,
        amount % NATIVE_SCALE
    )
}

fn print_event(event: &EscrowEvent) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(event)?);
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

fn issuer_accounts(org_id: u64, voucher_id: &str, maintainer: Address) -> Result<IssuerAccounts> {
    Ok(IssuerAccounts {
        organization: organization_address(org_id),
        voucher: voucher_address(voucher_id)?,
        maintainer,
    })
}

//==================== commands ====================//

fn keygen_cmd(out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let mut sk_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut sk_bytes);
    let sk = SigningKey::from_bytes(&sk_bytes);
    let pk = sk.verifying_key();

    write_file(&out_dir.join("sk.hex"), hex::encode(sk_bytes).as_bytes())?;
    write_file(&out_dir.join("pk.hex"), hex::encode(pk.as_bytes()).as_bytes())?;
    println!("keypair written → {}", out_dir.display());
    println!("identity {}", Address::from(&pk));
    Ok(())
}

fn attest_cmd(
    voucher_id: &str,
    recipient: Address,
    github_id: u64,
    out: Option<&Path>,
    signer: &SignerArgs,
) -> Result<()> {
    let attester = signer.load()?;
    let voucher = voucher_address(voucher_id)?;
    let proof = RecipientProof::sign(&attester, &voucher, &recipient, github_id);
    let json = serde_json::to_string_pretty(&proof)?;
    match out {
        Some(path) => {
            write_file(path, json.as_bytes())?;
            println!("proof written → {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn init_org_cmd(
    state: &StateFile,
    config: &CliConfig,
    now: i64,
    org_id: u64,
    signer: &SignerArgs,
) -> Result<()> {
    let sk = signer.load()?;
    let admin = host::identity(&sk);
    let ix = Instruction::InitializeOrganization {
        org_external_id: org_id,
        accounts: AdminAccounts {
            organization: organization_address(org_id),
            admin,
        },
    };
    match state.execute(&config.escrow, &TxContext::signed_by(admin, now), &ix) {
        Ok(event) => print_event(&event),
        Err(err) => match err.downcast_ref::<EscrowError>() {
            Some(EscrowError::AlreadyInitialized { address }) => {
                info!(%address, "organization exists, nothing to do");
                println!("organization {org_id} already initialized at {address}");
                Ok(())
            }
            _ => Err(err),
        },
    }
}

fn show_org_cmd(state: &StateFile, config: &CliConfig, org_id: u64) -> Result<()> {
    let ledger = state.load(&config.escrow)?;
    let address = organization_address(org_id);
    let org = ledger
        .organization(&address)
        .with_context(|| format!("organization {org_id} not found"))?;
    println!("organization  {org_id}");
    println!("address       {address}");
    println!("admin         {}", org.admin);
    println!("balance       {} ({})", native(org.balance), org.balance);
    println!("vouchers      {}", org.total_vouchers_created);
    println!("maintainers   {}", org.maintainers.len());
    for maintainer in &org.maintainers {
        println!("  - {maintainer}");
    }
    Ok(())
}

fn show_voucher_cmd(state: &StateFile, config: &CliConfig, voucher_id: &str) -> Result<()> {
    let ledger = state.load(&config.escrow)?;
    let address = voucher_address(voucher_id)?;
    let voucher = ledger
        .voucher(&address)
        .with_context(|| format!("voucher {voucher_id:?} not found"))?;
    println!("voucher       {}", voucher.voucher_id);
    println!("address       {address}");
    println!("organization  {}", voucher.organization);
    println!("recipient     github:{}", voucher.recipient_external_id);
    println!("amount        {} ({})", native(voucher.amount), voucher.amount);
    println!("status        {}", voucher.status);
    println!("created_at    {}", voucher.created_at);
    println!("expires_at    {}", voucher.expires_at);
    if !voucher.metadata.is_empty() {
        println!("metadata      {}", voucher.metadata);
    }
    Ok(())
}

fn snapshot_cmd(state: &StateFile, config: &CliConfig, out: Option<&Path>) -> Result<()> {
    let ledger = state.load(&config.escrow)?;
    let snapshot = ledger.snapshot();
    println!("height      {}", snapshot.meta.height);
    println!("timestamp   {}", snapshot.meta.timestamp);
    println!("accounts    {}", snapshot.accounts.len());
    println!("state_root  {}", hex::encode(snapshot.state_root));
    if let Some(path) = out {
        write_file(path, &snapshot.to_json()?)?;
        println!("snapshot written → {}", path.display());
    }
    Ok(())
}

//==================== main ====================//

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = CliConfig::load(cli.config.as_deref())?;
    if let Some(path) = cli.state {
        config.state = path;
    }
    let state = StateFile::new(&config.state);
    let now = match cli.now {
        Some(now) => now,
        None => host::unix_now()?,
    };

    // signed operations share this tail: build, execute, print
    let run = |sk: SigningKey, build: &dyn Fn(Address) -> Result<Instruction>| -> Result<()> {
        let identity = host::identity(&sk);
        let ix = build(identity)?;
        let event = state.execute(&config.escrow, &TxContext::signed_by(identity, now), &ix)?;
        print_event(&event)
    };

    match &cli.command {
        Command::Keygen { out_dir } => keygen_cmd(out_dir),
        Command::Airdrop { to, amount } => {
            let event = state.transact(&config.escrow, |ledger| {
                Ok(ledger.airdrop(*to, *amount, now)?)
            })?;
            print_event(&event)
        }
        Command::Address { kind } => {
            let address = match kind {
                AddressKind::Org { id } => organization_address(*id),
                AddressKind::Voucher { id } => voucher_address(id)?,
            };
            println!("{address}");
            Ok(())
        }
        Command::InitOrg { org_id, signer } => init_org_cmd(&state, &config, now, *org_id, signer),
        Command::Deposit {
            org_id,
            amount,
            signer,
        } => run(signer.load()?, &|depositor| {
            Ok(Instruction::Deposit {
                amount: *amount,
                accounts: DepositAccounts {
                    organization: organization_address(*org_id),
                    depositor,
                },
            })
        }),
        Command::AddMaintainer {
            org_id,
            maintainer,
            signer,
        } => run(signer.load()?, &|admin| {
            Ok(Instruction::AddMaintainer {
                maintainer: *maintainer,
                accounts: AdminAccounts {
                    organization: organization_address(*org_id),
                    admin,
                },
            })
        }),
        Command::RemoveMaintainer {
            org_id,
            maintainer,
            signer,
        } => run(signer.load()?, &|admin| {
            Ok(Instruction::RemoveMaintainer {
                maintainer: *maintainer,
                accounts: AdminAccounts {
                    organization: organization_address(*org_id),
                    admin,
                },
            })
        }),
        Command::CreateVoucher {
            org_id,
            voucher_id,
            recipient_github_id,
            amount,
            metadata,
            signer,
        } => run(signer.load()?, &|maintainer| {
            Ok(Instruction::CreateVoucher {
                voucher_id: voucher_id.clone(),
                recipient_external_id: *recipient_github_id,
                amount: *amount,
                metadata: metadata.clone(),
                accounts: issuer_accounts(*org_id, voucher_id, maintainer)?,
            })
        }),
        Command::Attest {
            voucher_id,
            recipient,
            github_id,
            out,
            signer,
        } => attest_cmd(voucher_id, *recipient, *github_id, out.as_deref(), signer),
        Command::Redeem {
            voucher_id,
            proof,
            signer,
        } => {
            let raw = fs::read(proof)
                .with_context(|| format!("failed to read proof {}", proof.display()))?;
            let proof: RecipientProof =
                serde_json::from_slice(&raw).context("invalid proof JSON")?;
            run(signer.load()?, &|recipient| {
                Ok(Instruction::RedeemVoucher {
                    proof: proof.clone(),
                    accounts: RedeemAccounts {
                        voucher: voucher_address(voucher_id)?,
                        recipient,
                    },
                })
            })
        }
        Command::Cancel {
            org_id,
            voucher_id,
            signer,
        } => run(signer.load()?, &|maintainer| {
            Ok(Instruction::CancelVoucher {
                accounts: issuer_accounts(*org_id, voucher_id, maintainer)?,
            })
        }),
        Command::Expire { org_id, voucher_id } => {
            let ix = Instruction::ExpireVoucher {
                accounts: ExpireAccounts {
                    organization: organization_address(*org_id),
                    voucher: voucher_address(voucher_id)?,
                },
            };
            let event = state.execute(&config.escrow, &TxContext::unsigned(now), &ix)?;
            print_event(&event)
        }
        Command::Withdraw {
            org_id,
            amount,
            signer,
        } => run(signer.load()?, &|admin| {
            Ok(Instruction::Withdraw {
                amount: *amount,
                accounts: AdminAccounts {
                    organization: organization_address(*org_id),
                    admin,
                },
            })
        }),
        Command::ShowOrg { org_id } => show_org_cmd(&state, &config, *org_id),
        Command::ShowVoucher { voucher_id } => show_voucher_cmd(&state, &config, voucher_id),
        Command::ShowWallet { address } => {
            let ledger = state.load(&config.escrow)?;
            let lamports = ledger.wallet_balance(address);
            println!("{address}  {} ({lamports})", native(lamports));
            Ok(())
        }
        Command::Snapshot { out } => snapshot_cmd(&state, &config, out.as_deref()),
    }
}

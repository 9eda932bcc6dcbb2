use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use ellora_chain::submit::ConfirmationPolicy;
use ellora_chain::{AlgodClient, NodeApi};
use ellora_common::units::from_micro;
use ellora_common::{Address, ContractConfig, CreateJobRequest, Network, OperationResult};
use ellora_marketplace::MarketplaceService;
use ellora_wallet::{LocalSigner, Session, SledStore, WalletSigner};

#[derive(Parser, Debug)]
#[clap(name = "market-cli")]
#[clap(about = "Ellora marketplace demo client - drive the deployed contracts from a terminal")]
struct Args {
    /// Node base URL; defaults to the network's public node
    #[clap(long, env = "ELLORA_NODE_URL")]
    node_url: Option<String>,

    #[clap(long, env = "ELLORA_ESCROW_APP_ID")]
    escrow_app_id: Option<u64>,

    #[clap(long, env = "ELLORA_SBT_APP_ID")]
    sbt_app_id: Option<u64>,

    /// 32-byte hex seed of the signing key, required for write commands
    #[clap(short = 'k', long, env = "ELLORA_KEY_SEED")]
    key_seed: Option<String>,

    /// Rounds to wait for confirmation before giving up
    #[clap(long, default_value_t = 10)]
    confirm_rounds: u64,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check both contracts' existence and funding
    Health,
    /// Restore or open a wallet session and print its state
    Wallet {
        /// Session store; remembers the last-connected address
        #[clap(long, default_value = "./wallet.db")]
        store_path: String,
    },
    /// Print an account's balance
    Balance { address: String },
    /// Print a job's on-chain state
    Job { app_id: u64 },
    /// Print an account's reputation
    Reputation { address: String },
    /// Post a new job with escrowed funds
    CreateJob {
        #[clap(long)]
        amount: f64,
        #[clap(long)]
        deadline_days: u64,
        #[clap(long, default_value = "")]
        description: String,
        #[clap(long = "requirement")]
        requirements: Vec<String>,
    },
    /// Accept an open job as its freelancer
    Accept { app_id: u64 },
    /// Mark a job's work delivered
    Complete { app_id: u64 },
    /// Release escrowed funds to the freelancer
    Approve { app_id: u64 },
    /// Escalate a job to juror voting
    Dispute { app_id: u64 },
    /// Cast a juror vote
    Vote {
        app_id: u64,
        /// Vote for the freelancer; omit to vote against
        #[clap(long)]
        for_freelancer: bool,
    },
    /// Mint a reputation token with a 1-5 rating
    Mint {
        #[clap(long)]
        rating: u8,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let mut config = ContractConfig::testnet();
    if let Some(id) = args.escrow_app_id {
        config.escrow_app_id = id;
    }
    if let Some(id) = args.sbt_app_id {
        config.sbt_app_id = id;
    }

    let node_url = args
        .node_url
        .clone()
        .unwrap_or_else(|| Network::Testnet.default_node_url().to_string());
    let node = Arc::new(AlgodClient::new(node_url));

    info!(
        escrow_app_id = config.escrow_app_id,
        sbt_app_id = config.sbt_app_id,
        "starting market-cli"
    );

    match args.command {
        Command::Health => {
            let service = read_only_service(node, config, args.confirm_rounds);
            let report = service.health().await;
            println!(
                "escrow: {} (balance {})",
                status_word(report.escrow_healthy),
                report.escrow_balance
            );
            println!(
                "sbt:    {} (balance {})",
                status_word(report.sbt_healthy),
                report.sbt_balance
            );
            for error in &report.errors {
                println!("  {error}");
            }
        }
        Command::Wallet { store_path } => {
            let signer = parse_signer(args.key_seed.as_deref())?;
            let store = Arc::new(SledStore::open(&store_path).map_err(|e| anyhow!("{e}"))?);
            let session = Session::new(signer, node, store);

            let mut state = session.restore().await;
            if !state.connected {
                state = session.connect().await;
            }

            println!("connected: {}", state.connected);
            if let Some(address) = state.address {
                println!("address:   {address}");
                println!("balance:   {}", state.balance);
            }
            if let Some(error) = &state.error {
                println!("error:     {error}");
            }
        }
        Command::Balance { address } => {
            let address: Address = address.parse().map_err(|e| anyhow!("{e}"))?;
            let account = node
                .account_information(&address)
                .await
                .map_err(|e| anyhow!("{e}"))?;
            println!("{} has {}", address, from_micro(account.amount));
        }
        Command::Job { app_id } => {
            let service = read_only_service(node, config, args.confirm_rounds);
            match service.job_state(app_id).await.map_err(|e| anyhow!("{e}"))? {
                Some(job) => {
                    println!("job {app_id}: {:?}", job.status);
                    println!("  client:     {}", job.client);
                    match job.freelancer {
                        Some(freelancer) => println!("  freelancer: {freelancer}"),
                        None => println!("  freelancer: (unassigned)"),
                    }
                    println!("  amount:     {}", job.amount);
                    println!("  created:    {}", format_timestamp(job.created_at));
                    println!("  deadline:   {}", format_timestamp(job.deadline_at));
                    if job.status == ellora_common::JobStatus::Disputed {
                        println!(
                            "  votes:      {} for / {} against ({} jurors)",
                            job.dispute_votes_for, job.dispute_votes_against, job.total_jurors
                        );
                    }
                }
                None => println!("job {app_id}: not found"),
            }
        }
        Command::Reputation { address } => {
            let address: Address = address.parse().map_err(|e| anyhow!("{e}"))?;
            let service = read_only_service(node, config, args.confirm_rounds);
            match service
                .reputation(&address)
                .await
                .map_err(|e| anyhow!("{e}"))?
            {
                Some(rep) => {
                    println!("score: {:.1}", rep.score);
                    println!("  tokens:   {}", rep.token_count);
                    println!("  ratings:  {} positive / {} negative", rep.positive, rep.negative);
                    println!("  juror:    {}", if rep.juror_eligible { "eligible" } else { "not eligible" });
                    if rep.last_earned_at > 0 {
                        println!("  last earned: {}", format_timestamp(rep.last_earned_at));
                    }
                }
                None => println!("{address} has no reputation state"),
            }
        }
        Command::CreateJob {
            amount,
            deadline_days,
            description,
            requirements,
        } => {
            let (service, sender) = signing_service(args.key_seed.as_deref(), args.confirm_rounds, node, config).await?;
            let request = CreateJobRequest {
                amount,
                deadline_days,
                description,
                requirements,
            };
            print_result(service.create_job(&sender, &request).await);
        }
        Command::Accept { app_id } => {
            let (service, sender) = signing_service(args.key_seed.as_deref(), args.confirm_rounds, node, config).await?;
            print_result(service.accept_job(&sender, app_id).await);
        }
        Command::Complete { app_id } => {
            let (service, sender) = signing_service(args.key_seed.as_deref(), args.confirm_rounds, node, config).await?;
            print_result(service.complete_job(&sender, app_id).await);
        }
        Command::Approve { app_id } => {
            let (service, sender) = signing_service(args.key_seed.as_deref(), args.confirm_rounds, node, config).await?;
            print_result(service.approve_completion(&sender, app_id).await);
        }
        Command::Dispute { app_id } => {
            let (service, sender) = signing_service(args.key_seed.as_deref(), args.confirm_rounds, node, config).await?;
            print_result(service.raise_dispute(&sender, app_id).await);
        }
        Command::Vote {
            app_id,
            for_freelancer,
        } => {
            let (service, sender) = signing_service(args.key_seed.as_deref(), args.confirm_rounds, node, config).await?;
            print_result(service.vote_dispute(&sender, app_id, for_freelancer).await);
        }
        Command::Mint { rating } => {
            let (service, sender) = signing_service(args.key_seed.as_deref(), args.confirm_rounds, node, config).await?;
            print_result(service.mint_sbt(&sender, rating).await);
        }
    }

    Ok(())
}

/// Service without a signing key; enough for the read-only commands
fn read_only_service(
    node: Arc<AlgodClient>,
    config: ContractConfig,
    confirm_rounds: u64,
) -> MarketplaceService {
    MarketplaceService::new(node, Arc::new(LocalSigner::empty()), config)
        .with_confirmation_policy(ConfirmationPolicy {
            max_rounds: confirm_rounds,
        })
}

/// Service backed by the key seed from the arguments, connected and ready
/// to sign; returns the signing address alongside.
fn parse_signer(key_seed: Option<&str>) -> Result<Arc<LocalSigner>> {
    let seed_hex = key_seed
        .context("this command signs transactions; pass --key-seed or set ELLORA_KEY_SEED")?;
    let seed_bytes = hex::decode(seed_hex).context("key seed must be hex")?;
    let seed: [u8; 32] = seed_bytes
        .try_into()
        .map_err(|_| anyhow!("key seed must be exactly 32 bytes"))?;

    Ok(Arc::new(LocalSigner::from_seed(seed)))
}

async fn signing_service(
    key_seed: Option<&str>,
    confirm_rounds: u64,
    node: Arc<AlgodClient>,
    config: ContractConfig,
) -> Result<(MarketplaceService, Address)> {
    let signer = parse_signer(key_seed)?;
    let sender = signer.addresses()[0];

    // LocalSigner signs only with an active session
    signer.connect().await.map_err(|e| anyhow!("{e}"))?;

    let service = MarketplaceService::new(node, signer, config).with_confirmation_policy(
        ConfirmationPolicy {
            max_rounds: confirm_rounds,
        },
    );

    Ok((service, sender))
}

fn print_result(result: OperationResult) {
    match result {
        OperationResult::Confirmed { tx_id, app_id } => {
            println!("confirmed: {tx_id}");
            if let Some(app_id) = app_id {
                println!("  application: {app_id}");
            }
        }
        OperationResult::Failed { error } => {
            println!("failed: {error}");
            std::process::exit(1);
        }
    }
}

fn status_word(healthy: bool) -> &'static str {
    if healthy {
        "healthy"
    } else {
        "unreachable"
    }
}

fn format_timestamp(ts: u64) -> String {
    chrono::DateTime::from_timestamp(ts as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}

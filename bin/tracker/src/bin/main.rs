//! Track an ERC20 token for a wallet and grant a counterpart unlimited allowance.
//!
//! Subcommands:
//! - `watch`: follow balance and allowance block by block until Ctrl-C
//! - `show`: print the token state once as JSON
//! - `approve`: grant the configured spender an unlimited allowance

use clap::{Parser, Subcommand};
use std::time::Duration;
use token::{GrantOutcome, Signer as _, WalletSigner};
use tracing::{info, warn};
use tracker::{
    config::Config,
    metrics::{install_prometheus_exporter, Metrics},
    watch_snapshots, Session,
};

const SETTLE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(name = "tracker")]
#[command(about = "Track an ERC20 balance and allowance for a wallet")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Private key for signing transactions (hex string, with or without 0x prefix)
    #[arg(short = 'k', long, env = "PRIVATE_KEY")]
    private_key: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json: bool,

    /// Dry-run mode: log the allowance grant without sending it
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Follow the token state until Ctrl-C
    Watch,

    /// Print the token state once as JSON
    Show,

    /// Grant the configured spender an unlimited allowance
    Approve,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    let mut config = Config::from_file(&cli.config)?;

    // Override dry_run from CLI flag
    if cli.dry_run {
        config.dry_run = true;
    }

    let network = config.network_config();

    info!("Loaded config:");
    info!("  Network: {:?}", config.network);
    info!("  Token: {}", config.token_address());
    match config.spender_address {
        Some(spender) => info!("  Spender: {}", spender),
        None => info!("  Spender: <unset>"),
    }
    info!("  Poll interval: {:?}", config.poll_interval());
    if config.dry_run {
        info!("  Mode: DRY-RUN (no transactions will be executed)");
    }

    let metrics = Metrics::new();
    if let Some(port) = config.metrics_port {
        install_prometheus_exporter(port)?;
        info!("Metrics exporter listening on port {}", port);
    }

    let key = client::local_signer(&cli.private_key)?;
    let owner = key.address();
    let provider = client::create_wallet_provider(&config.rpc_url, key)?;
    let signer = WalletSigner::connect(provider, owner).await?;
    let reader = client::create_provider(&config.rpc_url)?;

    info!("  Owner: {}", owner);
    if signer.chain_id() != network.chain_id {
        warn!(
            expected = network.chain_id,
            actual = signer.chain_id(),
            "RPC chain id does not match configured network"
        );
    }

    let session = Session::start(signer, reader, &config);

    match cli.command {
        Command::Watch => {
            watch_snapshots(session.handle(), &metrics, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                }
            })
            .await?;
            info!("Shutting down");
        }
        Command::Show => {
            let snapshot = session.wait_settled(SETTLE_TIMEOUT).await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Command::Approve => {
            session.wait_bound(SETTLE_TIMEOUT).await?;

            if config.dry_run {
                info!(
                    token = %config.token_address(),
                    spender = ?config.spender_address,
                    "DRY-RUN: would grant unlimited allowance"
                );
            } else {
                let outcome = session.handle().grant_unlimited_allowance().await;
                metrics.record_grant(&outcome);

                match outcome {
                    GrantOutcome::Submitted { tx_hash } => {
                        info!(%tx_hash, "Unlimited allowance granted");
                    }
                    GrantOutcome::Skipped(reason) => {
                        eyre::bail!("Allowance grant skipped: {}", reason);
                    }
                    GrantOutcome::Failed { reason } => {
                        eyre::bail!("Allowance grant failed: {}", reason);
                    }
                }
            }
        }
    }

    session.shutdown().await;

    Ok(())
}

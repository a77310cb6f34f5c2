//! Multi-chain wallet transfer entry point.

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use multichain_wallet::cli::Cli;
use multichain_wallet::{TransferOutcome, Wallet, WalletConfig, WalletError};

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    if let Err(e) = init_logging() {
        eprintln!("failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    match run(args).await {
        Ok(TransferOutcome::Broadcast { txid }) => {
            info!(%txid, "transfer broadcast");
            println!("{}", txid);
        }
        Ok(TransferOutcome::Skipped { reason }) => {
            info!(%reason, "transfer skipped");
            println!("skipped: {}", reason);
        }
        Err(e) => {
            error!(error = %e, "transfer failed");
            std::process::exit(1);
        }
    }
}

async fn run(args: Cli) -> Result<TransferOutcome, WalletError> {
    // reject bad flags before any file or network access
    let chain = args.validate()?;

    let config = WalletConfig::load(&args.config)?;
    let wallet = Wallet::new(config)?;
    wallet.run_transfer(chain, args.index as usize, &args.amount).await
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

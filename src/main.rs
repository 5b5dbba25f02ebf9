//! pumpsnipe - single-shot launch-and-snipe campaign tool
//!
//! Creates a token on the bonding-curve launch platform and immediately
//! executes a coordinated multi-wallet buy against the new market. Also runs
//! in snipe-only mode against an existing mint via `--mint`.

#![deny(unused_imports)]
#![deny(unused_mut)]
#![warn(unused_must_use)]

use anyhow::{Context, Result};
use clap::Parser;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signer::Signer;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pumpsnipe::config::Config;
use pumpsnipe::constants::ProtocolAddresses;
use pumpsnipe::coordinator::{cancel_channel, SnipeCoordinator, SnipeReport, SnipeStatus};
use pumpsnipe::encoder::InstructionEncoder;
use pumpsnipe::launcher::{LaunchParams, Launcher, Tip, TokenMetadata};
use pumpsnipe::market::MarketDataFetcher;
use pumpsnipe::submitter::RpcSubmitter;
use pumpsnipe::wallet;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Skip the launch phase and snipe an existing mint address
    #[arg(long)]
    mint: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    info!("🚀 pumpsnipe v{}", env!("CARGO_PKG_VERSION"));
    info!("📋 loading configuration from: {}", args.config);
    let config =
        Config::from_file_with_env(&args.config).context("failed to load configuration")?;
    config.validate()?;

    let addresses = ProtocolAddresses::resolve(&config.addresses)?;
    let encoder = InstructionEncoder::new(addresses);
    let fetcher = MarketDataFetcher::new(config.api.coin_data_url.as_str())
        .context("failed to build market data client")?;
    let submitter = Arc::new(RpcSubmitter::new(config.rpc.url.as_str()));

    let snipers = wallet::load_snipers(&config.snipers).context("failed to load sniper wallets")?;
    if snipers.is_empty() {
        warn!("no sniper wallets configured");
    } else {
        info!("🔫 {} sniper wallet(s) loaded", snipers.len());
    }

    let coordinator = SnipeCoordinator::new(
        Arc::new(fetcher),
        submitter.clone(),
        encoder.clone(),
        config.snipe.to_params(),
        snipers,
    );

    // Ctrl-C stops the poll phase; once dispatch has started it runs to
    // completion so no wallet is left mid-flight
    let (cancel_tx, cancel_rx) = cancel_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    if let Some(mint) = &args.mint {
        let mint = Pubkey::from_str(mint).context("invalid mint address")?;
        info!(%mint, "🎯 snipe-only mode");
        let report = coordinator.run(mint, cancel_rx).await;
        print_report(&report);
        return Ok(());
    }

    let payer =
        Arc::new(wallet::load_payer(&config.wallet).context("failed to load payer wallet")?);
    info!("💼 payer: {}", payer.pubkey());

    let metadata = if config.launch.use_cli {
        prompt_metadata()?
    } else {
        metadata_from_config(&config)
    };
    let mut params = launch_params(&config)?;
    if config.launch.use_cli {
        let dev_buy = prompt("Enter the dev wallet buy amount in SOL (optional): ")?;
        if !dev_buy.is_empty() {
            params.dev_buy_sol = dev_buy.parse().context("invalid dev buy amount")?;
        }
    }

    let launcher = Launcher::new(
        encoder,
        submitter,
        config.api.ipfs_url.as_str(),
        payer,
        params,
    );

    match launcher.launch(&metadata, coordinator, cancel_rx).await {
        Ok(outcome) => {
            info!(
                "✅ token {} [{}] created with transaction {}",
                metadata.name, metadata.ticker, outcome.create_signature
            );
            if !outcome.confirmed {
                warn!("create transaction was not seen confirmed within the budget");
            }
            info!("🔍 https://solscan.io/tx/{}", outcome.create_signature);
            info!("🪙 https://pump.fun/{}", outcome.mint);
            print_report(&outcome.snipe);
        }
        Err(e) => {
            // Observed, never fatal: the process reports and exits cleanly
            error!("could not create token: {}", e);
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        "pumpsnipe=debug,info"
    } else {
        "pumpsnipe=info,warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    Ok(())
}

fn metadata_from_config(config: &Config) -> TokenMetadata {
    let launch = &config.launch;
    TokenMetadata {
        name: launch.name.clone(),
        ticker: launch.ticker.clone(),
        description: launch.description.clone(),
        image_path: launch.image_path.clone(),
        twitter: launch.twitter.clone(),
        telegram: launch.telegram.clone(),
        website: launch.website.clone(),
    }
}

fn launch_params(config: &Config) -> Result<LaunchParams> {
    let launch = &config.launch;
    let tip = match &launch.tip {
        Some(tip) => Some(Tip {
            account: Pubkey::from_str(&tip.account).context("invalid launch.tip.account")?,
            lamports: tip.lamports,
        }),
        None => None,
    };
    Ok(LaunchParams {
        dev_buy_sol: launch.dev_buy_sol,
        compute_unit_price: launch.compute_unit_price,
        compute_unit_limit: launch.compute_unit_limit,
        tip,
        use_vanity: launch.use_vanity,
        vanity_keys: launch.vanity_keys.clone(),
        ..Default::default()
    })
}

fn prompt_metadata() -> Result<TokenMetadata> {
    Ok(TokenMetadata {
        name: prompt("Enter the token name: ")?,
        ticker: prompt("Enter the token ticker: ")?,
        description: prompt("Enter the token description: ")?,
        image_path: prompt("Enter the path to the token image file: ")?,
        twitter: prompt("Enter the Twitter link (optional): ")?,
        telegram: prompt("Enter the Telegram link (optional): ")?,
        website: prompt("Enter the website link (optional): ")?,
    })
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn print_report(report: &SnipeReport) {
    match report.status {
        SnipeStatus::Completed => info!(
            "🎯 snipe finished: {}/{} buys landed after {} poll(s)",
            report.succeeded(),
            report.outcomes.len(),
            report.poll_attempts
        ),
        SnipeStatus::Cancelled => {
            warn!("snipe cancelled after {} poll(s)", report.poll_attempts)
        }
        SnipeStatus::AttemptsExhausted => warn!(
            "market never appeared within {} poll attempt(s)",
            report.poll_attempts
        ),
    }
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(signature) => info!("  {} ({}) -> {}", outcome.name_tag, outcome.wallet, signature),
            Err(reason) => warn!("  {} ({}) failed: {}", outcome.name_tag, outcome.wallet, reason),
        }
    }
}

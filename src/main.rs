//! Spam Radar - scam-token spammer detector
//!
//! Run with: cargo run -- <command>
//!
//! Commands:
//! - init: seed the scam-token registry from the alert feed
//! - block: scan one block
//! - watch: follow the chain head
//! - replay / alert: feed recorded transactions or peer alerts from JSON
//! - stats: show what the state file knows

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result, WrapErr};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spam_radar::blocks::BlockLogFetcher;
use spam_radar::intel::PeerAlert;
use spam_radar::state::{JsonStateStore, StateStore};
use spam_radar::{Chain, Config, Detector, Finding, TransactionEvent};

#[derive(Parser, Debug)]
#[command(author, version, about = "Flags senders of scam tokens that target real holders")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Seed the scam-token registry from the alert feed
    Init,

    /// Scan every transaction of one block
    Block {
        number: u64,

        /// Chain id (1 or 137)
        #[arg(short, long, default_value_t = 1)]
        chain: u64,
    },

    /// Poll the chain head and scan each new block
    Watch {
        #[arg(short, long, default_value_t = 1)]
        chain: u64,
    },

    /// Run recorded transactions (JSON, one or an array) through the detector
    Replay { file: PathBuf },

    /// Apply recorded peer alerts (JSON, one or an array)
    Alert { file: PathBuf },

    /// Top spammers and registry size
    Stats {
        #[arg(short, long, default_value_t = 10)]
        top: usize,
    },
}

/// Recorded input files hold either one item or a JSON array of them
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

fn load_items<T: DeserializeOwned>(file: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(file)
        .wrap_err_with(|| format!("reading {}", file.display()))?;
    Ok(match serde_json::from_str::<OneOrMany<T>>(&content)? {
        OneOrMany::Many(items) => items,
        OneOrMany::One(item) => vec![item],
    })
}

fn print_banner() {
    println!();
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!(
        "{}",
        style(" 📡 SPAM RADAR - Scam Token Spammer Detector").cyan().bold()
    );
    println!(
        "{}",
        style("    Registry | Log Scanner | Multicall3 Holder Checks").cyan()
    );
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!();
}

fn print_findings(findings: &[Finding]) -> Result<()> {
    for finding in findings {
        println!(
            "{} {} spammed {} with {} (confidence {:.4})",
            style("🚨").red(),
            style(finding.sender_address).red().bold(),
            finding.receiver_address,
            finding.scam_token_address,
            finding.confidence
        );
        println!("{}", serde_json::to_string_pretty(finding)?);
    }
    Ok(())
}

fn rpc_for(config: &Config, chain_id: u64) -> Result<String> {
    match Chain::from_id(chain_id) {
        Some(Chain::Mainnet) => Ok(config.rpc_mainnet.clone()),
        Some(Chain::Polygon) => Ok(config.rpc_polygon.clone()),
        None => Err(eyre!("Chain {} is not supported (use 1 or 137)", chain_id)),
    }
}

async fn scan_block(
    detector: &Detector<JsonStateStore>,
    fetcher: &BlockLogFetcher,
    number: u64,
) -> Result<usize> {
    let transactions = fetcher
        .transactions_in_block(number)
        .await
        .wrap_err_with(|| format!("fetching logs of block {}", number))?;

    let mut total = 0;
    for tx in &transactions {
        let findings = detector.handle_transaction(tx).await?;
        total += findings.len();
        print_findings(&findings)?;
    }

    info!(
        "Block {}: {} transactions, {} findings",
        number,
        transactions.len(),
        total
    );
    Ok(total)
}

async fn run_init(detector: &Detector<JsonStateStore>) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message("Paging the alert feed...");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let report = detector.initialize().await;
    spinner.finish_and_clear();
    let report = report?;

    println!(
        "{} Registry holds {} scam tokens ({} new, {} alerts over {} pages)",
        style("✓").green(),
        report.known_tokens,
        report.added_tokens,
        report.feed.alerts,
        report.feed.pages
    );
    if !report.feed.complete {
        println!(
            "{} Feed was only partially read; run init again later",
            style("⚠").yellow()
        );
    }
    println!("Subscribe to alerts:");
    println!("{}", serde_json::to_string_pretty(&report.subscription)?);
    Ok(())
}

async fn run_watch(
    detector: &Detector<JsonStateStore>,
    fetcher: BlockLogFetcher,
    interval_secs: u64,
) -> Result<()> {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    let mut last_seen: Option<u64> = None;

    info!("👀 Watching chain {} every {}s", fetcher.chain_id(), interval_secs);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                return Ok(());
            }
            _ = interval.tick() => {}
        }

        let head = match fetcher.latest_block().await {
            Ok(head) => head,
            Err(e) => {
                warn!("Could not read block number: {}", e);
                continue;
            }
        };

        let from = match last_seen {
            Some(seen) if head <= seen => continue,
            Some(seen) => seen + 1,
            None => head,
        };

        for number in from..=head {
            if let Err(e) = scan_block(detector, &fetcher, number).await {
                error!("Block {} failed: {:#}", number, e);
            }
        }
        last_seen = Some(head);
    }
}

async fn run_replay(detector: &Detector<JsonStateStore>, file: PathBuf) -> Result<()> {
    let transactions: Vec<TransactionEvent> = load_items(&file)?;

    let mut total = 0;
    for tx in &transactions {
        let findings = detector.handle_transaction(tx).await?;
        total += findings.len();
        print_findings(&findings)?;
    }

    println!(
        "{} Replayed {} transactions, {} findings",
        style("✓").green(),
        transactions.len(),
        total
    );
    Ok(())
}

async fn run_alerts(detector: &Detector<JsonStateStore>, file: PathBuf) -> Result<()> {
    let alerts: Vec<PeerAlert> = load_items(&file)?;

    let before = detector.snapshot()?.scam_tokens.len();
    for alert in &alerts {
        detector.handle_alert(alert).await?;
    }
    let after = detector.snapshot()?.scam_tokens.len();

    println!(
        "{} Applied {} alerts, registry {} -> {} tokens",
        style("✓").green(),
        alerts.len(),
        before,
        after
    );
    Ok(())
}

fn run_stats(store: &JsonStateStore, top: usize) -> Result<()> {
    let state = store.read_or_default()?;

    println!("State file:   {}", store.path().display());
    println!("Scam tokens:  {}", state.scam_tokens.len());
    println!("Spammers:     {}", state.spammer_addresses.len());
    match state.updated_at_datetime() {
        Some(at) => println!("Last update:  {}", at.to_rfc3339()),
        None => println!("Last update:  never"),
    }

    if !state.spammer_addresses.is_empty() {
        println!();
        println!("{}", style(format!("Top {} spammers:", top)).bold());
        for (i, (sender, count)) in state.spammer_addresses.top(top).iter().enumerate() {
            println!(
                "  {:>2}. {} {:>6} incidents (confidence {:.4})",
                i + 1,
                sender,
                count,
                spam_radar::scoring::confidence(*count)
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(config.log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    if let Command::Stats { top } = cli.command {
        return run_stats(&config.state_store(), top);
    }

    print_banner();

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        error!("Please check your .env file");
        return Err(e.into());
    }

    config.print_summary();
    println!();

    let detector = Detector::from_config(&config)?;

    match cli.command {
        Command::Init => run_init(&detector).await,
        Command::Block { number, chain } => {
            let fetcher = BlockLogFetcher::new(rpc_for(&config, chain)?, chain, config.http_timeout());
            scan_block(&detector, &fetcher, number).await.map(|_| ())
        }
        Command::Watch { chain } => {
            let fetcher = BlockLogFetcher::new(rpc_for(&config, chain)?, chain, config.http_timeout());
            run_watch(&detector, fetcher, config.scan_interval_secs).await
        }
        Command::Replay { file } => run_replay(&detector, file).await,
        Command::Alert { file } => run_alerts(&detector, file).await,
        Command::Stats { .. } => Ok(()),
    }
}

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use fpl_scraper::core::run_scrape;
use fpl_scraper::storage::StoreType;
use fpl_scraper::trigger::validate_push;
use fpl_scraper::ScrapeConfig;
use log::{error, info};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fpl_scraper", version, about = "Refreshes the FPL player statistics dataset")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape the listing once and replace the live dataset.
    Run {
        /// Keep scraped documents in memory instead of the configured store.
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a Pub/Sub push envelope read from a file or stdin, then run
    /// a scrape. Receiving push deliveries over HTTP is left to whatever
    /// forwards the request body here.
    HandlePush {
        /// Envelope file; reads stdin when omitted.
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

fn read_envelope(file: Option<PathBuf>) -> anyhow::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading envelope from {}", path.display())),
        None => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("reading envelope from stdin")?;
            Ok(body)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn,fpl_scraper=info"))
        .init();

    let cli = Cli::parse();
    let mut config = ScrapeConfig::from_env()?;

    match cli.command {
        Command::Run { dry_run } => {
            if dry_run {
                info!("Dry run: documents stay in memory");
                config = config.with_store(StoreType::Memory);
            }
        }
        Command::HandlePush { file } => {
            info!("Parsing message.");
            let body = read_envelope(file)?;
            if let Err(e) = validate_push(&body) {
                error!("Data aggregation skipped. {}", e);
                bail!(e);
            }
        }
    }

    info!("Starting data aggregation.");
    let summary = run_scrape(config).await?;
    info!(
        "Data aggregation completed: {} players over {} pages into {}",
        summary.stats.players_extracted, summary.pages, summary.dataset
    );
    Ok(())
}

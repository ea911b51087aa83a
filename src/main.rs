//! Tour-Harvest main entry point
//!
//! This is the command-line interface for the Tour-Harvest event scraper.

use anyhow::Context;
use chrono::{Duration, Local, NaiveDate};
use clap::Parser;
use std::path::PathBuf;
use tour_harvest::config::load_config_with_hash;
use tour_harvest::harvest::{run_harvest, search_url};
use tracing_subscriber::EnvFilter;

/// Tour-Harvest: a daily tour event scraper
///
/// Tour-Harvest discovers tournament events updated on a target date,
/// tracks per-event fetch status in a durable ledger, and extracts event
/// detail pages into structured result rows.
#[derive(Parser, Debug)]
#[command(name = "tour-harvest")]
#[command(version)]
#[command(about = "A daily tour event scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Observation date to harvest (defaults to yesterday)
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without fetching
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the ledger database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    s.parse::<NaiveDate>()
        .map_err(|e| format!("invalid date '{}': {}", s, e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    // The scheduler that triggers a daily run targets the previous day, so
    // the listing covers a fully elapsed date
    let observed = cli
        .date
        .unwrap_or_else(|| Local::now().date_naive() - Duration::days(1));

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, observed)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_harvest(config, observed).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tour_harvest=info,warn"),
            1 => EnvFilter::new("tour_harvest=debug,info"),
            2 => EnvFilter::new("tour_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows the planned search
fn handle_dry_run(
    config: &tour_harvest::config::Config,
    observed: NaiveDate,
) -> anyhow::Result<()> {
    println!("=== Tour-Harvest Dry Run ===\n");

    println!("Source:");
    println!("  Base URL: {}", config.source.base_url);
    println!("  Country: {}", config.source.country);
    println!("  Tiers: {}", config.source.tiers.join(", "));
    if let Some(proxy) = &config.source.proxy {
        println!("  Proxy: {}", proxy);
    }

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.scraper_name);
    println!("  Version: {}", config.user_agent.scraper_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nHarvest:");
    println!("  Request pause: {}ms", config.harvest.request_pause_ms);
    println!(
        "  Retry backoff: {} days",
        config.harvest.retry_backoff_days
    );

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    let first_page = search_url(&config.source, observed)?;
    println!("\nObservation date: {}", observed);
    println!("First search page: {}", first_page);

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows statistics from the ledger database
fn handle_stats(config: &tour_harvest::config::Config) -> anyhow::Result<()> {
    use std::path::Path;
    use tour_harvest::ledger::SqliteLedger;
    use tour_harvest::output::{load_statistics, print_statistics};

    println!("Database: {}\n", config.output.database_path);

    // Open the ledger database
    let ledger = SqliteLedger::new(
        Path::new(&config.output.database_path),
        config.harvest.retry_backoff_days,
    )?;

    // Load and print statistics
    let stats = load_statistics(&ledger)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(
    config: tour_harvest::config::Config,
    observed: NaiveDate,
) -> anyhow::Result<()> {
    tracing::info!("Target date: {}", observed);

    match run_harvest(config, observed).await {
        Ok(summary) => {
            tracing::info!(
                "Harvest completed: {} discovered, {} due, {} rows written",
                summary.discovered,
                summary.due,
                summary.rows_written
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}

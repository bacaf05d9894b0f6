//! Sports-betting arbitrage service entry point.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sports_arb::api::{create_router, AppState, OpportunityRecord};
use sports_arb::arbitrage::{plan_stakes, scan};
use sports_arb::config::Config;
use sports_arb::error::StakeError;
use sports_arb::metrics;
use sports_arb::quotes::{max_age_from_secs, QuoteSnapshot};
use sports_arb::utils::shutdown_signal;

/// Sports-betting arbitrage service.
#[derive(Parser, Debug)]
#[command(name = "sports-arb")]
#[command(about = "Detects sure bets across bookmakers and sizes the stakes")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,

        /// Quote snapshot to load at startup (overrides QUOTES_PATH).
        #[arg(short, long)]
        quotes: Option<PathBuf>,

        /// Maximum quote age in seconds (overrides QUOTE_MAX_AGE_SECS).
        #[arg(long)]
        max_age_secs: Option<u64>,
    },

    /// Scan a quote snapshot file once and print the opportunities.
    Scan {
        /// JSON array of quote records.
        file: PathBuf,

        /// Bankroll to split across each opportunity.
        #[arg(short, long)]
        stake: Option<Decimal>,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,

        /// Maximum quote age in seconds (overrides QUOTE_MAX_AGE_SECS).
        #[arg(long)]
        max_age_secs: Option<u64>,
    },

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let env_config = Config::load().unwrap_or_default();
    let log_json = env_config.log_json;
    let filter = if args.verbose || env_config.verbose {
        EnvFilter::new("sports_arb=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&env_config.rust_log))
    };

    if log_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    // Handle subcommands
    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(),
        Some(Command::Scan {
            file,
            stake,
            json,
            max_age_secs,
        }) => cmd_scan(file, stake, json, max_age_secs).await,
        Some(Command::Serve {
            port,
            quotes,
            max_age_secs,
        }) => cmd_serve(port, quotes, max_age_secs).await,
        None => cmd_serve(None, None, None).await,
    }
}

fn load_config() -> anyhow::Result<Config> {
    let config = Config::load_validated().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;
    Ok(config)
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("SPORTS ARB - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    match &config.quotes_path {
        Some(path) => println!("  Quotes Path: {}", path.display()),
        None => println!("  Quotes Path: (none, waiting for POST /quotes)"),
    }
    if config.quote_max_age_secs == 0 {
        println!("  Max Quote Age: disabled");
    } else {
        println!("  Max Quote Age: {}s", config.quote_max_age_secs);
    }
    println!("  Min Profit Margin: {}%", config.min_profit_margin);
    match config.default_stake {
        Some(stake) => println!("  Default Stake: {}", stake),
        None => println!("  Default Stake: (none)"),
    }
    println!("  Parallel Scan: {}", config.parallel_scan);
    println!("  Port: {}", config.port);
    println!("  Permissive CORS: {}", config.cors_permissive);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Scan one snapshot file and print the results.
async fn cmd_scan(
    file: PathBuf,
    stake: Option<Decimal>,
    json: bool,
    max_age_secs: Option<u64>,
) -> anyhow::Result<()> {
    let config = load_config()?;
    let stake = stake.or(config.default_stake);

    let snapshot = QuoteSnapshot::load(&file).await?;
    let (quotes, rejected) = snapshot.quotes();
    if !rejected.is_empty() {
        warn!(rejected = rejected.len(), "Some quote records could not be resolved");
    }

    let mut options = config.scan_options(OffsetDateTime::now_utc());
    if let Some(secs) = max_age_secs {
        options.max_quote_age = max_age_from_secs(secs);
    }
    let report = scan(quotes, &options);

    if json {
        let records = report
            .opportunities
            .iter()
            .map(|opp| OpportunityRecord::new(opp, stake))
            .collect::<Result<Vec<_>, _>>()?;
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!("======================================================================");
    println!(
        "ARBITRAGE SCAN - {} events, {} opportunities, {} skipped",
        report.events_evaluated,
        report.opportunities.len(),
        report.skipped.len()
    );
    println!("======================================================================");

    for opp in &report.opportunities {
        println!(
            "{} vs {} ({}, {}) margin {:.2}%",
            opp.home_team,
            opp.away_team,
            opp.sport,
            opp.market_type,
            opp.profit_margin_display()
        );
        for leg in &opp.stakes {
            println!(
                "  {:<5} @ {:>6.2}  {:<20} stake {:>6.2}%",
                leg.outcome,
                leg.price,
                leg.bookmaker,
                leg.stake_proportion * 100.0
            );
        }
        if let Some(total) = stake {
            match plan_stakes(opp, total) {
                Ok(plan) => {
                    let bets = plan
                        .legs
                        .iter()
                        .map(|l| format!("{} {}", l.outcome, l.stake))
                        .collect::<Vec<_>>()
                        .join(", ");
                    println!(
                        "  Bankroll {}: {} -> payout {} profit {}",
                        plan.total_stake, bets, plan.guaranteed_payout, plan.guaranteed_profit
                    );
                }
                Err(e @ StakeError::InvalidStake(_)) => return Err(e.into()),
                Err(e) => println!("  Bankroll {}: not sized ({})", total, e),
            }
        }
        println!("----------------------------------------------------------------------");
    }

    for skipped in &report.skipped {
        println!("SKIPPED {}: {}", skipped.event_id, skipped.reason);
    }
    if report.quotes_discarded > 0 {
        println!("Quotes discarded: {}", report.quotes_discarded);
    }

    Ok(())
}

/// Run the HTTP API until shutdown.
async fn cmd_serve(
    port_override: Option<u16>,
    quotes_override: Option<PathBuf>,
    max_age_override: Option<u64>,
) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let mut config = load_config()?;

    if let Some(port) = port_override {
        config.port = port;
    }
    if let Some(path) = quotes_override {
        config.quotes_path = Some(path);
    }
    if let Some(secs) = max_age_override {
        config.quote_max_age_secs = secs;
    }

    // Initialize metrics
    let handle = PrometheusBuilder::new().install_recorder()?;
    metrics::init_metrics();

    info!(
        port = config.port,
        max_age_secs = config.quote_max_age_secs,
        min_profit_margin = %config.min_profit_margin,
        parallel_scan = config.parallel_scan,
        "Configuration loaded"
    );

    let quotes_path = config.quotes_path.clone();
    let port = config.port;
    let app_state = AppState::new(config).with_metrics(handle);

    if let Some(path) = quotes_path {
        match QuoteSnapshot::load(&path).await {
            Ok(snapshot) => app_state.replace_snapshot(snapshot).await,
            Err(e) => {
                error!("Failed to load quote snapshot: {}", e);
                return Err(e.into());
            }
        }
    } else {
        warn!("No QUOTES_PATH set; service is not ready until quotes are posted");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    let router = create_router(app_state.clone());
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    app_state.set_ready(false);
    info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scan_subcommand() {
        let args = Args::parse_from(["sports-arb", "scan", "odds.json", "--stake", "100", "--json"]);

        match args.command {
            Some(Command::Scan {
                file, stake, json, ..
            }) => {
                assert_eq!(file, PathBuf::from("odds.json"));
                assert_eq!(stake, Some(Decimal::ONE_HUNDRED));
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn defaults_to_serve() {
        let args = Args::parse_from(["sports-arb", "--verbose"]);
        assert!(args.verbose);
        assert!(args.command.is_none());
    }
}

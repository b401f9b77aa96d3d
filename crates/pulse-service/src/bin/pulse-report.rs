//! # pulse-report
//!
//! Builds the full dashboard overview from an order fixture and prints it as
//! JSON.
//!
//! ## Usage
//! ```bash
//! # Month to date, evaluated now
//! cargo run -p pulse-service --bin pulse-report -- --orders ./orders.json
//!
//! # A past month, with inventory levels and inbound shipments
//! cargo run -p pulse-service --bin pulse-report -- \
//!     --orders ./orders.json --period 2025-10 \
//!     --inventory ./levels.json --db ./inbound.db
//!
//! # One SKU's daily series as CSV, written to <sku>_<period>_trends.csv
//! cargo run -p pulse-service --bin pulse-report -- \
//!     --orders ./orders.json --period mtd --csv 102270
//!
//! # Evaluate as of a fixed instant
//! cargo run -p pulse-service --bin pulse-report -- \
//!     --orders ./orders.json --period weekly --now 2025-10-15T02:00:00Z
//! ```
//!
//! Logs go to stderr so stdout stays valid JSON. Set `RUST_LOG` to change
//! verbosity.

use chrono::{DateTime, Utc};
use pulse_core::timeseries::csv_filename;
use pulse_core::types::{Granularity, InventoryLevel};
use pulse_service::{DashboardService, InMemoryOrderSource, PulseConfig};
use pulse_store::{Database, DbConfig};
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    orders: Option<PathBuf>,
    period: Option<String>,
    now: Option<String>,
    config: Option<PathBuf>,
    db: Option<PathBuf>,
    inventory: Option<PathBuf>,
    csv_sku: Option<String>,
    help: bool,
}

fn parse_args() -> Args {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args::default();

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1).cloned();
        match args[i].as_str() {
            "--orders" | "-o" => {
                parsed.orders = value.map(PathBuf::from);
                i += 1;
            }
            "--period" | "-p" => {
                parsed.period = value;
                i += 1;
            }
            "--now" => {
                parsed.now = value;
                i += 1;
            }
            "--config" | "-c" => {
                parsed.config = value.map(PathBuf::from);
                i += 1;
            }
            "--db" | "-d" => {
                parsed.db = value.map(PathBuf::from);
                i += 1;
            }
            "--inventory" | "-i" => {
                parsed.inventory = value.map(PathBuf::from);
                i += 1;
            }
            "--csv" => {
                parsed.csv_sku = value;
                i += 1;
            }
            "--help" | "-h" => parsed.help = true,
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    parsed
}

fn print_help() {
    println!("Storefront Pulse Report");
    println!();
    println!("Usage: pulse-report --orders <FILE> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -o, --orders <FILE>      JSON array of order records (required)");
    println!("  -p, --period <TOKEN>     daily | weekly | mtd | ytd | all | YYYY-MM (default: mtd)");
    println!("      --now <RFC3339>      Evaluate as of this instant (default: now)");
    println!("  -c, --config <FILE>      Config file (default: platform config dir pulse.toml)");
    println!("  -d, --db <FILE>          Inbound order database");
    println!("  -i, --inventory <FILE>   JSON array of {{ sku, onHand }} levels");
    println!("      --csv <SKU>          Write the SKU's daily series as CSV instead of JSON");
    println!("  -h, --help               Show this help message");
}

/// Initializes the tracing subscriber for structured logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pulse=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args();
    if args.help {
        print_help();
        return Ok(());
    }

    init_tracing();

    let Some(orders_path) = args.orders else {
        print_help();
        return Err("--orders is required".into());
    };

    let now: DateTime<Utc> = match &args.now {
        Some(raw) => DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc),
        None => Utc::now(),
    };
    let period = args.period.unwrap_or_else(|| "mtd".to_string());

    let config = PulseConfig::load(args.config)?;
    let source = InMemoryOrderSource::from_json_file(&orders_path).await?;

    let levels: Vec<InventoryLevel> = match &args.inventory {
        Some(path) => serde_json::from_str(&tokio::fs::read_to_string(path).await?)?,
        None => Vec::new(),
    };

    let mut service = DashboardService::new(source, config)?;
    if let Some(db_path) = args.db {
        let db = Database::new(DbConfig::new(db_path)).await?;
        info!(inbound = db.inbound_orders().count().await?, "Inbound store attached");
        service = service.with_store(db);
    }

    if let Some(sku) = &args.csv_sku {
        let series = service.product_series(&period, now, Some(sku), Granularity::Day).await?;
        let path = csv_filename(sku, &period);
        tokio::fs::write(&path, series.to_csv()?).await?;
        info!(path = %path, rows = series.buckets.len(), "Series exported");
        return Ok(());
    }

    let overview = service.overview(&period, now, &levels).await?;
    println!("{}", serde_json::to_string_pretty(&overview)?);

    Ok(())
}

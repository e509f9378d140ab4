//! # Rebuild Balances
//!
//! Re-derives every sale's remaining balance and status from the payment
//! ledger and rewrites the ones that have drifted. Use after a crash between
//! a payment write and its balance sync, or after two processes wrote to the
//! same database.
//!
//! ## Usage
//! ```bash
//! # Repair every sale
//! cargo run -p tread-reconcile --bin rebuild-balances
//!
//! # Only active sales of one customer, report drift without writing
//! cargo run -p tread-reconcile --bin rebuild-balances -- \
//!   --status active --customer CUST_ID --dry-run
//!
//! # Explicit config file
//! cargo run -p tread-reconcile --bin rebuild-balances -- --config ./tread.toml
//! ```
//!
//! Exits with status 1 if any sale could not be repaired.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tread_core::{SaleFilter, SaleStatus};
use tread_db::{Database, DbConfig};
use tread_reconcile::{sqlite_engine, ReconcileConfig, SalesStore, SqliteEngine};

/// Command-line arguments, parsed by hand.
#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    filter: SaleFilter,
    dry_run: bool,
}

impl Args {
    fn parse() -> Result<Option<Self>, String> {
        let args: Vec<String> = env::args().collect();
        let mut parsed = Args::default();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--config" | "-c" => {
                    parsed.config = Some(PathBuf::from(value(&args, i, "--config")?));
                    i += 1;
                }
                "--status" | "-s" => {
                    let status = value(&args, i, "--status")?
                        .parse::<SaleStatus>()
                        .map_err(|e| format!("Invalid --status: {}", e))?;
                    parsed.filter.status = Some(status);
                    i += 1;
                }
                "--customer" => {
                    parsed.filter.customer_id = Some(value(&args, i, "--customer")?.to_string());
                    i += 1;
                }
                "--dry-run" | "-n" => parsed.dry_run = true,
                "--help" | "-h" => {
                    print_help();
                    return Ok(None);
                }
                other => return Err(format!("Unknown argument: {}", other)),
            }
            i += 1;
        }

        Ok(Some(parsed))
    }
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, String> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| format!("{} requires a value", flag))
}

fn print_help() {
    println!("Tread Installments - Rebuild Balances");
    println!();
    println!("Usage: rebuild-balances [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>    Config file (default: TREAD_CONFIG or platform config dir)");
    println!("  -s, --status <STATUS>  Only sales with this status (active, completed, defaulted)");
    println!("      --customer <ID>    Only sales of this customer");
    println!("  -n, --dry-run          Report drift without writing");
    println!("  -h, --help             Show this help message");
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tread_reconcile=debug,sqlx=warn")),
        )
        .init();

    let args = match Args::parse() {
        Ok(Some(args)) => args,
        Ok(None) => return ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("Run with --help for usage.");
            return ExitCode::from(2);
        }
    };

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!(error = %err, "Rebuild aborted");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every examined sale is now consistent.
async fn run(args: Args) -> Result<bool, Box<dyn std::error::Error>> {
    let config = ReconcileConfig::load(args.config)?;
    let db_path = config.database_path();
    info!(path = %db_path.display(), "Opening database");

    let db = Database::new(
        DbConfig::new(&db_path).max_connections(config.database.max_connections),
    )
    .await?;
    let engine = sqlite_engine(&db, &config);

    let clean = if args.dry_run {
        report_drift(&engine, &args.filter).await?
    } else {
        let report = engine.recompute_all(&args.filter).await?;

        println!("Examined:  {}", report.examined);
        println!("Corrected: {}", report.corrected);
        println!("Failed:    {}", report.failures.len());
        for failure in &report.failures {
            println!("  {} - {}", failure.sale_id, failure.error);
        }
        report.is_clean()
    };

    db.close().await;
    Ok(clean)
}

/// Compares cached balances with live ones without writing anything.
async fn report_drift(
    engine: &SqliteEngine,
    filter: &SaleFilter,
) -> Result<bool, Box<dyn std::error::Error>> {
    let mut drifted = 0;
    let mut unreadable = 0;

    let sales = engine.sales_store().get_sales(filter).await?;
    for sale in &sales {
        match engine.derive_sale_balance(&sale.id).await {
            Ok((sale, live)) => {
                let status = sale.status.reconciled(live.is_settled);
                if live.remaining_balance != sale.remaining_balance() || status != sale.status {
                    drifted += 1;
                    println!(
                        "  {}  cached {} ({})  live {} ({})",
                        sale.sale_number,
                        sale.remaining_balance(),
                        sale.status,
                        live.remaining_balance,
                        status
                    );
                }
            }
            Err(err) => {
                unreadable += 1;
                println!("  {} - {}", sale.sale_number, err);
            }
        }
    }

    println!("Examined: {}", sales.len());
    println!("Drifted:  {}", drifted);
    println!("Failed:   {}", unreadable);
    Ok(unreadable == 0)
}

mod commands;
mod input;
mod output;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::dispatch::{RevenueArgs, SimulateArgs};
use commands::negotiation::{OfferArgs, PlanArgs};
use commands::schedule::ScheduleArgs;
use settle_core::{Clock, FixedClock, SystemClock};

/// Debt settlement schedules, offers and payment dispatch
#[derive(Parser)]
#[command(
    name = "settle",
    version,
    about = "Debt settlement schedules, offers and payment dispatch",
    long_about = "A CLI for debt settlement negotiation with decimal precision. \
                  Builds installment schedules, derives plans from creditor terms, \
                  classifies one-time settlement offers, splits revenue shares and \
                  simulates payment submissions against sandbox gateways."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Evaluate as of this date instead of the system date (YYYY-MM-DD)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    /// Log debug detail to stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the payment schedule for an installment plan
    Schedule(ScheduleArgs),
    /// Derive an installment plan from a balance and creditor terms
    Plan(PlanArgs),
    /// Classify a one-time settlement offer (pay now vs offer only)
    Offer(OfferArgs),
    /// Split a collected amount into platform and company shares
    RevenueSplit(RevenueArgs),
    /// Run a payment submission through sandbox gateways
    Simulate(SimulateArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time(),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let clock: Box<dyn Clock> = match cli.today {
        Some(date) => Box::new(FixedClock(date)),
        None => Box::new(SystemClock),
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::schedule::run_schedule(args, clock.as_ref()),
        Commands::Plan(args) => commands::negotiation::run_plan(args, clock.as_ref()),
        Commands::Offer(args) => commands::negotiation::run_offer(args, clock.as_ref()),
        Commands::RevenueSplit(args) => commands::dispatch::run_revenue_split(args),
        Commands::Simulate(args) => commands::dispatch::run_simulate(args, clock.as_ref()),
        Commands::Version => {
            println!("settle {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

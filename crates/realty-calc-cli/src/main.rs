mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use realty_calc_core::RealtyCalcError;

use commands::deals::{BuyVsRentArgs, FlipArgs, HoldingCostArgs, RenovationArgs};
use commands::equity::{EquityBandsArgs, EquityGrowthArgs};
use commands::financing::{AmortizeArgs, MortgageArgs, PaymentArgs};
use commands::portfolio::PortfolioArgs;
use commands::rental::{BreakEvenArgs, CapRateArgs, RentalYieldArgs, RoiArgs};

/// Real-estate investment calculators
#[derive(Parser)]
#[command(
    name = "realty",
    version,
    about = "Real-estate investment calculators",
    long_about = "A CLI for real-estate investment analysis with decimal precision. \
                  Covers mortgages, rental break-even, cap rate, ROI, flips, \
                  buy-vs-rent, equity growth projections and portfolios. \
                  Input is JSON or YAML via --input or stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Month-by-month amortization schedule for a fixed-rate loan
    Amortize(AmortizeArgs),
    /// Level monthly payment for a loan
    Payment(PaymentArgs),
    /// Full mortgage cost with taxes, insurance, PMI and prepayments
    Mortgage(MortgageArgs),
    /// Revenue needed to break even on a long- or short-term rental
    BreakEven(BreakEvenArgs),
    /// Going-in, stabilized and exit cap rates
    CapRate(CapRateArgs),
    /// Total and annualized return over a holding period
    Roi(RoiArgs),
    /// Gross and net rental yield
    RentalYield(RentalYieldArgs),
    /// Fix-and-flip profit, break-even sale price and 70% rule
    Flip(FlipArgs),
    /// Monthly carrying cost of a held property
    HoldingCost(HoldingCostArgs),
    /// Return on a renovation by appraisal and income approaches
    Renovation(RenovationArgs),
    /// Compare owning against renting and investing the difference
    BuyVsRent(BuyVsRentArgs),
    /// Deterministic month-by-month equity projection
    EquityGrowth(EquityGrowthArgs),
    /// Simulated P5/P50/P95 equity bands
    EquityBands(EquityBandsArgs),
    /// Aggregate metrics, IRR and stress tests for a property portfolio
    Portfolio(PortfolioArgs),
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

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Amortize(args) => commands::financing::run_amortize(args),
        Commands::Payment(args) => commands::financing::run_payment(args),
        Commands::Mortgage(args) => commands::financing::run_mortgage(args),
        Commands::BreakEven(args) => commands::rental::run_break_even(args),
        Commands::CapRate(args) => commands::rental::run_cap_rate(args),
        Commands::Roi(args) => commands::rental::run_roi(args),
        Commands::RentalYield(args) => commands::rental::run_rental_yield(args),
        Commands::Flip(args) => commands::deals::run_flip(args),
        Commands::HoldingCost(args) => commands::deals::run_holding_cost(args),
        Commands::Renovation(args) => commands::deals::run_renovation(args),
        Commands::BuyVsRent(args) => commands::deals::run_buy_vs_rent(args),
        Commands::EquityGrowth(args) => commands::equity::run_equity_growth(args),
        Commands::EquityBands(args) => commands::equity::run_equity_bands(args),
        Commands::Portfolio(args) => commands::portfolio::run_portfolio(args),
        Commands::Version => {
            println!("realty {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            let message = match e.downcast_ref::<RealtyCalcError>() {
                Some(calc_err) => calc_err.user_message(),
                None => e.to_string(),
            };
            eprintln!("{}: {}", "error".red().bold(), message);
            process::exit(1);
        }
    }
}

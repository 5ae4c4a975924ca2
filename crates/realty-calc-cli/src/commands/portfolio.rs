use clap::Args;
use serde_json::Value;

use realty_calc_core::portfolio::aggregate::{analyze_portfolio, PortfolioInput};

use crate::input;

/// Arguments for portfolio analysis
#[derive(Args)]
pub struct PortfolioArgs {
    /// Path to JSON/YAML input file with a `properties` array
    #[arg(long)]
    pub input: Option<String>,

    /// IRR horizon in years (overrides the input file)
    #[arg(long)]
    pub horizon_years: Option<u32>,
}

pub fn run_portfolio(args: PortfolioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut portfolio_input: PortfolioInput = input::load(&args.input)?;
    if let Some(years) = args.horizon_years {
        portfolio_input.horizon_years = years;
    }
    let result = analyze_portfolio(&portfolio_input)?;
    Ok(serde_json::to_value(result)?)
}

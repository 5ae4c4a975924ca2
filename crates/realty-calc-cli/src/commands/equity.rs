use clap::Args;
use serde_json::Value;

use realty_calc_core::equity_growth::monte_carlo::simulate_equity_bands;
use realty_calc_core::equity_growth::projection::{calculate_equity_growth, EquityGrowthInput};

use crate::input;

/// Arguments for the deterministic equity projection
#[derive(Args)]
pub struct EquityGrowthArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for simulated equity bands
#[derive(Args)]
pub struct EquityBandsArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Number of simulated paths (overrides the input file)
    #[arg(long)]
    pub runs: Option<u32>,

    /// Random seed (overrides the input file)
    #[arg(long)]
    pub seed: Option<u32>,
}

pub fn run_equity_growth(args: EquityGrowthArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let eg_input: EquityGrowthInput = input::load(&args.input)?;
    let result = calculate_equity_growth(&eg_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_equity_bands(args: EquityBandsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut eg_input: EquityGrowthInput = input::load(&args.input)?;
    if let Some(runs) = args.runs {
        eg_input.simulation_runs = runs;
    }
    if let Some(seed) = args.seed {
        eg_input.seed = seed;
    }
    let result = simulate_equity_bands(&eg_input)?;
    Ok(serde_json::to_value(result)?)
}

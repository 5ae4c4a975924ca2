use clap::Args;
use serde_json::Value;

use realty_calc_core::deals::buy_vs_rent::{calculate_buy_vs_rent, BuyVsRentInput};
use realty_calc_core::deals::flip::{compute_flip_metrics, FlipInput};
use realty_calc_core::deals::holding_cost::{calculate_holding_cost, HoldingCostInput};
use realty_calc_core::deals::renovation::{calculate_renovation_roi, RenovationInput};

use crate::input;

/// Arguments for fix-and-flip analysis
#[derive(Args)]
pub struct FlipArgs {
    /// Path to JSON/YAML input file with purchase, rehab, financing and sale
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for carrying cost
#[derive(Args)]
pub struct HoldingCostArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for renovation ROI
#[derive(Args)]
pub struct RenovationArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for buy-vs-rent comparison
#[derive(Args)]
pub struct BuyVsRentArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_flip(args: FlipArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let flip_input: FlipInput = input::load(&args.input)?;
    let result = compute_flip_metrics(&flip_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_holding_cost(args: HoldingCostArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let holding_input: HoldingCostInput = input::load(&args.input)?;
    let result = calculate_holding_cost(&holding_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_renovation(args: RenovationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let reno_input: RenovationInput = input::load(&args.input)?;
    let result = calculate_renovation_roi(&reno_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_buy_vs_rent(args: BuyVsRentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let bvr_input: BuyVsRentInput = input::load(&args.input)?;
    let result = calculate_buy_vs_rent(&bvr_input)?;
    Ok(serde_json::to_value(result)?)
}

use clap::Args;
use serde_json::Value;

use realty_calc_core::rental::break_even::{calculate_break_even, BreakEvenInput};
use realty_calc_core::rental::cap_rate::{calculate_cap_rate, CapRateInput};
use realty_calc_core::rental::rental_yield::{calculate_rental_yield, RentalYieldInput};
use realty_calc_core::rental::roi::{calculate_roi, RoiInput};

use crate::input;

/// Arguments for rental break-even analysis
#[derive(Args)]
pub struct BreakEvenArgs {
    /// Path to JSON/YAML input file with the property and operating costs
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for cap rate analysis
#[derive(Args)]
pub struct CapRateArgs {
    /// Path to JSON/YAML input file with income and expenses
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for holding-period ROI
#[derive(Args)]
pub struct RoiArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for rental yield
#[derive(Args)]
pub struct RentalYieldArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_break_even(args: BreakEvenArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let be_input: BreakEvenInput = input::load(&args.input)?;
    let result = calculate_break_even(&be_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_cap_rate(args: CapRateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cap_input: CapRateInput = input::load(&args.input)?;
    let result = calculate_cap_rate(&cap_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_roi(args: RoiArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let roi_input: RoiInput = input::load(&args.input)?;
    let result = calculate_roi(&roi_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_rental_yield(args: RentalYieldArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let yield_input: RentalYieldInput = input::load(&args.input)?;
    let result = calculate_rental_yield(&yield_input)?;
    Ok(serde_json::to_value(result)?)
}

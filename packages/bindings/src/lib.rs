use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::Serialize;

use realty_calc_core::{coerce, RealtyCalcError, RealtyCalcResult};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Calculator failures carry the form-facing wording.
fn calc_error(e: RealtyCalcError) -> napi::Error {
    napi::Error::from_reason(e.user_message())
}

/// Parse the form JSON, run the engine, serialise the result.
fn run_json<I, O>(input_json: &str, engine: impl FnOnce(&I) -> RealtyCalcResult<O>) -> NapiResult<String>
where
    I: DeserializeOwned,
    O: Serialize,
{
    let input: I = coerce::parse_input(input_json).map_err(calc_error)?;
    let output = engine(&input).map_err(calc_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Financing
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_mortgage(input_json: String) -> NapiResult<String> {
    run_json(&input_json, realty_calc_core::financing::mortgage::calculate_mortgage)
}

#[napi]
pub fn calculate_amortization(input_json: String) -> NapiResult<String> {
    run_json(
        &input_json,
        |terms: &realty_calc_core::financing::amortization::LoanTerms| {
            Ok(realty_calc_core::financing::amortization::amortize(terms)?.collect::<Vec<_>>())
        },
    )
}

// ---------------------------------------------------------------------------
// Rental
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_break_even(input_json: String) -> NapiResult<String> {
    run_json(&input_json, realty_calc_core::rental::break_even::calculate_break_even)
}

#[napi]
pub fn calculate_cap_rate(input_json: String) -> NapiResult<String> {
    run_json(&input_json, realty_calc_core::rental::cap_rate::calculate_cap_rate)
}

#[napi]
pub fn calculate_roi(input_json: String) -> NapiResult<String> {
    run_json(&input_json, realty_calc_core::rental::roi::calculate_roi)
}

#[napi]
pub fn calculate_rental_yield(input_json: String) -> NapiResult<String> {
    run_json(&input_json, realty_calc_core::rental::rental_yield::calculate_rental_yield)
}

// ---------------------------------------------------------------------------
// Deals
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_flip(input_json: String) -> NapiResult<String> {
    run_json(&input_json, realty_calc_core::deals::flip::compute_flip_metrics)
}

#[napi]
pub fn calculate_holding_cost(input_json: String) -> NapiResult<String> {
    run_json(&input_json, realty_calc_core::deals::holding_cost::calculate_holding_cost)
}

#[napi]
pub fn calculate_renovation_roi(input_json: String) -> NapiResult<String> {
    run_json(&input_json, realty_calc_core::deals::renovation::calculate_renovation_roi)
}

#[napi]
pub fn calculate_buy_vs_rent(input_json: String) -> NapiResult<String> {
    run_json(&input_json, realty_calc_core::deals::buy_vs_rent::calculate_buy_vs_rent)
}

// ---------------------------------------------------------------------------
// Equity growth
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_equity_growth(input_json: String) -> NapiResult<String> {
    run_json(&input_json, realty_calc_core::equity_growth::projection::calculate_equity_growth)
}

#[napi]
pub fn simulate_equity_bands(input_json: String) -> NapiResult<String> {
    run_json(&input_json, realty_calc_core::equity_growth::monte_carlo::simulate_equity_bands)
}

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_portfolio(input_json: String) -> NapiResult<String> {
    run_json(&input_json, realty_calc_core::portfolio::aggregate::analyze_portfolio)
}

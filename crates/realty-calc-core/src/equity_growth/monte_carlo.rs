use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::time::Instant;

use crate::coerce::parse_rate;
use crate::equity_growth::projection::{build_plan, EquityGrowthInput};
use crate::equity_growth::rng::Lcg;
use crate::error::RealtyCalcError;
use crate::types::{with_metadata_f64, ComputationOutput};
use crate::RealtyCalcResult;

const MAX_SIMULATION_RUNS: u32 = 100_000;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Percentile equity bands, one entry per month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityBands {
    #[serde(rename = "P5")]
    pub p5: Vec<f64>,
    #[serde(rename = "P50")]
    pub p50: Vec<f64>,
    #[serde(rename = "P95")]
    pub p95: Vec<f64>,
    pub terminal: TerminalEquity,
    pub runs: u32,
    pub seed: u32,
}

/// Distribution of equity in the final month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalEquity {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub probability_negative: f64,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Simulate appreciation paths and report 5th/50th/95th percentile equity.
///
/// Each path draws a normal monthly shock around the expected monthly
/// appreciation. Renovations and the loan balance follow the deterministic
/// plan, so only property value varies between paths.
pub fn simulate_equity_bands(
    input: &EquityGrowthInput,
) -> RealtyCalcResult<ComputationOutput<EquityBands>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.simulation_runs == 0 {
        return Err(RealtyCalcError::InvalidInput {
            field: "simulation_runs".into(),
            reason: "At least one simulation path is required".into(),
        });
    }
    if input.simulation_runs > MAX_SIMULATION_RUNS {
        return Err(RealtyCalcError::InvalidInput {
            field: "simulation_runs".into(),
            reason: format!("At most {MAX_SIMULATION_RUNS} simulation paths are supported"),
        });
    }
    let plan = build_plan(input, &mut warnings)?;
    let months = plan.horizon_months as usize;
    let runs = input.simulation_runs as usize;

    let annual_mean = to_f64(parse_rate(input.appreciation_rate));
    let drift = (1.0 + annual_mean).powf(1.0 / 12.0) - 1.0;
    let volatility = fractional(input.appreciation_volatility) / 12.0_f64.sqrt();
    if volatility == 0.0 {
        warnings.push("Zero volatility; every path follows the expected appreciation".into());
    }

    let balances: Vec<f64> = (0..plan.horizon_months)
        .map(|m| to_f64(plan.balance_at(m)))
        .collect();
    let uplift_factors: Vec<f64> = (0..plan.horizon_months)
        .map(|m| {
            plan.renovations_at(m)
                .map(|event| 1.0 + to_f64(event.uplift_fraction))
                .product()
        })
        .collect();

    // equity[month][path]
    let mut equity = vec![vec![0.0_f64; runs]; months];
    let home_price = to_f64(input.home_price);
    let seed = u64::from(input.seed);

    for path in 0..runs {
        let mut rng = Lcg::for_path(seed, path as u64);
        let mut value = home_price;
        for month in 0..months {
            let shock = drift + volatility * rng.standard_normal();
            value *= (1.0 + shock).max(0.0);
            value *= uplift_factors[month];
            equity[month][path] = value - balances[month];
        }
    }

    let mut p5 = Vec::with_capacity(months);
    let mut p50 = Vec::with_capacity(months);
    let mut p95 = Vec::with_capacity(months);
    for row in equity.iter_mut() {
        row.sort_by(|a, b| a.total_cmp(b));
        p5.push(row[percentile_index(5.0, runs)]);
        p50.push(row[percentile_index(50.0, runs)]);
        p95.push(row[percentile_index(95.0, runs)]);
    }

    let terminal = terminal_summary(&equity[months - 1]);
    if terminal.probability_negative > 0.0 {
        warnings.push(format!(
            "{:.1}% of paths end with negative equity",
            terminal.probability_negative * 100.0
        ));
    }

    tracing::debug!(runs, months, seed = input.seed, "equity bands simulated");

    let output = EquityBands {
        p5,
        p50,
        p95,
        terminal,
        runs: input.simulation_runs,
        seed: input.seed,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata_f64(
        "Monte Carlo equity bands (seeded LCG, Box-Muller monthly shocks)",
        &serde_json::json!({
            "runs": input.simulation_runs,
            "seed": input.seed,
            "appreciation_mean": annual_mean,
            "appreciation_volatility": fractional(input.appreciation_volatility),
            "horizon_months": plan.horizon_months,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Index of the `p`th percentile in a sorted sample of `n` values.
fn percentile_index(p: f64, n: usize) -> usize {
    ((p / 100.0 * n as f64).floor() as usize).min(n.saturating_sub(1))
}

/// Same percent-or-fraction convention as `parse_rate`.
fn fractional(rate: f64) -> f64 {
    if rate.abs() > 1.0 {
        rate / 100.0
    } else {
        rate
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// `sorted` must be in ascending order.
fn terminal_summary(sorted: &[f64]) -> TerminalEquity {
    let n = sorted.len();
    let std_dev = if n > 1 { sorted.iter().std_dev() } else { 0.0 };
    let negatives = sorted.iter().filter(|e| **e < 0.0).count();
    TerminalEquity {
        mean: sorted.iter().mean(),
        std_dev,
        min: sorted.first().copied().unwrap_or(0.0),
        max: sorted.last().copied().unwrap_or(0.0),
        probability_negative: negatives as f64 / n as f64,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equity_growth::projection::RenovationEntry;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn volatile_home() -> EquityGrowthInput {
        EquityGrowthInput {
            home_price: dec!(350000),
            down_payment: dec!(70000),
            interest_rate: dec!(6),
            loan_term_years: 30,
            horizon_years: 5,
            appreciation_rate: dec!(4),
            appreciation_volatility: 10.0,
            simulation_runs: 200,
            ..Default::default()
        }
    }

    #[test]
    fn test_bands_cover_every_month() {
        let out = simulate_equity_bands(&volatile_home()).unwrap().result;
        assert_eq!(out.p5.len(), 60);
        assert_eq!(out.p50.len(), 60);
        assert_eq!(out.p95.len(), 60);
        assert_eq!(out.seed, 42);
    }

    #[test]
    fn test_identical_inputs_identical_bands() {
        let a = simulate_equity_bands(&volatile_home()).unwrap().result;
        let b = simulate_equity_bands(&volatile_home()).unwrap().result;
        assert_eq!(a, b);
    }

    #[test]
    fn test_seed_changes_bands() {
        let mut other = volatile_home();
        other.seed = 7;
        let a = simulate_equity_bands(&volatile_home()).unwrap().result;
        let b = simulate_equity_bands(&other).unwrap().result;
        assert_ne!(a.p50, b.p50);
    }

    #[test]
    fn test_zero_volatility_collapses_bands() {
        let mut input = volatile_home();
        input.appreciation_volatility = 0.0;
        let out = simulate_equity_bands(&input).unwrap().result;
        for m in 0..60 {
            assert_eq!(out.p5[m], out.p95[m]);
        }
        assert_eq!(out.terminal.std_dev, 0.0);
    }

    #[test]
    fn test_renovation_lifts_every_band() {
        let mut input = volatile_home();
        input.appreciation_volatility = 0.0;
        let base = simulate_equity_bands(&input).unwrap().result;
        input.renovations.push(RenovationEntry {
            month_index: Some(12),
            uplift: dec!(10),
            ..Default::default()
        });
        let renovated = simulate_equity_bands(&input).unwrap().result;
        assert_eq!(renovated.p50[11], base.p50[11]);
        assert!(renovated.p50[12] > base.p50[12]);
    }

    #[test]
    fn test_percentile_index_clamped() {
        assert_eq!(percentile_index(5.0, 1000), 50);
        assert_eq!(percentile_index(95.0, 1000), 950);
        assert_eq!(percentile_index(95.0, 1), 0);
        assert_eq!(percentile_index(100.0, 10), 9);
    }

    #[test]
    fn test_zero_runs_rejected() {
        let mut input = volatile_home();
        input.simulation_runs = 0;
        assert!(simulate_equity_bands(&input).is_err());
    }

    #[test]
    fn test_run_count_beyond_limit_rejected() {
        let mut input = volatile_home();
        input.simulation_runs = u32::MAX;
        assert!(simulate_equity_bands(&input).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_percentiles_ordered(seed in 0u32..10_000, vol in 0.0f64..40.0, runs in 1u32..60) {
            let mut input = volatile_home();
            input.seed = seed;
            input.appreciation_volatility = vol;
            input.simulation_runs = runs;
            input.horizon_years = 2;
            let out = simulate_equity_bands(&input).unwrap().result;
            for m in 0..out.p50.len() {
                prop_assert!(out.p5[m] <= out.p50[m]);
                prop_assert!(out.p50[m] <= out.p95[m]);
            }
        }
    }
}

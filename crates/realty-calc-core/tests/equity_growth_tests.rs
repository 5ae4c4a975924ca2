use pretty_assertions::assert_eq;
use realty_calc_core::coerce::parse_input;
use realty_calc_core::equity_growth::monte_carlo::simulate_equity_bands;
use realty_calc_core::equity_growth::projection::{
    calculate_equity_growth, EquityGrowthInput, RenovationEntry,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn financed_home() -> EquityGrowthInput {
    EquityGrowthInput {
        home_price: dec!(400000),
        down_payment: dec!(40000),
        interest_rate: dec!(6.5),
        loan_term_years: 30,
        horizon_years: 10,
        appreciation_rate: dec!(3),
        pmi_rate: dec!(0.005),
        ..Default::default()
    }
}

// ===========================================================================
// Deterministic projection
// ===========================================================================

#[test]
fn test_pmi_stays_off_after_value_falls() {
    let mut input = financed_home();
    input.appreciation_rate = dec!(-10);
    input.renovations.push(RenovationEntry {
        label: "Addition".into(),
        month_index: Some(3),
        cost: dec!(60000),
        uplift: dec!(20),
        ..Default::default()
    });
    let out = calculate_equity_growth(&input).unwrap().result;

    assert_eq!(out.pmi_removed_month, Some(3));
    let after = &out.monthly_table[3..];
    assert!(after.iter().all(|row| row.pmi == Decimal::ZERO));
    // Depreciation pushes LTV back above the stop level without re-enabling PMI
    assert!(after.iter().any(|row| row.ltv > dec!(0.78)));
}

#[test]
fn test_projection_from_form_json() {
    let json = r#"{
        "homePrice": "400000",
        "downPayment": "40000",
        "interestRate": "6.5",
        "loanTermYears": "30",
        "horizonYears": "5",
        "startDate": "2025-01",
        "appreciationRate": "0.03",
        "renovations": [
            {"label": "Kitchen", "date": "2026-07-01", "cost": "25000", "uplift": "8"}
        ]
    }"#;
    let input: EquityGrowthInput = parse_input(json).unwrap();
    let out = calculate_equity_growth(&input).unwrap().result;
    assert_eq!(out.monthly_table.len(), 60);
    assert_eq!(out.renovations.len(), 1);
    assert_eq!(out.renovations[0].month_index, 18);
    assert_eq!(out.renovations[0].uplift_fraction, dec!(0.08));
    assert_eq!(out.cost_breakdown.total_renovation, dec!(25000));
}

#[test]
fn test_equity_identity_every_month() {
    let out = calculate_equity_growth(&financed_home()).unwrap().result;
    for (i, row) in out.monthly_table.iter().enumerate() {
        assert_eq!(row.equity, row.property_value - row.loan_balance);
        assert_eq!(out.equity_values[i], row.equity);
    }
    assert_eq!(out.equity_at_horizon, out.equity_values[119]);
}

// ===========================================================================
// Simulated bands
// ===========================================================================

fn volatile_home() -> EquityGrowthInput {
    EquityGrowthInput {
        simulation_runs: 300,
        seed: 7,
        appreciation_volatility: 0.08,
        ..financed_home()
    }
}

#[test]
fn test_bands_are_reproducible_for_a_seed() {
    let a = simulate_equity_bands(&volatile_home()).unwrap().result;
    let b = simulate_equity_bands(&volatile_home()).unwrap().result;
    assert_eq!(a, b);
}

#[test]
fn test_bands_differ_across_seeds() {
    let a = simulate_equity_bands(&volatile_home()).unwrap().result;
    let mut other = volatile_home();
    other.seed = 8;
    let b = simulate_equity_bands(&other).unwrap().result;
    assert_ne!(a.p50, b.p50);
}

#[test]
fn test_bands_are_ordered_and_sized() {
    let bands = simulate_equity_bands(&volatile_home()).unwrap().result;
    assert_eq!(bands.p5.len(), 120);
    assert_eq!(bands.p50.len(), 120);
    assert_eq!(bands.p95.len(), 120);
    for m in 0..120 {
        assert!(bands.p5[m] <= bands.p50[m]);
        assert!(bands.p50[m] <= bands.p95[m]);
    }
    assert!(bands.p95[119] > bands.p5[119]);
}

#[test]
fn test_zero_volatility_collapses_bands() {
    let mut input = volatile_home();
    input.appreciation_volatility = 0.0;
    let bands = simulate_equity_bands(&input).unwrap().result;
    assert_eq!(bands.p5, bands.p95);
    assert_eq!(bands.terminal.probability_negative, 0.0);
}

#[test]
fn test_bands_serialize_with_percentile_keys() {
    let out = simulate_equity_bands(&volatile_home()).unwrap();
    let json = serde_json::to_value(&out.result).unwrap();
    assert!(json["P5"].is_array());
    assert!(json["P95"].is_array());
    assert!(json["terminal"]["probabilityNegative"].is_number());
}

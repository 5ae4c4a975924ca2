use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::property::{Property, PropertyMetrics};
use super::stress::{run_stress_tests, StressResult};
use crate::coerce;
use crate::error::RealtyCalcError;
use crate::time_value::{check_years, irr};
use crate::types::{
    as_pct, ratio_or_none, ratio_or_zero, with_metadata, ComputationOutput, Currency, Money,
    Percent,
};
use crate::RealtyCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

fn default_horizon_years() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioInput {
    pub properties: Vec<Property>,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default = "default_horizon_years", deserialize_with = "coerce::count")]
    pub horizon_years: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioOutput {
    pub currency: Currency,
    pub properties: Vec<PropertyMetrics>,
    pub total_value: Money,
    pub total_debt: Money,
    pub total_equity: Money,
    pub total_gross_income: Money,
    pub total_noi: Money,
    pub total_debt_service: Money,
    pub total_cash_flow: Money,
    pub total_cash_invested: Money,
    /// Value-weighted cap rate
    pub weighted_cap_rate: Percent,
    pub weighted_dscr: Option<Decimal>,
    pub portfolio_ltv: Decimal,
    pub cash_on_cash: Percent,
    pub cash_flows: Vec<Money>,
    /// `None` when the flows have no rate of return inside the search range,
    /// as with a portfolio that loses money every year.
    pub irr: Option<Percent>,
    pub irr_converged: bool,
    pub stress_tests: Vec<StressResult>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Per-property metrics, portfolio totals, IRR and stress sensitivities.
pub fn analyze_portfolio(
    input: &PortfolioInput,
) -> RealtyCalcResult<ComputationOutput<PortfolioOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.properties.is_empty() {
        return Err(RealtyCalcError::InsufficientData(
            "Portfolio contains no properties".into(),
        ));
    }
    if input.horizon_years == 0 {
        return Err(RealtyCalcError::InvalidInput {
            field: "horizon_years".into(),
            reason: "Holding horizon must be at least one year".into(),
        });
    }

    let properties = input
        .properties
        .iter()
        .map(Property::metrics)
        .collect::<RealtyCalcResult<Vec<_>>>()?;

    let total_value: Money = properties.iter().map(|p| p.current_value).sum();
    let total_debt: Money = properties.iter().map(|p| p.loan_balance).sum();
    let total_equity: Money = properties.iter().map(|p| p.equity).sum();
    let total_gross_income: Money = properties.iter().map(|p| p.gross_income).sum();
    let total_noi: Money = properties.iter().map(|p| p.noi).sum();
    let total_debt_service: Money = properties.iter().map(|p| p.annual_debt_service).sum();
    let total_cash_flow: Money = properties.iter().map(|p| p.net_cash_flow).sum();
    let total_cash_invested: Money = input
        .properties
        .iter()
        .map(|p| p.down_payment + p.closing_costs)
        .sum();

    for p in &properties {
        if let Some(dscr) = p.dscr {
            if dscr < Decimal::ONE {
                warnings.push(format!("{}: DSCR {dscr:.2} is below 1.00x", p.name));
            }
        }
        if p.equity < Decimal::ZERO {
            warnings.push(format!("{}: loan balance exceeds value", p.name));
        }
    }

    // --- IRR on combined flows ---
    let years = check_years(input.horizon_years, "horizon_years")? as usize;
    let mut cash_flows = Vec::with_capacity(years + 1);
    cash_flows.push(-total_cash_invested);
    cash_flows.extend(std::iter::repeat(total_cash_flow).take(years));
    cash_flows[years] += total_equity;

    let estimate = irr(&cash_flows, dec!(0.10))?;
    let portfolio_irr = if estimate.at_search_bound() {
        warnings.push("Cash flows have no IRR within -99% to 1000%; IRR is not reported".into());
        None
    } else {
        if !estimate.converged {
            warnings.push(format!(
                "IRR did not converge after {} iterations; showing last estimate",
                estimate.iterations
            ));
        }
        Some(as_pct(estimate.rate))
    };

    let stress_tests = run_stress_tests(&input.properties)?;

    tracing::debug!(
        properties = properties.len(),
        %total_equity,
        irr = ?portfolio_irr,
        "portfolio analysed"
    );

    let output = PortfolioOutput {
        currency: input.currency.clone(),
        properties,
        total_value,
        total_debt,
        total_equity,
        total_gross_income,
        total_noi,
        total_debt_service,
        total_cash_flow,
        total_cash_invested,
        weighted_cap_rate: as_pct(ratio_or_zero(total_noi, total_value)),
        weighted_dscr: ratio_or_none(total_noi, total_debt_service),
        portfolio_ltv: ratio_or_zero(total_debt, total_value),
        cash_on_cash: as_pct(ratio_or_zero(total_cash_flow, total_cash_invested)),
        cash_flows,
        irr: portfolio_irr,
        irr_converged: estimate.converged,
        stress_tests,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Portfolio aggregation with value-weighted cap rate, Newton-Raphson IRR and stress tests",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::property::PropertyIncome;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn duplex() -> Property {
        Property {
            name: "Duplex".into(),
            income: PropertyIncome::Residential {
                monthly_rent: dec!(3200),
                vacancy_percent: dec!(5),
                rent_growth_percent: Decimal::ZERO,
            },
            purchase_price: dec!(450000),
            current_value: dec!(500000),
            loan_balance: dec!(340000),
            interest_rate: dec!(6.5),
            loan_term_years: 28,
            down_payment: dec!(90000),
            closing_costs: dec!(12000),
            operating_expenses: dec!(8000),
        }
    }

    fn shop() -> Property {
        Property {
            name: "Corner shop".into(),
            income: PropertyIncome::Commercial {
                annual_lease: dec!(60000),
                escalation_percent: dec!(2),
            },
            purchase_price: dec!(700000),
            current_value: dec!(750000),
            loan_balance: dec!(400000),
            interest_rate: dec!(7),
            loan_term_years: 20,
            down_payment: dec!(300000),
            closing_costs: dec!(20000),
            operating_expenses: dec!(6000),
        }
    }

    fn input(properties: Vec<Property>) -> PortfolioInput {
        PortfolioInput {
            properties,
            currency: Currency::USD,
            horizon_years: 5,
        }
    }

    #[test]
    fn test_single_property_equity_matches() {
        let out = analyze_portfolio(&input(vec![duplex()])).unwrap().result;
        assert_eq!(out.total_equity, out.properties[0].equity);
        assert_eq!(out.total_equity, dec!(160000));
    }

    #[test]
    fn test_totals_sum_properties() {
        let out = analyze_portfolio(&input(vec![duplex(), shop()])).unwrap().result;
        let equity: Money = out.properties.iter().map(|p| p.equity).sum();
        assert_eq!(out.total_equity, equity);
        assert_eq!(out.total_value, dec!(1250000));
        assert_eq!(out.portfolio_ltv, dec!(740000) / dec!(1250000));
    }

    #[test]
    fn test_weighted_cap_rate_is_noi_over_value() {
        let out = analyze_portfolio(&input(vec![duplex(), shop()])).unwrap().result;
        assert_eq!(
            out.weighted_cap_rate,
            out.total_noi / out.total_value * dec!(100)
        );
        assert_eq!(
            out.weighted_dscr,
            Some(out.total_noi / out.total_debt_service)
        );
    }

    #[test]
    fn test_irr_flows_shape() {
        let out = analyze_portfolio(&input(vec![duplex(), shop()])).unwrap().result;
        assert_eq!(out.cash_flows.len(), 6);
        assert_eq!(out.cash_flows[0], dec!(-422000));
        assert_eq!(out.cash_flows[5], out.total_cash_flow + out.total_equity);
        assert!(out.irr_converged);
        assert!(out.irr.is_some());
    }

    #[test]
    fn test_loss_making_portfolio_reports_no_irr() {
        let underwater = Property {
            name: "Underwater condo".into(),
            income: PropertyIncome::Residential {
                monthly_rent: dec!(900),
                vacancy_percent: dec!(10),
                rent_growth_percent: Decimal::ZERO,
            },
            purchase_price: dec!(150000),
            current_value: dec!(100000),
            loan_balance: dec!(120000),
            interest_rate: dec!(7),
            loan_term_years: 30,
            down_payment: dec!(30000),
            closing_costs: dec!(5000),
            operating_expenses: dec!(9000),
        };
        let mut portfolio = input(vec![underwater]);
        portfolio.horizon_years = 30;
        let result = analyze_portfolio(&portfolio).unwrap();
        assert!(result.result.cash_flows.iter().all(|cf| *cf < Decimal::ZERO));
        assert_eq!(result.result.irr, None);
        assert!(!result.result.irr_converged);
        assert!(result.warnings.iter().any(|w| w.contains("IRR is not reported")));
    }

    #[test]
    fn test_horizon_beyond_limit_rejected() {
        let mut portfolio = input(vec![duplex()]);
        portfolio.horizon_years = u32::MAX;
        assert!(analyze_portfolio(&portfolio).is_err());
    }

    #[test]
    fn test_stress_results_included() {
        let out = analyze_portfolio(&input(vec![duplex()])).unwrap().result;
        assert_eq!(out.stress_tests.len(), 4);
    }

    #[test]
    fn test_empty_portfolio_rejected() {
        let err = analyze_portfolio(&input(vec![])).unwrap_err();
        assert!(matches!(err, RealtyCalcError::InsufficientData(_)));
    }
}

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::property::{Property, PropertyIncome, PropertyMetrics};
use crate::types::Money;
use crate::RealtyCalcResult;

/// The fixed set of shocks applied to every property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StressScenario {
    /// Rents down 10%
    RentDown,
    /// Occupancy down 15 points
    OccupancyDown,
    /// Interest rates up 2 points
    RateUp,
    /// Property values down 20%
    ValueDown,
}

impl StressScenario {
    pub const ALL: [StressScenario; 4] = [
        StressScenario::RentDown,
        StressScenario::OccupancyDown,
        StressScenario::RateUp,
        StressScenario::ValueDown,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StressScenario::RentDown => "Rent -10%",
            StressScenario::OccupancyDown => "Occupancy -15%",
            StressScenario::RateUp => "Interest rate +2%",
            StressScenario::ValueDown => "Property value -20%",
        }
    }

    /// The property as it looks under this shock.
    pub fn apply(&self, property: &Property) -> Property {
        let mut stressed = property.clone();
        match self {
            StressScenario::RentDown => scale_income(&mut stressed.income, dec!(0.90)),
            StressScenario::OccupancyDown => match &mut stressed.income {
                PropertyIncome::Residential {
                    vacancy_percent, ..
                } => *vacancy_percent = (*vacancy_percent + dec!(15)).min(dec!(100)),
                PropertyIncome::Airbnb {
                    occupancy_percent, ..
                } => *occupancy_percent = (*occupancy_percent - dec!(15)).max(Decimal::ZERO),
                // Lease income has no occupancy; treat the shock as lost income.
                income => scale_income(income, dec!(0.85)),
            },
            StressScenario::RateUp => stressed.interest_rate += dec!(2),
            StressScenario::ValueDown => stressed.current_value *= dec!(0.80),
        }
        stressed
    }
}

fn scale_income(income: &mut PropertyIncome, factor: Decimal) {
    match income {
        PropertyIncome::Residential { monthly_rent, .. } => *monthly_rent *= factor,
        PropertyIncome::Airbnb { nightly_rate, .. } => *nightly_rate *= factor,
        PropertyIncome::Commercial { annual_lease, .. } => *annual_lease *= factor,
        PropertyIncome::Land { annual_rent, .. } => *annual_rent *= factor,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StressResult {
    pub scenario: StressScenario,
    pub label: String,
    pub base_equity: Money,
    pub stressed_equity: Money,
    /// Stressed minus base; negative means the shock destroys equity
    pub impact: Money,
}

/// Equity one year out: value revalued at the current cap rate, less the
/// loan, plus a year of net cash flow.
pub fn forward_equity(property: &Property, base: &PropertyMetrics) -> RealtyCalcResult<Money> {
    let metrics = property.metrics()?;
    let value = if base.noi > Decimal::ZERO {
        property.current_value * metrics.noi / base.noi
    } else {
        property.current_value
    };
    Ok(value - property.loan_balance + metrics.net_cash_flow)
}

/// Run every scenario over the portfolio.
pub fn run_stress_tests(properties: &[Property]) -> RealtyCalcResult<Vec<StressResult>> {
    let base_metrics = properties
        .iter()
        .map(Property::metrics)
        .collect::<RealtyCalcResult<Vec<_>>>()?;

    let mut base_equity = Decimal::ZERO;
    for (property, base) in properties.iter().zip(&base_metrics) {
        base_equity += forward_equity(property, base)?;
    }

    StressScenario::ALL
        .iter()
        .map(|scenario| {
            let mut stressed_equity = Decimal::ZERO;
            for (property, base) in properties.iter().zip(&base_metrics) {
                stressed_equity += forward_equity(&scenario.apply(property), base)?;
            }
            Ok(StressResult {
                scenario: *scenario,
                label: scenario.label().to_string(),
                base_equity,
                stressed_equity,
                impact: stressed_equity - base_equity,
            })
        })
        .collect()
}

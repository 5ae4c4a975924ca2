use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::coerce;
use crate::error::RealtyCalcError;
use crate::time_value::{monthly_payment, term_months};
use crate::types::{pct, ratio_or_none, with_metadata, ComputationOutput, LineItem, Money, Percent};
use crate::RealtyCalcResult;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingCostInput {
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub property_value: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub loan_amount: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub interest_rate: Percent,
    #[serde(default, deserialize_with = "coerce::count")]
    pub loan_term_years: u32,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub annual_property_tax: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub annual_insurance: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub monthly_hoa: Money,
    /// Annual maintenance as a percent of property value
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub maintenance_percent: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub monthly_utilities: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub monthly_security: Money,
    /// Return forgone on the owner's equity
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub opportunity_cost_rate: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub monthly_rent: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub vacancy_percent: Percent,
    #[serde(default, deserialize_with = "coerce::count")]
    pub holding_period_months: u32,
    #[serde(default, deserialize_with = "coerce::optional_decimal")]
    pub square_feet: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingCostOutput {
    pub monthly_costs: Vec<LineItem>,
    pub gross_monthly_cost: Money,
    /// Vacancy-adjusted rent credited against costs
    pub rental_offset: Money,
    pub net_monthly_cost: Money,
    pub annual_cost: Money,
    pub holding_period_cost: Money,
    pub cost_per_sqft: Option<Money>,
    pub cost_per_day: Money,
}

/// Net monthly, annual and per-period cost of carrying a property.
pub fn calculate_holding_cost(
    input: &HoldingCostInput,
) -> RealtyCalcResult<ComputationOutput<HoldingCostOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mortgage = if input.loan_amount > Decimal::ZERO {
        if input.loan_term_years == 0 {
            return Err(RealtyCalcError::InvalidInput {
                field: "loan_term_years".into(),
                reason: "A loan balance needs a positive term".into(),
            });
        }
        let months = term_months(input.loan_term_years, "loan_term_years")?;
        monthly_payment(input.loan_amount, pct(input.interest_rate), months)?
    } else {
        Decimal::ZERO
    };

    let equity = (input.property_value - input.loan_amount).max(Decimal::ZERO);
    let monthly_costs = vec![
        LineItem::new("Mortgage P&I", mortgage),
        LineItem::new("Property tax", input.annual_property_tax / dec!(12)),
        LineItem::new("Insurance", input.annual_insurance / dec!(12)),
        LineItem::new("HOA", input.monthly_hoa),
        LineItem::new(
            "Maintenance",
            input.property_value * pct(input.maintenance_percent) / dec!(12),
        ),
        LineItem::new("Utilities", input.monthly_utilities),
        LineItem::new("Security", input.monthly_security),
        LineItem::new(
            "Opportunity cost",
            equity * pct(input.opportunity_cost_rate) / dec!(12),
        ),
    ];
    let gross_monthly_cost: Money = monthly_costs.iter().map(|item| item.amount).sum();

    let rental_offset = input.monthly_rent * (Decimal::ONE - pct(input.vacancy_percent));
    let net_monthly_cost = gross_monthly_cost - rental_offset;
    if net_monthly_cost < Decimal::ZERO {
        warnings.push("Rental income exceeds carrying costs; the property is cash-flow positive".into());
    }

    let annual_cost = net_monthly_cost * dec!(12);
    let cost_per_sqft = match input.square_feet {
        Some(sqft) if sqft > Decimal::ZERO => ratio_or_none(annual_cost, sqft),
        _ => None,
    };

    let output = HoldingCostOutput {
        monthly_costs,
        gross_monthly_cost,
        rental_offset,
        net_monthly_cost,
        annual_cost,
        holding_period_cost: net_monthly_cost * Decimal::from(input.holding_period_months),
        cost_per_sqft,
        cost_per_day: annual_cost / dec!(365),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Carrying cost net of vacancy-adjusted rent",
        input,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn vacant_lot() -> HoldingCostInput {
        HoldingCostInput {
            property_value: dec!(240000),
            annual_property_tax: dec!(3600),
            annual_insurance: dec!(1200),
            monthly_hoa: dec!(100),
            maintenance_percent: dec!(1),
            monthly_utilities: dec!(150),
            monthly_security: dec!(50),
            holding_period_months: 6,
            ..Default::default()
        }
    }

    #[test]
    fn test_unlevered_costs() {
        let out = calculate_holding_cost(&vacant_lot()).unwrap().result;
        // 300 + 100 + 100 + 200 + 150 + 50
        assert_eq!(out.gross_monthly_cost, dec!(900));
        assert_eq!(out.annual_cost, dec!(10800));
        assert_eq!(out.holding_period_cost, dec!(5400));
        assert_eq!(out.cost_per_day, dec!(10800) / dec!(365));
        assert!(out.cost_per_sqft.is_none());
    }

    #[test]
    fn test_rent_offset_with_vacancy() {
        let mut input = vacant_lot();
        input.monthly_rent = dec!(1000);
        input.vacancy_percent = dec!(10);
        let out = calculate_holding_cost(&input).unwrap().result;
        assert_eq!(out.rental_offset, dec!(900));
        assert_eq!(out.net_monthly_cost, Decimal::ZERO);
    }

    #[test]
    fn test_opportunity_cost_on_equity() {
        let mut input = vacant_lot();
        input.loan_amount = dec!(180000);
        input.interest_rate = dec!(6);
        input.loan_term_years = 30;
        input.opportunity_cost_rate = dec!(5);
        let out = calculate_holding_cost(&input).unwrap().result;
        let opportunity = out
            .monthly_costs
            .iter()
            .find(|item| item.label == "Opportunity cost")
            .unwrap();
        assert_eq!(opportunity.amount, dec!(250));
        assert!(out.gross_monthly_cost > dec!(1150));
    }

    #[test]
    fn test_cost_per_sqft() {
        let mut input = vacant_lot();
        input.square_feet = Some(dec!(1800));
        let out = calculate_holding_cost(&input).unwrap().result;
        assert_eq!(out.cost_per_sqft, Some(dec!(6)));
    }

    #[test]
    fn test_loan_term_beyond_limit_rejected() {
        let mut input = vacant_lot();
        input.loan_amount = dec!(180000);
        input.interest_rate = dec!(6);
        input.loan_term_years = u32::MAX;
        assert!(calculate_holding_cost(&input).is_err());
    }
}

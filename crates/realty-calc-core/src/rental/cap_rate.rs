use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::coerce;
use crate::time_value::{check_years, grow};
use crate::types::{
    as_pct, pct, ratio_or_none, ratio_or_zero, with_metadata, ComputationOutput, Money, Percent,
};
use crate::RealtyCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Annual operating statement for a cap-rate analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapRateInput {
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub purchase_price: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub annual_gross_rent: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub other_annual_income: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub vacancy_percent: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub credit_loss_percent: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub property_taxes: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub insurance: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub maintenance: Money,
    /// Percent of effective gross income
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub management_percent: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub utilities: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub hoa: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub capital_reserves: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub other_expenses: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub rent_growth_percent: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub expense_growth_percent: Percent,
    #[serde(default, deserialize_with = "coerce::count")]
    pub holding_period_years: u32,
    /// Expected sale price; takes precedence over `exit_cap_rate`
    #[serde(default, deserialize_with = "coerce::optional_decimal")]
    pub exit_value: Option<Money>,
    #[serde(default, deserialize_with = "coerce::optional_decimal")]
    pub exit_cap_rate: Option<Percent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoiProjection {
    pub year: u32,
    pub effective_gross_income: Money,
    pub operating_expenses: Money,
    pub noi: Money,
    /// NOI over purchase price
    pub cap_rate: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapRateOutput {
    pub gross_potential_income: Money,
    pub vacancy_loss: Money,
    pub credit_loss: Money,
    pub effective_gross_income: Money,
    pub management_fee: Money,
    pub operating_expenses: Money,
    pub noi: Money,
    pub going_in_cap_rate: Percent,
    /// NOI grown over the holding period
    pub stabilized_noi: Money,
    pub stabilized_cap_rate: Percent,
    pub exit_value: Option<Money>,
    pub exit_cap_rate: Option<Percent>,
    /// Occupancy at which income just covers operating expenses
    pub break_even_occupancy: Percent,
    pub expense_ratio: Percent,
    pub gross_rent_multiplier: Option<Decimal>,
    pub projections: Vec<NoiProjection>,
}

/// One year of the operating statement after growth.
struct OperatingYear {
    egi: Money,
    expenses: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Going-in, stabilized and exit capitalization rates from an operating
/// statement.
pub fn calculate_cap_rate(
    input: &CapRateInput,
) -> RealtyCalcResult<ComputationOutput<CapRateOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.purchase_price <= Decimal::ZERO {
        warnings.push("Purchase price is zero; cap rates are reported as 0".into());
    }

    // --- Income ---
    let gross_potential_income = input.annual_gross_rent + input.other_annual_income;
    let vacancy_loss = gross_potential_income * pct(input.vacancy_percent);
    let credit_loss = gross_potential_income * pct(input.credit_loss_percent);
    let effective_gross_income = gross_potential_income - vacancy_loss - credit_loss;

    // --- Expenses ---
    let fixed_expenses = fixed_expenses(input);
    let management_fee = effective_gross_income * pct(input.management_percent);
    let operating_expenses = fixed_expenses + management_fee;
    let noi = effective_gross_income - operating_expenses;
    let going_in_cap_rate = as_pct(ratio_or_zero(noi, input.purchase_price));

    // --- Growth ---
    let years = check_years(input.holding_period_years, "holding_period_years")?;
    let projections = (1..=years)
        .map(|year| -> RealtyCalcResult<NoiProjection> {
            let op = operating_year(input, effective_gross_income, fixed_expenses, year - 1)?;
            let year_noi = op.egi - op.expenses;
            Ok(NoiProjection {
                year,
                effective_gross_income: op.egi,
                operating_expenses: op.expenses,
                noi: year_noi,
                cap_rate: as_pct(ratio_or_zero(year_noi, input.purchase_price)),
            })
        })
        .collect::<RealtyCalcResult<Vec<_>>>()?;

    let stabilized = operating_year(input, effective_gross_income, fixed_expenses, years)?;
    let stabilized_noi = stabilized.egi - stabilized.expenses;
    let stabilized_cap_rate = as_pct(ratio_or_zero(stabilized_noi, input.purchase_price));

    // --- Exit ---
    let (exit_value, exit_cap_rate) = match (input.exit_value, input.exit_cap_rate) {
        (Some(value), _) if value > Decimal::ZERO => {
            (Some(value), Some(as_pct(stabilized_noi / value)))
        }
        (_, Some(cap)) if cap > Decimal::ZERO => (Some(stabilized_noi / pct(cap)), Some(cap)),
        _ => (None, None),
    };

    if let (Some(exit_cap), true) = (exit_cap_rate, going_in_cap_rate > Decimal::ZERO) {
        if exit_cap < going_in_cap_rate {
            warnings.push(format!(
                "Exit cap rate {exit_cap:.2}% is below the going-in rate {going_in_cap_rate:.2}% (cap rate compression assumed)"
            ));
        }
    }

    let break_even_occupancy = as_pct(ratio_or_zero(operating_expenses, gross_potential_income));
    if break_even_occupancy > dec!(100) {
        warnings.push("Operating expenses exceed gross potential income".into());
    }
    let expense_ratio = as_pct(ratio_or_zero(operating_expenses, effective_gross_income));

    tracing::debug!(%noi, %going_in_cap_rate, %stabilized_cap_rate, "cap rate computed");

    let output = CapRateOutput {
        gross_potential_income,
        vacancy_loss,
        credit_loss,
        effective_gross_income,
        management_fee,
        operating_expenses,
        noi,
        going_in_cap_rate,
        stabilized_noi,
        stabilized_cap_rate,
        exit_value,
        exit_cap_rate,
        break_even_occupancy,
        expense_ratio,
        gross_rent_multiplier: ratio_or_none(input.purchase_price, gross_potential_income),
        projections,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Direct capitalization (NOI / price) with growth-adjusted stabilized NOI",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn fixed_expenses(input: &CapRateInput) -> Money {
    input.property_taxes
        + input.insurance
        + input.maintenance
        + input.utilities
        + input.hoa
        + input.capital_reserves
        + input.other_expenses
}

/// Income and expenses after `elapsed` years of growth. Management stays a
/// percent of the grown income.
fn operating_year(
    input: &CapRateInput,
    base_egi: Money,
    base_fixed: Money,
    elapsed: u32,
) -> RealtyCalcResult<OperatingYear> {
    let egi = grow(base_egi, pct(input.rent_growth_percent), elapsed)?;
    let fixed = grow(base_fixed, pct(input.expense_growth_percent), elapsed)?;
    Ok(OperatingYear {
        egi,
        expenses: fixed + egi * pct(input.management_percent),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_input() -> CapRateInput {
        CapRateInput {
            purchase_price: dec!(1000000),
            annual_gross_rent: dec!(120000),
            vacancy_percent: dec!(5),
            credit_loss_percent: dec!(1),
            property_taxes: dec!(12000),
            insurance: dec!(4000),
            maintenance: dec!(6000),
            management_percent: dec!(8),
            ..Default::default()
        }
    }

    #[test]
    fn test_going_in_cap_rate() {
        let out = calculate_cap_rate(&sample_input()).unwrap().result;
        assert_eq!(out.effective_gross_income, dec!(112800));
        assert_eq!(out.management_fee, dec!(9024));
        assert_eq!(out.operating_expenses, dec!(31024));
        assert_eq!(out.noi, dec!(81776));
        assert_eq!(out.going_in_cap_rate, dec!(8.1776));
    }

    #[test]
    fn test_no_growth_keeps_stabilized_equal() {
        let mut input = sample_input();
        input.holding_period_years = 5;
        let out = calculate_cap_rate(&input).unwrap().result;
        assert_eq!(out.stabilized_noi, out.noi);
        assert_eq!(out.projections.len(), 5);
        assert_eq!(out.projections[0].noi, out.noi);
    }

    #[test]
    fn test_growth_raises_stabilized_noi() {
        let mut input = sample_input();
        input.holding_period_years = 5;
        input.rent_growth_percent = dec!(3);
        input.expense_growth_percent = dec!(2);
        let out = calculate_cap_rate(&input).unwrap().result;
        assert!(out.stabilized_noi > out.noi);
        assert!(out.stabilized_cap_rate > out.going_in_cap_rate);
        assert!(out.projections[4].noi < out.stabilized_noi);
    }

    #[test]
    fn test_exit_cap_from_exit_value() {
        let mut input = sample_input();
        input.exit_value = Some(dec!(1022200));
        let out = calculate_cap_rate(&input).unwrap().result;
        assert_eq!(out.exit_cap_rate, Some(dec!(8)));
    }

    #[test]
    fn test_implied_exit_value_from_cap() {
        let mut input = sample_input();
        input.exit_cap_rate = Some(dec!(8));
        let out = calculate_cap_rate(&input).unwrap().result;
        assert_eq!(out.exit_value, Some(dec!(1022200)));
    }

    #[test]
    fn test_break_even_occupancy_and_expense_ratio() {
        let out = calculate_cap_rate(&sample_input()).unwrap().result;
        let expected = dec!(31024) / dec!(120000) * dec!(100);
        assert_eq!(out.break_even_occupancy, expected);
        assert!(out.expense_ratio > out.break_even_occupancy);
    }

    #[test]
    fn test_zero_price_is_guarded() {
        let mut input = sample_input();
        input.purchase_price = Decimal::ZERO;
        let result = calculate_cap_rate(&input).unwrap();
        assert_eq!(result.result.going_in_cap_rate, Decimal::ZERO);
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn test_holding_period_beyond_limit_rejected() {
        let mut input = sample_input();
        input.holding_period_years = u32::MAX;
        assert!(calculate_cap_rate(&input).is_err());
    }
}

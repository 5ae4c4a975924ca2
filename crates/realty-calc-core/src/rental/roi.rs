use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
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

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiInput {
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub purchase_price: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub closing_costs: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub renovation_costs: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub monthly_rent: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub monthly_expenses: Money,
    /// Annual property appreciation
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub appreciation_rate: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub rent_growth_percent: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub expense_growth_percent: Percent,
    #[serde(default, deserialize_with = "coerce::count")]
    pub holding_period_years: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiYear {
    pub year: u32,
    pub property_value: Money,
    pub net_income: Money,
    pub cumulative_income: Money,
    pub total_return: Money,
    pub roi: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiOutput {
    pub total_investment: Money,
    /// First-year net operating income
    pub net_annual_income: Money,
    pub cumulative_income: Money,
    pub future_property_value: Money,
    pub capital_gain: Money,
    pub total_return: Money,
    pub roi: Percent,
    pub annualized_roi: Percent,
    pub cash_on_cash: Percent,
    pub payback_years: Option<Decimal>,
    pub projections: Vec<RoiYear>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Total and annualized return from rental income plus appreciation.
pub fn calculate_roi(input: &RoiInput) -> RealtyCalcResult<ComputationOutput<RoiOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    check_years(input.holding_period_years, "holding_period_years")?;

    let total_investment = input.purchase_price + input.closing_costs + input.renovation_costs;
    if total_investment <= Decimal::ZERO {
        warnings.push("Total investment is zero; ROI is reported as 0".into());
    }
    if input.holding_period_years == 0 {
        warnings.push("Holding period of 0 years; no income or appreciation accrues".into());
    }

    let appreciation = pct(input.appreciation_rate);
    let rent_growth = pct(input.rent_growth_percent);
    let expense_growth = pct(input.expense_growth_percent);

    let net_income_in = |year: u32| -> RealtyCalcResult<Money> {
        let elapsed = year.saturating_sub(1);
        let rent = grow(input.monthly_rent, rent_growth, elapsed)?;
        let expenses = grow(input.monthly_expenses, expense_growth, elapsed)?;
        Ok((rent - expenses) * dec!(12))
    };

    let mut cumulative_income = Decimal::ZERO;
    let mut projections = Vec::with_capacity(input.holding_period_years as usize);
    for year in 1..=input.holding_period_years {
        let net_income = net_income_in(year)?;
        cumulative_income += net_income;
        let property_value = grow(input.purchase_price, appreciation, year)?;
        let total_return = property_value - total_investment + cumulative_income;
        projections.push(RoiYear {
            year,
            property_value,
            net_income,
            cumulative_income,
            total_return,
            roi: as_pct(ratio_or_zero(total_return, total_investment)),
        });
    }

    let future_property_value =
        grow(input.purchase_price, appreciation, input.holding_period_years)?;
    // Gain over everything put in, so closing and renovation costs are not
    // counted as appreciation.
    let capital_gain = future_property_value - total_investment;
    let total_return = capital_gain + cumulative_income;
    let roi_rate = ratio_or_zero(total_return, total_investment);
    let annualized_roi = as_pct(annualize(roi_rate, input.holding_period_years));

    let net_annual_income = net_income_in(1)?;
    let payback_years = if net_annual_income > Decimal::ZERO {
        ratio_or_none(total_investment, net_annual_income)
    } else {
        None
    };
    if net_annual_income < Decimal::ZERO {
        warnings.push("Expenses exceed rent; the property runs at a loss before appreciation".into());
    }

    tracing::debug!(%total_return, roi = %as_pct(roi_rate), "roi computed");

    let output = RoiOutput {
        total_investment,
        net_annual_income,
        cumulative_income,
        future_property_value,
        capital_gain,
        total_return,
        roi: as_pct(roi_rate),
        annualized_roi,
        cash_on_cash: as_pct(ratio_or_zero(net_annual_income, total_investment)),
        payback_years,
        projections,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Total return = appreciation + cumulative net income over total investment",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Geometric annual equivalent of a cumulative return.
fn annualize(total: Decimal, years: u32) -> Decimal {
    if years == 0 {
        return Decimal::ZERO;
    }
    let growth = Decimal::ONE + total;
    if growth <= Decimal::ZERO {
        return dec!(-1);
    }
    growth
        .checked_powd(Decimal::ONE / Decimal::from(years))
        .map(|g| g - Decimal::ONE)
        .unwrap_or(Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

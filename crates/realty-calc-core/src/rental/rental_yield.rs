use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::coerce;
use crate::error::RealtyCalcError;
use crate::time_value::{monthly_payment, term_months};
use crate::types::{
    as_pct, pct, ratio_or_none, ratio_or_zero, with_metadata, ComputationOutput, Money, Percent,
};
use crate::RealtyCalcResult;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalYieldInput {
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub purchase_price: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub closing_costs: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub renovation_costs: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub monthly_rent: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub other_monthly_income: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub vacancy_percent: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub annual_operating_expenses: Money,
    /// Unset means an all-cash purchase
    #[serde(default, deserialize_with = "coerce::optional_decimal")]
    pub down_payment_percent: Option<Percent>,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub interest_rate: Percent,
    #[serde(default, deserialize_with = "coerce::count")]
    pub loan_term_years: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalYieldOutput {
    pub total_cost: Money,
    pub annual_gross_income: Money,
    pub effective_gross_income: Money,
    pub noi: Money,
    pub loan_amount: Money,
    pub annual_debt_service: Money,
    pub cash_invested: Money,
    pub annual_cash_flow: Money,
    pub monthly_cash_flow: Money,
    /// Annual gross income over purchase price
    pub gross_yield: Percent,
    /// NOI over total cost
    pub net_yield: Percent,
    pub cash_on_cash: Percent,
    pub dscr: Option<Decimal>,
    pub payback_years: Option<Decimal>,
}

/// Gross, net and cash-on-cash yields for a buy-to-let.
pub fn calculate_rental_yield(
    input: &RentalYieldInput,
) -> RealtyCalcResult<ComputationOutput<RentalYieldOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let total_cost = input.purchase_price + input.closing_costs + input.renovation_costs;
    let annual_gross_income = (input.monthly_rent + input.other_monthly_income) * dec!(12);
    let effective_gross_income =
        annual_gross_income * (Decimal::ONE - pct(input.vacancy_percent));
    let noi = effective_gross_income - input.annual_operating_expenses;

    let down_share = input.down_payment_percent.map(pct).unwrap_or(Decimal::ONE);
    let loan_amount = (input.purchase_price * (Decimal::ONE - down_share)).max(Decimal::ZERO);
    let annual_debt_service = if loan_amount > Decimal::ZERO {
        if input.loan_term_years == 0 {
            return Err(RealtyCalcError::InvalidInput {
                field: "loan_term_years".into(),
                reason: "A financed purchase needs a positive loan term".into(),
            });
        }
        let months = term_months(input.loan_term_years, "loan_term_years")?;
        monthly_payment(loan_amount, pct(input.interest_rate), months)?
            * dec!(12)
    } else {
        Decimal::ZERO
    };

    let cash_invested = total_cost - loan_amount;
    let annual_cash_flow = noi - annual_debt_service;
    let payback_years = if annual_cash_flow > Decimal::ZERO {
        ratio_or_none(cash_invested, annual_cash_flow)
    } else {
        warnings.push("Cash flow is not positive; the investment never pays back".into());
        None
    };

    let output = RentalYieldOutput {
        total_cost,
        annual_gross_income,
        effective_gross_income,
        noi,
        loan_amount,
        annual_debt_service,
        cash_invested,
        annual_cash_flow,
        monthly_cash_flow: annual_cash_flow / dec!(12),
        gross_yield: as_pct(ratio_or_zero(annual_gross_income, input.purchase_price)),
        net_yield: as_pct(ratio_or_zero(noi, total_cost)),
        cash_on_cash: as_pct(ratio_or_zero(annual_cash_flow, cash_invested)),
        dscr: ratio_or_none(noi, annual_debt_service),
        payback_years,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Gross, net and cash-on-cash rental yield",
        input,
        warnings,
        elapsed,
        output,
    ))
}

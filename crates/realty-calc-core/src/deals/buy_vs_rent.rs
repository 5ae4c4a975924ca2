use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::coerce;
use crate::error::RealtyCalcError;
use crate::time_value::{balance_after, check_years, grow, monthly_payment, term_months};
use crate::types::{pct, with_metadata, ComputationOutput, Money, Percent};
use crate::RealtyCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyVsRentInput {
    // Buying
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub home_price: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub down_payment_percent: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub interest_rate: Percent,
    #[serde(default, deserialize_with = "coerce::count")]
    pub loan_term_years: u32,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub buying_closing_costs_percent: Percent,
    /// Annual property tax as a percent of current value
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub property_tax_percent: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub annual_insurance: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub monthly_hoa: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub maintenance_percent: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub appreciation_percent: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub selling_costs_percent: Percent,

    // Renting
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub monthly_rent: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub rent_growth_percent: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub monthly_renters_insurance: Money,
    /// Return earned on money the renter does not put into a home
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub investment_return_percent: Percent,

    #[serde(default, deserialize_with = "coerce::count")]
    pub years: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Buy,
    Rent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyVsRentYear {
    pub year: u32,
    pub home_value: Money,
    pub loan_balance: Money,
    pub owner_annual_cost: Money,
    pub renter_annual_cost: Money,
    /// Home equity net of selling costs
    pub owner_net_worth: Money,
    pub renter_net_worth: Money,
    /// Owner minus renter
    pub advantage: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyVsRentOutput {
    pub monthly_mortgage_payment: Money,
    pub upfront_cash: Money,
    pub total_owner_cost: Money,
    pub total_renter_cost: Money,
    pub final_owner_net_worth: Money,
    pub final_renter_net_worth: Money,
    pub final_advantage: Money,
    /// First year in which owning is ahead
    pub break_even_year: Option<u32>,
    pub recommendation: Recommendation,
    pub yearly: Vec<BuyVsRentYear>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compare owning against renting and investing the difference.
///
/// The renter starts with the buyer's upfront cash invested. Each year the
/// portfolio compounds and then absorbs the difference between the owner's
/// and the renter's costs, which can be negative.
pub fn calculate_buy_vs_rent(
    input: &BuyVsRentInput,
) -> RealtyCalcResult<ComputationOutput<BuyVsRentOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.years == 0 {
        return Err(RealtyCalcError::InvalidInput {
            field: "years".into(),
            reason: "Comparison horizon must be at least one year".into(),
        });
    }
    check_years(input.years, "years")?;

    let down_payment = input.home_price * pct(input.down_payment_percent);
    let loan_amount = (input.home_price - down_payment).max(Decimal::ZERO);
    let annual_rate = pct(input.interest_rate);
    let loan_months = term_months(input.loan_term_years, "loan_term_years")?;

    let payment = if loan_amount > Decimal::ZERO {
        if loan_months == 0 {
            return Err(RealtyCalcError::InvalidInput {
                field: "loan_term_years".into(),
                reason: "A financed purchase needs a positive loan term".into(),
            });
        }
        monthly_payment(loan_amount, annual_rate, loan_months)?
    } else {
        Decimal::ZERO
    };

    let upfront_cash = down_payment + input.home_price * pct(input.buying_closing_costs_percent);
    let appreciation = pct(input.appreciation_percent);
    let investment_return = pct(input.investment_return_percent);

    let mut yearly = Vec::with_capacity(input.years as usize);
    let mut renter_portfolio = upfront_cash;
    let mut total_owner_cost = Decimal::ZERO;
    let mut total_renter_cost = Decimal::ZERO;
    let mut break_even_year = None;

    for year in 1..=input.years {
        let value_at_start = grow(input.home_price, appreciation, year - 1)?;
        let home_value = grow(input.home_price, appreciation, year)?;

        let months_paid_before = (year - 1) * 12;
        let mortgage_months = loan_months.saturating_sub(months_paid_before).min(12);
        let loan_balance = if loan_amount > Decimal::ZERO {
            balance_after(loan_amount, annual_rate, loan_months, year * 12)?
        } else {
            Decimal::ZERO
        };

        let owner_annual_cost = payment * Decimal::from(mortgage_months)
            + value_at_start * pct(input.property_tax_percent)
            + input.annual_insurance
            + input.monthly_hoa * dec!(12)
            + value_at_start * pct(input.maintenance_percent);
        let rent = grow(input.monthly_rent, pct(input.rent_growth_percent), year - 1)?;
        let renter_annual_cost = (rent + input.monthly_renters_insurance) * dec!(12);

        renter_portfolio = renter_portfolio
            .checked_mul(Decimal::ONE + investment_return)
            .ok_or_else(|| RealtyCalcError::InvalidInput {
                field: "investment_return_percent".into(),
                reason: "Investment return compounds beyond the supported range".into(),
            })?
            + (owner_annual_cost - renter_annual_cost);
        total_owner_cost += owner_annual_cost;
        total_renter_cost += renter_annual_cost;

        let owner_net_worth =
            home_value * (Decimal::ONE - pct(input.selling_costs_percent)) - loan_balance;
        let advantage = owner_net_worth - renter_portfolio;
        if break_even_year.is_none() && advantage >= Decimal::ZERO {
            break_even_year = Some(year);
        }

        yearly.push(BuyVsRentYear {
            year,
            home_value,
            loan_balance,
            owner_annual_cost,
            renter_annual_cost,
            owner_net_worth,
            renter_net_worth: renter_portfolio,
            advantage,
        });
    }

    let (final_owner_net_worth, final_renter_net_worth) = yearly
        .last()
        .map(|row| (row.owner_net_worth, row.renter_net_worth))
        .unwrap_or((Decimal::ZERO, upfront_cash));
    let final_advantage = final_owner_net_worth - final_renter_net_worth;
    let recommendation = if final_advantage >= Decimal::ZERO {
        Recommendation::Buy
    } else {
        Recommendation::Rent
    };

    if break_even_year.is_none() {
        warnings.push(format!(
            "Owning never overtakes renting within {} years",
            input.years
        ));
    }

    tracing::debug!(%final_advantage, ?break_even_year, "buy vs rent compared");

    let output = BuyVsRentOutput {
        monthly_mortgage_payment: payment,
        upfront_cash,
        total_owner_cost,
        total_renter_cost,
        final_owner_net_worth,
        final_renter_net_worth,
        final_advantage,
        break_even_year,
        recommendation,
        yearly,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Owner equity after sale vs renter portfolio investing the cost difference",
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
    use rust_decimal_macros::dec;

    fn base_input() -> BuyVsRentInput {
        BuyVsRentInput {
            home_price: dec!(400000),
            down_payment_percent: dec!(20),
            interest_rate: dec!(6.5),
            loan_term_years: 30,
            buying_closing_costs_percent: dec!(3),
            property_tax_percent: dec!(1.1),
            annual_insurance: dec!(1500),
            maintenance_percent: dec!(1),
            appreciation_percent: dec!(4),
            selling_costs_percent: dec!(6),
            monthly_rent: dec!(2200),
            rent_growth_percent: dec!(3),
            investment_return_percent: dec!(6),
            years: 10,
            ..Default::default()
        }
    }

    #[test]
    fn test_yearly_rows_and_upfront_cash() {
        let out = calculate_buy_vs_rent(&base_input()).unwrap().result;
        assert_eq!(out.yearly.len(), 10);
        assert_eq!(out.upfront_cash, dec!(92000));
        assert_eq!(out.final_advantage, out.final_owner_net_worth - out.final_renter_net_worth);
    }

    #[test]
    fn test_loan_balance_declines() {
        let out = calculate_buy_vs_rent(&base_input()).unwrap().result;
        for pair in out.yearly.windows(2) {
            assert!(pair[1].loan_balance < pair[0].loan_balance);
        }
    }

    #[test]
    fn test_cheap_rent_favours_renting() {
        let mut input = base_input();
        input.monthly_rent = dec!(500);
        input.appreciation_percent = Decimal::ZERO;
        let result = calculate_buy_vs_rent(&input).unwrap();
        assert_eq!(result.result.recommendation, Recommendation::Rent);
        assert!(result.result.break_even_year.is_none());
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn test_expensive_rent_favours_buying() {
        let mut input = base_input();
        input.monthly_rent = dec!(5000);
        let out = calculate_buy_vs_rent(&input).unwrap().result;
        assert_eq!(out.recommendation, Recommendation::Buy);
        assert!(out.break_even_year.is_some());
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let mut input = base_input();
        input.years = 0;
        assert!(calculate_buy_vs_rent(&input).is_err());
    }

    #[test]
    fn test_out_of_range_horizons_rejected() {
        let mut input = base_input();
        input.years = u32::MAX;
        assert!(calculate_buy_vs_rent(&input).is_err());

        let mut input = base_input();
        input.loan_term_years = 400_000_000;
        assert!(calculate_buy_vs_rent(&input).is_err());
    }

    #[test]
    fn test_runaway_growth_is_error() {
        let mut input = base_input();
        input.appreciation_percent = dec!(1000);
        input.years = 100;
        assert!(calculate_buy_vs_rent(&input).is_err());
    }
}

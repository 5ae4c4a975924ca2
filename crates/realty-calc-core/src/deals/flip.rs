use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::coerce;
use crate::error::RealtyCalcError;
use crate::time_value::{balance_after, monthly_payment, term_months};
use crate::types::{
    as_pct, pct, ratio_or_zero, with_metadata, ComputationOutput, LineItem, Money, Percent,
};
use crate::RealtyCalcResult;

/// Share of ARV an investor should pay, before rehab, under the 70% rule.
const MAO_ARV_SHARE: Decimal = dec!(0.70);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

fn default_loan_term_years() -> u32 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlipInput {
    // Acquisition
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub purchase_price: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub closing_costs: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub rehab_budget: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub contingency_percent: Percent,

    // Financing
    /// Overrides the loan implied by `cash_percent`
    #[serde(default, deserialize_with = "coerce::optional_decimal")]
    pub loan_amount: Option<Money>,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub cash_percent: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub interest_rate: Percent,
    #[serde(default, deserialize_with = "coerce::flag")]
    pub interest_only: bool,
    #[serde(default = "default_loan_term_years", deserialize_with = "coerce::count")]
    pub loan_term_years: u32,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub points_percent: Percent,

    // Holding
    #[serde(default, deserialize_with = "coerce::count")]
    pub timeline_months: u32,
    /// Annual property tax as a percent of purchase price
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub property_tax_percent: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub monthly_insurance: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub monthly_utilities: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub other_monthly_holding: Money,

    // Sale
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub arv: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub commission_percent: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub seller_closing_costs: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub other_sale_costs: Money,
}

impl Default for FlipInput {
    fn default() -> Self {
        Self {
            purchase_price: Decimal::ZERO,
            closing_costs: Decimal::ZERO,
            rehab_budget: Decimal::ZERO,
            contingency_percent: Decimal::ZERO,
            loan_amount: None,
            cash_percent: Decimal::ZERO,
            interest_rate: Decimal::ZERO,
            interest_only: false,
            loan_term_years: default_loan_term_years(),
            points_percent: Decimal::ZERO,
            timeline_months: 0,
            property_tax_percent: Decimal::ZERO,
            monthly_insurance: Decimal::ZERO,
            monthly_utilities: Decimal::ZERO,
            other_monthly_holding: Decimal::ZERO,
            arv: Decimal::ZERO,
            commission_percent: Decimal::ZERO,
            seller_closing_costs: Decimal::ZERO,
            other_sale_costs: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlipOutput {
    pub loan_amount: Money,
    pub rehab_with_contingency: Money,
    pub holding_costs: Money,
    pub points_cost: Money,
    /// Level payment on an amortizing loan, zero when interest-only
    pub monthly_loan_payment: Money,
    /// Interest accrued (interest-only) or paid (amortized) over the hold
    pub total_interest: Money,
    /// Loan payments made from cash during the hold
    pub debt_service_paid: Money,
    pub payoff_balance: Money,
    pub total_project_cost: Money,
    pub total_cash_invested: Money,
    pub sale_costs: Money,
    pub net_profit: Money,
    pub roi: Percent,
    pub annualized_roi: Percent,
    /// Net profit as a share of ARV
    pub profit_margin: Percent,
    pub break_even_sale_price: Money,
    pub maximum_allowable_offer: Money,
    pub cost_breakdown: Vec<LineItem>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Profit, return and break-even sale price for a buy-rehab-sell project.
///
/// The lender funds `loan_amount` of the project cost; the investor funds
/// the rest. The loan principal is repaid once, inside `payoff_balance`.
pub fn compute_flip_metrics(input: &FlipInput) -> RealtyCalcResult<ComputationOutput<FlipOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.timeline_months == 0 {
        return Err(RealtyCalcError::InvalidInput {
            field: "timeline_months".into(),
            reason: "Project timeline must be at least one month".into(),
        });
    }
    let months = Decimal::from(input.timeline_months);

    // --- Financing ---
    let loan_amount = input
        .loan_amount
        .unwrap_or_else(|| input.purchase_price * (Decimal::ONE - pct(input.cash_percent)))
        .max(Decimal::ZERO);
    let annual_rate = pct(input.interest_rate);

    let (monthly_loan_payment, total_interest, debt_service_paid, payoff_balance) =
        if loan_amount.is_zero() {
            (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
        } else if input.interest_only {
            let interest = loan_amount * annual_rate * months / dec!(12);
            (Decimal::ZERO, interest, Decimal::ZERO, loan_amount + interest)
        } else {
            if input.loan_term_years == 0 {
                return Err(RealtyCalcError::InvalidInput {
                    field: "loan_term_years".into(),
                    reason: "An amortizing loan needs a positive term".into(),
                });
            }
            let loan_months = term_months(input.loan_term_years, "loan_term_years")?;
            let payment = monthly_payment(loan_amount, annual_rate, loan_months)?;
            let payoff =
                balance_after(loan_amount, annual_rate, loan_months, input.timeline_months)?;
            let paid = payment * Decimal::from(input.timeline_months.min(loan_months));
            let principal_repaid = loan_amount - payoff;
            (payment, paid - principal_repaid, paid, payoff)
        };

    // --- Project cost ---
    let rehab_with_contingency = input.rehab_budget * (Decimal::ONE + pct(input.contingency_percent));
    let monthly_tax = input.purchase_price * pct(input.property_tax_percent) / dec!(12);
    let monthly_holding =
        monthly_tax + input.monthly_insurance + input.monthly_utilities + input.other_monthly_holding;
    let holding_costs = monthly_holding * months;
    let points_cost = loan_amount * pct(input.points_percent);

    let total_project_cost = input.purchase_price
        + input.closing_costs
        + rehab_with_contingency
        + holding_costs
        + points_cost
        + debt_service_paid;
    let total_cash_invested = total_project_cost - loan_amount;

    // --- Sale ---
    let commission = pct(input.commission_percent);
    let fixed_sale_costs = input.seller_closing_costs + input.other_sale_costs;
    let sale_costs = input.arv * commission + fixed_sale_costs;

    let net_profit = input.arv - sale_costs - payoff_balance - total_cash_invested;
    let roi = as_pct(ratio_or_zero(net_profit, total_cash_invested));
    let annualized_roi = roi * dec!(12) / months;

    let break_even_sale_price = if commission >= Decimal::ONE {
        warnings.push("Commission of 100% or more leaves no sale price that breaks even".into());
        Decimal::ZERO
    } else {
        (total_cash_invested + payoff_balance + fixed_sale_costs) / (Decimal::ONE - commission)
    };
    let maximum_allowable_offer = input.arv * MAO_ARV_SHARE - input.rehab_budget;

    if net_profit < Decimal::ZERO {
        warnings.push(format!("Projected loss of {:.2}", -net_profit));
    }
    if input.purchase_price > maximum_allowable_offer {
        warnings.push(format!(
            "Purchase price exceeds the 70% rule maximum offer of {maximum_allowable_offer:.2}"
        ));
    }
    if total_cash_invested <= Decimal::ZERO {
        warnings.push("No investor cash in the deal; ROI is reported as 0".into());
    }

    let cost_breakdown = vec![
        LineItem::new("Purchase price", input.purchase_price),
        LineItem::new("Closing costs", input.closing_costs),
        LineItem::new("Rehab (with contingency)", rehab_with_contingency),
        LineItem::new("Holding costs", holding_costs),
        LineItem::new("Loan points", points_cost),
        LineItem::new("Debt service", debt_service_paid),
        LineItem::new("Interest", total_interest),
        LineItem::new("Sale costs", sale_costs),
    ];

    tracing::debug!(%net_profit, %roi, months = input.timeline_months, "flip metrics computed");

    let output = FlipOutput {
        loan_amount,
        rehab_with_contingency,
        holding_costs,
        points_cost,
        monthly_loan_payment,
        total_interest,
        debt_service_paid,
        payoff_balance,
        total_project_cost,
        total_cash_invested,
        sale_costs,
        net_profit,
        roi,
        annualized_roi,
        profit_margin: as_pct(ratio_or_zero(net_profit, input.arv)),
        break_even_sale_price,
        maximum_allowable_offer,
        cost_breakdown,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fix-and-flip profit with loan payoff and commission-adjusted break-even",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

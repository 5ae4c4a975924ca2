use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::coerce;
use crate::error::RealtyCalcError;
use crate::financing::amortization::{amortize, AmortizationRow, ExtraPayment, LoanTerms};
use crate::time_value;
use crate::types::{pct, with_metadata, ComputationOutput, Money, Percent};
use crate::RealtyCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

fn default_lump_sum_month() -> u32 {
    1
}

/// Inputs from the mortgage form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MortgageInput {
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub home_price: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub down_payment: Money,
    #[serde(default, deserialize_with = "coerce::count")]
    pub loan_term_years: u32,
    /// Annual interest rate, whole percent
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub interest_rate: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub annual_property_tax: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub annual_insurance: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub monthly_hoa: Money,
    /// Annual PMI premium as a percent of the loan amount
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub pmi_percent: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub extra_monthly_payment: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub lump_sum_payment: Money,
    /// Payment number (1-based) the lump sum is applied with
    #[serde(default = "default_lump_sum_month", deserialize_with = "coerce::count")]
    pub lump_sum_month: u32,
}

impl Default for MortgageInput {
    fn default() -> Self {
        Self {
            home_price: Decimal::ZERO,
            down_payment: Decimal::ZERO,
            loan_term_years: 30,
            interest_rate: Decimal::ZERO,
            annual_property_tax: Decimal::ZERO,
            annual_insurance: Decimal::ZERO,
            monthly_hoa: Decimal::ZERO,
            pmi_percent: Decimal::ZERO,
            extra_monthly_payment: Decimal::ZERO,
            lump_sum_payment: Decimal::ZERO,
            lump_sum_month: default_lump_sum_month(),
        }
    }
}

/// Interest and time saved by prepaying.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraPaymentSavings {
    pub interest_saved: Money,
    pub months_saved: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MortgageOutput {
    pub loan_amount: Money,
    pub monthly_principal_and_interest: Money,
    pub monthly_taxes: Money,
    pub monthly_insurance: Money,
    pub monthly_hoa: Money,
    pub monthly_pmi: Money,
    /// P&I + taxes + insurance + HOA + PMI (extra principal excluded)
    pub total_monthly_payment: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    pub total_pmi: Money,
    /// Every dollar paid until payoff, including escrow items and extras
    pub total_cost: Money,
    pub payoff_months: u32,
    pub amortization_schedule: Vec<AmortizationRow>,
    pub savings_from_extra_payments: ExtraPaymentSavings,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Monthly and lifetime cost of a fixed-rate mortgage with escrow items,
/// PMI and optional prepayments.
pub fn calculate_mortgage(
    input: &MortgageInput,
) -> RealtyCalcResult<ComputationOutput<MortgageOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.loan_term_years == 0 {
        return Err(RealtyCalcError::InvalidInput {
            field: "loan_term_years".into(),
            reason: "Loan term must be at least one year".into(),
        });
    }

    let mut loan_amount = input.home_price - input.down_payment;
    if loan_amount < Decimal::ZERO {
        warnings.push("Down payment exceeds home price; no loan required".into());
        loan_amount = Decimal::ZERO;
    }
    let term_months = time_value::term_months(input.loan_term_years, "loan_term_years")?;

    let mut extra_principal_payments = Vec::new();
    if input.lump_sum_payment > Decimal::ZERO {
        extra_principal_payments.push(ExtraPayment {
            month_index: input.lump_sum_month.max(1) - 1,
            amount: input.lump_sum_payment,
        });
    }

    let terms = LoanTerms {
        principal: loan_amount,
        annual_rate_percent: input.interest_rate,
        term_months,
        extra_principal_payments,
        recurring_extra_payment: input.extra_monthly_payment,
    };
    let schedule_iter = amortize(&terms)?;
    let monthly_principal_and_interest = schedule_iter.payment();
    let amortization_schedule: Vec<AmortizationRow> = schedule_iter.collect();

    // Baseline without any prepayment, for the savings comparison
    let baseline = LoanTerms {
        extra_principal_payments: Vec::new(),
        recurring_extra_payment: Decimal::ZERO,
        ..terms.clone()
    };
    let baseline_interest: Money = amortize(&baseline)?.map(|r| r.interest_paid).sum();

    let monthly_taxes = input.annual_property_tax / dec!(12);
    let monthly_insurance = input.annual_insurance / dec!(12);
    let monthly_pmi = if input.pmi_percent > Decimal::ZERO {
        pct(input.pmi_percent) * loan_amount / dec!(12)
    } else {
        Decimal::ZERO
    };

    let total_monthly_payment = monthly_principal_and_interest
        + monthly_taxes
        + monthly_insurance
        + input.monthly_hoa
        + monthly_pmi;

    let payoff_months = amortization_schedule
        .iter()
        .position(|r| r.closing_balance.is_zero())
        .map(|i| i as u32 + 1)
        .unwrap_or(term_months);

    let total_interest: Money = amortization_schedule.iter().map(|r| r.interest_paid).sum();
    let total_principal: Money = amortization_schedule
        .iter()
        .map(|r| r.principal_paid + r.extra_paid)
        .sum();
    let months = Decimal::from(payoff_months);
    let total_pmi = monthly_pmi * months;
    let escrow = (monthly_taxes + monthly_insurance + input.monthly_hoa) * months;
    let total_cost = total_principal + total_interest + total_pmi + escrow;

    let savings_from_extra_payments = ExtraPaymentSavings {
        interest_saved: (baseline_interest - total_interest).max(Decimal::ZERO),
        months_saved: term_months - payoff_months,
    };

    if input.pmi_percent > Decimal::ZERO
        && !input.home_price.is_zero()
        && input.down_payment / input.home_price >= dec!(0.20)
    {
        warnings.push("PMI entered with a down payment of 20% or more; lenders usually waive it".into());
    }

    tracing::debug!(
        %loan_amount,
        %monthly_principal_and_interest,
        payoff_months,
        "mortgage calculated"
    );

    let output = MortgageOutput {
        loan_amount,
        monthly_principal_and_interest,
        monthly_taxes,
        monthly_insurance,
        monthly_hoa: input.monthly_hoa,
        monthly_pmi,
        total_monthly_payment,
        total_interest,
        total_principal,
        total_pmi,
        total_cost,
        payoff_months,
        amortization_schedule,
        savings_from_extra_payments,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-rate mortgage amortization with escrow and PMI",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

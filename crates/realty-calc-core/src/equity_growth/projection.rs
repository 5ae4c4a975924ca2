use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::coerce::{self, parse_rate};
use crate::error::RealtyCalcError;
use crate::financing::amortization::{amortize, AmortizationRow, LoanTerms};
use crate::time_value::{cagr, term_months};
use crate::types::{as_pct, ratio_or_zero, with_metadata, ComputationOutput, LineItem, Money, Rate};
use crate::RealtyCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

fn default_pmi_stop_ltv() -> Decimal {
    dec!(78)
}

fn default_simulation_runs() -> u32 {
    1000
}

fn default_seed() -> u32 {
    42
}

/// A planned renovation. The month comes from `month_index` when given,
/// otherwise from `date` relative to the projection's `start_date`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenovationEntry {
    #[serde(default)]
    pub label: String,
    #[serde(default, deserialize_with = "coerce::optional_date")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "coerce::optional_count")]
    pub month_index: Option<u32>,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub cost: Money,
    /// Value uplift, as a percent or a fraction
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub uplift: Decimal,
}

/// A renovation resolved onto the projection timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenovationEvent {
    pub label: String,
    pub month_index: u32,
    pub cost: Money,
    pub uplift_fraction: Rate,
}

/// Equity projection input. Rate fields accept either whole percents
/// (6.5) or fractions (0.065).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityGrowthInput {
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub home_price: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub down_payment: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub interest_rate: Decimal,
    #[serde(default, deserialize_with = "coerce::count")]
    pub loan_term_years: u32,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub extra_monthly_payment: Money,
    #[serde(default, deserialize_with = "coerce::count")]
    pub horizon_years: u32,
    #[serde(default, deserialize_with = "coerce::optional_date")]
    pub start_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "coerce::decimal")]
    pub appreciation_rate: Decimal,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub property_tax_rate: Decimal,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub annual_insurance: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub monthly_hoa: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub maintenance_rate: Decimal,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub pmi_rate: Decimal,
    /// PMI is dropped once LTV first reaches this level
    #[serde(default = "default_pmi_stop_ltv", deserialize_with = "coerce::decimal")]
    pub pmi_stop_ltv: Decimal,

    #[serde(default, deserialize_with = "coerce::decimal")]
    pub selling_costs_rate: Decimal,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub capital_gains_tax_rate: Decimal,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub depreciation_recapture_rate: Decimal,

    #[serde(default)]
    pub renovations: Vec<RenovationEntry>,

    // Simulation
    #[serde(default = "default_simulation_runs", deserialize_with = "coerce::count")]
    pub simulation_runs: u32,
    #[serde(default = "default_seed", deserialize_with = "coerce::count")]
    pub seed: u32,
    /// Annual volatility of appreciation
    #[serde(default, deserialize_with = "coerce::float")]
    pub appreciation_volatility: f64,
}

impl Default for EquityGrowthInput {
    fn default() -> Self {
        Self {
            home_price: Decimal::ZERO,
            down_payment: Decimal::ZERO,
            interest_rate: Decimal::ZERO,
            loan_term_years: 0,
            extra_monthly_payment: Decimal::ZERO,
            horizon_years: 0,
            start_date: None,
            appreciation_rate: Decimal::ZERO,
            property_tax_rate: Decimal::ZERO,
            annual_insurance: Decimal::ZERO,
            monthly_hoa: Decimal::ZERO,
            maintenance_rate: Decimal::ZERO,
            pmi_rate: Decimal::ZERO,
            pmi_stop_ltv: default_pmi_stop_ltv(),
            selling_costs_rate: Decimal::ZERO,
            capital_gains_tax_rate: Decimal::ZERO,
            depreciation_recapture_rate: Decimal::ZERO,
            renovations: Vec::new(),
            simulation_runs: default_simulation_runs(),
            seed: default_seed(),
            appreciation_volatility: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyEquityRow {
    pub month_index: u32,
    pub property_value: Money,
    pub loan_balance: Money,
    pub equity: Money,
    /// Loan balance over property value, as a fraction
    pub ltv: Decimal,
    pub interest_paid: Money,
    pub principal_paid: Money,
    pub pmi: Money,
    pub property_tax: Money,
    pub insurance: Money,
    pub hoa: Money,
    pub maintenance: Money,
    pub renovation_cost: Money,
    pub cumulative_renovation: Money,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityCostBreakdown {
    pub total_interest: Money,
    pub total_principal: Money,
    pub total_pmi: Money,
    pub total_property_tax: Money,
    pub total_insurance: Money,
    pub total_hoa: Money,
    pub total_maintenance: Money,
    pub total_renovation: Money,
    pub selling_costs: Money,
    pub capital_gains_tax: Money,
    pub depreciation_recapture_tax: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityGrowthOutput {
    pub property_values: Vec<Money>,
    pub loan_balances: Vec<Money>,
    pub equity_values: Vec<Money>,
    pub monthly_payment: Money,
    pub equity_today: Money,
    pub equity_at_horizon: Money,
    pub final_property_value: Money,
    pub final_loan_balance: Money,
    pub selling_costs: Money,
    pub simple_capital_gain: Money,
    pub capital_gains_tax: Money,
    pub depreciation_recapture_tax: Money,
    pub net_after_sale: Money,
    /// Annualized equity growth, whole percent
    pub equity_cagr: Decimal,
    pub pmi_removed_month: Option<u32>,
    pub renovations: Vec<RenovationEvent>,
    pub equity_sources: Vec<LineItem>,
    pub cost_breakdown: EquityCostBreakdown,
    pub monthly_table: Vec<MonthlyEquityRow>,
}

/// The parts of a projection that do not depend on the appreciation path:
/// the loan schedule, renovation timing and the expected monthly growth.
/// Shared by the deterministic projection and the Monte Carlo bands.
#[derive(Debug, Clone)]
pub(crate) struct EquityPlan {
    pub horizon_months: u32,
    pub loan_amount: Money,
    pub monthly_payment: Money,
    pub schedule: Vec<AmortizationRow>,
    pub renovations: Vec<RenovationEvent>,
    pub monthly_growth: Decimal,
}

impl EquityPlan {
    pub fn balance_at(&self, month: u32) -> Money {
        self.schedule
            .get(month as usize)
            .map(|row| row.closing_balance)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn renovations_at(&self, month: u32) -> impl Iterator<Item = &RenovationEvent> {
        self.renovations
            .iter()
            .filter(move |event| event.month_index == month)
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

pub(crate) fn build_plan(
    input: &EquityGrowthInput,
    warnings: &mut Vec<String>,
) -> RealtyCalcResult<EquityPlan> {
    if input.horizon_years == 0 {
        return Err(RealtyCalcError::InvalidInput {
            field: "horizon_years".into(),
            reason: "Projection horizon must be at least one year".into(),
        });
    }
    let horizon_months = term_months(input.horizon_years, "horizon_years")?;

    let loan_amount = (input.home_price - input.down_payment).max(Decimal::ZERO);
    if input.down_payment > input.home_price {
        warnings.push("Down payment exceeds home price; no loan is modelled".into());
    }

    let (monthly_payment, schedule) = if loan_amount > Decimal::ZERO {
        if input.loan_term_years == 0 {
            return Err(RealtyCalcError::InvalidInput {
                field: "loan_term_years".into(),
                reason: "A financed purchase needs a positive loan term".into(),
            });
        }
        let amortization = amortize(&LoanTerms {
            principal: loan_amount,
            annual_rate_percent: as_pct(parse_rate(input.interest_rate)),
            term_months: term_months(input.loan_term_years, "loan_term_years")?,
            recurring_extra_payment: input.extra_monthly_payment,
            ..Default::default()
        })?;
        let payment = amortization.payment();
        (payment, amortization.take(horizon_months as usize).collect())
    } else {
        (Decimal::ZERO, Vec::new())
    };

    let growth_base = Decimal::ONE + parse_rate(input.appreciation_rate);
    if growth_base <= Decimal::ZERO {
        return Err(RealtyCalcError::InvalidInput {
            field: "appreciation_rate".into(),
            reason: "Appreciation must be greater than -100%".into(),
        });
    }
    let monthly_growth = if growth_base == Decimal::ONE {
        Decimal::ONE
    } else {
        growth_base
            .checked_powd(Decimal::ONE / dec!(12))
            .ok_or_else(|| RealtyCalcError::InvalidInput {
                field: "appreciation_rate".into(),
                reason: "Monthly appreciation factor is out of range".into(),
            })?
    };

    let renovations = resolve_renovations(input, horizon_months, warnings)?;

    Ok(EquityPlan {
        horizon_months,
        loan_amount,
        monthly_payment,
        schedule,
        renovations,
        monthly_growth,
    })
}

fn resolve_renovations(
    input: &EquityGrowthInput,
    horizon_months: u32,
    warnings: &mut Vec<String>,
) -> RealtyCalcResult<Vec<RenovationEvent>> {
    let last_month = i64::from(horizon_months) - 1;
    let mut events = Vec::with_capacity(input.renovations.len());

    for entry in &input.renovations {
        let requested = match (entry.month_index, entry.date) {
            (Some(month), _) => i64::from(month),
            (None, Some(date)) => {
                let start = input.start_date.ok_or_else(|| {
                    RealtyCalcError::DateError(format!(
                        "Renovation dated {date} needs a projection start date"
                    ))
                })?;
                months_between(start, date)
            }
            (None, None) => 0,
        };
        let month_index = requested.clamp(0, last_month);
        if month_index != requested {
            warnings.push(format!(
                "Renovation '{}' falls outside the projection and was moved to month {month_index}",
                entry.label
            ));
        }
        events.push(RenovationEvent {
            label: entry.label.clone(),
            month_index: month_index as u32,
            cost: entry.cost,
            uplift_fraction: parse_rate(entry.uplift),
        });
    }

    Ok(events)
}

/// Whole calendar months from `start` to `date`; negative when `date` is earlier.
fn months_between(start: NaiveDate, date: NaiveDate) -> i64 {
    let years = i64::from(date.year() - start.year());
    years * 12 + i64::from(date.month()) - i64::from(start.month())
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Month-by-month equity projection with carrying costs and sale economics.
pub fn calculate_equity_growth(
    input: &EquityGrowthInput,
) -> RealtyCalcResult<ComputationOutput<EquityGrowthOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let plan = build_plan(input, &mut warnings)?;

    let property_tax_rate = parse_rate(input.property_tax_rate);
    let maintenance_rate = parse_rate(input.maintenance_rate);
    let pmi_stop = parse_rate(input.pmi_stop_ltv);
    let monthly_pmi = parse_rate(input.pmi_rate) * plan.loan_amount / dec!(12);
    let monthly_insurance = input.annual_insurance / dec!(12);

    let mut pmi_active = monthly_pmi > Decimal::ZERO;
    let mut pmi_removed_month = None;

    let mut value = input.home_price;
    let mut cumulative_renovation = Decimal::ZERO;
    let mut renovation_uplift = Decimal::ZERO;
    let mut costs = EquityCostBreakdown::default();
    let mut monthly_table = Vec::with_capacity(plan.horizon_months as usize);

    for month in 0..plan.horizon_months {
        value = value.checked_mul(plan.monthly_growth).ok_or_else(|| {
            RealtyCalcError::InvalidInput {
                field: "appreciation_rate".into(),
                reason: "Property value grows beyond the supported range".into(),
            }
        })?;

        let mut renovation_cost = Decimal::ZERO;
        for event in plan.renovations_at(month) {
            let uplift = value * event.uplift_fraction;
            value += uplift;
            renovation_uplift += uplift;
            renovation_cost += event.cost;
        }
        cumulative_renovation += renovation_cost;

        let (interest_paid, principal_paid) = plan
            .schedule
            .get(month as usize)
            .map(|row| (row.interest_paid, row.principal_paid + row.extra_paid))
            .unwrap_or((Decimal::ZERO, Decimal::ZERO));
        let loan_balance = plan.balance_at(month);
        let ltv = ratio_or_zero(loan_balance, value);

        let pmi = if pmi_active && ltv <= pmi_stop {
            pmi_active = false;
            pmi_removed_month = Some(month);
            tracing::debug!(month, %ltv, "PMI removed");
            Decimal::ZERO
        } else if pmi_active {
            monthly_pmi
        } else {
            Decimal::ZERO
        };

        let property_tax = property_tax_rate * value / dec!(12);
        let maintenance = maintenance_rate * value / dec!(12);

        costs.total_interest += interest_paid;
        costs.total_principal += principal_paid;
        costs.total_pmi += pmi;
        costs.total_property_tax += property_tax;
        costs.total_insurance += monthly_insurance;
        costs.total_hoa += input.monthly_hoa;
        costs.total_maintenance += maintenance;

        monthly_table.push(MonthlyEquityRow {
            month_index: month,
            property_value: value,
            loan_balance,
            equity: value - loan_balance,
            ltv,
            interest_paid,
            principal_paid,
            pmi,
            property_tax,
            insurance: monthly_insurance,
            hoa: input.monthly_hoa,
            maintenance,
            renovation_cost,
            cumulative_renovation,
        });
    }
    costs.total_renovation = cumulative_renovation;

    // --- Exit at the horizon ---
    let final_property_value = value;
    let final_loan_balance = plan.balance_at(plan.horizon_months - 1);
    let equity_today = input.home_price - plan.loan_amount;
    let equity_at_horizon = final_property_value - final_loan_balance;

    let selling_costs = parse_rate(input.selling_costs_rate) * final_property_value;
    let simple_capital_gain =
        (final_property_value - (input.home_price + cumulative_renovation)).max(Decimal::ZERO);
    // Both taxes apply to the same gain.
    let capital_gains_tax = parse_rate(input.capital_gains_tax_rate) * simple_capital_gain;
    let depreciation_recapture_tax =
        parse_rate(input.depreciation_recapture_rate) * simple_capital_gain;
    let net_after_sale = final_property_value
        - selling_costs
        - final_loan_balance
        - capital_gains_tax
        - depreciation_recapture_tax;

    costs.selling_costs = selling_costs;
    costs.capital_gains_tax = capital_gains_tax;
    costs.depreciation_recapture_tax = depreciation_recapture_tax;

    let equity_cagr = as_pct(cagr(
        equity_today,
        equity_at_horizon,
        Decimal::from(input.horizon_years),
    ));
    if equity_today <= Decimal::ZERO {
        warnings.push("No starting equity; equity CAGR is reported as 0".into());
    }
    if net_after_sale < Decimal::ZERO {
        warnings.push("Sale at the horizon would not cover the loan and costs".into());
    }

    let equity_sources = vec![
        LineItem::new("Down payment", equity_today),
        LineItem::new("Principal paydown", plan.loan_amount - final_loan_balance),
        LineItem::new(
            "Market appreciation",
            final_property_value - input.home_price - renovation_uplift,
        ),
        LineItem::new("Renovation uplift", renovation_uplift),
    ];

    tracing::debug!(
        months = plan.horizon_months,
        %equity_at_horizon,
        %net_after_sale,
        "equity projection complete"
    );

    let output = EquityGrowthOutput {
        property_values: monthly_table.iter().map(|r| r.property_value).collect(),
        loan_balances: monthly_table.iter().map(|r| r.loan_balance).collect(),
        equity_values: monthly_table.iter().map(|r| r.equity).collect(),
        monthly_payment: plan.monthly_payment,
        equity_today,
        equity_at_horizon,
        final_property_value,
        final_loan_balance,
        selling_costs,
        simple_capital_gain,
        capital_gains_tax,
        depreciation_recapture_tax,
        net_after_sale,
        equity_cagr,
        pmi_removed_month,
        renovations: plan.renovations,
        equity_sources,
        cost_breakdown: costs,
        monthly_table,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monthly equity projection (appreciation, amortization, PMI cutoff, sale exit)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

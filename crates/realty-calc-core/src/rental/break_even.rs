use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::coerce;
use crate::error::RealtyCalcError;
use crate::time_value::{monthly_payment, term_months};
use crate::types::{
    as_pct, pct, ratio_or_none, ratio_or_zero, with_metadata, ComputationOutput, LineItem, Money,
    Percent,
};
use crate::RealtyCalcResult;

const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Income model selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum RentalModel {
    /// Monthly lease income
    #[default]
    #[serde(rename = "ltr")]
    LongTerm,
    /// Nightly bookings (Airbnb / VRBO)
    #[serde(rename = "str")]
    ShortTerm,
}

impl From<String> for RentalModel {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "str" | "short-term" | "short_term" | "shortterm" | "airbnb" | "vacation" => {
                RentalModel::ShortTerm
            }
            _ => RentalModel::LongTerm,
        }
    }
}

/// What "break-even" means for the required revenue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum BreakEvenMode {
    /// Revenue that covers operating expenses and debt service
    #[default]
    #[serde(rename = "CF=0")]
    CashFlowZero,
    /// Total cost scaled by a target debt-service coverage ratio
    #[serde(rename = "DSCR")]
    Dscr,
    /// Total cost plus a target monthly margin
    #[serde(rename = "Margin")]
    Margin,
}

impl From<String> for BreakEvenMode {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dscr" => BreakEvenMode::Dscr,
            "margin" => BreakEvenMode::Margin,
            _ => BreakEvenMode::CashFlowZero,
        }
    }
}

fn default_target_dscr() -> Decimal {
    dec!(1.25)
}

fn default_average_stay() -> Decimal {
    dec!(3)
}

/// Break-even analysis input. Monetary fields are monthly unless prefixed
/// `annual_`; percent fields are whole percents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakEvenInput {
    #[serde(default)]
    pub property_type: RentalModel,
    #[serde(default)]
    pub mode: BreakEvenMode,
    #[serde(default = "default_target_dscr", deserialize_with = "coerce::decimal")]
    pub target_dscr: Decimal,
    /// Monthly cash flow to clear in `Margin` mode
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub target_margin: Money,

    // Financing
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub purchase_price: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub down_payment_percent: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub interest_rate: Percent,
    #[serde(default, deserialize_with = "coerce::count")]
    pub loan_term_years: u32,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub closing_costs: Money,

    // Long-term rental income
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub monthly_rent: Money,
    /// Scenario adjustment applied to rent, e.g. -10 for a soft market
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub rent_adjustment_percent: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub other_monthly_income: Money,

    // Short-term rental income
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub nightly_rate: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub occupancy_percent: Percent,
    /// Per calendar month (January first); missing months get no uplift
    #[serde(default, deserialize_with = "coerce::decimal_list")]
    pub seasonal_uplift_percent: Vec<Percent>,
    #[serde(default = "default_average_stay", deserialize_with = "coerce::decimal")]
    pub average_stay_nights: Decimal,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub upsell_monthly_income: Money,

    // Fixed costs
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub annual_property_tax: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub annual_insurance: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub monthly_hoa: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub monthly_utilities: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub monthly_admin: Money,

    // Variable costs, percent of gross revenue
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub management_percent: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub maintenance_reserve_percent: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub capex_reserve_percent: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub leasing_fee_percent: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub vacancy_percent: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub bad_debt_percent: Percent,

    // Short-term rental operating costs
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub cleaning_cost_per_stay: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub linen_cost_per_stay: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub channel_fee_percent: Percent,
}

impl Default for BreakEvenInput {
    fn default() -> Self {
        Self {
            property_type: RentalModel::LongTerm,
            mode: BreakEvenMode::CashFlowZero,
            target_dscr: default_target_dscr(),
            target_margin: Decimal::ZERO,
            purchase_price: Decimal::ZERO,
            down_payment_percent: Decimal::ZERO,
            interest_rate: Decimal::ZERO,
            loan_term_years: 0,
            closing_costs: Decimal::ZERO,
            monthly_rent: Decimal::ZERO,
            rent_adjustment_percent: Decimal::ZERO,
            other_monthly_income: Decimal::ZERO,
            nightly_rate: Decimal::ZERO,
            occupancy_percent: Decimal::ZERO,
            seasonal_uplift_percent: Vec::new(),
            average_stay_nights: default_average_stay(),
            upsell_monthly_income: Decimal::ZERO,
            annual_property_tax: Decimal::ZERO,
            annual_insurance: Decimal::ZERO,
            monthly_hoa: Decimal::ZERO,
            monthly_utilities: Decimal::ZERO,
            monthly_admin: Decimal::ZERO,
            management_percent: Decimal::ZERO,
            maintenance_reserve_percent: Decimal::ZERO,
            capex_reserve_percent: Decimal::ZERO,
            leasing_fee_percent: Decimal::ZERO,
            vacancy_percent: Decimal::ZERO,
            bad_debt_percent: Decimal::ZERO,
            cleaning_cost_per_stay: Decimal::ZERO,
            linen_cost_per_stay: Decimal::ZERO,
            channel_fee_percent: Decimal::ZERO,
        }
    }
}

/// Break-even result. Monetary values are monthly; rates are whole percents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakEvenOutput {
    pub mode: BreakEvenMode,
    pub property_type: RentalModel,
    pub gross_revenue: Money,
    pub fixed_expenses: Money,
    pub variable_expenses: Money,
    pub short_term_expenses: Money,
    pub operating_expenses: Money,
    pub mortgage_payment: Money,
    pub noi: Money,
    pub annual_noi: Money,
    pub cash_flow: Money,
    pub cap_rate: Percent,
    /// NOI / mortgage payment; `None` without debt service
    pub dscr: Option<Decimal>,
    pub coc_roi: Percent,
    pub break_even_revenue: Money,
    /// Base monthly rent (LTR) or room revenue (STR) needed to break even
    pub break_even_rent: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_even_nightly_rate: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_even_occupancy: Option<Percent>,
    /// Current revenue minus required revenue
    pub revenue_gap: Money,
    pub expense_breakdown: Vec<LineItem>,
}

/// Monthly revenue split used by both income models.
struct Revenue {
    /// Rent or room revenue, before ancillary income
    core: Money,
    ancillary: Money,
    /// Occupied nights per month (STR only)
    nights: Decimal,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Solve for the revenue and rent a rental needs under the selected mode.
pub fn calculate_break_even(
    input: &BreakEvenInput,
) -> RealtyCalcResult<ComputationOutput<BreakEvenOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let revenue = match input.property_type {
        RentalModel::LongTerm => long_term_revenue(input),
        RentalModel::ShortTerm => short_term_revenue(input),
    };
    let gross_revenue = revenue.core + revenue.ancillary;

    // --- Expenses at current revenue ---
    let fixed_items = [
        ("Property tax", input.annual_property_tax / dec!(12)),
        ("Insurance", input.annual_insurance / dec!(12)),
        ("HOA", input.monthly_hoa),
        ("Utilities", input.monthly_utilities),
        ("Admin", input.monthly_admin),
    ];
    let mut variable_items = vec![
        ("Management", input.management_percent),
        ("Maintenance reserve", input.maintenance_reserve_percent),
        ("CapEx reserve", input.capex_reserve_percent),
        ("Leasing fee", input.leasing_fee_percent),
        ("Vacancy", input.vacancy_percent),
        ("Bad debt", input.bad_debt_percent),
    ];
    if input.property_type == RentalModel::ShortTerm {
        variable_items.push(("Channel fees", input.channel_fee_percent));
    }

    let mut expense_breakdown: Vec<LineItem> = Vec::new();
    let mut fixed_expenses = Decimal::ZERO;
    for (label, amount) in fixed_items {
        fixed_expenses += amount;
        expense_breakdown.push(LineItem::new(label, amount));
    }
    let mut variable_expenses = Decimal::ZERO;
    for (label, percent) in variable_items {
        let amount = gross_revenue * pct(percent);
        variable_expenses += amount;
        expense_breakdown.push(LineItem::new(label, amount));
    }

    let short_term_expenses = if input.property_type == RentalModel::ShortTerm {
        let stays = if input.average_stay_nights > Decimal::ZERO {
            revenue.nights / input.average_stay_nights
        } else {
            revenue.nights
        };
        let cleaning = stays * input.cleaning_cost_per_stay;
        let linen = stays * input.linen_cost_per_stay;
        expense_breakdown.push(LineItem::new("Cleaning", cleaning));
        expense_breakdown.push(LineItem::new("Linen", linen));
        cleaning + linen
    } else {
        Decimal::ZERO
    };

    let operating_expenses = fixed_expenses + variable_expenses + short_term_expenses;

    // --- Debt service ---
    let loan_amount = input.purchase_price * (Decimal::ONE - pct(input.down_payment_percent));
    let mortgage_payment = if loan_amount > Decimal::ZERO {
        if input.loan_term_years == 0 {
            return Err(RealtyCalcError::InvalidInput {
                field: "loan_term_years".into(),
                reason: "A financed purchase needs a positive loan term".into(),
            });
        }
        let months = term_months(input.loan_term_years, "loan_term_years")?;
        monthly_payment(loan_amount, pct(input.interest_rate), months)?
    } else {
        Decimal::ZERO
    };
    expense_breakdown.push(LineItem::new("Mortgage", mortgage_payment));

    // --- Performance at current revenue ---
    let noi = gross_revenue - operating_expenses;
    let annual_noi = noi * dec!(12);
    let cash_flow = noi - mortgage_payment;
    let cap_rate = as_pct(ratio_or_zero(annual_noi, input.purchase_price));
    let dscr = ratio_or_none(noi, mortgage_payment);
    let cash_invested = input.purchase_price - loan_amount.max(Decimal::ZERO) + input.closing_costs;
    let coc_roi = as_pct(ratio_or_zero(cash_flow * dec!(12), cash_invested));

    // --- Required revenue ---
    let total_cost = operating_expenses + mortgage_payment;
    let break_even_revenue = match input.mode {
        BreakEvenMode::CashFlowZero => total_cost,
        BreakEvenMode::Dscr => {
            if input.target_dscr <= Decimal::ZERO {
                return Err(RealtyCalcError::InvalidInput {
                    field: "target_dscr".into(),
                    reason: "Target DSCR must be positive".into(),
                });
            }
            total_cost * input.target_dscr
        }
        BreakEvenMode::Margin => total_cost + input.target_margin,
    };

    let core_needed = break_even_revenue - revenue.ancillary;
    let (break_even_rent, break_even_nightly_rate, break_even_occupancy) = match input.property_type
    {
        RentalModel::LongTerm => {
            let adjustment = Decimal::ONE + pct(input.rent_adjustment_percent);
            (ratio_or_zero(core_needed, adjustment), None, None)
        }
        RentalModel::ShortTerm => {
            // Room revenue scales linearly with both rate and occupancy.
            let scale = ratio_or_none(core_needed, revenue.core);
            (
                core_needed,
                scale.map(|s| s * input.nightly_rate),
                scale.map(|s| s * input.occupancy_percent),
            )
        }
    };

    if let Some(occ) = break_even_occupancy {
        if occ > dec!(100) {
            warnings.push(format!(
                "Break-even occupancy {occ:.1}% exceeds 100%; not achievable at the current nightly rate"
            ));
        }
    }
    if let Some(d) = dscr {
        if d < Decimal::ONE {
            warnings.push(format!("DSCR of {d:.2} is below 1.00x; NOI does not cover debt service"));
        }
    }

    tracing::debug!(%gross_revenue, %break_even_revenue, mode = ?input.mode, "break-even solved");

    let output = BreakEvenOutput {
        mode: input.mode,
        property_type: input.property_type,
        gross_revenue,
        fixed_expenses,
        variable_expenses,
        short_term_expenses,
        operating_expenses,
        mortgage_payment,
        noi,
        annual_noi,
        cash_flow,
        cap_rate,
        dscr,
        coc_roi,
        break_even_revenue,
        break_even_rent,
        break_even_nightly_rate,
        break_even_occupancy,
        revenue_gap: gross_revenue - break_even_revenue,
        expense_breakdown,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rental break-even (operating expenses + debt service)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Revenue models
// ---------------------------------------------------------------------------

fn long_term_revenue(input: &BreakEvenInput) -> Revenue {
    Revenue {
        core: input.monthly_rent * (Decimal::ONE + pct(input.rent_adjustment_percent)),
        ancillary: input.other_monthly_income,
        nights: Decimal::ZERO,
    }
}

/// Average monthly room revenue across the calendar year, with each
/// month's nights weighted by its seasonal uplift.
fn short_term_revenue(input: &BreakEvenInput) -> Revenue {
    let occupancy = pct(input.occupancy_percent);
    let mut annual_room = Decimal::ZERO;
    let mut annual_nights = Decimal::ZERO;

    for (month, days) in DAYS_IN_MONTH.iter().enumerate() {
        let nights = Decimal::from(*days) * occupancy;
        let uplift = input
            .seasonal_uplift_percent
            .get(month)
            .copied()
            .unwrap_or(Decimal::ZERO);
        annual_room += input.nightly_rate * nights * (Decimal::ONE + pct(uplift));
        annual_nights += nights;
    }

    Revenue {
        core: annual_room / dec!(12),
        ancillary: input.upsell_monthly_income,
        nights: annual_nights / dec!(12),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

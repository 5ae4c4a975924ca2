use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::coerce;
use crate::error::RealtyCalcError;
use crate::time_value::{monthly_payment, term_months};
use crate::types::{as_pct, pct, ratio_or_none, ratio_or_zero, Money, Percent};
use crate::RealtyCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Income model, tagged by property type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PropertyIncome {
    #[serde(rename_all = "camelCase")]
    Residential {
        #[serde(default, deserialize_with = "coerce::decimal")]
        monthly_rent: Money,
        #[serde(default, deserialize_with = "coerce::decimal")]
        vacancy_percent: Percent,
        #[serde(default, deserialize_with = "coerce::decimal")]
        rent_growth_percent: Percent,
    },
    #[serde(rename_all = "camelCase")]
    Airbnb {
        #[serde(default, deserialize_with = "coerce::decimal")]
        nightly_rate: Money,
        #[serde(default, deserialize_with = "coerce::decimal")]
        occupancy_percent: Percent,
        #[serde(default, deserialize_with = "coerce::decimal")]
        seasonal_variation_percent: Percent,
    },
    #[serde(rename_all = "camelCase")]
    Commercial {
        #[serde(default, deserialize_with = "coerce::decimal")]
        annual_lease: Money,
        #[serde(default, deserialize_with = "coerce::decimal")]
        escalation_percent: Percent,
    },
    #[serde(rename_all = "camelCase")]
    Land {
        #[serde(default, deserialize_with = "coerce::decimal")]
        annual_rent: Money,
        #[serde(default, deserialize_with = "coerce::decimal")]
        rent_growth_percent: Percent,
    },
}

impl PropertyIncome {
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyIncome::Residential { .. } => "residential",
            PropertyIncome::Airbnb { .. } => "airbnb",
            PropertyIncome::Commercial { .. } => "commercial",
            PropertyIncome::Land { .. } => "land",
        }
    }

    /// Forward-year gross income.
    pub fn annual_gross_income(&self) -> Money {
        match self {
            PropertyIncome::Residential {
                monthly_rent,
                vacancy_percent,
                rent_growth_percent,
            } => {
                *monthly_rent
                    * dec!(12)
                    * (Decimal::ONE - pct(*vacancy_percent))
                    * (Decimal::ONE + pct(*rent_growth_percent))
            }
            PropertyIncome::Airbnb {
                nightly_rate,
                occupancy_percent,
                seasonal_variation_percent,
            } => {
                *nightly_rate
                    * dec!(365)
                    * pct(*occupancy_percent)
                    * (Decimal::ONE + pct(*seasonal_variation_percent))
            }
            PropertyIncome::Commercial {
                annual_lease,
                escalation_percent,
            } => *annual_lease * (Decimal::ONE + pct(*escalation_percent)),
            PropertyIncome::Land {
                annual_rent,
                rent_growth_percent,
            } => *annual_rent * (Decimal::ONE + pct(*rent_growth_percent)),
        }
    }
}

/// A held property with its financing and operating costs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub income: PropertyIncome,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub purchase_price: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub current_value: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub loan_balance: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub interest_rate: Percent,
    /// Remaining term of the loan
    #[serde(default, deserialize_with = "coerce::count")]
    pub loan_term_years: u32,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub down_payment: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub closing_costs: Money,
    /// Annual operating expenses
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub operating_expenses: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyMetrics {
    pub name: String,
    pub property_type: String,
    pub current_value: Money,
    pub loan_balance: Money,
    pub equity: Money,
    pub gross_income: Money,
    pub operating_expenses: Money,
    pub noi: Money,
    pub annual_debt_service: Money,
    pub net_cash_flow: Money,
    /// NOI over current value
    pub cap_rate: Percent,
    pub dscr: Option<Decimal>,
    pub cash_on_cash: Percent,
    pub ltv: Decimal,
    /// Monthly gross income that covers operating costs and debt service
    pub break_even_rent: Money,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

impl Property {
    pub fn annual_debt_service(&self) -> RealtyCalcResult<Money> {
        if self.loan_balance <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }
        if self.loan_term_years == 0 {
            return Err(RealtyCalcError::InvalidInput {
                field: format!("{}.loan_term_years", self.name),
                reason: "A property with a loan balance needs a remaining term".into(),
            });
        }
        let field = format!("{}.loan_term_years", self.name);
        let months = term_months(self.loan_term_years, &field)?;
        Ok(monthly_payment(self.loan_balance, pct(self.interest_rate), months)? * dec!(12))
    }

    pub fn metrics(&self) -> RealtyCalcResult<PropertyMetrics> {
        let gross_income = self.income.annual_gross_income();
        let noi = gross_income - self.operating_expenses;
        let annual_debt_service = self.annual_debt_service()?;
        let net_cash_flow = noi - annual_debt_service;

        Ok(PropertyMetrics {
            name: self.name.clone(),
            property_type: self.income.type_name().to_string(),
            current_value: self.current_value,
            loan_balance: self.loan_balance,
            equity: self.current_value - self.loan_balance,
            gross_income,
            operating_expenses: self.operating_expenses,
            noi,
            annual_debt_service,
            net_cash_flow,
            cap_rate: as_pct(ratio_or_zero(noi, self.current_value)),
            dscr: ratio_or_none(noi, annual_debt_service),
            cash_on_cash: as_pct(ratio_or_zero(
                net_cash_flow,
                self.down_payment + self.closing_costs,
            )),
            ltv: ratio_or_zero(self.loan_balance, self.current_value),
            break_even_rent: (self.operating_expenses + annual_debt_service) / dec!(12),
        })
    }
}

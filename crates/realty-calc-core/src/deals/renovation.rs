use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::coerce;
use crate::time_value::cagr;
use crate::types::{
    as_pct, pct, ratio_or_none, ratio_or_zero, with_metadata, ComputationOutput, Money, Percent,
};
use crate::RealtyCalcResult;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenovationInput {
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub current_value: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub renovation_cost: Money,
    /// Appraised value after the work; takes precedence over the uplift percent
    #[serde(default, deserialize_with = "coerce::optional_decimal")]
    pub post_renovation_value: Option<Money>,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub value_uplift_percent: Percent,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub current_monthly_rent: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub post_renovation_monthly_rent: Money,
    /// Extra operating cost the renovation brings, per year
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub added_annual_expenses: Money,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub cap_rate: Percent,
    #[serde(default, deserialize_with = "coerce::count")]
    pub holding_years: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValuationMethod {
    Appraisal,
    Income,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenovationOutput {
    pub appraisal_increase: Money,
    pub annual_noi_increase: Money,
    pub income_increase: Money,
    pub effective_value_increase: Money,
    pub valuation_method: ValuationMethod,
    pub net_gain: Money,
    pub roi: Percent,
    pub payback_years: Option<Decimal>,
    pub cagr: Percent,
    pub post_renovation_value: Money,
}

/// Value added by a renovation, taking the better of the appraisal and
/// income-capitalization views.
pub fn calculate_renovation_roi(
    input: &RenovationInput,
) -> RealtyCalcResult<ComputationOutput<RenovationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let appraisal_increase = match input.post_renovation_value {
        Some(value) if value > Decimal::ZERO => value - input.current_value,
        _ => input.current_value * pct(input.value_uplift_percent),
    };

    let annual_noi_increase = (input.post_renovation_monthly_rent - input.current_monthly_rent)
        * dec!(12)
        - input.added_annual_expenses;
    let income_increase = if input.cap_rate > Decimal::ZERO {
        annual_noi_increase / pct(input.cap_rate)
    } else {
        if annual_noi_increase > Decimal::ZERO {
            warnings.push("No cap rate given; income uplift is not capitalized".into());
        }
        Decimal::ZERO
    };

    let (effective_value_increase, valuation_method) = if income_increase > appraisal_increase {
        (income_increase, ValuationMethod::Income)
    } else {
        (appraisal_increase, ValuationMethod::Appraisal)
    };

    let net_gain = effective_value_increase - input.renovation_cost;
    if net_gain < Decimal::ZERO {
        warnings.push("Renovation adds less value than it costs".into());
    }
    let payback_years = if annual_noi_increase > Decimal::ZERO {
        ratio_or_none(input.renovation_cost, annual_noi_increase)
    } else {
        None
    };
    let growth = cagr(
        input.renovation_cost,
        effective_value_increase,
        Decimal::from(input.holding_years),
    );

    let output = RenovationOutput {
        appraisal_increase,
        annual_noi_increase,
        income_increase,
        effective_value_increase,
        valuation_method,
        net_gain,
        roi: as_pct(ratio_or_zero(net_gain, input.renovation_cost)),
        payback_years,
        cagr: as_pct(growth),
        post_renovation_value: input.current_value + effective_value_increase,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Renovation ROI on the larger of appraisal and capitalized-income uplift",
        input,
        warnings,
        elapsed,
        output,
    ))
}

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%).
pub type Rate = Decimal;

/// Whole-number percentages as entered on the forms (6 = 6%).
pub type Percent = Decimal;

/// Currency code
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    GBP,
    #[default]
    USD,
    EUR,
    CAD,
    AUD,
    Other(String),
}

/// A labelled amount, used for cost breakdowns and equity attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub label: String,
    pub amount: Money,
}

impl LineItem {
    pub fn new(label: &str, amount: Money) -> Self {
        Self {
            label: label.to_string(),
            amount,
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    wrap(methodology, assumptions, warnings, elapsed_us, result, "rust_decimal_128bit")
}

/// Same envelope for engines that run in floating point (Monte Carlo).
pub fn with_metadata_f64<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    wrap(methodology, assumptions, warnings, elapsed_us, result, "ieee754_f64")
}

fn wrap<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
    precision: &str,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: precision.to_string(),
        },
    }
}

/// Convert a whole-number percent to a decimal rate.
pub fn pct(value: Percent) -> Rate {
    value / dec!(100)
}

/// Convert a decimal rate to a whole-number percent for reporting.
pub fn as_pct(value: Rate) -> Percent {
    value * dec!(100)
}

/// `numerator / denominator`, or zero when the denominator is zero.
pub fn ratio_or_zero(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// `numerator / denominator`, or `None` when the denominator is zero.
pub fn ratio_or_none(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        None
    } else {
        Some(numerator / denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pct_roundtrip() {
        assert_eq!(pct(dec!(6)), dec!(0.06));
        assert_eq!(as_pct(dec!(0.065)), dec!(6.5));
    }

    #[test]
    fn test_ratio_guards() {
        assert_eq!(ratio_or_zero(dec!(10), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(ratio_or_zero(dec!(10), dec!(4)), dec!(2.5));
        assert_eq!(ratio_or_none(dec!(1), Decimal::ZERO), None);
        assert_eq!(ratio_or_none(dec!(3), dec!(2)), Some(dec!(1.5)));
    }

    #[test]
    fn test_line_item_serializes_label_and_amount() {
        let item = LineItem::new("Down payment", dec!(70000));
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["label"], "Down payment");
        assert!(json.get("amount").is_some());
    }
}

//! Lenient numeric coercion for form-submitted input records.
//!
//! Forms post numbers, numeric strings, or empty strings. Every engine
//! treats an absent, empty, or non-numeric field as zero instead of
//! rejecting the request; the helpers here are the single place that
//! policy lives. Use them with `#[serde(default, deserialize_with = ...)]`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

use crate::types::Rate;
use crate::RealtyCalcResult;

fn parse_decimal_str(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim().trim_start_matches('$').replace(',', "");
    if trimmed.is_empty() {
        return None;
    }
    let trimmed = trimmed.trim_end_matches('%');
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

fn value_to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal_str(&n.to_string()),
        Value::String(s) => parse_decimal_str(s),
        _ => None,
    }
}

/// Any numeric-looking value, defaulting to zero.
pub fn decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(value_to_decimal(&raw).unwrap_or_else(|| {
        if !raw.is_null() {
            tracing::debug!(value = %raw, "non-numeric input coerced to zero");
        }
        Decimal::ZERO
    }))
}

/// Like [`decimal`] but keeps "unset" distinct from zero.
pub fn optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(value_to_decimal(&raw))
}

/// A list of numbers; a scalar becomes a one-element list and anything
/// else an empty one.
pub fn decimal_list<'de, D>(deserializer: D) -> Result<Vec<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::Array(items) => items
            .iter()
            .map(|v| value_to_decimal(v).unwrap_or(Decimal::ZERO))
            .collect(),
        Value::Null => Vec::new(),
        other => value_to_decimal(&other).into_iter().collect(),
    })
}

/// Whole counts (months, years, runs). Negative or fractional input is
/// truncated toward zero.
pub fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(value_to_count(&raw).unwrap_or(0))
}

pub fn optional_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(value_to_count(&raw))
}

fn value_to_count(value: &Value) -> Option<u32> {
    let d = value_to_decimal(value)?;
    if d <= Decimal::ZERO {
        return Some(0);
    }
    let truncated = d.trunc();
    if truncated > Decimal::from(u32::MAX) {
        return Some(u32::MAX);
    }
    u32::from_str(&truncated.to_string()).ok()
}

/// Floating-point fields used by the stochastic engines.
pub fn float<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let parsed = match &raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|v| v.is_finite()).unwrap_or(0.0))
}

/// Checkbox-style booleans: `true`, `"true"`, `"on"`, `"yes"`, `1`.
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "on" | "yes" | "1"
        ),
        _ => false,
    })
}

/// Form dates: `YYYY-MM-DD`, or `YYYY-MM` for the first of that month.
/// Anything unparseable is treated as unset.
pub fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let Value::String(s) = raw else {
        return Ok(None);
    };
    let s = s.trim();
    Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d"))
        .ok())
}

/// Normalise a rate that may have been entered either as a whole percent
/// or as a fraction: magnitudes above 1 are percents (6.5 → 0.065),
/// everything else is already fractional (0.065 stays 0.065).
///
/// A value of exactly 1 is read as 100%.
pub fn parse_rate(value: Decimal) -> Rate {
    if value.abs() > Decimal::ONE {
        value / dec!(100)
    } else {
        value
    }
}

/// Deserialize an engine input record from JSON.
pub fn parse_input<T: DeserializeOwned>(json: &str) -> RealtyCalcResult<T> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "decimal")]
        amount: Decimal,
        #[serde(default, deserialize_with = "optional_decimal")]
        maybe: Option<Decimal>,
        #[serde(default, deserialize_with = "count")]
        months: u32,
        #[serde(default, deserialize_with = "flag")]
        enabled: bool,
        #[serde(default, deserialize_with = "float")]
        volatility: f64,
    }

    fn probe(json: &str) -> Probe {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_numbers_and_numeric_strings() {
        let p = probe(r#"{"amount": 1250.5, "maybe": "42", "months": "360"}"#);
        assert_eq!(p.amount, dec!(1250.5));
        assert_eq!(p.maybe, Some(dec!(42)));
        assert_eq!(p.months, 360);
    }

    #[test]
    fn test_empty_and_garbage_default_to_zero() {
        let p = probe(r#"{"amount": "", "maybe": "abc", "months": "n/a", "volatility": "x"}"#);
        assert_eq!(p.amount, Decimal::ZERO);
        assert_eq!(p.maybe, None);
        assert_eq!(p.months, 0);
        assert_eq!(p.volatility, 0.0);
    }

    #[test]
    fn test_missing_fields_default() {
        let p = probe("{}");
        assert_eq!(p.amount, Decimal::ZERO);
        assert_eq!(p.maybe, None);
        assert!(!p.enabled);
    }

    #[test]
    fn test_formatted_currency_string() {
        let p = probe(r#"{"amount": "$350,000"}"#);
        assert_eq!(p.amount, dec!(350000));
    }

    #[test]
    fn test_negative_count_clamps_to_zero() {
        let p = probe(r#"{"months": -12}"#);
        assert_eq!(p.months, 0);
    }

    #[test]
    fn test_flag_variants() {
        assert!(probe(r#"{"enabled": "on"}"#).enabled);
        assert!(probe(r#"{"enabled": 1}"#).enabled);
        assert!(!probe(r#"{"enabled": "false"}"#).enabled);
    }

    #[test]
    fn test_optional_date_formats() {
        #[derive(Deserialize)]
        struct Dated {
            #[serde(default, deserialize_with = "optional_date")]
            on: Option<NaiveDate>,
        }
        let full: Dated = serde_json::from_str(r#"{"on": "2025-03-15"}"#).unwrap();
        assert_eq!(full.on, NaiveDate::from_ymd_opt(2025, 3, 15));
        let month: Dated = serde_json::from_str(r#"{"on": "2025-03"}"#).unwrap();
        assert_eq!(month.on, NaiveDate::from_ymd_opt(2025, 3, 1));
        let blank: Dated = serde_json::from_str(r#"{"on": ""}"#).unwrap();
        assert!(blank.on.is_none());
    }

    #[test]
    fn test_parse_rate_dual_convention() {
        assert_eq!(parse_rate(dec!(6.5)), dec!(0.065));
        assert_eq!(parse_rate(dec!(0.065)), dec!(0.065));
        assert_eq!(parse_rate(Decimal::ONE), Decimal::ONE);
        assert_eq!(parse_rate(dec!(-2)), dec!(-0.02));
        assert_eq!(parse_rate(Decimal::ZERO), Decimal::ZERO);
    }
}

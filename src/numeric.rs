//! Safe numeric conversion
//!
//! Every monetary amount and counter read from the backend goes through this
//! module. Numeric columns arrive as JSON numbers, as strings (`numeric`
//! columns are serialized as text), or not at all when a join is empty.
//! Anything that is not a finite number becomes zero, or `None` where the
//! caller needs to know whether a value was present.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parse a JSON value as a decimal, `None` when it is not numeric.
pub fn decimal_opt(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Some(Decimal::from(u))
            } else {
                parse_decimal_str(&n.to_string()).or_else(|| n.as_f64().and_then(Decimal::from_f64))
            }
        }
        Value::String(s) => parse_decimal_str(s),
        _ => None,
    }
}

/// Parse a JSON value as a decimal, zero when it is not numeric.
pub fn decimal(value: &Value) -> Decimal {
    decimal_opt(value).unwrap_or(Decimal::ZERO)
}

/// Parse a JSON value as a whole count, truncating fractions, zero when absent.
pub fn count(value: &Value) -> i64 {
    decimal_opt(value)
        .and_then(|d| d.trunc().to_i64())
        .unwrap_or(0)
}

/// Sum that clamps at [`Decimal::MAX`] / [`Decimal::MIN`] instead of overflowing
pub fn saturating_sum<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .fold(Decimal::ZERO, |acc, value| acc.saturating_add(value))
}

fn parse_decimal_str(raw: &str) -> Option<Decimal> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

/// Deserialize any JSON value as a decimal, defaulting to zero.
pub fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(decimal).unwrap_or(Decimal::ZERO))
}

/// Deserialize any JSON value as an optional decimal.
pub fn deserialize_decimal_opt<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(decimal_opt))
}

/// Deserialize any JSON value as a whole count, defaulting to zero.
pub fn deserialize_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(count).unwrap_or(0))
}

/// Deserialize any JSON value as an optional whole count.
pub fn deserialize_count_opt<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(decimal_opt)
        .and_then(|d| d.trunc().to_i64()))
}

//! Field deserializers that accept what browsers and the legacy admin pages
//! actually send: numbers where text is expected, numeric strings for amounts.
//!
//! Every writable field has three states. A missing key stays `None` through
//! `#[serde(default)]`; a key that is present yields `Some(..)`, with
//! `Some(None)` for an explicit `null` so updates can clear a column.

use serde::Deserializer;
use serde::de::{self, Visitor};
use std::fmt;

struct TextVisitor;

impl<'de> Visitor<'de> for TextVisitor {
    type Value = Option<String>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string, number, boolean or null")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(Some(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(Some(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

struct NumberVisitor;

impl<'de> Visitor<'de> for NumberVisitor {
    type Value = Option<f64>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a number, numeric string or null")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Some(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        parse_amount(v).map_err(E::custom)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

/// Integers keep their exact digits.
pub fn text<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_option(TextVisitor).map(Some)
}

pub fn number<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_option(NumberVisitor).map(Some)
}

/// Blank means "no amount"; anything else must be a finite number.
pub fn parse_amount(raw: &str) -> Result<Option<f64>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(Some)
        .ok_or_else(|| format!("Invalid amount: '{}'", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "text")]
        phone: Option<Option<String>>,
        #[serde(default, deserialize_with = "number")]
        amount: Option<Option<f64>>,
    }

    #[test]
    fn amounts() {
        assert_eq!(parse_amount("500"), Ok(Some(500.0)));
        assert_eq!(parse_amount(" -12.5 "), Ok(Some(-12.5)));
        assert_eq!(parse_amount(""), Ok(None));
        assert!(parse_amount("five hundred").is_err());
        assert!(parse_amount("NaN").is_err());
    }

    #[test]
    fn absent_null_and_value_stay_distinct() {
        let absent: Sample = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.phone, None);
        assert_eq!(absent.amount, None);

        let null: Sample = serde_json::from_str(r#"{"phone": null, "amount": null}"#).unwrap();
        assert_eq!(null.phone, Some(None));
        assert_eq!(null.amount, Some(None));

        let value: Sample = serde_json::from_str(r#"{"phone": "0471", "amount": "12"}"#).unwrap();
        assert_eq!(value.phone, Some(Some("0471".to_string())));
        assert_eq!(value.amount, Some(Some(12.0)));
    }

    #[test]
    fn large_integers_keep_their_digits() {
        let parsed: Sample = serde_json::from_str(r#"{"phone": 18446744073709551615}"#).unwrap();
        assert_eq!(parsed.phone, Some(Some("18446744073709551615".to_string())));

        let parsed: Sample = serde_json::from_str(r#"{"phone": -9223372036854775808}"#).unwrap();
        assert_eq!(parsed.phone, Some(Some("-9223372036854775808".to_string())));

        let parsed: Sample = serde_json::from_str(r#"{"phone": true}"#).unwrap();
        assert_eq!(parsed.phone, Some(Some("true".to_string())));
    }

    #[test]
    fn amount_rejects_non_numbers() {
        assert!(serde_json::from_str::<Sample>(r#"{"amount": "lots"}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"amount": true}"#).is_err());
    }
}

//! Numbers with optional distance units, as models write them
//!
//! Accepted forms: a JSON number (`100`), a string with an optional unit
//! (`"100"`, `"100 m"`, `"0.1km"`, `"328 ft"`, `"1 mile"`) and an object
//! `{"value": 100, "unit": "m"}`.

use geogenie_core::models::DistanceUnit;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: Option<DistanceUnit>,
}

impl Quantity {
    /// Value expressed in `target`, treating a missing unit as `target` already
    pub fn in_unit(&self, target: DistanceUnit) -> f64 {
        match self.unit {
            Some(unit) if unit != target => round_nano(unit.convert(self.value, target)),
            _ => self.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("expected a number")]
    NotANumber,

    #[error("unknown unit '{0}'")]
    UnknownUnit(String),

    #[error("number is not finite")]
    NonFinite,
}

/// Parse free text such as `"0.5 km"`
pub fn parse_quantity(input: &str) -> Result<Quantity, QuantityError> {
    let text = input.trim();

    // Longest prefix that reads as a number; the rest is the unit
    let (value, rest) = (1..=text.len())
        .rev()
        .filter(|&i| text.is_char_boundary(i))
        .find_map(|i| text[..i].trim().parse::<f64>().ok().map(|v| (v, &text[i..])))
        .ok_or(QuantityError::NotANumber)?;

    if !value.is_finite() {
        return Err(QuantityError::NonFinite);
    }

    let rest = rest.trim();
    if rest.is_empty() {
        return Ok(Quantity { value, unit: None });
    }

    DistanceUnit::from_token(rest)
        .map(|unit| Quantity { value, unit: Some(unit) })
        .ok_or_else(|| QuantityError::UnknownUnit(rest.to_string()))
}

/// Read a quantity from a raw JSON parameter value
pub fn quantity_from_json(value: &Value) -> Result<Quantity, QuantityError> {
    match value {
        Value::Number(n) => {
            let value = n.as_f64().ok_or(QuantityError::NotANumber)?;
            Ok(Quantity { value, unit: None })
        }
        Value::String(s) => parse_quantity(s),
        Value::Object(map) => {
            let mut quantity = map.get("value").map(quantity_from_json).ok_or(QuantityError::NotANumber)??;
            match map.get("unit") {
                None | Some(Value::Null) => {}
                Some(Value::String(token)) => {
                    let unit = DistanceUnit::from_token(token)
                        .ok_or_else(|| QuantityError::UnknownUnit(token.clone()))?;
                    quantity.unit = Some(unit);
                }
                Some(other) => return Err(QuantityError::UnknownUnit(other.to_string())),
            }
            Ok(quantity)
        }
        _ => Err(QuantityError::NotANumber),
    }
}

fn round_nano(value: f64) -> f64 {
    (value * 1e9).round() / 1e9
}

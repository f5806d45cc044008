//! Declarative shape checks for submitted form payloads.
//!
//! A [`Shape`] is a static list of field rules. Checking a payload walks every
//! rule, collects all violations in declaration order and, when there are
//! none, hands back the parsed values for the typed input builders in
//! [`shapes`].

pub mod shapes;

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

pub use shapes::{ListingInput, ReviewInput, LISTING_SHAPE, REVIEW_SHAPE};

/// All violations found in one payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .messages.join(","))]
pub struct ValidationError {
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Text,
    /// `scale` caps the number of decimal places.
    Number { min: Option<i64>, max: Option<i64>, integer: bool, scale: Option<u32> },
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    /// Form key, e.g. `listing[price]`.
    pub key: &'static str,
    /// Name used in messages, e.g. `listing.price`.
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(Decimal),
}

#[derive(Debug)]
pub struct Shape {
    pub rules: &'static [FieldRule],
}

/// Values of a payload that passed its shape.
#[derive(Debug, Default)]
pub struct CheckedFields {
    values: HashMap<&'static str, FieldValue>,
}

impl CheckedFields {
    pub fn text(&self, key: &str) -> String {
        match self.values.get(key) {
            Some(FieldValue::Text(s)) => s.clone(),
            _ => String::new(),
        }
    }

    pub fn number(&self, key: &str) -> Decimal {
        match self.values.get(key) {
            Some(FieldValue::Number(n)) => *n,
            _ => Decimal::ZERO,
        }
    }
}

impl Shape {
    pub fn check(&self, fields: &HashMap<String, String>) -> Result<CheckedFields, ValidationError> {
        let mut checked = CheckedFields::default();
        let mut messages = Vec::new();

        for rule in self.rules {
            match rule.check(fields.get(rule.key).map(String::as_str)) {
                Ok(Some(value)) => {
                    checked.values.insert(rule.key, value);
                }
                Ok(None) => {}
                Err(message) => messages.push(message),
            }
        }

        if messages.is_empty() {
            Ok(checked)
        } else {
            Err(ValidationError { messages })
        }
    }
}

impl FieldRule {
    fn check(&self, raw: Option<&str>) -> Result<Option<FieldValue>, String> {
        let label = self.label;
        let Some(raw) = raw else {
            return if self.required { Err(format!("\"{label}\" is required")) } else { Ok(None) };
        };

        match self.kind {
            FieldKind::Text => {
                if raw.is_empty() {
                    return Err(format!("\"{label}\" is not allowed to be empty"));
                }
                Ok(Some(FieldValue::Text(raw.to_string())))
            }
            FieldKind::Number { min, max, integer, scale } => {
                let value = Decimal::from_str(raw.trim())
                    .map_err(|_| format!("\"{label}\" must be a number"))?;
                if integer && !value.fract().is_zero() {
                    return Err(format!("\"{label}\" must be an integer"));
                }
                if let Some(scale) = scale {
                    if value.normalize().scale() > scale {
                        return Err(format!("\"{label}\" must have no more than {scale} decimal places"));
                    }
                }
                if let Some(min) = min {
                    if value < Decimal::from(min) {
                        return Err(format!("\"{label}\" must be greater than or equal to {min}"));
                    }
                }
                if let Some(max) = max {
                    if value > Decimal::from(max) {
                        return Err(format!("\"{label}\" must be less than or equal to {max}"));
                    }
                }
                Ok(Some(FieldValue::Number(value)))
            }
        }
    }
}

//! # Field Types
//!
//! Declared field types and the classifier that reduces them to the
//! concrete value types a filter parameter accepts.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use uuid::Uuid;

/// Types a model field can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclaredType {
    Bool,
    Int,
    Float,
    Str,
    /// String holding an email address
    Email,
    Uuid,
    Datetime,
    Date,
    /// Marks the field as nullable
    Null,
}

impl DeclaredType {
    /// Concrete value type, `None` for the null marker.
    ///
    /// String-equivalent specialisations collapse to [`ValueType::Str`].
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            DeclaredType::Bool => Some(ValueType::Bool),
            DeclaredType::Int => Some(ValueType::Int),
            DeclaredType::Float => Some(ValueType::Float),
            DeclaredType::Str | DeclaredType::Email => Some(ValueType::Str),
            DeclaredType::Uuid => Some(ValueType::Uuid),
            DeclaredType::Datetime => Some(ValueType::Datetime),
            DeclaredType::Date => Some(ValueType::Date),
            DeclaredType::Null => None,
        }
    }

    /// Check whether an already typed JSON value conforms to this type
    pub fn conforms(&self, value: &Value) -> bool {
        match self {
            DeclaredType::Bool => value.is_boolean(),
            DeclaredType::Int => value.is_i64() || value.is_u64(),
            DeclaredType::Float => value.is_number(),
            DeclaredType::Str => value.is_string(),
            DeclaredType::Email => value.as_str().map(|s| s.contains('@')).unwrap_or(false),
            DeclaredType::Uuid => value
                .as_str()
                .map(|s| Uuid::parse_str(s).is_ok())
                .unwrap_or(false),
            DeclaredType::Datetime => value
                .as_str()
                .map(|s| parse_datetime(s).is_some())
                .unwrap_or(false),
            DeclaredType::Date => value
                .as_str()
                .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok())
                .unwrap_or(false),
            DeclaredType::Null => value.is_null(),
        }
    }
}

/// Concrete value types accepted by filter parameters.
///
/// Variant order is the coercion order for union types: `Str` accepts
/// anything and therefore comes last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Bool,
    Int,
    Float,
    Uuid,
    Datetime,
    Date,
    Str,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Uuid => "uuid",
            ValueType::Datetime => "datetime",
            ValueType::Date => "date",
            ValueType::Str => "str",
        }
    }

    /// Coerce a raw query-string token into a JSON value of this type
    pub fn coerce(&self, raw: &str) -> Option<Value> {
        match self {
            ValueType::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Some(Value::Bool(true)),
                "false" | "0" | "no" | "off" => Some(Value::Bool(false)),
                _ => None,
            },
            ValueType::Int => raw.trim().parse::<i64>().ok().map(Value::from),
            ValueType::Float => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            ValueType::Uuid => Uuid::parse_str(raw.trim())
                .ok()
                .map(|u| Value::String(u.hyphenated().to_string())),
            // Fixed-width UTC so string order is chronological order
            ValueType::Datetime => parse_datetime(raw.trim())
                .map(|dt| Value::String(dt.to_rfc3339_opts(SecondsFormat::Micros, true))),
            ValueType::Date => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .ok()
                .map(|d| Value::String(d.format("%Y-%m-%d").to_string())),
            ValueType::Str => Some(Value::String(raw.to_string())),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reduce declared types to the set of concrete value types.
///
/// The null marker is dropped and string-equivalent types are normalised
/// to plain strings. Nothing but the declaration is consulted.
pub fn classify(declared: &[DeclaredType]) -> BTreeSet<ValueType> {
    declared.iter().filter_map(DeclaredType::value_type).collect()
}

/// Coerce a raw token against a set of accepted types, first match wins
pub fn coerce_any(types: &BTreeSet<ValueType>, raw: &str) -> Option<Value> {
    types.iter().find_map(|t| t.coerce(raw))
}

/// Human readable list of types, e.g. `int or str`
pub fn describe_types(types: &BTreeSet<ValueType>) -> String {
    types
        .iter()
        .map(ValueType::as_str)
        .collect::<Vec<_>>()
        .join(" or ")
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Naive timestamps are taken as UTC
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

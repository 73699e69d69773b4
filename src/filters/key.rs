//! # Filter Keys
//!
//! The typed (attribute, operator, cardinality) triple behind every filter
//! parameter, and its two wire spellings: the internal name
//! (`age__gt__in`) and the external alias (`age[gt][]`).

use serde::{Deserialize, Serialize};

use super::operator::Operator;

/// Internal marker for membership parameters
pub const MEMBERSHIP_SUFFIX: &str = "__in";

/// Internal separator between attribute and operator
pub const OPERATOR_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    /// One value
    Scalar,
    /// Any of several values
    Membership,
}

/// Target attribute, operator and cardinality of a filter parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterKey {
    pub attribute: String,
    pub operator: Operator,
    pub cardinality: Cardinality,
}

impl FilterKey {
    pub fn scalar(attribute: impl Into<String>, operator: Operator) -> Self {
        Self {
            attribute: attribute.into(),
            operator,
            cardinality: Cardinality::Scalar,
        }
    }

    pub fn membership(attribute: impl Into<String>, operator: Operator) -> Self {
        Self {
            attribute: attribute.into(),
            operator,
            cardinality: Cardinality::Membership,
        }
    }

    pub fn is_membership(&self) -> bool {
        self.cardinality == Cardinality::Membership
    }

    /// Internal name: `field`, `field__op`, `field__in`, `field__op__in`
    pub fn param_name(&self) -> String {
        let mut name = self.attribute.clone();
        if self.operator != Operator::Eq {
            name.push_str(OPERATOR_SEPARATOR);
            name.push_str(self.operator.as_str());
        }
        if self.is_membership() {
            name.push_str(MEMBERSHIP_SUFFIX);
        }
        name
    }

    /// External alias: `field`, `field[op]`, `field[]`, `field[op][]`,
    /// with the attribute camel-cased
    pub fn alias(&self) -> String {
        let mut alias = camel(&self.attribute);
        if self.operator != Operator::Eq {
            alias.push_str(&format!("[{}]", self.operator));
        }
        if self.is_membership() {
            alias.push_str("[]");
        }
        alias
    }

    /// Recover the key from an internal name.
    ///
    /// A trailing `__in` marks membership, then an optional `__op` suffix
    /// names the operator; no suffix means `eq`.
    pub fn parse(name: &str) -> Option<Self> {
        let (base, cardinality) = match name.strip_suffix(MEMBERSHIP_SUFFIX) {
            Some(base) => (base, Cardinality::Membership),
            None => (name, Cardinality::Scalar),
        };

        let mut parts = base.split(OPERATOR_SEPARATOR);
        let attribute = parts.next().filter(|a| !a.is_empty())?;
        let operator = match parts.next() {
            None => Operator::Eq,
            Some(op) => op.parse().ok()?,
        };
        if parts.next().is_some() {
            return None;
        }

        Some(Self {
            attribute: attribute.to_string(),
            operator,
            cardinality,
        })
    }
}

/// `snake_case` to `camelCase`
pub fn camel(snake: &str) -> String {
    let mut parts = snake.split('_');
    let mut out = parts.next().unwrap_or_default().to_lowercase();
    for part in parts {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(&chars.as_str().to_lowercase());
        }
    }
    out
}

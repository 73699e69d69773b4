//! # Operator Vocabulary
//!
//! The closed set of per-field comparison operators exposed by the API,
//! partitioned into equality, ordering and pattern groups.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::ValueType;

/// Filter operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Like,
    Ilike,
}

/// Mutually exclusive operator groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorGroup {
    /// `eq`, `ne`
    Exact,
    /// `gt`, `lt`, `ge`, `le`
    Comparison,
    /// `like`, `ilike`
    Pattern,
}

impl Operator {
    /// Every operator, in declaration order
    pub const ALL: [Operator; 8] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Lt,
        Operator::Ge,
        Operator::Le,
        Operator::Like,
        Operator::Ilike,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Lt => "lt",
            Operator::Ge => "ge",
            Operator::Le => "le",
            Operator::Like => "like",
            Operator::Ilike => "ilike",
        }
    }

    pub fn group(&self) -> OperatorGroup {
        match self {
            Operator::Eq | Operator::Ne => OperatorGroup::Exact,
            Operator::Gt | Operator::Lt | Operator::Ge | Operator::Le => OperatorGroup::Comparison,
            Operator::Like | Operator::Ilike => OperatorGroup::Pattern,
        }
    }

    pub fn is_exact(&self) -> bool {
        self.group() == OperatorGroup::Exact
    }

    /// Operators of one group
    pub fn in_group(group: OperatorGroup) -> impl Iterator<Item = Operator> {
        Self::ALL.into_iter().filter(move |op| op.group() == group)
    }

    /// Whether this operator may filter a field with the given value types.
    ///
    /// Booleans admit only equality, strings everything but ordering,
    /// any other scalar everything but patterns.
    pub fn valid_for(&self, types: &BTreeSet<ValueType>) -> bool {
        if types.contains(&ValueType::Bool) {
            return self.group() == OperatorGroup::Exact;
        }
        if types.contains(&ValueType::Str) {
            return self.group() != OperatorGroup::Comparison;
        }
        self.group() != OperatorGroup::Pattern
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| format!("unknown operator: {}", s))
    }
}

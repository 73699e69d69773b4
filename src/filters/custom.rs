//! # Custom Predicates
//!
//! Filter fields whose value renders its own predicate instead of going
//! through the fixed operator vocabulary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{ModelDescriptor, ValueType};
use crate::query::predicate::{escape_like, Predicate};

use super::compiler::{as_text, require_attribute, CompilesToPredicate};
use super::errors::FilterResult;

/// Match rows within an edit distance of the supplied string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzyDistance {
    pub field: String,
    pub max_distance: usize,
}

/// Whitespace-tokenised substring search across several fields.
///
/// Every token must occur in at least one of the fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiLike {
    pub fields: Vec<String>,
    #[serde(default = "default_ignore_case")]
    pub ignore_case: bool,
}

fn default_ignore_case() -> bool {
    true
}

/// Predicate renderers available to custom fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomPredicate {
    Levenshtein(FuzzyDistance),
    MultiLike(MultiLike),
}

/// Extra schema field outside the operator vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub name: String,

    #[serde(rename = "type", default = "default_custom_type")]
    pub value_type: ValueType,

    /// `None` leaves the field to a registered search handler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<CustomPredicate>,
}

fn default_custom_type() -> ValueType {
    ValueType::Str
}

impl CustomField {
    /// Field handled by a search handler rather than a predicate
    pub fn plain(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            predicate: None,
        }
    }

    pub fn levenshtein(name: impl Into<String>, field: impl Into<String>, max_distance: usize) -> Self {
        Self {
            name: name.into(),
            value_type: ValueType::Str,
            predicate: Some(CustomPredicate::Levenshtein(FuzzyDistance {
                field: field.into(),
                max_distance,
            })),
        }
    }

    pub fn multi_like<I, F>(name: impl Into<String>, fields: I, ignore_case: bool) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        Self {
            name: name.into(),
            value_type: ValueType::Str,
            predicate: Some(CustomPredicate::MultiLike(MultiLike {
                fields: fields.into_iter().map(Into::into).collect(),
                ignore_case,
            })),
        }
    }

    /// Model attributes the predicate reads
    pub fn referenced_fields(&self) -> Vec<&str> {
        match &self.predicate {
            Some(CustomPredicate::Levenshtein(p)) => vec![p.field.as_str()],
            Some(CustomPredicate::MultiLike(p)) => p.fields.iter().map(String::as_str).collect(),
            None => Vec::new(),
        }
    }
}

impl CompilesToPredicate for FuzzyDistance {
    fn compile_predicate(&self, model: &ModelDescriptor, value: &Value) -> FilterResult<Predicate> {
        require_attribute(model, &self.field)?;
        Ok(Predicate::Levenshtein {
            field: self.field.clone(),
            value: as_text(value),
            max_distance: self.max_distance,
        })
    }
}

impl CompilesToPredicate for MultiLike {
    fn compile_predicate(&self, model: &ModelDescriptor, value: &Value) -> FilterResult<Predicate> {
        for field in &self.fields {
            require_attribute(model, field)?;
        }

        let text = as_text(value);
        let per_token = text
            .split_whitespace()
            .map(|token| {
                let pattern = format!("%{}%", escape_like(token));
                let alternatives = self
                    .fields
                    .iter()
                    .map(|f| Predicate::Like {
                        field: f.clone(),
                        pattern: pattern.clone(),
                        case_insensitive: self.ignore_case,
                    })
                    .collect();
                Predicate::or(alternatives)
            })
            .collect();

        Ok(Predicate::and(per_token))
    }
}

impl CompilesToPredicate for CustomPredicate {
    fn compile_predicate(&self, model: &ModelDescriptor, value: &Value) -> FilterResult<Predicate> {
        match self {
            CustomPredicate::Levenshtein(p) => p.compile_predicate(model, value),
            CustomPredicate::MultiLike(p) => p.compile_predicate(model, value),
        }
    }
}

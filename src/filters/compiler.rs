//! # Predicate Compiler
//!
//! Turns a validated parameter instance into one conjunctive predicate.
//! Only supplied parameters contribute; each is compiled by whatever
//! knows how to render it (a filter key or a custom predicate) and the
//! results are ANDed.

use serde_json::Value;

use crate::model::ModelDescriptor;
use crate::query::predicate::{escape_like, Comparator, Predicate};

use super::errors::{FilterError, FilterResult};
use super::key::{Cardinality, FilterKey};
use super::operator::Operator;
use super::params::FilterParams;
use super::schema::ParamKind;

/// Capability to render a predicate for a supplied value
pub trait CompilesToPredicate {
    fn compile_predicate(&self, model: &ModelDescriptor, value: &Value) -> FilterResult<Predicate>;
}

impl CompilesToPredicate for FilterKey {
    fn compile_predicate(&self, model: &ModelDescriptor, value: &Value) -> FilterResult<Predicate> {
        require_attribute(model, &self.attribute)?;
        let field = self.attribute.clone();

        match (self.operator, self.cardinality) {
            (Operator::Eq, Cardinality::Membership) => Ok(Predicate::in_list(field, as_list(value))),
            (Operator::Ne, Cardinality::Membership) => Ok(Predicate::not_in(field, as_list(value))),
            (_, Cardinality::Membership) => Err(FilterError::UnsupportedFilter(self.param_name())),
            (Operator::Like, Cardinality::Scalar) => Ok(Predicate::like(field, contains_pattern(value))),
            (Operator::Ilike, Cardinality::Scalar) => Ok(Predicate::ilike(field, contains_pattern(value))),
            (op, Cardinality::Scalar) => {
                let comparator = comparator(op).ok_or_else(|| FilterError::UnsupportedFilter(self.param_name()))?;
                Ok(Predicate::compare(field, comparator, value.clone()))
            }
        }
    }
}

/// Compile every supplied filter of `params` into one predicate.
///
/// Custom fields without a predicate are skipped here; they belong to the
/// registered search handler. Errors indicate a schema/model mismatch.
pub fn compile(params: &FilterParams) -> FilterResult<Predicate> {
    let model = params.model();
    let mut parts = Vec::new();

    for (spec, value) in params.filters() {
        match &spec.kind {
            ParamKind::Filter(key) => parts.push(key.compile_predicate(model, value)?),
            ParamKind::Custom(Some(custom)) => parts.push(custom.compile_predicate(model, value)?),
            ParamKind::Custom(None) => {}
        }
    }

    let predicate = Predicate::and(parts);
    tracing::debug!(model = %model.name, predicate = ?predicate, "Compiled filters");
    Ok(predicate)
}

fn comparator(op: Operator) -> Option<Comparator> {
    match op {
        Operator::Eq => Some(Comparator::Eq),
        Operator::Ne => Some(Comparator::Ne),
        Operator::Gt => Some(Comparator::Gt),
        Operator::Lt => Some(Comparator::Lt),
        Operator::Ge => Some(Comparator::Ge),
        Operator::Le => Some(Comparator::Le),
        Operator::Like | Operator::Ilike => None,
    }
}

pub(crate) fn require_attribute(model: &ModelDescriptor, attribute: &str) -> FilterResult<()> {
    if model.has_field(attribute) {
        Ok(())
    } else {
        Err(FilterError::UnknownAttribute {
            model: model.name.clone(),
            attribute: attribute.to_string(),
        })
    }
}

/// Text of a value as matched by patterns
pub(crate) fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_list(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

/// `%value%` with the value's own wildcards escaped
fn contains_pattern(value: &Value) -> String {
    format!("%{}%", escape_like(&as_text(value)))
}

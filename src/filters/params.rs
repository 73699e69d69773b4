//! # Parameter Instances
//!
//! One request's validated filter values. Raw query-string pairs are
//! resolved against a [`FilterSchema`], coerced to typed JSON values and
//! checked against the closed order-by and projection choices. Every
//! problem is collected before the instance is rejected.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::model::{coerce_any, describe_types, ModelDescriptor};
use crate::query::select::OrderTerm;

use super::errors::ValidationErrors;
use super::schema::{FilterSchema, ParamSpec, ORDER_BY, PAGE, PER_PAGE, PROJECT};

/// Wire spelling of the null sentinel on equality parameters
pub const NULL_LITERAL: &str = "null";

/// Validated parameters of one request
#[derive(Debug, Clone)]
pub struct FilterParams {
    schema: Arc<FilterSchema>,
    page: u64,
    per_page: Option<u64>,
    order_by: Option<Vec<OrderTerm>>,
    project: Option<Vec<String>>,
    /// Supplied filters keyed by parameter index; unset parameters are absent
    values: BTreeMap<usize, Value>,
}

impl FilterParams {
    /// Empty instance: no filters, first page, no pagination
    pub fn new(schema: &Arc<FilterSchema>) -> Self {
        Self {
            schema: Arc::clone(schema),
            page: 0,
            per_page: None,
            order_by: None,
            project: None,
            values: BTreeMap::new(),
        }
    }

    /// Parse a URL-encoded query string
    pub fn from_query(schema: &Arc<FilterSchema>, query: &str) -> Result<Self, ValidationErrors> {
        let pairs = url::form_urlencoded::parse(query.as_bytes()).into_owned();
        Self::from_pairs(schema, pairs)
    }

    /// Validate decoded `(key, value)` pairs in request order
    pub fn from_pairs<I, K, V>(schema: &Arc<FilterSchema>, pairs: I) -> Result<Self, ValidationErrors>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut params = Self::new(schema);
        let mut errors = ValidationErrors::default();

        for (key, raw) in pairs {
            let (key, raw) = (key.as_ref(), raw.as_ref());

            if key == PAGE {
                match raw.trim().parse::<u64>() {
                    Ok(page) => params.page = page,
                    Err(_) => errors.push(key, "expected an unsigned integer"),
                }
            } else if key == PER_PAGE.0 || key == PER_PAGE.1 {
                match raw.trim().parse::<u64>() {
                    Ok(per_page) => params.per_page = Some(per_page).filter(|n| *n > 0),
                    Err(_) => errors.push(key, "expected an unsigned integer"),
                }
            } else if key == ORDER_BY.0 || key == ORDER_BY.1 {
                if schema.order_by_choices().iter().any(|c| c == raw) {
                    params
                        .order_by
                        .get_or_insert_with(Vec::new)
                        .push(OrderTerm::from_token(raw));
                } else {
                    errors.push(key, format!("invalid choice: {}", raw));
                }
            } else if key == PROJECT {
                if schema.project_choices().iter().any(|c| c == raw) {
                    let project = params.project.get_or_insert_with(Vec::new);
                    if !project.iter().any(|c| c == raw) {
                        project.push(raw.to_string());
                    }
                } else {
                    errors.push(key, format!("invalid choice: {}", raw));
                }
            } else {
                match schema.index_of(key) {
                    None => errors.push(key, "unknown parameter"),
                    Some(idx) => {
                        let spec = schema.param_at(idx);
                        match coerce_param(spec, raw) {
                            Ok(value) => params.insert(idx, spec, value),
                            Err(message) => errors.push(key, message),
                        }
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(params)
        } else {
            Err(errors)
        }
    }

    fn insert(&mut self, idx: usize, spec: &ParamSpec, value: Value) {
        if !spec.is_membership() {
            self.values.insert(idx, value);
            return;
        }
        match self.values.entry(idx).or_insert_with(|| Value::Array(Vec::new())) {
            Value::Array(items) => items.push(value),
            slot => *slot = Value::Array(vec![value]),
        }
    }

    pub fn with_page(mut self, page: u64) -> Self {
        self.page = page;
        self
    }

    /// Page size; zero disables pagination
    pub fn with_per_page(mut self, per_page: u64) -> Self {
        self.per_page = Some(per_page).filter(|n| *n > 0);
        self
    }

    pub fn schema(&self) -> &Arc<FilterSchema> {
        &self.schema
    }

    pub fn model(&self) -> &ModelDescriptor {
        self.schema.model()
    }

    /// Zero-based page index
    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn per_page(&self) -> Option<u64> {
        self.per_page
    }

    /// Row offset of the current page, when paginated
    pub fn offset(&self) -> Option<u64> {
        self.per_page.map(|n| self.page.saturating_mul(n))
    }

    pub fn order_by(&self) -> Option<&[OrderTerm]> {
        self.order_by.as_deref()
    }

    pub fn project(&self) -> Option<&[String]> {
        self.project.as_deref()
    }

    /// Supplied filters in schema order
    pub fn filters(&self) -> impl Iterator<Item = (&ParamSpec, &Value)> {
        self.values
            .iter()
            .map(|(idx, value)| (self.schema.param_at(*idx), value))
    }

    /// Whether a filter was supplied, by alias or internal name
    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.schema
            .index_of(key)
            .and_then(|idx| self.values.get(&idx))
    }

    /// No filter supplied
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Coerce one raw token, honouring the null sentinel
fn coerce_param(spec: &ParamSpec, raw: &str) -> Result<Value, String> {
    if spec.nullable && raw == NULL_LITERAL {
        return Ok(Value::Null);
    }
    coerce_any(&spec.accepts, raw).ok_or_else(|| format!("expected {}", describe_types(&spec.accepts)))
}

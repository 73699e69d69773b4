//! # Filter Schema Synthesis
//!
//! Derives the request-parameter schema of a model from its field types:
//! one scalar parameter per legal (field, operator) pair, a membership
//! companion for equality operators on non-boolean fields, plus order-by
//! and projection choices and any custom fields.
//!
//! Schemas are built once at startup and shared read-only between
//! requests.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::model::{FieldDescriptor, Model, ModelDescriptor, ValueType};
use crate::query::select::DESC_SUFFIX;

use super::custom::{CustomField, CustomPredicate};
use super::key::FilterKey;
use super::operator::Operator;

/// Page index parameter
pub const PAGE: &str = "page";
/// Page size parameter, internal name and alias
pub const PER_PAGE: (&str, &str) = ("per_page", "perPage");
/// Ordering parameter, internal name and alias
pub const ORDER_BY: (&str, &str) = ("order_by", "orderBy");
/// Projection parameter
pub const PROJECT: &str = "project";

/// Names of the parameters every schema carries
pub const BASE_FIELDS: [&str; 4] = [PAGE, PER_PAGE.0, ORDER_BY.0, PROJECT];

/// Whether `name` is a base parameter under its internal name or alias
pub fn is_base_param(name: &str) -> bool {
    BASE_FIELDS.contains(&name) || name == PER_PAGE.1 || name == ORDER_BY.1
}

/// What a parameter filters on
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    /// A model attribute through the operator vocabulary
    Filter(FilterKey),
    /// A custom field; without a predicate it needs a search handler
    Custom(Option<CustomPredicate>),
}

/// One synthesised filter parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSpec {
    /// Internal name, e.g. `age__gt`
    pub name: String,
    /// External alias, e.g. `age[gt]`
    pub alias: String,
    pub kind: ParamKind,
    /// Value types accepted (per element for membership parameters)
    pub accepts: BTreeSet<ValueType>,
    /// Whether the null sentinel is accepted
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ParamSpec {
    pub fn key(&self) -> Option<&FilterKey> {
        match &self.kind {
            ParamKind::Filter(key) => Some(key),
            ParamKind::Custom(_) => None,
        }
    }

    pub fn is_membership(&self) -> bool {
        self.key().map(FilterKey::is_membership).unwrap_or(false)
    }

    /// Custom field without its own predicate
    pub fn is_custom_filter(&self) -> bool {
        matches!(self.kind, ParamKind::Custom(None))
    }
}

/// Request-parameter schema of one model
#[derive(Debug, Clone, Serialize)]
pub struct FilterSchema {
    name: String,
    #[serde(skip)]
    model: ModelDescriptor,
    params: Vec<ParamSpec>,
    order_by: Vec<String>,
    project: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search_method: Option<String>,
    /// Alias and internal name to parameter index
    #[serde(skip)]
    lookup: HashMap<String, usize>,
}

impl FilterSchema {
    /// Synthesise a schema.
    ///
    /// Filterable names missing from the model are skipped, so a malformed
    /// model yields an empty schema rather than an error.
    pub fn build<I>(
        model: &ModelDescriptor,
        fields: I,
        custom_fields: Vec<CustomField>,
        search_method: Option<&str>,
    ) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut params = Vec::new();

        for name in fields {
            let name = name.as_ref();
            match model.field(name) {
                Some(field) => params.extend(field_params(field)),
                None => tracing::warn!(
                    model = %model.name,
                    field = %name,
                    "Skipping filter field missing from model"
                ),
            }
        }

        for custom in custom_fields {
            params.push(ParamSpec {
                alias: custom.name.clone(),
                name: custom.name,
                kind: ParamKind::Custom(custom.predicate),
                accepts: BTreeSet::from([custom.value_type]),
                nullable: false,
                description: None,
            });
        }

        let mut order_by: Vec<String> = model
            .field_names()
            .flat_map(|f| [f.to_string(), format!("{}{}", f, DESC_SUFFIX)])
            .collect();
        order_by.sort();

        let project = model.field_names().map(str::to_string).collect();

        let mut lookup = HashMap::with_capacity(params.len() * 2);
        for (idx, param) in params.iter().enumerate() {
            lookup.insert(param.alias.clone(), idx);
            lookup.insert(param.name.clone(), idx);
        }

        tracing::debug!(
            model = %model.name,
            params = params.len(),
            "Synthesised filter schema"
        );

        Self {
            name: format!("{}_filters", model.name),
            model: model.clone(),
            params,
            order_by,
            project,
            search_method: search_method.map(str::to_string),
            lookup,
        }
    }

    pub fn builder(model: ModelDescriptor) -> FilterSchemaBuilder {
        FilterSchemaBuilder {
            model,
            fields: Vec::new(),
            custom_fields: Vec::new(),
            search_method: None,
        }
    }

    /// Builder over a typed model's descriptor
    pub fn for_model<M: Model>() -> FilterSchemaBuilder {
        Self::builder(M::descriptor())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &ModelDescriptor {
        &self.model
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Look up a parameter by alias or internal name
    pub fn param(&self, key: &str) -> Option<&ParamSpec> {
        self.index_of(key).map(|idx| &self.params[idx])
    }

    pub(crate) fn index_of(&self, key: &str) -> Option<usize> {
        self.lookup.get(key).copied()
    }

    pub(crate) fn param_at(&self, idx: usize) -> &ParamSpec {
        &self.params[idx]
    }

    /// Accepted order-by values, sorted
    pub fn order_by_choices(&self) -> &[String] {
        &self.order_by
    }

    /// Accepted projection values, in model order
    pub fn project_choices(&self) -> &[String] {
        &self.project
    }

    pub fn search_method(&self) -> Option<&str> {
        self.search_method.as_deref()
    }

    /// Whether any custom field relies on a search handler
    pub fn has_custom_filters(&self) -> bool {
        self.params.iter().any(ParamSpec::is_custom_filter)
    }

    /// Operators offered for a model attribute
    pub fn legal_operators(&self, attribute: &str) -> BTreeSet<Operator> {
        self.params
            .iter()
            .filter_map(ParamSpec::key)
            .filter(|k| k.attribute == attribute)
            .map(|k| k.operator)
            .collect()
    }
}

/// Parameters generated for one model field
fn field_params(field: &FieldDescriptor) -> Vec<ParamSpec> {
    let types = field.value_types();
    let boolean = types.contains(&ValueType::Bool);
    let mut out = Vec::new();

    for op in Operator::ALL.into_iter().filter(|op| op.valid_for(&types)) {
        let key = FilterKey::scalar(&field.name, op);
        let with_membership = op.is_exact() && !boolean;

        out.push(ParamSpec {
            name: key.param_name(),
            alias: key.alias(),
            kind: ParamKind::Filter(key),
            accepts: types.clone(),
            nullable: with_membership,
            description: field.description.clone(),
        });

        if with_membership {
            let key = FilterKey::membership(&field.name, op);
            out.push(ParamSpec {
                name: key.param_name(),
                alias: key.alias(),
                kind: ParamKind::Filter(key),
                accepts: types.clone(),
                nullable: false,
                description: field.description.clone(),
            });
        }
    }

    out
}

/// Step-by-step schema construction
#[derive(Debug, Clone)]
pub struct FilterSchemaBuilder {
    model: ModelDescriptor,
    fields: Vec<String>,
    custom_fields: Vec<CustomField>,
    search_method: Option<String>,
}

impl FilterSchemaBuilder {
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }

    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn custom(mut self, field: CustomField) -> Self {
        self.custom_fields.push(field);
        self
    }

    pub fn search_method(mut self, name: impl Into<String>) -> Self {
        self.search_method = Some(name.into());
        self
    }

    pub fn build(self) -> FilterSchema {
        FilterSchema::build(
            &self.model,
            &self.fields,
            self.custom_fields,
            self.search_method.as_deref(),
        )
    }
}

//! # Model Descriptors
//!
//! Reflection data for a stored model: its name, ordered fields and
//! primary key. Built once at startup and read-only afterwards.

use std::collections::{BTreeSet, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::query::Row;

use super::errors::{ModelError, ModelResult};
use super::types::{classify, describe_types, DeclaredType, ValueType};

/// A record type with a static descriptor
pub trait Model: Serialize + DeserializeOwned {
    fn descriptor() -> ModelDescriptor;
}

/// Field definition in a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name
    pub name: String,

    /// Declared types; a single name or a list in JSON
    #[serde(rename = "type", deserialize_with = "one_or_many")]
    pub declared: Vec<DeclaredType>,

    /// Whether this is the primary key
    #[serde(default)]
    pub primary_key: bool,

    /// Value given to fresh instances
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(DeclaredType),
    Many(Vec<DeclaredType>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<DeclaredType>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(t) => vec![t],
        OneOrMany::Many(ts) => ts,
    })
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, declared: impl IntoIterator<Item = DeclaredType>) -> Self {
        Self {
            name: name.into(),
            declared: declared.into_iter().collect(),
            primary_key: false,
            default: None,
            description: None,
        }
    }

    /// Mark as primary key
    pub fn primary(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Add the null marker
    pub fn nullable(mut self) -> Self {
        if !self.declared.contains(&DeclaredType::Null) {
            self.declared.push(DeclaredType::Null);
        }
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_nullable(&self) -> bool {
        self.declared.contains(&DeclaredType::Null)
    }

    /// Concrete value types of this field
    pub fn value_types(&self) -> BTreeSet<ValueType> {
        classify(&self.declared)
    }

    /// Check a JSON value against the declaration
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            return self.is_nullable();
        }
        self.declared.iter().any(|t| t.conforms(value))
    }

    /// Canonical stored form of a value, matching what filter coercion
    /// produces for the same input. Datetimes become fixed-width UTC,
    /// uuids lowercase hyphenated and dates `YYYY-MM-DD`; anything else
    /// is returned unchanged.
    pub fn normalize(&self, value: &Value) -> Value {
        let Value::String(raw) = value else {
            return value.clone();
        };
        self.value_types()
            .into_iter()
            .filter(|t| matches!(t, ValueType::Uuid | ValueType::Datetime | ValueType::Date))
            .find_map(|t| t.coerce(raw))
            .unwrap_or_else(|| value.clone())
    }

    /// Message for a value this field does not accept
    pub fn expected(&self) -> String {
        let mut expected = describe_types(&self.value_types());
        if self.is_nullable() {
            expected.push_str(" or null");
        }
        format!("expected {}", expected)
    }
}

/// Descriptor of a stored model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Model (and table) name
    pub name: String,

    /// Fields in declaration order
    pub fields: Vec<FieldDescriptor>,
}

impl ModelDescriptor {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Get the primary key field
    pub fn primary_key(&self) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.primary_key)
    }

    /// Normalize every declared field present in `row`
    pub fn normalize_row(&self, row: &mut Row) {
        for field in &self.fields {
            if let Some(value) = row.get_mut(&field.name) {
                *value = field.normalize(value);
            }
        }
    }

    /// Primary-key value in its stored form
    pub fn normalize_key(&self, id: &Value) -> Value {
        match self.primary_key() {
            Some(field) => field.normalize(id),
            None => id.clone(),
        }
    }

    /// Name of the primary key field, `"id"` when none is declared
    pub fn primary_key_name(&self) -> &str {
        self.primary_key().map(|f| f.name.as_str()).unwrap_or("id")
    }

    /// Validate names and the primary key declaration
    pub fn validate(&self) -> ModelResult<()> {
        if !is_identifier(&self.name) {
            return Err(ModelError::InvalidIdentifier(self.name.clone()));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !is_identifier(&field.name) {
                return Err(ModelError::InvalidIdentifier(field.name.clone()));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(ModelError::DuplicateField {
                    model: self.name.clone(),
                    field: field.name.clone(),
                });
            }
            if field.value_types().is_empty() {
                return Err(ModelError::UntypedField {
                    model: self.name.clone(),
                    field: field.name.clone(),
                });
            }
        }

        match self.fields.iter().filter(|f| f.primary_key).count() {
            0 => Err(ModelError::MissingPrimaryKey(self.name.clone())),
            1 => Ok(()),
            _ => Err(ModelError::MultiplePrimaryKeys(self.name.clone())),
        }
    }
}

/// Names end up inside SQL text, so only plain identifiers are allowed
fn is_identifier(name: &str) -> bool {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    IDENT
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid regex"))
        .is_match(name)
}

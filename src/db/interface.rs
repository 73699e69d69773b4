//! # Store Facade
//!
//! CRUD by primary key and filtered search over one session.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::filters::FilterParams;
use crate::model::{Model, ModelDescriptor};
use crate::query::{assemble_with, Predicate, Row};
use crate::store::Session;

use super::errors::{DbError, DbResult};
use super::search::SearchRegistry;

/// One page of search results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub rows: Vec<Row>,
    /// Matching rows across all pages, or the page length when unpaginated
    pub total: u64,
}

/// Facade over one store session
pub struct DbInterface<S: Session> {
    session: S,
    searches: Arc<SearchRegistry<S>>,
}

impl<S: Session> DbInterface<S> {
    pub fn new(session: S) -> Self {
        Self::with_searches(session, Arc::new(SearchRegistry::new()))
    }

    pub fn with_searches(session: S, searches: Arc<SearchRegistry<S>>) -> Self {
        Self { session, searches }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn into_session(self) -> S {
        self.session
    }

    /// Fetch by primary key
    pub fn get(&self, model: &ModelDescriptor, id: &Value) -> DbResult<Row> {
        self.session
            .get(model, &model.normalize_key(id))?
            .ok_or_else(|| DbError::not_found(&model.name, id))
    }

    /// Typed fetch by primary key
    pub fn get_as<M: Model>(&self, id: &Value) -> DbResult<M> {
        let row = self.get(&M::descriptor(), id)?;
        Ok(serde_json::from_value(Value::Object(row))?)
    }

    /// Assign `data` onto an existing row and stage it
    pub fn update(&mut self, model: &ModelDescriptor, id: &Value, data: &Row) -> DbResult<Row> {
        let mut row = self.get(model, id)?;
        apply_update(model, &mut row, data)?;
        Ok(self.session.put(model, row)?)
    }

    /// Like [`update`](Self::update), creating the row when absent
    ///
    /// A created row must satisfy the model once `data` is applied: fields
    /// without a default that are neither supplied nor nullable fail with
    /// [`DbError::InvalidValue`].
    pub fn upsert(&mut self, model: &ModelDescriptor, id: &Value, data: &Row) -> DbResult<Row> {
        let id = model.normalize_key(id);
        let row = match self.session.get(model, &id)? {
            Some(mut row) => {
                apply_update(model, &mut row, data)?;
                row
            }
            None => {
                tracing::debug!(model = %model.name, id = %id, "Upsert creating row");
                let mut row = fresh_row(model, &id);
                apply_update(model, &mut row, data)?;
                check_row(model, &row)?;
                row
            }
        };
        Ok(self.session.put(model, row)?)
    }

    /// Stage a delete; deleting an absent id is a no-op
    pub fn delete(&mut self, model: &ModelDescriptor, id: &Value) -> DbResult<()> {
        Ok(self.session.delete(model, &model.normalize_key(id))?)
    }

    /// Filtered, ordered and paginated search.
    ///
    /// Schemas with custom filters are dispatched to their registered
    /// search method.
    pub fn search(&self, params: &FilterParams) -> DbResult<SearchResult> {
        let schema = params.schema();
        if !schema.has_custom_filters() {
            return self.search_with(params, Predicate::True);
        }

        self.searches.validate(schema)?;
        let method = schema.search_method().unwrap_or_default();
        let handler = self.searches.get(method).ok_or_else(|| DbError::NotImplemented {
            method: method.to_string(),
            schema: schema.name().to_string(),
        })?;

        tracing::debug!(schema = %schema.name(), method = %method, "Dispatching custom search");
        handler(self, params)
    }

    /// Default search with an extra predicate ANDed into the filter
    pub fn search_with(&self, params: &FilterParams, extra: Predicate) -> DbResult<SearchResult> {
        let assembled = assemble_with(params, extra)?;
        let rows = self.session.fetch(&assembled.select)?;
        let total = match &assembled.count {
            Some(count) => self.session.count(count)?,
            None => rows.len() as u64,
        };
        Ok(SearchResult { rows, total })
    }

    /// Run `f` as one unit of work: commit on success, roll back on error
    pub fn transaction<T, F>(&mut self, f: F) -> DbResult<T>
    where
        F: FnOnce(&mut Self) -> DbResult<T>,
    {
        match f(self) {
            Ok(value) => {
                self.session.commit()?;
                Ok(value)
            }
            Err(err) => {
                self.session.rollback();
                tracing::debug!(error = %err, "Rolled back transaction");
                Err(err)
            }
        }
    }
}

/// Bulk field assignment. Primary-key and unknown fields are skipped.
fn apply_update(model: &ModelDescriptor, row: &mut Row, data: &Row) -> DbResult<()> {
    for (name, value) in data {
        let Some(field) = model.field(name) else {
            continue;
        };
        if field.primary_key {
            continue;
        }
        if !field.accepts(value) {
            return Err(DbError::InvalidValue {
                field: name.clone(),
                message: field.expected(),
            });
        }
        row.insert(name.clone(), field.normalize(value));
    }
    Ok(())
}

/// Every declared field holds a value its declaration accepts
fn check_row(model: &ModelDescriptor, row: &Row) -> DbResult<()> {
    for field in &model.fields {
        if !field.accepts(row.get(&field.name).unwrap_or(&Value::Null)) {
            return Err(DbError::InvalidValue {
                field: field.name.clone(),
                message: field.expected(),
            });
        }
    }
    Ok(())
}

/// New instance keyed by `id`, other fields at their defaults
fn fresh_row(model: &ModelDescriptor, id: &Value) -> Row {
    model
        .fields
        .iter()
        .map(|f| {
            let value = if f.primary_key {
                id.clone()
            } else {
                f.default.as_ref().map(|v| f.normalize(v)).unwrap_or(Value::Null)
            };
            (f.name.clone(), value)
        })
        .collect()
}

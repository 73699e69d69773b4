//! # Search Handlers
//!
//! Named search methods for schemas whose custom fields have no predicate
//! of their own. Handlers are registered at startup and resolved against
//! every schema before the first request.

use std::collections::HashMap;
use std::fmt;

use crate::filters::{FilterParams, FilterSchema};
use crate::store::Session;

use super::errors::{DbError, DbResult};
use super::interface::{DbInterface, SearchResult};

/// A registered search method
pub type SearchHandler<S> =
    dyn Fn(&DbInterface<S>, &FilterParams) -> DbResult<SearchResult> + Send + Sync;

/// Search methods keyed by name
pub struct SearchRegistry<S: Session> {
    handlers: HashMap<String, Box<SearchHandler<S>>>,
}

impl<S: Session> Default for SearchRegistry<S> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<S: Session> SearchRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one of the same name
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&DbInterface<S>, &FilterParams) -> DbResult<SearchResult> + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Box::new(handler));
        self
    }

    pub fn get(&self, name: &str) -> Option<&SearchHandler<S>> {
        self.handlers.get(name).map(|h| h.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Check that a schema with custom filters names a registered handler
    pub fn validate(&self, schema: &FilterSchema) -> DbResult<()> {
        if !schema.has_custom_filters() {
            return Ok(());
        }
        match schema.search_method() {
            Some(method) if self.contains(method) => Ok(()),
            method => Err(DbError::NotImplemented {
                method: method.unwrap_or("<none>").to_string(),
                schema: schema.name().to_string(),
            }),
        }
    }
}

impl<S: Session> fmt::Debug for SearchRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("SearchRegistry").field("handlers", &names).finish()
    }
}

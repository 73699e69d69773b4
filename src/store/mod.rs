//! # Store
//!
//! The contract the facade executes queries against, and an in-memory
//! engine implementing it.
//!
//! A [`Session`] is one unit of work: reads see the session's own staged
//! writes, and nothing becomes visible to other sessions until
//! [`Session::commit`].

pub mod errors;
pub mod memory;

pub use errors::{StoreError, StoreResult};
pub use memory::{MemorySession, MemoryStore};

use serde_json::Value;

use crate::model::ModelDescriptor;
use crate::query::{CountQuery, Row, SelectQuery};

/// One unit of work against a store
pub trait Session {
    /// Rows matched by a select, projected, ordered and windowed
    fn fetch(&self, query: &SelectQuery) -> StoreResult<Vec<Row>>;

    /// Number of rows matched by a count query
    fn count(&self, query: &CountQuery) -> StoreResult<u64>;

    /// Row by primary key
    fn get(&self, model: &ModelDescriptor, id: &Value) -> StoreResult<Option<Row>>;

    /// Stage an insert-or-replace by primary key, returning the stored row
    fn put(&mut self, model: &ModelDescriptor, row: Row) -> StoreResult<Row>;

    /// Stage a delete by primary key
    fn delete(&mut self, model: &ModelDescriptor, id: &Value) -> StoreResult<()>;

    fn commit(&mut self) -> StoreResult<()>;

    /// Discard staged changes
    fn rollback(&mut self);
}

/// Hands out independent sessions, one per request
pub trait SessionFactory: Send + Sync + 'static {
    type Session: Session + 'static;

    fn session(&self) -> Self::Session;
}

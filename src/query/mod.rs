//! # Query Layer
//!
//! Store-independent query values. Filters compile into [`Predicate`]
//! trees, the assembler wraps them into a [`SelectQuery`] plus an optional
//! [`CountQuery`] twin, and any session can execute or render them.

pub mod assembler;
pub mod predicate;
pub mod select;
pub mod sql;

pub use assembler::{assemble, assemble_with, AssembledQuery};
pub use predicate::{Comparator, Predicate};
pub use select::{CountQuery, Direction, OrderTerm, SelectQuery, Selection};
pub use sql::SqlParams;

/// A stored row: column name to JSON value
pub type Row = serde_json::Map<String, serde_json::Value>;

//! # Store Facade
//!
//! Primary-key CRUD, filtered search and transactions on top of a
//! [`Session`](crate::store::Session).

pub mod errors;
pub mod interface;
pub mod search;

pub use errors::{DbError, DbResult};
pub use interface::{DbInterface, SearchResult};
pub use search::{SearchHandler, SearchRegistry};

//! # REST API Module
//!
//! HTTP list, export and CRUD endpoints over registered filter schemas.

pub mod errors;
pub mod response;
pub mod server;

pub use errors::{ErrorResponse, RestError, RestResult};
pub use response::{DownloadResponse, PaginatedResponse, PaginationMeta, ResourceResponse};
pub use server::RestServer;

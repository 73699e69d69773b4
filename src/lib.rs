//! restquery - declarative filter schemas and paginated search for REST
//! list endpoints
//!
//! Models describe their typed fields; a [`filters::FilterSchema`] is
//! synthesised from them once at startup. Each request's query string
//! becomes a validated [`filters::FilterParams`], compiled into a
//! predicate, assembled into a select plus count query and executed by
//! the [`db::DbInterface`] facade against a [`store::Session`].

pub mod cli;
pub mod config;
pub mod db;
pub mod filters;
pub mod model;
pub mod query;
pub mod rest_api;
pub mod store;

//! # Model Reflection
//!
//! Describes the stored models that filter schemas are synthesised from:
//! typed fields, nullability and the primary key.

pub mod descriptor;
pub mod errors;
pub mod types;

pub use descriptor::{FieldDescriptor, Model, ModelDescriptor};
pub use errors::{ModelError, ModelResult};
pub use types::{classify, coerce_any, describe_types, DeclaredType, ValueType};

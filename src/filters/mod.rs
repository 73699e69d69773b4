//! # Filters
//!
//! Declarative filter schemas for list and search endpoints.
//!
//! A [`FilterSchema`] is synthesised once per model from its field types
//! and the list of filterable fields. Each request's query string is then
//! validated into [`FilterParams`], which [`compile`] turns into a single
//! predicate for the query assembler.
//!
//! ## Wire format
//!
//! | Parameter | Internal name | Meaning |
//! |---|---|---|
//! | `f=v` | `f` | equals |
//! | `f[op]=v` | `f__op` | any other operator |
//! | `f[]=a&f[]=b` | `f__in` | member of |
//! | `f[ne][]=a` | `f__ne__in` | not member of |
//! | `orderBy=f.desc` | `order_by` | ordering |
//! | `project=f` | `project` | column projection |
//! | `page=N&perPage=M` | `page`, `per_page` | pagination |

pub mod compiler;
pub mod custom;
pub mod errors;
pub mod key;
pub mod operator;
pub mod params;
pub mod schema;

pub use compiler::{compile, CompilesToPredicate};
pub use custom::{CustomField, CustomPredicate, FuzzyDistance, MultiLike};
pub use errors::{FieldError, FilterError, FilterResult, ValidationErrors};
pub use key::{Cardinality, FilterKey};
pub use operator::{Operator, OperatorGroup};
pub use params::{FilterParams, NULL_LITERAL};
pub use schema::{FilterSchema, FilterSchemaBuilder, ParamKind, ParamSpec};

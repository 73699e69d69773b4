//! # Select and Count Queries
//!
//! Store-independent query values: a selection with filter, ordering and
//! pagination, and its count-aggregated twin.

use serde::{Deserialize, Serialize};

use super::predicate::Predicate;

/// Suffix marking a descending order-by token
pub const DESC_SUFFIX: &str = ".desc";

/// What a select returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Whole model rows
    Model,
    /// Only the named columns
    Columns(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

/// One ordering attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    pub field: String,
    pub direction: Direction,
}

impl OrderTerm {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }

    /// Read an order-by token: `name` or `name.desc`
    pub fn from_token(token: &str) -> Self {
        match token.strip_suffix(DESC_SUFFIX) {
            Some(field) => Self::desc(field),
            None => Self::asc(token),
        }
    }
}

/// A selection over one table
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub table: String,
    pub selection: Selection,
    pub predicate: Predicate,
    pub order: Vec<OrderTerm>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl SelectQuery {
    /// Select whole rows of `table`, unfiltered
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            selection: Selection::Model,
            predicate: Predicate::True,
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn columns(mut self, columns: Vec<String>) -> Self {
        self.selection = Selection::Columns(columns);
        self
    }

    /// AND a predicate into the filter
    pub fn filter(mut self, predicate: Predicate) -> Self {
        let current = std::mem::replace(&mut self.predicate, Predicate::True);
        self.predicate = Predicate::and(vec![current, predicate]);
        self
    }

    pub fn order_by(mut self, terms: impl IntoIterator<Item = OrderTerm>) -> Self {
        self.order.extend(terms);
        self
    }

    pub fn paginate(mut self, limit: u64, offset: u64) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Same table and filter, count-aggregated, ordering and window stripped
    pub fn count_query(&self) -> CountQuery {
        CountQuery {
            table: self.table.clone(),
            predicate: self.predicate.clone(),
        }
    }
}

/// `count(*)` over the rows matched by a predicate
#[derive(Debug, Clone, PartialEq)]
pub struct CountQuery {
    pub table: String,
    pub predicate: Predicate,
}

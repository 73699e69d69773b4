//! # Query Assembler
//!
//! Builds the select for a parameter instance: projection or whole rows,
//! the compiled filter, ordering, and when a page size is given the
//! count twin followed by the page window.

use crate::filters::{compile, FilterParams, FilterResult};

use super::predicate::Predicate;
use super::select::{CountQuery, SelectQuery};

/// Main query and, for paginated requests, its count twin
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledQuery {
    pub select: SelectQuery,
    pub count: Option<CountQuery>,
}

/// Assemble the queries for a parameter instance
pub fn assemble(params: &FilterParams) -> FilterResult<AssembledQuery> {
    assemble_with(params, Predicate::True)
}

/// Assemble with an additional predicate ANDed into the filter
pub fn assemble_with(params: &FilterParams, extra: Predicate) -> FilterResult<AssembledQuery> {
    let model = params.model();

    let mut select = SelectQuery::new(&model.name);
    if let Some(columns) = params.project() {
        select = select.columns(columns.to_vec());
    }

    select = select.filter(compile(params)?).filter(extra);

    if let Some(order) = params.order_by() {
        select = select.order_by(order.iter().cloned());
    }

    // The count twin is taken before the window is applied
    let count = match (params.per_page(), params.offset()) {
        (Some(limit), Some(offset)) => {
            let count = select.count_query();
            select = select.paginate(limit, offset);
            Some(count)
        }
        _ => None,
    };

    tracing::debug!(
        table = %select.table,
        limit = ?select.limit,
        offset = ?select.offset,
        counted = count.is_some(),
        "Assembled query"
    );

    Ok(AssembledQuery { select, count })
}

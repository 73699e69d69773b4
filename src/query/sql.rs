//! SQL rendering
//!
//! Renders select and count queries as parameterised SQL text with `?`
//! placeholders. Identifiers are double-quoted.

use serde_json::Value;

use super::predicate::{Comparator, Predicate};
use super::select::{CountQuery, Direction, SelectQuery, Selection};

/// Bind parameters in placeholder order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlParams {
    pub values: Vec<Value>,
}

impl SqlParams {
    fn bind(&mut self, value: Value) -> &'static str {
        self.values.push(value);
        "?"
    }
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Render a predicate as a WHERE fragment, pushing its parameters
pub fn predicate_sql(predicate: &Predicate, params: &mut SqlParams) -> String {
    match predicate {
        Predicate::True => "1=1".to_string(),
        Predicate::Compare {
            field,
            comparator,
            value,
        } => {
            let col = quote_ident(field);
            match (comparator, value.is_null()) {
                (Comparator::Eq, true) => format!("{} IS NULL", col),
                (Comparator::Ne, true) => format!("{} IS NOT NULL", col),
                _ => format!("{} {} {}", col, comparator.as_sql(), params.bind(value.clone())),
            }
        }
        Predicate::In {
            field,
            values,
            negated,
        } => {
            if values.is_empty() {
                return if *negated { "1=1" } else { "1=0" }.to_string();
            }
            let placeholders: Vec<&str> = values.iter().map(|v| params.bind(v.clone())).collect();
            format!(
                "{} {}IN ({})",
                quote_ident(field),
                if *negated { "NOT " } else { "" },
                placeholders.join(", ")
            )
        }
        Predicate::Like {
            field,
            pattern,
            case_insensitive,
        } => format!(
            "{} {} {} ESCAPE '\\'",
            quote_ident(field),
            if *case_insensitive { "ILIKE" } else { "LIKE" },
            params.bind(Value::String(pattern.clone()))
        ),
        Predicate::Levenshtein {
            field,
            value,
            max_distance,
        } => format!(
            "levenshtein({}, {}) <= {}",
            quote_ident(field),
            params.bind(Value::String(value.clone())),
            params.bind(Value::from(*max_distance as u64))
        ),
        Predicate::And(parts) => join_sql(parts, " AND ", "1=1", params),
        Predicate::Or(parts) => join_sql(parts, " OR ", "1=0", params),
    }
}

fn join_sql(parts: &[Predicate], sep: &str, empty: &str, params: &mut SqlParams) -> String {
    if parts.is_empty() {
        return empty.to_string();
    }
    let rendered: Vec<String> = parts.iter().map(|p| predicate_sql(p, params)).collect();
    format!("({})", rendered.join(sep))
}

fn where_clause(predicate: &Predicate, params: &mut SqlParams) -> String {
    if predicate.is_true() {
        String::new()
    } else {
        format!(" WHERE {}", predicate_sql(predicate, params))
    }
}

impl SelectQuery {
    pub fn to_sql(&self) -> (String, SqlParams) {
        let mut params = SqlParams::default();

        let columns = match &self.selection {
            Selection::Model => "*".to_string(),
            Selection::Columns(cols) => cols
                .iter()
                .map(|c| quote_ident(c))
                .collect::<Vec<_>>()
                .join(", "),
        };

        let mut sql = format!("SELECT {} FROM {}", columns, quote_ident(&self.table));
        sql.push_str(&where_clause(&self.predicate, &mut params));

        if !self.order.is_empty() {
            let terms: Vec<String> = self
                .order
                .iter()
                .map(|t| {
                    let dir = match t.direction {
                        Direction::Asc => "ASC",
                        Direction::Desc => "DESC",
                    };
                    format!("{} {}", quote_ident(&t.field), dir)
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        (sql, params)
    }
}

impl CountQuery {
    pub fn to_sql(&self) -> (String, SqlParams) {
        let mut params = SqlParams::default();
        let mut sql = format!("SELECT count(*) FROM {}", quote_ident(&self.table));
        sql.push_str(&where_clause(&self.predicate, &mut params));
        (sql, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::select::OrderTerm;
    use serde_json::json;

    #[test]
    fn test_select_sql() {
        let select = SelectQuery::new("users")
            .filter(Predicate::compare("age", Comparator::Gt, json!(18)))
            .filter(Predicate::ilike("name", "%al%"))
            .order_by([OrderTerm::desc("name"), OrderTerm::asc("age")])
            .paginate(2, 4);

        let (sql, params) = select.to_sql();
        assert_eq!(
            sql,
            "SELECT * FROM \"users\" WHERE (\"age\" > ? AND \"name\" ILIKE ? ESCAPE '\\') \
             ORDER BY \"name\" DESC, \"age\" ASC LIMIT 2 OFFSET 4"
        );
        assert_eq!(params.values, vec![json!(18), json!("%al%")]);
    }

    #[test]
    fn test_count_twin_shares_where() {
        let select = SelectQuery::new("users")
            .columns(vec!["name".to_string()])
            .filter(Predicate::in_list("age", vec![json!(1), json!(2)]))
            .order_by([OrderTerm::asc("name")])
            .paginate(10, 0);

        let (sql, params) = select.count_query().to_sql();
        assert_eq!(sql, "SELECT count(*) FROM \"users\" WHERE \"age\" IN (?, ?)");
        assert_eq!(params.values, vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_null_and_projection() {
        let select = SelectQuery::new("users")
            .columns(vec!["id".to_string(), "name".to_string()])
            .filter(Predicate::eq("age", Value::Null));

        let (sql, params) = select.to_sql();
        assert_eq!(sql, "SELECT \"id\", \"name\" FROM \"users\" WHERE \"age\" IS NULL");
        assert!(params.values.is_empty());
    }

    #[test]
    fn test_levenshtein_and_empty_sets() {
        let mut params = SqlParams::default();
        let p = Predicate::Levenshtein {
            field: "name".to_string(),
            value: "bob".to_string(),
            max_distance: 1,
        };
        assert_eq!(predicate_sql(&p, &mut params), "levenshtein(\"name\", ?) <= ?");
        assert_eq!(params.values, vec![json!("bob"), json!(1)]);

        assert_eq!(predicate_sql(&Predicate::in_list("a", vec![]), &mut params), "1=0");
        assert_eq!(predicate_sql(&Predicate::Or(vec![]), &mut params), "1=0");
        assert_eq!(SelectQuery::new("t").to_sql().0, "SELECT * FROM \"t\"");
    }
}

//! # Predicate Tree
//!
//! Boolean conditions over one stored row. This is the native predicate
//! language of the store: filters compile into it, the in-memory engine
//! evaluates it and the SQL renderer prints it.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Row;

/// Native comparators of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl Comparator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Ne => "<>",
            Comparator::Gt => ">",
            Comparator::Lt => "<",
            Comparator::Ge => ">=",
            Comparator::Le => "<=",
        }
    }
}

/// A condition over one row
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every row
    True,

    /// `field <comparator> value`; comparing with null means IS [NOT] NULL
    Compare {
        field: String,
        comparator: Comparator,
        value: Value,
    },

    /// Membership, `NOT IN` when negated
    In {
        field: String,
        values: Vec<Value>,
        negated: bool,
    },

    /// SQL LIKE pattern (`%`, `_`, `\` escapes)
    Like {
        field: String,
        pattern: String,
        case_insensitive: bool,
    },

    /// Edit distance between the column and a string is at most `max_distance`
    Levenshtein {
        field: String,
        value: String,
        max_distance: usize,
    },

    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn compare(field: impl Into<String>, comparator: Comparator, value: Value) -> Self {
        Predicate::Compare {
            field: field.into(),
            comparator,
            value,
        }
    }

    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::compare(field, Comparator::Eq, value)
    }

    pub fn in_list(field: impl Into<String>, values: Vec<Value>) -> Self {
        Predicate::In {
            field: field.into(),
            values,
            negated: false,
        }
    }

    pub fn not_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Predicate::In {
            field: field.into(),
            values,
            negated: true,
        }
    }

    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Predicate::Like {
            field: field.into(),
            pattern: pattern.into(),
            case_insensitive: false,
        }
    }

    pub fn ilike(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Predicate::Like {
            field: field.into(),
            pattern: pattern.into(),
            case_insensitive: true,
        }
    }

    /// Conjunction. `True` members are dropped, an empty conjunction is `True`.
    pub fn and(predicates: Vec<Predicate>) -> Self {
        let mut parts: Vec<Predicate> = Vec::with_capacity(predicates.len());
        for p in predicates {
            match p {
                Predicate::True => {}
                Predicate::And(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        match parts.len() {
            0 => Predicate::True,
            1 => parts.remove(0),
            _ => Predicate::And(parts),
        }
    }

    /// Disjunction. An empty disjunction matches nothing.
    pub fn or(mut predicates: Vec<Predicate>) -> Self {
        if predicates.len() == 1 {
            return predicates.remove(0);
        }
        Predicate::Or(predicates)
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Predicate::True)
    }

    /// Check if a row matches this predicate
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Predicate::True => true,
            Predicate::Compare {
                field,
                comparator,
                value,
            } => {
                let column = row.get(field).unwrap_or(&Value::Null);
                if value.is_null() {
                    return match comparator {
                        Comparator::Eq => column.is_null(),
                        Comparator::Ne => !column.is_null(),
                        _ => false,
                    };
                }
                if column.is_null() {
                    return false;
                }
                match comparator {
                    Comparator::Eq => values_equal(column, value),
                    Comparator::Ne => !values_equal(column, value),
                    Comparator::Gt => compare_values(column, value) == Some(Ordering::Greater),
                    Comparator::Lt => compare_values(column, value) == Some(Ordering::Less),
                    Comparator::Ge => matches!(
                        compare_values(column, value),
                        Some(Ordering::Greater | Ordering::Equal)
                    ),
                    Comparator::Le => matches!(
                        compare_values(column, value),
                        Some(Ordering::Less | Ordering::Equal)
                    ),
                }
            }
            Predicate::In {
                field,
                values,
                negated,
            } => {
                let column = row.get(field).unwrap_or(&Value::Null);
                if column.is_null() {
                    return false;
                }
                let found = values.iter().any(|v| values_equal(column, v));
                found != *negated
            }
            Predicate::Like {
                field,
                pattern,
                case_insensitive,
            } => match row.get(field).and_then(Value::as_str) {
                Some(text) if *case_insensitive => {
                    like_match(&text.to_lowercase(), &pattern.to_lowercase())
                }
                Some(text) => like_match(text, pattern),
                None => false,
            },
            Predicate::Levenshtein {
                field,
                value,
                max_distance,
            } => match row.get(field).and_then(Value::as_str) {
                Some(text) => levenshtein(text, value) <= *max_distance,
                None => false,
            },
            Predicate::And(parts) => parts.iter().all(|p| p.matches(row)),
            Predicate::Or(parts) => parts.iter().any(|p| p.matches(row)),
        }
    }
}

/// Equality with numbers compared by value, so `1 == 1.0`
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Ordering between two values of the same kind, `None` when incomparable
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Escape LIKE metacharacters so user input matches literally
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    AnySeq,
    AnyOne,
    Lit(char),
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => Token::AnySeq,
            '_' => Token::AnyOne,
            '\\' => Token::Lit(chars.next().unwrap_or('\\')),
            c => Token::Lit(c),
        });
    }
    tokens
}

/// LIKE matching with `%` (any sequence) and `_` (one char)
pub fn like_match(value: &str, pattern: &str) -> bool {
    let text: Vec<char> = value.chars().collect();
    let tokens = tokenize(pattern);

    let (mut t, mut p) = (0usize, 0usize);
    // Last `%` position in the pattern and the text index it resumes from
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match tokens.get(p) {
            Some(Token::AnySeq) => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(Token::AnyOne) => {
                t += 1;
                p += 1;
            }
            Some(Token::Lit(c)) if *c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match backtrack {
                Some((star, resume)) => {
                    p = star + 1;
                    t = resume + 1;
                    backtrack = Some((star, resume + 1));
                }
                None => return false,
            },
        }
    }

    tokens[p..].iter().all(|tok| *tok == Token::AnySeq)
}

/// Levenshtein edit distance over chars
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != *cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

//! # In-Memory Store
//!
//! Committed tables live behind a shared lock; each [`MemorySession`]
//! stages its writes locally and reads through them. Commit applies the
//! staged changes atomically under the write lock.
//!
//! Unordered results come back in insertion order. Ordering is stable
//! and compares values by type first: null < bool < number < string.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use uuid::Uuid;

use crate::model::{ModelDescriptor, ValueType};
use crate::query::predicate::{values_equal, Predicate};
use crate::query::{CountQuery, Direction, OrderTerm, Row, SelectQuery, Selection};

use super::errors::{StoreError, StoreResult};
use super::{Session, SessionFactory};

type Tables = HashMap<String, Vec<Row>>;

/// Shared in-memory tables
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session over the committed tables
    pub fn session(&self) -> MemorySession {
        MemorySession {
            tables: Arc::clone(&self.tables),
            staged: Vec::new(),
        }
    }

    /// Insert rows and commit them, assigning missing keys.
    ///
    /// Absent fields take the model's default when it declares one.
    pub fn seed(&self, model: &ModelDescriptor, rows: Vec<Row>) -> StoreResult<()> {
        let mut session = self.session();
        for mut row in rows {
            for field in &model.fields {
                if let Some(default) = &field.default {
                    row.entry(field.name.as_str())
                        .or_insert_with(|| default.clone());
                }
            }
            model.normalize_row(&mut row);
            session.put(model, row)?;
        }
        session.commit()?;
        tracing::debug!(table = %model.name, rows = self.row_count(&model.name)?, "Seeded table");
        Ok(())
    }

    /// Committed row count of a table
    pub fn row_count(&self, table: &str) -> StoreResult<usize> {
        let tables = self.tables.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(tables.get(table).map(Vec::len).unwrap_or(0))
    }
}

impl SessionFactory for MemoryStore {
    type Session = MemorySession;

    fn session(&self) -> MemorySession {
        MemoryStore::session(self)
    }
}

/// A staged write
#[derive(Debug, Clone)]
enum Change {
    Put { table: String, key_field: String, row: Row },
    Delete { table: String, key_field: String, key: Value },
}

impl Change {
    fn table(&self) -> &str {
        match self {
            Change::Put { table, .. } | Change::Delete { table, .. } => table.as_str(),
        }
    }

    fn apply(&self, rows: &mut Vec<Row>) {
        match self {
            Change::Put { key_field, row, .. } => {
                let key = row.get(key_field).unwrap_or(&Value::Null);
                match rows.iter().position(|r| has_key(r, key_field, key)) {
                    Some(pos) => rows[pos] = row.clone(),
                    None => rows.push(row.clone()),
                }
            }
            Change::Delete { key_field, key, .. } => {
                rows.retain(|r| !has_key(r, key_field, key));
            }
        }
    }
}

fn has_key(row: &Row, key_field: &str, key: &Value) -> bool {
    row.get(key_field)
        .map(|v| !v.is_null() && values_equal(v, key))
        .unwrap_or(false)
}

/// One unit of work over a [`MemoryStore`]
#[derive(Debug)]
pub struct MemorySession {
    tables: Arc<RwLock<Tables>>,
    staged: Vec<Change>,
}

impl MemorySession {
    /// Committed rows of `table` with this session's changes applied
    fn view(&self, table: &str) -> StoreResult<Vec<Row>> {
        let mut rows = {
            let tables = self.tables.read().map_err(|_| StoreError::LockPoisoned)?;
            tables.get(table).cloned().unwrap_or_default()
        };
        for change in self.staged.iter().filter(|c| c.table() == table) {
            change.apply(&mut rows);
        }
        Ok(rows)
    }

    fn matching(&self, table: &str, predicate: &Predicate) -> StoreResult<Vec<Row>> {
        let mut rows = self.view(table)?;
        rows.retain(|row| predicate.matches(row));
        Ok(rows)
    }

    /// Generate a key for a row that lacks one
    fn assign_key(&self, model: &ModelDescriptor) -> StoreResult<Value> {
        let key_field = model.primary_key_name();
        let types = model
            .primary_key()
            .map(|f| f.value_types())
            .unwrap_or_default();

        if types.contains(&ValueType::Int) {
            let max = self
                .view(&model.name)?
                .iter()
                .filter_map(|r| r.get(key_field).and_then(Value::as_i64))
                .max()
                .unwrap_or(0);
            Ok(Value::from(max + 1))
        } else if types.contains(&ValueType::Uuid) {
            Ok(Value::String(Uuid::new_v4().to_string()))
        } else {
            Err(StoreError::MissingPrimaryKey {
                table: model.name.clone(),
            })
        }
    }
}

impl Session for MemorySession {
    fn fetch(&self, query: &SelectQuery) -> StoreResult<Vec<Row>> {
        let mut rows = self.matching(&query.table, &query.predicate)?;

        if !query.order.is_empty() {
            rows.sort_by(|a, b| compare_rows(a, b, &query.order));
        }

        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        let page = rows.into_iter().skip(offset).take(limit);

        Ok(match &query.selection {
            Selection::Model => page.collect(),
            Selection::Columns(columns) => page.map(|row| project(row, columns)).collect(),
        })
    }

    fn count(&self, query: &CountQuery) -> StoreResult<u64> {
        Ok(self.matching(&query.table, &query.predicate)?.len() as u64)
    }

    fn get(&self, model: &ModelDescriptor, id: &Value) -> StoreResult<Option<Row>> {
        let key_field = model.primary_key_name();
        Ok(self
            .view(&model.name)?
            .into_iter()
            .find(|row| has_key(row, key_field, id)))
    }

    fn put(&mut self, model: &ModelDescriptor, mut row: Row) -> StoreResult<Row> {
        let key_field = model.primary_key_name().to_string();
        if row.get(&key_field).map(Value::is_null).unwrap_or(true) {
            let key = self.assign_key(model)?;
            row.insert(key_field.clone(), key);
        }

        self.staged.push(Change::Put {
            table: model.name.clone(),
            key_field,
            row: row.clone(),
        });
        Ok(row)
    }

    fn delete(&mut self, model: &ModelDescriptor, id: &Value) -> StoreResult<()> {
        self.staged.push(Change::Delete {
            table: model.name.clone(),
            key_field: model.primary_key_name().to_string(),
            key: id.clone(),
        });
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        if self.staged.is_empty() {
            return Ok(());
        }
        let mut tables = self.tables.write().map_err(|_| StoreError::LockPoisoned)?;
        for change in self.staged.drain(..) {
            change.apply(tables.entry(change.table().to_string()).or_default());
        }
        Ok(())
    }

    fn rollback(&mut self) {
        self.staged.clear();
    }
}

fn project(row: Row, columns: &[String]) -> Row {
    columns
        .iter()
        .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
        .collect()
}

/// Compare two rows term by term
fn compare_rows(a: &Row, b: &Row, order: &[OrderTerm]) -> Ordering {
    for term in order {
        let ordering = compare_for_sort(a.get(&term.field), b.get(&term.field));
        let ordering = match term.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Total order over JSON values: null < bool < number < string.
///
/// A missing column sorts as null.
fn compare_for_sort(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);

    let type_order = |v: &Value| -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    };

    match type_order(a).cmp(&type_order(b)) {
        Ordering::Equal => {}
        other => return other,
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeclaredType, FieldDescriptor};
    use serde_json::json;

    fn users() -> ModelDescriptor {
        ModelDescriptor::new(
            "users",
            vec![
                FieldDescriptor::new("id", [DeclaredType::Int]).primary(),
                FieldDescriptor::new("name", [DeclaredType::Str]),
                FieldDescriptor::new("age", [DeclaredType::Int]).nullable(),
            ],
        )
    }

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .seed(
                &users(),
                vec![
                    row(json!({"name": "carol", "age": 30})),
                    row(json!({"name": "alice", "age": null})),
                    row(json!({"name": "bob", "age": 25})),
                ],
            )
            .unwrap();
        store
    }

    fn names(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|r| r["name"].as_str().unwrap()).collect()
    }

    #[test]
    fn test_seed_assigns_sequential_keys() {
        let store = seeded();
        let session = store.session();
        let rows = session.fetch(&SelectQuery::new("users")).unwrap();

        let ids: Vec<_> = rows.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);
        assert_eq!(names(&rows), vec!["carol", "alice", "bob"]);
    }

    #[test]
    fn test_seed_fills_defaults() {
        let model = ModelDescriptor::new(
            "flags",
            vec![
                FieldDescriptor::new("id", [DeclaredType::Int]).primary(),
                FieldDescriptor::new("on", [DeclaredType::Bool]).with_default(json!(false)),
            ],
        );
        let store = MemoryStore::new();
        store
            .seed(&model, vec![row(json!({})), row(json!({"on": true}))])
            .unwrap();

        let rows = store.session().fetch(&SelectQuery::new("flags")).unwrap();
        assert_eq!(rows[0]["on"], false);
        assert_eq!(rows[1]["on"], true);
    }

    #[test]
    fn test_order_nulls_first_and_stable() {
        let store = seeded();
        let session = store.session();

        let rows = session
            .fetch(&SelectQuery::new("users").order_by([OrderTerm::asc("age")]))
            .unwrap();
        assert_eq!(names(&rows), vec!["alice", "bob", "carol"]);

        let rows = session
            .fetch(&SelectQuery::new("users").order_by([OrderTerm::desc("name")]))
            .unwrap();
        assert_eq!(names(&rows), vec!["carol", "bob", "alice"]);
    }

    #[test]
    fn test_window_and_projection() {
        let store = seeded();
        let session = store.session();
        let query = SelectQuery::new("users")
            .columns(vec!["name".to_string()])
            .order_by([OrderTerm::asc("name")])
            .paginate(1, 1);

        let rows = session.fetch(&query).unwrap();
        assert_eq!(rows, vec![row(json!({"name": "bob"}))]);
        assert_eq!(session.count(&query.count_query()).unwrap(), 3);
    }

    #[test]
    fn test_staged_writes_are_private_until_commit() {
        let store = seeded();
        let model = users();

        let mut writer = store.session();
        writer.put(&model, row(json!({"id": 2, "name": "alicia", "age": 41}))).unwrap();
        writer.delete(&model, &json!(1)).unwrap();

        let reader = store.session();
        assert_eq!(reader.get(&model, &json!(2)).unwrap().unwrap()["name"], "alice");
        assert_eq!(writer.get(&model, &json!(2)).unwrap().unwrap()["name"], "alicia");
        assert!(writer.get(&model, &json!(1)).unwrap().is_none());

        writer.commit().unwrap();
        assert_eq!(reader.get(&model, &json!(2)).unwrap().unwrap()["name"], "alicia");
        assert_eq!(store.row_count("users").unwrap(), 2);
    }

    #[test]
    fn test_rollback_discards() {
        let store = seeded();
        let model = users();

        let mut session = store.session();
        session.put(&model, row(json!({"name": "dave"}))).unwrap();
        session.rollback();
        session.commit().unwrap();
        assert_eq!(store.row_count("users").unwrap(), 3);
    }

    #[test]
    fn test_delete_absent_is_noop() {
        let store = seeded();
        let mut session = store.session();
        session.delete(&users(), &json!(99)).unwrap();
        session.commit().unwrap();
        assert_eq!(store.row_count("users").unwrap(), 3);
    }

    #[test]
    fn test_uuid_keys_and_unassignable_keys() {
        let tokens = ModelDescriptor::new(
            "tokens",
            vec![FieldDescriptor::new("id", [DeclaredType::Uuid]).primary()],
        );
        let mut session = MemoryStore::new().session();
        let stored = session.put(&tokens, Row::new()).unwrap();
        assert!(Uuid::parse_str(stored["id"].as_str().unwrap()).is_ok());

        let tags = ModelDescriptor::new(
            "tags",
            vec![FieldDescriptor::new("slug", [DeclaredType::Str]).primary()],
        );
        assert!(matches!(
            session.put(&tags, Row::new()),
            Err(StoreError::MissingPrimaryKey { .. })
        ));
    }

    #[test]
    fn test_compare_for_sort_type_order() {
        let null = json!(null);
        let t = json!(true);
        let n = json!(1);
        let s = json!("a");
        assert_eq!(compare_for_sort(Some(&null), Some(&t)), Ordering::Less);
        assert_eq!(compare_for_sort(Some(&t), Some(&n)), Ordering::Less);
        assert_eq!(compare_for_sort(Some(&n), Some(&s)), Ordering::Less);
        assert_eq!(compare_for_sort(None, Some(&null)), Ordering::Equal);
    }
}

//! Search and Pagination Tests
//!
//! End-to-end search through the facade over the in-memory store:
//! - Empty filters return every row
//! - Pagination windows rows and counts the total through the twin query
//! - Ordering, projection and custom multi-field search
//! - Update/upsert/delete semantics

use std::sync::Arc;

use restquery::db::{DbError, DbInterface, SearchRegistry};
use restquery::filters::{CustomField, FilterParams, FilterSchema};
use restquery::model::{DeclaredType, FieldDescriptor, ModelDescriptor, ValueType};
use restquery::query::{Predicate, Row};
use restquery::rest_api::PaginatedResponse;
use restquery::store::{MemorySession, MemoryStore};
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn people() -> ModelDescriptor {
    ModelDescriptor::new(
        "people",
        vec![
            FieldDescriptor::new("id", [DeclaredType::Int]).primary(),
            FieldDescriptor::new("name", [DeclaredType::Str]),
            FieldDescriptor::new("city", [DeclaredType::Str]).nullable(),
            FieldDescriptor::new("age", [DeclaredType::Int]),
            FieldDescriptor::new("active", [DeclaredType::Bool]).with_default(json!(false)),
        ],
    )
}

fn row(value: Value) -> Row {
    value.as_object().cloned().unwrap()
}

fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .seed(
            &people(),
            vec![
                row(json!({"name": "Foo Fighter", "city": "Barcelona", "age": 31, "active": true})),
                row(json!({"name": "Ada", "city": "London", "age": 36, "active": true})),
                row(json!({"name": "Barbara Foo", "city": null, "age": 42, "active": false})),
                row(json!({"name": "Grace", "city": "Arlington", "age": 85, "active": false})),
                row(json!({"name": "Linus", "city": "Helsinki", "age": 21, "active": true})),
            ],
        )
        .unwrap();
    store
}

fn schema() -> Arc<FilterSchema> {
    Arc::new(
        FilterSchema::builder(people())
            .fields(["name", "city", "age", "active"])
            .custom(CustomField::multi_like("q", ["name", "city"], true))
            .custom(CustomField::levenshtein("near", "name", 1))
            .build(),
    )
}

fn search(store: &MemoryStore, query: &str) -> (FilterParams, Vec<Row>, u64) {
    let params = FilterParams::from_query(&schema(), query).unwrap();
    let db = DbInterface::new(store.session());
    let result = db.search(&params).unwrap();
    (params, result.rows, result.total)
}

fn names(rows: &[Row]) -> Vec<&str> {
    rows.iter().map(|r| r["name"].as_str().unwrap()).collect()
}

// =============================================================================
// Filtering Tests
// =============================================================================

#[test]
fn test_empty_filters_return_all_rows() {
    let store = seeded_store();
    let (_, rows, total) = search(&store, "");
    assert_eq!(rows.len(), 5);
    assert_eq!(total, 5);
}

#[test]
fn test_filters_are_anded() {
    let store = seeded_store();
    let (_, rows, total) = search(&store, "active=true&age[ge]=30");
    assert_eq!(names(&rows), vec!["Foo Fighter", "Ada"]);
    assert_eq!(total, 2);
}

#[test]
fn test_membership_filters() {
    let store = seeded_store();
    let (_, rows, _) = search(&store, "age[]=21&age[]=85&orderBy=age");
    assert_eq!(names(&rows), vec!["Linus", "Grace"]);

    let (_, rows, _) = search(&store, "age[ne][]=21&age[ne][]=85");
    assert_eq!(rows.len(), 3);
}

#[test]
fn test_null_equality() {
    let store = seeded_store();
    let (_, rows, _) = search(&store, "city=null");
    assert_eq!(names(&rows), vec!["Barbara Foo"]);

    let (_, rows, _) = search(&store, "city[ne]=null");
    assert_eq!(rows.len(), 4);
}

#[test]
fn test_pattern_input_is_literal() {
    let store = seeded_store();
    let (_, rows, _) = search(&store, "name[like]=%25");
    assert!(rows.is_empty());

    let (_, rows, _) = search(&store, "name[ilike]=ADA");
    assert_eq!(names(&rows), vec!["Ada"]);
}

#[test]
fn test_multi_like_tokens() {
    let store = seeded_store();
    let (_, rows, _) = search(&store, "q=foo%20bar");
    assert_eq!(names(&rows), vec!["Foo Fighter", "Barbara Foo"]);

    let (_, rows, _) = search(&store, "q=lon");
    assert_eq!(names(&rows), vec!["Ada"]);
}

#[test]
fn test_levenshtein_distance() {
    let store = seeded_store();
    let (_, rows, _) = search(&store, "near=Grave");
    assert_eq!(names(&rows), vec!["Grace"]);

    let (_, rows, _) = search(&store, "near=Grovel");
    assert!(rows.is_empty());
}

// =============================================================================
// Pagination, Ordering and Projection Tests
// =============================================================================

#[test]
fn test_second_page_of_two() {
    let store = seeded_store();
    let (params, rows, total) = search(&store, "perPage=2&page=1");
    assert_eq!(rows.len(), 2);
    assert_eq!(total, 5);

    let response = PaginatedResponse::build(rows, &params, total);
    assert_eq!(response.meta.pages, Some(3));
    assert_eq!(response.meta.page_total, 2);
    assert_eq!(response.meta.per_page, Some(2));
}

#[test]
fn test_last_partial_page() {
    let store = seeded_store();
    let (_, rows, total) = search(&store, "perPage=2&page=2&orderBy=age");
    assert_eq!(names(&rows), vec!["Grace"]);
    assert_eq!(total, 5);
}

#[test]
fn test_without_per_page_total_is_row_count() {
    let store = seeded_store();
    let (params, rows, total) = search(&store, "page=3");
    assert_eq!(rows.len(), 5);
    assert_eq!(total, 5);

    let response = PaginatedResponse::build(rows, &params, total);
    assert_eq!(response.meta.pages, None);
}

#[test]
fn test_order_by_name_desc() {
    let store = seeded_store();
    let (_, rows, _) = search(&store, "orderBy=name.desc");
    assert_eq!(
        names(&rows),
        vec!["Linus", "Grace", "Foo Fighter", "Barbara Foo", "Ada"]
    );
}

#[test]
fn test_multiple_order_terms() {
    let store = seeded_store();
    let (_, rows, _) = search(&store, "orderBy=active.desc&orderBy=age");
    assert_eq!(
        names(&rows),
        vec!["Linus", "Foo Fighter", "Ada", "Barbara Foo", "Grace"]
    );
}

#[test]
fn test_unordered_search_does_not_crash() {
    let store = seeded_store();
    let (_, rows, _) = search(&store, "active=false");
    assert_eq!(rows.len(), 2);
}

#[test]
fn test_projection_returns_only_named_columns() {
    let store = seeded_store();
    let (_, rows, _) = search(&store, "project=name&age[lt]=30");
    assert_eq!(rows, vec![row(json!({"name": "Linus"}))]);
}

// =============================================================================
// Custom Search Dispatch Tests
// =============================================================================

fn tagged_schema() -> Arc<FilterSchema> {
    Arc::new(
        FilterSchema::builder(people())
            .field("name")
            .custom(CustomField::plain("min_age", ValueType::Int))
            .search_method("search_people")
            .build(),
    )
}

#[test]
fn test_custom_filter_without_handler_is_not_implemented() {
    let store = seeded_store();
    let params = FilterParams::from_query(&tagged_schema(), "min_age=40").unwrap();
    let db = DbInterface::new(store.session());

    assert!(matches!(
        db.search(&params),
        Err(DbError::NotImplemented { method, .. }) if method == "search_people"
    ));
}

#[test]
fn test_registered_handler_serves_custom_filter() {
    let store = seeded_store();
    let mut registry = SearchRegistry::new();
    registry.register(
        "search_people",
        |db: &DbInterface<MemorySession>, params: &FilterParams| {
            let extra = match params.get("min_age") {
                Some(age) => Predicate::compare("age", restquery::query::Comparator::Ge, age.clone()),
                None => Predicate::True,
            };
            db.search_with(params, extra)
        },
    );
    let registry = Arc::new(registry);

    let params = FilterParams::from_query(&tagged_schema(), "min_age=40&orderBy=age").unwrap();
    let db = DbInterface::with_searches(store.session(), registry);
    let result = db.search(&params).unwrap();
    assert_eq!(names(&result.rows), vec!["Barbara Foo", "Grace"]);
}

// =============================================================================
// CRUD Tests
// =============================================================================

#[test]
fn test_update_missing_fails_and_upsert_creates() {
    let store = seeded_store();
    let model = people();
    let mut db = DbInterface::new(store.session());
    let data = row(json!({"name": "Margaret", "age": 33}));

    assert!(matches!(
        db.update(&model, &json!(42), &data),
        Err(DbError::NotFound { .. })
    ));

    let created = db
        .transaction(|db| db.upsert(&model, &json!(42), &data))
        .unwrap();
    assert_eq!(created["id"], 42);
    assert_eq!(created["active"], false);
    assert_eq!(created["city"], Value::Null);
    assert_eq!(store.row_count("people").unwrap(), 6);
}

#[test]
fn test_update_existing_row() {
    let store = seeded_store();
    let model = people();
    let mut db = DbInterface::new(store.session());

    let updated = db
        .transaction(|db| db.update(&model, &json!(2), &row(json!({"city": "Paris", "id": 99}))))
        .unwrap();
    assert_eq!(updated["id"], 2);
    assert_eq!(updated["city"], "Paris");

    let fresh = DbInterface::new(store.session());
    assert_eq!(fresh.get(&model, &json!(2)).unwrap()["city"], "Paris");
    assert!(fresh.get(&model, &json!(99)).is_err());
}

#[test]
fn test_delete_row_and_absent_id() {
    let store = seeded_store();
    let model = people();
    let mut db = DbInterface::new(store.session());

    db.transaction(|db| {
        db.delete(&model, &json!(1))?;
        db.delete(&model, &json!(1000))
    })
    .unwrap();
    assert_eq!(store.row_count("people").unwrap(), 4);
}

// =============================================================================
// Stored Value Normalization Tests
// =============================================================================

const EVENT_ID: &str = "550e8400-e29b-41d4-a716-446655440000";

fn events() -> ModelDescriptor {
    ModelDescriptor::new(
        "events",
        vec![
            FieldDescriptor::new("id", [DeclaredType::Uuid]).primary(),
            FieldDescriptor::new("at", [DeclaredType::Datetime]),
        ],
    )
}

fn event_store(at: &str) -> MemoryStore {
    let store = MemoryStore::new();
    store
        .seed(&events(), vec![row(json!({"id": EVENT_ID.to_uppercase(), "at": at}))])
        .unwrap();
    store
}

fn event_count(store: &MemoryStore, query: &str) -> u64 {
    let schema = Arc::new(FilterSchema::builder(events()).field("at").build());
    let params = FilterParams::from_query(&schema, query).unwrap();
    DbInterface::new(store.session()).search(&params).unwrap().total
}

#[test]
fn test_offset_update_matches_same_instant() {
    let store = event_store("2024-01-01T10:00:00Z");
    let mut db = DbInterface::new(store.session());
    db.transaction(|db| {
        db.update(&events(), &json!(EVENT_ID), &row(json!({"at": "2024-01-01T12:00:00+02:00"})))
    })
    .unwrap();

    assert_eq!(event_count(&store, "at=2024-01-01T10:00:00Z"), 1);
    assert_eq!(event_count(&store, "at[gt]=2024-01-01T10:00:00Z"), 0);
    assert_eq!(event_count(&store, "at[lt]=2024-01-01T10:00:00.000001Z"), 1);
}

#[test]
fn test_fractional_seconds_order_after_whole_second() {
    let store = event_store("2024-01-01T10:00:00.500Z");
    assert_eq!(event_count(&store, "at[gt]=2024-01-01T10:00:00Z"), 1);
    assert_eq!(event_count(&store, "at=2024-01-01T10:00:00.5Z"), 1);
}

#[test]
fn test_uppercase_uuid_key_is_stored_canonically() {
    let store = event_store("2024-01-01T10:00:00Z");
    let model = events();
    let mut db = DbInterface::new(store.session());

    assert_eq!(db.get(&model, &json!(EVENT_ID)).unwrap()["id"], EVENT_ID);
    assert!(db.get(&model, &json!(EVENT_ID.to_uppercase())).is_ok());

    db.transaction(|db| db.delete(&model, &json!(EVENT_ID.to_uppercase())))
        .unwrap();
    assert_eq!(store.row_count("events").unwrap(), 0);
}

//! # REST API HTTP Server
//!
//! Axum-based HTTP server exposing list, export and CRUD endpoints for
//! every registered resource. Each request runs in its own session inside
//! one transaction.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, RawQuery, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::db::{DbInterface, DbResult, SearchRegistry, SearchResult};
use crate::filters::{FilterParams, FilterSchema, ValidationErrors};
use crate::model::{coerce_any, describe_types, ValueType};
use crate::query::Row;
use crate::store::SessionFactory;

use super::errors::{RestError, RestResult};
use super::response::{DownloadResponse, PaginatedResponse, ResourceResponse};

/// REST API server state
pub struct RestServer<F: SessionFactory> {
    factory: F,
    searches: Arc<SearchRegistry<F::Session>>,
    resources: HashMap<String, Arc<FilterSchema>>,
    cors_origins: Vec<String>,
}

impl<F: SessionFactory> RestServer<F> {
    pub fn new(factory: F) -> Self {
        Self::with_searches(factory, SearchRegistry::new())
    }

    pub fn with_searches(factory: F, searches: SearchRegistry<F::Session>) -> Self {
        Self {
            factory,
            searches: Arc::new(searches),
            resources: HashMap::new(),
            cors_origins: Vec::new(),
        }
    }

    /// Allowed CORS origins; empty allows any origin
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Expose a schema's model under its name.
    ///
    /// Fails when the schema has custom filters and its search method is
    /// not registered.
    pub fn register(&mut self, schema: FilterSchema) -> DbResult<()> {
        self.searches.validate(&schema)?;
        let name = schema.model().name.clone();
        tracing::info!(resource = %name, params = schema.params().len(), "Registered resource");
        self.resources.insert(name, Arc::new(schema));
        Ok(())
    }

    /// Registered resource names, sorted
    pub fn resources(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.resources.keys().map(String::as_str).collect();
        names.sort();
        names
    }

    /// Build the Axum router
    pub fn router(self) -> Router {
        let cors = if self.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = self
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        let state = Arc::new(self);

        Router::new()
            .route("/health", get(health_handler))
            .route("/:resource", get(list_handler::<F>))
            .route("/:resource/export", get(export_handler::<F>))
            .route(
                "/:resource/:id",
                get(get_handler::<F>)
                    .patch(update_handler::<F>)
                    .put(upsert_handler::<F>)
                    .delete(delete_handler::<F>),
            )
            .with_state(state)
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    fn schema(&self, resource: &str) -> RestResult<&Arc<FilterSchema>> {
        self.resources
            .get(resource)
            .ok_or_else(|| RestError::UnknownResource(resource.to_string()))
    }

    fn db(&self) -> DbInterface<F::Session> {
        DbInterface::with_searches(self.factory.session(), Arc::clone(&self.searches))
    }

    fn search(&self, resource: &str, query: &str) -> RestResult<(FilterParams, SearchResult)> {
        let schema = self.schema(resource)?;
        let params = FilterParams::from_query(schema, query)?;
        let result = self.db().transaction(|db| db.search(&params))?;
        Ok((params, result))
    }

    fn get(&self, resource: &str, raw_id: &str) -> RestResult<Row> {
        let schema = self.schema(resource)?;
        let id = parse_id(schema, raw_id)?;
        Ok(self.db().transaction(|db| db.get(schema.model(), &id))?)
    }

    fn update(&self, resource: &str, raw_id: &str, body: Value, create: bool) -> RestResult<Row> {
        let schema = self.schema(resource)?;
        let id = parse_id(schema, raw_id)?;
        let Value::Object(data) = body else {
            return Err(RestError::InvalidBody("expected a JSON object".to_string()));
        };

        let model = schema.model();
        Ok(self.db().transaction(|db| {
            if create {
                db.upsert(model, &id, &data)
            } else {
                db.update(model, &id, &data)
            }
        })?)
    }

    fn delete(&self, resource: &str, raw_id: &str) -> RestResult<()> {
        let schema = self.schema(resource)?;
        let id = parse_id(schema, raw_id)?;
        Ok(self.db().transaction(|db| db.delete(schema.model(), &id))?)
    }
}

/// Shared state type
type ServerState<F> = Arc<RestServer<F>>;

/// Coerce a path id to the primary key's type
fn parse_id(schema: &FilterSchema, raw: &str) -> RestResult<Value> {
    let types = schema
        .model()
        .primary_key()
        .map(|f| f.value_types())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| [ValueType::Str].into());

    coerce_any(&types, raw).ok_or_else(|| {
        RestError::Validation(ValidationErrors::single(
            "id",
            format!("expected {}", describe_types(&types)),
        ))
    })
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> RestResult<Value> {
    body.map(|Json(value)| value)
        .map_err(|rejection| RestError::InvalidBody(rejection.body_text()))
}

async fn health_handler() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// Filtered, paginated list handler
async fn list_handler<F: SessionFactory>(
    State(server): State<ServerState<F>>,
    Path(resource): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Json<PaginatedResponse<Row>>, RestError> {
    let (params, result) = server.search(&resource, query.as_deref().unwrap_or_default())?;
    Ok(Json(PaginatedResponse::build(result.rows, &params, result.total)))
}

/// Filtered rows as a JSON download
async fn export_handler<F: SessionFactory>(
    State(server): State<ServerState<F>>,
    Path(resource): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<DownloadResponse, RestError> {
    let (_, result) = server.search(&resource, query.as_deref().unwrap_or_default())?;
    let body = serde_json::to_vec_pretty(&result.rows).map_err(|e| RestError::Internal(e.to_string()))?;
    Ok(DownloadResponse::new(body, format!("{}.json", resource)))
}

/// Get single record handler
async fn get_handler<F: SessionFactory>(
    State(server): State<ServerState<F>>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<Json<ResourceResponse<Row>>, RestError> {
    let row = server.get(&resource, &id)?;
    Ok(Json(ResourceResponse::new(row)))
}

/// Update record handler
async fn update_handler<F: SessionFactory>(
    State(server): State<ServerState<F>>,
    Path((resource, id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ResourceResponse<Row>>, RestError> {
    let row = server.update(&resource, &id, json_body(body)?, false)?;
    Ok(Json(ResourceResponse::new(row)))
}

/// Upsert record handler
async fn upsert_handler<F: SessionFactory>(
    State(server): State<ServerState<F>>,
    Path((resource, id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ResourceResponse<Row>>, RestError> {
    let row = server.update(&resource, &id, json_body(body)?, true)?;
    Ok(Json(ResourceResponse::new(row)))
}

/// Delete record handler
async fn delete_handler<F: SessionFactory>(
    State(server): State<ServerState<F>>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<StatusCode, RestError> {
    server.delete(&resource, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

//! HTTP transport - exposes mounted models as JSON:API endpoints.
//!
//! Requires the `http` feature. Uses axum for routing.
//!
//! ## Routes
//!
//! For every mounted resource type `T`:
//!
//! - `GET /T`: list, optionally scoped with `?parent=<id>`.
//! - `GET /T/:id`: fetch one.
//! - `POST /T`: create; `201` with the stored document, or `204` when the
//!   client supplied the id.
//! - `PATCH /T/:id`: update; `204`.
//! - `DELETE /T/:id`: delete; `204`, also when the record is already gone.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use jsonapi_driver::{http, MemoryDriver};
//!
//! let state = http::ApiState::new(Arc::new(MemoryDriver::new()))
//!     .mount::<Person>()
//!     .mount::<Article>();
//!
//! // Get the router to compose with other axum routes
//! let app = http::router(state.clone());
//!
//! // Or serve directly
//! http::serve(state, "0.0.0.0:3000").await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::convert::ToResource;
use crate::document::DocItem;
use crate::driver::Driver;
use crate::error::DriverError;
use crate::model::{Model, ModelSchema, Schema};

/// Media type of every response body.
pub const CONTENT_TYPE: &str = "application/vnd.api+json";

/// A driver plus the resource types it serves.
#[derive(Clone)]
pub struct ApiState {
    driver: Arc<dyn Driver>,
    resources: HashMap<String, Arc<dyn Schema>>,
}

impl ApiState {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self {
            driver,
            resources: HashMap::new(),
        }
    }

    /// Serve `M` under `/<M::TYPE>`.
    pub fn mount<M: Model + ToResource>(self) -> Self {
        self.mount_schema(Arc::new(ModelSchema::<M>::new()))
    }

    pub fn mount_schema(mut self, schema: Arc<dyn Schema>) -> Self {
        self.resources
            .insert(schema.resource_type().to_string(), schema);
        self
    }

    /// Mounted resource types, sorted.
    pub fn resource_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.resources.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    fn schema(&self, resource_type: &str) -> Result<&dyn Schema, Response> {
        self.resources
            .get(resource_type)
            .map(|schema| &**schema)
            .ok_or_else(|| {
                let err = format!("unknown resource type '{}'", resource_type);
                document(StatusCode::NOT_FOUND, &DocItem::not_found(err))
            })
    }
}

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    parent: Option<String>,
}

/// Build an axum `Router` serving every mounted resource type.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/:resource", get(list_handler).post(create_handler))
        .route(
            "/:resource/:id",
            get(show_handler)
                .patch(update_handler)
                .delete(delete_handler),
        )
        .with_state(Arc::new(state))
}

/// Serve the API over HTTP at the given address (e.g. `"0.0.0.0:3000"`).
pub async fn serve(state: ApiState, addr: &str) -> Result<(), std::io::Error> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr, "serving JSON:API endpoints");
    axum::serve(listener, app).await
}

/// `GET /:resource`
async fn list_handler(
    State(state): State<Arc<ApiState>>,
    Path(resource): Path<String>,
    Query(params): Query<ListParams>,
    uri: Uri,
) -> Response {
    let schema = match state.schema(&resource) {
        Ok(schema) => schema,
        Err(response) => return response,
    };
    let query = uri.query().unwrap_or_default();
    match state
        .driver
        .find_all(schema, params.parent.as_deref(), query)
    {
        Ok(doc) => document(StatusCode::OK, &doc),
        Err(e) => error_response(e),
    }
}

/// `GET /:resource/:id`
async fn show_handler(
    State(state): State<Arc<ApiState>>,
    Path((resource, id)): Path<(String, String)>,
    uri: Uri,
) -> Response {
    let schema = match state.schema(&resource) {
        Ok(schema) => schema,
        Err(response) => return response,
    };
    let query = uri.query().unwrap_or_default();
    match state.driver.find_record(schema, &id, query) {
        Ok(doc) => document(StatusCode::OK, &doc),
        Err(e) => error_response(e),
    }
}

/// `POST /:resource`
async fn create_handler(
    State(state): State<Arc<ApiState>>,
    Path(resource): Path<String>,
    body: Bytes,
) -> Response {
    let schema = match state.schema(&resource) {
        Ok(schema) => schema,
        Err(response) => return response,
    };
    let doc = match parse_body(&body) {
        Ok(doc) => doc,
        Err(response) => return response,
    };
    match state.driver.create(schema, &doc) {
        Ok(Some(created)) => document(StatusCode::CREATED, &created),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

/// `PATCH /:resource/:id`
async fn update_handler(
    State(state): State<Arc<ApiState>>,
    Path((resource, id)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    let schema = match state.schema(&resource) {
        Ok(schema) => schema,
        Err(response) => return response,
    };
    let doc = match parse_body(&body) {
        Ok(doc) => doc,
        Err(response) => return response,
    };
    match state.driver.update(schema, &id, &doc) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

/// `DELETE /:resource/:id`
async fn delete_handler(
    State(state): State<Arc<ApiState>>,
    Path((resource, id)): Path<(String, String)>,
) -> Response {
    let schema = match state.schema(&resource) {
        Ok(schema) => schema,
        Err(response) => return response,
    };
    match state.driver.delete(schema, &id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) if e.is_not_found() => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

fn parse_body(body: &[u8]) -> Result<DocItem, Response> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "rejecting malformed request body");
        document(
            StatusCode::UNPROCESSABLE_ENTITY,
            &DocItem::unprocessable("/data", e),
        )
    })
}

fn error_response(e: DriverError) -> Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::warn!(error = %e, "driver operation failed");
    }
    let doc = match &e {
        DriverError::Validation(_) => DocItem::unprocessable("/data", &e),
        _ => DocItem::from_errors(status.as_u16(), [&e]),
    };
    document(status, &doc)
}

fn document<T: Serialize>(status: StatusCode, doc: &T) -> Response {
    match serde_json::to_string(doc) {
        Ok(body) => (status, [(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

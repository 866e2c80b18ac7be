//! Management API Server
//!
//! REST surface over the resource service: CRUD per (protocol, type), the
//! provider document polled by the proxy, schema documents and the
//! entrypoint pass-through.

use crate::application::{ListOptions, ResourceService};
use crate::domain::error::{ResourceError, UpstreamError};
use crate::domain::value_objects::ResourceKind;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Header carrying the admin key.
pub const API_KEY_HEADER: &str = "x-traefikr-key";

/// Create request body. A caller-supplied provider is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRequest {
    pub name: String,
    pub config: Value,
}

/// Update request body.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRequest {
    pub config: Value,
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// List query flags. Only the literal `true` switches a flag on.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub traefik: Option<String>,
    pub all: Option<String>,
}

impl From<ListQuery> for ListOptions {
    fn from(q: ListQuery) -> Self {
        Self {
            include_mirror: q.traefik.as_deref() == Some("true"),
            include_disabled: q.all.as_deref() == Some("true"),
        }
    }
}

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub resources: Option<u64>,
}

/// Error body: `{"error": msg, "details"?: [..]}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

/// An error on its way to the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.into(),
                details: None,
            },
        }
    }

    fn with_details(mut self, details: Vec<String>) -> Self {
        self.body.details = Some(details);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ResourceError> for ApiError {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::InvalidProtocol(_) => Self::new(StatusCode::BAD_REQUEST, "invalid protocol"),
            ResourceError::InvalidType { .. } => {
                Self::new(StatusCode::BAD_REQUEST, "invalid type for protocol")
            }
            ResourceError::Validation(details) => {
                Self::new(StatusCode::BAD_REQUEST, "validation failed").with_details(details)
            }
            ResourceError::SchemaNotFound(_) | ResourceError::NotFound => {
                Self::new(StatusCode::NOT_FOUND, err.to_string())
            }
            ResourceError::Conflict => Self::new(StatusCode::CONFLICT, "resource already exists"),
            ResourceError::Store(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal store error")
            }
            ResourceError::Upstream(UpstreamError::NotFound(what)) => {
                Self::new(StatusCode::NOT_FOUND, format!("{} not found", what))
            }
            ResourceError::Upstream(e) => {
                Self::new(StatusCode::BAD_GATEWAY, "failed to fetch from Traefik")
                    .with_details(vec![e.to_string()])
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// API Server state.
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<ResourceService>,
    /// When set, protected routes require it in `x-traefikr-key`.
    pub api_key: Option<Arc<str>>,
}

impl ApiState {
    pub fn new(service: Arc<ResourceService>, api_key: Option<String>) -> Self {
        Self {
            service,
            api_key: api_key.filter(|k| !k.is_empty()).map(Arc::from),
        }
    }
}

/// Build the full router: public health and schema routes, key-guarded
/// resource routes, CORS and request tracing.
pub fn build_router(state: ApiState) -> Router {
    let public = Router::new()
        .route("/health", get(health_handler))
        .route("/api/entrypoints/schema.json", get(entrypoint_schema_handler))
        .route("/api/:protocol/:type/schema.json", get(schema_handler));

    let protected = Router::new()
        .route("/api/config", get(config_handler))
        .route("/api/entrypoints", get(list_entrypoints_handler))
        .route("/api/entrypoints/:name", get(get_entrypoint_handler))
        .route("/api/:protocol/:type", get(list_handler).post(create_handler))
        .route(
            "/api/:protocol/:type/:name",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .merge(public)
        .merge(protected)
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Management API server.
pub struct ApiServer {
    listen_addr: String,
    state: ApiState,
}

impl ApiServer {
    pub fn new(listen_addr: String, service: Arc<ResourceService>, api_key: Option<String>) -> Self {
        Self {
            listen_addr,
            state: ApiState::new(service, api_key),
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Run the API server.
    ///
    /// The final Ok(()) is excluded from coverage since axum::serve runs forever.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub async fn run(&self) -> anyhow::Result<()> {
        let app = self.router();

        let listener = TcpListener::bind(&self.listen_addr).await?;
        tracing::info!("management API listening on {}", self.listen_addr);
        if self.state.api_key.is_none() {
            tracing::warn!("no API key configured, management API is open");
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        tracing::info!("management API stopped");
        Ok(())
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received, draining connections");
}

// Middleware

async fn require_api_key(State(state): State<ApiState>, request: Request, next: Next) -> Response {
    let Some(expected) = state.api_key.as_deref() else {
        return next.run(request).await;
    };

    let rejection = match request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        None => Some(ApiError::new(
            StatusCode::UNAUTHORIZED,
            format!("missing {} header", API_KEY_HEADER),
        )),
        Some(key) if key != expected => {
            tracing::debug!("rejected request with invalid API key");
            Some(ApiError::new(StatusCode::UNAUTHORIZED, "invalid API key"))
        }
        Some(_) => None,
    };

    match rejection {
        Some(err) => err.into_response(),
        None => next.run(request).await,
    }
}

// Handler functions

async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let version = env!("CARGO_PKG_VERSION").to_string();
    match state.service.resource_count().await {
        Ok(count) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                version,
                resources: Some(count),
            }),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "degraded".to_string(),
                version,
                resources: None,
            }),
        ),
    }
}

async fn config_handler(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.service.provider_config().await?))
}

async fn list_handler(
    State(state): State<ApiState>,
    Path((protocol, resource_type)): Path<(String, String)>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .service
        .list(&protocol, &resource_type, query.into())
        .await?;
    Ok(Json(view.into_values().collect::<Vec<_>>()))
}

async fn get_handler(
    State(state): State<ApiState>,
    Path((protocol, resource_type, name)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.service.get(&protocol, &resource_type, &name).await?))
}

async fn create_handler(
    State(state): State<ApiState>,
    Path((protocol, resource_type)): Path<(String, String)>,
    body: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    // kind errors win over body errors
    ResourceKind::parse(&protocol, &resource_type)?;
    let Json(req) = body?;
    let record = state
        .service
        .create(&protocol, &resource_type, &req.name, req.config)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_handler(
    State(state): State<ApiState>,
    Path((protocol, resource_type, name)): Path<(String, String, String)>,
    body: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    ResourceKind::parse(&protocol, &resource_type)?;
    let Json(req) = body?;
    let record = state
        .service
        .update(&protocol, &resource_type, &name, req.config, req.enabled)
        .await?;
    Ok(Json(record))
}

async fn delete_handler(
    State(state): State<ApiState>,
    Path((protocol, resource_type, name)): Path<(String, String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete(&protocol, &resource_type, &name)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn schema_handler(
    State(state): State<ApiState>,
    Path((protocol, resource_type)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    // an unknown kind has no schema: 404 rather than 400
    let raw = state
        .service
        .schema(&protocol, &resource_type)
        .map_err(|e| ApiError::new(StatusCode::NOT_FOUND, e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "application/json")], raw))
}

async fn entrypoint_schema_handler(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let raw = state.service.entrypoint_schema()?;
    Ok(([(header::CONTENT_TYPE, "application/json")], raw))
}

async fn list_entrypoints_handler(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.service.list_entrypoints().await?))
}

async fn get_entrypoint_handler(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.service.get_entrypoint(&name).await?))
}

async fn fallback_handler() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "not found")
}

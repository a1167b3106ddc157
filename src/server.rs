//! JSON HTTP API for the search side of the pipeline.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/search` | Semantic search over the ingested corpus |
//! | `GET`  | `/topics` | Distinct topics present in the corpus |
//! | `GET`  | `/projects` | Distinct projects present in the corpus |
//! | `GET`  | `/stats` | Corpus-wide counts |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses use one JSON shape:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser-based clients
//! can call the API directly.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::embedding::EmbeddingProvider;
use crate::error::PipelineError;
use crate::models::CorpusStats;
use crate::search::{self, SearchResponse};
use crate::store::DocumentStore;

/// Shared application state passed to all route handlers via Axum's `State`
/// extractor.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn DocumentStore>,
    pub embedder: Arc<dyn EmbeddingProvider>,
}

/// Starts the HTTP server on `[server].bind` and serves until the process is
/// terminated.
pub async fn run_server(
    config: Arc<Config>,
    store: Arc<dyn DocumentStore>,
    embedder: Arc<dyn EmbeddingProvider>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let state = AppState {
        config,
        store,
        embedder,
    };

    let app = router(state);

    tracing::info!(addr = %bind_addr, "server listening");
    println!("Server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the router with all routes and the permissive CORS layer.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/search", post(handle_search))
        .route("/topics", get(handle_topics))
        .route("/projects", get(handle_projects))
        .route("/stats", get(handle_stats))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (`"bad_request"` or `"internal"`).
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Maps pipeline failures to HTTP status codes: caller mistakes (empty
/// query, bad search parameters, unsupported input) become 400, everything
/// else 500.
fn classify_error(err: anyhow::Error) -> AppError {
    let msg = err.to_string();

    match err.downcast_ref::<PipelineError>() {
        Some(pipeline) if pipeline.is_client_error() => bad_request(msg),
        _ => internal(msg),
    }
}

// ============ POST /search ============

/// JSON request body for `POST /search`.
#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    /// Minimum similarity in [0, 1]; defaults to the configured threshold.
    match_threshold: Option<f64>,
    /// Maximum number of chunk results; defaults to the configured count.
    match_count: Option<usize>,
    /// Exact-match topic filter.
    #[serde(default)]
    topic: Option<String>,
    /// Exact-match project filter.
    #[serde(default)]
    project: Option<String>,
}

/// Handler for `POST /search`.
///
/// Embeds the query, searches the store, and returns both the flat chunk
/// list and the file-grouped rollup.
async fn handle_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let threshold = req
        .match_threshold
        .unwrap_or(state.config.search.default_threshold);
    let count = req.match_count.unwrap_or(state.config.search.default_count);

    let response = search::run_search(
        state.store.as_ref(),
        state.embedder.as_ref(),
        &req.query,
        threshold,
        count,
        req.topic.as_deref(),
        req.project.as_deref(),
    )
    .await
    .map_err(classify_error)?;

    Ok(Json(response))
}

// ============ GET /topics, /projects ============

#[derive(Serialize)]
struct TopicsResponse {
    topics: Vec<String>,
}

async fn handle_topics(State(state): State<AppState>) -> Result<Json<TopicsResponse>, AppError> {
    let topics = state.store.topics().await.map_err(classify_error)?;
    Ok(Json(TopicsResponse { topics }))
}

#[derive(Serialize)]
struct ProjectsResponse {
    projects: Vec<String>,
}

async fn handle_projects(
    State(state): State<AppState>,
) -> Result<Json<ProjectsResponse>, AppError> {
    let projects = state.store.projects().await.map_err(classify_error)?;
    Ok(Json(ProjectsResponse { projects }))
}

// ============ GET /stats ============

async fn handle_stats(State(state): State<AppState>) -> Result<Json<CorpusStats>, AppError> {
    let stats = state.store.stats().await.map_err(classify_error)?;
    Ok(Json(stats))
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
    /// The crate version from `Cargo.toml`.
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

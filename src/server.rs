//! HTTP front end.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/ask` | Answer `{"query": "..."}` |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! `/api/ask` returns the [`AssistantResponse`] fields plus
//! `timings.total_ms`. A missing, non-string or blank query is a 400 with
//! `{"error": "Query is required"}`. Everything else is a 200, including
//! `not_found` and `error` answers; only a crashed handler task produces a
//! 500, and its body still carries `guardrail_status: "error"`.
//!
//! # CORS
//!
//! Origins listed in `[server].allowed_origins`, or starting with one of
//! `[server].allowed_origin_prefixes`, are allowed. With both lists empty
//! any origin is allowed.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, info};

use crate::config::{Config, ServerConfig};
use crate::models::AssistantResponse;
use crate::router::{QueryRouter, ERROR_SUMMARY};

#[derive(Clone)]
struct AppState {
    router: Arc<QueryRouter>,
}

/// Starts the server with production wiring from `config`.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let router = QueryRouter::from_config(config).await?;
    run_server_with_router(config, Arc::new(router)).await
}

/// Starts the server around an already-built [`QueryRouter`].
pub async fn run_server_with_router(config: &Config, router: Arc<QueryRouter>) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = build_app(&config.server, router);

    info!(bind = %bind_addr, "server listening");
    println!("Assistant listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// The axum application, without binding.
pub fn build_app(server: &ServerConfig, router: Arc<QueryRouter>) -> Router {
    Router::new()
        .route("/api/ask", post(handle_ask))
        .route("/health", get(handle_health))
        .layer(cors_layer(server))
        .with_state(AppState { router })
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if server.allowed_origins.is_empty() && server.allowed_origin_prefixes.is_empty() {
        return base.allow_origin(Any);
    }

    let exact = server.allowed_origins.clone();
    let prefixes = server.allowed_origin_prefixes.clone();
    base.allow_origin(AllowOrigin::predicate(
        move |origin: &HeaderValue, _parts| {
            origin
                .to_str()
                .map(|o| origin_allowed(o, &exact, &prefixes))
                .unwrap_or(false)
        },
    ))
}

fn origin_allowed(origin: &str, exact: &[String], prefixes: &[String]) -> bool {
    exact.iter().any(|e| e == origin) || prefixes.iter().any(|p| origin.starts_with(p.as_str()))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /api/ask ============

#[derive(Serialize)]
struct Timings {
    total_ms: u64,
}

#[derive(Serialize)]
struct AskResponse {
    #[serde(flatten)]
    response: AssistantResponse,
    timings: Timings,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    guardrail_status: Option<String>,
}

fn query_required() -> Response {
    let body = ErrorBody {
        error: "Query is required".to_string(),
        summary: None,
        guardrail_status: None,
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

fn internal_error() -> Response {
    let body = ErrorBody {
        error: "Internal server error".to_string(),
        summary: Some(ERROR_SUMMARY.to_string()),
        guardrail_status: Some("error".to_string()),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

async fn handle_ask(
    State(state): State<AppState>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Response {
    let started = Instant::now();

    let query = match body {
        Ok(Json(value)) => value
            .get("query")
            .and_then(|q| q.as_str())
            .map(str::to_string)
            .filter(|q| !q.trim().is_empty()),
        Err(_) => None,
    };
    let Some(query) = query else {
        return query_required();
    };

    info!(query = %query, "ask");

    // A separate task so a panic inside a handler becomes a 500 here
    // instead of tearing down the connection.
    let router = state.router.clone();
    let handled = tokio::spawn(async move { router.handle(&query).await }).await;

    match handled {
        Ok(response) => Json(AskResponse {
            response,
            timings: Timings {
                total_ms: started.elapsed().as_millis() as u64,
            },
        })
        .into_response(),
        Err(e) => {
            error!(error = %e, "ask handler task failed");
            internal_error()
        }
    }
}

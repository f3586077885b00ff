//! HTTP server: prediction, health and metrics routes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

use crate::config::AppConfig;
use crate::handler::{ChurnHandler, InvocationContext};
use crate::metrics::MetricsRegistry;
use crate::response::LambdaResponse;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Server state
#[derive(Debug)]
pub struct ServerState {
    /// Prediction pipeline
    pub handler: ChurnHandler,
    /// Application status
    pub status: RwLock<AppStatus>,
    started: Instant,
    requests: AtomicU64,
}

/// Application status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppStatus {
    /// Starting up
    Starting,
    /// Serving requests
    Running,
    /// Shutting down
    ShuttingDown,
}

impl ServerState {
    /// Create a new server state
    #[must_use]
    pub fn new(handler: ChurnHandler) -> Self {
        Self {
            handler,
            status: RwLock::new(AppStatus::Starting),
            started: Instant::now(),
            requests: AtomicU64::new(0),
        }
    }

    /// Caller-supplied `x-request-id`, or a generated one
    #[must_use]
    pub fn request_id(&self, headers: &HeaderMap) -> String {
        let seq = self.requests.fetch_add(1, Ordering::Relaxed) + 1;
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map_or_else(|| format!("http-{seq}"), str::to_string)
    }

    /// Metrics registry
    #[must_use]
    pub fn metrics(&self) -> &MetricsRegistry {
        self.handler.metrics()
    }

    /// Set application status
    pub async fn set_status(&self, status: AppStatus) {
        let mut s = self.status.write().await;
        *s = status;
    }

    /// Get application status
    pub async fn get_status(&self) -> AppStatus {
        *self.status.read().await
    }

    /// Check if application is healthy
    pub async fn is_healthy(&self) -> bool {
        matches!(
            self.get_status().await,
            AppStatus::Running | AppStatus::Starting
        )
    }
}

/// Health check response
#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    /// Status string
    pub status: &'static str,
    /// Application version
    pub version: &'static str,
    /// Uptime in seconds
    pub uptime_secs: u64,
    /// Whether the classifier and manifest are loaded
    pub model_ready: bool,
    /// Artifact load attempts so far
    pub load_attempts: u64,
}

impl IntoResponse for LambdaResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, self.body).into_response();
        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!("Dropping invalid response header {}", name),
            }
        }
        response
    }
}

/// Build the router
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// `POST /predict`: the JSON body is the record itself
async fn predict(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> LambdaResponse {
    let ctx = InvocationContext::with_request_id(state.request_id(&headers));
    state.handler.handle_json_body(&body, &ctx).await
}

async fn health(State(state): State<Arc<ServerState>>) -> (StatusCode, Json<HealthResponse>) {
    let healthy = state.is_healthy().await;
    let cache = state.handler.cache();
    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        code,
        Json(HealthResponse {
            status: if healthy { "ok" } else { "unhealthy" },
            version: env!("CARGO_PKG_VERSION"),
            uptime_secs: state.started.elapsed().as_secs(),
            model_ready: cache.is_ready(),
            load_attempts: cache.load_attempts(),
        }),
    )
}

async fn metrics(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.metrics().encode(),
    )
}

/// Serve until the listener fails
pub async fn serve(config: &AppConfig, state: Arc<ServerState>) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("HTTP server listening on {}", addr);

    state.set_status(AppStatus::Running).await;
    let result = axum::serve(listener, router(Arc::clone(&state))).await;
    state.set_status(AppStatus::ShuttingDown).await;

    result.map_err(Into::into)
}

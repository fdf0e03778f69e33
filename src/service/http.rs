//! HTTP endpoints for queue operations, health checks and Prometheus metrics
//!
//! This module exposes the `QueueService` over a JSON API using Axum.

use crate::error::QueueError;
use crate::service::lobby::QueueService;
use crate::types::JoinRequest;
use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host to bind to (typically "0.0.0.0" for all interfaces)
    pub host: String,
    /// Service name reported by `/health` and `/stats`
    pub service_name: String,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            service_name: "briscola-lobby".to_string(),
        }
    }
}

/// Shared state for the HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub service: QueueService,
    pub service_name: String,
    pub started_at: Instant,
}

/// Body of `POST /queues`
#[derive(Debug, Deserialize)]
pub struct CreateQueueBody {
    pub name: String,
    pub capacity: usize,
}

/// Body of `POST /queues/{name}/players`
#[derive(Debug, Deserialize)]
pub struct JoinQueueBody {
    pub player_name: String,
    pub player_id: String,
}

/// Queue error rendered as a JSON response
pub struct ApiError(pub QueueError);

impl From<QueueError> for ApiError {
    fn from(err: QueueError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            QueueError::NotFound { .. } => StatusCode::NOT_FOUND,
            QueueError::AlreadyExists { .. }
            | QueueError::Full { .. }
            | QueueError::Duplicate { .. }
            | QueueError::NotReady { .. } => StatusCode::CONFLICT,
            QueueError::InvalidName { .. } | QueueError::InvalidCapacity { .. } => {
                StatusCode::BAD_REQUEST
            }
            QueueError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Queue operation failed: {}", self.0);
        }

        let body = json!({
            "error": self.0.kind(),
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

/// HTTP server that provides the queue API and monitoring endpoints
pub struct HttpServer {
    config: HttpServerConfig,
    state: HttpState,
    shutdown_tx: broadcast::Sender<()>,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(config: HttpServerConfig, service: QueueService) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let state = HttpState {
            service,
            service_name: config.service_name.clone(),
            started_at: Instant::now(),
        };

        Self {
            config,
            state,
            shutdown_tx,
        }
    }

    /// Bind and serve; returns once a stop signal has been received
    pub async fn start(&self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Bind the configured address
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid HTTP server address")?;

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind HTTP server to {}", addr))?;

        info!("HTTP server listening on http://{}", listener.local_addr()?);
        Ok(listener)
    }

    /// Serve on an already bound listener.
    ///
    /// The shutdown subscription is taken before the future is returned, so a
    /// `stop()` issued before the future is first polled is not lost.
    pub fn serve(
        &self,
        listener: TcpListener,
    ) -> impl std::future::Future<Output = Result<()>> + Send + 'static {
        let app = self.create_router();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.recv().await;
                    info!("HTTP server shutdown signal received");
                })
                .await?;

            info!("HTTP server stopped");
            Ok(())
        }
    }

    /// Create the Axum router with all endpoints
    pub fn create_router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Stop the HTTP server
    pub fn stop(&self) {
        info!("Stopping HTTP server...");

        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to HTTP server: {}", e);
        }
    }
}

/// Build the router for a given state
pub fn create_router(state: HttpState) -> Router {
    Router::new()
        .route("/queues", post(create_queue_handler).get(list_queues_handler))
        .route("/queues/{name}", get(queue_handler))
        .route("/queues/{name}/players", post(join_queue_handler))
        .route("/queues/{name}/start", post(start_match_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/stats", get(stats_handler))
        .with_state(state)
}

async fn create_queue_handler(
    State(state): State<HttpState>,
    Json(body): Json<CreateQueueBody>,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state
        .service
        .create_queue(&body.name, body.capacity)
        .await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

async fn list_queues_handler(State(state): State<HttpState>) -> Result<impl IntoResponse, ApiError> {
    let names = state.service.queue_names().await?;
    Ok(Json(names))
}

async fn queue_handler(
    State(state): State<HttpState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.service.queue_snapshot(&name).await?;
    Ok(Json(snapshot))
}

async fn join_queue_handler(
    State(state): State<HttpState>,
    Path(name): Path<String>,
    Json(body): Json<JoinQueueBody>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .service
        .join_queue(JoinRequest {
            queue: name,
            player_name: body.player_name,
            player_id: body.player_id,
        })
        .await?;
    Ok(Json(outcome))
}

async fn start_match_handler(
    State(state): State<HttpState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let started = state.service.start_match(&name).await?;
    Ok(Json(started))
}

/// Lightweight health check; unhealthy only when the registry is unusable
async fn health_handler(State(state): State<HttpState>) -> impl IntoResponse {
    debug!("Health check requested");

    match state.service.queue_names().await {
        Ok(names) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "service": state.service_name,
                "version": crate::VERSION,
                "queues": names.len(),
            })),
        ),
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "service": state.service_name,
                    "version": crate::VERSION,
                    "error": e.to_string(),
                })),
            )
        }
    }
}

/// Prometheus metrics endpoint handler
async fn metrics_handler(State(state): State<HttpState>) -> Response {
    debug!("Metrics endpoint requested");

    let metrics = state.service.metrics();
    metrics.update_uptime(state.started_at.elapsed());
    if let Ok(stats) = state.service.stats().await {
        metrics.update_from_registry_stats(&stats);
    }

    let metric_families = metrics.registry().gather();
    let encoder = TextEncoder::new();

    match encoder.encode_to_string(&metric_families) {
        Ok(output) => {
            debug!("Serving {} metric families", metric_families.len());
            (
                StatusCode::OK,
                [("content-type", encoder.format_type().to_string())],
                output,
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics".to_string(),
            )
                .into_response()
        }
    }
}

/// Registry statistics for debugging and human consumption
async fn stats_handler(State(state): State<HttpState>) -> Result<impl IntoResponse, ApiError> {
    debug!("Stats endpoint requested");

    let stats = state.service.stats().await?;
    Ok(Json(json!({
        "service": {
            "name": state.service_name,
            "version": crate::VERSION,
            "uptime_seconds": state.started_at.elapsed().as_secs(),
        },
        "queues": stats,
        "timestamp": chrono::Utc::now(),
    })))
}

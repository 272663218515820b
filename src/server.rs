//! HTTP endpoint for shopping search.
//!
//! ## Endpoints
//!
//! - `POST /api/search`: answer a natural-language shopping query
//! - `GET /health`: liveness probe
//!
//! Rejected, degraded, and partially failed searches are all `200` with a
//! `message`. Only a blank or malformed request is `400`, and only an
//! unexpected pipeline failure is `500`.

use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use shopsift_search::{SearchError, SearchPipeline};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{Instrument, info};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::{AppError, Result};

/// Body returned for any failure the caller cannot act on.
pub const UNEXPECTED_ERROR_MESSAGE: &str =
    "An unexpected error occurred while processing your request";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `POST /api/search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-form shopping query.
    pub query: String,
}

/// Error body for non-200 responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

enum ApiError {
    BadRequest(String),
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                UNEXPECTED_ERROR_MESSAGE.to_owned(),
            ),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Running HTTP server. The server task is aborted when this is dropped.
pub struct SearchServer {
    /// The address the server is listening on.
    addr: SocketAddr,
    /// Handle to the background server task.
    handle: JoinHandle<()>,
}

impl SearchServer {
    /// Bind to the configured address and start serving in the background.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Server`] if the address cannot be bound.
    pub async fn start(pipeline: SearchPipeline, config: &ServerConfig) -> Result<Self> {
        let app = router(pipeline);

        let bind_addr = config.bind_addr();
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| AppError::Server(format!("bind to {bind_addr} failed: {e}")))?;

        let addr = listener
            .local_addr()
            .map_err(|e| AppError::Server(format!("failed to get local addr: {e}")))?;

        info!(%addr, "search server listening");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "search server error");
            }
        });

        Ok(Self { addr, handle })
    }

    /// The address the server is bound to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The port the server is bound to.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Abort the server task.
    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for SearchServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Build the application router around `pipeline`.
pub fn router(pipeline: SearchPipeline) -> Router {
    Router::new()
        .route("/api/search", post(handle_search))
        .route("/health", get(handle_health))
        .with_state(pipeline)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

async fn handle_search(
    State(pipeline): State<SearchPipeline>,
    body: std::result::Result<Json<SearchRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "rejected malformed search request");
            return ApiError::BadRequest(
                "request body must be a JSON object with a string \"query\" field".into(),
            )
            .into_response();
        }
    };

    if request.query.trim().is_empty() {
        return ApiError::BadRequest("query must not be empty".into()).into_response();
    }

    let span = tracing::info_span!("search_request", request_id = %Uuid::new_v4());

    // A panic inside the pipeline surfaces here as a JoinError.
    let task = tokio::spawn(
        async move { pipeline.handle_search(&request.query).await }.instrument(span.clone()),
    );

    match task.await {
        Ok(Ok(response)) => Json(response).into_response(),
        Ok(Err(SearchError::InvalidQuery(message))) => {
            ApiError::BadRequest(message).into_response()
        }
        Ok(Err(e)) => {
            tracing::error!(parent: &span, error = %e, "search failed");
            ApiError::Internal.into_response()
        }
        Err(e) => {
            tracing::error!(parent: &span, error = %e, "search task panicked");
            ApiError::Internal.into_response()
        }
    }
}

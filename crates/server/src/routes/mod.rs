//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                           - Liveness check
//!
//! # Auth
//! POST /api/login                        - Username/password login
//! GET  /api/me                           - Current user
//! POST /api/logout                       - End the session
//!
//! # Records
//! GET  /api/customers                    - List (search, status, country)
//! POST /api/customers                    - Create
//! PUT  /api/customers/{id}               - Update
//! DELETE /api/customers/{id}             - Delete
//! GET  /api/products                     - List
//! POST /api/products                     - Create
//! PUT  /api/products/{id}                - Update
//! GET  /api/orders                       - List (status, customerId)
//! POST /api/orders                       - Create
//! PUT  /api/orders/{id}/status           - Change status
//! GET  /api/inquiries                    - List (status)
//! POST /api/inquiries                    - Create
//! PUT  /api/inquiries/{id}               - Update
//! GET  /api/stats                        - Dashboard statistics
//!
//! # Assistant
//! POST /api/ai/chat                      - General question
//! POST /api/ai/research-company          - Company research with web search
//! POST /api/ai/analyze-customer/{id}     - Single-customer analysis
//! ```
//!
//! Anything else falls through to the static front end.

pub mod ai;
pub mod auth;
pub mod customers;
pub mod inquiries;
pub mod orders;
pub mod products;
pub mod stats;

use axum::{
    Router,
    extract::FromRequest,
    middleware,
    routing::get,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::request_id_middleware;
use crate::state::AppState;
use crate::store::StoreError;

/// Build all `/api` routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(customers::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(inquiries::router())
        .merge(stats::router())
        .merge(ai::router())
}

/// Build the complete application with its middleware stack.
pub fn app(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config().static_dir);

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .fallback_service(static_files)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

// =============================================================================
// Shared request/response types
// =============================================================================

/// JSON body extractor whose rejections use the API error shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// A list of records.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub total: usize,
}

impl<T> ListResponse<T> {
    #[must_use]
    pub fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            total: data.len(),
            data,
        }
    }
}

/// One record, with an optional confirmation message.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub data: T,
}

impl<T> DataResponse<T> {
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    #[must_use]
    pub const fn with_message(message: &'static str, data: T) -> Self {
        Self {
            success: true,
            message: Some(message),
            data,
        }
    }
}

/// A bare confirmation.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

impl MessageResponse {
    #[must_use]
    pub const fn new(message: &'static str) -> Self {
        Self {
            success: true,
            message,
        }
    }
}

/// Turn a store error for `entity` into an API error, naming the entity on 404.
fn store_error(entity: &'static str) -> impl FnOnce(StoreError) -> AppError {
    move |err| match err {
        StoreError::NotFound => AppError::NotFound(entity.to_string()),
        other => AppError::Store(other),
    }
}

//! HTTP surface for query-gate.
//!
//! A single `POST /execute` route in one of two modes (plain or paginated),
//! plus a health check.

mod handlers;
mod params;

pub use handlers::{PaginatedResponse, PlainResponse, QueryRequest};
pub use params::{Page, QueryBody};

use crate::audit::AuditLog;
use crate::config::Config;
use crate::db;
use crate::error::{ApiError, GateError, Result};
use crate::query::QueryExecutor;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::any::Any;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shape of the `/execute` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecuteMode {
    /// Runs the query as submitted and answers `{"result": [...]}`.
    #[default]
    Plain,
    /// Appends LIMIT/OFFSET and answers `{"resultados": [...], "limit", "offset"}`.
    Paginated,
}

impl ExecuteMode {
    pub fn from_flag(paginate: bool) -> Self {
        if paginate {
            Self::Paginated
        } else {
            Self::Plain
        }
    }
}

/// Shared, read-only request state.
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<QueryExecutor>,
}

impl AppState {
    pub fn new(executor: QueryExecutor) -> Self {
        Self {
            executor: Arc::new(executor),
        }
    }
}

/// Create the HTTP router.
pub fn create_router(state: AppState, mode: ExecuteMode) -> Router {
    let execute = match mode {
        ExecuteMode::Plain => post(handlers::execute_plain),
        ExecuteMode::Paginated => post(handlers::execute_paginated),
    };

    Router::new()
        .route("/execute", execute)
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}

/// Builds the full application from configuration: database client,
/// executor and router in the configured mode.
pub fn app_from_config(config: &Config, audit: AuditLog) -> Result<Router> {
    let db = db::client_for(&config.database)?;
    info!(
        backend = db.backend().as_str(),
        database = %config.database.display_string(),
        "Database client ready"
    );
    let executor = QueryExecutor::new(db, audit);
    Ok(create_router(
        AppState::new(executor),
        ExecuteMode::from_flag(config.server.paginate),
    ))
}

/// Serve the router until Ctrl-C.
pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    let addr = listener
        .local_addr()
        .map_err(|e| GateError::internal(format!("Listener has no address: {e}")))?;
    info!(%addr, "query-gate listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| GateError::internal(format!("Server error: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    error!("Request handler panicked");
    ApiError::Execution.into_response()
}

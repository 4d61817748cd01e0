//! Route handlers.

use super::{AppState, Page, QueryBody};
use crate::db::ResultSet;
use crate::error::ApiError;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

/// Request body of `POST /execute`.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

/// Plain-mode response body.
#[derive(Debug, Serialize)]
pub struct PlainResponse {
    pub result: ResultSet,
}

/// Paginated-mode response body.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse {
    pub resultados: ResultSet,
    pub limit: u32,
    pub offset: u64,
}

pub(super) async fn execute_plain(
    State(state): State<AppState>,
    QueryBody(request): QueryBody,
) -> Result<Json<PlainResponse>, ApiError> {
    let result = state.executor.execute(&request.query).await?;
    Ok(Json(PlainResponse { result }))
}

pub(super) async fn execute_paginated(
    State(state): State<AppState>,
    Page(page): Page,
    QueryBody(request): QueryBody,
) -> Result<Json<PaginatedResponse>, ApiError> {
    let resultados = state
        .executor
        .execute_paginated(&request.query, page)
        .await?;
    Ok(Json(PaginatedResponse {
        resultados,
        limit: page.limit(),
        offset: page.offset(),
    }))
}

pub(super) async fn health() -> Json<JsonValue> {
    Json(json!({
        "status": "ok",
        "service": "query-gate",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

//! Request extractors for `/execute`.
//!
//! Malformed input is answered with 422 and a `detail` list before the
//! handler runs, so 400 stays reserved for queries refused by the gate.

use super::handlers::QueryRequest;
use crate::query::PaginationParams;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct RawPage {
    limit: Option<String>,
    offset: Option<String>,
}

/// Validated `limit`/`offset` query parameters.
#[derive(Debug, Clone, Copy)]
pub struct Page(pub PaginationParams);

impl<S> FromRequestParts<S> for Page
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(raw) = Query::<RawPage>::from_request_parts(parts, state)
            .await
            .map_err(|e| unprocessable(&["query"], &e.body_text(), "query_parsing", None))?;

        PaginationParams::parse(raw.limit.as_deref(), raw.offset.as_deref())
            .map(Page)
            .map_err(|e| {
                let input = match e.field() {
                    "limit" => raw.limit.as_deref(),
                    _ => raw.offset.as_deref(),
                };
                unprocessable(&["query", e.field()], &e.to_string(), e.kind(), input)
            })
    }
}

/// JSON body of `/execute`.
#[derive(Debug, Clone)]
pub struct QueryBody(pub QueryRequest);

impl<S> FromRequest<S> for QueryBody
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<QueryRequest>::from_request(req, state).await {
            Ok(Json(request)) => Ok(Self(request)),
            Err(JsonRejection::JsonSyntaxError(e)) => Err(unprocessable(
                &["body"],
                &e.body_text(),
                "json_invalid",
                None,
            )),
            Err(JsonRejection::JsonDataError(e)) => Err(unprocessable(
                &["body"],
                &e.body_text(),
                "value_error",
                None,
            )),
            // Missing content type (415) and unreadable bodies keep axum's status.
            Err(other) => Err(other.into_response()),
        }
    }
}

fn unprocessable(loc: &[&str], msg: &str, kind: &str, input: Option<&str>) -> Response {
    let body = json!({
        "detail": [{
            "loc": loc,
            "msg": msg,
            "type": kind,
            "input": input,
        }]
    });
    (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
}

//! Error types for query-gate.
//!
//! Defines the main error enum used throughout the service and its mapping
//! onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Body returned when a query fails the read-only gate.
pub const REJECTED_DETAIL: &str = "Apenas consultas SELECT são permitidas.";

/// Body returned for every other failure. Driver errors never leave the process.
pub const EXECUTION_DETAIL: &str = "Erro ao consultar o banco de dados.";

/// Main error type for query-gate operations.
#[derive(Error, Debug)]
pub enum GateError {
    /// The query is not a permitted read-only SELECT.
    #[error("Rejected query: {0}")]
    Rejected(String),

    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors (syntax errors, type errors, timeouts, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Configuration errors (invalid config file, bad DSN, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GateError {
    /// Creates a rejection error for the given query text.
    pub fn rejected(query: impl Into<String>) -> Self {
        Self::Rejected(query.into())
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if the error was caused by the caller's query text.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Result type alias using GateError.
pub type Result<T> = std::result::Result<T, GateError>;

/// HTTP-facing error. Only the fixed detail strings are ever serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    /// 400: the query failed the read-only gate.
    Rejected,
    /// 500: anything else.
    Execution,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Rejected => StatusCode::BAD_REQUEST,
            Self::Execution => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn detail(&self) -> &'static str {
        match self {
            Self::Rejected => REJECTED_DETAIL,
            Self::Execution => EXECUTION_DETAIL,
        }
    }
}

impl From<GateError> for ApiError {
    fn from(err: GateError) -> Self {
        if err.is_client_error() {
            Self::Rejected
        } else {
            Self::Execution
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.detail() }))).into_response()
    }
}

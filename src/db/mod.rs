//! Database abstraction layer for query-gate.
//!
//! Provides a trait-based interface for statement execution, allowing
//! different database backends (and test doubles) to be used interchangeably.

mod mock;
mod postgres;
mod sqlite;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use postgres::PostgresClient;
pub use sqlite::SqliteClient;
pub use types::{ColumnInfo, QueryResult, ResultRow, ResultSet, Row, Value};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Postgres,
    Sqlite,
}

impl DatabaseBackend {
    /// Returns the backend as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Parses a backend from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

/// Creates a database client for the configured backend.
///
/// Clients hold only connection parameters; every statement opens and closes
/// its own connection.
pub fn client_for(config: &ConnectionConfig) -> Result<Arc<dyn DatabaseClient>> {
    match config.resolved_backend() {
        DatabaseBackend::Postgres => Ok(Arc::new(PostgresClient::new(config)?)),
        DatabaseBackend::Sqlite => Ok(Arc::new(SqliteClient::new(config)?)),
    }
}

/// Trait defining the interface for database clients.
///
/// All database operations are async and return Results with GateError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes exactly one SQL statement on a fresh connection and returns
    /// every row it produced.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Returns the backend this client talks to.
    fn backend(&self) -> DatabaseBackend;
}

//! Test doubles for the database layer.
//!
//! `MockDatabaseClient` returns a scripted result and records every statement
//! it receives; `FailingDatabaseClient` fails every call.

use super::{ColumnInfo, DatabaseBackend, DatabaseClient, QueryResult, Row};
use crate::error::{GateError, Result};
use async_trait::async_trait;
use std::sync::Mutex;

/// A mock database client that returns a predefined result.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    result: QueryResult,
    statements: Mutex<Vec<String>>,
}

impl MockDatabaseClient {
    /// Creates a mock that returns an empty result set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock that returns the given columns and rows for every statement.
    pub fn with_rows(columns: &[&str], rows: Vec<Row>) -> Self {
        let columns = columns
            .iter()
            .map(|name| ColumnInfo::new(*name, "TEXT"))
            .collect();
        Self {
            result: QueryResult::with_data(columns, rows),
            statements: Mutex::new(Vec::new()),
        }
    }

    /// Number of statements executed so far.
    pub fn invocations(&self) -> usize {
        self.statements.lock().map(|s| s.len()).unwrap_or_default()
    }

    /// Statements executed so far, in call order.
    pub fn statements(&self) -> Vec<String> {
        self.statements
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        self.statements
            .lock()
            .map_err(|_| GateError::internal("mock statement log poisoned"))?
            .push(sql.to_string());
        Ok(self.result.clone())
    }

    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Sqlite
    }
}

/// A database client whose every call fails with the given message.
#[derive(Debug)]
pub struct FailingDatabaseClient {
    message: String,
}

impl FailingDatabaseClient {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn execute_query(&self, _sql: &str) -> Result<QueryResult> {
        Err(GateError::query(self.message.clone()))
    }

    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Postgres
    }
}

//! SQLite database client implementation.
//!
//! Used for local runs against a database file and for end-to-end tests.
//! Like the Postgres client, every statement opens and closes its own connection.

use crate::config::ConnectionConfig;
use crate::db::{ColumnInfo, DatabaseBackend, DatabaseClient, QueryResult, Row, Value};
use crate::error::{GateError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column as SqlxColumn, ConnectOptions, Connection, Row as SqlxRow, TypeInfo, ValueRef};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::debug;

/// SQLite database client.
#[derive(Debug, Clone)]
pub struct SqliteClient {
    options: SqliteConnectOptions,
    display: String,
    connect_timeout: Duration,
    query_timeout: Duration,
}

impl SqliteClient {
    /// Creates a client from connection settings. No connection is opened here.
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;
        let options = SqliteConnectOptions::from_str(&conn_str)
            .map_err(|e| GateError::config(format!("Invalid DSN: {e}")))?
            .statement_cache_capacity(0);

        Ok(Self {
            options,
            display: config.display_string(),
            connect_timeout: config.connect_timeout(),
            query_timeout: config.query_timeout(),
        })
    }

    async fn open(&self) -> Result<SqliteConnection> {
        debug!("Opening connection to {}", self.display);
        tokio::time::timeout(self.connect_timeout, self.options.connect())
            .await
            .map_err(|_| {
                GateError::connection(format!(
                    "Connection to {} timed out after {:?}",
                    self.display, self.connect_timeout
                ))
            })?
            .map_err(|e| GateError::connection(format!("Cannot open {}: {e}", self.display)))
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();
        let mut conn = self.open().await?;

        let outcome =
            tokio::time::timeout(self.query_timeout, sqlx::query(sql).fetch_all(&mut conn)).await;

        let fetched = match outcome {
            Ok(fetched) => {
                if let Err(e) = conn.close().await {
                    debug!("Error closing connection: {e}");
                }
                fetched.map_err(|e| GateError::query(e.to_string()))?
            }
            Err(_) => {
                drop(conn);
                return Err(GateError::query(format!(
                    "Query timed out after {} seconds",
                    self.query_timeout.as_secs()
                )));
            }
        };

        let columns: Vec<ColumnInfo> = fetched
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                    .collect()
            })
            .unwrap_or_default();

        let rows = fetched
            .iter()
            .map(|row| convert_row(row, &columns))
            .collect::<Result<Vec<Row>>>()?;

        Ok(QueryResult::with_data(columns, rows).with_execution_time(start.elapsed()))
    }

    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Sqlite
    }
}

fn convert_row(row: &SqliteRow, columns: &[ColumnInfo]) -> Result<Row> {
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| convert_value(row, i, column))
        .collect()
}

/// Declared temporal and boolean types first, then storage classes.
/// BLOBs are returned base64-encoded.
fn convert_value(row: &SqliteRow, index: usize, column: &ColumnInfo) -> Result<Value> {
    let raw = row.try_get_raw(index).map_err(|e| undecodable(column, e))?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let declared = match column.data_type.to_uppercase().as_str() {
        "BOOLEAN" | "BOOL" => row.try_get(index).ok().map(Value::Bool),
        "DATE" => row.try_get(index).ok().map(Value::Date),
        "TIME" => row.try_get(index).ok().map(Value::Time),
        "DATETIME" | "TIMESTAMP" => row.try_get(index).ok().map(Value::DateTime),
        _ => None,
    };
    if let Some(value) = declared {
        return Ok(value);
    }

    row.try_get::<i64, _>(index)
        .map(Value::Int)
        .or_else(|_| row.try_get::<f64, _>(index).map(Value::Float))
        .or_else(|_| row.try_get::<String, _>(index).map(Value::Text))
        .or_else(|_| {
            row.try_get::<Vec<u8>, _>(index)
                .map(|bytes| Value::Text(STANDARD.encode(bytes)))
        })
        .map_err(|e| undecodable(column, e))
}

fn undecodable(column: &ColumnInfo, reason: sqlx::Error) -> GateError {
    GateError::query(format!(
        "Cannot convert column {} of type {}: {reason}",
        column.name, column.data_type
    ))
}

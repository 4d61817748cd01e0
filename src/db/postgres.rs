//! PostgreSQL database client implementation.
//!
//! Provides the `PostgresClient` struct that implements the `DatabaseClient` trait
//! for PostgreSQL databases using sqlx. Each statement runs on its own connection.

use crate::config::ConnectionConfig;
use crate::db::{ColumnInfo, DatabaseBackend, DatabaseClient, QueryResult, Row, Value};
use crate::error::{GateError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use sqlx::types::{JsonValue, Uuid};
use sqlx::{
    Column as SqlxColumn, ConnectOptions, Connection, Postgres, Row as SqlxRow, TypeInfo, ValueRef,
};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::debug;

/// PostgreSQL database client.
#[derive(Debug, Clone)]
pub struct PostgresClient {
    options: PgConnectOptions,
    display: String,
    connect_timeout: Duration,
    query_timeout: Duration,
}

impl PostgresClient {
    /// Creates a client from connection settings. No connection is opened here.
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;
        let options = PgConnectOptions::from_str(&conn_str)
            .map_err(|e| GateError::config(format!("Invalid DSN: {e}")))?
            .statement_cache_capacity(0);

        Ok(Self {
            options,
            display: config.display_string(),
            connect_timeout: config.connect_timeout(),
            query_timeout: config.query_timeout(),
        })
    }

    async fn open(&self) -> Result<PgConnection> {
        debug!("Opening connection to {}", self.display);
        tokio::time::timeout(self.connect_timeout, self.options.connect())
            .await
            .map_err(|_| {
                GateError::connection(format!(
                    "Connection to {} timed out after {:?}",
                    self.display, self.connect_timeout
                ))
            })?
            .map_err(|e| map_connection_error(e, &self.display))
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
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
                fetched.map_err(|e| GateError::query(format_query_error(e)))?
            }
            Err(_) => {
                // Cancelled mid-statement: the protocol state is unknown, so the
                // socket is dropped instead of sending a graceful terminate.
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
        DatabaseBackend::Postgres
    }
}

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow, columns: &[ColumnInfo]) -> Result<Row> {
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| convert_value(row, i, column))
        .collect()
}

fn decode<'r, T>(row: &'r PgRow, index: usize, column: &ColumnInfo) -> Result<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get::<T, _>(index).map_err(|e| undecodable(column, e))
}

/// Converts a single column value from a PgRow to our Value type.
///
/// SQL NULL is the only source of `Value::Null`. A non-null value whose type
/// has no conversion fails the statement.
fn convert_value(row: &PgRow, index: usize, column: &ColumnInfo) -> Result<Value> {
    let raw = row.try_get_raw(index).map_err(|e| undecodable(column, e))?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let value = match column.data_type.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => Value::Bool(decode(row, index, column)?),
        "INT2" | "SMALLINT" => Value::Int(decode::<i16>(row, index, column)?.into()),
        "INT4" | "INT" | "INTEGER" => Value::Int(decode::<i32>(row, index, column)?.into()),
        "INT8" | "BIGINT" => Value::Int(decode(row, index, column)?),
        "OID" => Value::Int(decode::<Oid>(row, index, column)?.0.into()),
        "FLOAT4" | "REAL" => Value::Float(decode::<f32>(row, index, column)?.into()),
        "FLOAT8" | "DOUBLE PRECISION" => Value::Float(decode(row, index, column)?),
        "NUMERIC" | "DECIMAL" => {
            let decimal: BigDecimal = decode(row, index, column)?;
            let float = decimal
                .to_f64()
                .ok_or_else(|| undecodable(column, format!("{decimal} does not fit a float")))?;
            Value::Float(float)
        }
        "DATE" => Value::Date(decode::<NaiveDate>(row, index, column)?),
        "TIME" => Value::Time(decode::<NaiveTime>(row, index, column)?),
        "TIMESTAMP" => Value::DateTime(decode::<NaiveDateTime>(row, index, column)?),
        "TIMESTAMPTZ" => Value::Timestamp(decode::<DateTime<Utc>>(row, index, column)?),
        "UUID" => Value::Text(decode::<Uuid>(row, index, column)?.to_string()),
        "JSON" | "JSONB" => Value::Json(decode::<JsonValue>(row, index, column)?),
        "BYTEA" => Value::Text(STANDARD.encode(decode::<Vec<u8>>(row, index, column)?)),
        "CHAR" => Value::Text(char::from(decode::<i8>(row, index, column)? as u8).to_string()),
        // Textual types (TEXT, VARCHAR, BPCHAR, NAME, CITEXT, ...)
        _ => Value::Text(decode::<String>(row, index, column)?),
    };
    Ok(value)
}

fn undecodable(column: &ColumnInfo, reason: impl fmt::Display) -> GateError {
    GateError::query(format!(
        "Cannot convert column {} of type {}: {reason}",
        column.name, column.data_type
    ))
}

/// Maps sqlx connection errors to readable messages for the audit log.
fn map_connection_error(error: sqlx::Error, display: &str) -> GateError {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        GateError::connection(format!(
            "Cannot connect to {display}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        GateError::connection(format!(
            "Authentication failed for {display}. Check your credentials."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        GateError::connection(format!("Database in {display} does not exist."))
    } else {
        GateError::connection(error.to_string())
    }
}

/// Formats a query error with Postgres detail and hint when available.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = String::from("ERROR: ");
    result.push_str(db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }
        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }
    }

    result
}

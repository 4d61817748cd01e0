//! PostgreSQL integration tests.
//!
//! These tests require a running PostgreSQL database.
//! Set DATABASE_URL environment variable to run them.

use super::common::{execute_request, send};
use axum::http::StatusCode;
use query_gate::audit::{AuditLog, MemorySink};
use query_gate::config::{Config, ConnectionConfig};
use query_gate::db::{DatabaseClient, PostgresClient, Value};
use query_gate::server::app_from_config;
use serde_json::json;
use std::sync::Arc;

fn test_config() -> Option<ConnectionConfig> {
    let url = std::env::var("DATABASE_URL").ok()?;
    Some(ConnectionConfig::from_dsn(url))
}

#[tokio::test]
async fn test_each_call_uses_a_fresh_connection() {
    let Some(config) = test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let client = PostgresClient::new(&config).unwrap();

    let first = client.execute_query("SELECT pg_backend_pid() AS pid").await.unwrap();
    let second = client.execute_query("SELECT pg_backend_pid() AS pid").await.unwrap();

    assert!(matches!(first.rows[0][0], Value::Int(_)));
    assert_ne!(first.rows[0][0], second.rows[0][0]);
}

#[tokio::test]
async fn test_paginated_generate_series() {
    let Some(database) = test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let mut config = Config::default();
    config.database = database;
    config.server.paginate = true;

    let sink = Arc::new(MemorySink::new());
    let app = app_from_config(&config, AuditLog::new(sink.clone())).unwrap();

    let (status, body) = send(
        app,
        execute_request(
            "/execute?limit=3&offset=2",
            "SELECT n::int AS n FROM generate_series(1, 10) AS n ORDER BY n",
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "resultados": [ {"n": 3}, {"n": 4}, {"n": 5} ],
            "limit": 3,
            "offset": 2
        })
    );
}

#[tokio::test]
async fn test_uuid_and_jsonb_columns_are_rendered() {
    let Some(database) = test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let mut config = Config::default();
    config.database = database;

    let app = app_from_config(&config, AuditLog::new(Arc::new(MemorySink::new()))).unwrap();

    let (status, body) = send(
        app,
        execute_request(
            "/execute",
            "SELECT 'a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11'::uuid AS id, \
             '{\"tags\": [\"a\"]}'::jsonb AS doc",
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "result": [{
                "id": "a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11",
                "doc": {"tags": ["a"]}
            }]
        })
    );
}

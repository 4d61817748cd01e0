//! Shared helpers for the integration tests.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use query_gate::audit::{AuditLog, MemorySink};
use query_gate::config::{Config, ConnectionConfig};
use query_gate::server::app_from_config;
use serde_json::{json, Value as JsonValue};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection};
use std::sync::Arc;
use tempfile::TempDir;

const SEED: &str = r#"
CREATE TABLE people (ID INTEGER PRIMARY KEY, NAME TEXT, BORN DATE, ACTIVE BOOLEAN);
INSERT INTO people VALUES (1, 'Ana', '1990-01-02', 1);
INSERT INTO people VALUES (2, 'Bruno', NULL, 0);
INSERT INTO people VALUES (3, 'Carla', '1985-07-30', 1);
CREATE TABLE updated_log (ID INTEGER, NOTE TEXT);
INSERT INTO updated_log VALUES (10, 'first');
"#;

/// A seeded SQLite database living in a temporary directory.
pub struct TestDb {
    pub dir: TempDir,
    pub dsn: String,
}

impl TestDb {
    pub async fn seeded() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gate.db");

        let mut conn = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .connect()
            .await
            .unwrap();
        sqlx::raw_sql(SEED).execute(&mut conn).await.unwrap();
        conn.close().await.unwrap();

        let dsn = format!("sqlite://{}", path.display());
        Self { dir, dsn }
    }

    /// Builds the application against this database.
    pub fn app(&self, paginate: bool) -> (Router, Arc<MemorySink>) {
        let mut config = Config::default();
        config.database = ConnectionConfig::from_dsn(self.dsn.clone());
        config.server.paginate = paginate;

        let sink = Arc::new(MemorySink::new());
        let app = app_from_config(&config, AuditLog::new(sink.clone())).unwrap();
        (app, sink)
    }

    /// Counts rows in `people` through a side connection.
    pub async fn people_count(&self) -> i64 {
        let mut conn = SqliteConnectOptions::new()
            .filename(self.dir.path().join("gate.db"))
            .connect()
            .await
            .unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM people")
            .fetch_one(&mut conn)
            .await
            .unwrap();
        conn.close().await.unwrap();
        count
    }
}

pub fn execute_request(uri: &str, query: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "query": query }).to_string()))
        .unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, JsonValue) {
    use tower::ServiceExt;

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

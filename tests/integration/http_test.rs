//! End-to-end tests of `POST /execute` against SQLite.

use super::common::{execute_request, send, TestDb};
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use query_gate::audit::Severity;
use query_gate::error::{EXECUTION_DETAIL, REJECTED_DETAIL};
use serde_json::json;

#[tokio::test]
async fn test_plain_mode_returns_all_rows() {
    let db = TestDb::seeded().await;
    let (app, sink) = db.app(false);

    let (status, body) = send(
        app,
        execute_request("/execute", "SELECT ID, NAME, BORN FROM people ORDER BY ID"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "result": [
                {"ID": 1, "NAME": "Ana", "BORN": "1990-01-02"},
                {"ID": 2, "NAME": "Bruno", "BORN": null},
                {"ID": 3, "NAME": "Carla", "BORN": "1985-07-30"}
            ]
        })
    );

    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, Severity::Info);
}

#[tokio::test]
async fn test_blob_values_are_returned_not_nulled() {
    let db = TestDb::seeded().await;
    let (app, _) = db.app(false);

    let (status, body) = send(
        app,
        execute_request("/execute", "SELECT X'414243' AS b, NULL AS n"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "result": [{"b": "QUJD", "n": null}] }));
}

#[tokio::test]
async fn test_paginated_mode_windows_rows() {
    let db = TestDb::seeded().await;
    let (app, sink) = db.app(true);

    let (status, body) = send(
        app,
        execute_request(
            "/execute?limit=2&offset=1",
            "SELECT ID, NAME FROM people ORDER BY ID",
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "resultados": [
                {"ID": 2, "NAME": "Bruno"},
                {"ID": 3, "NAME": "Carla"}
            ],
            "limit": 2,
            "offset": 1
        })
    );
    assert!(sink.entries()[0]
        .message
        .contains("SELECT ID, NAME FROM people ORDER BY ID LIMIT 2 OFFSET 1"));
}

#[tokio::test]
async fn test_boolean_column() {
    let db = TestDb::seeded().await;
    let (app, _) = db.app(false);

    let (status, body) = send(
        app,
        execute_request("/execute", "SELECT ACTIVE FROM people WHERE ID = 2"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "result": [ {"ACTIVE": false} ] }));
}

#[tokio::test]
async fn test_identifier_containing_keyword_is_allowed() {
    let db = TestDb::seeded().await;
    let (app, _) = db.app(false);

    let (status, body) = send(app, execute_request("/execute", "SELECT * FROM UPDATED_LOG")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "result": [ {"ID": 10, "NOTE": "first"} ] }));
}

#[tokio::test]
async fn test_write_attempts_are_rejected_and_leave_data_intact() {
    let db = TestDb::seeded().await;

    for query in [
        "DELETE FROM people",
        "SELECT 1; DELETE FROM people",
        "select * from people; drop table people",
        "   ",
    ] {
        let (app, sink) = db.app(false);
        let (status, body) = send(app, execute_request("/execute", query)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{query}");
        assert_eq!(body, json!({ "detail": REJECTED_DETAIL }));
        assert_eq!(sink.entries()[0].severity, Severity::Warning);
    }

    assert_eq!(db.people_count().await, 3);
}

#[tokio::test]
async fn test_database_error_is_generic_and_audited() {
    let db = TestDb::seeded().await;
    let (app, sink) = db.app(false);

    let (status, body) = send(
        app,
        execute_request("/execute", "SELECT * FROM missing_table"),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "detail": EXECUTION_DETAIL }));

    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, Severity::Error);
    assert!(entries[0].message.contains("SELECT * FROM missing_table"));
    assert!(entries[0].message.contains("missing_table"));
}

#[tokio::test]
async fn test_duplicate_column_names_collapse_to_last_value() {
    let db = TestDb::seeded().await;
    let (app, _) = db.app(false);

    let (status, body) = send(
        app,
        execute_request("/execute", "SELECT ID, NAME AS ID FROM people WHERE ID = 1"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "result": [ {"ID": "Ana"} ] }));
}

#[tokio::test]
async fn test_existing_limit_is_not_detected() {
    let db = TestDb::seeded().await;
    let (app, sink) = db.app(true);

    let (status, body) = send(
        app,
        execute_request("/execute", "SELECT ID FROM people LIMIT 1"),
    )
    .await;

    // The rewritten statement carries two LIMIT clauses, which SQLite refuses.
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], EXECUTION_DETAIL);
    assert!(sink.entries()[0]
        .message
        .contains("SELECT ID FROM people LIMIT 1 LIMIT 10 OFFSET 0"));
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let db = TestDb::seeded().await;
    let (app, sink) = db.app(true);

    let requests = (0..3).map(|offset| {
        let app = app.clone();
        async move {
            send(
                app,
                execute_request(
                    &format!("/execute?limit=1&offset={offset}"),
                    "SELECT ID FROM people ORDER BY ID",
                ),
            )
            .await
        }
    });
    let responses = spawn_all(requests).await;

    for (offset, (status, body)) in responses.into_iter().enumerate() {
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resultados"], json!([{ "ID": offset as i64 + 1 }]));
    }
    assert_eq!(sink.entries().len(), 3);
}

async fn spawn_all<F, T>(futures: impl Iterator<Item = F>) -> Vec<T>
where
    F: std::future::Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let handles: Vec<_> = futures.map(tokio::spawn).collect();
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    results
}

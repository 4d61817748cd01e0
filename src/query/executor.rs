//! Query execution behind the read-only gate.
//!
//! Ties the classifier, the pagination rewriter and the database client
//! together and records every outcome in the audit log.

use std::sync::Arc;

use crate::audit::AuditLog;
use crate::db::{DatabaseClient, ResultSet};
use crate::error::{GateError, Result};
use crate::query::pagination::{paginate, PaginationParams};
use crate::safety::{classify, Verdict};

/// Query executor that gates, rewrites and runs caller queries.
#[derive(Clone)]
pub struct QueryExecutor {
    db: Arc<dyn DatabaseClient>,
    audit: AuditLog,
}

impl QueryExecutor {
    /// Creates a new query executor.
    pub fn new(db: Arc<dyn DatabaseClient>, audit: AuditLog) -> Self {
        Self { db, audit }
    }

    /// Checks the query against the read-only policy.
    ///
    /// Rejections are audited here so every caller gets the same trail.
    pub fn check(&self, query: &str) -> Result<()> {
        match classify(query) {
            Verdict::ReadOnly => Ok(()),
            verdict => {
                self.audit.query_rejected(query, verdict);
                Err(GateError::rejected(query))
            }
        }
    }

    /// Gates and executes the query exactly as submitted.
    pub async fn execute(&self, query: &str) -> Result<ResultSet> {
        self.check(query)?;
        self.run(query).await
    }

    /// Gates the query, appends the page window and executes it.
    pub async fn execute_paginated(
        &self,
        query: &str,
        page: PaginationParams,
    ) -> Result<ResultSet> {
        self.check(query)?;
        let statement = paginate(query, page.limit(), page.offset());
        self.run(&statement).await
    }

    /// Runs an already-accepted statement and materializes its records.
    async fn run(&self, statement: &str) -> Result<ResultSet> {
        match self.db.execute_query(statement).await {
            Ok(result) => {
                self.audit
                    .query_executed(statement, result.row_count(), result.execution_time);
                Ok(result.into_records())
            }
            Err(e) => {
                self.audit.query_failed(statement, &e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{MemorySink, Severity};
    use crate::db::{FailingDatabaseClient, MockDatabaseClient, Value};
    use pretty_assertions::assert_eq;

    fn three_rows() -> MockDatabaseClient {
        MockDatabaseClient::with_rows(
            &["ID", "NAME"],
            vec![
                vec![Value::Int(1), Value::from("Ana")],
                vec![Value::Int(2), Value::from("Bruno")],
                vec![Value::Int(3), Value::from("Carla")],
            ],
        )
    }

    fn executor_with(db: Arc<dyn DatabaseClient>) -> (QueryExecutor, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (QueryExecutor::new(db, AuditLog::new(sink.clone())), sink)
    }

    #[tokio::test]
    async fn test_execute_returns_records_in_fetch_order() {
        let db = Arc::new(three_rows());
        let (executor, sink) = executor_with(db.clone());

        let records = executor.execute("SELECT ID, NAME FROM PEOPLE").await.unwrap();

        assert_eq!(records.len(), 3);
        let names: Vec<_> = records.iter().map(|r| r.get("NAME").cloned()).collect();
        assert_eq!(
            names,
            vec![
                Some(Value::from("Ana")),
                Some(Value::from("Bruno")),
                Some(Value::from("Carla"))
            ]
        );
        for record in &records {
            assert_eq!(record.columns().collect::<Vec<_>>(), vec!["ID", "NAME"]);
        }
        assert_eq!(db.statements(), vec!["SELECT ID, NAME FROM PEOPLE".to_string()]);

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].severity, Severity::Info);
    }

    #[tokio::test]
    async fn test_rejected_query_never_reaches_database() {
        let db = Arc::new(three_rows());
        let (executor, sink) = executor_with(db.clone());

        let error = executor.execute("DROP TABLE X").await.unwrap_err();

        assert!(matches!(error, GateError::Rejected(_)));
        assert_eq!(db.invocations(), 0);
        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].severity, Severity::Warning);
        assert!(entries[0].message.contains("DROP TABLE X"));
    }

    #[tokio::test]
    async fn test_select_with_blocked_keyword_rejected() {
        let db = Arc::new(three_rows());
        let (executor, sink) = executor_with(db.clone());

        let error = executor
            .execute_paginated("SELECT 1; DELETE FROM users", PaginationParams::default())
            .await
            .unwrap_err();

        assert!(error.is_client_error());
        assert_eq!(db.invocations(), 0);
        assert!(sink.entries()[0].message.contains("DELETE"));
    }

    #[tokio::test]
    async fn test_paginated_statement_is_rewritten() {
        let db = Arc::new(three_rows());
        let (executor, sink) = executor_with(db.clone());
        let page = PaginationParams::from_raw(Some(2), Some(4)).unwrap();

        executor
            .execute_paginated("SELECT * FROM T  ", page)
            .await
            .unwrap();

        assert_eq!(
            db.statements(),
            vec!["SELECT * FROM T LIMIT 2 OFFSET 4".to_string()]
        );
        assert!(sink.entries()[0]
            .message
            .contains("SELECT * FROM T LIMIT 2 OFFSET 4"));
    }

    #[tokio::test]
    async fn test_failure_is_audited_with_statement() {
        let (executor, sink) =
            executor_with(Arc::new(FailingDatabaseClient::new("relation \"t\" does not exist")));

        let error = executor.execute("SELECT * FROM t").await.unwrap_err();

        assert!(!error.is_client_error());
        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].severity, Severity::Error);
        assert!(entries[0].message.contains("SELECT * FROM t"));
        assert!(entries[0].message.contains("relation \"t\" does not exist"));
    }
}

//! SQL executor
//!
//! Runs single batches on an already open session and ad-hoc statements on a
//! session of their own.

use std::sync::Arc;

use crate::db::connection::{Connector, Session};
use crate::error::{Error, Result};
use crate::schema::types::{Batch, BatchResult, QueryResult};

/// Leading keywords refused in read-only mode
pub const DESTRUCTIVE_KEYWORDS: [&str; 7] = [
    "INSERT", "UPDATE", "DELETE", "DROP", "ALTER", "CREATE", "TRUNCATE",
];

/// Reject `sql` if it starts with a destructive keyword.
///
/// This only looks at the first characters of the trimmed statement. A
/// mutation behind a leading comment, a CTE or a second batch is not caught,
/// so this is a guard against mistakes rather than a permission boundary.
pub fn check_read_only(sql: &str) -> Result<()> {
    let normalized = sql.trim().to_uppercase();
    if DESTRUCTIVE_KEYWORDS.iter().any(|k| normalized.starts_with(k)) {
        return Err(Error::QueryRejected(sql.to_string()));
    }
    Ok(())
}

/// Run one batch on an open session. Failures are reported in the result.
pub async fn run_batch(session: &mut dyn Session, batch: &Batch) -> BatchResult {
    match session.execute(&batch.sql).await {
        Ok(rows_affected) => BatchResult::succeeded(batch.number, rows_affected),
        Err(e) => BatchResult::failed(batch, e.driver_message()),
    }
}

/// SQL executor for ad-hoc statements. Each call opens and closes its own session.
#[derive(Clone)]
pub struct SqlExecutor {
    connector: Arc<dyn Connector>,
}

impl SqlExecutor {
    /// Create a new SQL executor
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    /// Execute a single statement, refusing destructive ones when `read_only` is set
    pub async fn execute_query(&self, sql: &str, read_only: bool) -> Result<QueryResult> {
        self.execute_query_with_params(sql, &[], read_only).await
    }

    /// Execute a statement with `@P1..@Pn` bound to `params`
    pub async fn execute_query_with_params(
        &self,
        sql: &str,
        params: &[String],
        read_only: bool,
    ) -> Result<QueryResult> {
        if read_only {
            check_read_only(sql)?;
        }

        tracing::debug!(read_only, "Executing SQL query");

        let mut session = self.connector.connect().await?;
        let outcome = session.query(sql, params).await;
        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "Failed to close database session");
        }

        let result = outcome.map_err(|e| Error::QueryError(e.driver_message()))?;
        tracing::debug!(
            columns = result.columns.len(),
            row_count = result.row_count,
            "Query completed"
        );
        Ok(result)
    }
}

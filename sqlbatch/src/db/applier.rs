//! Schema script application
//!
//! Applies a `GO`-separated script over a single session. With a transaction
//! the run is all-or-nothing and stops at the first failing batch; without one
//! every batch is attempted and failures accumulate.

use std::path::Path;
use std::sync::Arc;

use crate::db::connection::{Connector, Session, TransactionCommand};
use crate::db::executor::run_batch;
use crate::error::{Error, Result};
use crate::schema::batch::split_batches;
use crate::schema::source::ScriptSource;
use crate::schema::types::{Batch, SchemaApplicationResult};

/// Applies scripts batch by batch
#[derive(Clone)]
pub struct SchemaApplier {
    connector: Arc<dyn Connector>,
    source: Arc<dyn ScriptSource>,
}

impl SchemaApplier {
    pub fn new(connector: Arc<dyn Connector>, source: Arc<dyn ScriptSource>) -> Self {
        Self { connector, source }
    }

    /// Read the script at `path` from the script source and apply it
    pub async fn apply_schema_file(
        &self,
        path: impl AsRef<Path>,
        use_transaction: bool,
    ) -> Result<SchemaApplicationResult> {
        let path = path.as_ref();
        let script = self.source.read_script(path).await?;

        tracing::info!(path = %path.display(), "Applying schema file");
        self.apply_script(&script, use_transaction).await
    }

    /// Split `script` into batches and run them on one session.
    ///
    /// Input and connection errors are returned as `Err`. Everything that
    /// happens after the session is open is reported inside the result.
    pub async fn apply_script(
        &self,
        script: &str,
        use_transaction: bool,
    ) -> Result<SchemaApplicationResult> {
        let batches = split_batches(script);
        if batches.is_empty() {
            return Err(Error::EmptyScript);
        }

        tracing::info!(
            batches = batches.len(),
            transaction = use_transaction,
            "Starting schema application"
        );

        let mut session = self.connector.connect().await?;
        let result = run_batches(session.as_mut(), &batches, use_transaction).await;

        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "Failed to close database session");
        }

        if result.success {
            tracing::info!(
                total = result.total_batches,
                successful = result.successful_batches,
                "Schema applied successfully"
            );
        } else {
            tracing::warn!(
                total = result.total_batches,
                successful = result.successful_batches,
                failed = result.failed_batches,
                error = result.error.as_deref().unwrap_or(""),
                "Schema application completed with errors"
            );
        }

        Ok(result)
    }
}

async fn run_batches(
    session: &mut dyn Session,
    batches: &[Batch],
    use_transaction: bool,
) -> SchemaApplicationResult {
    let total = batches.len();
    let mut results = Vec::with_capacity(total);

    if use_transaction {
        if let Err(e) = session.transaction(TransactionCommand::Begin).await {
            tracing::error!(error = %e, "Failed to start transaction");
            return SchemaApplicationResult::from_batches(total, results, Some(e.to_string()));
        }
        tracing::debug!("Transaction started");
    }

    for batch in batches {
        let result = run_batch(session, batch).await;
        let failed = !result.success;

        if failed {
            tracing::error!(
                batch = batch.number,
                total,
                error = result.error.as_deref().unwrap_or(""),
                "Batch failed"
            );
        } else {
            tracing::info!(
                batch = batch.number,
                total,
                rows_affected = result.rows_affected.unwrap_or(0),
                "Batch applied"
            );
        }
        results.push(result);

        if failed && use_transaction {
            tracing::warn!(batch = batch.number, "Rolling back transaction");
            let error = match session.transaction(TransactionCommand::Rollback).await {
                Ok(()) => format!("Rolled back at batch {}", batch.number),
                Err(e) => format!(
                    "Rollback after batch {} failed: {}",
                    batch.number,
                    e
                ),
            };
            return SchemaApplicationResult::from_batches(total, results, Some(error));
        }
    }

    if use_transaction {
        if let Err(e) = session.transaction(TransactionCommand::Commit).await {
            tracing::error!(error = %e, "Failed to commit transaction");
            return SchemaApplicationResult::from_batches(total, results, Some(e.to_string()));
        }
        tracing::debug!("Transaction committed");
    }

    SchemaApplicationResult::from_batches(total, results, None)
}

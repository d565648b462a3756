//! sqlbatch: run `GO`-separated SQL Server scripts batch by batch
//!
//! Scripts are split on `GO` lines and applied over a single session, either
//! inside one transaction (stop and roll back at the first failure) or
//! best-effort (run everything, report every failure). Ad-hoc statements can be
//! run through a read-only guard that refuses obviously mutating statements.

pub mod config;
pub mod db;
pub mod error;
pub mod schema;
pub mod utils;

#[cfg(test)]
mod test;

use std::path::Path;
use std::sync::Arc;

// Re-export main types for easier access
pub use config::Config;
pub use db::{Connector, SchemaApplier, Session, SqlExecutor, TdsConnector};
pub use error::{Error, Result};
pub use schema::{
    split_batches, Batch, BatchResult, ColumnInfo, FileScriptSource, QueryResult, SchemaAnalyzer,
    SchemaApplicationResult, ScriptSource, TableInfo,
};

/// Initialize sqlbatch with the specified configuration file
pub fn init(config_path: &str) -> Result<SqlClient> {
    let config = config::load_from_file(config_path)?;
    Ok(SqlClient::new(config))
}

/// The main client for interacting with a database through sqlbatch.
///
/// Holds no connection. Every call opens its own session and closes it before returning.
#[derive(Clone)]
pub struct SqlClient {
    config: Config,
    executor: SqlExecutor,
    applier: SchemaApplier,
    analyzer: SchemaAnalyzer,
}

impl SqlClient {
    /// Create a client that talks TDS and reads scripts from the filesystem
    pub fn new(config: Config) -> Self {
        let connector = Arc::new(TdsConnector::new(config.database.clone()));
        Self::with_parts(config, connector, Arc::new(FileScriptSource))
    }

    /// Create a client over a custom connector and script source
    pub fn with_parts(
        config: Config,
        connector: Arc<dyn Connector>,
        source: Arc<dyn ScriptSource>,
    ) -> Self {
        let executor = SqlExecutor::new(Arc::clone(&connector));
        let applier = SchemaApplier::new(connector, source);
        let analyzer = SchemaAnalyzer::new(executor.clone());

        Self {
            config,
            executor,
            applier,
            analyzer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute one statement, refusing destructive ones when `read_only` is set
    pub async fn execute_query(&self, sql: &str, read_only: bool) -> Result<QueryResult> {
        self.executor.execute_query(sql, read_only).await
    }

    /// Apply script text
    pub async fn apply_script(
        &self,
        script: &str,
        use_transaction: bool,
    ) -> Result<SchemaApplicationResult> {
        self.applier.apply_script(script, use_transaction).await
    }

    /// Apply the script at `path`
    pub async fn apply_schema_file(
        &self,
        path: impl AsRef<Path>,
        use_transaction: bool,
    ) -> Result<SchemaApplicationResult> {
        self.applier.apply_schema_file(path, use_transaction).await
    }

    /// Apply the script at `path` using the configured transaction mode
    pub async fn apply_schema_file_with_defaults(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<SchemaApplicationResult> {
        self.apply_schema_file(path, self.config.apply.use_transaction)
            .await
    }

    pub async fn list_tables(&self) -> Result<Vec<TableInfo>> {
        self.analyzer.list_tables().await
    }

    pub async fn table_exists(&self, table: &str, schema: Option<&str>) -> Result<bool> {
        self.analyzer.table_exists(table, schema).await
    }

    pub async fn get_table_schema(
        &self,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<ColumnInfo>> {
        self.analyzer.get_table_schema(table, schema).await
    }

    pub async fn drop_table(&self, table: &str, schema: Option<&str>, confirm: bool) -> Result<()> {
        self.analyzer.drop_table(table, schema, confirm).await
    }
}

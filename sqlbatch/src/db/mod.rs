//! Database module for sqlbatch
//!
//! This module handles sessions, statement execution and script application.

pub mod applier;
pub mod connection;
pub mod executor;

#[cfg(test)]
pub(crate) mod mock;

// Re-export key types
pub use applier::SchemaApplier;
pub use connection::{Connector, DatabaseConnection, Session, TdsConnector, TransactionCommand};
pub use executor::{check_read_only, run_batch, SqlExecutor};

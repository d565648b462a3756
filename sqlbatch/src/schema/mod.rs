//! Schema module for sqlbatch
//!
//! This module handles script splitting, script sources and introspection.

pub mod analyzer;
pub mod batch;
pub mod source;
pub mod types;

// Re-export key types
pub use analyzer::SchemaAnalyzer;
pub use batch::split_batches;
pub use source::{FileScriptSource, ScriptSource};
pub use types::{
    Batch, BatchResult, ColumnInfo, QueryResult, Row, SchemaApplicationResult, TableInfo,
};

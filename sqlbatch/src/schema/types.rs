//! Type definitions for scripts, batches and query results

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Number of leading characters of a failed batch kept for diagnostics
pub const SQL_PREVIEW_CHARS: usize = 200;

/// One `GO`-delimited unit of a script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// 1-based position among the batches that survived filtering
    pub number: usize,
    pub sql: String,
}

impl Batch {
    pub fn new(number: usize, sql: impl Into<String>) -> Self {
        Self {
            number,
            sql: sql.into(),
        }
    }

    /// First [`SQL_PREVIEW_CHARS`] characters of the batch text
    pub fn preview(&self) -> String {
        self.sql.chars().take(SQL_PREVIEW_CHARS).collect()
    }
}

/// Outcome of running one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub batch_number: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_affected: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_preview: Option<String>,
}

impl BatchResult {
    pub fn succeeded(batch_number: usize, rows_affected: u64) -> Self {
        Self {
            batch_number,
            success: true,
            rows_affected: Some(rows_affected),
            error: None,
            sql_preview: None,
        }
    }

    pub fn failed(batch: &Batch, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            batch_number: batch.number,
            success: false,
            rows_affected: None,
            error: Some(if error.is_empty() {
                "Unknown error".to_string()
            } else {
                error
            }),
            sql_preview: Some(batch.preview()),
        }
    }
}

/// Aggregate outcome of applying a whole script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaApplicationResult {
    pub success: bool,
    pub total_batches: usize,
    pub successful_batches: usize,
    pub failed_batches: usize,
    pub batch_results: Vec<BatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SchemaApplicationResult {
    /// Build the final result from the batch outcomes gathered so far
    pub fn from_batches(
        total_batches: usize,
        batch_results: Vec<BatchResult>,
        error: Option<String>,
    ) -> Self {
        let successful_batches = batch_results.iter().filter(|r| r.success).count();
        let failed_batches = batch_results.len() - successful_batches;

        Self {
            success: failed_batches == 0 && error.is_none(),
            total_batches,
            successful_batches,
            failed_batches,
            batch_results,
            error,
        }
    }
}

/// A single result row keyed by column name, in column order
pub type Row = IndexMap<String, serde_json::Value>;

/// Rows and column names returned by an ad-hoc query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Rows returned across all result sets. The TDS query stream does not
    /// surface DONE counts, so a bare UPDATE or DELETE reports 0 here; use a
    /// schema batch (`rows_affected`) when the affected count matters.
    pub row_count: usize,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
        }
    }
}

/// A base table and its approximate row count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub table_name: String,
    pub schema: String,
    pub row_count: i64,
}

/// Column metadata as reported by INFORMATION_SCHEMA
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub column_name: String,
    pub data_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
}

//! Database introspection
//!
//! Read-only helpers over INFORMATION_SCHEMA, all routed through [`SqlExecutor`].

use serde_json::Value;

use crate::db::executor::SqlExecutor;
use crate::error::{Error, Result};
use crate::schema::types::{ColumnInfo, QueryResult, Row, TableInfo};
use crate::utils::naming::qualified_name;

/// Schema used when a caller does not name one
pub const DEFAULT_SCHEMA: &str = "dbo";

const LIST_TABLES_SQL: &str = "SELECT t.TABLE_SCHEMA AS [schema], t.TABLE_NAME AS tableName, \
     ISNULL(p.rows, 0) AS [rowCount] \
     FROM INFORMATION_SCHEMA.TABLES t \
     LEFT JOIN sys.tables st ON t.TABLE_NAME = st.name \
     LEFT JOIN sys.partitions p ON st.object_id = p.object_id AND p.index_id IN (0, 1) \
     WHERE t.TABLE_TYPE = 'BASE TABLE' \
     ORDER BY t.TABLE_SCHEMA, t.TABLE_NAME";

const TABLE_EXISTS_SQL: &str = "SELECT COUNT(*) AS [count] FROM INFORMATION_SCHEMA.TABLES \
     WHERE TABLE_SCHEMA = @P1 AND TABLE_NAME = @P2";

const TABLE_SCHEMA_SQL: &str = "SELECT c.COLUMN_NAME AS columnName, c.DATA_TYPE AS dataType, \
     c.CHARACTER_MAXIMUM_LENGTH AS maxLength, c.IS_NULLABLE AS isNullable, \
     CASE WHEN pk.COLUMN_NAME IS NOT NULL THEN 1 ELSE 0 END AS isPrimaryKey, \
     CASE WHEN fk.COLUMN_NAME IS NOT NULL THEN 1 ELSE 0 END AS isForeignKey \
     FROM INFORMATION_SCHEMA.COLUMNS c \
     LEFT JOIN (SELECT ku.TABLE_SCHEMA, ku.TABLE_NAME, ku.COLUMN_NAME \
         FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc \
         JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE ku \
           ON tc.CONSTRAINT_TYPE = 'PRIMARY KEY' AND tc.CONSTRAINT_NAME = ku.CONSTRAINT_NAME) pk \
       ON c.TABLE_SCHEMA = pk.TABLE_SCHEMA AND c.TABLE_NAME = pk.TABLE_NAME AND c.COLUMN_NAME = pk.COLUMN_NAME \
     LEFT JOIN (SELECT ku.TABLE_SCHEMA, ku.TABLE_NAME, ku.COLUMN_NAME \
         FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc \
         JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE ku \
           ON tc.CONSTRAINT_TYPE = 'FOREIGN KEY' AND tc.CONSTRAINT_NAME = ku.CONSTRAINT_NAME) fk \
       ON c.TABLE_SCHEMA = fk.TABLE_SCHEMA AND c.TABLE_NAME = fk.TABLE_NAME AND c.COLUMN_NAME = fk.COLUMN_NAME \
     WHERE c.TABLE_SCHEMA = @P1 AND c.TABLE_NAME = @P2 \
     ORDER BY c.ORDINAL_POSITION";

/// Schema analyzer for database introspection
#[derive(Clone)]
pub struct SchemaAnalyzer {
    executor: SqlExecutor,
}

impl SchemaAnalyzer {
    /// Create a new schema analyzer
    pub fn new(executor: SqlExecutor) -> Self {
        Self { executor }
    }

    /// List base tables with their row counts
    pub async fn list_tables(&self) -> Result<Vec<TableInfo>> {
        let result = self.executor.execute_query(LIST_TABLES_SQL, true).await?;

        Ok(result
            .rows
            .iter()
            .map(|row| TableInfo {
                table_name: text(row, "tableName"),
                schema: text(row, "schema"),
                row_count: integer(row, "rowCount").unwrap_or(0),
            })
            .collect())
    }

    /// Check whether `schema.table` exists
    pub async fn table_exists(&self, table: &str, schema: Option<&str>) -> Result<bool> {
        let result = self.query_table(TABLE_EXISTS_SQL, table, schema).await?;
        Ok(first_count(&result) > 0)
    }

    /// Column metadata for `schema.table`, in ordinal order
    pub async fn get_table_schema(
        &self,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<ColumnInfo>> {
        let result = self.query_table(TABLE_SCHEMA_SQL, table, schema).await?;

        Ok(result
            .rows
            .iter()
            .map(|row| ColumnInfo {
                column_name: text(row, "columnName"),
                data_type: text(row, "dataType"),
                max_length: integer(row, "maxLength"),
                is_nullable: text(row, "isNullable").eq_ignore_ascii_case("YES"),
                is_primary_key: integer(row, "isPrimaryKey") == Some(1),
                is_foreign_key: integer(row, "isForeignKey") == Some(1),
            })
            .collect())
    }

    /// Drop `schema.table`. Refused unless `confirm` is set.
    pub async fn drop_table(&self, table: &str, schema: Option<&str>, confirm: bool) -> Result<()> {
        let schema = schema.unwrap_or(DEFAULT_SCHEMA);
        if !confirm {
            return Err(Error::ConfirmationRequired("Table drop".to_string()));
        }
        if !self.table_exists(table, Some(schema)).await? {
            return Err(Error::TableNotFound(format!("[{}].[{}]", schema, table)));
        }

        let sql = format!("DROP TABLE {}", qualified_name(schema, table));
        tracing::warn!(table = %sql, "Dropping table");
        self.executor.execute_query(&sql, false).await?;
        Ok(())
    }

    async fn query_table(
        &self,
        sql: &str,
        table: &str,
        schema: Option<&str>,
    ) -> Result<QueryResult> {
        let params = [
            schema.unwrap_or(DEFAULT_SCHEMA).to_string(),
            table.to_string(),
        ];
        self.executor.execute_query_with_params(sql, &params, true).await
    }
}

fn text(row: &Row, column: &str) -> String {
    match row.get(column) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn integer(row: &Row, column: &str) -> Option<i64> {
    row.get(column).and_then(Value::as_i64)
}

fn first_count(result: &QueryResult) -> i64 {
    result
        .rows
        .first()
        .and_then(|row| row.values().next())
        .and_then(Value::as_i64)
        .unwrap_or(0)
}

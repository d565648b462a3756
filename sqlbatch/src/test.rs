//! Tests for sqlbatch
//!
//! End-to-end scenarios through [`SqlClient`] against the recording mock connector.

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Write;
    use std::sync::Arc;

    use crate::db::mock::MockConnector;
    use crate::{Config, Error, FileScriptSource, QueryResult, SqlClient};

    fn test_config() -> Config {
        let config_str = r###"
        [database]
        server = "localhost"
        database = "sqlbatch_test"
        user = "sa"
        password = "Passw0rd!"
        timeout_seconds = 5

        [apply]
        use_transaction = true
        "###;

        toml::from_str(config_str).expect("Failed to parse test config")
    }

    fn client(connector: &MockConnector) -> SqlClient {
        SqlClient::with_parts(
            test_config(),
            Arc::new(connector.clone()),
            Arc::new(FileScriptSource),
        )
    }

    const SCHEMA: &str = r#"-- TaskMaster schema
CREATE TABLE dbo.Projects (
    Id INT IDENTITY PRIMARY KEY,
    Name NVARCHAR(200) NOT NULL
);
GO

-- seed data
INSERT INTO dbo.Projects (Name) VALUES (N'Inbox');
GO

CREATE VIEW dbo.ProjectNames AS SELECT Name FROM dbo.Projects;
go
"#;

    #[fixture]
    fn schema_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".sql").tempfile().unwrap();
        file.write_all(SCHEMA.as_bytes()).unwrap();
        file
    }

    #[rstest]
    #[tokio::test]
    async fn applies_schema_file_in_one_transaction(schema_file: tempfile::NamedTempFile) {
        let connector = MockConnector::new().with_rows_affected(1);
        let result = client(&connector)
            .apply_schema_file_with_defaults(schema_file.path())
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.total_batches, 3);
        assert_eq!(
            result.batch_results.iter().map(|r| r.batch_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );

        let commands = connector.commands();
        assert_eq!(commands.first().map(String::as_str), Some("BEGIN TRANSACTION"));
        assert_eq!(commands.last().map(String::as_str), Some("COMMIT TRANSACTION"));
        assert!(commands[1].starts_with("EXECUTE -- TaskMaster schema\nCREATE TABLE dbo.Projects"));
        assert_eq!(connector.connects(), 1);
        assert_eq!(connector.closes(), 1);
    }

    #[rstest]
    #[case(true, 1, 1, 2)]
    #[case(false, 2, 1, 3)]
    #[tokio::test]
    async fn second_batch_failure(
        schema_file: tempfile::NamedTempFile,
        #[case] use_transaction: bool,
        #[case] successful: usize,
        #[case] failed: usize,
        #[case] attempted: usize,
    ) {
        let connector = MockConnector::new().fail_on(
            "INSERT INTO dbo.Projects",
            "Cannot insert the value NULL into column 'Id'.",
        );
        let result = client(&connector)
            .apply_schema_file(schema_file.path(), use_transaction)
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.successful_batches, successful);
        assert_eq!(result.failed_batches, failed);
        assert_eq!(result.batch_results.len(), attempted);
        assert_eq!(
            connector.commands().contains(&"ROLLBACK TRANSACTION".to_string()),
            use_transaction
        );
        assert_eq!(connector.closes(), 1);
    }

    #[tokio::test]
    async fn separator_and_comment_only_script_is_empty() {
        let connector = MockConnector::new();
        let err = client(&connector)
            .apply_script("GO\n-- nothing here\nGO\n\n-- or here\n", false)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::EmptyScript));
        assert_eq!(connector.connects(), 0);
    }

    #[tokio::test]
    async fn read_only_query_guard() {
        let connector = MockConnector::new()
            .with_query_result(QueryResult::new(vec!["".to_string()], Vec::new()));
        let client = client(&connector);

        let err = client.execute_query("DROP TABLE Foo", true).await.unwrap_err();
        assert!(matches!(err, Error::QueryRejected(_)));
        assert_eq!(connector.connects(), 0);

        let result = client.execute_query("  select 1", true).await.unwrap();
        assert_eq!(result.row_count, 0);
        assert_eq!(connector.connects(), 1);
        assert_eq!(connector.closes(), 1);
    }

    #[tokio::test]
    async fn every_operation_gets_its_own_session() {
        let connector = MockConnector::new();
        let client = client(&connector);

        client.execute_query("SELECT 1", false).await.unwrap();
        client.apply_script("SELECT 2;", false).await.unwrap();
        client.list_tables().await.unwrap();

        assert_eq!(connector.connects(), 3);
        assert_eq!(connector.closes(), 3);
    }
}

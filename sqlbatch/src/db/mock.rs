//! In-memory connector that records every round-trip, for tests

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::db::connection::{Connector, Session, TransactionCommand};
use crate::error::{Error, Result};
use crate::schema::types::QueryResult;

#[derive(Default)]
struct MockState {
    commands: Vec<String>,
    connects: usize,
    closes: usize,
    refuse_connections: bool,
    failures: Vec<(String, String)>,
    failing_transactions: Vec<TransactionCommand>,
    rows_affected: u64,
    query_results: Vec<(String, QueryResult)>,
    default_result: QueryResult,
}

#[derive(Clone, Default)]
pub(crate) struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any statement containing `pattern` with `message`
    pub fn fail_on(self, pattern: &str, message: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .push((pattern.to_string(), message.to_string()));
        self
    }

    pub fn fail_transaction(self, command: TransactionCommand) -> Self {
        self.state.lock().unwrap().failing_transactions.push(command);
        self
    }

    pub fn refuse_connections(self) -> Self {
        self.state.lock().unwrap().refuse_connections = true;
        self
    }

    pub fn with_rows_affected(self, rows: u64) -> Self {
        self.state.lock().unwrap().rows_affected = rows;
        self
    }

    pub fn with_query_result(self, result: QueryResult) -> Self {
        self.state.lock().unwrap().default_result = result;
        self
    }

    /// Answer statements containing `pattern` with `result`
    pub fn answer(self, pattern: &str, result: QueryResult) -> Self {
        self.state
            .lock()
            .unwrap()
            .query_results
            .push((pattern.to_string(), result));
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn connects(&self) -> usize {
        self.state.lock().unwrap().connects
    }

    pub fn closes(&self) -> usize {
        self.state.lock().unwrap().closes
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self) -> Result<Box<dyn Session>> {
        let mut state = self.state.lock().unwrap();
        if state.refuse_connections {
            return Err(Error::ConnectionError("Login failed for user 'sa'.".to_string()));
        }
        state.connects += 1;
        Ok(Box::new(MockSession {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockSession {
    state: Arc<Mutex<MockState>>,
}

impl MockSession {
    fn record(&self, kind: &str, sql: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.commands.push(format!("{} {}", kind, sql));
        match state.failures.iter().find(|(pattern, _)| sql.contains(pattern.as_str())) {
            Some((_, message)) => Err(Error::DatabaseError(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Session for MockSession {
    async fn execute(&mut self, sql: &str) -> Result<u64> {
        self.record("EXECUTE", sql)?;
        Ok(self.state.lock().unwrap().rows_affected)
    }

    async fn query(&mut self, sql: &str, params: &[String]) -> Result<QueryResult> {
        let recorded = if params.is_empty() {
            sql.to_string()
        } else {
            format!("{} [{}]", sql, params.join(", "))
        };
        self.record("QUERY", &recorded)?;

        let state = self.state.lock().unwrap();
        Ok(state
            .query_results
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_else(|| state.default_result.clone()))
    }

    async fn transaction(&mut self, command: TransactionCommand) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.commands.push(command.as_sql().to_string());
        if state.failing_transactions.contains(&command) {
            return Err(Error::TransactionError(format!(
                "{} failed",
                command.as_sql()
            )));
        }
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.state.lock().unwrap().closes += 1;
        Ok(())
    }
}

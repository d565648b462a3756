//! Database connection handling
//!
//! A [`Session`] is one authenticated TDS connection owned by exactly one
//! operation. [`Connector`] opens a fresh session for every operation; nothing
//! is pooled or reused.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use futures::TryStreamExt;
use serde_json::Value;
use std::time::Duration;
use tiberius::{AuthMethod, Client, ColumnData, EncryptionLevel, FromSql, Query, QueryItem};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::config::DatabaseConfig;
use crate::error::{tds_message, Error, Result};
use crate::schema::types::{QueryResult, Row};

/// Transaction control statements issued around a script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionCommand {
    Begin,
    Commit,
    Rollback,
}

impl TransactionCommand {
    pub fn as_sql(&self) -> &'static str {
        match self {
            TransactionCommand::Begin => "BEGIN TRANSACTION",
            TransactionCommand::Commit => "COMMIT TRANSACTION",
            TransactionCommand::Rollback => "ROLLBACK TRANSACTION",
        }
    }
}

/// One live connection. Every method is a single round-trip.
#[async_trait]
pub trait Session: Send {
    /// Run a batch as one command and return the number of rows it affected
    async fn execute(&mut self, sql: &str) -> Result<u64>;

    /// Run a statement and collect every result set it produces.
    ///
    /// `params` bind to `@P1`, `@P2`, ... in order.
    async fn query(&mut self, sql: &str, params: &[String]) -> Result<QueryResult>;

    async fn transaction(&mut self, command: TransactionCommand) -> Result<()>;

    async fn close(self: Box<Self>) -> Result<()>;
}

/// Opens sessions on demand
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Session>>;
}

/// Opens [`DatabaseConnection`]s from a [`DatabaseConfig`]
#[derive(Debug, Clone)]
pub struct TdsConnector {
    config: DatabaseConfig,
}

impl TdsConnector {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for TdsConnector {
    async fn connect(&self) -> Result<Box<dyn Session>> {
        let connection = DatabaseConnection::connect(&self.config).await?;
        Ok(Box::new(connection))
    }
}

/// A TDS session to SQL Server
pub struct DatabaseConnection {
    client: Client<Compat<TcpStream>>,
    request_timeout: Duration,
}

impl DatabaseConnection {
    /// Open an encrypted, SQL-authenticated connection
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let request_timeout = config.request_timeout();

        let mut tds = tiberius::Config::new();
        tds.host(&config.server);
        tds.port(config.port());
        tds.database(&config.database);
        tds.authentication(AuthMethod::sql_server(&config.user, &config.password));
        tds.encryption(EncryptionLevel::Required);
        if config.trust_server_certificate() {
            tds.trust_cert();
        }

        tracing::debug!(
            server = %config.server,
            port = config.port(),
            database = %config.database,
            "Connecting to database"
        );

        let client = timeout(request_timeout, async {
            let tcp = TcpStream::connect(tds.get_addr()).await?;
            tcp.set_nodelay(true)?;
            let client = Client::connect(tds, tcp.compat_write()).await?;
            Ok::<_, Error>(client)
        })
        .await
        .map_err(|_| Error::ConnectionError(format!(
            "timed out after {} seconds",
            request_timeout.as_secs()
        )))?
        .map_err(|e| Error::ConnectionError(e.driver_message()))?;

        Ok(Self {
            client,
            request_timeout,
        })
    }
}

#[async_trait]
impl Session for DatabaseConnection {
    async fn execute(&mut self, sql: &str) -> Result<u64> {
        let limit = self.request_timeout;
        let result = timeout(limit, self.client.execute(sql, &[]))
            .await
            .map_err(|_| Error::Timeout(limit.as_secs()))?
            .map_err(driver_error)?;

        Ok(result.total())
    }

    async fn query(&mut self, sql: &str, params: &[String]) -> Result<QueryResult> {
        let limit = self.request_timeout;
        let client = &mut self.client;

        let mut query = Query::new(sql);
        for param in params {
            query.bind(param.as_str());
        }

        timeout(limit, async move {
            let mut stream = query.query(client).await?;
            let mut columns = Vec::new();
            let mut rows = Vec::new();

            while let Some(item) = stream.try_next().await? {
                match item {
                    QueryItem::Metadata(meta) => {
                        columns.extend(meta.columns().iter().map(|c| c.name().to_string()));
                    }
                    QueryItem::Row(row) => {
                        let mut values = Row::new();
                        for (column, data) in row.cells() {
                            values.insert(column.name().to_string(), cell_to_json(data));
                        }
                        rows.push(values);
                    }
                }
            }

            Ok::<_, tiberius::error::Error>(QueryResult::new(columns, rows))
        })
        .await
        .map_err(|_| Error::Timeout(limit.as_secs()))?
        .map_err(driver_error)
    }

    async fn transaction(&mut self, command: TransactionCommand) -> Result<()> {
        let limit = self.request_timeout;
        let client = &mut self.client;

        timeout(limit, async move {
            client.simple_query(command.as_sql()).await?.into_results().await?;
            Ok::<_, tiberius::error::Error>(())
        })
        .await
        .map_err(|_| Error::Timeout(limit.as_secs()))?
        .map_err(|e| Error::TransactionError(tds_message(&e)))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.client.close().await.map_err(driver_error)
    }
}

fn driver_error(error: tiberius::error::Error) -> Error {
    Error::DatabaseError(tds_message(&error))
}

/// Convert a TDS cell into a JSON value. Temporal values become ISO-like strings.
fn cell_to_json(data: &ColumnData<'static>) -> Value {
    match data {
        ColumnData::U8(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::I16(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::I32(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::I64(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::F32(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::F64(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::Bit(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::String(v) => v
            .as_ref()
            .map(|s| Value::String(s.to_string()))
            .unwrap_or(Value::Null),
        ColumnData::Guid(v) => v
            .map(|g| Value::String(g.to_string()))
            .unwrap_or(Value::Null),
        ColumnData::Binary(v) => v
            .as_ref()
            .map(|b| Value::from(b.to_vec()))
            .unwrap_or(Value::Null),
        ColumnData::Numeric(v) => v.map(|n| Value::from(f64::from(n))).unwrap_or(Value::Null),
        ColumnData::Xml(v) => v
            .as_ref()
            .map(|x| Value::String(x.to_string()))
            .unwrap_or(Value::Null),
        other => temporal_to_json(other),
    }
}

fn temporal_to_json(data: &ColumnData<'static>) -> Value {
    if let Ok(Some(v)) = DateTime::<FixedOffset>::from_sql(data) {
        return Value::String(v.to_rfc3339());
    }
    if let Ok(Some(v)) = NaiveDateTime::from_sql(data) {
        return Value::String(v.to_string());
    }
    if let Ok(Some(v)) = NaiveDate::from_sql(data) {
        return Value::String(v.to_string());
    }
    if let Ok(Some(v)) = NaiveTime::from_sql(data) {
        return Value::String(v.to_string());
    }
    Value::Null
}

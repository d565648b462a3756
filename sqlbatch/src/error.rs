//! Error types for sqlbatch

use thiserror::Error;

/// Result type for sqlbatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for sqlbatch
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database connection failed: {0}")]
    ConnectionError(String),

    /// A statement or batch failed on the server. Carries the driver message as-is.
    #[error("{0}")]
    DatabaseError(String),

    #[error("Query rejected: Destructive operations not allowed in read-only mode")]
    QueryRejected(String),

    #[error("Query execution failed: {0}")]
    QueryError(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Transaction error: {0}")]
    TransactionError(String),

    #[error("Schema file not found: {0}")]
    ScriptNotFound(String),

    #[error("No executable SQL found")]
    EmptyScript,

    #[error("{0} requires confirmation")]
    ConfirmationRequired(String),

    #[error("Table does not exist: {0}")]
    TableNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TDS error: {0}")]
    TdsError(#[from] tiberius::error::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl Error {
    /// The message the server (or driver) reported, without any wrapping prefix.
    pub fn driver_message(&self) -> String {
        match self {
            Error::DatabaseError(msg) | Error::QueryError(msg) => msg.clone(),
            Error::TdsError(err) => tds_message(err),
            other => other.to_string(),
        }
    }
}

/// Extract the server-side message from a TDS error, falling back to its display form.
pub(crate) fn tds_message(error: &tiberius::error::Error) -> String {
    match error {
        tiberius::error::Error::Server(token) => token.message().to_string(),
        other => other.to_string(),
    }
}

/// Convert Serde JSON errors to sqlbatch errors
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::SerializationError(error.to_string())
    }
}

/// Convert TOML deserialization errors to sqlbatch errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::ConfigError(error.to_string())
    }
}

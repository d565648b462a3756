use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

use sqlbatch::config::{self, Config};
use sqlbatch::utils::logging;
use sqlbatch::SqlClient;

#[derive(Parser)]
#[command(name = "sqlbatch", version, about = "Run GO-separated SQL Server scripts and guarded queries")]
struct Cli {
    /// TOML configuration file. Without it, DB_SERVER, DB_NAME, DB_USER and DB_PASSWORD are read from the environment (and .env).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a single statement and print its rows
    Query {
        sql: String,
        /// Refuse INSERT, UPDATE, DELETE, DROP, ALTER, CREATE and TRUNCATE
        #[arg(long)]
        read_only: bool,
    },
    /// Apply a schema file batch by batch
    Apply {
        file: PathBuf,
        /// Run best-effort instead of inside one transaction
        #[arg(long)]
        no_transaction: bool,
    },
    /// List base tables with row counts
    Tables,
    /// Check whether a table exists
    Exists {
        table: String,
        #[arg(long)]
        schema: Option<String>,
    },
    /// Show column metadata for a table
    Describe {
        table: String,
        #[arg(long)]
        schema: Option<String>,
    },
    /// Drop a table
    Drop {
        table: String,
        #[arg(long)]
        schema: Option<String>,
        /// Required; the drop is refused without it
        #[arg(long)]
        confirm: bool,
    },
}

#[derive(Serialize)]
struct Exists {
    exists: bool,
}

#[derive(Serialize)]
struct Dropped {
    dropped: String,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => {
            let path = path.to_string_lossy();
            config::load_from_file(&path).with_context(|| format!("Failed to load {}", path))
        }
        None => {
            dotenvy::dotenv().ok();
            Config::from_env().context("Failed to read database settings from the environment")
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    logging::init_logging(&config.logging)?;

    let client = SqlClient::new(config);

    match cli.command {
        Command::Query { sql, read_only } => {
            let read_only = read_only || client.config().query.read_only;
            tracing::info!(read_only, "Executing SQL query");
            print_json(&client.execute_query(&sql, read_only).await?)?;
        }
        Command::Apply {
            file,
            no_transaction,
        } => {
            let use_transaction = !no_transaction && client.config().apply.use_transaction;
            let result = client.apply_schema_file(&file, use_transaction).await?;
            print_json(&result)?;
            if !result.success {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Tables => {
            print_json(&client.list_tables().await?)?;
        }
        Command::Exists { table, schema } => {
            let exists = client.table_exists(&table, schema.as_deref()).await?;
            print_json(&Exists { exists })?;
        }
        Command::Describe { table, schema } => {
            print_json(&client.get_table_schema(&table, schema.as_deref()).await?)?;
        }
        Command::Drop {
            table,
            schema,
            confirm,
        } => {
            client.drop_table(&table, schema.as_deref(), confirm).await?;
            let schema = schema.as_deref().unwrap_or(sqlbatch::schema::analyzer::DEFAULT_SCHEMA);
            print_json(&Dropped {
                dropped: format!("[{}].[{}]", schema, table),
            })?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

//! Logging utilities for sqlbatch
//!
//! This module provides logging setup and configuration. Output goes to stderr
//! or a file; stdout is left to the CLI's JSON results.

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

/// Parse a level name, defaulting to INFO
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Initialize logging based on configuration
pub fn init_logging(config: &Option<LoggingConfig>) -> Result<()> {
    let config = match config {
        Some(cfg) => cfg,
        None => return init_default(),
    };

    let level = parse_level(&config.level);
    let directive: Directive = format!("sqlbatch={}", level.as_str().to_lowercase())
        .parse()
        .map_err(|e| Error::ConfigError(format!("Invalid log level: {}", e)))?;
    let env_filter = EnvFilter::from_default_env().add_directive(directive);
    let json = config.format.eq_ignore_ascii_case("json");

    if let Some(file_path) = &config.file {
        if let Some(parent) = Path::new(file_path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = Mutex::new(File::create(file_path)?);

        if json {
            install(
                fmt::Subscriber::builder()
                    .json()
                    .with_env_filter(env_filter)
                    .with_writer(file)
                    .finish(),
            )
        } else {
            install(
                fmt::Subscriber::builder()
                    .with_env_filter(env_filter)
                    .with_ansi(false)
                    .with_writer(file)
                    .finish(),
            )
        }
    } else if config.stdout {
        if json {
            install(
                fmt::Subscriber::builder()
                    .json()
                    .with_env_filter(env_filter)
                    .with_writer(io::stdout)
                    .finish(),
            )
        } else {
            install(
                fmt::Subscriber::builder()
                    .with_env_filter(env_filter)
                    .with_writer(io::stdout)
                    .finish(),
            )
        }
    } else if json {
        install(
            fmt::Subscriber::builder()
                .json()
                .with_env_filter(env_filter)
                .with_writer(io::stderr)
                .finish(),
        )
    } else {
        install(
            fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .with_writer(io::stderr)
                .finish(),
        )
    }
}

/// Text logs on stderr filtered by `RUST_LOG`, `info` for this crate otherwise
fn init_default() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sqlbatch=info"));

    install(
        fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(io::stderr)
            .finish(),
    )
}

fn install<S>(subscriber: S) -> Result<()>
where
    S: tracing::Subscriber + Send + Sync + 'static,
{
    tracing::subscriber::set_global_default(subscriber).map_err(|e| Error::Unknown(e.to_string()))
}

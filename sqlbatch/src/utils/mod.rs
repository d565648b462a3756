//! Utilities for sqlbatch
//!
//! This module provides utility functions used across the library.

pub mod logging;
pub mod naming;

// Re-export key utility functions
pub use naming::{qualified_name, quote_identifier};

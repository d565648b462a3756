//! Script sources
//!
//! The applier never touches the filesystem itself; it asks a [`ScriptSource`]
//! for the script text.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{Error, Result};

/// Something that can hand over the full text of a script by path
#[async_trait]
pub trait ScriptSource: Send + Sync {
    /// Return the script text, or [`Error::ScriptNotFound`] when there is none at `path`
    async fn read_script(&self, path: &Path) -> Result<String>;
}

/// Reads scripts from the local filesystem as UTF-8
#[derive(Debug, Clone, Default)]
pub struct FileScriptSource;

#[async_trait]
impl ScriptSource for FileScriptSource {
    async fn read_script(&self, path: &Path) -> Result<String> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(Error::ScriptNotFound(path.display().to_string()))
            }
            Err(e) => Err(Error::IoError(e)),
        }
    }
}

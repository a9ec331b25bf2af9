//! Applies a SQL file to a database one statement at a time and reports
//! what happened.

pub mod applier;
pub mod classify;
pub mod persist;
pub mod splitter;

pub use applier::{ApplyPaths, apply_schema_file, apply_statements};
pub use classify::{StatementErrorKind, classify};
pub use splitter::{SplitMode, split_statements};

use std::future::Future;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a run before or outside the per-statement loop.
#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("Failed to read schema file {}: {source}", .path.display())]
    ReadSchema {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to connect to {target}: {message}")]
    Connect { target: String, message: String },

    #[error("Failed to write {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A single statement that the database rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementFailure {
    /// SQLSTATE, when the database reported one.
    pub code: Option<String>,
    pub message: String,
}

impl StatementFailure {
    pub fn new(code: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            code: code.map(str::to_string),
            message: message.into(),
        }
    }
}

/// One open connection that runs statements in auto-commit mode.
pub trait StatementExecutor {
    fn execute(&mut self, statement: &str) -> impl Future<Output = Result<(), StatementFailure>>;

    fn close(self) -> impl Future<Output = ()>;
}

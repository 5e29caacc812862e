//! Error types for LabMail
//!
//! One top-level enum covering every failure mode the binary reports.
//! Uses thiserror for ergonomic error handling.

use crate::mail::{DirectoryError, MailboxError, StoreError};
use thiserror::Error;

/// Result type alias for LabMail operations
pub type Result<T> = std::result::Result<T, LabMailError>;

/// Top-level error type
#[derive(Error, Debug)]
pub enum LabMailError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Mailbox operation errors (unknown recipient, empty subject,
    /// message not found)
    #[error(transparent)]
    Mail(#[from] MailboxError),

    /// Store backend errors
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Identity resolution errors
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CheckerError>;

#[derive(Error, Debug)]
pub enum CheckerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Spreadsheet could not be opened or parsed. Carries the underlying
    /// diagnostic verbatim.
    #[error("{0}")]
    DocumentOpen(String),

    #[error("Failed to create log file {path}: {source}")]
    LogCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write to log file: {0}")]
    LogWrite(std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl CheckerError {
    /// Fatal errors end the run in the `Failed` state. Input errors are
    /// rejected before a run starts.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CheckerError::InvalidInput(_))
    }
}

impl From<zip::result::ZipError> for CheckerError {
    fn from(err: zip::result::ZipError) -> Self {
        CheckerError::DocumentOpen(err.to_string())
    }
}

impl From<quick_xml::Error> for CheckerError {
    fn from(err: quick_xml::Error) -> Self {
        CheckerError::DocumentOpen(err.to_string())
    }
}

impl From<serde_json::Error> for CheckerError {
    fn from(err: serde_json::Error) -> Self {
        CheckerError::Serialization(err.to_string())
    }
}

//! Error types for the editor

use crate::formatter::FormatError;
use ecu_graph::GraphError;
use ecu_parser::ParseError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Formatter failed: {0}")]
    Format(#[from] FormatError),

    #[error("History error: {0}")]
    History(String),

    #[error("{} changed on disk since this change was recorded", .0.display())]
    HistoryConflict(PathBuf),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EditorError {
    pub fn not_found(what: impl Into<String>) -> Self {
        EditorError::NotFound(what.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        EditorError::InvalidRequest(message.into())
    }

    /// Errors caused by the request rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(self, EditorError::NotFound(_) | EditorError::InvalidRequest(_))
    }
}

impl From<serde_json::Error> for EditorError {
    fn from(e: serde_json::Error) -> Self {
        EditorError::History(e.to_string())
    }
}

pub type EditorResult<T> = Result<T, EditorError>;

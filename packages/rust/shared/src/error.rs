//! Error types for larder.
//!
//! Library crates use [`LarderError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Catalog-load failures. Fatal: reported before any session starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// A record is missing a required field or carries an empty/invalid one.
    #[error("malformed recipe at index {index}: {reason}")]
    MalformedRecipe { index: usize, reason: String },

    /// Two records share the same identifier.
    #[error("duplicate recipe id '{id}'")]
    DuplicateRecipe { id: String },
}

impl ParseError {
    /// Create a malformed-record error for the record at `index`.
    pub fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRecipe {
            index,
            reason: reason.into(),
        }
    }
}

/// Top-level error type for all larder operations.
#[derive(Debug, thiserror::Error)]
pub enum LarderError {
    /// Catalog validation failed.
    #[error("catalog error: {0}")]
    Parse(#[from] ParseError),

    /// The user query contained no usable ingredient names.
    #[error("no ingredients could be read from the query")]
    EmptyQuery,

    /// A selection referenced a recipe that is not available.
    #[error("recipe '{id}' not found")]
    RecipeNotFound { id: String },

    /// The intent classifier could not produce a verdict (transient).
    #[error("intent classifier unavailable: {message}")]
    ClassifierUnavailable { message: String },

    /// A turn was submitted for a session that does not exist.
    #[error("unknown session {id}")]
    UnknownSession { id: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The recipe document could not be read or decoded.
    #[error("document error: {message}")]
    Document { message: String },

    /// Network/HTTP error talking to a remote classifier.
    #[error("network error: {0}")]
    Network(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LarderError>;

impl LarderError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a document error from any displayable message.
    pub fn document(msg: impl Into<String>) -> Self {
        Self::Document {
            message: msg.into(),
        }
    }

    /// Create a classifier-unavailable error from any displayable message.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::ClassifierUnavailable {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ClassifierUnavailable { .. } | Self::Network(_))
    }
}

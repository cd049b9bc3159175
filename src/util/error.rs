//! Error types for the REST translation core.

use thiserror::Error;

use crate::transport::TransportError;

/// Main error type for encode, decode, traversal and resolution.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed JSON, missing key or wrong value type
    #[error("Parse error: {0}")]
    Parse(String),

    /// Recognized but unimplemented type class, filter or layout
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Selection kind that has no URL-parameter form
    #[error("{0} selection cannot be encoded as a URL parameter")]
    UnsupportedAsUrlParam(&'static str),

    /// Path or link does not resolve
    #[error("Not found: {0}")]
    NotFound(String),

    /// Descriptor or argument breaks an invariant
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Visitor callback failed
    #[error("callback failed for entry '{name}': {source}")]
    Visit {
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// Transport collaborator failure
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// JSON syntax error
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an unsupported-feature error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create an invalid-argument error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// True for `NotFound` and for a transport 404.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Transport(e) => e.is_not_found(),
            _ => false,
        }
    }
}

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

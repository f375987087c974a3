//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur while building or validating a suite.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A request path is malformed.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The offending path.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A JSON path expression is malformed.
    #[error("invalid JSON path '{path}': {reason}")]
    InvalidJsonPath {
        /// The offending expression.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A path template or amount references a capture that does not exist.
    #[error("unknown capture '{name}' in chain '{chain}'")]
    UnknownCapture {
        /// Chain name.
        chain: String,
        /// Capture name.
        name: String,
    },

    /// An effect references a probe that does not exist.
    #[error("unknown probe '{name}' in chain '{chain}'")]
    UnknownProbe {
        /// Chain name.
        chain: String,
        /// Probe name.
        name: String,
    },

    /// A scenario is structurally invalid.
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

//! Result and error types for GUIcheck.
//!
//! Two kinds of failure exist. An assertion failure means the expected UI
//! state has not been observed (yet) and is retried by the evaluator. Every
//! other variant is a hard failure: the operation could not be performed at
//! all, so retrying is pointless and the error surfaces immediately.

use crate::property::AccessError;
use thiserror::Error;

/// Result type for GUIcheck operations
pub type GuiCheckResult<T> = Result<T, GuiCheckError>;

/// The two error kinds seen by the retry evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Expected UI state not (yet) observed; retried
    Assertion,
    /// Operation impossible or misused; never retried
    Hard,
}

/// Errors that can occur in GUIcheck
#[derive(Debug, Error)]
pub enum GuiCheckError {
    /// Expected UI state was not observed
    #[error("{message}")]
    Assertion {
        /// Diagnostic message (selector, property, expected and actual values)
        message: String,
    },

    /// No getter or setter matches the accessor naming convention
    #[error("Failed to access property {property}: {type_name} has no accessor {accessor}")]
    NoSuchAccessor {
        /// Property name as given by the caller
        property: String,
        /// Derived accessor name (`getText`, `isDisable`, `setText`, ...)
        accessor: String,
        /// Toolkit type of the owner object
        type_name: String,
    },

    /// The accessor exists but invoking it failed
    #[error("Failed to access property {property}")]
    PropertyAccess {
        /// Property name
        property: String,
        /// Failure reported by the toolkit adapter
        #[source]
        source: AccessError,
    },

    /// A title, name or id pattern is not a valid regular expression
    #[error("Invalid pattern {pattern:?}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Regex compilation error
        #[source]
        source: regex::Error,
    },

    /// Work could not be run on the event-loop thread
    #[error("Event loop unavailable: {message}")]
    EventLoopUnavailable {
        /// What was being attempted
        message: String,
    },

    /// The UI platform did not come up in time
    #[error("The UI platform did not initialize within {ms}ms")]
    StartupTimeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// The wrapped object does not support the requested operation
    #[error("Unsupported operation: {message}")]
    Unsupported {
        /// Error message
        message: String,
    },

    /// The wrapped node has been dropped by the toolkit
    #[error("Node {description} is no longer part of the scene")]
    NodeDetached {
        /// Selector or id the node was found with
        description: String,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML configuration error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl GuiCheckError {
    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion {
            message: message.into(),
        }
    }

    /// Create an event-loop failure
    #[must_use]
    pub fn event_loop(message: impl Into<String>) -> Self {
        Self::EventLoopUnavailable {
            message: message.into(),
        }
    }

    /// Create an unsupported-operation failure
    #[must_use]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Error kind as seen by the retry evaluator
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Assertion { .. } => ErrorKind::Assertion,
            _ => ErrorKind::Hard,
        }
    }

    /// Whether the evaluator may try again after this error
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Assertion)
    }
}

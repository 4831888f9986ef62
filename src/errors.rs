//! Error hierarchy for the path store and its change notification layer.
//!
//! Errors are grouped by the subsystem that raises them. Every variant is a
//! local, recoverable condition handed back to the immediate caller; internal
//! invariant violations are assertions, never values of these types.

use config::ConfigError;

use crate::SubscriptionId;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Path validation and key/value operation failures
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Pattern and subscription lifecycle failures
    #[error(transparent)]
    Watch(#[from] WatchError),

    /// Configuration source or deserialization failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration values that parsed but failed validation
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Log directory or listener setup failures
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// Malformed path string
    #[error("Invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// Read or delete of a path that holds no live value
    #[error("Path not found: {0}")]
    NotFound(String),

    /// Conditional write whose expected version did not match
    #[error("Version conflict at {path}: expected {expected:?}, found {actual:?}")]
    VersionConflict {
        path: String,
        expected: Option<u64>,
        actual: Option<u64>,
    },

    /// Malformed JSON pointer
    #[error("Invalid JSON pointer {0:?}")]
    InvalidPointer(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WatchError {
    /// Malformed subscription pattern
    #[error("Invalid pattern {pattern:?}: {reason}")]
    PatternSyntax { pattern: String, reason: String },

    /// Unsubscribe or drain on an id that is unknown or no longer active
    #[error("Subscription {0} not found")]
    SubscriptionNotFound(SubscriptionId),

    /// Subscribe called without any pattern
    #[error("Subscription requires at least one pattern")]
    EmptyPatternSet,

    /// A reader already holds the subscription's queue
    #[error("Subscription {0} is already being drained")]
    DrainInProgress(SubscriptionId),
}

impl Error {
    /// Returns true when the error means "nothing lives at this path"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Store(StoreError::NotFound(_)))
    }
}

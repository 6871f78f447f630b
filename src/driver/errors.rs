//! Session error types
//!
//! [`SessionError`] covers everything that can stop a script run. Memory errors
//! are wrapped together with the location of the statement that raised them.

use crate::memory::MemoryError;
use crate::script::ast::SourceLocation;
use thiserror::Error;

/// Errors raised while executing or navigating a session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The memory manager rejected an operation
    #[error("{source} at line {}", .location.line)]
    Memory {
        source: MemoryError,
        location: SourceLocation,
    },

    /// A name was used before it was bound
    #[error("undefined name '{name}' at line {}", .location.line)]
    UndefinedBinding {
        name: String,
        location: SourceLocation,
    },

    /// A snapshot name was used where a reference was expected
    #[error("'{name}' names a snapshot, not a reference, at line {}", .location.line)]
    NotAReference {
        name: String,
        location: SourceLocation,
    },

    /// A reference name was passed to `restore`
    #[error("'{name}' names a reference, not a snapshot, at line {}", .location.line)]
    NotASnapshot {
        name: String,
        location: SourceLocation,
    },

    /// Snapshot history budget exhausted
    #[error("snapshot memory limit exceeded: {current} bytes used, limit is {limit}")]
    SnapshotLimitExceeded { current: usize, limit: usize },

    /// History navigation failed
    #[error("history operation failed: {message}")]
    HistoryOperationFailed { message: String },
}

impl SessionError {
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            SessionError::Memory { location, .. }
            | SessionError::UndefinedBinding { location, .. }
            | SessionError::NotAReference { location, .. }
            | SessionError::NotASnapshot { location, .. } => Some(location),
            SessionError::SnapshotLimitExceeded { .. }
            | SessionError::HistoryOperationFailed { .. } => None,
        }
    }

    fn history(message: &str) -> Self {
        SessionError::HistoryOperationFailed {
            message: message.to_string(),
        }
    }

    pub(crate) fn at_start() -> Self {
        Self::history("already at the beginning of the run")
    }

    pub(crate) fn at_end() -> Self {
        Self::history("no more snapshots available")
    }

    pub(crate) fn no_snapshots() -> Self {
        Self::history("no snapshots available")
    }
}

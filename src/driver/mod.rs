//! Script execution driver
//!
//! This module runs a parsed memory script against a [`MemoryManager`]:
//! - [`engine`]: The [`Session`] that executes statements and records history
//! - [`errors`]: Session error types
//!
//! # Execution Model
//!
//! Statements execute one at a time. After each one the session records a
//! transcript line and captures a [`Snapshot`] of the memory view, so the run
//! can be stepped through afterwards. The first memory error stops execution;
//! everything captured before it stays navigable.
//!
//! [`MemoryManager`]: crate::memory::MemoryManager
//! [`Snapshot`]: crate::snapshot::Snapshot

pub mod constants;
pub mod engine;
pub mod errors;

pub use engine::{Binding, Session};
pub use errors::SessionError;

use crate::memory::MemoryConfig;
use constants::DEFAULT_SNAPSHOT_LIMIT;

/// Session configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub memory: MemoryConfig,
    /// Byte budget for the snapshot history
    pub snapshot_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            memory: MemoryConfig::default(),
            snapshot_limit: DEFAULT_SNAPSHOT_LIMIT,
        }
    }
}

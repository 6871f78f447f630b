//! Error types for the versioned memory manager
//!
//! Every variant is an invariant violation on the caller's side. None of them is
//! retried or recovered inside the memory subsystem: they propagate through `?`
//! and abort whatever analysis step triggered them.

use super::Position;
use thiserror::Error;

/// Errors raised by cells, generations and the [`MemoryManager`] facade.
///
/// [`MemoryManager`]: super::manager::MemoryManager
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Read or write of a position outside the allocated range, or of a freed slot
    #[error("heap segmentation fault at position {position}")]
    HeapSegmentationFault { position: Position },

    /// Decrementing a cell that already has no references
    #[error("reference count underflow at position {position}")]
    ReferenceCountUnderflow { position: Position },

    /// Freeing a cell that is still referenced
    #[error("cell at position {position} freed while still referenced ({reference_count} references)")]
    ReferencedCellFreed {
        position: Position,
        reference_count: usize,
    },

    /// Pop on a stack with no visible elements
    #[error("pop from an empty evaluation stack")]
    EmptyStackUnderflow,

    /// An inherited stack element is no longer exposed by the ancestor
    #[error("stack element {index} is not visible to this generation")]
    StackElementNotFound { index: usize },

    /// Rollback requested on the root generation
    #[error("cannot roll back the root generation")]
    CannotRollbackRootGeneration,

    /// Restore requested with a handle produced by another memory manager
    #[error("generation handle from memory manager #{found} used with memory manager #{expected}")]
    ForeignGenerationHandle { expected: u64, found: u64 },

    /// Restore requested with a handle whose generation was already discarded
    #[error("generation handle at depth {depth} refers to a discarded generation")]
    StaleGenerationHandle { depth: usize },

    /// The configured heap capacity would be exceeded
    #[error("out of memory: heap capacity of {capacity} cells exhausted")]
    OutOfMemory { capacity: usize },
}

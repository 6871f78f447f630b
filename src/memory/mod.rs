//! Versioned memory model
//!
//! This module provides the persistent, copy-on-write memory used by the
//! backtracking analyzer:
//! - [`cell`]: A single reference-counted heap slot with free-list linkage
//! - [`stack`]: Per-generation evaluation stack segment over an inherited prefix
//! - [`heap`]: Per-generation sparse heap segment (owned cells + free list)
//! - [`generation`]: The generation chain and copy-on-write resolution through it
//! - [`manager`]: The [`MemoryManager`] facade (snapshots, rollback, restore)
//! - [`worklist`]: Range-coalesced reachability worklist
//! - [`collector`]: Generation-scoped mark-and-sweep
//! - [`value`]: The concrete [`Value`] used by the script driver and inspector
//!
//! # Generations
//!
//! Every snapshot is a new generation whose `previous` link points at the
//! generation that was current when it was taken:
//! ```text
//! root ← g1 ← g2 ← current
//! ```
//! Reads fall through the chain until a generation that owns the position is
//! found. Writes only ever touch the current generation; inherited cells are
//! shifted (cloned) into it first.

pub mod cell;
pub mod collector;
pub mod errors;
pub mod generation;
pub mod heap;
pub mod manager;
pub mod stack;
pub mod value;
pub mod worklist;

pub use cell::{Cell, CellState};
pub use collector::CollectStats;
pub use errors::MemoryError;
pub use generation::GenerationHandle;
pub use manager::{CellView, GenerationSummary, MemoryManager, MemoryView};
pub use value::Value;

use std::fmt;

/// Absolute heap position
pub type Position = usize;

/// Default heap capacity in cells
pub const DEFAULT_HEAP_CAPACITY: usize = 1 << 20;

/// Handle naming a heap position.
///
/// A reference carries no ownership: it is resolved against whatever generation
/// is current when it is dereferenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reference(Position);

impl Reference {
    pub fn new(position: Position) -> Self {
        Reference(position)
    }

    pub fn position(self) -> Position {
        self.0
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Values stored in the heap expose their outgoing references through this trait.
///
/// Reference counting on `add`/`set`/`remove` and reachability tracing during
/// collection both rely on it; nothing else about a value is inspected.
pub trait Trace {
    fn trace(&self, visit: &mut dyn FnMut(Reference));

    /// Collect the outgoing references into a vector
    fn references(&self) -> Vec<Reference> {
        let mut refs = Vec::new();
        self.trace(&mut |r| refs.push(r));
        refs
    }
}

/// Memory manager configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryConfig {
    /// Maximum number of heap positions (live or freed) a chain may address
    pub heap_capacity: usize,
}

impl MemoryConfig {
    pub fn new(heap_capacity: usize) -> Self {
        MemoryConfig { heap_capacity }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HEAP_CAPACITY)
    }
}

//! Heap segment of a generation
//!
//! A generation owns only the cells it allocated or shifted; every other
//! position is read through its ancestors. Besides those cells the segment keeps
//! the heap-wide bookkeeping as seen from this generation:
//! - `size`: high-water mark of positions ever handed out (the addressable range)
//! - `used`: number of live cells
//! - `free_head`: first slot of the free list, which may live in an ancestor
//!
//! A child starts with a copy of its parent's bookkeeping and an empty cell map.

use super::cell::Cell;
use super::Position;
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;

/// Cells owned by one generation plus its view of the allocator state
#[derive(Debug, Clone)]
pub struct HeapSegment<V> {
    cells: FxHashMap<Position, Cell<V>>,
    free_head: Option<Position>,
    size: Position,
    used: usize,
}

impl<V> HeapSegment<V> {
    /// Empty segment of a root generation
    pub fn new() -> Self {
        HeapSegment {
            cells: FxHashMap::default(),
            free_head: None,
            size: 0,
            used: 0,
        }
    }

    /// Empty segment continuing the allocator state of `parent`
    pub fn inheriting(parent: &HeapSegment<V>) -> Self {
        HeapSegment {
            cells: FxHashMap::default(),
            free_head: parent.free_head,
            size: parent.size,
            used: parent.used,
        }
    }

    /// Addressable range `[0, size)`
    pub fn size(&self) -> Position {
        self.size
    }

    /// Live cells visible from this generation
    pub fn used(&self) -> usize {
        self.used
    }

    pub fn free_head(&self) -> Option<Position> {
        self.free_head
    }

    pub fn set_free_head(&mut self, head: Option<Position>) {
        self.free_head = head;
    }

    /// Hand out the next never-used position
    pub fn grow(&mut self) -> Position {
        let position = self.size;
        self.size += 1;
        position
    }

    pub fn count_allocation(&mut self) {
        self.used += 1;
    }

    pub fn count_release(&mut self) {
        self.used = self.used.saturating_sub(1);
    }

    pub fn owns(&self, position: Position) -> bool {
        self.cells.contains_key(&position)
    }

    pub fn owned(&self, position: Position) -> Option<&Cell<V>> {
        self.cells.get(&position)
    }

    pub fn owned_mut(&mut self, position: Position) -> Option<&mut Cell<V>> {
        self.cells.get_mut(&position)
    }

    /// Take ownership of a cell (fresh allocation, shifted clone or tombstone)
    pub fn adopt(&mut self, cell: Cell<V>) -> &mut Cell<V> {
        match self.cells.entry(cell.position()) {
            Entry::Occupied(mut entry) => {
                entry.insert(cell);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(cell),
        }
    }

    /// Number of cells owned locally (live or freed)
    pub fn owned_count(&self) -> usize {
        self.cells.len()
    }

    /// Owned positions in ascending order
    pub fn owned_positions(&self) -> Vec<Position> {
        let mut positions: Vec<Position> = self.cells.keys().copied().collect();
        positions.sort_unstable();
        positions
    }

    /// Release every owned cell, bypassing reference counts
    pub fn destroy(&mut self) -> usize {
        let released = self.cells.len();
        for (_, cell) in self.cells.drain() {
            cell.destroy();
        }
        released
    }
}

impl<V> Default for HeapSegment<V> {
    fn default() -> Self {
        Self::new()
    }
}

//! Generation chain
//!
//! Generations are stored in an arena (`Vec`) and point at their ancestor by
//! index. Only the last generation of the arena is current and only it is ever
//! mutated; every earlier one is a frozen snapshot that the current generation
//! reads through.
//!
//! # Resolution
//!
//! - **Heap reads** walk `previous` links until a generation owning the position
//!   is found.
//! - **Heap writes** shift (clone) an inherited cell into the current generation
//!   before touching it, so the ancestor keeps its value.
//! - **Stack pops** below the own segment read the ancestor's value and only
//!   shrink the visible inherited prefix.

use super::cell::Cell;
use super::heap::HeapSegment;
use super::stack::StackSegment;
use super::{MemoryError, Position};

/// Identifies a frozen generation for a later [`restore_copy`].
///
/// [`restore_copy`]: super::manager::MemoryManager::restore_copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenerationHandle {
    manager_id: u64,
    depth: usize,
    serial: u64,
}

impl GenerationHandle {
    pub(crate) fn new(manager_id: u64, depth: usize, serial: u64) -> Self {
        GenerationHandle {
            manager_id,
            depth,
            serial,
        }
    }

    /// Id of the memory manager that produced this handle
    pub fn manager_id(&self) -> u64 {
        self.manager_id
    }

    /// Chain depth of the frozen generation (0 = root)
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }
}

/// One node of the version chain
#[derive(Debug, Clone)]
pub struct Generation<V> {
    previous: Option<usize>,
    serial: u64,
    stack: StackSegment<V>,
    heap: HeapSegment<V>,
}

impl<V> Generation<V> {
    fn root(serial: u64) -> Self {
        Generation {
            previous: None,
            serial,
            stack: StackSegment::new(),
            heap: HeapSegment::new(),
        }
    }

    fn child_of(parent: &Generation<V>, parent_index: usize, serial: u64) -> Self {
        Generation {
            previous: Some(parent_index),
            serial,
            stack: StackSegment::inheriting(parent.stack.len()),
            heap: HeapSegment::inheriting(&parent.heap),
        }
    }

    pub fn previous(&self) -> Option<usize> {
        self.previous
    }

    /// Unique (per manager) number of this generation
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn stack(&self) -> &StackSegment<V> {
        &self.stack
    }

    pub fn heap(&self) -> &HeapSegment<V> {
        &self.heap
    }

    /// Release every owned cell and stack value
    fn destroy(&mut self) -> usize {
        self.stack.destroy();
        self.heap.destroy()
    }
}

/// Arena of generations plus the copy-on-write resolution rules
#[derive(Debug, Clone)]
pub struct GenerationChain<V> {
    generations: Vec<Generation<V>>,
    next_serial: u64,
    heap_capacity: usize,
}

impl<V> GenerationChain<V> {
    pub fn new(heap_capacity: usize) -> Self {
        GenerationChain {
            generations: vec![Generation::root(0)],
            next_serial: 1,
            heap_capacity,
        }
    }

    /// Depth of the current generation (0 = root)
    pub fn depth(&self) -> usize {
        self.generations.len() - 1
    }

    pub fn generations(&self) -> &[Generation<V>] {
        &self.generations
    }

    pub fn current(&self) -> &Generation<V> {
        &self.generations[self.depth()]
    }

    fn current_mut(&mut self) -> &mut Generation<V> {
        let depth = self.depth();
        &mut self.generations[depth]
    }

    // ===== Chain shape =====

    /// Start a child of the current generation; returns depth and serial of the frozen one
    pub fn freeze(&mut self) -> (usize, u64) {
        let depth = self.depth();
        let frozen_serial = self.current().serial;
        let child = Generation::child_of(self.current(), depth, self.next_serial);
        self.next_serial += 1;
        self.generations.push(child);
        (depth, frozen_serial)
    }

    /// Destroy the current generation and make its parent current.
    ///
    /// Returns the number of cells the discarded generation owned.
    pub fn discard_current(&mut self) -> Result<usize, MemoryError> {
        if self.generations.len() == 1 {
            return Err(MemoryError::CannotRollbackRootGeneration);
        }
        let mut discarded = self
            .generations
            .pop()
            .ok_or(MemoryError::CannotRollbackRootGeneration)?;
        Ok(discarded.destroy())
    }

    /// Destroy every generation deeper than `depth`; returns how many were discarded
    pub fn truncate_to(&mut self, depth: usize) -> usize {
        let mut discarded = 0;
        while self.depth() > depth {
            if let Some(mut generation) = self.generations.pop() {
                generation.destroy();
                discarded += 1;
            }
        }
        discarded
    }

    /// Serial of the generation currently stored at `depth`
    pub fn serial_at(&self, depth: usize) -> Option<u64> {
        self.generations.get(depth).map(|g| g.serial)
    }

    /// Drop the whole chain and start over with an empty root
    pub fn reset(&mut self) {
        for generation in &mut self.generations {
            generation.destroy();
        }
        self.generations.clear();
        self.generations.push(Generation::root(self.next_serial));
        self.next_serial += 1;
    }

    // ===== Heap resolution =====

    /// Find the cell visible at `position` and the depth of the generation owning it
    pub fn resolve(&self, position: Position) -> Result<(usize, &Cell<V>), MemoryError> {
        if position >= self.current().heap.size() {
            return Err(MemoryError::HeapSegmentationFault { position });
        }
        let mut index = Some(self.depth());
        while let Some(i) = index {
            let generation = &self.generations[i];
            if let Some(cell) = generation.heap.owned(position) {
                return Ok((i, cell));
            }
            index = generation.previous;
        }
        Err(MemoryError::HeapSegmentationFault { position })
    }

    pub fn cell(&self, position: Position) -> Result<&Cell<V>, MemoryError> {
        self.resolve(position).map(|(_, cell)| cell)
    }

    /// Value of the live cell at `position`
    pub fn value(&self, position: Position) -> Result<&V, MemoryError> {
        self.cell(position)?.value()
    }

    /// Whether the current generation owns `position` itself
    pub fn owns(&self, position: Position) -> bool {
        self.current().heap.owns(position)
    }

    // ===== Stack resolution =====

    pub fn stack_len(&self) -> usize {
        self.current().stack.len()
    }

    /// Value at logical stack `index` as seen by the current generation
    pub fn stack_get(&self, index: usize) -> Result<&V, MemoryError> {
        self.stack_get_from(self.depth(), index)
    }

    /// Read `index` starting at generation `depth`.
    ///
    /// Fails with `StackElementNotFound` when no generation on the way down
    /// still holds the index, i.e. an ancestor's stack shrank below a view a
    /// descendant was created with.
    fn stack_get_from(&self, depth: usize, index: usize) -> Result<&V, MemoryError> {
        let mut current = Some(depth);
        while let Some(i) = current {
            let stack = &self.generations[i].stack;
            if let Some(value) = stack.get_own(index) {
                return Ok(value);
            }
            if index >= stack.inherited_len() {
                break;
            }
            current = self.generations[i].previous;
        }
        Err(MemoryError::StackElementNotFound { index })
    }

    pub fn push(&mut self, value: V) {
        self.current_mut().stack.push(value);
    }

    /// Visible stack bottom to top
    pub fn stack_values(&self) -> Result<Vec<&V>, MemoryError> {
        (0..self.stack_len()).map(|i| self.stack_get(i)).collect()
    }

    // ===== Local heap bookkeeping =====

    fn current_heap_mut(&mut self) -> &mut HeapSegment<V> {
        &mut self.current_mut().heap
    }

    /// Positions owned by the current generation, ascending
    pub fn owned_positions(&self) -> Vec<Position> {
        self.current().heap.owned_positions()
    }
}

impl<V: Clone> GenerationChain<V> {
    /// Writable cell at `position`, shifting it into the current generation first if inherited
    pub fn cell_mut(&mut self, position: Position) -> Result<&mut Cell<V>, MemoryError> {
        if !self.owns(position) {
            let shifted = {
                let cell = self.cell(position)?;
                cell.value()?;
                cell.shift()
            };
            tracing::trace!(position, "shifted inherited cell into current generation");
            return Ok(self.current_heap_mut().adopt(shifted));
        }
        let cell = self
            .current_heap_mut()
            .owned_mut(position)
            .ok_or(MemoryError::HeapSegmentationFault { position })?;
        cell.value()?;
        Ok(cell)
    }

    pub fn value_mut(&mut self, position: Position) -> Result<&mut V, MemoryError> {
        self.cell_mut(position)?.value_mut()
    }

    /// Allocate a live cell, reusing the free list before growing the heap
    pub fn alloc(&mut self, value: V) -> Result<Position, MemoryError> {
        let position = match self.current().heap.free_head() {
            Some(position) if self.owns(position) => {
                let next = self
                    .current_heap_mut()
                    .owned_mut(position)
                    .ok_or(MemoryError::HeapSegmentationFault { position })?
                    .reuse(value)?;
                self.current_heap_mut().set_free_head(next);
                position
            }
            Some(position) => {
                let inherited = self.cell(position)?;
                if !inherited.is_freed() {
                    return Err(MemoryError::HeapSegmentationFault { position });
                }
                let next = inherited.next_free();
                let heap = self.current_heap_mut();
                heap.adopt(Cell::allocate(position, value));
                heap.set_free_head(next);
                position
            }
            None => {
                if self.current().heap.size() >= self.heap_capacity {
                    return Err(MemoryError::OutOfMemory {
                        capacity: self.heap_capacity,
                    });
                }
                let heap = self.current_heap_mut();
                let position = heap.grow();
                heap.adopt(Cell::allocate(position, value));
                position
            }
        };
        self.current_heap_mut().count_allocation();
        Ok(position)
    }

    /// Free the cell at `position` in the current generation and return its value.
    ///
    /// Inherited cells are shadowed by a local tombstone; the ancestor keeps its copy.
    pub fn free(&mut self, position: Position) -> Result<V, MemoryError> {
        let reference_count = self.cell(position)?.reference_count();
        if reference_count > 0 {
            return Err(MemoryError::ReferencedCellFreed {
                position,
                reference_count,
            });
        }
        let head = self.current().heap.free_head();
        let value = self.cell_mut(position)?.free(head)?;
        let heap = self.current_heap_mut();
        heap.set_free_head(Some(position));
        heap.count_release();
        Ok(value)
    }

    /// Pop the top of the visible stack
    pub fn pop(&mut self) -> Result<V, MemoryError> {
        let (index, previous) = {
            let generation = self.current_mut();
            if let Some(value) = generation.stack.pop_own() {
                return Ok(value);
            }
            let index = generation
                .stack
                .hide_inherited()
                .ok_or(MemoryError::EmptyStackUnderflow)?;
            (index, generation.previous)
        };
        let found = previous.map(|p| self.stack_get_from(p, index).cloned());
        match found {
            Some(Ok(value)) => Ok(value),
            Some(Err(err)) => {
                self.current_mut().stack.unhide_inherited();
                Err(err)
            }
            None => {
                self.current_mut().stack.unhide_inherited();
                Err(MemoryError::StackElementNotFound { index })
            }
        }
    }
}

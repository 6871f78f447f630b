//! Memory manager facade
//!
//! [`MemoryManager`] is the only type callers talk to. It owns the generation
//! chain, applies reference-count bookkeeping to the value graph, and
//! orchestrates snapshots:
//!
//! | Operation         | Effect on the chain                                   |
//! |-------------------|-------------------------------------------------------|
//! | `freeze_copy`     | push a child of the current generation (O(1))         |
//! | `rollback_copy`   | destroy the current generation, parent becomes current |
//! | `restore_copy(h)` | destroy everything newer than `h`, `h` becomes current |
//! | `clear`           | drop the chain, start a fresh root                    |
//!
//! # Reference counting
//!
//! Storing a value increments the count of every cell it references; replacing
//! or removing a value releases those edges again. A release that brings a count
//! to zero frees the target and releases whatever the target referenced, without
//! recursion. Explicit `increase_reference_count`/`decrease_reference_count` calls
//! pin and unpin a cell for an external holder and never free it.

use super::cell::CellState;
use super::collector::{spatial_collect, CollectStats};
use super::generation::{GenerationChain, GenerationHandle};
use super::{MemoryConfig, MemoryError, Position, Reference, Trace};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_MANAGER_ID: AtomicU64 = AtomicU64::new(1);

/// Summary of one generation of the chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSummary {
    pub depth: usize,
    pub serial: u64,
    /// Cells (live or freed) the generation owns itself
    pub owned_cells: usize,
    pub own_stack: usize,
    pub inherited_stack: usize,
    pub heap_size: Position,
    pub used_cells: usize,
}

/// A visible heap cell and the depth of the generation that owns it
#[derive(Debug, Clone, PartialEq)]
pub struct CellView<V> {
    pub position: Position,
    pub owner_depth: usize,
    pub state: CellState<V>,
}

/// Read-only picture of the memory as seen from the current generation
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryView<V> {
    /// Root first, current last
    pub generations: Vec<GenerationSummary>,
    /// Visible stack, bottom to top
    pub stack: Vec<V>,
    /// How many of the bottom stack entries are inherited
    pub inherited_stack: usize,
    /// Every position of `[0, heap_size)`, ascending
    pub cells: Vec<CellView<V>>,
    pub free_head: Option<Position>,
    pub heap_size: Position,
    pub used_cells: usize,
}

impl<V> MemoryView<V> {
    /// Depth of the current generation
    pub fn depth(&self) -> usize {
        self.generations.len().saturating_sub(1)
    }
}

/// Versioned heap and evaluation stack
#[derive(Debug)]
pub struct MemoryManager<V> {
    id: u64,
    config: MemoryConfig,
    chain: GenerationChain<V>,
}

impl<V> MemoryManager<V> {
    pub fn new() -> Self {
        Self::with_config(MemoryConfig::default())
    }

    pub fn with_config(config: MemoryConfig) -> Self {
        MemoryManager {
            id: NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed),
            config,
            chain: GenerationChain::new(config.heap_capacity),
        }
    }

    /// Unique id stamped into every handle this manager produces
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Depth of the current generation (0 = root)
    pub fn depth(&self) -> usize {
        self.chain.depth()
    }

    pub fn heap_size(&self) -> Position {
        self.chain.current().heap().size()
    }

    pub fn used_cells(&self) -> usize {
        self.chain.current().heap().used()
    }

    pub fn free_head(&self) -> Option<Position> {
        self.chain.current().heap().free_head()
    }

    pub fn stack_len(&self) -> usize {
        self.chain.stack_len()
    }

    /// Stack value at `index` counted from the bottom
    pub fn peek_stack(&self, index: usize) -> Result<&V, MemoryError> {
        self.chain.stack_get(index)
    }

    pub fn get(&self, reference: Reference) -> Result<&V, MemoryError> {
        self.chain.value(reference.position())
    }

    pub fn reference_count(&self, reference: Reference) -> Result<usize, MemoryError> {
        let cell = self.chain.cell(reference.position())?;
        cell.value()?;
        Ok(cell.reference_count())
    }

    /// Whether the current generation owns the cell (allocated or shifted here)
    pub fn is_local(&self, reference: Reference) -> bool {
        self.chain.owns(reference.position())
    }

    pub fn push_stack(&mut self, value: V) {
        self.chain.push(value);
    }

    /// Discard the whole chain and start a single empty root generation
    pub fn clear(&mut self) {
        self.chain.reset();
        tracing::debug!(manager = self.id, "memory cleared");
    }

    /// Snapshot the current state. The returned handle names the frozen generation.
    pub fn freeze_copy(&mut self) -> GenerationHandle {
        let (depth, serial) = self.chain.freeze();
        tracing::debug!(manager = self.id, depth, serial, "generation frozen");
        GenerationHandle::new(self.id, depth, serial)
    }

    /// Discard the current generation and return to its parent
    pub fn rollback_copy(&mut self) -> Result<(), MemoryError> {
        let released = self.chain.discard_current()?;
        tracing::debug!(
            manager = self.id,
            depth = self.chain.depth(),
            released,
            "generation rolled back"
        );
        Ok(())
    }

    /// Make the generation named by `handle` current, discarding everything newer
    pub fn restore_copy(&mut self, handle: GenerationHandle) -> Result<(), MemoryError> {
        if handle.manager_id() != self.id {
            return Err(MemoryError::ForeignGenerationHandle {
                expected: self.id,
                found: handle.manager_id(),
            });
        }
        if self.chain.serial_at(handle.depth()) != Some(handle.serial()) {
            return Err(MemoryError::StaleGenerationHandle {
                depth: handle.depth(),
            });
        }
        let discarded = self.chain.truncate_to(handle.depth());
        tracing::debug!(
            manager = self.id,
            depth = handle.depth(),
            discarded,
            "generation restored"
        );
        Ok(())
    }
}

impl<V: Trace + Clone> MemoryManager<V> {
    /// Store a value in a fresh cell
    pub fn add(&mut self, value: V) -> Result<Reference, MemoryError> {
        let references = value.references();
        self.retain(&value)?;
        let position = match self.chain.alloc(value) {
            Ok(position) => position,
            Err(err) => {
                for r in references {
                    self.chain.cell_mut(r.position())?.decrease_reference_count()?;
                }
                return Err(err);
            }
        };
        tracing::trace!(position, "cell allocated");
        Ok(Reference::new(position))
    }

    /// Writable access; shifts an inherited cell into the current generation.
    ///
    /// Edits made through this reference bypass reference counting, so embedded
    /// references should be changed through [`set`](Self::set).
    pub fn get_mut(&mut self, reference: Reference) -> Result<&mut V, MemoryError> {
        self.chain.value_mut(reference.position())
    }

    /// Replace the value stored at `reference`
    pub fn set(&mut self, reference: Reference, value: V) -> Result<(), MemoryError> {
        self.chain.cell(reference.position())?.value()?;
        self.retain(&value)?;
        let old = self.chain.cell_mut(reference.position())?.realloc(value)?;
        self.release(old.references())
    }

    /// Free the cell at `reference` and release the references its value held
    pub fn remove(&mut self, reference: Reference) -> Result<(), MemoryError> {
        let value = self.chain.free(reference.position())?;
        tracing::trace!(position = reference.position(), "cell removed");
        self.release(value.references())
    }

    /// Pin a cell on behalf of an external holder; returns the new count
    pub fn increase_reference_count(&mut self, reference: Reference) -> Result<usize, MemoryError> {
        self.chain
            .cell_mut(reference.position())?
            .increase_reference_count()
    }

    /// Unpin a cell; returns the new count. Reaching zero does not free the cell.
    pub fn decrease_reference_count(&mut self, reference: Reference) -> Result<usize, MemoryError> {
        let position = reference.position();
        if self.chain.cell(position)?.reference_count() == 0 {
            return Err(MemoryError::ReferenceCountUnderflow { position });
        }
        self.chain.cell_mut(position)?.decrease_reference_count()
    }

    pub fn pop_stack(&mut self) -> Result<V, MemoryError> {
        self.chain.pop()
    }

    /// Mark-and-sweep over the cells owned by the current generation
    pub fn spatial_garbage_collect(&mut self) -> Result<CollectStats, MemoryError> {
        spatial_collect(&mut self.chain)
    }

    /// Snapshot of everything visible from the current generation
    pub fn inspect(&self) -> Result<MemoryView<V>, MemoryError> {
        let generations = self
            .chain
            .generations()
            .iter()
            .enumerate()
            .map(|(depth, g)| GenerationSummary {
                depth,
                serial: g.serial(),
                owned_cells: g.heap().owned_count(),
                own_stack: g.stack().own().len(),
                inherited_stack: g.stack().inherited_len(),
                heap_size: g.heap().size(),
                used_cells: g.heap().used(),
            })
            .collect();

        let stack = self
            .chain
            .stack_values()?
            .into_iter()
            .cloned()
            .collect();

        let cells = (0..self.heap_size())
            .map(|position| {
                self.chain.resolve(position).map(|(owner_depth, cell)| CellView {
                    position,
                    owner_depth,
                    state: cell.state().clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MemoryView {
            generations,
            stack,
            inherited_stack: self.chain.current().stack().inherited_len(),
            cells,
            free_head: self.free_head(),
            heap_size: self.heap_size(),
            used_cells: self.used_cells(),
        })
    }

    /// Increment the target of every reference held by `value`
    fn retain(&mut self, value: &V) -> Result<(), MemoryError> {
        let references = value.references();
        for r in &references {
            self.chain.value(r.position())?;
        }
        for r in references {
            self.chain.cell_mut(r.position())?.increase_reference_count()?;
        }
        Ok(())
    }

    /// Drop reference edges; targets reaching zero are freed in turn
    fn release(&mut self, references: Vec<Reference>) -> Result<(), MemoryError> {
        let mut pending = references;
        while let Some(r) = pending.pop() {
            let position = r.position();
            let remaining = self.chain.cell_mut(position)?.decrease_reference_count()?;
            if remaining == 0 {
                let value = self.chain.free(position)?;
                tracing::trace!(position, "cell released");
                pending.extend(value.references());
            }
        }
        Ok(())
    }
}

impl<V> Default for MemoryManager<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Value;

    #[test]
    fn test_release_cascades_without_recursion() {
        let mut memory = MemoryManager::new();
        let mut previous = memory.add(Value::Int(0)).unwrap();
        let first = previous;
        for i in 1..1000 {
            previous = memory.add(Value::List(vec![Value::Int(i), Value::Ref(previous)])).unwrap();
        }
        assert_eq!(memory.used_cells(), 1000);
        memory.remove(previous).unwrap();
        assert_eq!(memory.used_cells(), 0);
        assert!(memory.get(first).is_err());
    }

    #[test]
    fn test_set_releases_old_edges() {
        let mut memory = MemoryManager::new();
        let target = memory.add(Value::Int(1)).unwrap();
        let holder = memory.add(Value::Ref(target)).unwrap();
        assert_eq!(memory.reference_count(target), Ok(1));
        memory.set(holder, Value::Null).unwrap();
        assert!(matches!(
            memory.get(target),
            Err(MemoryError::HeapSegmentationFault { .. })
        ));
        assert_eq!(memory.free_head(), Some(target.position()));
    }

    #[test]
    fn test_add_with_dangling_reference_changes_nothing() {
        let mut memory = MemoryManager::new();
        let live = memory.add(Value::Int(1)).unwrap();
        let result = memory.add(Value::List(vec![
            Value::Ref(live),
            Value::Ref(Reference::new(40)),
        ]));
        assert_eq!(
            result,
            Err(MemoryError::HeapSegmentationFault { position: 40 })
        );
        assert_eq!(memory.reference_count(live), Ok(0));
    }
}

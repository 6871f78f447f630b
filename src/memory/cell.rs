//! Heap cells
//!
//! A [`Cell`] is one addressable heap slot. While live it holds a value and a
//! reference count; once freed it holds only the link to the next free slot, so
//! the free list is threaded through the slots themselves and needs no side
//! allocation.
//!
//! Cells never know which generation owns them. Copy-on-write is expressed by
//! [`Cell::shift`], which the generation chain calls before writing through a
//! cell it inherited.

use super::{MemoryError, Position};

/// Live or freed contents of a cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellState<V> {
    Live { value: V, reference_count: usize },
    Freed { next_free: Option<Position> },
}

/// A single heap slot
#[derive(Debug, Clone, PartialEq)]
pub struct Cell<V> {
    position: Position,
    state: CellState<V>,
}

impl<V> Cell<V> {
    /// Create a live cell with no references
    pub fn allocate(position: Position, value: V) -> Self {
        Cell {
            position,
            state: CellState::Live {
                value,
                reference_count: 0,
            },
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn state(&self) -> &CellState<V> {
        &self.state
    }

    pub fn is_freed(&self) -> bool {
        matches!(self.state, CellState::Freed { .. })
    }

    /// Reference count of a live cell (0 for freed cells)
    pub fn reference_count(&self) -> usize {
        match self.state {
            CellState::Live {
                reference_count, ..
            } => reference_count,
            CellState::Freed { .. } => 0,
        }
    }

    /// Free-list link of a freed cell (`None` for live cells or the list tail)
    pub fn next_free(&self) -> Option<Position> {
        match self.state {
            CellState::Freed { next_free } => next_free,
            CellState::Live { .. } => None,
        }
    }

    pub fn value(&self) -> Result<&V, MemoryError> {
        match &self.state {
            CellState::Live { value, .. } => Ok(value),
            CellState::Freed { .. } => Err(self.fault()),
        }
    }

    pub fn value_mut(&mut self) -> Result<&mut V, MemoryError> {
        let position = self.position;
        match &mut self.state {
            CellState::Live { value, .. } => Ok(value),
            CellState::Freed { .. } => Err(MemoryError::HeapSegmentationFault { position }),
        }
    }

    /// In-place replace; only valid on a cell owned by the writing generation
    pub fn set_value(&mut self, value: V) -> Result<V, MemoryError> {
        let slot = self.value_mut()?;
        Ok(std::mem::replace(slot, value))
    }

    /// Replace the value and hand back the previous one so its references can be released
    pub fn realloc(&mut self, new_value: V) -> Result<V, MemoryError> {
        let old = self.set_value(new_value)?;
        tracing::trace!(position = self.position, "cell reallocated");
        Ok(old)
    }

    pub fn increase_reference_count(&mut self) -> Result<usize, MemoryError> {
        let position = self.position;
        match &mut self.state {
            CellState::Live {
                reference_count, ..
            } => {
                *reference_count += 1;
                Ok(*reference_count)
            }
            CellState::Freed { .. } => Err(MemoryError::HeapSegmentationFault { position }),
        }
    }

    /// Decrement the count and return the new value.
    ///
    /// Reaching zero does not free the cell; the caller decides whether a zero
    /// count means the slot is garbage.
    pub fn decrease_reference_count(&mut self) -> Result<usize, MemoryError> {
        let position = self.position;
        match &mut self.state {
            CellState::Live {
                reference_count: 0, ..
            } => Err(MemoryError::ReferenceCountUnderflow { position }),
            CellState::Live {
                reference_count, ..
            } => {
                *reference_count -= 1;
                Ok(*reference_count)
            }
            CellState::Freed { .. } => Err(MemoryError::HeapSegmentationFault { position }),
        }
    }

    /// Free the cell, linking it in front of `next_free`, and return its value.
    pub fn free(&mut self, next_free: Option<Position>) -> Result<V, MemoryError> {
        let reference_count = self.reference_count();
        if reference_count > 0 {
            return Err(MemoryError::ReferencedCellFreed {
                position: self.position,
                reference_count,
            });
        }
        match std::mem::replace(&mut self.state, CellState::Freed { next_free }) {
            CellState::Live { value, .. } => Ok(value),
            freed @ CellState::Freed { .. } => {
                self.state = freed;
                Err(self.fault())
            }
        }
    }

    /// Bring a freed cell back to life and return the free-list link it held
    pub fn reuse(&mut self, value: V) -> Result<Option<Position>, MemoryError> {
        match self.state {
            CellState::Freed { next_free } => {
                self.state = CellState::Live {
                    value,
                    reference_count: 0,
                };
                Ok(next_free)
            }
            CellState::Live { .. } => Err(self.fault()),
        }
    }

    /// Unconditional teardown, bypassing reference counts
    pub fn destroy(self) -> Option<V> {
        match self.state {
            CellState::Live { value, .. } => Some(value),
            CellState::Freed { .. } => None,
        }
    }

    fn fault(&self) -> MemoryError {
        MemoryError::HeapSegmentationFault {
            position: self.position,
        }
    }
}

impl<V: Clone> Cell<V> {
    /// Copy-on-write clone at the same position
    pub fn shift(&self) -> Cell<V> {
        self.clone()
    }
}

//! Spatial garbage collection
//!
//! Mark-and-sweep restricted to the current generation. Roots are taken only
//! from what the current generation itself holds:
//! - locally owned live cells with a positive reference count
//! - references embedded in values on the visible evaluation stack
//!
//! Tracing follows edges through inherited cells (read-only), but only locally
//! owned cells are ever swept. Unreached inherited cells stay shared with the
//! ancestors and are left alone, unless a swept cell held an edge to one: that
//! target is shifted into the current generation to drop the count.

use super::generation::GenerationChain;
use super::worklist::Worklist;
use super::{MemoryError, Position, Trace};

/// Outcome of one collection pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectStats {
    /// Positions seeded into the worklist
    pub roots: usize,
    /// Positions popped and expanded
    pub visited: usize,
    /// Locally owned positions that were freed, ascending
    pub freed: Vec<Position>,
}

/// Collect unreachable cells owned by the current generation
pub fn spatial_collect<V: Trace + Clone>(
    chain: &mut GenerationChain<V>,
) -> Result<CollectStats, MemoryError> {
    let heap_size = chain.current().heap().size();
    let mut worklist = Worklist::new(heap_size);
    let owned = chain.owned_positions();
    let mut roots = 0;

    for &position in &owned {
        let cell = chain.cell(position)?;
        if !cell.is_freed() && cell.reference_count() > 0 && worklist.push(position) {
            roots += 1;
        }
    }
    for value in chain.stack_values()? {
        value.trace(&mut |r| {
            if worklist.push(r.position()) {
                roots += 1;
            }
        });
    }

    let mut visited = 0;
    while let Some(position) = worklist.pop() {
        visited += 1;
        match chain.value(position) {
            Ok(value) => value.trace(&mut |r| {
                worklist.push(r.position());
            }),
            Err(_) => tracing::warn!(position, "collector reached a dangling reference"),
        }
    }

    let garbage: Vec<Position> = owned
        .into_iter()
        .filter(|&p| worklist.is_dead(p) && chain.cell(p).is_ok_and(|c| !c.is_freed()))
        .collect();

    let mut released = Vec::new();
    for &position in &garbage {
        let value = chain.free(position)?;
        released.extend(value.references());
    }
    // Surviving targets lose the edge; inherited ones are shifted in first
    for target in released {
        let position = target.position();
        if garbage.binary_search(&position).is_ok() {
            continue;
        }
        chain.cell_mut(position)?.decrease_reference_count()?;
    }

    tracing::debug!(roots, visited, freed = garbage.len(), "spatial collection finished");
    Ok(CollectStats {
        roots,
        visited,
        freed: garbage,
    })
}

//! Reachability worklist
//!
//! Collection marks positions by moving them out of a `dead` set into a FIFO of
//! positions waiting to be expanded. Heaps are mostly contiguous and traces tend
//! to touch clustered positions, so both structures store half-open ranges
//! instead of individual positions:
//!
//! ```text
//! dead:       [0, 3) [5, 100)
//! to_process: [3, 5)
//! ```
//!
//! A fresh worklist over a heap of size `n` is a single dead range `[0, n)`.

use super::Position;
use std::collections::{BTreeMap, VecDeque};
use std::ops::Range;

/// Set of positions stored as disjoint, non-adjacent half-open ranges
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeSet {
    // start -> end (exclusive)
    ranges: BTreeMap<Position, Position>,
}

impl RangeSet {
    pub fn new() -> Self {
        RangeSet {
            ranges: BTreeMap::new(),
        }
    }

    /// Set holding exactly `range`
    pub fn full(range: Range<Position>) -> Self {
        let mut set = RangeSet::new();
        set.insert_range(range);
        set
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Number of positions in the set
    pub fn len(&self) -> usize {
        self.ranges.iter().map(|(start, end)| end - start).sum()
    }

    /// Number of stored ranges
    pub fn range_count(&self) -> usize {
        self.ranges.len()
    }

    pub fn contains(&self, position: Position) -> bool {
        self.ranges
            .range(..=position)
            .next_back()
            .is_some_and(|(_, &end)| position < end)
    }

    pub fn insert(&mut self, position: Position) {
        self.insert_range(position..position + 1);
    }

    /// Insert a range, merging it with every overlapping or adjacent range
    pub fn insert_range(&mut self, range: Range<Position>) {
        if range.is_empty() {
            return;
        }
        let mut start = range.start;
        let mut end = range.end;

        if let Some((&prev_start, &prev_end)) = self.ranges.range(..=start).next_back() {
            if prev_end >= start {
                start = prev_start;
                end = end.max(prev_end);
            }
        }

        let absorbed: Vec<(Position, Position)> = self
            .ranges
            .range(start..=end)
            .map(|(&s, &e)| (s, e))
            .collect();
        for (s, e) in absorbed {
            self.ranges.remove(&s);
            end = end.max(e);
        }
        self.ranges.insert(start, end);
    }

    /// Remove a position, splitting its range if needed. Returns whether it was present.
    pub fn remove(&mut self, position: Position) -> bool {
        let Some((&start, &end)) = self.ranges.range(..=position).next_back() else {
            return false;
        };
        if position >= end {
            return false;
        }
        self.ranges.remove(&start);
        if start < position {
            self.ranges.insert(start, position);
        }
        if position + 1 < end {
            self.ranges.insert(position + 1, end);
        }
        true
    }

    /// Iterate over the stored ranges in ascending order
    pub fn ranges(&self) -> impl Iterator<Item = Range<Position>> + '_ {
        self.ranges.iter().map(|(&start, &end)| start..end)
    }

    /// Iterate over every position in ascending order
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.ranges().flatten()
    }
}

/// FIFO of positions that coalesces consecutive pushes into ranges
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeQueue {
    ranges: VecDeque<Range<Position>>,
}

impl RangeQueue {
    pub fn new() -> Self {
        RangeQueue {
            ranges: VecDeque::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ranges.iter().map(|r| r.len()).sum()
    }

    pub fn range_count(&self) -> usize {
        self.ranges.len()
    }

    pub fn push(&mut self, position: Position) {
        if let Some(last) = self.ranges.back_mut() {
            if last.end == position {
                last.end += 1;
                return;
            }
        }
        self.ranges.push_back(position..position + 1);
    }

    pub fn pop(&mut self) -> Option<Position> {
        let front = self.ranges.front_mut()?;
        let position = front.start;
        front.start += 1;
        if front.start >= front.end {
            self.ranges.pop_front();
        }
        Some(position)
    }
}

/// Dead set plus processing queue used by one collection pass
#[derive(Debug, Clone)]
pub struct Worklist {
    dead: RangeSet,
    to_process: RangeQueue,
}

impl Worklist {
    /// Every position of `[0, heap_size)` starts dead
    pub fn new(heap_size: Position) -> Self {
        Worklist {
            dead: RangeSet::full(0..heap_size),
            to_process: RangeQueue::new(),
        }
    }

    /// Mark `position` visited and queue it. Returns `false` if it was already visited
    /// or lies outside the heap.
    pub fn push(&mut self, position: Position) -> bool {
        if self.dead.remove(position) {
            self.to_process.push(position);
            true
        } else {
            false
        }
    }

    /// Next visited position waiting for edge expansion
    pub fn pop(&mut self) -> Option<Position> {
        self.to_process.pop()
    }

    pub fn is_dead(&self, position: Position) -> bool {
        self.dead.contains(position)
    }

    pub fn dead(&self) -> &RangeSet {
        &self.dead
    }

    pub fn pending(&self) -> usize {
        self.to_process.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_merges_adjacent_and_overlapping() {
        let mut set = RangeSet::new();
        set.insert_range(0..3);
        set.insert_range(5..8);
        assert_eq!(set.range_count(), 2);
        set.insert_range(3..5);
        assert_eq!(set.ranges().collect::<Vec<_>>(), vec![0..8]);
        set.insert_range(6..12);
        set.insert(12);
        assert_eq!(set.ranges().collect::<Vec<_>>(), vec![0..13]);
        assert_eq!(set.len(), 13);
    }

    #[test]
    fn test_insert_swallows_contained_ranges() {
        let mut set = RangeSet::new();
        set.insert(2);
        set.insert(4);
        set.insert(9);
        set.insert_range(1..10);
        assert_eq!(set.ranges().collect::<Vec<_>>(), vec![1..10]);
    }

    #[test]
    fn test_remove_splits_range() {
        let mut set = RangeSet::full(0..10);
        assert!(set.remove(4));
        assert!(!set.remove(4));
        assert!(!set.remove(10));
        assert_eq!(set.ranges().collect::<Vec<_>>(), vec![0..4, 5..10]);
        assert!(set.remove(0));
        assert!(set.remove(9));
        assert_eq!(set.ranges().collect::<Vec<_>>(), vec![1..4, 5..9]);
        assert!(!set.contains(4));
        assert!(set.contains(5));
    }

    #[test]
    fn test_queue_coalesces_runs_in_fifo_order() {
        let mut queue = RangeQueue::new();
        for p in [3, 4, 5, 9, 10, 1] {
            queue.push(p);
        }
        assert_eq!(queue.range_count(), 3);
        assert_eq!(queue.len(), 6);
        let popped: Vec<_> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(popped, vec![3, 4, 5, 9, 10, 1]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_worklist_visits_each_position_once() {
        let mut worklist = Worklist::new(6);
        assert!(worklist.push(2));
        assert!(!worklist.push(2));
        assert!(!worklist.push(6));
        assert!(worklist.push(3));
        assert_eq!(worklist.pending(), 2);
        assert_eq!(worklist.pop(), Some(2));
        assert!(!worklist.push(2));
        assert_eq!(worklist.pop(), Some(3));
        assert_eq!(worklist.pop(), None);
        assert_eq!(worklist.dead().positions().collect::<Vec<_>>(), vec![0, 1, 4, 5]);
    }
}

//! Evaluation stack segment
//!
//! Each generation sees its stack as the concatenation of a visible prefix of
//! its ancestor's stack and the values it pushed itself:
//!
//! ```text
//! ancestor: [a, b, c, d]
//! child:    [a, b, c, d] ++ []     inherited_len = 4
//! pop, pop: [a, b]       ++ []     inherited_len = 2   (ancestor still [a, b, c, d])
//! push e:   [a, b]       ++ [e]
//! ```
//!
//! Popping into the inherited prefix only shrinks `inherited_len`. The values
//! themselves are read from the ancestor by the generation chain, so this type
//! only tracks the bookkeeping.

/// Stack bookkeeping owned by one generation
#[derive(Debug, Clone, PartialEq)]
pub struct StackSegment<V> {
    own: Vec<V>,
    inherited_len: usize,
}

impl<V> StackSegment<V> {
    /// Segment of the root generation: nothing inherited
    pub fn new() -> Self {
        StackSegment {
            own: Vec::new(),
            inherited_len: 0,
        }
    }

    /// Segment of a fresh child whose ancestor exposes `inherited_len` values
    pub fn inheriting(inherited_len: usize) -> Self {
        StackSegment {
            own: Vec::new(),
            inherited_len,
        }
    }

    /// Logical length seen by the owning generation
    pub fn len(&self) -> usize {
        self.inherited_len + self.own.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of values visible from the ancestor
    pub fn inherited_len(&self) -> usize {
        self.inherited_len
    }

    /// Values pushed by the owning generation
    pub fn own(&self) -> &[V] {
        &self.own
    }

    pub fn push(&mut self, value: V) {
        self.own.push(value);
    }

    /// Pop from the own suffix, if it has anything
    pub fn pop_own(&mut self) -> Option<V> {
        self.own.pop()
    }

    /// Hide the topmost inherited value and return its logical index.
    ///
    /// Returns `None` when nothing inherited is visible any more.
    pub fn hide_inherited(&mut self) -> Option<usize> {
        if self.inherited_len == 0 {
            return None;
        }
        self.inherited_len -= 1;
        Some(self.inherited_len)
    }

    /// Undo [`hide_inherited`](Self::hide_inherited) after a failed read
    pub fn unhide_inherited(&mut self) {
        self.inherited_len += 1;
    }

    /// Own value at a logical index, if that index falls in the own suffix
    pub fn get_own(&self, index: usize) -> Option<&V> {
        index
            .checked_sub(self.inherited_len)
            .and_then(|i| self.own.get(i))
    }

    /// Drop every owned value
    pub fn destroy(&mut self) {
        self.own.clear();
        self.inherited_len = 0;
    }
}

impl<V> Default for StackSegment<V> {
    fn default() -> Self {
        Self::new()
    }
}

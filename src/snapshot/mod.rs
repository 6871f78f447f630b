// Snapshot history for stepping through a script run

use crate::driver::Binding;
use crate::memory::{CellState, MemoryView, Value};
use crate::script::ast::SourceLocation;

/// Textual record of every executed statement
#[derive(Debug, Clone)]
pub struct Transcript {
    pub lines: Vec<TranscriptLine>,
}

impl Transcript {
    pub fn new() -> Self {
        Transcript { lines: Vec::new() }
    }

    pub fn record(&mut self, text: String, location: SourceLocation) {
        self.lines.push(TranscriptLine { text, location });
    }

    /// The first `len` lines as plain strings
    pub fn get_output(&self, len: usize) -> Vec<String> {
        self.lines
            .iter()
            .take(len)
            .map(|line| format!("{:>3}: {}", line.location.line, line.text))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

/// A transcript line with the location of the statement that produced it
#[derive(Debug, Clone)]
pub struct TranscriptLine {
    pub text: String,
    pub location: SourceLocation,
}

/// Memory state captured after a statement
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub memory: MemoryView<Value>,
    /// Script bindings, sorted by name
    pub bindings: Vec<(String, Binding)>,
    /// Number of statements executed when the snapshot was taken
    pub statement_index: usize,
    pub source_location: SourceLocation,
    /// Transcript lines visible at this point
    pub transcript_len: usize,
}

impl Snapshot {
    /// Estimate the memory usage of this snapshot in bytes
    pub fn estimated_size(&self) -> usize {
        // Rough estimate: a fixed cost per slot plus the payload of text values
        let generations = self.memory.generations.len() * 64;
        let stack: usize = self.memory.stack.iter().map(|v| 32 + value_payload(v)).sum();
        let cells: usize = self
            .memory
            .cells
            .iter()
            .map(|cell| match &cell.state {
                CellState::Live { value, .. } => 48 + value_payload(value),
                CellState::Freed { .. } => 32,
            })
            .sum();
        let bindings: usize = self.bindings.iter().map(|(name, _)| 32 + name.len()).sum();

        generations + stack + cells + bindings
    }
}

fn value_payload(value: &Value) -> usize {
    match value {
        Value::Text(s) => s.len(),
        Value::List(items) => items.iter().map(|v| 32 + value_payload(v)).sum(),
        _ => 0,
    }
}

/// Bounded history of snapshots
#[derive(Debug)]
pub struct SnapshotManager {
    snapshots: Vec<Snapshot>,
    max_memory: usize,
    current_memory: usize,
}

impl SnapshotManager {
    pub fn new(max_memory: usize) -> Self {
        SnapshotManager {
            snapshots: Vec::new(),
            max_memory,
            current_memory: 0,
        }
    }

    /// Add a snapshot to history. Fails when the byte budget would be exceeded.
    pub fn push(&mut self, snapshot: Snapshot) -> Result<(), usize> {
        let snapshot_size = snapshot.estimated_size();

        if self.current_memory + snapshot_size > self.max_memory {
            return Err(snapshot_size);
        }

        self.current_memory += snapshot_size;
        self.snapshots.push(snapshot);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn memory_usage(&self) -> usize {
        self.current_memory
    }

    pub fn memory_limit(&self) -> usize {
        self.max_memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryManager;

    fn snapshot_of(memory: &MemoryManager<Value>) -> Snapshot {
        Snapshot {
            memory: memory.inspect().unwrap(),
            bindings: Vec::new(),
            statement_index: 0,
            source_location: SourceLocation::new(1, 1),
            transcript_len: 0,
        }
    }

    #[test]
    fn test_budget_rejects_oversized_history() {
        let mut memory = MemoryManager::new();
        memory.add(Value::Text("x".repeat(100))).unwrap();
        let snapshot = snapshot_of(&memory);
        let size = snapshot.estimated_size();
        assert!(size > 100);

        let mut history = SnapshotManager::new(size * 2);
        assert!(history.push(snapshot.clone()).is_ok());
        assert!(history.push(snapshot.clone()).is_ok());
        assert_eq!(history.push(snapshot), Err(size));
        assert_eq!(history.len(), 2);
        assert_eq!(history.memory_usage(), size * 2);
    }

    #[test]
    fn test_transcript_prefix() {
        let mut transcript = Transcript::new();
        transcript.record("a = #0".to_string(), SourceLocation::new(1, 1));
        transcript.record("pop -> 3".to_string(), SourceLocation::new(2, 1));
        assert_eq!(transcript.get_output(1), vec!["  1: a = #0".to_string()]);
        assert_eq!(transcript.get_output(5).len(), 2);
    }
}

// Execution engine for memory scripts

use super::errors::SessionError;
use super::SessionConfig;
use crate::memory::{GenerationHandle, MemoryError, MemoryManager, Reference, Value};
use crate::script::ast::*;
use crate::script::parser::{ParseError, Parser};
use crate::snapshot::{Snapshot, SnapshotManager, Transcript};
use rustc_hash::FxHashMap;
use std::fmt;

/// What a script name is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Reference(Reference),
    Snapshot(GenerationHandle),
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Reference(r) => write!(f, "{}", r),
            Binding::Snapshot(handle) => write!(f, "generation {}", handle.depth()),
        }
    }
}

/// Runs a script against a memory manager and records its history
pub struct Session {
    /// Parsed script
    script: Script,

    /// Live memory as left by the last executed statement
    memory: MemoryManager<Value>,

    /// Names bound by `name = add ...` and `name = freeze`
    bindings: FxHashMap<String, Binding>,

    /// One line per executed statement
    transcript: Transcript,

    /// Snapshot history for stepping backward/forward
    snapshot_manager: SnapshotManager,

    /// Index of the snapshot currently shown
    history_position: usize,

    /// Location of the statement that produced the current state
    current_location: SourceLocation,

    /// Number of statements executed so far
    executed: usize,

    /// Error that stopped the run, if any
    error: Option<SessionError>,

    finished: bool,
}

impl Session {
    pub fn new(script: Script, config: SessionConfig) -> Self {
        Session {
            script,
            memory: MemoryManager::with_config(config.memory),
            bindings: FxHashMap::default(),
            transcript: Transcript::new(),
            snapshot_manager: SnapshotManager::new(config.snapshot_limit),
            history_position: 0,
            current_location: SourceLocation::new(1, 1),
            executed: 0,
            error: None,
            finished: false,
        }
    }

    /// Parse `source` and create a session for it
    pub fn from_source(source: &str, config: SessionConfig) -> Result<Self, ParseError> {
        let script = Parser::new(source)?.parse_script()?;
        Ok(Self::new(script, config))
    }

    /// Execute the whole script, capturing a snapshot after every statement.
    ///
    /// On error the run stops; the error is also kept in [`error`](Self::error)
    /// and the history captured so far stays navigable.
    pub fn run(&mut self) -> Result<(), SessionError> {
        if let Some(first) = self.script.statements.first() {
            self.current_location = first.location;
        }
        let statements = std::mem::take(&mut self.script.statements);
        let result = self
            .take_snapshot()
            .and_then(|()| self.run_statements(&statements));
        self.script.statements = statements;

        if let Err(err) = &result {
            tracing::warn!(error = %err, "script stopped");
            self.transcript
                .record(format!("error: {}", err), self.current_location);
            self.error = Some(err.clone());
            if !matches!(err, SessionError::SnapshotLimitExceeded { .. }) {
                // Show the failing statement with the memory as it was left
                if let Err(e) = self.take_snapshot() {
                    tracing::warn!(error = %e, "failed to capture the final snapshot");
                }
            }
        }

        self.finished = true;
        tracing::info!(
            heap_capacity = self.memory.config().heap_capacity,
            statements = self.executed,
            snapshots = self.snapshot_manager.len(),
            "script finished"
        );
        result
    }

    fn run_statements(&mut self, statements: &[Statement]) -> Result<(), SessionError> {
        for statement in statements {
            self.current_location = statement.location;
            let line = self.execute_statement(statement)?;
            self.executed += 1;
            self.transcript.record(line, statement.location);
            self.take_snapshot()?;
        }
        Ok(())
    }

    /// Execute a single statement, returning its transcript line
    fn execute_statement(&mut self, statement: &Statement) -> Result<String, SessionError> {
        let location = statement.location;
        let at = |source: MemoryError| SessionError::Memory { source, location };

        match &statement.kind {
            StatementKind::Add { target, value } => {
                let value = self.evaluate(value)?;
                let shown = value.to_string();
                let reference = self.memory.add(value).map_err(at)?;
                match target {
                    Some(name) => {
                        self.bindings
                            .insert(name.clone(), Binding::Reference(reference));
                        Ok(format!("{} = add {} -> {}", name, shown, reference))
                    }
                    None => Ok(format!("add {} -> {}", shown, reference)),
                }
            }

            StatementKind::Set { reference, value } => {
                let target = self.lookup_reference(reference, location)?;
                let value = self.evaluate(value)?;
                let shown = value.to_string();
                self.memory.set(target, value).map_err(at)?;
                Ok(format!("set {} ({}) = {}", reference, target, shown))
            }

            StatementKind::Get { reference } => {
                let target = self.lookup_reference(reference, location)?;
                let value = self.memory.get(target).map_err(at)?;
                Ok(format!("get {} ({}) -> {}", reference, target, value))
            }

            StatementKind::Remove { reference } => {
                let target = self.lookup_reference(reference, location)?;
                self.memory.remove(target).map_err(at)?;
                Ok(format!("remove {} ({})", reference, target))
            }

            StatementKind::Pin { reference } => {
                let target = self.lookup_reference(reference, location)?;
                let count = self.memory.increase_reference_count(target).map_err(at)?;
                Ok(format!("pin {} ({}) -> rc {}", reference, target, count))
            }

            StatementKind::Unpin { reference } => {
                let target = self.lookup_reference(reference, location)?;
                let count = self.memory.decrease_reference_count(target).map_err(at)?;
                Ok(format!("unpin {} ({}) -> rc {}", reference, target, count))
            }

            StatementKind::Push { value } => {
                let value = self.evaluate(value)?;
                let shown = value.to_string();
                self.memory.push_stack(value);
                Ok(format!("push {}", shown))
            }

            StatementKind::Pop => {
                let value = self.memory.pop_stack().map_err(at)?;
                Ok(format!("pop -> {}", value))
            }

            StatementKind::Freeze { target } => {
                let handle = self.memory.freeze_copy();
                match target {
                    Some(name) => {
                        self.bindings.insert(name.clone(), Binding::Snapshot(handle));
                        Ok(format!(
                            "{} = freeze -> generation {}",
                            name,
                            handle.depth()
                        ))
                    }
                    None => Ok(format!("freeze -> generation {}", handle.depth())),
                }
            }

            StatementKind::Rollback => {
                self.memory.rollback_copy().map_err(at)?;
                Ok(format!("rollback -> generation {}", self.memory.depth()))
            }

            StatementKind::Restore { snapshot } => {
                let handle = self.lookup_snapshot(snapshot, location)?;
                self.memory.restore_copy(handle).map_err(at)?;
                Ok(format!(
                    "restore {} -> generation {}",
                    snapshot,
                    self.memory.depth()
                ))
            }

            StatementKind::Collect => {
                let stats = self.memory.spatial_garbage_collect().map_err(at)?;
                let freed: Vec<String> = stats.freed.iter().map(|p| format!("#{}", p)).collect();
                Ok(format!(
                    "gc: {} root(s), {} visited, freed [{}]",
                    stats.roots,
                    stats.visited,
                    freed.join(", ")
                ))
            }

            StatementKind::Clear => {
                self.memory.clear();
                self.bindings.clear();
                Ok("clear".to_string())
            }
        }
    }

    /// Evaluate a value expression; bare names become references
    fn evaluate(&self, expr: &Expr) -> Result<Value, SessionError> {
        match expr {
            Expr::Null => Ok(Value::Null),
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Text(s) => Ok(Value::Text(s.clone())),
            Expr::Var(name, location) => {
                Ok(Value::Ref(self.lookup_reference(name, *location)?))
            }
            Expr::List(items) => items
                .iter()
                .map(|item| self.evaluate(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
        }
    }

    fn lookup_reference(
        &self,
        name: &str,
        location: SourceLocation,
    ) -> Result<Reference, SessionError> {
        match self.bindings.get(name) {
            Some(Binding::Reference(r)) => Ok(*r),
            Some(Binding::Snapshot(_)) => Err(SessionError::NotAReference {
                name: name.to_string(),
                location,
            }),
            None => Err(SessionError::UndefinedBinding {
                name: name.to_string(),
                location,
            }),
        }
    }

    fn lookup_snapshot(
        &self,
        name: &str,
        location: SourceLocation,
    ) -> Result<GenerationHandle, SessionError> {
        match self.bindings.get(name) {
            Some(Binding::Snapshot(handle)) => Ok(*handle),
            Some(Binding::Reference(_)) => Err(SessionError::NotASnapshot {
                name: name.to_string(),
                location,
            }),
            None => Err(SessionError::UndefinedBinding {
                name: name.to_string(),
                location,
            }),
        }
    }

    /// Capture the current memory state into the history
    fn take_snapshot(&mut self) -> Result<(), SessionError> {
        let memory = self.memory.inspect().map_err(|source| SessionError::Memory {
            source,
            location: self.current_location,
        })?;

        let mut bindings: Vec<(String, Binding)> = self
            .bindings
            .iter()
            .map(|(name, binding)| (name.clone(), *binding))
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));

        let snapshot = Snapshot {
            memory,
            bindings,
            statement_index: self.executed,
            source_location: self.current_location,
            transcript_len: self.transcript.len(),
        };

        self.snapshot_manager
            .push(snapshot)
            .map_err(|_| SessionError::SnapshotLimitExceeded {
                current: self.snapshot_manager.memory_usage(),
                limit: self.snapshot_manager.memory_limit(),
            })?;

        self.history_position = self.snapshot_manager.len() - 1;
        Ok(())
    }

    fn show_snapshot(&mut self, index: usize) -> Result<(), SessionError> {
        let snapshot = self
            .snapshot_manager
            .get(index)
            .ok_or_else(SessionError::no_snapshots)?;
        self.current_location = snapshot.source_location;
        self.history_position = index;
        Ok(())
    }

    /// Step backward in history
    pub fn step_backward(&mut self) -> Result<(), SessionError> {
        if self.history_position == 0 {
            return Err(SessionError::at_start());
        }
        self.show_snapshot(self.history_position - 1)
    }

    /// Step forward in history
    pub fn step_forward(&mut self) -> Result<(), SessionError> {
        if self.history_position + 1 >= self.snapshot_manager.len() {
            return Err(SessionError::at_end());
        }
        self.show_snapshot(self.history_position + 1)
    }

    /// Rewind to the beginning of history
    pub fn rewind_to_start(&mut self) -> Result<(), SessionError> {
        if self.snapshot_manager.is_empty() {
            return Err(SessionError::no_snapshots());
        }
        self.show_snapshot(0)
    }

    /// Jump to the last captured snapshot
    pub fn jump_to_end(&mut self) -> Result<(), SessionError> {
        match self.snapshot_manager.len() {
            0 => Err(SessionError::no_snapshots()),
            len => self.show_snapshot(len - 1),
        }
    }

    // ========== Getter methods for UI ==========

    pub fn current_location(&self) -> SourceLocation {
        self.current_location
    }

    /// Snapshot at the current history position
    pub fn current_snapshot(&self) -> Option<&Snapshot> {
        self.snapshot_manager.get(self.history_position)
    }

    pub fn history_position(&self) -> usize {
        self.history_position
    }

    pub fn total_snapshots(&self) -> usize {
        self.snapshot_manager.len()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Live memory after the last executed statement
    pub fn memory(&self) -> &MemoryManager<Value> {
        &self.memory
    }

    pub fn binding(&self, name: &str) -> Option<Binding> {
        self.bindings.get(name).copied()
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of statements that completed successfully
    pub fn executed_statements(&self) -> usize {
        self.executed
    }
}

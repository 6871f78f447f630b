// Integration tests for running memory scripts

use strata::driver::{Binding, Session, SessionConfig, SessionError};
use strata::memory::{MemoryConfig, MemoryError, Value};

fn run(source: &str) -> Session {
    let mut session =
        Session::from_source(source, SessionConfig::default()).expect("Parsing failed");
    let result = session.run();
    assert!(result.is_ok(), "Execution failed: {:?}", result);
    session
}

fn reference(session: &Session, name: &str) -> strata::memory::Reference {
    match session.binding(name) {
        Some(Binding::Reference(r)) => r,
        other => panic!("'{}' is not a reference: {:?}", name, other),
    }
}

#[test]
fn test_backtracking_script() {
    let source = r#"
        a = add 1
        b = add [a, "x"]
        s = freeze
        set a 2
        c = add 3
        restore s
        get a
    "#;
    let session = run(source);

    let memory = session.memory();
    let a = reference(&session, "a");
    let b = reference(&session, "b");
    let c = reference(&session, "c");
    assert_eq!(memory.depth(), 0);
    assert_eq!(memory.get(a), Ok(&Value::Int(1)));
    assert_eq!(memory.reference_count(a), Ok(1));
    assert!(memory.get(b).is_ok());
    assert!(matches!(
        memory.get(c),
        Err(MemoryError::HeapSegmentationFault { .. })
    ));

    let transcript = session.transcript();
    assert_eq!(transcript.len(), 7);
    assert_eq!(transcript.lines[6].text, "get a (#0) -> 1");
    assert_eq!(transcript.lines[6].location.line, 8);
}

#[test]
fn test_snapshot_after_every_statement() {
    let session = run("push 1; push 2\npop");
    // Initial state plus one per statement
    assert_eq!(session.total_snapshots(), 4);
    assert_eq!(session.history_position(), 3);

    let last = session.current_snapshot().unwrap();
    assert_eq!(last.memory.stack, vec![Value::Int(1)]);
    assert_eq!(last.statement_index, 3);
    assert_eq!(last.transcript_len, 3);
}

#[test]
fn test_history_navigation() {
    let mut session = run("a = add 1\nset a 2\nset a 3");

    session.rewind_to_start().unwrap();
    assert_eq!(session.history_position(), 0);
    assert!(session.current_snapshot().unwrap().memory.cells.is_empty());
    assert!(matches!(
        session.step_backward(),
        Err(SessionError::HistoryOperationFailed { .. })
    ));

    session.step_forward().unwrap();
    session.step_forward().unwrap();
    let snapshot = session.current_snapshot().unwrap();
    assert_eq!(session.current_location().line, 2);
    match &snapshot.memory.cells[0].state {
        strata::memory::CellState::Live { value, .. } => assert_eq!(value, &Value::Int(2)),
        other => panic!("expected a live cell, got {:?}", other),
    }

    session.step_forward().unwrap();
    assert!(session.step_forward().is_err());
    session.rewind_to_start().unwrap();
    session.jump_to_end().unwrap();
    assert_eq!(session.history_position(), 3);
}

#[test]
fn test_memory_error_stops_run_and_keeps_history() {
    let source = "a = add 1\nb = add a\nremove a\npush 4";
    let mut session = Session::from_source(source, SessionConfig::default()).unwrap();
    let err = session.run().unwrap_err();

    match &err {
        SessionError::Memory { source, location } => {
            assert_eq!(
                source,
                &MemoryError::ReferencedCellFreed {
                    position: 0,
                    reference_count: 1
                }
            );
            assert_eq!(location.line, 3);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(session.error(), Some(&err));
    assert_eq!(session.executed_statements(), 2);
    assert!(session.is_finished());
    // Initial, two statements, and the failing state
    assert_eq!(session.total_snapshots(), 4);
    assert!(session.transcript().lines[2].text.starts_with("error: "));
    assert_eq!(session.memory().stack_len(), 0);
}

#[test]
fn test_name_errors() {
    let mut session = Session::from_source("get missing", SessionConfig::default()).unwrap();
    assert!(matches!(
        session.run(),
        Err(SessionError::UndefinedBinding { ref name, .. }) if name == "missing"
    ));

    let mut session = Session::from_source("s = freeze\nget s", SessionConfig::default()).unwrap();
    assert!(matches!(
        session.run(),
        Err(SessionError::NotAReference { .. })
    ));

    let mut session = Session::from_source("a = add 1\nrestore a", SessionConfig::default()).unwrap();
    assert!(matches!(session.run(), Err(SessionError::NotASnapshot { .. })));
}

#[test]
fn test_restore_of_discarded_generation_is_stale() {
    let mut session =
        Session::from_source("s = freeze\nt = freeze\nrollback\nrollback\nrestore t", SessionConfig::default())
            .unwrap();
    let err = session.run().unwrap_err();
    assert!(matches!(
        err,
        SessionError::Memory {
            source: MemoryError::StaleGenerationHandle { depth: 1 },
            ..
        }
    ));
}

#[test]
fn test_gc_statement() {
    let session = run("keep = add 1\npin keep\nadd 2\nfreeze\nadd 3\ngc");
    let transcript = session.transcript();
    assert_eq!(
        transcript.lines.last().map(|l| l.text.as_str()),
        Some("gc: 0 root(s), 0 visited, freed [#2]")
    );
    assert_eq!(session.memory().used_cells(), 2);
}

#[test]
fn test_heap_capacity_from_config() {
    let config = SessionConfig {
        memory: MemoryConfig::new(1),
        ..SessionConfig::default()
    };
    let mut session = Session::from_source("add 1\nadd 2", config).unwrap();
    assert!(matches!(
        session.run(),
        Err(SessionError::Memory {
            source: MemoryError::OutOfMemory { capacity: 1 },
            ..
        })
    ));
}

#[test]
fn test_snapshot_limit() {
    let config = SessionConfig {
        snapshot_limit: 1,
        ..SessionConfig::default()
    };
    let mut session = Session::from_source("add 1", config).unwrap();
    assert!(matches!(
        session.run(),
        Err(SessionError::SnapshotLimitExceeded { limit: 1, .. })
    ));
}

#[test]
fn test_error_survives_missing_final_snapshot() {
    // Room for the initial snapshot of an empty root, not for a second one
    let config = SessionConfig {
        snapshot_limit: 100,
        ..SessionConfig::default()
    };
    let mut session = Session::from_source("pop", config).unwrap();
    let err = session.run().unwrap_err();

    assert_eq!(
        err,
        SessionError::Memory {
            source: MemoryError::EmptyStackUnderflow,
            location: session.current_location(),
        }
    );
    assert_eq!(session.error(), Some(&err));
    assert!(session.is_finished());
    assert_eq!(session.total_snapshots(), 1);
    assert_eq!(session.transcript().len(), 1);
}

#[test]
fn test_parse_error_reports_location() {
    let err = Session::from_source("a = add 1\nset a", SessionConfig::default())
        .err()
        .expect("parse should fail");
    assert_eq!(err.location.line, 2);
}

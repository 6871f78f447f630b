// Integration tests for the versioned memory manager

use strata::memory::{MemoryConfig, MemoryError, MemoryManager, Reference, Value};

fn int(memory: &MemoryManager<Value>, r: Reference) -> i64 {
    memory
        .get(r)
        .expect("read failed")
        .as_int()
        .expect("not an int")
}

#[test]
fn test_free_then_allocate_reuses_position() {
    let mut memory = MemoryManager::new();
    let a = memory.add(Value::Int(1)).unwrap();
    let b = memory.add(Value::Int(2)).unwrap();
    memory.remove(a).unwrap();
    assert_eq!(memory.free_head(), Some(a.position()));

    let c = memory.add(Value::Int(3)).unwrap();
    assert_eq!(c, a);
    assert_eq!(memory.heap_size(), 2);
    assert_eq!(memory.free_head(), None);
    assert_eq!(int(&memory, b), 2);
    assert_eq!(int(&memory, c), 3);
}

#[test]
fn test_free_list_is_lifo() {
    let mut memory = MemoryManager::new();
    let refs: Vec<_> = (0..4).map(|i| memory.add(Value::Int(i)).unwrap()).collect();
    memory.remove(refs[1]).unwrap();
    memory.remove(refs[3]).unwrap();

    assert_eq!(memory.add(Value::Null).unwrap(), refs[3]);
    assert_eq!(memory.add(Value::Null).unwrap(), refs[1]);
    assert_eq!(memory.add(Value::Null).unwrap().position(), 4);
}

#[test]
fn test_child_writes_are_invisible_to_ancestor() {
    let mut memory = MemoryManager::new();
    let a = memory.add(Value::Int(1)).unwrap();
    let b = memory.add(Value::Text("kept".to_string())).unwrap();

    let handle = memory.freeze_copy();
    assert!(!memory.is_local(a));
    memory.set(a, Value::Int(100)).unwrap();
    assert!(memory.is_local(a));
    *memory.get_mut(b).unwrap() = Value::Text("changed".to_string());
    assert_eq!(int(&memory, a), 100);

    memory.rollback_copy().unwrap();
    assert_eq!(memory.depth(), handle.depth());
    assert_eq!(int(&memory, a), 1);
    assert_eq!(memory.get(b), Ok(&Value::Text("kept".to_string())));
}

#[test]
fn test_restore_discards_newer_generations() {
    let mut memory = MemoryManager::new();
    let a = memory.add(Value::Int(1)).unwrap();
    let first = memory.freeze_copy();
    memory.set(a, Value::Int(2)).unwrap();
    let second = memory.freeze_copy();
    memory.set(a, Value::Int(3)).unwrap();
    memory.freeze_copy();
    assert_eq!(memory.depth(), 3);

    memory.restore_copy(second).unwrap();
    assert_eq!(memory.depth(), 1);
    assert_eq!(int(&memory, a), 2);

    memory.restore_copy(first).unwrap();
    assert_eq!(memory.depth(), 0);
    assert_eq!(int(&memory, a), 1);

    assert_eq!(
        memory.restore_copy(second),
        Err(MemoryError::StaleGenerationHandle { depth: 1 })
    );
}

#[test]
fn test_restore_rejects_foreign_handle() {
    let mut ours: MemoryManager<Value> = MemoryManager::new();
    let mut theirs: MemoryManager<Value> = MemoryManager::new();
    let handle = theirs.freeze_copy();
    assert_eq!(
        ours.restore_copy(handle),
        Err(MemoryError::ForeignGenerationHandle {
            expected: ours.id(),
            found: theirs.id(),
        })
    );
}

#[test]
fn test_rollback_root_fails() {
    let mut memory: MemoryManager<Value> = MemoryManager::new();
    assert_eq!(
        memory.rollback_copy(),
        Err(MemoryError::CannotRollbackRootGeneration)
    );
}

#[test]
fn test_persistent_stack_view() {
    let mut memory = MemoryManager::new();
    for c in ["a", "b", "c", "d"] {
        memory.push_stack(Value::Text(c.to_string()));
    }

    memory.freeze_copy();
    let popped: Vec<Value> = (0..4).map(|_| memory.pop_stack().unwrap()).collect();
    assert_eq!(
        popped,
        vec![
            Value::Text("d".to_string()),
            Value::Text("c".to_string()),
            Value::Text("b".to_string()),
            Value::Text("a".to_string()),
        ]
    );
    assert_eq!(memory.pop_stack(), Err(MemoryError::EmptyStackUnderflow));

    memory.rollback_copy().unwrap();
    assert_eq!(memory.stack_len(), 4);
    assert_eq!(memory.peek_stack(0), Ok(&Value::Text("a".to_string())));
    assert_eq!(memory.peek_stack(3), Ok(&Value::Text("d".to_string())));
}

#[test]
fn test_child_pushes_over_partially_popped_prefix() {
    let mut memory = MemoryManager::new();
    memory.push_stack(Value::Int(1));
    memory.push_stack(Value::Int(2));
    memory.freeze_copy();

    assert_eq!(memory.pop_stack(), Ok(Value::Int(2)));
    memory.push_stack(Value::Int(9));
    let view = memory.inspect().unwrap();
    assert_eq!(view.stack, vec![Value::Int(1), Value::Int(9)]);
    assert_eq!(view.inherited_stack, 1);
}

#[test]
fn test_set_get_round_trip() {
    let mut memory = MemoryManager::new();
    let r = memory.add(Value::Null).unwrap();
    let value = Value::List(vec![Value::Int(-4), Value::Text("x".to_string())]);
    memory.set(r, value.clone()).unwrap();
    assert_eq!(memory.get(r), Ok(&value));
}

#[test]
fn test_pin_unpin_does_not_free() {
    let mut memory = MemoryManager::new();
    let r = memory.add(Value::Int(5)).unwrap();
    assert_eq!(memory.increase_reference_count(r), Ok(1));
    assert_eq!(memory.decrease_reference_count(r), Ok(0));
    assert_eq!(int(&memory, r), 5);
    assert_eq!(memory.used_cells(), 1);

    assert_eq!(
        memory.decrease_reference_count(r),
        Err(MemoryError::ReferenceCountUnderflow {
            position: r.position()
        })
    );
}

#[test]
fn test_remove_referenced_cell_fails() {
    let mut memory = MemoryManager::new();
    let target = memory.add(Value::Int(1)).unwrap();
    memory.add(Value::Ref(target)).unwrap();
    assert_eq!(
        memory.remove(target),
        Err(MemoryError::ReferencedCellFreed {
            position: target.position(),
            reference_count: 1,
        })
    );
    assert_eq!(int(&memory, target), 1);
}

#[test]
fn test_access_after_free_faults() {
    let mut memory = MemoryManager::new();
    let r = memory.add(Value::Int(1)).unwrap();
    memory.remove(r).unwrap();
    let fault = MemoryError::HeapSegmentationFault {
        position: r.position(),
    };
    assert_eq!(memory.get(r), Err(fault.clone()));
    assert_eq!(memory.set(r, Value::Null), Err(fault.clone()));
    assert_eq!(memory.remove(r), Err(fault));
    assert!(memory.get(Reference::new(99)).is_err());
}

#[test]
fn test_rollback_restores_allocation_state() {
    let mut memory = MemoryManager::new();
    let a = memory.add(Value::Int(1)).unwrap();
    let b = memory.add(Value::Int(2)).unwrap();
    memory.add(Value::Int(3)).unwrap();
    memory.remove(b).unwrap();
    memory.increase_reference_count(a).unwrap();
    memory.push_stack(Value::Ref(a));

    let before = memory.inspect().unwrap();

    memory.freeze_copy();
    for i in 0..5 {
        memory.add(Value::Int(10 + i)).unwrap();
    }
    memory.remove(a).unwrap_err();
    memory.push_stack(Value::Null);
    memory.pop_stack().unwrap();
    memory.pop_stack().unwrap();
    memory.rollback_copy().unwrap();

    let after = memory.inspect().unwrap();
    assert_eq!(after.free_head, before.free_head);
    assert_eq!(after.heap_size, before.heap_size);
    assert_eq!(after.used_cells, before.used_cells);
    assert_eq!(after.stack, before.stack);
    assert_eq!(after.cells, before.cells);
}

#[test]
fn test_clear_starts_fresh_root() {
    let mut memory = MemoryManager::new();
    memory.add(Value::Int(1)).unwrap();
    memory.push_stack(Value::Int(2));
    let handle = memory.freeze_copy();
    memory.clear();

    assert_eq!(memory.depth(), 0);
    assert_eq!(memory.heap_size(), 0);
    assert_eq!(memory.stack_len(), 0);
    assert!(matches!(
        memory.restore_copy(handle),
        Err(MemoryError::StaleGenerationHandle { .. })
    ));
}

#[test]
fn test_heap_capacity() {
    let mut memory = MemoryManager::with_config(MemoryConfig::new(2));
    assert_eq!(memory.config().heap_capacity, 2);
    let a = memory.add(Value::Int(1)).unwrap();
    memory.add(Value::Int(2)).unwrap();
    assert_eq!(
        memory.add(Value::Ref(a)),
        Err(MemoryError::OutOfMemory { capacity: 2 })
    );
    // The failed add must not leave an edge behind
    assert_eq!(memory.reference_count(a), Ok(0));
}

#[test]
fn test_inspect_reports_owner_depth() {
    let mut memory = MemoryManager::new();
    let a = memory.add(Value::Int(1)).unwrap();
    let b = memory.add(Value::Int(2)).unwrap();
    memory.freeze_copy();
    memory.set(b, Value::Int(3)).unwrap();

    let view = memory.inspect().unwrap();
    assert_eq!(view.depth(), 1);
    assert_eq!(view.generations.len(), 2);
    assert_eq!(view.generations[1].owned_cells, 1);
    assert_eq!(view.cells[a.position()].owner_depth, 0);
    assert_eq!(view.cells[b.position()].owner_depth, 1);
}

// Integration tests for generation-scoped garbage collection

use strata::memory::{MemoryManager, Reference, Value};

/// Builds the classic scenario:
/// - C3: inherited from the root, unreferenced
/// - C0 <-> C1: local cycle
/// - C2: local, unreferenced
/// - C4: local, references itself
fn scenario() -> (MemoryManager<Value>, [Reference; 5]) {
    let mut memory = MemoryManager::new();
    let c3 = memory.add(Value::Text("inherited".to_string())).unwrap();
    memory.freeze_copy();

    let c0 = memory.add(Value::Int(0)).unwrap();
    let c1 = memory.add(Value::Ref(c0)).unwrap();
    memory.set(c0, Value::Ref(c1)).unwrap();
    let c2 = memory.add(Value::Int(2)).unwrap();
    let c4 = memory.add(Value::Null).unwrap();
    memory.set(c4, Value::Ref(c4)).unwrap();

    (memory, [c0, c1, c2, c3, c4])
}

#[test]
fn test_only_local_unreferenced_cell_is_freed() {
    let (mut memory, [c0, c1, c2, c3, c4]) = scenario();

    let stats = memory.spatial_garbage_collect().unwrap();
    assert_eq!(stats.freed, vec![c2.position()]);

    assert!(memory.get(c2).is_err());
    for survivor in [c0, c1, c3, c4] {
        assert!(memory.get(survivor).is_ok(), "{} was collected", survivor);
    }
    assert_eq!(memory.free_head(), Some(c2.position()));
}

#[test]
fn test_collection_never_touches_ancestors() {
    let (mut memory, [_, _, _, c3, _]) = scenario();
    memory.spatial_garbage_collect().unwrap();
    assert!(!memory.is_local(c3));

    memory.rollback_copy().unwrap();
    assert_eq!(memory.get(c3), Ok(&Value::Text("inherited".to_string())));
    assert_eq!(memory.heap_size(), 1);
}

#[test]
fn test_stack_references_are_roots() {
    let mut memory = MemoryManager::new();
    let held = memory.add(Value::Int(1)).unwrap();
    let child = memory.add(Value::Int(2)).unwrap();
    memory.set(held, Value::List(vec![Value::Ref(child)])).unwrap();
    let loose = memory.add(Value::Int(3)).unwrap();
    memory.push_stack(Value::Ref(held));

    let stats = memory.spatial_garbage_collect().unwrap();
    assert_eq!(stats.freed, vec![loose.position()]);
    assert!(memory.get(held).is_ok());
    assert!(memory.get(child).is_ok());
}

#[test]
fn test_freed_garbage_releases_surviving_targets() {
    let mut memory = MemoryManager::new();
    let target = memory.add(Value::Int(1)).unwrap();
    memory.increase_reference_count(target).unwrap();
    // Garbage that points at a pinned survivor
    memory.add(Value::Ref(target)).unwrap();
    assert_eq!(memory.reference_count(target), Ok(2));

    memory.spatial_garbage_collect().unwrap();
    assert_eq!(memory.reference_count(target), Ok(1));
}

#[test]
fn test_freed_garbage_releases_inherited_targets() {
    let mut memory = MemoryManager::new();
    let target = memory.add(Value::Int(1)).unwrap();
    let holder = memory.add(Value::List(vec![Value::Ref(target)])).unwrap();
    memory.freeze_copy();

    // Pinning shifts the holder into the child; unpinning leaves it garbage
    memory.increase_reference_count(holder).unwrap();
    memory.decrease_reference_count(holder).unwrap();
    assert!(memory.is_local(holder));
    assert!(!memory.is_local(target));

    let stats = memory.spatial_garbage_collect().unwrap();
    assert_eq!(stats.freed, vec![holder.position()]);
    assert_eq!(memory.reference_count(target), Ok(0));
    assert!(memory.is_local(target));
    assert_eq!(memory.remove(target), Ok(()));

    // The root still sees both cells with the original edge
    memory.rollback_copy().unwrap();
    assert_eq!(memory.reference_count(target), Ok(1));
    assert!(memory.get(holder).is_ok());
}

#[test]
fn test_collecting_twice_is_stable() {
    let (mut memory, _) = scenario();
    memory.spatial_garbage_collect().unwrap();
    let used = memory.used_cells();
    let second = memory.spatial_garbage_collect().unwrap();
    assert!(second.freed.is_empty());
    assert_eq!(memory.used_cells(), used);
}

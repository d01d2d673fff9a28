//! Heap Lifecycle Integration Tests
//!
//! Covers heap bring-up, the frozen reserved regions, reference-processor
//! ownership, remembered-set delegation, and diagnostics output.

use gen_heap::{object, GenHeap, GenHeapConfig, GenLevel, GenerationSpec};
use heap_types::{Address, HeapError};

/// Test: bring-up builds exactly one non-terminal young generation and one
/// terminal old generation.
#[test]
fn test_two_level_heap_shape() {
    let heap = GenHeap::new(&GenHeapConfig::default()).unwrap();

    assert_eq!(heap.young().level(), GenLevel::Young);
    assert_eq!(heap.old().level(), GenLevel::Old);
    assert!(heap.young().next_gen(&heap).is_some());
    assert!(heap.old().next_gen(&heap).is_none());
}

/// Test: invalid generation sizes surface as errors for bring-up to treat
/// as fatal.
#[test]
fn test_bringup_rejects_invalid_sizes() {
    let mut config = GenHeapConfig::default();
    config.young.initial_bytes = config.young.reserved_bytes * 2;

    match GenHeap::new(&config) {
        Err(HeapError::CommitBeyondReserved { .. }) => {}
        other => panic!("expected CommitBeyondReserved, got {:?}", other.err()),
    }
}

/// Test: reserved regions of the two generations are disjoint and each
/// equals its generation's max capacity.
#[test]
fn test_reserved_regions_disjoint_and_sized() {
    let heap = GenHeap::new(&GenHeapConfig::default()).unwrap();

    let young = heap.young().reserved();
    let old = heap.old().reserved();
    assert_eq!(young.byte_size(), heap.young().max_capacity());
    assert_eq!(old.byte_size(), heap.old().max_capacity());
    assert!(
        young.end() <= old.start() || old.end() <= young.start(),
        "generation reservations must not overlap"
    );
}

/// Test: each generation lazily owns a reference processor scoped to its
/// reserved region.
#[test]
fn test_reference_processor_per_generation() {
    let mut heap = GenHeap::new(&GenHeapConfig::default()).unwrap();

    heap.young_mut().ref_processor_init();
    heap.old_mut().ref_processor_init();

    let young_span = heap.young().ref_processor().unwrap().span();
    let old_span = heap.old().ref_processor().unwrap().span();
    assert_eq!(young_span, heap.young().reserved());
    assert_eq!(old_span, heap.old().reserved());

    // Discovery respects the span boundary between generations.
    let in_old = heap.old().reserved().start();
    assert!(!heap
        .young_mut()
        .ref_processor_mut()
        .unwrap()
        .discover_reference(in_old));
}

/// Test: remembered-set delegation visits only slots recorded in the
/// queried space.
#[test]
fn test_younger_refs_delegation() {
    let mut heap = GenHeap::new(&GenHeapConfig::default()).unwrap();

    // An old-generation object holding a reference to a young one.
    let young_obj = heap.young_mut().allocate(8).unwrap();
    object::write_object(young_obj, 8, &[]);
    let old_obj = heap.old_mut().allocate(8).unwrap();
    object::write_object(old_obj, 8, &[young_obj]);

    let slot = old_obj.offset_words(gen_heap::HEADER_WORDS);
    heap.rem_set().record(slot);

    let old_space = heap.old().space_containing(old_obj).unwrap();
    let mut visited = Vec::new();
    heap.old()
        .younger_refs_in_space_iterate(heap.rem_set(), old_space, &mut |s| visited.push(s));
    assert_eq!(visited, vec![slot]);

    // The same query against a young space visits nothing.
    let young_space = heap.young().space_containing(young_obj).unwrap();
    let mut visited = Vec::new();
    heap.young()
        .younger_refs_in_space_iterate(heap.rem_set(), young_space, &mut |s| visited.push(s));
    assert!(visited.is_empty());
}

/// Test: on a fully published heap, safe_object_iterate and object_iterate
/// agree. Tolerance of a mid-publication block is covered at the space
/// level, where the transitional header state can be constructed.
#[test]
fn test_safe_object_iterate_matches_object_iterate_when_published() {
    let mut heap = GenHeap::new(&GenHeapConfig::default()).unwrap();

    for size in [8, 24, 16] {
        let obj = heap.young_mut().allocate(size).unwrap();
        object::write_object(obj, size, &[]);
    }

    let mut plain = Vec::new();
    heap.young().object_iterate(&mut |obj| plain.push(obj));
    let mut safe = Vec::new();
    heap.young().safe_object_iterate(&mut |obj| safe.push(obj));
    assert_eq!(plain.len(), 3);
    assert_eq!(plain, safe);
}

/// Test: diagnostics summarize name, capacity, usage, and accumulated
/// collection statistics.
#[test]
fn test_diagnostic_summary() {
    let mut heap = GenHeap::new(&GenHeapConfig {
        young: GenerationSpec::new("young generation", GenLevel::Young, 8 * 1024),
        old: GenerationSpec::new("old generation", GenLevel::Old, 32 * 1024),
    })
    .unwrap();

    heap.young_mut()
        .update_gc_stats(std::time::Duration::from_millis(3));

    let summary = heap.summary();
    assert!(summary.contains("young generation"));
    assert!(summary.contains("total 8K"));
    assert!(summary.contains("1 GC's"));
    assert!(summary.contains("Accumulated GC generation 1"));
}

/// Test: a generation's containment answers stay exact across allocation
/// and reclamation.
#[test]
fn test_containment_lifecycle() {
    let mut heap = GenHeap::new(&GenHeapConfig::default()).unwrap();

    let probe = Address::new(0x10);
    assert!(!heap.young().is_in(probe));

    let obj = heap.young_mut().allocate(16).unwrap();
    object::write_object(obj, 16, &[]);
    assert!(heap.young().is_in(obj));
    assert!(heap.young().is_in_reserved(obj));
    assert_eq!(heap.young().block_start(obj.offset_words(3)), Some(obj));

    heap.young_mut().clear();
    assert!(!heap.young().is_in(obj));
    assert!(heap.young().is_in_reserved(obj));
}

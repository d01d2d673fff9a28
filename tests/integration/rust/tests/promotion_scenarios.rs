//! Promotion Scenario Integration Tests
//!
//! Exercises the promotion protocol end to end across a two-generation heap:
//! in-generation success, escalation through the failed-promotion handler,
//! and the cross-generation capacity checks that gate a scavenge.

use gen_heap::{object, GenHeap, GenHeapConfig, GenLevel};

/// Test: default heap layout (young 1 MiB, old 4 MiB), both empty.
/// Promoting a 64-word object into the young generation succeeds and the
/// result is contained there, not in the old generation.
#[test]
fn test_promotion_succeeds_in_young_generation() {
    let mut heap = GenHeap::new(&GenHeapConfig::default()).unwrap();
    assert_eq!(heap.young().max_capacity(), 1024 * 1024);
    assert_eq!(heap.old().max_capacity(), 4 * 1024 * 1024);

    let obj = heap.young_mut().allocate(64).unwrap();
    object::write_object(obj, 64, &[]);

    let new = heap.promote(GenLevel::Young, obj, 64).unwrap();
    assert!(heap.young().is_in(new), "promoted copy must be in young gen");
    assert!(!heap.old().is_in(new), "promoted copy must not be in old gen");
}

/// Test: with the young generation filled to zero contiguous availability,
/// promoting a 64-word object invokes the failed-promotion handler, which
/// locates space in the old generation.
#[test]
fn test_failed_promotion_is_handled_in_old_generation() {
    let mut heap = GenHeap::new(&GenHeapConfig::default()).unwrap();

    let obj = heap.young_mut().allocate(64).unwrap();
    object::write_object(obj, 64, &[]);

    let rest = heap.young().contiguous_available();
    heap.young_mut().allocate(rest).unwrap();
    assert_eq!(heap.young().contiguous_available(), 0);

    let new = heap.promote(GenLevel::Young, obj, 64).unwrap();
    assert!(!heap.young().is_in(new));
    assert!(heap.old().is_in(new), "handler must find space in old gen");
    assert_eq!(object::size_at(new), 64);
}

/// Test: max_contiguous_available on the young generation equals the larger
/// of the two generations' contiguous availability, and shrinks as they fill.
#[test]
fn test_max_contiguous_available_tracks_chain() {
    let mut heap = GenHeap::new(&GenHeapConfig::default()).unwrap();

    let expected = heap
        .young()
        .contiguous_available()
        .max(heap.old().contiguous_available());
    assert_eq!(heap.young().max_contiguous_available(&heap), expected);

    // Consume most of the old generation; the chain maximum follows.
    let old_avail = heap.old().contiguous_available();
    heap.old_mut().allocate(old_avail - 32).unwrap();
    let expected = heap
        .young()
        .contiguous_available()
        .max(heap.old().contiguous_available());
    assert_eq!(heap.young().max_contiguous_available(&heap), expected);
}

/// Test: promotion_attempt_is_safe is inclusive at the exact boundary.
#[test]
fn test_promotion_safety_boundary() {
    let mut heap = GenHeap::new(&GenHeapConfig::default()).unwrap();

    // Make the old generation the constraining side.
    let young_avail = heap.young().contiguous_available();
    heap.young_mut().allocate(young_avail).unwrap();

    let max = heap.young().max_contiguous_available(&heap);
    assert_eq!(max, heap.old().contiguous_available());
    assert!(heap.young().promotion_attempt_is_safe(&heap, max));
    assert!(!heap.young().promotion_attempt_is_safe(&heap, max + 1));
}

/// Test: a promoted object's source address leaves the young generation once
/// the young generation reclaims it.
#[test]
fn test_source_address_reclaimed_after_promotion() {
    let mut heap = GenHeap::new(&GenHeapConfig::default()).unwrap();

    let obj = heap.young_mut().allocate(64).unwrap();
    object::write_object(obj, 64, &[]);

    let new = heap.promote(GenLevel::Old, obj, 64).unwrap();
    assert!(heap.old().is_in(new));
    assert!(heap.young().is_in(obj));

    heap.young_mut().clear();
    assert!(!heap.young().is_in(obj));
    assert!(heap.old().is_in(new));
}

/// Test: par_promote on the base generation type fails fatally rather than
/// silently returning an address.
#[test]
#[should_panic(expected = "does not support parallel promotion")]
fn test_par_promote_fails_fatally() {
    let mut heap = GenHeap::new(&GenHeapConfig::default()).unwrap();
    let obj = heap.young_mut().allocate(64).unwrap();
    object::write_object(obj, 64, &[]);

    heap.old_mut().par_promote(1, obj, 0, 64);
}

/// Test: the debug-only hook forces the promotion failure path
/// deterministically.
#[cfg(debug_assertions)]
#[test]
fn test_forced_promotion_failure_path() {
    let mut heap = GenHeap::new(&GenHeapConfig::default()).unwrap();
    let obj = heap.young_mut().allocate(64).unwrap();
    object::write_object(obj, 64, &[]);

    heap.young_mut().force_promotion_failure(true);
    assert_eq!(heap.promote(GenLevel::Young, obj, 64), None);

    heap.young_mut().force_promotion_failure(false);
    assert!(heap.promote(GenLevel::Young, obj, 64).is_some());
}

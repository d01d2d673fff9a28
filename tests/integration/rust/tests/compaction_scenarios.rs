//! Compaction Scenario Integration Tests
//!
//! Exercises the full three-pass compaction protocol over a generation with
//! multiple chained compactible spaces, verifying reference consistency and
//! non-overlap of final object extents.

use gen_heap::{object, CompactPoint, GenLevel, Generation, GenerationSpec};
use heap_types::Address;

fn two_space_generation() -> Generation {
    let spec = GenerationSpec {
        name: "compaction gen".to_string(),
        level: GenLevel::Old,
        initial_bytes: 64 * 1024,
        reserved_bytes: 64 * 1024,
        space_count: 2,
    };
    Generation::new(&spec).unwrap()
}

/// Fills space 0 so the next allocation lands in space 1, returning the
/// filler's address.
fn fill_first_space(gen: &mut Generation) -> Address {
    let words = gen.space_at(0).free_words();
    let filler = gen.allocate(words).unwrap();
    object::write_object(filler, words, &[]);
    filler
}

/// Test: two compactible spaces holding live objects that reference each
/// other across the space boundary. Running prepare -> adjust -> compact
/// leaves every reference pointing at its referent's final address.
#[test]
fn test_cross_space_references_survive_compaction() {
    let mut gen = two_space_generation();

    let a = gen.allocate(16).unwrap();
    let dead = gen.allocate(32).unwrap();
    object::write_object(dead, 32, &[]);
    fill_first_space(&mut gen);

    let b = gen.allocate(16).unwrap();
    assert!(b >= gen.space_at(1).bottom(), "b must be in the second space");

    object::write_object(a, 16, &[b]);
    object::write_object(b, 16, &[a]);
    object::set_mark_at(a, true);
    object::set_mark_at(b, true);

    let mut cp = CompactPoint::new(gen.compaction_dests());
    gen.prepare_for_compaction(&mut cp);
    gen.adjust_pointers(cp.forwarding());
    gen.compact(cp.forwarding());

    // Survivors slide to the front of the first space.
    let new_a = gen.space_at(0).bottom();
    let new_b = new_a.offset_words(16);
    assert_eq!(object::ref_slot(new_a, 0), new_b);
    assert_eq!(object::ref_slot(new_b, 0), new_a);
    assert_eq!(object::size_at(new_a), 16);
    assert_eq!(object::size_at(new_b), 16);
}

/// Test: after compaction no live object overlaps another's final extent,
/// and the generation parses cleanly end to end.
#[test]
fn test_final_extents_do_not_overlap() {
    let mut gen = two_space_generation();

    // A mix of live and dead objects across both spaces.
    let mut live = Vec::new();
    for i in 0..8 {
        let size = 8 + (i % 3) * 4;
        let obj = gen.allocate(size).unwrap();
        object::write_object(obj, size, &[]);
        if i % 2 == 0 {
            object::set_mark_at(obj, true);
            live.push(size);
        }
    }
    fill_first_space(&mut gen);
    for i in 0..4 {
        let size = 12 + (i % 2) * 8;
        let obj = gen.allocate(size).unwrap();
        object::write_object(obj, size, &[]);
        object::set_mark_at(obj, true);
        live.push(size);
    }

    let mut cp = CompactPoint::new(gen.compaction_dests());
    gen.prepare_for_compaction(&mut cp);
    gen.adjust_pointers(cp.forwarding());
    gen.compact(cp.forwarding());

    // Every survivor parses back in placement order, adjacent and
    // non-overlapping.
    let mut extents: Vec<(Address, usize)> = Vec::new();
    gen.object_iterate(&mut |obj| extents.push((obj, object::size_at(obj))));
    assert_eq!(
        extents.iter().map(|(_, s)| *s).collect::<Vec<_>>(),
        live,
        "survivors must keep their sizes in placement order"
    );
    for pair in extents.windows(2) {
        let (prev, prev_size) = pair[0];
        let (next, _) = pair[1];
        assert!(
            prev.offset_words(prev_size) <= next,
            "live extents must not overlap"
        );
    }
}

/// Test: compacting a fully live generation moves nothing and keeps usage
/// identical.
#[test]
fn test_fully_live_generation_is_stable_under_compaction() {
    let mut gen = two_space_generation();

    let a = gen.allocate(24).unwrap();
    object::write_object(a, 24, &[]);
    object::set_mark_at(a, true);
    let b = gen.allocate(8).unwrap();
    object::write_object(b, 8, &[a]);
    object::set_mark_at(b, true);
    let used_before = gen.used();

    let mut cp = CompactPoint::new(gen.compaction_dests());
    gen.prepare_for_compaction(&mut cp);
    gen.adjust_pointers(cp.forwarding());
    gen.compact(cp.forwarding());

    assert_eq!(gen.used(), used_before);
    assert_eq!(object::ref_slot(b, 0), a, "references must be unchanged");
    assert!(!object::is_marked_at(a));
    assert!(!object::is_marked_at(b));
}

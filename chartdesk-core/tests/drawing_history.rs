//! Undo/redo invariants for the drawing store.
//!
//! 1. Inverse law: k undos after k mutations restore the starting list,
//!    and k redos restore the final list
//! 2. Redo invalidation: any new mutation after an undo empties redo
//! 3. Gesture coalescing: one drag is one undo step

use chartdesk_core::domain::{Segment, Shape};
use chartdesk_core::drawing::{DragHistory, DrawingStore};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_coord() -> impl Strategy<Value = f64> {
    (0.0..800.0_f64).prop_map(|v| v.round())
}

fn arb_shape() -> impl Strategy<Value = Shape> {
    prop_oneof![
        (arb_coord(), arb_coord(), arb_coord(), arb_coord())
            .prop_map(|(a, b, c, d)| Shape::Trendline(Segment::new(a, b, c, d))),
        (arb_coord(), arb_coord(), arb_coord(), arb_coord())
            .prop_map(|(a, b, c, d)| Shape::Rectangle(Segment::new(a, b, c, d))),
        (arb_coord(), arb_coord(), arb_coord(), arb_coord())
            .prop_map(|(a, b, c, d)| Shape::Fib(Segment::new(a, b, c, d))),
        arb_coord().prop_map(|y| Shape::Hline { y }),
        (arb_coord(), arb_coord(), "[a-z]{1,8}").prop_map(|(x, y, text)| Shape::Text { x, y, text }),
    ]
}

#[derive(Debug, Clone)]
enum Op {
    Add(Shape),
    Remove(usize),
    Update(usize, Shape),
    Clear,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => arb_shape().prop_map(Op::Add),
        2 => (0..6usize).prop_map(Op::Remove),
        2 => (0..6usize, arb_shape()).prop_map(|(i, s)| Op::Update(i, s)),
        1 => Just(Op::Clear),
    ]
}

/// Apply `op`; returns whether it recorded history.
fn apply(store: &mut DrawingStore, op: &Op) -> bool {
    match op {
        Op::Add(shape) => {
            store.add_drawing(shape.clone());
            true
        }
        Op::Remove(i) => store.remove_drawing(*i),
        Op::Update(i, shape) => store.update_drawing(*i, shape.clone()),
        Op::Clear => store.clear_drawings(),
    }
}

proptest! {
    #[test]
    fn undo_redo_inverse_law(
        initial in prop::collection::vec(arb_shape(), 0..4),
        ops in prop::collection::vec(arb_op(), 0..20),
    ) {
        let mut store = DrawingStore::with_drawings(initial.clone());
        let recorded = ops.iter().filter(|op| apply(&mut store, op)).count();
        let final_list = store.drawings().to_vec();
        prop_assert_eq!(store.undo_depth(), recorded);

        for _ in 0..recorded {
            prop_assert!(store.undo());
        }
        prop_assert_eq!(store.drawings(), initial.as_slice());
        prop_assert!(!store.can_undo());

        for _ in 0..recorded {
            prop_assert!(store.redo());
        }
        prop_assert_eq!(store.drawings(), final_list.as_slice());
        prop_assert!(!store.can_redo());
    }

    #[test]
    fn new_mutation_invalidates_redo(
        shapes in prop::collection::vec(arb_shape(), 1..6),
        undos in 1..6usize,
        extra in arb_shape(),
    ) {
        let mut store = DrawingStore::new();
        for s in &shapes {
            store.add_drawing(s.clone());
        }
        for _ in 0..undos.min(shapes.len()) {
            store.undo();
        }
        prop_assert!(store.can_redo());
        store.add_drawing(extra);
        prop_assert!(!store.can_redo());
        prop_assert!(!store.redo());
    }

    #[test]
    fn history_limit_bounds_depth(
        shapes in prop::collection::vec(arb_shape(), 0..30),
        limit in 1..10usize,
    ) {
        let mut store = DrawingStore::new();
        store.configure(DragHistory::PerGesture, limit);
        for s in shapes.iter().cloned() {
            store.add_drawing(s);
        }
        prop_assert_eq!(store.undo_depth(), shapes.len().min(limit));
    }
}

#[test]
fn redo_is_cleared_by_a_new_edit() {
    // GIVEN two committed shapes and one undo
    let a = Shape::Hline { y: 1.0 };
    let b = Shape::Hline { y: 2.0 };
    let mut store = DrawingStore::new();
    store.add_drawing(a.clone());
    store.add_drawing(b);
    assert!(store.undo());

    // WHEN a new shape is added
    store.add_drawing(Shape::Hline { y: 3.0 });

    // THEN redo is no longer possible and undo walks back through the new branch
    assert!(!store.can_redo());
    assert!(store.undo());
    assert_eq!(store.drawings(), &[a]);
}

#[test]
fn gesture_coalesces_updates_into_one_step() {
    let line = Shape::Trendline(Segment::new(0.0, 0.0, 10.0, 10.0));
    let mut store = DrawingStore::with_drawings(vec![line.clone()]);

    store.begin_gesture();
    for step in 1..=5 {
        let d = step as f64;
        store.update_drawing(0, Shape::Trendline(Segment::new(d, d, 10.0 + d, 10.0 + d)));
    }
    store.end_gesture();

    assert_eq!(store.undo_depth(), 1);
    assert!(store.undo());
    assert_eq!(store.drawings(), &[line]);
}

#[test]
fn per_move_history_records_every_update() {
    let mut store = DrawingStore::with_drawings(vec![Shape::Hline { y: 0.0 }]);
    store.configure(DragHistory::PerMove, 0);

    store.begin_gesture();
    for y in 1..=4 {
        store.update_drawing(0, Shape::Hline { y: y as f64 });
    }
    store.end_gesture();

    assert_eq!(store.undo_depth(), 4);
}

#[test]
fn empty_gesture_leaves_history_untouched() {
    let mut store = DrawingStore::with_drawings(vec![Shape::Hline { y: 0.0 }]);
    store.begin_gesture();
    store.end_gesture();
    assert!(!store.can_undo());
}

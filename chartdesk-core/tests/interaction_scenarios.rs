//! End-to-end pointer and keyboard scenarios through the router.

use chartdesk_core::domain::{Point, Segment, Shape, ShapeKind};
use chartdesk_core::drawing::{AnchorKind, DrawingStore, Tool, Viewport};
use chartdesk_core::interaction::{
    resolve_shortcut, ContainerRect, InputFocus, InteractionConfig, InteractionRouter, Key, KeyChord,
    PointerEvent, PointerKind, RouterOutcome, Shortcut,
};

fn setup() -> (InteractionRouter, DrawingStore) {
    let mut router = InteractionRouter::new(InteractionConfig::default());
    router.set_viewport(Viewport::new(800.0, 400.0));
    (router, DrawingStore::new())
}

fn ev(kind: PointerKind, x: f64, y: f64) -> PointerEvent {
    PointerEvent {
        kind,
        at: Point::new(x, y),
    }
}

#[test]
fn trendline_draw_from_client_coordinates() {
    // GIVEN a chart container at (200, 100) and the trendline tool
    let (mut router, mut store) = setup();
    let rect = ContainerRect::new(200.0, 100.0, 800.0, 400.0);
    router.set_viewport(rect.viewport());
    router.activate_tool(&mut store, Tool::Trendline);

    // WHEN the pointer drags from client (210,110) to (250,150)
    for (kind, x, y) in [
        (PointerKind::Down, 210.0, 110.0),
        (PointerKind::Move, 230.0, 130.0),
        (PointerKind::Up, 250.0, 150.0),
    ] {
        let local = rect.to_local(Point::new(x, y));
        router.handle(&mut store, ev(kind, local.x, local.y));
    }

    // THEN one trendline exists in chart-local space and undo is available
    assert_eq!(store.drawings(), &[Shape::Trendline(Segment::new(10.0, 10.0, 50.0, 50.0))]);
    assert!(store.draft().is_none());
    assert!(store.can_undo());
    assert!(!store.can_redo());
}

#[test]
fn erase_then_single_undo_restores_everything() {
    // GIVEN three shapes
    let shapes = vec![
        Shape::Hline { y: 10.0 },
        Shape::Trendline(Segment::new(0.0, 0.0, 40.0, 40.0)),
        Shape::Text {
            x: 5.0,
            y: 5.0,
            text: "hi".into(),
        },
    ];
    let (mut router, _) = setup();
    let mut store = DrawingStore::with_drawings(shapes.clone());

    // WHEN erase is activated
    assert_eq!(router.activate_tool(&mut store, Tool::Erase), RouterOutcome::Cleared);
    assert!(store.is_empty());
    assert_eq!(store.tool(), Tool::Select);

    // THEN one undo brings all three back
    assert_eq!(router.apply_shortcut(&mut store, Shortcut::Undo), RouterOutcome::Undone);
    assert_eq!(store.drawings(), shapes.as_slice());
}

#[test]
fn erase_on_empty_list_records_nothing() {
    let (mut router, mut store) = setup();
    assert_eq!(router.activate_tool(&mut store, Tool::Erase), RouterOutcome::Ignored);
    assert!(!store.can_undo());
}

#[test]
fn every_drag_tool_commits_its_kind() {
    for (tool, kind) in [
        (Tool::Trendline, ShapeKind::Trendline),
        (Tool::Rectangle, ShapeKind::Rectangle),
        (Tool::Arrow, ShapeKind::Arrow),
        (Tool::Fib, ShapeKind::Fib),
    ] {
        let (mut router, mut store) = setup();
        router.activate_tool(&mut store, tool);
        router.pointer_down(&mut store, Point::new(0.0, 0.0));
        assert_eq!(router.pointer_up(&mut store, Point::new(20.0, 0.0)), RouterOutcome::Committed(kind));
        assert_eq!(store.drawings()[0].kind(), kind);
    }
}

#[test]
fn min_drag_threshold_boundary() {
    // Displacement must exceed the threshold, not merely equal it.
    let (mut router, mut store) = setup();
    router.activate_tool(&mut store, Tool::Arrow);
    router.pointer_down(&mut store, Point::new(0.0, 0.0));
    assert_eq!(router.pointer_up(&mut store, Point::new(3.0, 0.0)), RouterOutcome::DraftDiscarded);
    router.pointer_down(&mut store, Point::new(0.0, 0.0));
    assert_eq!(
        router.pointer_up(&mut store, Point::new(3.1, 0.0)),
        RouterOutcome::Committed(ShapeKind::Arrow)
    );
    assert_eq!(store.len(), 1);
}

#[test]
fn endpoint_drag_is_one_undo_step() {
    // GIVEN a selected trendline
    let line = Shape::Trendline(Segment::new(10.0, 10.0, 100.0, 100.0));
    let (mut router, _) = setup();
    let mut store = DrawingStore::with_drawings(vec![line.clone()]);
    assert_eq!(router.pointer_down(&mut store, Point::new(50.0, 50.0)), RouterOutcome::Selected(0));
    router.pointer_up(&mut store, Point::new(50.0, 50.0));

    // WHEN its second endpoint is dragged through several moves
    assert_eq!(
        router.pointer_down(&mut store, Point::new(101.0, 99.0)),
        RouterOutcome::EditStarted(AnchorKind::Endpoint2)
    );
    assert_eq!(store.edit_anchor(), Some(AnchorKind::Endpoint2));
    router.pointer_move(&mut store, Point::new(120.0, 110.0));
    router.pointer_move(&mut store, Point::new(140.0, 120.0));
    router.pointer_up(&mut store, Point::new(150.0, 130.0));

    // THEN the endpoint follows the pointer and one undo restores the original
    assert_eq!(store.drawings(), &[Shape::Trendline(Segment::new(10.0, 10.0, 150.0, 130.0))]);
    assert_eq!(store.edit_anchor(), None);
    assert_eq!(router.pointer_up(&mut store, Point::new(0.0, 0.0)), RouterOutcome::Ignored);
    assert!(store.undo());
    assert_eq!(store.drawings(), &[line]);
    assert!(!store.can_undo());
}

#[test]
fn text_tool_commits_trimmed_text_on_blur() {
    let (mut router, mut store) = setup();
    router.activate_tool(&mut store, Tool::Text);
    assert_eq!(router.pointer_down(&mut store, Point::new(40.0, 60.0)), RouterOutcome::TextEntryOpened);
    assert_eq!(router.focus(), InputFocus::TextField);
    for c in "  buy here ".chars() {
        router.text_input(c);
    }

    // Clicking elsewhere blurs the field; it does not open a second entry.
    assert_eq!(
        router.pointer_down(&mut store, Point::new(300.0, 300.0)),
        RouterOutcome::Committed(ShapeKind::Text)
    );
    assert!(router.text_entry().is_none());
    assert_eq!(
        store.drawings(),
        &[Shape::Text {
            x: 40.0,
            y: 60.0,
            text: "buy here".into()
        }]
    );
}

#[test]
fn escape_cancels_text_entry_without_commit() {
    let (mut router, mut store) = setup();
    router.activate_tool(&mut store, Tool::Text);
    router.pointer_down(&mut store, Point::new(1.0, 1.0));
    router.text_input('x');
    assert_eq!(router.cancel(&mut store), RouterOutcome::TextEntryClosed);
    assert!(store.is_empty());
    assert!(!store.can_undo());
}

#[test]
fn shortcuts_resolve_by_chord_and_focus() {
    assert_eq!(resolve_shortcut(KeyChord::ctrl('z'), InputFocus::Chart), Some(Shortcut::Undo));
    assert_eq!(resolve_shortcut(KeyChord::ctrl_shift('z'), InputFocus::Chart), Some(Shortcut::Redo));
    assert_eq!(resolve_shortcut(KeyChord::ctrl('y'), InputFocus::Chart), Some(Shortcut::Redo));
    assert_eq!(
        resolve_shortcut(KeyChord::plain(Key::Delete), InputFocus::Chart),
        Some(Shortcut::DeleteSelected)
    );
    assert_eq!(resolve_shortcut(KeyChord::ctrl('z'), InputFocus::TextField), None);
}

#[test]
fn undo_redo_through_shortcuts() {
    let (mut router, mut store) = setup();
    router.activate_tool(&mut store, Tool::Hline);
    router.pointer_down(&mut store, Point::new(0.0, 10.0));
    router.pointer_down(&mut store, Point::new(0.0, 20.0));

    assert_eq!(router.apply_shortcut(&mut store, Shortcut::Undo), RouterOutcome::Undone);
    assert_eq!(store.drawings(), &[Shape::Hline { y: 10.0 }]);
    assert_eq!(router.apply_shortcut(&mut store, Shortcut::Redo), RouterOutcome::Redone);
    assert_eq!(store.len(), 2);
    assert_eq!(router.apply_shortcut(&mut store, Shortcut::Redo), RouterOutcome::Ignored);
}

#[test]
fn tool_switch_discards_draft() {
    let (mut router, mut store) = setup();
    router.activate_tool(&mut store, Tool::Rectangle);
    router.pointer_down(&mut store, Point::new(0.0, 0.0));
    router.pointer_move(&mut store, Point::new(30.0, 30.0));
    assert!(store.draft().is_some());

    router.activate_tool(&mut store, Tool::Fib);
    assert!(store.draft().is_none());
    assert_eq!(router.pointer_up(&mut store, Point::new(50.0, 50.0)), RouterOutcome::Ignored);
    assert!(store.is_empty());
}

//! Pointer-event router.
//!
//! Translates chart-local pointer gestures into `DrawingStore` calls
//! according to the active tool. The router owns only transient gesture
//! bookkeeping (open text entry, anchor drag position); the drawing list
//! and history stay in the store.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::shortcuts::{InputFocus, Shortcut};
use crate::domain::{Point, Segment, Shape, ShapeKind};
use crate::drawing::{
    apply_anchor_drag, hit_anchor, hit_test, hits_body, AnchorKind, DragHistory, DrawingStore, HitConfig,
    Tool, Viewport,
};

/// Tunables for pointer handling, loaded from the `[interaction]` config section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Drafts shorter than this are discarded on release.
    pub min_drag_distance: f64,
    pub hit_tolerance: f64,
    pub text_char_width: f64,
    pub text_height: f64,
    /// Horizontal gap between a fib retracement and its level labels.
    pub label_offset: f64,
    pub drag_history: DragHistory,
    /// Maximum undo depth; 0 keeps everything.
    pub history_limit: usize,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            min_drag_distance: 3.0,
            hit_tolerance: 6.0,
            text_char_width: 7.0,
            text_height: 14.0,
            label_offset: 8.0,
            drag_history: DragHistory::PerGesture,
            history_limit: 0,
        }
    }
}

impl InteractionConfig {
    pub fn hit_config(&self) -> HitConfig {
        HitConfig {
            tolerance: self.hit_tolerance,
            text_char_width: self.text_char_width,
            text_height: self.text_height,
        }
    }
}

/// Screen-space rectangle of the chart container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContainerRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ContainerRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Client coordinates to chart-local coordinates.
    pub fn to_local(&self, client: Point) -> Point {
        Point::new(client.x - self.left, client.y - self.top)
    }

    pub fn contains(&self, client: Point) -> bool {
        client.x >= self.left
            && client.x < self.left + self.width
            && client.y >= self.top
            && client.y < self.top + self.height
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
}

/// A pointer event already translated to chart-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub at: Point,
}

/// What a routed event did.
#[derive(Debug, Clone, PartialEq)]
pub enum RouterOutcome {
    Ignored,
    DraftStarted,
    DraftUpdated,
    DraftDiscarded,
    Committed(ShapeKind),
    TextEntryOpened,
    TextEntryClosed,
    Selected(usize),
    SelectionCleared,
    EditStarted(AnchorKind),
    Edited,
    EditFinished,
    EditCancelled,
    Removed(usize),
    Cleared,
    ToolChanged(Tool),
    Undone,
    Redone,
}

/// Inline text entry opened by the text tool.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEntry {
    pub at: Point,
    pub buffer: String,
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    index: usize,
    kind: AnchorKind,
    last: Point,
}

#[derive(Debug, Clone, Default)]
pub struct InteractionRouter {
    config: InteractionConfig,
    viewport: Viewport,
    text_entry: Option<TextEntry>,
    drag: Option<DragState>,
}

impl InteractionRouter {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn text_entry(&self) -> Option<&TextEntry> {
        self.text_entry.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn focus(&self) -> InputFocus {
        if self.text_entry.is_some() {
            InputFocus::TextField
        } else {
            InputFocus::Chart
        }
    }

    /// Drop all transient gesture state (tab or symbol switch).
    pub fn reset(&mut self) {
        self.text_entry = None;
        self.drag = None;
    }

    pub fn handle(&mut self, store: &mut DrawingStore, event: PointerEvent) -> RouterOutcome {
        match event.kind {
            PointerKind::Down => self.pointer_down(store, event.at),
            PointerKind::Move => self.pointer_move(store, event.at),
            PointerKind::Up => self.pointer_up(store, event.at),
        }
    }

    /// Select a tool. Erase clears the drawings and keeps the current tool.
    pub fn activate_tool(&mut self, store: &mut DrawingStore, tool: Tool) -> RouterOutcome {
        if tool == Tool::Erase {
            return if store.clear_drawings() {
                RouterOutcome::Cleared
            } else {
                RouterOutcome::Ignored
            };
        }
        self.text_entry = None;
        self.finish_drag(store);
        store.set_tool(tool);
        RouterOutcome::ToolChanged(tool)
    }

    pub fn pointer_down(&mut self, store: &mut DrawingStore, p: Point) -> RouterOutcome {
        if self.text_entry.is_some() {
            return self.blur_text(store);
        }
        match store.tool() {
            Tool::Hline => {
                store.add_drawing(Shape::Hline { y: p.y });
                RouterOutcome::Committed(ShapeKind::Hline)
            }
            Tool::Text => {
                self.text_entry = Some(TextEntry {
                    at: p,
                    buffer: String::new(),
                });
                RouterOutcome::TextEntryOpened
            }
            Tool::Trendline | Tool::Rectangle | Tool::Arrow | Tool::Fib => {
                match store.tool().shape_kind().and_then(|k| k.with_segment(Segment::at(p))) {
                    Some(draft) => {
                        store.set_draft(draft);
                        RouterOutcome::DraftStarted
                    }
                    None => RouterOutcome::Ignored,
                }
            }
            Tool::Select => self.select_at(store, p),
            Tool::Erase => RouterOutcome::Ignored,
        }
    }

    pub fn pointer_move(&mut self, store: &mut DrawingStore, p: Point) -> RouterOutcome {
        if self.drag.is_some() {
            return self.drag_to(store, p);
        }
        if self.extend_draft(store, p) {
            RouterOutcome::DraftUpdated
        } else {
            RouterOutcome::Ignored
        }
    }

    pub fn pointer_up(&mut self, store: &mut DrawingStore, p: Point) -> RouterOutcome {
        if self.drag.is_some() {
            self.drag_to(store, p);
            self.finish_drag(store);
            return RouterOutcome::EditFinished;
        }
        if !self.extend_draft(store, p) {
            return RouterOutcome::Ignored;
        }
        let Some(draft) = store.take_draft() else {
            return RouterOutcome::Ignored;
        };
        let long_enough = draft
            .segment()
            .is_some_and(|s| s.length() > self.config.min_drag_distance);
        if long_enough {
            let kind = draft.kind();
            store.add_drawing(draft);
            debug!(%kind, "shape committed");
            RouterOutcome::Committed(kind)
        } else {
            RouterOutcome::DraftDiscarded
        }
    }

    // ── Text entry ───────────────────────────────────────────────────────

    pub fn text_input(&mut self, c: char) {
        if let Some(entry) = self.text_entry.as_mut() {
            entry.buffer.push(c);
        }
    }

    pub fn text_backspace(&mut self) {
        if let Some(entry) = self.text_entry.as_mut() {
            entry.buffer.pop();
        }
    }

    /// Commit the entry if it has non-blank text; close it either way.
    pub fn confirm_text(&mut self, store: &mut DrawingStore) -> RouterOutcome {
        let Some(entry) = self.text_entry.take() else {
            return RouterOutcome::Ignored;
        };
        let text = entry.buffer.trim();
        if text.is_empty() {
            return RouterOutcome::TextEntryClosed;
        }
        store.add_drawing(Shape::Text {
            x: entry.at.x,
            y: entry.at.y,
            text: text.to_string(),
        });
        RouterOutcome::Committed(ShapeKind::Text)
    }

    /// Focus left the text field: same as confirming.
    pub fn blur_text(&mut self, store: &mut DrawingStore) -> RouterOutcome {
        self.confirm_text(store)
    }

    pub fn cancel_text(&mut self) -> RouterOutcome {
        match self.text_entry.take() {
            Some(_) => RouterOutcome::TextEntryClosed,
            None => RouterOutcome::Ignored,
        }
    }

    // ── Keyboard ─────────────────────────────────────────────────────────

    pub fn apply_shortcut(&mut self, store: &mut DrawingStore, shortcut: Shortcut) -> RouterOutcome {
        match shortcut {
            Shortcut::Undo => {
                self.drag = None;
                if store.undo() {
                    RouterOutcome::Undone
                } else {
                    RouterOutcome::Ignored
                }
            }
            Shortcut::Redo => {
                self.drag = None;
                if store.redo() {
                    RouterOutcome::Redone
                } else {
                    RouterOutcome::Ignored
                }
            }
            Shortcut::DeleteSelected => {
                self.finish_drag(store);
                match store.selection() {
                    Some(i) if store.remove_drawing(i) => RouterOutcome::Removed(i),
                    _ => RouterOutcome::Ignored,
                }
            }
            Shortcut::Cancel => self.cancel(store),
        }
    }

    /// Escape: close text entry, else drop the draft, else abandon an edit, else deselect.
    ///
    /// An abandoned edit puts the shape back where the press found it.
    pub fn cancel(&mut self, store: &mut DrawingStore) -> RouterOutcome {
        if self.text_entry.is_some() {
            return self.cancel_text();
        }
        if store.draft().is_some() {
            store.clear_draft();
            return RouterOutcome::DraftDiscarded;
        }
        if self.drag.take().is_some() {
            if store.cancel_gesture() {
                debug!("edit abandoned, geometry restored");
            }
            return RouterOutcome::EditCancelled;
        }
        if store.selection().is_some() {
            store.clear_selection();
            return RouterOutcome::SelectionCleared;
        }
        RouterOutcome::Ignored
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn select_at(&mut self, store: &mut DrawingStore, p: Point) -> RouterOutcome {
        let hit = self.config.hit_config();
        if let Some((index, shape)) = store.selection().zip(store.selected_shape()) {
            let kind = hit_anchor(shape, p, self.viewport, hit.tolerance)
                .or_else(|| hits_body(shape, p, &hit).then_some(AnchorKind::Move));
            if let Some(kind) = kind {
                store.set_edit_anchor(kind);
                store.begin_gesture();
                self.drag = Some(DragState { index, kind, last: p });
                return RouterOutcome::EditStarted(kind);
            }
        }
        match hit_test(store.drawings(), p, &hit) {
            Some(index) => {
                store.select(index);
                RouterOutcome::Selected(index)
            }
            None => {
                store.clear_selection();
                RouterOutcome::SelectionCleared
            }
        }
    }

    fn drag_to(&mut self, store: &mut DrawingStore, p: Point) -> RouterOutcome {
        let Some(drag) = self.drag.as_mut() else {
            return RouterOutcome::Ignored;
        };
        if p == drag.last {
            return RouterOutcome::Ignored;
        }
        let Some(shape) = store.get(drag.index) else {
            self.drag = None;
            return RouterOutcome::Ignored;
        };
        let delta = (p.x - drag.last.x, p.y - drag.last.y);
        let next = apply_anchor_drag(shape, drag.kind, p, delta);
        drag.last = p;
        store.update_drawing(drag.index, next);
        RouterOutcome::Edited
    }

    fn finish_drag(&mut self, store: &mut DrawingStore) {
        if self.drag.take().is_some() {
            store.clear_edit_anchor();
            store.end_gesture();
        }
    }

    /// Move the draft's second point if the draft belongs to the active tool.
    fn extend_draft(&self, store: &mut DrawingStore, p: Point) -> bool {
        let tool_kind = store.tool().shape_kind();
        let Some(mut draft) = store.draft().cloned() else {
            return false;
        };
        if Some(draft.kind()) != tool_kind {
            return false;
        }
        match draft.segment_mut() {
            Some(seg) => {
                seg.x2 = p.x;
                seg.y2 = p.y;
                store.set_draft(draft);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> InteractionRouter {
        let mut r = InteractionRouter::new(InteractionConfig::default());
        r.set_viewport(Viewport::new(800.0, 400.0));
        r
    }

    fn drag(r: &mut InteractionRouter, store: &mut DrawingStore, from: (f64, f64), to: (f64, f64)) -> RouterOutcome {
        r.pointer_down(store, Point::new(from.0, from.1));
        r.pointer_move(store, Point::new((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0));
        r.pointer_up(store, Point::new(to.0, to.1))
    }

    #[test]
    fn trendline_draw_commits() {
        let mut store = DrawingStore::new();
        let mut r = router();
        r.activate_tool(&mut store, Tool::Trendline);
        let out = drag(&mut r, &mut store, (10.0, 10.0), (50.0, 50.0));
        assert_eq!(out, RouterOutcome::Committed(ShapeKind::Trendline));
        assert_eq!(store.drawings(), &[Shape::Trendline(Segment::new(10.0, 10.0, 50.0, 50.0))]);
        assert!(store.draft().is_none());
        assert!(store.can_undo());
    }

    #[test]
    fn short_drag_is_discarded() {
        let mut store = DrawingStore::new();
        let mut r = router();
        r.activate_tool(&mut store, Tool::Rectangle);
        let out = drag(&mut r, &mut store, (10.0, 10.0), (12.0, 11.0));
        assert_eq!(out, RouterOutcome::DraftDiscarded);
        assert!(store.is_empty());
        assert!(store.draft().is_none());
        assert!(!store.can_undo());
    }

    #[test]
    fn hline_commits_on_press() {
        let mut store = DrawingStore::new();
        let mut r = router();
        r.activate_tool(&mut store, Tool::Hline);
        assert_eq!(
            r.pointer_down(&mut store, Point::new(30.0, 77.0)),
            RouterOutcome::Committed(ShapeKind::Hline)
        );
        assert_eq!(store.drawings(), &[Shape::Hline { y: 77.0 }]);
    }

    #[test]
    fn text_entry_commits_trimmed() {
        let mut store = DrawingStore::new();
        let mut r = router();
        r.activate_tool(&mut store, Tool::Text);
        r.pointer_down(&mut store, Point::new(5.0, 6.0));
        assert_eq!(r.focus(), InputFocus::TextField);
        for c in "  hi ".chars() {
            r.text_input(c);
        }
        assert_eq!(r.confirm_text(&mut store), RouterOutcome::Committed(ShapeKind::Text));
        assert_eq!(
            store.drawings(),
            &[Shape::Text {
                x: 5.0,
                y: 6.0,
                text: "hi".into()
            }]
        );
    }

    #[test]
    fn blank_text_and_cancel_commit_nothing() {
        let mut store = DrawingStore::new();
        let mut r = router();
        r.activate_tool(&mut store, Tool::Text);
        r.pointer_down(&mut store, Point::new(5.0, 6.0));
        r.text_input(' ');
        assert_eq!(r.confirm_text(&mut store), RouterOutcome::TextEntryClosed);

        r.pointer_down(&mut store, Point::new(5.0, 6.0));
        r.text_input('x');
        assert_eq!(r.cancel_text(), RouterOutcome::TextEntryClosed);
        assert!(store.is_empty());
    }

    #[test]
    fn pointer_down_while_typing_blurs() {
        let mut store = DrawingStore::new();
        let mut r = router();
        r.activate_tool(&mut store, Tool::Text);
        r.pointer_down(&mut store, Point::new(1.0, 2.0));
        r.text_input('a');
        let out = r.pointer_down(&mut store, Point::new(100.0, 100.0));
        assert_eq!(out, RouterOutcome::Committed(ShapeKind::Text));
        assert!(r.text_entry().is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn erase_clears_and_keeps_tool() {
        let mut store = DrawingStore::new();
        let mut r = router();
        r.activate_tool(&mut store, Tool::Hline);
        r.pointer_down(&mut store, Point::new(0.0, 10.0));
        assert_eq!(r.activate_tool(&mut store, Tool::Erase), RouterOutcome::Cleared);
        assert!(store.is_empty());
        assert_eq!(store.tool(), Tool::Hline);
    }

    #[test]
    fn move_and_up_without_draft_are_ignored() {
        let mut store = DrawingStore::new();
        let mut r = router();
        assert_eq!(r.pointer_move(&mut store, Point::new(1.0, 1.0)), RouterOutcome::Ignored);
        assert_eq!(r.pointer_up(&mut store, Point::new(1.0, 1.0)), RouterOutcome::Ignored);
    }

    #[test]
    fn draft_of_other_tool_is_not_extended() {
        let mut store = DrawingStore::new();
        let mut r = router();
        store.set_tool(Tool::Arrow);
        store.set_draft(Shape::Fib(Segment::new(0.0, 0.0, 0.0, 0.0)));
        assert_eq!(r.pointer_move(&mut store, Point::new(9.0, 9.0)), RouterOutcome::Ignored);
        assert_eq!(store.draft(), Some(&Shape::Fib(Segment::new(0.0, 0.0, 0.0, 0.0))));
    }

    #[test]
    fn select_then_move_is_one_undo_step() {
        let rect = Shape::Rectangle(Segment::new(100.0, 100.0, 200.0, 150.0));
        let mut store = DrawingStore::with_drawings(vec![rect.clone()]);
        let mut r = router();

        assert_eq!(r.pointer_down(&mut store, Point::new(150.0, 120.0)), RouterOutcome::Selected(0));
        r.pointer_up(&mut store, Point::new(150.0, 120.0));

        assert_eq!(
            r.pointer_down(&mut store, Point::new(150.0, 120.0)),
            RouterOutcome::EditStarted(AnchorKind::Move)
        );
        r.pointer_move(&mut store, Point::new(155.0, 125.0));
        r.pointer_move(&mut store, Point::new(160.0, 130.0));
        assert_eq!(r.pointer_up(&mut store, Point::new(170.0, 130.0)), RouterOutcome::EditFinished);

        assert_eq!(store.drawings(), &[Shape::Rectangle(Segment::new(120.0, 110.0, 220.0, 160.0))]);
        assert_eq!(store.edit_anchor(), None);
        assert_eq!(store.undo_depth(), 1);
        store.undo();
        assert_eq!(store.drawings(), &[rect]);
    }

    #[test]
    fn endpoint_handle_takes_priority_over_body() {
        let line = Shape::Trendline(Segment::new(0.0, 0.0, 100.0, 100.0));
        let mut store = DrawingStore::with_drawings(vec![line]);
        store.select(0);
        let mut r = router();
        assert_eq!(
            r.pointer_down(&mut store, Point::new(101.0, 99.0)),
            RouterOutcome::EditStarted(AnchorKind::Endpoint2)
        );
        r.pointer_up(&mut store, Point::new(120.0, 90.0));
        assert_eq!(store.drawings(), &[Shape::Trendline(Segment::new(0.0, 0.0, 120.0, 90.0))]);
    }

    #[test]
    fn click_on_empty_space_clears_selection() {
        let mut store = DrawingStore::with_drawings(vec![Shape::Hline { y: 10.0 }]);
        store.select(0);
        let mut r = router();
        assert_eq!(r.pointer_down(&mut store, Point::new(10.0, 300.0)), RouterOutcome::SelectionCleared);
        assert_eq!(store.selection(), None);
    }

    #[test]
    fn delete_shortcut_removes_selection() {
        let mut store = DrawingStore::with_drawings(vec![Shape::Hline { y: 10.0 }, Shape::Hline { y: 90.0 }]);
        store.select(1);
        let mut r = router();
        assert_eq!(r.apply_shortcut(&mut store, Shortcut::DeleteSelected), RouterOutcome::Removed(1));
        assert_eq!(store.drawings(), &[Shape::Hline { y: 10.0 }]);
        assert_eq!(r.apply_shortcut(&mut store, Shortcut::DeleteSelected), RouterOutcome::Ignored);
    }

    #[test]
    fn delete_during_anchor_press_closes_the_gesture() {
        let mut store = DrawingStore::with_drawings(vec![Shape::Hline { y: 10.0 }, Shape::Hline { y: 90.0 }]);
        store.select(1);
        let mut r = router();
        assert_eq!(
            r.pointer_down(&mut store, Point::new(400.0, 90.0)),
            RouterOutcome::EditStarted(AnchorKind::Move)
        );
        assert!(store.gesture_open());
        assert_eq!(r.apply_shortcut(&mut store, Shortcut::DeleteSelected), RouterOutcome::Removed(1));
        assert!(!store.gesture_open());
        assert!(!r.is_dragging());

        store.select(0);
        r.pointer_down(&mut store, Point::new(400.0, 10.0));
        r.pointer_move(&mut store, Point::new(400.0, 20.0));
        r.pointer_up(&mut store, Point::new(400.0, 30.0));
        assert_eq!(store.drawings(), &[Shape::Hline { y: 30.0 }]);
        assert_eq!(store.undo_depth(), 2);
    }

    #[test]
    fn escape_mid_drag_restores_geometry() {
        let line = Shape::Trendline(Segment::new(0.0, 0.0, 100.0, 100.0));
        let mut store = DrawingStore::with_drawings(vec![line.clone()]);
        store.select(0);
        let mut r = router();
        r.pointer_down(&mut store, Point::new(100.0, 100.0));
        r.pointer_move(&mut store, Point::new(140.0, 60.0));
        assert_ne!(store.drawings(), &[line.clone()]);

        assert_eq!(r.apply_shortcut(&mut store, Shortcut::Cancel), RouterOutcome::EditCancelled);
        assert_eq!(store.drawings(), &[line]);
        assert!(!store.can_undo());
        assert_eq!(store.edit_anchor(), None);
        assert_eq!(store.selection(), Some(0));
        assert_eq!(r.pointer_up(&mut store, Point::new(150.0, 50.0)), RouterOutcome::Ignored);
    }

    #[test]
    fn escape_drops_draft() {
        let mut store = DrawingStore::new();
        let mut r = router();
        r.activate_tool(&mut store, Tool::Fib);
        r.pointer_down(&mut store, Point::new(0.0, 0.0));
        assert_eq!(r.apply_shortcut(&mut store, Shortcut::Cancel), RouterOutcome::DraftDiscarded);
        assert!(store.draft().is_none());
    }

    #[test]
    fn container_to_local() {
        let rect = ContainerRect::new(100.0, 50.0, 800.0, 400.0);
        assert_eq!(rect.to_local(Point::new(110.0, 60.0)), Point::new(10.0, 10.0));
        assert!(rect.contains(Point::new(100.0, 50.0)));
        assert!(!rect.contains(Point::new(900.0, 50.0)));
    }
}

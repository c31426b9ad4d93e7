//! Drawing store: the shapes of one chart plus draft, tool, selection and history.
//!
//! Every mutation of the drawing list goes through this type so that undo
//! snapshots are always taken. Selection and edit-anchor state are kept
//! consistent here: an edit anchor only exists while a shape is selected.

use std::mem;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::anchor::AnchorKind;
use super::history::History;
use super::tool::Tool;
use crate::domain::Shape;

/// How anchor drags are recorded in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DragHistory {
    /// One undo step per completed drag.
    #[default]
    PerGesture,
    /// One undo step per pointer-move update.
    PerMove,
}

#[derive(Debug, Clone, Default)]
enum Gesture {
    #[default]
    Idle,
    Open {
        snapshot: Vec<Shape>,
        recorded: bool,
    },
}

#[derive(Debug, Clone, Default)]
pub struct DrawingStore {
    drawings: Vec<Shape>,
    draft: Option<Shape>,
    tool: Tool,
    selection: Option<usize>,
    edit_anchor: Option<AnchorKind>,
    history: History<Vec<Shape>>,
    drag_history: DragHistory,
    gesture: Gesture,
}

impl DrawingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_drawings(drawings: Vec<Shape>) -> Self {
        Self {
            drawings,
            ..Self::default()
        }
    }

    /// Apply history settings. A `history_limit` of zero means unbounded.
    pub fn configure(&mut self, drag_history: DragHistory, history_limit: usize) {
        self.drag_history = drag_history;
        self.history = History::with_limit(history_limit);
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn drawings(&self) -> &[Shape] {
        &self.drawings
    }

    pub fn len(&self) -> usize {
        self.drawings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawings.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Shape> {
        self.drawings.get(index)
    }

    pub fn draft(&self) -> Option<&Shape> {
        self.draft.as_ref()
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    pub fn selected_shape(&self) -> Option<&Shape> {
        self.selection.and_then(|i| self.drawings.get(i))
    }

    pub fn edit_anchor(&self) -> Option<AnchorKind> {
        self.edit_anchor
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_depth(&self) -> usize {
        self.history.undo_depth()
    }

    pub fn drag_history(&self) -> DragHistory {
        self.drag_history
    }

    pub fn gesture_open(&self) -> bool {
        matches!(self.gesture, Gesture::Open { .. })
    }

    // ── Mutations (history-tracked) ──────────────────────────────────────

    pub fn add_drawing(&mut self, shape: Shape) {
        self.history.record(self.drawings.clone());
        self.drawings.push(shape);
        self.clear_selection();
    }

    /// Remove the shape at `index`. Out-of-range indices change nothing.
    pub fn remove_drawing(&mut self, index: usize) -> bool {
        if index >= self.drawings.len() {
            return false;
        }
        self.history.record(self.drawings.clone());
        self.drawings.remove(index);
        self.clear_selection();
        true
    }

    /// Replace the shape at `index`. Out-of-range indices change nothing.
    ///
    /// Inside an open gesture (per-gesture mode) only the first update records history.
    pub fn update_drawing(&mut self, index: usize, shape: Shape) -> bool {
        if index >= self.drawings.len() {
            return false;
        }
        let coalesce = self.drag_history == DragHistory::PerGesture;
        match &mut self.gesture {
            Gesture::Open { snapshot, recorded } if coalesce => {
                if !*recorded {
                    self.history.record(std::mem::take(snapshot));
                    *recorded = true;
                }
            }
            _ => self.history.record(self.drawings.clone()),
        }
        self.drawings[index] = shape;
        true
    }

    /// Empty the list. History is only recorded when there was something to clear.
    pub fn clear_drawings(&mut self) -> bool {
        if self.drawings.is_empty() {
            return false;
        }
        self.history.record(std::mem::take(&mut self.drawings));
        self.clear_selection();
        debug!("drawings cleared");
        true
    }

    pub fn undo(&mut self) -> bool {
        self.gesture = Gesture::Idle;
        let changed = self.history.undo(&mut self.drawings);
        if changed {
            self.clear_selection();
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        self.gesture = Gesture::Idle;
        let changed = self.history.redo(&mut self.drawings);
        if changed {
            self.clear_selection();
        }
        changed
    }

    /// Load another tab's drawings: history and transient state start fresh.
    pub fn reset(&mut self, drawings: Vec<Shape>) {
        self.drawings = drawings;
        self.history.clear();
        self.draft = None;
        self.gesture = Gesture::Idle;
        self.clear_selection();
        debug!(count = self.drawings.len(), "drawing store reset");
    }

    // ── Gestures ─────────────────────────────────────────────────────────

    /// Start coalescing updates into a single undo step.
    pub fn begin_gesture(&mut self) {
        self.gesture = Gesture::Open {
            snapshot: self.drawings.clone(),
            recorded: false,
        };
    }

    pub fn end_gesture(&mut self) {
        self.gesture = Gesture::Idle;
    }

    /// Abandon the open gesture and put its shapes back as they were when it began.
    ///
    /// A coalesced gesture takes its undo step with it; in per-move mode the
    /// restore is recorded as one more step. Returns whether anything changed.
    pub fn cancel_gesture(&mut self) -> bool {
        let Gesture::Open { snapshot, recorded } = mem::take(&mut self.gesture) else {
            return false;
        };
        self.edit_anchor = None;
        if recorded {
            return match self.history.discard_newest() {
                Some(before) => {
                    self.drawings = before;
                    true
                }
                None => false,
            };
        }
        if snapshot == self.drawings {
            return false;
        }
        self.history.record(mem::replace(&mut self.drawings, snapshot));
        true
    }

    // ── Draft / tool ─────────────────────────────────────────────────────

    pub fn set_draft(&mut self, shape: Shape) {
        self.draft = Some(shape);
    }

    pub fn take_draft(&mut self) -> Option<Shape> {
        self.draft.take()
    }

    pub fn clear_draft(&mut self) {
        self.draft = None;
    }

    /// Switch tools. Any draft and any edit in progress are discarded.
    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
        self.draft = None;
        self.edit_anchor = None;
        self.gesture = Gesture::Idle;
    }

    // ── Selection ────────────────────────────────────────────────────────

    /// Select a shape. Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) {
        if index < self.drawings.len() {
            if self.selection != Some(index) {
                self.edit_anchor = None;
            }
            self.selection = Some(index);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.edit_anchor = None;
    }

    /// Begin editing the selected shape through `kind`. Ignored without a selection.
    pub fn set_edit_anchor(&mut self, kind: AnchorKind) {
        if self.selected_shape().is_some() {
            self.edit_anchor = Some(kind);
        }
    }

    pub fn clear_edit_anchor(&mut self) {
        self.edit_anchor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Segment;

    fn line(n: f64) -> Shape {
        Shape::Trendline(Segment::new(n, n, n + 10.0, n + 10.0))
    }

    #[test]
    fn add_pushes_history_and_clears_selection() {
        let mut store = DrawingStore::new();
        store.add_drawing(line(0.0));
        store.select(0);
        store.add_drawing(line(1.0));
        assert_eq!(store.len(), 2);
        assert_eq!(store.selection(), None);
        assert_eq!(store.undo_depth(), 2);
    }

    #[test]
    fn remove_out_of_range_is_noop() {
        let mut store = DrawingStore::with_drawings(vec![line(0.0)]);
        assert!(!store.remove_drawing(3));
        assert!(!store.can_undo());
        assert!(store.remove_drawing(0));
        assert!(store.is_empty());
        assert!(store.can_undo());
    }

    #[test]
    fn update_out_of_range_is_noop() {
        let mut store = DrawingStore::new();
        assert!(!store.update_drawing(0, line(1.0)));
        assert!(!store.can_undo());
    }

    #[test]
    fn clear_on_empty_records_nothing() {
        let mut store = DrawingStore::new();
        assert!(!store.clear_drawings());
        assert!(!store.can_undo());
    }

    #[test]
    fn undo_redo_roundtrip() {
        let mut store = DrawingStore::new();
        store.add_drawing(line(0.0));
        store.add_drawing(line(1.0));
        assert!(store.undo());
        assert_eq!(store.drawings(), &[line(0.0)]);
        assert!(store.redo());
        assert_eq!(store.drawings(), &[line(0.0), line(1.0)]);
        assert!(!store.redo());
    }

    #[test]
    fn new_mutation_after_undo_drops_redo() {
        let mut store = DrawingStore::new();
        store.add_drawing(line(0.0));
        store.undo();
        assert!(store.can_redo());
        store.add_drawing(line(5.0));
        assert!(!store.can_redo());
    }

    #[test]
    fn gesture_coalesces_updates() {
        let mut store = DrawingStore::with_drawings(vec![line(0.0)]);
        store.begin_gesture();
        for i in 1..=5 {
            store.update_drawing(0, line(i as f64));
        }
        store.end_gesture();
        assert_eq!(store.undo_depth(), 1);
        store.undo();
        assert_eq!(store.drawings(), &[line(0.0)]);
    }

    #[test]
    fn cancelled_gesture_restores_and_drops_its_step() {
        let mut store = DrawingStore::with_drawings(vec![line(0.0)]);
        store.add_drawing(line(9.0));
        store.begin_gesture();
        store.update_drawing(0, line(3.0));
        store.update_drawing(0, line(4.0));
        assert!(store.cancel_gesture());
        assert!(!store.gesture_open());
        assert_eq!(store.drawings(), &[line(0.0), line(9.0)]);
        assert_eq!(store.undo_depth(), 1);
    }

    #[test]
    fn cancelled_per_move_gesture_records_the_restore() {
        let mut store = DrawingStore::with_drawings(vec![line(0.0)]);
        store.configure(DragHistory::PerMove, 0);
        store.begin_gesture();
        store.update_drawing(0, line(1.0));
        store.update_drawing(0, line(2.0));
        assert!(store.cancel_gesture());
        assert_eq!(store.drawings(), &[line(0.0)]);
        assert_eq!(store.undo_depth(), 3);
        assert!(!store.cancel_gesture());
    }

    #[test]
    fn gesture_without_update_leaves_history() {
        let mut store = DrawingStore::with_drawings(vec![line(0.0)]);
        store.begin_gesture();
        store.end_gesture();
        assert!(!store.can_undo());
    }

    #[test]
    fn per_move_records_every_update() {
        let mut store = DrawingStore::with_drawings(vec![line(0.0)]);
        store.configure(DragHistory::PerMove, 0);
        store.begin_gesture();
        for i in 1..=3 {
            store.update_drawing(0, line(i as f64));
        }
        store.end_gesture();
        assert_eq!(store.undo_depth(), 3);
    }

    #[test]
    fn edit_anchor_requires_selection() {
        let mut store = DrawingStore::with_drawings(vec![line(0.0)]);
        store.set_edit_anchor(AnchorKind::Move);
        assert_eq!(store.edit_anchor(), None);
        store.select(0);
        store.set_edit_anchor(AnchorKind::Move);
        assert_eq!(store.edit_anchor(), Some(AnchorKind::Move));
        store.clear_selection();
        assert_eq!(store.edit_anchor(), None);
    }

    #[test]
    fn select_out_of_range_ignored() {
        let mut store = DrawingStore::with_drawings(vec![line(0.0)]);
        store.select(4);
        assert_eq!(store.selection(), None);
    }

    #[test]
    fn set_tool_discards_draft() {
        let mut store = DrawingStore::new();
        store.set_draft(line(0.0));
        store.set_tool(Tool::Rectangle);
        assert!(store.draft().is_none());
        assert_eq!(store.tool(), Tool::Rectangle);
    }

    #[test]
    fn reset_empties_history() {
        let mut store = DrawingStore::new();
        store.add_drawing(line(0.0));
        store.undo();
        store.reset(vec![line(9.0)]);
        assert!(!store.can_undo());
        assert!(!store.can_redo());
        assert_eq!(store.drawings(), &[line(9.0)]);
    }

    #[test]
    fn history_limit_applies() {
        let mut store = DrawingStore::new();
        store.configure(DragHistory::PerGesture, 2);
        for i in 0..5 {
            store.add_drawing(line(i as f64));
        }
        assert_eq!(store.undo_depth(), 2);
    }
}

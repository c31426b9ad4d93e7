//! Drawing store, undo/redo history, tools and shape hit-testing.

pub mod anchor;
pub mod history;
pub mod store;
pub mod tool;

pub use anchor::{
    anchors_for, apply_anchor_drag, hit_anchor, hit_test, hits_body, Anchor, AnchorKind, Corner,
    HitConfig, Viewport,
};
pub use history::History;
pub use store::{DragHistory, DrawingStore};
pub use tool::Tool;

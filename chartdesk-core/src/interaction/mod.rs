//! Pointer and keyboard routing into the drawing store.

pub mod router;
pub mod shortcuts;

pub use router::{
    ContainerRect, InteractionConfig, InteractionRouter, PointerEvent, PointerKind, RouterOutcome, TextEntry,
};
pub use shortcuts::{resolve_shortcut, InputFocus, Key, KeyChord, Shortcut};

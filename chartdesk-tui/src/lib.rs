//! ChartDesk TUI - terminal front end for the charting core
//!
//! Provides an interactive chart desk with:
//! - Candles with indicator overlays and an oscillator pane
//! - Mouse drawing tools with undo/redo
//! - Multiple chart tabs persisted between runs
//! - Price and indicator alerts with bell/toast notification

pub mod app;
pub mod input;
pub mod notifier;
pub mod persistence;
pub mod theme;
pub mod ui;
pub mod worker;

pub use app::AppState;
pub use theme::Theme;

#[cfg(test)]
mod test_helpers;

//! Workspace container: per-tab records, tab management, import/export.

pub mod record;
pub mod tabs;

pub use record::{export, import, WorkspaceError, WorkspaceRecord, DEFAULT_SYMBOL};
pub use tabs::{load, save, WorkspaceTabs, MAX_LABEL_CHARS};

//! The ordered set of workspace tabs and the active index.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::record::{WorkspaceError, WorkspaceRecord, DEFAULT_SYMBOL};
use crate::domain::Timeframe;

/// Tab labels are cut to this many characters.
pub const MAX_LABEL_CHARS: usize = 18;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceTabs {
    tabs: Vec<WorkspaceRecord>,
    active: usize,
}

impl Default for WorkspaceTabs {
    fn default() -> Self {
        Self {
            tabs: vec![WorkspaceRecord::new(DEFAULT_SYMBOL, Timeframe::default())],
            active: 0,
        }
    }
}

impl WorkspaceTabs {
    /// Never empty: an empty list becomes the default single tab.
    pub fn new(tabs: Vec<WorkspaceRecord>, active: usize) -> Self {
        if tabs.is_empty() {
            return Self::default();
        }
        let active = active.min(tabs.len() - 1);
        Self { tabs, active }
    }

    pub fn tabs(&self) -> &[WorkspaceRecord] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> &WorkspaceRecord {
        &self.tabs[self.active]
    }

    /// Overwrite the active tab, e.g. with a session snapshot before switching away.
    pub fn store_active(&mut self, record: WorkspaceRecord) {
        self.tabs[self.active] = record;
    }

    /// Append a tab and make it active. Returns its index.
    pub fn add(&mut self, record: WorkspaceRecord) -> usize {
        self.tabs.push(record);
        self.active = self.tabs.len() - 1;
        debug!(tabs = self.tabs.len(), "workspace tab added");
        self.active
    }

    /// Append a fresh tab on the active tab's symbol and timeframe.
    pub fn add_blank(&mut self) -> usize {
        let current = self.active();
        let mut record = WorkspaceRecord::new(current.symbol.clone(), current.timeframe);
        record.label = format!("Chart {}", self.tabs.len() + 1);
        record.id = format!("{}-{}", record.id, self.tabs.len());
        self.add(record)
    }

    /// The last remaining tab cannot be closed.
    pub fn close(&mut self, index: usize) -> bool {
        if self.tabs.len() <= 1 || index >= self.tabs.len() {
            return false;
        }
        self.tabs.remove(index);
        if self.active > index || self.active >= self.tabs.len() {
            self.active = self.active.saturating_sub(1);
        }
        true
    }

    pub fn rename(&mut self, index: usize, label: &str) -> bool {
        match self.tabs.get_mut(index) {
            Some(tab) => {
                tab.label = label.chars().take(MAX_LABEL_CHARS).collect();
                true
            }
            None => false,
        }
    }

    pub fn switch(&mut self, index: usize) -> bool {
        if index >= self.tabs.len() || index == self.active {
            return false;
        }
        self.active = index;
        true
    }

    pub fn next(&mut self) -> bool {
        self.switch((self.active + 1) % self.tabs.len())
    }

    pub fn prev(&mut self) -> bool {
        self.switch((self.active + self.tabs.len() - 1) % self.tabs.len())
    }

    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&json).to_hex().to_string()
    }
}

/// Load the tab set. Missing or corrupt files yield the default single tab.
pub fn load(path: &Path) -> WorkspaceTabs {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<WorkspaceTabs>(&content) {
            Ok(tabs) => WorkspaceTabs::new(tabs.tabs, tabs.active),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt workspace file, using defaults");
                WorkspaceTabs::default()
            }
        },
        Err(_) => WorkspaceTabs::default(),
    }
}

/// Save the tab set. Creates parent directories if needed.
pub fn save(path: &Path, tabs: &WorkspaceTabs) -> Result<(), WorkspaceError> {
    let io_err = |source| WorkspaceError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(tabs)?;
    std::fs::write(path, json).map_err(io_err)?;
    Ok(())
}

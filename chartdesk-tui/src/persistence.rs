//! On-disk locations and UI preference persistence.
//!
//! Tabs and alert rules have their own formats in the core (`workspace`,
//! `alerts::JsonFileAlertStore`); this module only knows where they live and
//! keeps the small set of UI preferences that survive restarts.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use chartdesk_core::workspace::WorkspaceTabs;

use crate::app::{AppState, Overlay};

/// Every file the TUI reads or writes.
#[derive(Debug, Clone, PartialEq)]
pub struct Paths {
    pub config: PathBuf,
    pub workspace: PathBuf,
    pub alerts: PathBuf,
    pub ui: PathBuf,
    pub exports: PathBuf,
    pub log: PathBuf,
}

impl Paths {
    /// Platform config/cache directories, falling back to the working directory.
    pub fn discover() -> Self {
        Self::from_dirs(dirs::config_dir(), dirs::cache_dir())
    }

    pub fn from_dirs(config_dir: Option<PathBuf>, cache_dir: Option<PathBuf>) -> Self {
        let config = config_dir.unwrap_or_else(|| PathBuf::from(".")).join("chartdesk");
        let cache = cache_dir.unwrap_or_else(|| PathBuf::from(".")).join("chartdesk");
        Self {
            workspace: config.join("workspace.json"),
            alerts: config.join("alerts.json"),
            ui: config.join("ui.json"),
            exports: config.join("exports"),
            config: config.join("config.toml"),
            log: cache.join("chartdesk.log"),
        }
    }

    /// Export destination for one tab.
    pub fn export_file(&self, symbol: &str, id: &str) -> PathBuf {
        self.exports.join(format!("{}-{}.json", symbol.to_lowercase(), id))
    }
}

/// UI state that persists across restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiPrefs {
    pub show_sidebar: bool,
    pub welcome_dismissed: bool,
}

impl Default for UiPrefs {
    fn default() -> Self {
        Self {
            show_sidebar: true,
            welcome_dismissed: false,
        }
    }
}

/// Load preferences. Returns defaults if the file is missing or corrupt.
pub fn load(path: &Path) -> UiPrefs {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
        Err(_) => UiPrefs::default(),
    }
}

/// Save preferences. Creates parent directories if needed.
pub fn save(path: &Path, prefs: &UiPrefs) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(prefs)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn extract(app: &AppState) -> UiPrefs {
    UiPrefs {
        show_sidebar: app.show_sidebar,
        welcome_dismissed: app.welcome_dismissed || app.overlay != Overlay::Help,
    }
}

pub fn apply(app: &mut AppState, prefs: UiPrefs) {
    app.show_sidebar = prefs.show_sidebar;
    app.welcome_dismissed = prefs.welcome_dismissed;
    if !prefs.welcome_dismissed {
        app.overlay = Overlay::Help;
    }
}

/// The tab set with the live session written back into the active slot.
pub fn snapshot(app: &AppState) -> WorkspaceTabs {
    let mut tabs = app.tabs.clone();
    tabs.store_active(app.session.to_record());
    tabs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chartdesk").join("ui.json");

        let prefs = UiPrefs {
            show_sidebar: false,
            welcome_dismissed: true,
        };
        save(&path, &prefs).unwrap();
        assert_eq!(load(&path), prefs);
    }

    #[test]
    fn missing_file_returns_defaults() {
        let loaded = load(Path::new("/nonexistent/path/ui.json"));
        assert!(loaded.show_sidebar);
        assert!(!loaded.welcome_dismissed);
    }

    #[test]
    fn corrupt_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ui.json");
        std::fs::write(&path, "not valid json {{{").unwrap();
        assert_eq!(load(&path), UiPrefs::default());
    }

    #[test]
    fn paths_live_under_chartdesk_dirs() {
        let paths = Paths::from_dirs(Some("/cfg".into()), Some("/cache".into()));
        assert_eq!(paths.workspace, PathBuf::from("/cfg/chartdesk/workspace.json"));
        assert_eq!(paths.alerts, PathBuf::from("/cfg/chartdesk/alerts.json"));
        assert_eq!(paths.log, PathBuf::from("/cache/chartdesk/chartdesk.log"));
        assert_eq!(
            paths.export_file("AAPL", "abc123"),
            PathBuf::from("/cfg/chartdesk/exports/aapl-abc123.json")
        );
    }
}

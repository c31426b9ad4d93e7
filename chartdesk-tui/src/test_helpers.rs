//! Test helpers for building an app without touching the real config dirs

use std::sync::mpsc::{self, Receiver, Sender};

use chartdesk_core::config::AppConfig;
use chartdesk_core::domain::Bar;
use chartdesk_core::workspace::WorkspaceTabs;

use crate::app::AppState;
use crate::persistence::Paths;
use crate::worker::{WorkerCommand, WorkerResponse};

/// An app with default tabs and no alerts; the worker channel ends are returned.
pub fn app_with_channels() -> (AppState, Receiver<WorkerCommand>, Sender<WorkerResponse>) {
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let paths = Paths::from_dirs(Some("/nonexistent/cfg".into()), Some("/nonexistent/cache".into()));
    let mut config = AppConfig::default();
    config.alerts.native_notifications = false;
    let app = AppState::new(config, paths, WorkspaceTabs::default(), Vec::new(), cmd_tx, resp_rx);
    (app, cmd_rx, resp_tx)
}

pub fn bar(time: i64, close: f64) -> Bar {
    Bar {
        time,
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1_000,
    }
}

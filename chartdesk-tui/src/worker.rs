//! Background persistence worker.
//!
//! Workspace autosaves, alert writes and tab import/export run here so the
//! UI thread never blocks on disk. Communication is via `mpsc` channels.

use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use chartdesk_core::alerts::{AlertRule, JsonFileAlertStore};
use chartdesk_core::workspace::{self, WorkspaceRecord, WorkspaceTabs};

/// Commands sent from the TUI to the worker.
#[derive(Debug)]
pub enum WorkerCommand {
    SaveWorkspace {
        path: PathBuf,
        tabs: Box<WorkspaceTabs>,
        fingerprint: String,
    },
    SaveAlerts {
        path: PathBuf,
        rules: Vec<AlertRule>,
    },
    ExportTab {
        path: PathBuf,
        record: Box<WorkspaceRecord>,
    },
    ImportTab {
        path: PathBuf,
    },
    Shutdown,
}

/// Responses sent from the worker back to the TUI.
#[derive(Debug)]
pub enum WorkerResponse {
    WorkspaceSaved { fingerprint: String },
    AlertsSaved { count: usize },
    Exported { path: PathBuf },
    Imported { record: Box<WorkspaceRecord> },
    Error {
        category: String,
        message: String,
        context: String,
    },
}

/// Spawn the persistence thread.
pub fn spawn_worker(rx: Receiver<WorkerCommand>, tx: Sender<WorkerResponse>) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("chartdesk-persist".into())
        .spawn(move || worker_loop(rx, tx))
}

fn worker_loop(rx: Receiver<WorkerCommand>, tx: Sender<WorkerResponse>) {
    while let Ok(cmd) = rx.recv() {
        let mut batch = vec![cmd];
        batch.extend(rx.try_iter());
        let shutdown = batch.iter().any(|c| matches!(c, WorkerCommand::Shutdown));
        for cmd in coalesce(batch) {
            handle_command(cmd, &tx);
        }
        if shutdown {
            break;
        }
    }
    debug!("persistence worker stopped");
}

/// Drop all but the newest workspace and alert save of a batch.
fn coalesce(batch: Vec<WorkerCommand>) -> Vec<WorkerCommand> {
    let last_ws = batch
        .iter()
        .rposition(|c| matches!(c, WorkerCommand::SaveWorkspace { .. }));
    let last_alerts = batch
        .iter()
        .rposition(|c| matches!(c, WorkerCommand::SaveAlerts { .. }));
    batch
        .into_iter()
        .enumerate()
        .filter(|(i, c)| match c {
            WorkerCommand::SaveWorkspace { .. } => Some(*i) == last_ws,
            WorkerCommand::SaveAlerts { .. } => Some(*i) == last_alerts,
            WorkerCommand::Shutdown => false,
            _ => true,
        })
        .map(|(_, c)| c)
        .collect()
}

fn handle_command(cmd: WorkerCommand, tx: &Sender<WorkerResponse>) {
    let response = match cmd {
        WorkerCommand::SaveWorkspace {
            path,
            tabs,
            fingerprint,
        } => match workspace::save(&path, &tabs) {
            Ok(()) => WorkerResponse::WorkspaceSaved { fingerprint },
            Err(e) => error("storage", e.to_string(), &path),
        },
        WorkerCommand::SaveAlerts { path, rules } => {
            let store = JsonFileAlertStore::new(&path);
            match store.save_all(&rules) {
                Ok(()) => WorkerResponse::AlertsSaved { count: rules.len() },
                Err(e) => error("storage", e.to_string(), &path),
            }
        }
        WorkerCommand::ExportTab { path, record } => match export_tab(&path, &record) {
            Ok(()) => WorkerResponse::Exported { path },
            Err(e) => error("export", e.to_string(), &path),
        },
        WorkerCommand::ImportTab { path } => match std::fs::read_to_string(&path) {
            Ok(json) => match workspace::import(&json) {
                Ok(record) => WorkerResponse::Imported {
                    record: Box::new(record),
                },
                Err(e) => error("import", e.to_string(), &path),
            },
            Err(e) => error("import", e.to_string(), &path),
        },
        WorkerCommand::Shutdown => return,
    };
    let _ = tx.send(response);
}

fn export_tab(path: &std::path::Path, record: &WorkspaceRecord) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, workspace::export(record)?)?;
    Ok(())
}

fn error(category: &str, message: String, path: &std::path::Path) -> WorkerResponse {
    warn!(category, path = %path.display(), %message, "persistence failed");
    WorkerResponse::Error {
        category: category.to_string(),
        message,
        context: path.display().to_string(),
    }
}

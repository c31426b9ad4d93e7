//! The persisted per-tab record and its import/export.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Shape, Timeframe};
use crate::indicators::ActiveIndicator;

pub const DEFAULT_SYMBOL: &str = "AAPL";

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("malformed workspace: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid workspace: {0}")]
    Invalid(String),

    #[error("workspace io error at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Everything a chart tab needs to restore itself.
///
/// Only the final drawing list is persisted; undo history never is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub drawings: Vec<Shape>,
    pub active_indicators: Vec<ActiveIndicator>,
}

impl WorkspaceRecord {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        let symbol = symbol.into();
        let mut record = Self {
            id: String::new(),
            label: symbol.clone(),
            symbol,
            timeframe,
            drawings: Vec::new(),
            active_indicators: Vec::new(),
        };
        record.id = record.fingerprint()[..12].to_string();
        record
    }

    /// Label shown on the tab: the label, else the symbol, else "Chart".
    pub fn display_label(&self) -> &str {
        if !self.label.is_empty() {
            &self.label
        } else if !self.symbol.is_empty() {
            &self.symbol
        } else {
            "Chart"
        }
    }

    /// blake3 hex digest of the record's canonical JSON.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&json).to_hex().to_string()
    }

    pub fn validate(&self) -> Result<(), WorkspaceError> {
        if self.symbol.trim().is_empty() {
            return Err(WorkspaceError::Invalid("symbol is empty".into()));
        }
        if let Some(i) = self.drawings.iter().position(|s| !shape_is_finite(s)) {
            return Err(WorkspaceError::Invalid(format!("drawing {i} has non-finite coordinates")));
        }
        if let Some(bad) = self.active_indicators.iter().find(|a| a.parsed_key().is_none()) {
            return Err(WorkspaceError::Invalid(format!("unknown indicator '{}'", bad.key)));
        }
        Ok(())
    }
}

fn shape_is_finite(shape: &Shape) -> bool {
    match shape {
        Shape::Hline { y } => y.is_finite(),
        Shape::Text { x, y, .. } => x.is_finite() && y.is_finite(),
        _ => shape
            .segment()
            .is_some_and(|s| [s.x1, s.y1, s.x2, s.y2].iter().all(|v| v.is_finite())),
    }
}

/// Pretty JSON for a single exported tab.
pub fn export(record: &WorkspaceRecord) -> Result<String, WorkspaceError> {
    Ok(serde_json::to_string_pretty(record)?)
}

/// Parse and validate an exported tab. Unknown fields are ignored.
///
/// A record without an id gets a fresh one; a missing label falls back to the symbol.
pub fn import(json: &str) -> Result<WorkspaceRecord, WorkspaceError> {
    let mut record: WorkspaceRecord = serde_json::from_str(json)?;
    record.validate()?;
    record.symbol = record.symbol.trim().to_uppercase();
    if record.label.is_empty() {
        record.label = record.symbol.clone();
    }
    if record.id.is_empty() {
        record.id = record.fingerprint()[..12].to_string();
    }
    Ok(record)
}

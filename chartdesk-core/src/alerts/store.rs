//! Alert rule persistence.
//!
//! `AlertStore` abstracts over the external document store. The JSON-file
//! implementation keeps one document per user and replaces it atomically.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::rule::{AlertCondition, AlertRule};
use super::AlertError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed alert document {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("alert '{0}' not found")]
    NotFound(String),

    #[error("alert '{0}' already exists")]
    DuplicateId(String),
}

pub trait AlertStore: Send {
    fn list(&self) -> Result<Vec<AlertRule>, StoreError>;

    fn create(&mut self, rule: AlertRule) -> Result<(), StoreError>;

    /// Replace the stored rule with the same id.
    fn update(&mut self, rule: &AlertRule) -> Result<(), StoreError>;

    /// Returns false when no rule had that id.
    fn delete(&mut self, id: &str) -> Result<bool, StoreError>;

    fn list_for(&self, symbol: &str) -> Result<Vec<AlertRule>, StoreError> {
        Ok(self.list()?.into_iter().filter(|r| r.symbol == symbol).collect())
    }
}

/// Check a new rule against the symbol's existing ones.
///
/// An active rule with the same condition and threshold is a duplicate.
pub fn validate_new(
    existing: &[AlertRule],
    symbol: &str,
    condition: &AlertCondition,
    threshold: f64,
) -> Result<(), AlertError> {
    if !threshold.is_finite() {
        return Err(AlertError::InvalidThreshold(threshold.to_string()));
    }
    let duplicate = existing
        .iter()
        .any(|r| r.symbol == symbol && r.active && &r.condition == condition && r.threshold == threshold);
    if duplicate {
        return Err(AlertError::Duplicate {
            condition: condition.to_string(),
        });
    }
    Ok(())
}

fn apply_update(rules: &mut [AlertRule], rule: &AlertRule) -> Result<(), StoreError> {
    let slot = rules
        .iter_mut()
        .find(|r| r.id == rule.id)
        .ok_or_else(|| StoreError::NotFound(rule.id.clone()))?;
    *slot = rule.clone();
    Ok(())
}

fn apply_create(rules: &mut Vec<AlertRule>, rule: AlertRule) -> Result<(), StoreError> {
    if rules.iter().any(|r| r.id == rule.id) {
        return Err(StoreError::DuplicateId(rule.id));
    }
    rules.push(rule);
    Ok(())
}

fn apply_delete(rules: &mut Vec<AlertRule>, id: &str) -> bool {
    let before = rules.len();
    rules.retain(|r| r.id != id);
    rules.len() != before
}

// ── In-memory ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct MemoryAlertStore {
    rules: Vec<AlertRule>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<AlertRule>) -> Self {
        Self { rules }
    }
}

impl AlertStore for MemoryAlertStore {
    fn list(&self) -> Result<Vec<AlertRule>, StoreError> {
        Ok(self.rules.clone())
    }

    fn create(&mut self, rule: AlertRule) -> Result<(), StoreError> {
        apply_create(&mut self.rules, rule)
    }

    fn update(&mut self, rule: &AlertRule) -> Result<(), StoreError> {
        apply_update(&mut self.rules, rule)
    }

    fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        Ok(apply_delete(&mut self.rules, id))
    }
}

// ── JSON file ───────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize)]
struct AlertDocument {
    #[serde(default)]
    alerts: Vec<AlertRule>,
}

/// Alert rules in a single JSON document, rewritten via temp file + rename.
#[derive(Debug, Clone)]
pub struct JsonFileAlertStore {
    path: PathBuf,
}

impl JsonFileAlertStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the document with `rules`.
    pub fn save_all(&self, rules: &[AlertRule]) -> Result<(), StoreError> {
        self.write(rules.to_vec())
    }

    fn read(&self) -> Result<Vec<AlertRule>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let doc: AlertDocument = serde_json::from_str(&content).map_err(|source| {
            warn!(path = %self.path.display(), error = %source, "alert document unreadable");
            StoreError::Malformed {
                path: self.path.clone(),
                source,
            }
        })?;
        Ok(doc.alerts)
    }

    fn write(&self, alerts: Vec<AlertRule>) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(&AlertDocument { alerts }).map_err(|source| {
            StoreError::Malformed {
                path: self.path.clone(),
                source,
            }
        })?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;
        debug!(path = %self.path.display(), "alert document written");
        Ok(())
    }
}

impl AlertStore for JsonFileAlertStore {
    fn list(&self) -> Result<Vec<AlertRule>, StoreError> {
        self.read()
    }

    fn create(&mut self, rule: AlertRule) -> Result<(), StoreError> {
        let mut rules = self.read()?;
        apply_create(&mut rules, rule)?;
        self.write(rules)
    }

    fn update(&mut self, rule: &AlertRule) -> Result<(), StoreError> {
        let mut rules = self.read()?;
        apply_update(&mut rules, rule)?;
        self.write(rules)
    }

    fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let mut rules = self.read()?;
        let removed = apply_delete(&mut rules, id);
        if removed {
            self.write(rules)?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn rule(threshold: f64) -> AlertRule {
        let t = Utc.with_ymd_and_hms(2025, 7, 30, 0, 0, 0).unwrap();
        AlertRule::new("AAPL", AlertCondition::Price, threshold, false, t)
    }

    #[test]
    fn duplicate_active_rule_rejected() {
        let existing = vec![rule(150.0)];
        let err = validate_new(&existing, "AAPL", &AlertCondition::Price, 150.0).unwrap_err();
        assert!(matches!(err, AlertError::Duplicate { .. }));
        assert!(validate_new(&existing, "AAPL", &AlertCondition::Price, 151.0).is_ok());
        assert!(validate_new(&existing, "MSFT", &AlertCondition::Price, 150.0).is_ok());
        assert!(validate_new(&existing, "AAPL", &AlertCondition::from("rsi"), 150.0).is_ok());
    }

    #[test]
    fn inactive_rule_is_not_duplicate() {
        let mut r = rule(150.0);
        r.active = false;
        assert!(validate_new(&[r], "AAPL", &AlertCondition::Price, 150.0).is_ok());
    }

    #[test]
    fn non_finite_threshold_rejected() {
        assert!(matches!(
            validate_new(&[], "AAPL", &AlertCondition::Price, f64::NAN),
            Err(AlertError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn memory_store_crud() {
        let mut store = MemoryAlertStore::new();
        let mut r = rule(1.0);
        store.create(r.clone()).unwrap();
        assert!(matches!(store.create(r.clone()), Err(StoreError::DuplicateId(_))));
        r.triggered = true;
        store.update(&r).unwrap();
        assert!(store.list().unwrap()[0].triggered);
        assert!(store.delete(&r.id).unwrap());
        assert!(!store.delete(&r.id).unwrap());
        assert!(matches!(store.update(&r), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn json_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("alerts.json");
        let mut store = JsonFileAlertStore::new(&path);
        assert!(store.list().unwrap().is_empty());

        store.create(rule(10.0)).unwrap();
        store.create(rule(20.0)).unwrap();

        let reopened = JsonFileAlertStore::new(&path);
        let rules = reopened.list_for("AAPL").unwrap();
        assert_eq!(rules.len(), 2);
        assert!(reopened.list_for("MSFT").unwrap().is_empty());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn save_all_replaces_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileAlertStore::new(dir.path().join("alerts.json"));
        store.save_all(&[rule(1.0), rule(2.0)]).unwrap();
        store.save_all(&[rule(3.0)]).unwrap();
        let rules = store.list().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].threshold, 3.0);
    }

    #[test]
    fn json_store_reports_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = JsonFileAlertStore::new(&path);
        assert!(matches!(store.list(), Err(StoreError::Malformed { .. })));
    }
}

//! Application configuration loaded from `config.toml`.
//!
//! Every section is optional; missing keys take their defaults.
//!
//! ```toml
//! [interaction]
//! min_drag_distance = 3.0
//! drag_history = "per-gesture"
//!
//! [indicators]
//! sma_period = 3
//!
//! [alerts]
//! snooze_minutes = 10
//!
//! [feed]
//! source = "yahoo"
//! poll_interval_secs = 60
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::alerts::{AlertEvaluator, DEFAULT_SNOOZE_MINUTES, DEFAULT_TOAST_TIMEOUT_MS};
use crate::data::{DataSource, FeedOptions};
use crate::indicators::IndicatorParams;
use crate::interaction::InteractionConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    pub snooze_minutes: i64,
    /// Try the terminal bell / desktop notifier before falling back to toasts.
    pub native_notifications: bool,
    pub toast_timeout_ms: i64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            snooze_minutes: DEFAULT_SNOOZE_MINUTES,
            native_notifications: true,
            toast_timeout_ms: DEFAULT_TOAST_TIMEOUT_MS,
        }
    }
}

impl AlertSettings {
    pub fn evaluator(&self) -> AlertEvaluator {
        AlertEvaluator::new(chrono::Duration::minutes(self.snooze_minutes))
    }

    pub fn toast_timeout(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.toast_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    pub source: DataSource,
    pub poll_interval_secs: u64,
    pub history_bars: usize,
    pub seed: u64,
    /// Directory for the `csv` source; defaults to `./data`.
    pub csv_dir: Option<PathBuf>,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            source: DataSource::Synthetic,
            poll_interval_secs: 60,
            history_bars: 300,
            seed: 42,
            csv_dir: None,
        }
    }
}

impl FeedSettings {
    pub fn options(&self) -> FeedOptions {
        FeedOptions {
            poll_interval: Duration::from_secs(self.poll_interval_secs.max(1)),
            history_bars: self.history_bars,
        }
    }

    pub fn csv_dir(&self) -> PathBuf {
        self.csv_dir.clone().unwrap_or_else(|| PathBuf::from("data"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub interaction: InteractionConfig,
    pub indicators: IndicatorParams,
    pub alerts: AlertSettings,
    pub feed: FeedSettings,
}

impl AppConfig {
    /// Load from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.indicators
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let i = &self.interaction;
        if !(i.min_drag_distance >= 0.0 && i.hit_tolerance >= 0.0 && i.label_offset.is_finite()) {
            return Err(ConfigError::Invalid(
                "interaction distances must be non-negative numbers".into(),
            ));
        }
        if self.alerts.snooze_minutes < 0 || self.alerts.toast_timeout_ms < 0 {
            return Err(ConfigError::Invalid("alert durations must not be negative".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::DragHistory;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(AppConfig::from_toml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [interaction]
            drag_history = "per-move"
            history_limit = 50

            [feed]
            source = "yahoo"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.interaction.drag_history, DragHistory::PerMove);
        assert_eq!(cfg.interaction.history_limit, 50);
        assert_eq!(cfg.interaction.min_drag_distance, 3.0);
        assert_eq!(cfg.feed.source, DataSource::Yahoo);
        assert_eq!(cfg.indicators.sma_period, 3);
    }

    #[test]
    fn invalid_periods_are_rejected() {
        let err = AppConfig::from_toml("[indicators]\nmacd_fast = 30\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(AppConfig::from_toml("[feed\n"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg.alerts.snooze_minutes, 10);
    }

    #[test]
    fn defaults_roundtrip_through_toml() {
        let text = AppConfig::default().to_toml().unwrap();
        assert_eq!(AppConfig::from_toml(&text).unwrap(), AppConfig::default());
    }
}

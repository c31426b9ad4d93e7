//! Indicator catalog: keys, labels, parameters and batch computation.
//!
//! A chart tab stores its selection as `[{key, label}]`. `compute_active`
//! turns that selection into named series; composite indicators contribute
//! several entries (`macd`, `macdSignal`, `macdHistogram`, `bbUpper`, ...).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::{Bollinger, Ema, Indicator, Macd, Rsi, Sma};
use crate::domain::{to_series, Bar, Series};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorKey {
    Sma,
    Ema,
    Rsi,
    Macd,
    Bbands,
}

impl IndicatorKey {
    pub const ALL: [IndicatorKey; 5] = [
        IndicatorKey::Sma,
        IndicatorKey::Ema,
        IndicatorKey::Rsi,
        IndicatorKey::Macd,
        IndicatorKey::Bbands,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IndicatorKey::Sma => "sma",
            IndicatorKey::Ema => "ema",
            IndicatorKey::Rsi => "rsi",
            IndicatorKey::Macd => "macd",
            IndicatorKey::Bbands => "bbands",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IndicatorKey::Sma => "Simple Moving Average",
            IndicatorKey::Ema => "Exponential Moving Average",
            IndicatorKey::Rsi => "Relative Strength Index",
            IndicatorKey::Macd => "MACD",
            IndicatorKey::Bbands => "Bollinger Bands",
        }
    }

    /// Names of the series this indicator contributes to an `IndicatorSet`.
    pub fn series_names(self) -> &'static [&'static str] {
        match self {
            IndicatorKey::Sma => &["sma"],
            IndicatorKey::Ema => &["ema"],
            IndicatorKey::Rsi => &["rsi"],
            IndicatorKey::Macd => &["macd", "macdSignal", "macdHistogram"],
            IndicatorKey::Bbands => &["bbUpper", "bbMiddle", "bbLower"],
        }
    }

    /// Oscillators live on their own scale rather than the price axis.
    pub fn is_oscillator(self) -> bool {
        matches!(self, IndicatorKey::Rsi | IndicatorKey::Macd)
    }

    pub fn to_active(self) -> ActiveIndicator {
        ActiveIndicator {
            key: self.as_str().to_string(),
            label: self.label().to_string(),
        }
    }
}

impl fmt::Display for IndicatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndicatorKey {
    type Err = IndicatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sma" => Ok(IndicatorKey::Sma),
            "ema" => Ok(IndicatorKey::Ema),
            "rsi" => Ok(IndicatorKey::Rsi),
            "macd" => Ok(IndicatorKey::Macd),
            "bbands" | "bb" => Ok(IndicatorKey::Bbands),
            _ => Err(IndicatorError::UnknownKey(s.to_string())),
        }
    }
}

/// One entry of a tab's indicator selection, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveIndicator {
    pub key: String,
    pub label: String,
}

impl ActiveIndicator {
    pub fn parsed_key(&self) -> Option<IndicatorKey> {
        self.key.parse().ok()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum IndicatorError {
    #[error("unknown indicator key '{0}'")]
    UnknownKey(String),

    #[error("{name} period must be >= 1")]
    ZeroPeriod { name: &'static str },

    #[error("MACD fast period ({fast}) must be below slow period ({slow})")]
    FastNotBelowSlow { fast: usize, slow: usize },

    #[error("Bollinger band width must be a non-negative number, got {0}")]
    InvalidBandWidth(f64),
}

/// Periods used when computing the catalog indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub sma_period: usize,
    pub ema_period: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bb_period: usize,
    pub bb_std_dev: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            sma_period: 3,
            ema_period: 9,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bb_period: 20,
            bb_std_dev: 2.0,
        }
    }
}

impl IndicatorParams {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        let periods = [
            ("SMA", self.sma_period),
            ("EMA", self.ema_period),
            ("RSI", self.rsi_period),
            ("MACD fast", self.macd_fast),
            ("MACD slow", self.macd_slow),
            ("MACD signal", self.macd_signal),
            ("Bollinger", self.bb_period),
        ];
        if let Some(&(name, _)) = periods.iter().find(|(_, p)| *p == 0) {
            return Err(IndicatorError::ZeroPeriod { name });
        }
        if self.macd_fast >= self.macd_slow {
            return Err(IndicatorError::FastNotBelowSlow {
                fast: self.macd_fast,
                slow: self.macd_slow,
            });
        }
        if !self.bb_std_dev.is_finite() || self.bb_std_dev < 0.0 {
            return Err(IndicatorError::InvalidBandWidth(self.bb_std_dev));
        }
        Ok(())
    }
}

/// Named indicator series computed for one chart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSet {
    series: BTreeMap<String, Series>,
}

impl IndicatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, series: Series) {
        self.series.insert(name.into(), series);
    }

    pub fn get(&self, name: &str) -> Option<&Series> {
        self.series.get(name)
    }

    /// Most recent value of a named series.
    pub fn latest(&self, name: &str) -> Option<f64> {
        self.series.get(name).and_then(|s| s.last()).map(|p| p.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Series)> {
        self.series.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Compute every selected indicator. Unknown keys are skipped.
///
/// Invalid parameters yield an empty set rather than a panic; callers that
/// care validate up front.
pub fn compute_active(bars: &[Bar], active: &[ActiveIndicator], params: &IndicatorParams) -> IndicatorSet {
    let mut set = IndicatorSet::new();
    if let Err(e) = params.validate() {
        warn!(error = %e, "indicator parameters rejected, nothing computed");
        return set;
    }

    let times = || bars.iter().map(|b| b.time);
    for entry in active {
        let Some(key) = entry.parsed_key() else {
            warn!(key = %entry.key, "skipping unknown indicator");
            continue;
        };
        match key {
            IndicatorKey::Sma => set.insert("sma", Sma::new(params.sma_period).series(bars)),
            IndicatorKey::Ema => set.insert("ema", Ema::new(params.ema_period).series(bars)),
            IndicatorKey::Rsi => set.insert("rsi", Rsi::new(params.rsi_period).series(bars)),
            IndicatorKey::Macd => {
                let out = Macd::new(params.macd_fast, params.macd_slow, params.macd_signal)
                    .compute_all(bars);
                set.insert("macd", to_series(times(), &out.macd));
                set.insert("macdSignal", to_series(times(), &out.signal));
                set.insert("macdHistogram", to_series(times(), &out.histogram));
            }
            IndicatorKey::Bbands => {
                let out = Bollinger::middle(params.bb_period, params.bb_std_dev).compute_bands(bars);
                set.insert("bbUpper", to_series(times(), &out.upper));
                set.insert("bbMiddle", to_series(times(), &out.middle));
                set.insert("bbLower", to_series(times(), &out.lower));
            }
        }
    }
    set
}

/// Add the indicator if absent, remove it if present. Returns whether it is now active.
pub fn toggle(active: &mut Vec<ActiveIndicator>, key: IndicatorKey) -> bool {
    if let Some(pos) = active.iter().position(|a| a.parsed_key() == Some(key)) {
        active.remove(pos);
        false
    } else {
        active.push(key.to_active());
        true
    }
}

/// Case-insensitive substring match over keys and labels.
pub fn search(query: &str) -> Vec<IndicatorKey> {
    let q = query.trim().to_lowercase();
    IndicatorKey::ALL
        .into_iter()
        .filter(|k| q.is_empty() || k.as_str().contains(&q) || k.label().to_lowercase().contains(&q))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn keys_parse_with_alias() {
        assert_eq!("bb".parse::<IndicatorKey>().unwrap(), IndicatorKey::Bbands);
        assert_eq!("MACD".parse::<IndicatorKey>().unwrap(), IndicatorKey::Macd);
        assert!("vwap".parse::<IndicatorKey>().is_err());
    }

    #[test]
    fn default_params_are_valid() {
        assert_eq!(IndicatorParams::default().validate(), Ok(()));
        assert_eq!(IndicatorParams::default().sma_period, 3);
    }

    #[test]
    fn invalid_params_rejected() {
        let p = IndicatorParams {
            rsi_period: 0,
            ..Default::default()
        };
        assert_eq!(p.validate(), Err(IndicatorError::ZeroPeriod { name: "RSI" }));

        let p = IndicatorParams {
            macd_fast: 30,
            ..Default::default()
        };
        assert!(matches!(p.validate(), Err(IndicatorError::FastNotBelowSlow { .. })));

        let p = IndicatorParams {
            bb_std_dev: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(p.validate(), Err(IndicatorError::InvalidBandWidth(_))));
    }

    #[test]
    fn compute_active_names_every_series() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i % 7) as f64).collect();
        let bars = make_bars(&closes);
        let active: Vec<_> = IndicatorKey::ALL.iter().map(|k| k.to_active()).collect();
        let set = compute_active(&bars, &active, &IndicatorParams::default());
        let names: Vec<&str> = set.names().collect();
        for key in IndicatorKey::ALL {
            for name in key.series_names() {
                assert!(names.contains(name), "missing {name}");
            }
        }
        assert_eq!(set.len(), 9);
    }

    #[test]
    fn unknown_keys_are_skipped() {
        let bars = make_bars(&[105.0, 110.0, 115.0, 118.0]);
        let active = vec![
            ActiveIndicator {
                key: "ichimoku".into(),
                label: "Ichimoku".into(),
            },
            IndicatorKey::Sma.to_active(),
        ];
        let set = compute_active(&bars, &active, &IndicatorParams::default());
        assert_eq!(set.len(), 1);
        assert_eq!(set.latest("sma"), Some(114.3333));
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut active = Vec::new();
        assert!(toggle(&mut active, IndicatorKey::Rsi));
        assert_eq!(active[0].label, "Relative Strength Index");
        assert!(!toggle(&mut active, IndicatorKey::Rsi));
        assert!(active.is_empty());
    }

    #[test]
    fn search_matches_keys_and_labels() {
        assert_eq!(search("moving"), vec![IndicatorKey::Sma, IndicatorKey::Ema]);
        assert_eq!(search("BOLL"), vec![IndicatorKey::Bbands]);
        assert_eq!(search("").len(), 5);
        assert!(search("zzz").is_empty());
    }

    #[test]
    fn latest_of_missing_series_is_none() {
        assert_eq!(IndicatorSet::new().latest("rsi"), None);
    }
}

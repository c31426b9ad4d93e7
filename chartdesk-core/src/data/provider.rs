//! Bar provider trait and structured error types.
//!
//! `BarProvider` abstracts over where bars come from (Yahoo chart API, CSV
//! files, the synthetic generator) so the feed can swap sources and tests
//! can mock them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Bar, Timeframe};

/// Structured error types for data operations.
///
/// Displayable in both CLI and TUI contexts.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("csv error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid bar at row {row}: {reason}")]
    InvalidBar { row: usize, reason: String },

    #[error("data error: {0}")]
    Other(String),
}

/// Where bars came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Yahoo,
    Csv,
    #[default]
    Synthetic,
    Sample,
}

impl DataSource {
    pub fn as_str(self) -> &'static str {
        match self {
            DataSource::Yahoo => "yahoo",
            DataSource::Csv => "csv",
            DataSource::Synthetic => "synthetic",
            DataSource::Sample => "sample",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yahoo" => Ok(DataSource::Yahoo),
            "csv" => Ok(DataSource::Csv),
            "synthetic" => Ok(DataSource::Synthetic),
            "sample" => Ok(DataSource::Sample),
            other => Err(format!("unknown data source '{other}'")),
        }
    }
}

/// Result of a successful fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub bars: Vec<Bar>,
    pub source: DataSource,
}

pub trait BarProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch up to `count` of the most recent bars, ascending by time.
    fn fetch(&self, symbol: &str, timeframe: Timeframe, count: usize) -> Result<FetchResult, DataError>;

    /// Whether the provider currently accepts requests.
    fn is_available(&self) -> bool {
        true
    }
}

/// Keep only the newest `count` bars.
pub(crate) fn keep_last(mut bars: Vec<Bar>, count: usize) -> Vec<Bar> {
    if count > 0 && bars.len() > count {
        bars.drain(..bars.len() - count);
    }
    bars
}

//! CSV import/export with a `time,open,high,low,close,volume` header.
//!
//! `time` is unix seconds or an ISO date (`2025-07-30`, read as UTC midnight).

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::provider::{keep_last, BarProvider, DataError, DataSource, FetchResult};
use crate::domain::{Bar, Timeframe};

#[derive(Debug, Deserialize)]
struct CsvRow {
    time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<u64>,
}

#[derive(Debug, Serialize)]
struct CsvOut {
    time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

fn parse_time(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<i64>() {
        return Some(secs);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}

/// Read bars, validating each row and requiring ascending time.
pub fn read_bars(path: &Path) -> Result<Vec<Bar>, DataError> {
    let csv_err = |source| DataError::Csv {
        path: path.display().to_string(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    let mut bars: Vec<Bar> = Vec::new();
    for (i, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = row.map_err(csv_err)?;
        let line = i + 2;
        let time = parse_time(&row.time).ok_or_else(|| DataError::InvalidBar {
            row: line,
            reason: format!("unparseable time '{}'", row.time),
        })?;
        let bar = Bar {
            time,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume.unwrap_or(0),
        };
        if !bar.is_sane() {
            return Err(DataError::InvalidBar {
                row: line,
                reason: "high/low do not bracket open/close".into(),
            });
        }
        if bars.last().is_some_and(|prev| prev.time >= bar.time) {
            return Err(DataError::InvalidBar {
                row: line,
                reason: "time is not ascending".into(),
            });
        }
        bars.push(bar);
    }
    Ok(bars)
}

/// Write bars with the standard header, creating parent directories.
pub fn write_bars(path: &Path, bars: &[Bar]) -> Result<(), DataError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let csv_err = |source| DataError::Csv {
        path: path.display().to_string(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    for b in bars {
        writer
            .serialize(CsvOut {
                time: b.time,
                open: b.open,
                high: b.high,
                low: b.low,
                close: b.close,
                volume: b.volume,
            })
            .map_err(csv_err)?;
    }
    writer.flush()?;
    Ok(())
}

/// Serves `<dir>/<SYMBOL>_<timeframe>.csv`, falling back to `<dir>/<SYMBOL>.csv`.
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str, timeframe: Timeframe) -> PathBuf {
        let specific = self.dir.join(format!("{symbol}_{timeframe}.csv"));
        if specific.exists() {
            specific
        } else {
            self.dir.join(format!("{symbol}.csv"))
        }
    }
}

impl BarProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, symbol: &str, timeframe: Timeframe, count: usize) -> Result<FetchResult, DataError> {
        let path = self.path_for(symbol, timeframe);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        let bars = read_bars(&path)?;
        Ok(FetchResult {
            symbol: symbol.to_string(),
            timeframe,
            bars: keep_last(bars, count),
            source: DataSource::Csv,
        })
    }
}

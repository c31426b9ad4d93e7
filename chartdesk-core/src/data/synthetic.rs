//! Deterministic bar generators: a seeded random walk and the fixed demo sample.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{BarProvider, DataError, DataSource, FetchResult};
use crate::domain::{Bar, Timeframe};

/// The four-bar demo series, 2025-07-30 to 2025-08-02.
pub fn sample_bars() -> Vec<Bar> {
    const DAY: i64 = 86_400;
    const START: i64 = 1_753_833_600;
    [
        (100.0, 110.0, 95.0, 105.0),
        (105.0, 115.0, 100.0, 110.0),
        (110.0, 120.0, 105.0, 115.0),
        (115.0, 125.0, 110.0, 118.0),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (open, high, low, close))| Bar {
        time: START + i as i64 * DAY,
        open,
        high,
        low,
        close,
        volume: 0,
    })
    .collect()
}

/// Seeded geometric random walk.
///
/// The seed is mixed with the symbol so each symbol gets its own stable path.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    seed: u64,
    start_price: f64,
    volatility: f64,
    /// Timestamp of the newest generated bar; `None` means "now".
    end: Option<DateTime<Utc>>,
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            start_price: 100.0,
            volatility: 0.01,
            end: None,
        }
    }

    pub fn with_end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    fn symbol_seed(&self, symbol: &str) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(symbol.as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    pub fn generate(&self, symbol: &str, timeframe: Timeframe, count: usize) -> Vec<Bar> {
        let step = timeframe.seconds();
        let end = self.end.unwrap_or_else(Utc::now).timestamp();
        let last_time = end - end.rem_euclid(step);
        let first_time = last_time - step * count.saturating_sub(1) as i64;

        let mut rng = StdRng::seed_from_u64(self.symbol_seed(symbol));
        let mut close = self.start_price;
        (0..count)
            .map(|i| {
                let open = close;
                let ret: f64 = rng.gen_range(-1.0..1.0) * self.volatility;
                close = (open * (1.0 + ret)).max(0.01);
                let wick_hi: f64 = rng.gen_range(0.0..self.volatility) * open;
                let wick_lo: f64 = rng.gen_range(0.0..self.volatility) * open;
                Bar {
                    time: first_time + i as i64 * step,
                    open,
                    high: open.max(close) + wick_hi,
                    low: (open.min(close) - wick_lo).max(0.0),
                    close,
                    volume: rng.gen_range(1_000..100_000),
                }
            })
            .collect()
    }
}

impl BarProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, symbol: &str, timeframe: Timeframe, count: usize) -> Result<FetchResult, DataError> {
        Ok(FetchResult {
            symbol: symbol.to_string(),
            timeframe,
            bars: self.generate(symbol, timeframe, count),
            source: DataSource::Synthetic,
        })
    }
}

/// Always serves `sample_bars`, whatever the symbol or timeframe.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleProvider;

impl BarProvider for SampleProvider {
    fn name(&self) -> &str {
        "sample"
    }

    fn fetch(&self, symbol: &str, timeframe: Timeframe, _count: usize) -> Result<FetchResult, DataError> {
        Ok(FetchResult {
            symbol: symbol.to_string(),
            timeframe,
            bars: sample_bars(),
            source: DataSource::Sample,
        })
    }
}

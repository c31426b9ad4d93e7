//! Bar: the fundamental market data unit.

use serde::{Deserialize, Serialize};

/// OHLCV bar keyed by its open time in unix seconds.
///
/// `volume` is optional on the wire; feeds that do not report it deserialize to 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: u64,
}

impl Bar {
    /// Returns true if any OHLC field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}

/// True when bar times are strictly increasing.
pub fn is_monotonic(bars: &[Bar]) -> bool {
    bars.windows(2).all(|w| w[0].time < w[1].time)
}

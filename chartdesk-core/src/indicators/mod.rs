//! Technical indicators.
//!
//! Every indicator implements `Indicator`. Multi-series indicators (MACD,
//! Bollinger) are exposed as separate named instances per line, keeping the
//! single-series trait unchanged, plus a combined `compute_*` method used by
//! the catalog.

pub mod bollinger;
pub mod catalog;
pub mod ema;
pub mod indicator;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use bollinger::{Bollinger, BollingerBand, BollingerOutput};
pub use catalog::{
    compute_active, search, toggle, ActiveIndicator, IndicatorError, IndicatorKey, IndicatorParams,
    IndicatorSet,
};
pub use ema::{ema_of_series, Ema};
pub use indicator::Indicator;
pub use macd::{Macd, MacdLine, MacdOutput};
pub use rsi::Rsi;
pub use sma::{sma_of_series, Sma};

/// Create synthetic daily bars from close prices for testing.
///
/// open = prev_close (or close for first bar), high = max(open,close) + 1.0,
/// low = min(open,close) - 1.0, volume = 1000. Times start 2025-07-30 UTC.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    const BASE: i64 = 1_753_833_600;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                time: BASE + i as i64 * 86_400,
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

//! The `Indicator` trait.
//!
//! Indicators are pure functions: bar history in, numeric series out. They
//! never hold state between calls, so recomputing over the full history after
//! every new bar is always correct.

use crate::domain::{to_series, Bar, Series};

/// Trait for indicators.
///
/// `compute` produces an output aligned with `bars` where undefined leading
/// entries are `f64::NAN`. `series` is the public form: warm-up omitted and
/// values rounded to 4 decimals.
///
/// No value at bar t may depend on bars after t.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_3", "rsi_14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;

    /// Time-stamped output with the warm-up removed.
    fn series(&self, bars: &[Bar]) -> Series {
        let values = self.compute(bars);
        to_series(bars.iter().map(|b| b.time), &values)
    }
}

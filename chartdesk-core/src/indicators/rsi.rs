//! Relative Strength Index (RSI).
//!
//! Seed gain/loss are the raw sums of positive and negative close deltas over
//! bars 1..period-1. The first value lands at index `period`; later values use
//! Wilder smoothing, gain = (gain * (period - 1) + g) / period.
//! RSI = 100 - 100 / (1 + gain / loss), with a zero loss floored at 1e-8.
//! Lookback: period.

use super::Indicator;
use crate::domain::Bar;

const LOSS_FLOOR: f64 = 1e-8;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let p = self.period;
        let mut result = vec![f64::NAN; n];

        if n < p + 1 {
            return result;
        }

        let mut gain = 0.0;
        let mut loss = 0.0;
        for i in 1..p {
            let diff = bars[i].close - bars[i - 1].close;
            if diff.is_nan() {
                return result;
            }
            if diff >= 0.0 {
                gain += diff;
            } else {
                loss -= diff;
            }
        }
        if bars[p].close.is_nan() {
            return result;
        }
        result[p] = rsi_value(gain, loss);

        let pf = p as f64;
        for i in (p + 1)..n {
            let diff = bars[i].close - bars[i - 1].close;
            if diff.is_nan() {
                return result;
            }
            let g = diff.max(0.0);
            let l = (-diff).max(0.0);
            gain = (gain * (pf - 1.0) + g) / pf;
            loss = (loss * (pf - 1.0) + l) / pf;
            result[i] = rsi_value(gain, loss);
        }

        result
    }
}

fn rsi_value(gain: f64, loss: f64) -> f64 {
    let loss = if loss == 0.0 { LOSS_FLOOR } else { loss };
    100.0 - 100.0 / (1.0 + gain / loss)
}

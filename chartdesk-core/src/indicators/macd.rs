//! Moving Average Convergence Divergence (MACD).
//!
//! Fast and slow EMAs are rounded to 4 decimals before differencing.
//! The signal line is an EMA of the valid MACD values, seeded with their
//! first `signal` mean. Histogram = MACD - signal.
//!
//! Three lines (separate Indicator instances, or all at once via `compute_all`).
//! Input shorter than the slow period yields no output at all.

use super::ema::ema_of_series;
use super::Indicator;
use crate::domain::{round4, Bar};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Macd,
    Signal,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
    name: String,
}

/// All three MACD lines, aligned with the input bars (NaN where undefined).
#[derive(Debug, Clone, Default)]
pub struct MacdOutput {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self::with_line(fast, slow, signal, MacdLine::Macd)
    }

    pub fn with_line(fast: usize, slow: usize, signal: usize, line: MacdLine) -> Self {
        assert!(fast >= 1 && slow >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(fast < slow, "MACD fast period must be below slow period");
        let tag = match line {
            MacdLine::Macd => "macd",
            MacdLine::Signal => "macd_signal",
            MacdLine::Histogram => "macd_histogram",
        };
        Self {
            fast,
            slow,
            signal,
            line,
            name: format!("{tag}_{fast}_{slow}_{signal}"),
        }
    }

    pub fn compute_all(&self, bars: &[Bar]) -> MacdOutput {
        let n = bars.len();
        let nan = || vec![f64::NAN; n];
        if n < self.slow {
            return MacdOutput {
                macd: nan(),
                signal: nan(),
                histogram: nan(),
            };
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let fast = ema_of_series(&closes, self.fast);
        let slow = ema_of_series(&closes, self.slow);

        let macd: Vec<f64> = fast
            .iter()
            .zip(&slow)
            .map(|(&f, &s)| {
                if f.is_finite() && s.is_finite() {
                    round4(round4(f) - round4(s))
                } else {
                    f64::NAN
                }
            })
            .collect();

        let mut signal = nan();
        if let Some(start) = macd.iter().position(|v| v.is_finite()) {
            let raw = ema_of_series(&macd[start..], self.signal);
            for (offset, v) in raw.into_iter().enumerate() {
                signal[start + offset] = round4(v);
            }
        }

        let histogram = macd
            .iter()
            .zip(&signal)
            .map(|(&m, &s)| {
                if m.is_finite() && s.is_finite() {
                    round4(m - s)
                } else {
                    f64::NAN
                }
            })
            .collect();

        MacdOutput {
            macd,
            signal,
            histogram,
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.line {
            MacdLine::Macd => self.slow - 1,
            MacdLine::Signal | MacdLine::Histogram => self.slow + self.signal - 2,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let out = self.compute_all(bars);
        match self.line {
            MacdLine::Macd => out.macd,
            MacdLine::Signal => out.signal,
            MacdLine::Histogram => out.histogram,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    fn zigzag(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.3)
            .collect()
    }

    #[test]
    fn macd_short_input_is_empty() {
        let bars = make_bars(&zigzag(25));
        let out = Macd::new(12, 26, 9).compute_all(&bars);
        assert!(out.macd.iter().all(|v| v.is_nan()));
        assert!(out.signal.iter().all(|v| v.is_nan()));
        assert!(out.histogram.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn macd_leading_indices() {
        let bars = make_bars(&zigzag(60));
        let out = Macd::new(12, 26, 9).compute_all(&bars);
        assert!(out.macd[24].is_nan());
        assert!(out.macd[25].is_finite());
        assert!(out.signal[32].is_nan());
        assert!(out.signal[33].is_finite());
        assert!(out.histogram[32].is_nan());
        assert!(out.histogram[33].is_finite());
        assert_eq!(Macd::with_line(12, 26, 9, MacdLine::Signal).lookback(), 33);
    }

    #[test]
    fn histogram_is_macd_minus_signal() {
        let bars = make_bars(&zigzag(80));
        let out = Macd::new(12, 26, 9).compute_all(&bars);
        for i in 0..bars.len() {
            if out.histogram[i].is_finite() {
                assert_approx(out.histogram[i], out.macd[i] - out.signal[i], 1e-4 + 1e-9);
            }
        }
    }

    #[test]
    fn signal_seed_is_mean_of_first_macd_values() {
        let bars = make_bars(&zigzag(40));
        let out = Macd::new(3, 6, 4).compute_all(&bars);
        let first: Vec<f64> = out.macd[5..9].to_vec();
        let mean = first.iter().sum::<f64>() / 4.0;
        assert_approx(out.signal[8], round4(mean), 1e-12);
    }

    #[test]
    fn constant_prices_give_flat_zero() {
        let bars = make_bars(&[50.0; 40]);
        let out = Macd::new(12, 26, 9).compute_all(&bars);
        assert_eq!(out.macd[39], 0.0);
        assert_eq!(out.signal[39], 0.0);
        assert_eq!(out.histogram[39], 0.0);
    }

    #[test]
    #[should_panic(expected = "fast period must be below")]
    fn fast_must_be_below_slow() {
        let _ = Macd::new(26, 12, 9);
    }
}

//! Public indicator output: time-stamped points with warm-up omitted.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub time: i64,
    pub value: f64,
}

pub type Series = Vec<SeriesPoint>;

/// Round to 4 decimal places, half away from zero.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Pair a NaN-padded aligned output with bar times, dropping undefined entries.
pub fn to_series(times: impl IntoIterator<Item = i64>, values: &[f64]) -> Series {
    times
        .into_iter()
        .zip(values.iter())
        .filter(|(_, v)| v.is_finite())
        .map(|(time, &v)| SeriesPoint {
            time,
            value: round4(v),
        })
        .collect()
}

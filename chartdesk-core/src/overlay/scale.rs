//! Mapping between bar/price space and chart-local coordinates.

use crate::domain::{Bar, Point, SeriesPoint};
use crate::drawing::Viewport;

/// Linear projection for the visible window of a chart.
///
/// x grows with bar index, y grows downwards (price_max at y = 0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartScale {
    pub viewport: Viewport,
    pub first_index: usize,
    pub bar_spacing: f64,
    pub price_min: f64,
    pub price_max: f64,
}

impl ChartScale {
    /// Fit the last bars that fit in `viewport` with 5% price padding.
    pub fn fit(bars: &[Bar], viewport: Viewport, bar_spacing: f64) -> Self {
        let spacing = if bar_spacing > 0.0 { bar_spacing } else { 1.0 };
        let capacity = (viewport.width / spacing).floor().max(1.0) as usize;
        let first_index = bars.len().saturating_sub(capacity);
        let visible = &bars[first_index..];

        let lo = visible.iter().map(|b| b.low).filter(|v| v.is_finite()).fold(f64::INFINITY, f64::min);
        let hi = visible.iter().map(|b| b.high).filter(|v| v.is_finite()).fold(f64::NEG_INFINITY, f64::max);
        let (price_min, price_max) = if lo.is_finite() && hi.is_finite() {
            let range = hi - lo;
            let pad = if range > 0.0 { range * 0.05 } else { 1.0 };
            (lo - pad, hi + pad)
        } else {
            (0.0, 1.0)
        };

        Self {
            viewport,
            first_index,
            bar_spacing: spacing,
            price_min,
            price_max,
        }
    }

    /// Number of bars the viewport shows.
    pub fn capacity(&self) -> usize {
        (self.viewport.width / self.bar_spacing).floor().max(1.0) as usize
    }

    pub fn price_to_y(&self, price: f64) -> f64 {
        let range = self.price_max - self.price_min;
        let span = (self.viewport.height - 1.0).max(0.0);
        if range.abs() < 1e-9 {
            return span / 2.0;
        }
        span * (1.0 - (price - self.price_min) / range)
    }

    pub fn y_to_price(&self, y: f64) -> f64 {
        let span = (self.viewport.height - 1.0).max(1.0);
        self.price_max - (y / span) * (self.price_max - self.price_min)
    }

    pub fn index_to_x(&self, index: usize) -> f64 {
        (index as f64 - self.first_index as f64) * self.bar_spacing
    }

    /// Bar index under x, if it is inside the visible window.
    pub fn x_to_index(&self, x: f64, bar_count: usize) -> Option<usize> {
        if x < 0.0 {
            return None;
        }
        let i = self.first_index + (x / self.bar_spacing).floor() as usize;
        (i < bar_count).then_some(i)
    }

    pub fn is_visible(&self, index: usize) -> bool {
        index >= self.first_index && index < self.first_index + self.capacity()
    }
}

/// Project a time series onto the chart, matching points to bars by time.
///
/// Points whose time has no bar, or whose bar is scrolled out, are dropped.
pub fn project_series(series: &[SeriesPoint], bars: &[Bar], scale: &ChartScale) -> Vec<Point> {
    series
        .iter()
        .filter_map(|p| {
            let index = bars.binary_search_by_key(&p.time, |b| b.time).ok()?;
            scale
                .is_visible(index)
                .then(|| Point::new(scale.index_to_x(index), scale.price_to_y(p.value)))
        })
        .collect()
}

//! Overlay renderer: a read-only projection of drawing, indicator and alert
//! state into `Primitive`s.

use super::primitive::{palette, Color, Fill, Primitive, Stroke};
use super::scale::{project_series, ChartScale};
use crate::alerts::{AlertCondition, AlertRule};
use crate::domain::{Bar, Point, Segment, Shape};
use crate::drawing::{anchors_for, DrawingStore, Viewport};
use crate::indicators::IndicatorSet;

/// Retracement ratios and their colours, top to bottom.
pub const FIB_LEVELS: [(f64, Color); 7] = [
    (0.0, Color::rgb(0xe5, 0x39, 0x35)),
    (0.236, Color::rgb(0x8e, 0x24, 0xaa)),
    (0.382, Color::rgb(0x39, 0x49, 0xab)),
    (0.5, Color::rgb(0x03, 0x9b, 0xe5)),
    (0.618, Color::rgb(0x43, 0xa0, 0x47)),
    (0.786, Color::rgb(0xfb, 0xc0, 0x2d)),
    (1.0, Color::rgb(0xe5, 0x39, 0x35)),
];

pub const DRAFT_OPACITY: f64 = 0.55;
pub const ALERT_GLYPH: &str = "\u{1f514}";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayOptions {
    pub viewport: Viewport,
    /// Gap between a fib retracement's right edge and its level labels.
    pub label_offset: f64,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            label_offset: 8.0,
        }
    }
}

/// A price alert drawn as a horizontal line.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertMarker {
    pub rule_id: String,
    pub y: f64,
}

impl AlertMarker {
    /// Markers for the symbol's pending price alerts. Triggered and indicator rules get none.
    pub fn for_rules(rules: &[AlertRule], symbol: &str, scale: &ChartScale) -> Vec<AlertMarker> {
        rules
            .iter()
            .filter(|r| {
                r.symbol == symbol
                    && r.condition == AlertCondition::Price
                    && !r.triggered
                    && (r.active || r.snoozed_until.is_some())
            })
            .map(|r| AlertMarker {
                rule_id: r.id.clone(),
                y: scale.price_to_y(r.threshold),
            })
            .collect()
    }
}

/// Everything above the candles: alert markers, shapes, the draft, then handles.
pub fn render(store: &DrawingStore, markers: &[AlertMarker], opts: &OverlayOptions) -> Vec<Primitive> {
    let mut out = Vec::new();
    for marker in markers {
        render_alert(marker, opts, &mut out);
    }
    for (i, shape) in store.drawings().iter().enumerate() {
        render_shape(shape, store.selection() == Some(i), opts, &mut out);
    }
    if let Some(draft) = store.draft() {
        let start = out.len();
        render_shape(draft, false, opts, &mut out);
        for p in &mut out[start..] {
            as_draft(p);
        }
    }
    if let Some(shape) = store.selected_shape() {
        out.extend(anchors_for(shape, opts.viewport).into_iter().map(|a| Primitive::Handle {
            at: a.at,
            anchor: a.kind,
        }));
    }
    out
}

pub fn render_shape(shape: &Shape, selected: bool, opts: &OverlayOptions, out: &mut Vec<Primitive>) {
    match shape {
        Shape::Trendline(s) => {
            let stroke = if selected {
                Stroke::solid(palette::SELECTED, 3.5)
            } else {
                Stroke::solid(palette::TRENDLINE, 2.0)
            };
            out.push(line(s.start(), s.end(), stroke, false));
        }
        Shape::Rectangle(s) => {
            let (left, top, right, bottom) = s.bounds();
            let stroke = if selected {
                Stroke::solid(palette::RECTANGLE, 3.5)
            } else {
                Stroke::dashed(palette::RECTANGLE, 2.0)
            };
            out.push(Primitive::Rect {
                origin: Point::new(left, top),
                width: right - left,
                height: bottom - top,
                stroke,
                fill: Some(Fill {
                    color: palette::RECTANGLE_FILL,
                    alpha: 0.08,
                }),
            });
        }
        Shape::Arrow(s) => out.push(line(s.start(), s.end(), Stroke::solid(palette::ARROW, 3.0), true)),
        Shape::Fib(s) => render_fib(s, opts, out),
        Shape::Hline { y } => out.push(line(
            Point::new(0.0, *y),
            Point::new(opts.viewport.width, *y),
            Stroke::dashed(palette::HLINE, 2.0).with_opacity(0.8),
            false,
        )),
        Shape::Text { x, y, text } => out.push(Primitive::Label {
            at: Point::new(*x, *y),
            text: text.clone(),
            color: palette::TEXT,
        }),
    }
}

/// Level `p` sits at y1 + (y2 - y1) * p; labels read "23.6%".
fn render_fib(s: &Segment, opts: &OverlayOptions, out: &mut Vec<Primitive>) {
    let label_x = s.x1.max(s.x2) + opts.label_offset;
    for (ratio, color) in FIB_LEVELS {
        let y = s.y1 + (s.y2 - s.y1) * ratio;
        out.push(line(
            Point::new(s.x1, y),
            Point::new(s.x2, y),
            Stroke::dashed(color, 2.0),
            false,
        ));
        out.push(Primitive::Label {
            at: Point::new(label_x, y),
            text: format!("{:.1}%", ratio * 100.0),
            color,
        });
    }
}

fn render_alert(marker: &AlertMarker, opts: &OverlayOptions, out: &mut Vec<Primitive>) {
    let width = opts.viewport.width;
    out.push(line(
        Point::new(0.0, marker.y),
        Point::new(width, marker.y),
        Stroke::dashed(palette::ALERT, 2.0).with_opacity(0.8),
        false,
    ));
    out.push(Primitive::Label {
        at: Point::new((width - 18.0).max(0.0), marker.y - 2.0),
        text: ALERT_GLYPH.to_string(),
        color: palette::ALERT,
    });
}

fn line(from: Point, to: Point, stroke: Stroke, arrow_head: bool) -> Primitive {
    Primitive::Line {
        from,
        to,
        stroke,
        arrow_head,
    }
}

fn as_draft(p: &mut Primitive) {
    match p {
        Primitive::Line { stroke, .. } | Primitive::Rect { stroke, .. } | Primitive::Polyline { stroke, .. } => {
            stroke.dashed = true;
            stroke.opacity = DRAFT_OPACITY;
        }
        Primitive::Label { .. } | Primitive::Handle { .. } => {}
    }
}

/// Line style for a named indicator series.
pub fn series_style(name: &str) -> Option<Stroke> {
    let stroke = match name {
        "sma" => Stroke::solid(palette::SMA, 2.0),
        "ema" => Stroke::dashed(palette::EMA, 2.0),
        "rsi" => Stroke::dashed(palette::RSI, 1.0),
        "macd" => Stroke::solid(palette::MACD, 1.0),
        "macdSignal" => Stroke::dashed(palette::MACD_SIGNAL, 1.0),
        "macdHistogram" => Stroke::solid(palette::MACD_HISTOGRAM, 1.0),
        "bbUpper" | "bbLower" => Stroke::dashed(palette::BB_BAND, 1.0),
        "bbMiddle" => Stroke::dashed(palette::BB_MIDDLE, 1.0),
        _ => return None,
    };
    Some(stroke)
}

/// Series plotted on the price axis; oscillators are shown elsewhere.
pub fn is_price_overlay(name: &str) -> bool {
    matches!(name, "sma" | "ema" | "bbUpper" | "bbMiddle" | "bbLower")
}

/// Polylines for every price-axis series in `set`.
pub fn render_series(set: &IndicatorSet, bars: &[Bar], scale: &ChartScale) -> Vec<Primitive> {
    set.iter()
        .filter(|(name, _)| is_price_overlay(name))
        .filter_map(|(name, series)| {
            let stroke = series_style(name)?;
            let points = project_series(series, bars, scale);
            (!points.is_empty()).then(|| Primitive::Polyline {
                series: name.to_string(),
                points,
                stroke,
            })
        })
        .collect()
}

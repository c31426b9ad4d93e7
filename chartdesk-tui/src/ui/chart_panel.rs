//! Price chart: candles written straight into the buffer, drawings and
//! indicator lines painted on a braille canvas above them.
//!
//! One terminal cell is one unit of chart space, so the router, the overlay
//! renderer and this module all agree on coordinates without conversion.

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Context, Line as CanvasLine};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget};
use ratatui::Frame;

use chartdesk_core::domain::{Bar, Point, Series};
use chartdesk_core::overlay::{palette, series_style, ChartScale, Primitive, Stroke};

use crate::app::AppState;
use crate::theme::{self, Theme};
use crate::ui::AXIS_WIDTH;

const DASH_ON: f64 = 2.0;
const DASH_OFF: f64 = 1.0;
const ARROW_HEAD_LEN: f64 = 2.0;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let session = &app.session;
    let source = app.feed_status.as_deref().unwrap_or("loading");
    let title = format!(" {} \u{00b7} {} \u{00b7} {} ", session.symbol(), session.timeframe(), source);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(app.overlay == crate::app::Overlay::None))
        .title(title)
        .title_style(theme::panel_title(true));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let plot = app.layout.plot;
    if plot.width == 0 || plot.height == 0 {
        return;
    }
    if session.bars().is_empty() {
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(format!("Waiting for {} data...", session.symbol()), theme::muted())),
        ]);
        f.render_widget(msg, plot);
    }

    let scale = app.chart_scale();
    let theme = Theme::default();
    f.render_widget(CandleLayer::new(session.bars(), &scale, &theme), inner);

    let prims = app.chart_primitives();
    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([0.0, plot.width as f64])
        .y_bounds([0.0, plot.height as f64])
        .paint(|ctx| paint(ctx, &prims, plot.height as f64));
    f.render_widget(canvas, plot);

    if let Some(entry) = session.router().text_entry() {
        let x = plot.x.saturating_add(entry.at.x.max(0.0) as u16);
        let y = plot.y.saturating_add(entry.at.y.max(0.0) as u16);
        if x < plot.right() && y < plot.bottom() {
            let text = format!("{}_", entry.buffer);
            let width = plot.right() - x;
            f.buffer_mut().set_stringn(
                x,
                y,
                text,
                width as usize,
                Style::default().fg(theme::to_tui(palette::TEXT)).add_modifier(Modifier::UNDERLINED),
            );
        }
    }

    render_info_row(f, inner, app);
}

fn render_info_row(f: &mut Frame, inner: Rect, app: &AppState) {
    if inner.height == 0 {
        return;
    }
    let y = inner.bottom() - 1;
    let session = &app.session;
    let store = session.store();
    let mut text = format!("tool: {} | {} drawings", store.tool().label(), store.len());
    if let Some(last) = session.bars().last() {
        text = format!(
            "O {:.2} H {:.2} L {:.2} C {:.2} | {}",
            last.open, last.high, last.low, last.close, text
        );
    }
    if store.selection().is_some() {
        text.push_str(" | Del removes selection");
    }
    f.buffer_mut()
        .set_stringn(inner.x, y, text, inner.width as usize, theme::muted());
}

/// Candles and y-axis labels, one column per bar.
pub struct CandleLayer<'a> {
    bars: &'a [Bar],
    scale: &'a ChartScale,
    theme: &'a Theme,
}

impl<'a> CandleLayer<'a> {
    pub fn new(bars: &'a [Bar], scale: &'a ChartScale, theme: &'a Theme) -> Self {
        Self { bars, scale, theme }
    }

    fn row(&self, price: f64, plot_height: u16) -> u16 {
        let y = self.scale.price_to_y(price).round();
        y.clamp(0.0, plot_height.saturating_sub(1) as f64) as u16
    }
}

impl Widget for CandleLayer<'_> {
    /// `area` is the chart block's inner area.
    fn render(self, area: Rect, buf: &mut Buffer) {
        let plot_left = area.x + AXIS_WIDTH.min(area.width);
        let plot_top = area.y;
        let plot_width = area.width.saturating_sub(AXIS_WIDTH);
        let plot_height = area.height.saturating_sub(1);
        if plot_width == 0 || plot_height == 0 || self.bars.is_empty() {
            return;
        }

        let labels = [
            (self.scale.price_max, 0u16),
            ((self.scale.price_max + self.scale.price_min) / 2.0, plot_height / 2),
            (self.scale.price_min, plot_height.saturating_sub(1)),
        ];
        for (value, row) in labels {
            buf.set_string(area.x, plot_top + row, format!("{value:>7.1}"), Style::default().fg(self.theme.muted));
        }

        for (i, bar) in self.bars.iter().enumerate().skip(self.scale.first_index) {
            let col = self.scale.index_to_x(i);
            if col < 0.0 || col >= plot_width as f64 {
                break;
            }
            let x = plot_left + col as u16;
            let is_up = bar.close >= bar.open;
            let style = Style::default().fg(self.theme.candle_color(bar.open, bar.close));

            let high_y = self.row(bar.high, plot_height);
            let low_y = self.row(bar.low, plot_height);
            let body_top = self.row(bar.open.max(bar.close), plot_height);
            let body_bottom = self.row(bar.open.min(bar.close), plot_height);

            for y in high_y..body_top {
                buf.set_string(x, plot_top + y, "|", style);
            }
            let body = if is_up { "\u{2588}" } else { "\u{2593}" };
            for y in body_top..=body_bottom {
                buf.set_string(x, plot_top + y, body, style);
            }
            for y in (body_bottom + 1)..=low_y {
                buf.set_string(x, plot_top + y, "|", style);
            }
        }
    }
}

/// Chart space (y down, cell units) to canvas space (y up, cell centres).
fn to_canvas(p: Point, height: f64) -> (f64, f64) {
    (p.x + 0.5, height - (p.y + 0.5))
}

fn paint(ctx: &mut Context<'_>, prims: &[Primitive], height: f64) {
    for prim in prims {
        match prim {
            Primitive::Line {
                from,
                to,
                stroke,
                arrow_head,
            } => {
                stroke_line(ctx, *from, *to, stroke, height);
                if *arrow_head {
                    for (a, b) in arrow_head_lines(*from, *to) {
                        stroke_line(ctx, a, b, &Stroke { dashed: false, ..*stroke }, height);
                    }
                }
            }
            Primitive::Polyline { points, stroke, .. } => {
                for pair in points.windows(2) {
                    stroke_line(ctx, pair[0], pair[1], stroke, height);
                }
            }
            Primitive::Rect {
                origin,
                width,
                height: h,
                stroke,
                ..
            } => {
                let (x0, y0) = (origin.x, origin.y);
                let (x1, y1) = (x0 + width, y0 + h);
                let corners = [
                    Point::new(x0, y0),
                    Point::new(x1, y0),
                    Point::new(x1, y1),
                    Point::new(x0, y1),
                ];
                for i in 0..4 {
                    stroke_line(ctx, corners[i], corners[(i + 1) % 4], stroke, height);
                }
            }
            Primitive::Label { at, text, color } => {
                let (x, y) = to_canvas(*at, height);
                ctx.print(x, y, Span::styled(text.clone(), Style::default().fg(theme::to_tui(*color))));
            }
            Primitive::Handle { at, .. } => {
                let (x, y) = to_canvas(*at, height);
                ctx.print(x, y, Span::styled("\u{25a0}", Style::default().fg(theme::to_tui(palette::HANDLE))));
            }
        }
    }
}

fn stroke_line(ctx: &mut Context<'_>, from: Point, to: Point, stroke: &Stroke, height: f64) {
    let color = theme::faded(stroke.color, stroke.opacity);
    let segments = if stroke.dashed {
        dash_segments(from, to, DASH_ON, DASH_OFF)
    } else {
        vec![(from, to)]
    };
    for (a, b) in segments {
        let (x1, y1) = to_canvas(a, height);
        let (x2, y2) = to_canvas(b, height);
        ctx.draw(&CanvasLine { x1, y1, x2, y2, color });
    }
}

/// Split a line into dashes of `on` length separated by `off` gaps.
pub fn dash_segments(from: Point, to: Point, on: f64, off: f64) -> Vec<(Point, Point)> {
    let len = from.distance(to);
    if len <= on || on <= 0.0 {
        return vec![(from, to)];
    }
    let (dx, dy) = ((to.x - from.x) / len, (to.y - from.y) / len);
    let at = |d: f64| Point::new(from.x + dx * d, from.y + dy * d);
    let mut out = Vec::new();
    let mut d = 0.0;
    while d < len {
        out.push((at(d), at((d + on).min(len))));
        d += on + off;
    }
    out
}

/// Two short strokes at `to` pointing back along the shaft.
pub fn arrow_head_lines(from: Point, to: Point) -> [(Point, Point); 2] {
    let angle = (to.y - from.y).atan2(to.x - from.x);
    let spread = std::f64::consts::PI / 7.0;
    let wing = |a: f64| {
        Point::new(
            to.x - ARROW_HEAD_LEN * (angle - a).cos(),
            to.y - ARROW_HEAD_LEN * (angle - a).sin(),
        )
    };
    [(to, wing(spread)), (to, wing(-spread))]
}

// ── Oscillator pane ──────────────────────────────────────────────────────

/// RSI and/or MACD under the price chart, side by side when both are on.
pub fn render_oscillator(f: &mut Frame, area: Rect, app: &AppState) {
    let set = app.session.indicators();
    let mut panes: Vec<(&str, Vec<&str>)> = Vec::new();
    if set.get("rsi").is_some() {
        panes.push(("RSI", vec!["rsi"]));
    }
    if set.get("macd").is_some() {
        panes.push(("MACD", vec!["macd", "macdSignal", "macdHistogram"]));
    }
    if panes.is_empty() {
        return;
    }
    let constraints = vec![Constraint::Ratio(1, panes.len() as u32); panes.len()];
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    let scale = app.chart_scale();
    let bars = app.session.bars();
    for ((title, names), pane) in panes.into_iter().zip(cols.iter()) {
        let data: Vec<(&str, Vec<(f64, f64)>)> = names
            .iter()
            .filter_map(|n| set.get(n).map(|s| (*n, oscillator_points(s, bars, &scale))))
            .collect();
        render_oscillator_pane(f, *pane, title, &data, scale.capacity());
    }
}

/// (visible column, value) pairs for a series.
pub fn oscillator_points(series: &Series, bars: &[Bar], scale: &ChartScale) -> Vec<(f64, f64)> {
    series
        .iter()
        .filter_map(|p| {
            let index = bars.binary_search_by_key(&p.time, |b| b.time).ok()?;
            scale.is_visible(index).then(|| (scale.index_to_x(index), p.value))
        })
        .collect()
}

fn render_oscillator_pane(f: &mut Frame, area: Rect, title: &str, data: &[(&str, Vec<(f64, f64)>)], width: usize) {
    let (lo, hi) = if title == "RSI" {
        (0.0, 100.0)
    } else {
        let values = data.iter().flat_map(|(_, d)| d.iter().map(|(_, v)| *v));
        let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if lo.is_finite() && hi > lo {
            (lo, hi)
        } else {
            (-1.0, 1.0)
        }
    };

    let latest = data
        .first()
        .and_then(|(_, d)| d.last())
        .map(|(_, v)| format!(" {v:.2}"))
        .unwrap_or_default();

    let datasets: Vec<Dataset> = data
        .iter()
        .map(|(name, points)| {
            let color = series_style(name).map(|s| theme::to_tui(s.color)).unwrap_or(theme::ACCENT);
            Dataset::default()
                .name(*name)
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(color))
                .data(points)
        })
        .collect();

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme::muted())
                .title(format!(" {title}{latest} "))
                .title_style(theme::muted()),
        )
        .x_axis(Axis::default().bounds([0.0, width.max(1) as f64]))
        .y_axis(
            Axis::default()
                .style(theme::muted())
                .bounds([lo, hi])
                .labels(vec![
                    Span::styled(format!("{lo:.0}"), theme::muted()),
                    Span::styled(format!("{hi:.0}"), theme::muted()),
                ]),
        );
    f.render_widget(chart, area);
}

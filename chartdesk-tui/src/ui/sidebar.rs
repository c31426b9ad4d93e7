//! Right-hand sidebar: indicator readings, drawing summary, symbol alerts, feed info.

use chrono::{DateTime, Utc};
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use chartdesk_core::alerts::AlertStatus;
use chartdesk_core::overlay::series_style;

use crate::app::AppState;
use crate::theme::{self, Theme};

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(false))
        .title(" Watch ")
        .title_style(theme::panel_title(false));
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(Paragraph::new(lines(app, Utc::now())), inner);
}

fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(text.to_string(), theme::accent_bold()))
}

pub fn status_glyph(status: AlertStatus) -> &'static str {
    match status {
        AlertStatus::Active => "\u{25cf}",
        AlertStatus::Triggered => "\u{2713}",
        AlertStatus::Paused => "\u{2016}",
        AlertStatus::Snoozed => "z",
    }
}

fn lines(app: &AppState, now: DateTime<Utc>) -> Vec<Line<'static>> {
    let theme = Theme::default();
    let session = &app.session;
    let mut out = vec![heading("Indicators")];

    if session.active_indicators().is_empty() {
        out.push(Line::from(Span::styled("  none (i to add)", theme::muted())));
    }
    for active in session.active_indicators() {
        let Some(key) = active.parsed_key() else {
            continue;
        };
        out.push(Line::from(Span::raw(format!(" {}", key.label()))));
        for name in key.series_names() {
            let value = session.indicators().latest(name);
            let color = match (*name, value) {
                ("rsi", Some(v)) => theme.rsi_color(v),
                _ => series_style(name).map(|s| theme::to_tui(s.color)).unwrap_or(theme.text_secondary),
            };
            let text = value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".into());
            out.push(Line::from(vec![
                Span::styled(format!("   {name:<14}"), theme::muted()),
                Span::styled(text, Style::default().fg(color)),
            ]));
        }
    }

    let store = session.store();
    out.push(Line::from(""));
    out.push(heading("Drawings"));
    out.push(Line::from(Span::styled(
        format!("  {} on chart, {} undo steps", store.len(), store.undo_depth()),
        theme::muted(),
    )));
    if let Some(shape) = store.selected_shape() {
        out.push(Line::from(Span::styled(format!("  selected: {}", shape.kind()), theme::accent())));
    }

    out.push(Line::from(""));
    out.push(heading("Alerts"));
    let rules: Vec<_> = app.alert_rules.iter().filter(|r| r.symbol == session.symbol()).collect();
    if rules.is_empty() {
        out.push(Line::from(Span::styled("  none (A to add)", theme::muted())));
    }
    for rule in rules {
        let status = rule.status(now);
        let style = match status {
            AlertStatus::Active => theme::positive(),
            AlertStatus::Triggered => theme::warning(),
            AlertStatus::Paused | AlertStatus::Snoozed => theme::muted(),
        };
        out.push(Line::from(vec![
            Span::styled(format!("  {} ", status_glyph(status)), style),
            Span::raw(format!("{} \u{2265} {}", rule.condition.as_str().to_uppercase(), rule.threshold)),
            Span::styled(if rule.repeat { " \u{21bb}" } else { "" }, theme::muted()),
        ]));
    }

    out.push(Line::from(""));
    out.push(heading("Data"));
    out.push(Line::from(Span::styled(
        format!(
            "  {} bars from {}",
            session.bars().len(),
            app.feed_status.as_deref().unwrap_or("-")
        ),
        theme::muted(),
    )));
    if let Some(last) = session.bars().last() {
        let when = DateTime::from_timestamp(last.time, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        out.push(Line::from(Span::styled(format!("  last {when}"), theme::muted())));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::app_with_channels;
    use chartdesk_core::indicators::IndicatorKey;

    fn text(lines: &[Line]) -> String {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn empty_sidebar_shows_hints() {
        let (app, _rx, _tx) = app_with_channels();
        let t = text(&lines(&app, Utc::now()));
        assert!(t.contains("none (i to add)"));
        assert!(t.contains("none (A to add)"));
        assert!(t.contains("0 bars"));
    }

    #[test]
    fn active_indicator_lists_its_series() {
        let (mut app, _rx, _tx) = app_with_channels();
        app.toggle_indicator(IndicatorKey::Macd);
        let t = text(&lines(&app, Utc::now()));
        assert!(t.contains("macdSignal"));
        assert!(t.contains("macdHistogram"));
    }
}

//! Overlay widgets: help, error history, indicator search, alert form and list, prompts, toasts.

use chrono::Utc;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use chartdesk_core::alerts::AlertCondition;
use chartdesk_core::indicators::search;

use crate::app::{AlertForm, AppState, PromptKind};
use crate::theme::{self, Theme};
use crate::ui::centered_rect;
use crate::ui::sidebar::status_glyph;

const HELP: &[(&str, &str)] = &[
    ("v t r w f h n", "select, trendline, rectangle, arrow, fib, hline, text"),
    ("E", "erase all drawings (undoable)"),
    ("Ctrl+Z / Ctrl+Y", "undo / redo (Ctrl+Shift+Z also redoes)"),
    ("Del / Backspace", "delete selected drawing"),
    ("Esc", "cancel text, draft, drag, then selection"),
    ("1-5 / i", "toggle SMA EMA RSI MACD BB / indicator search"),
    ("A / L", "new alert / alert list"),
    ("[ ]", "previous / next timeframe"),
    ("/", "change symbol"),
    ("Tab Shift+Tab", "next / previous tab"),
    ("Ctrl+T Ctrl+W R", "new, close, rename tab"),
    ("X / I", "export tab / import tab file"),
    ("g", "refresh data"),
    ("b", "toggle sidebar"),
    ("e", "error history"),
    ("q / Ctrl+C", "quit"),
];

/// Key reference; also shown on first run.
pub fn render_help(f: &mut Frame, area: Rect) {
    let popup = centered_rect(70, 70, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::accent())
        .title(" ChartDesk keys [Esc]close ")
        .title_style(theme::accent_bold());

    let mut lines = vec![
        Line::from(Span::styled(
            "Draw with the mouse: press, drag, release. Click a drawing to select it, drag again to edit.",
            theme::neutral(),
        )),
        Line::from(""),
    ];
    for (keys, what) in HELP {
        lines.push(Line::from(vec![
            Span::styled(format!("  {keys:>16}  "), theme::accent()),
            Span::styled(*what, theme::muted()),
        ]));
    }

    let para = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    f.render_widget(para, popup);
}

/// Error history overlay.
pub fn render_error_history(f: &mut Frame, area: Rect, app: &AppState) {
    let popup = centered_rect(80, 70, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::negative())
        .title(format!(
            " Error History ({}) [Esc]close [j/k]scroll ",
            app.error_history.len()
        ))
        .title_style(theme::negative());

    let inner = block.inner(popup);
    f.render_widget(block, popup);

    if app.error_history.is_empty() {
        let text = Paragraph::new(Span::styled("No errors recorded.", theme::muted()));
        f.render_widget(text, inner);
        return;
    }

    let start = app.error_scroll;
    let end = (start + inner.height as usize).min(app.error_history.len());

    let mut lines: Vec<Line> = Vec::new();
    for (i, err) in app.error_history.iter().enumerate().take(end).skip(start) {
        let style = if i == app.error_scroll {
            theme::negative().add_modifier(Modifier::BOLD)
        } else {
            theme::muted()
        };

        lines.push(Line::from(vec![
            Span::styled(format!("[{}] ", err.timestamp.format("%H:%M:%S")), theme::muted()),
            Span::styled(format!("[{}] ", err.category.label()), theme::warning()),
            Span::styled(err.message.as_str(), style),
        ]));

        if !err.context.is_empty() {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(err.context.as_str(), theme::muted()),
            ]));
        }
    }

    f.render_widget(Paragraph::new(lines), inner);
}

pub fn render_indicator_search(f: &mut Frame, area: Rect, app: &AppState, query: &str, cursor: usize) {
    let popup = centered_rect(50, 40, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::accent())
        .title(" Indicators [Enter]toggle [Esc]close ")
        .title_style(theme::accent_bold());
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let mut lines = vec![
        Line::from(vec![
            Span::styled("> ", theme::accent()),
            Span::styled(query, theme::accent_bold()),
            Span::styled("_", theme::accent()),
        ]),
        Line::from(""),
    ];
    let matches = search(query);
    if matches.is_empty() {
        lines.push(Line::from(Span::styled("No indicator matches.", theme::muted())));
    }
    for (i, key) in matches.iter().enumerate() {
        let on = app
            .session
            .active_indicators()
            .iter()
            .any(|a| a.parsed_key() == Some(*key));
        let marker = if on { "[x]" } else { "[ ]" };
        let style = if i == cursor { theme::accent_bold() } else { theme::muted() };
        lines.push(Line::from(vec![
            Span::styled(if i == cursor { "> " } else { "  " }, theme::accent()),
            Span::styled(format!("{marker} {}", key.label()), style),
        ]));
    }
    f.render_widget(Paragraph::new(lines), inner);
}

fn condition_label(c: &AlertCondition) -> String {
    match c {
        AlertCondition::Price => "Price".into(),
        AlertCondition::Indicator(name) => name.to_uppercase(),
    }
}

pub fn render_alert_form(f: &mut Frame, area: Rect, app: &AppState, form: &AlertForm) {
    let popup = centered_rect(50, 40, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::warning())
        .title(format!(" New alert on {} [Enter]create [Esc]cancel ", app.session.symbol()))
        .title_style(theme::warning());
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Condition  ", theme::muted()),
            Span::styled(format!("< {} >", condition_label(&form.condition())), theme::accent_bold()),
            Span::styled("  (Tab)", theme::muted()),
        ]),
        Line::from(vec![
            Span::styled("  Fires at \u{2265} ", theme::muted()),
            Span::styled(form.threshold.as_str(), theme::accent_bold()),
            Span::styled("_", theme::accent()),
        ]),
        Line::from(vec![
            Span::styled("  Repeat     ", theme::muted()),
            Span::styled(if form.repeat { "[x]" } else { "[ ]" }, theme::accent()),
            Span::styled("  (Ctrl+R)", theme::muted()),
        ]),
        Line::from(""),
    ];
    if let Some(err) = &form.error {
        lines.push(Line::from(Span::styled(format!("  {err}"), theme::negative())));
    }
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

pub fn render_alert_list(f: &mut Frame, area: Rect, app: &AppState, cursor: usize) {
    let popup = centered_rect(70, 60, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::warning())
        .title(" Alerts [Space]pause/resume [r]reset [s]snooze [d]delete [Esc]close ")
        .title_style(theme::warning());
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    if app.alert_rules.is_empty() {
        f.render_widget(Paragraph::new(Span::styled("No alerts yet.", theme::muted())), inner);
        return;
    }

    let now = Utc::now();
    let lines: Vec<Line> = app
        .alert_rules
        .iter()
        .enumerate()
        .map(|(i, rule)| {
            let status = rule.status(now);
            let style = if i == cursor { theme::accent_bold() } else { theme::muted() };
            Line::from(vec![
                Span::styled(if i == cursor { "> " } else { "  " }, theme::accent()),
                Span::styled(format!("{} ", status_glyph(status)), theme::warning()),
                Span::styled(format!("{:<8} {:<10} ", rule.symbol, status.as_str()), style),
                Span::styled(rule.title(), style),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

pub fn render_prompt(f: &mut Frame, area: Rect, kind: PromptKind, input: &str) {
    let popup = centered_rect(50, 20, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::accent())
        .title(kind.title())
        .title_style(theme::accent_bold());
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let text = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("> ", theme::accent()),
            Span::styled(input, theme::accent_bold()),
            Span::styled("_", theme::accent()),
        ]),
        Line::from(""),
        Line::from(Span::styled("[Enter]ok [Esc]cancel", theme::muted())),
    ];
    f.render_widget(Paragraph::new(text), inner);
}

/// Toasts stack in the top-right corner, newest at the bottom.
pub fn render_toasts(f: &mut Frame, area: Rect, app: &AppState) {
    let theme = Theme::default();
    let toasts = app.notifications.toasts();
    if toasts.is_empty() {
        return;
    }
    let width = area.width.min(48);
    let x = area.right().saturating_sub(width + 1);
    let mut y = area.y + 1;
    for toast in toasts {
        if y + 3 > area.bottom() {
            break;
        }
        let rect = Rect::new(x, y, width, 3);
        let color = theme.toast_color(toast.level);
        f.render_widget(Clear, rect);
        let para = Paragraph::new(Span::styled(toast.message.as_str(), Style::default().fg(color)))
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(color)));
        f.render_widget(para, rect);
        y += 3;
    }
}

//! Bottom status bar: active tool, undo depth, key hints, last status message.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{AppState, StatusLevel};
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let store = app.session.store();
    let mut spans: Vec<Span> = vec![
        Span::styled(format!(" [{}]", store.tool().label()), theme::accent_bold()),
        Span::styled(
            format!(" undo {} redo {}", store.undo_depth(), if store.can_redo() { "yes" } else { "-" }),
            theme::muted(),
        ),
        Span::styled(" | ?:Help v/t/r/w/f/h/n:Tools i:Indicators A:Alert q:Quit", theme::muted()),
    ];

    if let Some((msg, level)) = &app.status_message {
        let style = match level {
            StatusLevel::Info => theme::accent(),
            StatusLevel::Warning => theme::warning(),
            StatusLevel::Error => theme::negative(),
        };
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(msg.as_str(), style));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

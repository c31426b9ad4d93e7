//! Tab strip across the top of the screen.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Tabs;
use ratatui::Frame;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let active = app.tabs.active_index();
    let titles: Vec<Line> = app
        .tabs
        .tabs()
        .iter()
        .enumerate()
        .map(|(i, tab)| {
            // The live session is newer than the stored record for the active tab.
            let (label, symbol, timeframe) = if i == active {
                (app.session.label(), app.session.symbol(), app.session.timeframe())
            } else {
                (tab.display_label(), tab.symbol.as_str(), tab.timeframe)
            };
            let label = if label.is_empty() { symbol } else { label };
            Line::from(vec![
                Span::raw(format!("{label} ")),
                Span::styled(timeframe.as_str(), theme::muted()),
            ])
        })
        .collect();

    let tabs = Tabs::new(titles)
        .select(active)
        .style(theme::muted())
        .highlight_style(theme::accent_bold())
        .divider(Span::styled("|", theme::muted()));
    f.render_widget(tabs, area);
}

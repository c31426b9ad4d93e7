//! Top-level UI layout: tab strip, chart with optional oscillator pane, sidebar, status bar.

pub mod chart_panel;
pub mod overlays;
pub mod sidebar;
pub mod status_bar;
pub mod tabs;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::Frame;

use crate::app::{AppState, Overlay};

pub const SIDEBAR_WIDTH: u16 = 32;
pub const OSCILLATOR_HEIGHT: u16 = 9;
/// Left margin of the price chart reserved for y-axis labels.
pub const AXIS_WIDTH: u16 = 8;

/// Screen regions for one frame. `plot` is the drawing surface in cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppLayout {
    pub tabs: Rect,
    pub chart: Rect,
    pub plot: Rect,
    pub oscillator: Option<Rect>,
    pub sidebar: Option<Rect>,
    pub status: Rect,
}

pub fn layout(area: Rect, show_sidebar: bool, oscillator: bool) -> AppLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let (main, sidebar) = if show_sidebar && rows[1].width > SIDEBAR_WIDTH * 2 {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(10), Constraint::Length(SIDEBAR_WIDTH)])
            .split(rows[1]);
        (cols[0], Some(cols[1]))
    } else {
        (rows[1], None)
    };

    let (chart, oscillator) = if oscillator && main.height > OSCILLATOR_HEIGHT * 2 {
        let split = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(OSCILLATOR_HEIGHT)])
            .split(main);
        (split[0], Some(split[1]))
    } else {
        (main, None)
    };

    AppLayout {
        tabs: rows[0],
        chart,
        plot: plot_area(chart),
        oscillator,
        sidebar,
        status: rows[2],
    }
}

/// The chart block's inner area minus the price axis and the bottom info row.
pub fn plot_area(chart: Rect) -> Rect {
    let inner = Rect {
        x: chart.x.saturating_add(1),
        y: chart.y.saturating_add(1),
        width: chart.width.saturating_sub(2),
        height: chart.height.saturating_sub(2),
    };
    Rect {
        x: inner.x + AXIS_WIDTH.min(inner.width),
        y: inner.y,
        width: inner.width.saturating_sub(AXIS_WIDTH),
        height: inner.height.saturating_sub(1),
    }
}

/// Draw the entire UI.
pub fn draw(f: &mut Frame, app: &AppState) {
    let l = &app.layout;
    tabs::render(f, l.tabs, app);
    chart_panel::render(f, l.chart, app);
    if let Some(area) = l.oscillator {
        chart_panel::render_oscillator(f, area, app);
    }
    if let Some(area) = l.sidebar {
        sidebar::render(f, area, app);
    }
    status_bar::render(f, l.status, app);

    let body = Rect {
        height: f.area().height.saturating_sub(1),
        ..f.area()
    };
    match &app.overlay {
        Overlay::Help => overlays::render_help(f, body),
        Overlay::ErrorHistory => overlays::render_error_history(f, body, app),
        Overlay::IndicatorSearch { query, cursor } => overlays::render_indicator_search(f, body, app, query, *cursor),
        Overlay::AlertForm(form) => overlays::render_alert_form(f, body, app, form),
        Overlay::AlertList { cursor } => overlays::render_alert_list(f, body, app, *cursor),
        Overlay::Prompt { kind, input } => overlays::render_prompt(f, body, *kind, input),
        Overlay::None => {}
    }
    overlays::render_toasts(f, body, app);
}

/// Compute a centered rect for overlays.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

//! ChartDesk TUI: candlestick chart with indicators, drawing tools, tabs and alerts.
//!
//! Layout:
//! - Tab strip (one chart per tab)
//! - Price chart with drawings and indicator overlays, oscillator pane below
//! - Sidebar with indicator readings, alerts and feed info
//! - Status bar

use std::fs::OpenOptions;
use std::io::{self, stdout};
use std::sync::{mpsc, Mutex};
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chartdesk_core::alerts::{AlertStore, JsonFileAlertStore};
use chartdesk_core::config::AppConfig;
use chartdesk_core::data::{provider_for, FeedHandle, SyntheticProvider};
use chartdesk_core::workspace;
use chartdesk_tui::app::{AppState, ErrorCategory};
use chartdesk_tui::persistence::{self, Paths};
use chartdesk_tui::worker::{self, WorkerCommand, WorkerResponse};
use chartdesk_tui::{input, ui};

fn main() -> Result<()> {
    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen, DisableMouseCapture);
        default_hook(info);
    }));

    let paths = Paths::discover();
    init_logging(&paths);

    let (config, config_error) = match AppConfig::load(&paths.config) {
        Ok(c) => (c, None),
        Err(e) => (AppConfig::default(), Some(e.to_string())),
    };

    // Persisted state
    let tabs = workspace::load(&paths.workspace);
    let alert_file = JsonFileAlertStore::new(&paths.alerts);
    let (rules, alerts_error) = match alert_file.list() {
        Ok(r) => (r, None),
        Err(e) => (Vec::new(), Some(e.to_string())),
    };
    let loaded_rules = rules.clone();
    let prefs = persistence::load(&paths.ui);

    // Worker channels
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let worker_handle = worker::spawn_worker(cmd_rx, resp_tx)?;

    let mut app = AppState::new(config, paths.clone(), tabs, rules, cmd_tx.clone(), resp_rx);
    persistence::apply(&mut app, prefs);
    if let Some(e) = config_error {
        app.push_error(ErrorCategory::Storage, format!("Config ignored: {e}"), paths.config.display().to_string());
    }
    if let Some(e) = alerts_error {
        app.push_error(ErrorCategory::Alert, format!("Alerts not loaded: {e}"), paths.alerts.display().to_string());
    }

    // Feed
    let feed_cfg = app.config.feed.clone();
    let fallback = Box::new(SyntheticProvider::new(feed_cfg.seed));
    match provider_for(feed_cfg.source, feed_cfg.seed, &feed_cfg.csv_dir()) {
        Ok(primary) => match FeedHandle::spawn(primary, fallback, feed_cfg.options()) {
            Ok(feed) => app.attach_feed(feed),
            Err(e) => app.push_error(ErrorCategory::Other, format!("Feed thread failed: {e}"), String::new()),
        },
        Err(e) => app.push_error(ErrorCategory::Network, e.to_string(), feed_cfg.source.to_string()),
    }
    info!(source = %feed_cfg.source, tabs = app.tabs.len(), "chartdesk started");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app);

    // Final synchronous saves; the worker may not get to its queue.
    let tabs = persistence::snapshot(&app);
    if let Err(e) = workspace::save(&app.paths.workspace, &tabs) {
        warn!(error = %e, "workspace not saved on exit");
    }
    if app.alert_rules != loaded_rules {
        if let Err(e) = alert_file.save_all(&app.alert_rules) {
            warn!(error = %e, "alerts not saved on exit");
        }
    }
    let _ = persistence::save(&app.paths.ui, &persistence::extract(&app));

    let _ = cmd_tx.send(WorkerCommand::Shutdown);
    let _ = worker_handle.join();
    if let Some(feed) = app.feed.take() {
        feed.shutdown();
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

/// Log to a file; the terminal belongs to the UI.
fn init_logging(paths: &Paths) {
    if let Some(dir) = paths.log.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&paths.log) else {
        return;
    };
    let filter = EnvFilter::try_from_env("CHARTDESK_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut AppState) -> Result<()> {
    loop {
        // 1. Render
        terminal.draw(|f| {
            app.on_resize(f.area());
            ui::draw(f, app);
        })?;

        // 2. Drain worker and feed (non-blocking)
        while let Ok(resp) = app.worker_rx.try_recv() {
            handle_worker_response(app, resp);
        }
        let updates = app.feed.as_ref().map(FeedHandle::drain).unwrap_or_default();
        for update in updates {
            app.apply_feed_update(update, Utc::now());
        }

        // 3. Poll for input events (50ms timeout for ~20 FPS tick)
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) => input::handle_key(app, key),
                Event::Mouse(mouse) => input::handle_mouse(app, mouse),
                _ => {}
            }
        }

        app.tick(Utc::now());

        // 4. Check quit
        if !app.running {
            break;
        }
    }
    Ok(())
}

fn handle_worker_response(app: &mut AppState, resp: WorkerResponse) {
    match resp {
        WorkerResponse::WorkspaceSaved { fingerprint } => app.mark_saved(fingerprint),
        WorkerResponse::AlertsSaved { count } => tracing::debug!(count, "alerts saved"),
        WorkerResponse::Exported { path } => app.set_status(format!("Exported to {}", path.display())),
        WorkerResponse::Imported { record } => app.import_record(*record),
        WorkerResponse::Error {
            category,
            message,
            context,
        } => app.push_error(ErrorCategory::from_worker(&category), message, context),
    }
}

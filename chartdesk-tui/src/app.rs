//! Application state: single-owner, main-thread only.
//!
//! All TUI state lives here. The feed and persistence threads communicate
//! with it via channels; everything else is synchronous.

use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, Sender};
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDateTime, Utc};
use ratatui::layout::Rect;
use tracing::{debug, info};

use chartdesk_core::alerts::{
    self, dispatch, AlertCondition, AlertError, AlertEvaluator, AlertRule, AlertStore, Delivery, MemoryAlertStore,
    NotificationCenter, Notifier, ToastLevel,
};
use chartdesk_core::config::AppConfig;
use chartdesk_core::data::{FeedHandle, FeedUpdate};
use chartdesk_core::drawing::{Tool, Viewport};
use chartdesk_core::indicators::IndicatorKey;
use chartdesk_core::interaction::{InteractionConfig, PointerEvent, RouterOutcome, Shortcut};
use chartdesk_core::overlay::{render_series, ChartScale, Primitive};
use chartdesk_core::session::ChartSession;
use chartdesk_core::workspace::{WorkspaceRecord, WorkspaceTabs};

use crate::notifier::BellNotifier;
use crate::persistence::{self, Paths};
use crate::ui::{self, AppLayout};
use crate::worker::{WorkerCommand, WorkerResponse};

pub const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(2);
const ERROR_HISTORY_CAP: usize = 50;
/// Terminal cells are coarse; pointer tolerances beyond this many cells feel sticky.
const MAX_CELL_TOLERANCE: f64 = 2.0;

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// An error record for the error history overlay.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub category: ErrorCategory,
    pub message: String,
    pub context: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Storage,
    Import,
    Alert,
    Other,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Network => "NET",
            ErrorCategory::Storage => "DISK",
            ErrorCategory::Import => "IMP",
            ErrorCategory::Alert => "ALRT",
            ErrorCategory::Other => "ERR",
        }
    }

    /// Map a worker response category.
    pub fn from_worker(category: &str) -> Self {
        match category {
            "network" => ErrorCategory::Network,
            "storage" | "export" => ErrorCategory::Storage,
            "import" => ErrorCategory::Import,
            "alert" => ErrorCategory::Alert,
            _ => ErrorCategory::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Symbol,
    RenameTab,
    ImportPath,
}

impl PromptKind {
    pub fn title(self) -> &'static str {
        match self {
            PromptKind::Symbol => " Symbol ",
            PromptKind::RenameTab => " Rename tab ",
            PromptKind::ImportPath => " Import workspace file ",
        }
    }
}

/// The "new alert" modal.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertForm {
    /// Index into `AlertCondition::options()`.
    pub condition: usize,
    pub threshold: String,
    pub repeat: bool,
    pub error: Option<String>,
}

impl AlertForm {
    /// Prefilled with the last close, if known.
    pub fn new(last_close: Option<f64>) -> Self {
        Self {
            condition: 0,
            threshold: last_close.map(|c| format!("{c:.2}")).unwrap_or_default(),
            repeat: false,
            error: None,
        }
    }

    pub fn condition(&self) -> AlertCondition {
        let options = AlertCondition::options();
        options[self.condition % options.len()].clone()
    }

    pub fn cycle_condition(&mut self, forward: bool) {
        let n = AlertCondition::options().len();
        self.condition = if forward {
            (self.condition + 1) % n
        } else {
            (self.condition + n - 1) % n
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertAction {
    ToggleActive,
    Reset,
    Snooze,
    Delete,
}

/// Which overlay (if any) is shown on top.
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    None,
    Help,
    ErrorHistory,
    IndicatorSearch { query: String, cursor: usize },
    AlertForm(AlertForm),
    AlertList { cursor: usize },
    Prompt { kind: PromptKind, input: String },
}

/// Top-level application state.
pub struct AppState {
    pub running: bool,
    pub config: AppConfig,
    pub paths: Paths,

    // Workspace
    pub tabs: WorkspaceTabs,
    pub session: ChartSession,

    // Alerts
    pub alerts: MemoryAlertStore,
    pub alert_rules: Vec<AlertRule>,
    pub evaluator: AlertEvaluator,
    pub notifications: NotificationCenter,
    pub notifier: BellNotifier,

    // Background threads
    pub feed: Option<FeedHandle>,
    pub feed_status: Option<String>,
    pub worker_tx: Sender<WorkerCommand>,
    pub worker_rx: Receiver<WorkerResponse>,

    // Cross-cutting
    pub status_message: Option<(String, StatusLevel)>,
    pub error_history: VecDeque<ErrorRecord>,
    pub error_scroll: usize,
    pub overlay: Overlay,
    pub show_sidebar: bool,
    pub welcome_dismissed: bool,
    pub layout: AppLayout,

    // Autosave bookkeeping
    pub saved_fingerprint: String,
    pending_fingerprint: Option<String>,
    last_autosave: Instant,
}

/// Interaction settings for a cell grid: one character is one unit wide and tall.
pub fn terminal_interaction(cfg: &InteractionConfig) -> InteractionConfig {
    InteractionConfig {
        hit_tolerance: cfg.hit_tolerance.min(MAX_CELL_TOLERANCE),
        label_offset: cfg.label_offset.min(MAX_CELL_TOLERANCE),
        text_char_width: 1.0,
        text_height: 1.0,
        ..cfg.clone()
    }
}

impl AppState {
    pub fn new(
        config: AppConfig,
        paths: Paths,
        tabs: WorkspaceTabs,
        rules: Vec<AlertRule>,
        worker_tx: Sender<WorkerCommand>,
        worker_rx: Receiver<WorkerResponse>,
    ) -> Self {
        let session = ChartSession::from_record(
            tabs.active().clone(),
            terminal_interaction(&config.interaction),
            config.indicators.clone(),
        );
        let saved_fingerprint = tabs.fingerprint();
        Self {
            running: true,
            evaluator: config.alerts.evaluator(),
            notifications: NotificationCenter::new(config.alerts.toast_timeout()),
            notifier: BellNotifier::stdout(config.alerts.native_notifications),
            alerts: MemoryAlertStore::with_rules(rules.clone()),
            alert_rules: rules,
            config,
            paths,
            tabs,
            session,
            feed: None,
            feed_status: None,
            worker_tx,
            worker_rx,
            status_message: None,
            error_history: VecDeque::with_capacity(ERROR_HISTORY_CAP),
            error_scroll: 0,
            overlay: Overlay::None,
            show_sidebar: true,
            welcome_dismissed: false,
            layout: AppLayout::default(),
            saved_fingerprint,
            pending_fingerprint: None,
            last_autosave: Instant::now(),
        }
    }

    // ── Status ───────────────────────────────────────────────────────────

    /// Push an error to the history, capping at 50.
    pub fn push_error(&mut self, category: ErrorCategory, message: String, context: String) {
        let record = ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            category,
            message: message.clone(),
            context,
        };
        self.error_history.push_front(record);
        if self.error_history.len() > ERROR_HISTORY_CAP {
            self.error_history.pop_back();
        }
        self.status_message = Some((message, StatusLevel::Error));
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }

    pub fn toast(&mut self, msg: impl Into<String>, level: ToastLevel) {
        self.notifications.push(msg, level, Utc::now());
    }

    // ── Layout ───────────────────────────────────────────────────────────

    /// Recompute panel geometry for the frame and resize the chart viewport.
    pub fn on_resize(&mut self, area: Rect) {
        self.layout = ui::layout(area, self.show_sidebar, self.has_oscillator());
        let plot = self.layout.plot;
        let viewport = Viewport::new(plot.width as f64, plot.height as f64);
        self.session.interact(|router, _| router.set_viewport(viewport));
    }

    pub fn has_oscillator(&self) -> bool {
        self.session
            .active_indicators()
            .iter()
            .any(|a| a.parsed_key().is_some_and(IndicatorKey::is_oscillator))
    }

    /// One bar per column over the plot area.
    pub fn chart_scale(&self) -> ChartScale {
        let plot = self.layout.plot;
        ChartScale::fit(
            self.session.bars(),
            Viewport::new(plot.width as f64, plot.height as f64),
            1.0,
        )
    }

    /// Indicator lines, then drawings, draft, handles and alert markers.
    pub fn chart_primitives(&self) -> Vec<Primitive> {
        let scale = self.chart_scale();
        let mut prims = render_series(self.session.indicators(), self.session.bars(), &scale);
        prims.extend(self.session.overlay(&self.alert_rules, &scale));
        prims
    }

    // ── Feed ─────────────────────────────────────────────────────────────

    pub fn attach_feed(&mut self, feed: FeedHandle) {
        self.feed = Some(feed);
        self.watch_active();
    }

    fn watch_active(&mut self) {
        if let Some(feed) = &self.feed {
            feed.watch(self.session.symbol(), self.session.timeframe());
        }
        self.feed_status = None;
    }

    pub fn refresh_feed(&mut self) {
        if let Some(feed) = &self.feed {
            feed.refresh();
            self.set_status(format!("Refreshing {}", self.session.symbol()));
        }
    }

    /// Apply bars pushed by the feed, then evaluate alerts against them.
    pub fn apply_feed_update(&mut self, update: FeedUpdate, now: DateTime<Utc>) {
        if update.symbol() != self.session.symbol() || update.timeframe() != self.session.timeframe() {
            debug!(symbol = update.symbol(), "stale feed update ignored");
            return;
        }
        match update {
            FeedUpdate::Bars { bars, source, .. } => {
                self.session.apply_bars(bars);
                self.feed_status = Some(source.to_string());
            }
            FeedUpdate::Fallback { bars, reason, .. } => {
                self.session.apply_bars(bars);
                self.feed_status = Some("fallback".into());
                self.set_warning(format!("Live data unavailable, showing fallback: {reason}"));
            }
        }
        self.check_alerts(now);
    }

    // ── Alerts ───────────────────────────────────────────────────────────

    pub fn check_alerts(&mut self, now: DateTime<Utc>) {
        let ctx = self.session.evaluation_context(now);
        let fired = match alerts::evaluate_store(&mut self.alerts, &self.evaluator, &ctx) {
            Ok(fired) => fired,
            Err(e) => {
                self.push_error(ErrorCategory::Alert, e.to_string(), self.session.symbol().to_string());
                return;
            }
        };
        if fired.is_empty() {
            return;
        }
        for n in &fired {
            let bell: &mut dyn Notifier = &mut self.notifier;
            if dispatch(n, Some(bell), &mut self.notifications, now) == Delivery::Primary {
                self.set_warning(format!("{} ({})", n.title, n.body));
            }
        }
        info!(count = fired.len(), symbol = self.session.symbol(), "alerts fired");
        self.refresh_alerts(true);
    }

    /// Re-read the rule list; optionally queue a write to disk.
    pub fn refresh_alerts(&mut self, persist: bool) {
        self.alert_rules = self.alerts.list().unwrap_or_default();
        if persist {
            let _ = self.worker_tx.send(WorkerCommand::SaveAlerts {
                path: self.paths.alerts.clone(),
                rules: self.alert_rules.clone(),
            });
        }
    }

    pub fn create_alert(&mut self, form: &AlertForm) -> Result<AlertRule, AlertError> {
        let threshold = alerts::parse_threshold(&form.threshold)?;
        let now = Utc::now();
        let rule = AlertRule::new(self.session.symbol(), form.condition(), threshold, form.repeat, now);
        let rule = alerts::create_rule(&mut self.alerts, rule)?;
        self.refresh_alerts(true);
        self.toast(format!("Alert created: {}", rule.title()), ToastLevel::Success);
        self.check_alerts(now);
        Ok(rule)
    }

    pub fn alert_action(&mut self, index: usize, action: AlertAction) {
        let Some(mut rule) = self.alert_rules.get(index).cloned() else {
            return;
        };
        let now = Utc::now();
        let result = match action {
            AlertAction::Delete => self.alerts.delete(&rule.id).map(|_| ()),
            AlertAction::ToggleActive => {
                rule.toggle_active();
                self.alerts.update(&rule)
            }
            AlertAction::Reset => {
                rule.reset();
                self.alerts.update(&rule)
            }
            AlertAction::Snooze => {
                rule.snooze(self.evaluator.snooze(), now);
                self.alerts.update(&rule)
            }
        };
        match result {
            Ok(()) => {
                self.refresh_alerts(true);
                self.set_status(format!("{} {}", rule.title(), rule.status(now)));
                if matches!(action, AlertAction::ToggleActive | AlertAction::Reset) {
                    self.check_alerts(now);
                }
            }
            Err(e) => self.push_error(ErrorCategory::Alert, e.to_string(), rule.id),
        }
    }

    // ── Tabs ─────────────────────────────────────────────────────────────

    fn stash_session(&mut self) {
        self.tabs.store_active(self.session.to_record());
    }

    fn load_active(&mut self) {
        self.session.load_record(self.tabs.active().clone());
        self.watch_active();
    }

    pub fn switch_tab(&mut self, index: usize) {
        self.stash_session();
        if self.tabs.switch(index) {
            self.load_active();
        }
    }

    pub fn next_tab(&mut self) {
        let n = self.tabs.len();
        self.switch_tab((self.tabs.active_index() + 1) % n);
    }

    pub fn prev_tab(&mut self) {
        let n = self.tabs.len();
        self.switch_tab((self.tabs.active_index() + n - 1) % n);
    }

    pub fn new_tab(&mut self) {
        self.stash_session();
        self.tabs.add_blank();
        self.load_active();
        self.set_status(format!("Opened {}", self.session.label()));
    }

    pub fn close_active_tab(&mut self) {
        self.stash_session();
        if self.tabs.close(self.tabs.active_index()) {
            self.load_active();
        } else {
            self.set_warning("The last tab cannot be closed");
        }
    }

    pub fn rename_active_tab(&mut self, label: &str) {
        let label = label.trim();
        if label.is_empty() {
            return;
        }
        self.tabs.rename(self.tabs.active_index(), label);
        self.session.set_label(self.tabs.active().label.clone());
    }

    /// Open an imported record as a new tab.
    pub fn import_record(&mut self, record: WorkspaceRecord) {
        self.stash_session();
        let label = record.display_label().to_string();
        self.tabs.add(record);
        self.load_active();
        self.toast(format!("Imported {label}"), ToastLevel::Success);
    }

    pub fn export_active(&mut self) {
        let record = self.session.to_record();
        let path = self.paths.export_file(&record.symbol, &record.id);
        let _ = self.worker_tx.send(WorkerCommand::ExportTab {
            path,
            record: Box::new(record),
        });
    }

    pub fn request_import(&mut self, path: &str) {
        let path = path.trim();
        if path.is_empty() {
            return;
        }
        let _ = self.worker_tx.send(WorkerCommand::ImportTab { path: path.into() });
    }

    // ── Symbol / timeframe / indicators ─────────────────────────────────

    pub fn set_symbol(&mut self, symbol: &str) {
        let old = self.session.symbol().to_string();
        if !self.session.set_symbol(symbol) {
            return;
        }
        if self.session.label() == old {
            let label = self.session.symbol().to_string();
            self.session.set_label(label);
        }
        self.watch_active();
        self.set_status(format!("Loading {}", self.session.symbol()));
    }

    pub fn cycle_timeframe(&mut self, forward: bool) {
        let tf = self.session.timeframe();
        let next = if forward { tf.next() } else { tf.prev() };
        if self.session.set_timeframe(next) {
            self.watch_active();
            self.set_status(format!("Timeframe {next}"));
        }
    }

    pub fn toggle_indicator(&mut self, key: IndicatorKey) {
        let on = self.session.toggle_indicator(key);
        self.set_status(format!("{} {}", key.label(), if on { "on" } else { "off" }));
        self.check_alerts(Utc::now());
    }

    // ── Drawing ─────────────────────────────────────────────────────────

    pub fn select_tool(&mut self, tool: Tool) {
        let outcome = self.session.activate_tool(tool);
        self.describe(outcome);
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        let outcome = self.session.handle_pointer(event);
        self.describe(outcome);
    }

    pub fn apply_shortcut(&mut self, shortcut: Shortcut) {
        let outcome = self.session.apply_shortcut(shortcut);
        self.describe(outcome);
    }

    pub fn describe(&mut self, outcome: RouterOutcome) {
        let msg = match outcome {
            RouterOutcome::Committed(kind) => format!("Added {kind}"),
            RouterOutcome::Removed(_) => "Drawing deleted".into(),
            RouterOutcome::Cleared => "All drawings cleared".into(),
            RouterOutcome::Undone => "Undo".into(),
            RouterOutcome::Redone => "Redo".into(),
            RouterOutcome::ToolChanged(tool) => format!("Tool: {}", tool.label()),
            RouterOutcome::TextEntryOpened => "Type the label; Enter places it, Esc cancels".into(),
            RouterOutcome::DraftDiscarded => "Too short, drawing discarded".into(),
            RouterOutcome::EditCancelled => "Edit cancelled".into(),
            _ => return,
        };
        self.set_status(msg);
    }

    // ── Periodic work ────────────────────────────────────────────────────

    pub fn tick(&mut self, now: DateTime<Utc>) {
        self.notifications.expire(now);
        self.autosave(false);
    }

    /// Queue a workspace write when the tab set changed since the last save.
    pub fn autosave(&mut self, force: bool) {
        if !force && self.last_autosave.elapsed() < AUTOSAVE_INTERVAL {
            return;
        }
        self.last_autosave = Instant::now();
        let tabs = persistence::snapshot(self);
        let fingerprint = tabs.fingerprint();
        if fingerprint == self.saved_fingerprint || self.pending_fingerprint.as_ref() == Some(&fingerprint) {
            return;
        }
        self.pending_fingerprint = Some(fingerprint.clone());
        let _ = self.worker_tx.send(WorkerCommand::SaveWorkspace {
            path: self.paths.workspace.clone(),
            tabs: Box::new(tabs),
            fingerprint,
        });
    }

    pub fn mark_saved(&mut self, fingerprint: String) {
        if self.pending_fingerprint.as_ref() == Some(&fingerprint) {
            self.pending_fingerprint = None;
        }
        self.saved_fingerprint = fingerprint;
    }
}

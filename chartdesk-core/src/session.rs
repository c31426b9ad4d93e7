//! One chart tab's live state: bars, indicators, drawings and the router.
//!
//! `ChartSession` is the value the UI loop owns for the active tab. It is
//! built from a `WorkspaceRecord`, fed bars by the data feed, and turned back
//! into a record when the tab is saved or switched away from.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::alerts::{AlertEvaluator, AlertNotification, AlertRule, EvaluationContext};
use crate::domain::{is_monotonic, Bar, Symbol, Timeframe};
use crate::drawing::{DrawingStore, Tool};
use crate::indicators::{compute_active, toggle, ActiveIndicator, IndicatorKey, IndicatorParams, IndicatorSet};
use crate::interaction::{InteractionConfig, InteractionRouter, PointerEvent, RouterOutcome, Shortcut};
use crate::overlay::{render, AlertMarker, ChartScale, OverlayOptions, Primitive};
use crate::workspace::WorkspaceRecord;

/// What `apply_bar` did with a streamed bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarUpdate {
    /// Same timestamp as the last bar: the last bar was overwritten.
    Replaced,
    Appended,
    /// Older than the last bar, or not a sane OHLC bar.
    Rejected,
}

#[derive(Debug)]
pub struct ChartSession {
    id: String,
    label: String,
    symbol: Symbol,
    timeframe: Timeframe,
    store: DrawingStore,
    router: InteractionRouter,
    bars: Vec<Bar>,
    params: IndicatorParams,
    active_indicators: Vec<ActiveIndicator>,
    indicators: IndicatorSet,
}

impl ChartSession {
    pub fn from_record(record: WorkspaceRecord, config: InteractionConfig, params: IndicatorParams) -> Self {
        let mut store = DrawingStore::with_drawings(record.drawings);
        store.configure(config.drag_history, config.history_limit);
        Self {
            id: record.id,
            label: record.label,
            symbol: record.symbol,
            timeframe: record.timeframe,
            store,
            router: InteractionRouter::new(config),
            bars: Vec::new(),
            params,
            active_indicators: record.active_indicators,
            indicators: IndicatorSet::new(),
        }
    }

    pub fn to_record(&self) -> WorkspaceRecord {
        WorkspaceRecord {
            id: self.id.clone(),
            label: self.label.clone(),
            symbol: self.symbol.clone(),
            timeframe: self.timeframe,
            drawings: self.store.drawings().to_vec(),
            active_indicators: self.active_indicators.clone(),
        }
    }

    /// Switch this session to another tab's record.
    ///
    /// Drawings are replaced, undo history is emptied and transient gesture
    /// state is dropped. Bars are kept only if symbol and timeframe match.
    pub fn load_record(&mut self, record: WorkspaceRecord) {
        let same_series = record.symbol == self.symbol && record.timeframe == self.timeframe;
        self.router.reset();
        self.store.reset(record.drawings);
        self.id = record.id;
        self.label = record.label;
        self.symbol = record.symbol;
        self.timeframe = record.timeframe;
        self.active_indicators = record.active_indicators;
        if !same_series {
            self.bars.clear();
        }
        self.recompute();
        debug!(tab = %self.id, symbol = %self.symbol, "tab loaded, history reset");
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn store(&self) -> &DrawingStore {
        &self.store
    }

    pub fn router(&self) -> &InteractionRouter {
        &self.router
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    pub fn indicators(&self) -> &IndicatorSet {
        &self.indicators
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    pub fn active_indicators(&self) -> &[ActiveIndicator] {
        &self.active_indicators
    }

    // ── Bars ─────────────────────────────────────────────────────────────

    /// Replace the whole bar history. Non-ascending input is sorted and
    /// deduplicated by time (last wins); insane bars are dropped.
    pub fn apply_bars(&mut self, mut bars: Vec<Bar>) {
        let before = bars.len();
        bars.retain(Bar::is_sane);
        if !is_monotonic(&bars) {
            bars.sort_by_key(|b| b.time);
            bars.reverse();
            bars.dedup_by_key(|b| b.time);
            bars.reverse();
        }
        if bars.len() != before {
            warn!(dropped = before - bars.len(), "dropped unusable bars");
        }
        self.bars = bars;
        self.recompute();
    }

    /// Streaming entry point for a single bar.
    pub fn apply_bar(&mut self, bar: Bar) -> BarUpdate {
        if !bar.is_sane() {
            return BarUpdate::Rejected;
        }
        let outcome = match self.bars.last_mut() {
            Some(last) if last.time == bar.time => {
                *last = bar;
                BarUpdate::Replaced
            }
            Some(last) if last.time > bar.time => return BarUpdate::Rejected,
            _ => {
                self.bars.push(bar);
                BarUpdate::Appended
            }
        };
        self.recompute();
        outcome
    }

    // ── Indicators ───────────────────────────────────────────────────────

    /// Add the indicator if absent, remove it if present. Returns whether it is now active.
    pub fn toggle_indicator(&mut self, key: IndicatorKey) -> bool {
        let now_active = toggle(&mut self.active_indicators, key);
        self.recompute();
        now_active
    }

    pub fn set_params(&mut self, params: IndicatorParams) {
        self.params = params;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.indicators = compute_active(&self.bars, &self.active_indicators, &self.params);
    }

    // ── Symbol / timeframe ───────────────────────────────────────────────

    /// Change symbol. Discards any draft or open text entry and the old bars.
    pub fn set_symbol(&mut self, symbol: &str) -> bool {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() || symbol == self.symbol {
            return false;
        }
        self.discard_transient();
        self.symbol = symbol;
        self.bars.clear();
        self.recompute();
        true
    }

    pub fn set_timeframe(&mut self, timeframe: Timeframe) -> bool {
        if timeframe == self.timeframe {
            return false;
        }
        self.discard_transient();
        self.timeframe = timeframe;
        self.bars.clear();
        self.recompute();
        true
    }

    fn discard_transient(&mut self) {
        self.router.reset();
        self.store.end_gesture();
        self.store.clear_draft();
        self.store.clear_edit_anchor();
    }

    // ── Interaction ──────────────────────────────────────────────────────

    pub fn handle_pointer(&mut self, event: PointerEvent) -> RouterOutcome {
        self.router.handle(&mut self.store, event)
    }

    pub fn activate_tool(&mut self, tool: Tool) -> RouterOutcome {
        self.router.activate_tool(&mut self.store, tool)
    }

    pub fn apply_shortcut(&mut self, shortcut: Shortcut) -> RouterOutcome {
        self.router.apply_shortcut(&mut self.store, shortcut)
    }

    pub fn cancel(&mut self) -> RouterOutcome {
        self.router.cancel(&mut self.store)
    }

    /// Run `f` with the router and the store it drives.
    pub fn interact<R>(&mut self, f: impl FnOnce(&mut InteractionRouter, &mut DrawingStore) -> R) -> R {
        f(&mut self.router, &mut self.store)
    }

    // ── Alerts & overlay ─────────────────────────────────────────────────

    pub fn evaluation_context(&self, now: DateTime<Utc>) -> EvaluationContext<'_> {
        EvaluationContext {
            symbol: &self.symbol,
            last_close: self.last_close(),
            indicators: &self.indicators,
            now,
        }
    }

    pub fn evaluate_alerts(
        &self,
        rules: &mut [AlertRule],
        evaluator: &AlertEvaluator,
        now: DateTime<Utc>,
    ) -> Vec<AlertNotification> {
        evaluator.evaluate(rules, &self.evaluation_context(now))
    }

    pub fn overlay(&self, rules: &[AlertRule], scale: &ChartScale) -> Vec<Primitive> {
        let markers = AlertMarker::for_rules(rules, &self.symbol, scale);
        let opts = OverlayOptions {
            viewport: self.router.viewport(),
            label_offset: self.router.config().label_offset,
        };
        render(&self.store, &markers, &opts)
    }
}

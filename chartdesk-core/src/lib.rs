//! ChartDesk Core: indicators, drawings with undo/redo, pointer routing, overlays, alerts.
//!
//! This crate contains everything the chart front ends share:
//! - Domain types (bars, series, shapes, timeframes)
//! - Indicator engine (SMA, EMA, RSI, MACD, Bollinger) and the indicator catalog
//! - Drawing store with snapshot undo/redo and gesture coalescing
//! - Interaction router mapping pointer gestures and shortcuts to store calls
//! - Overlay renderer producing declarative primitives
//! - Alert rules, evaluator, stores and notification fallback
//! - Workspace tabs, the per-tab chart session, bar providers and the feed

pub mod alerts;
pub mod config;
pub mod data;
pub mod domain;
pub mod drawing;
pub mod indicators;
pub mod interaction;
pub mod overlay;
pub mod session;
pub mod workspace;

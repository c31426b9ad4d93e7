//! Scheduled bar feed on its own thread.
//!
//! The UI sends `FeedCommand`s and drains `FeedUpdate`s without blocking.
//! A failed fetch never leaves the chart empty: the feed re-serves the last
//! bars it delivered for the same series, else the fallback provider's bars.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::provider::{BarProvider, DataSource};
use crate::domain::{Bar, Timeframe};

#[derive(Debug, Clone, PartialEq)]
pub enum FeedCommand {
    Watch { symbol: String, timeframe: Timeframe },
    Refresh,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedUpdate {
    Bars {
        symbol: String,
        timeframe: Timeframe,
        bars: Vec<Bar>,
        source: DataSource,
    },
    /// The primary provider failed; `bars` are last-known or placeholder data.
    Fallback {
        symbol: String,
        timeframe: Timeframe,
        bars: Vec<Bar>,
        reason: String,
    },
}

impl FeedUpdate {
    pub fn symbol(&self) -> &str {
        match self {
            FeedUpdate::Bars { symbol, .. } | FeedUpdate::Fallback { symbol, .. } => symbol,
        }
    }

    pub fn timeframe(&self) -> Timeframe {
        match self {
            FeedUpdate::Bars { timeframe, .. } | FeedUpdate::Fallback { timeframe, .. } => *timeframe,
        }
    }

    pub fn bars(&self) -> &[Bar] {
        match self {
            FeedUpdate::Bars { bars, .. } | FeedUpdate::Fallback { bars, .. } => bars,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedOptions {
    pub poll_interval: Duration,
    pub history_bars: usize,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            history_bars: 300,
        }
    }
}

/// Last bars delivered, keyed by series.
#[derive(Debug, Default)]
struct LastKnown {
    symbol: String,
    timeframe: Option<Timeframe>,
    bars: Vec<Bar>,
}

impl LastKnown {
    fn for_series(&self, symbol: &str, timeframe: Timeframe) -> Option<&[Bar]> {
        (self.symbol == symbol && self.timeframe == Some(timeframe) && !self.bars.is_empty())
            .then_some(self.bars.as_slice())
    }
}

/// One fetch with fallback. Never fails.
fn fetch_once(
    primary: &dyn BarProvider,
    fallback: &dyn BarProvider,
    last: &mut LastKnown,
    symbol: &str,
    timeframe: Timeframe,
    count: usize,
) -> FeedUpdate {
    let reason = match primary.fetch(symbol, timeframe, count) {
        Ok(result) if !result.bars.is_empty() => {
            *last = LastKnown {
                symbol: symbol.to_string(),
                timeframe: Some(timeframe),
                bars: result.bars.clone(),
            };
            return FeedUpdate::Bars {
                symbol: symbol.to_string(),
                timeframe,
                bars: result.bars,
                source: result.source,
            };
        }
        Ok(_) => format!("{} returned no bars", primary.name()),
        Err(e) => e.to_string(),
    };

    warn!(symbol, provider = primary.name(), %reason, "fetch failed, falling back");
    let bars = match last.for_series(symbol, timeframe) {
        Some(bars) => bars.to_vec(),
        None => fallback
            .fetch(symbol, timeframe, count)
            .map(|r| r.bars)
            .unwrap_or_default(),
    };
    FeedUpdate::Fallback {
        symbol: symbol.to_string(),
        timeframe,
        bars,
        reason,
    }
}

pub struct FeedHandle {
    tx: Sender<FeedCommand>,
    rx: Receiver<FeedUpdate>,
    cancel: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl FeedHandle {
    pub fn spawn(
        primary: Box<dyn BarProvider>,
        fallback: Box<dyn BarProvider>,
        options: FeedOptions,
    ) -> std::io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (update_tx, update_rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let join = thread::Builder::new()
            .name("chartdesk-feed".into())
            .spawn(move || feed_loop(primary.as_ref(), fallback.as_ref(), options, cmd_rx, update_tx, flag))?;
        Ok(Self {
            tx: cmd_tx,
            rx: update_rx,
            cancel,
            join: Some(join),
        })
    }

    pub fn watch(&self, symbol: &str, timeframe: Timeframe) {
        let _ = self.tx.send(FeedCommand::Watch {
            symbol: symbol.to_string(),
            timeframe,
        });
    }

    pub fn refresh(&self) {
        let _ = self.tx.send(FeedCommand::Refresh);
    }

    /// Everything received since the last call.
    pub fn drain(&self) -> Vec<FeedUpdate> {
        self.rx.try_iter().collect()
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        let _ = self.tx.send(FeedCommand::Shutdown);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn feed_loop(
    primary: &dyn BarProvider,
    fallback: &dyn BarProvider,
    options: FeedOptions,
    rx: Receiver<FeedCommand>,
    tx: Sender<FeedUpdate>,
    cancel: Arc<AtomicBool>,
) {
    info!(provider = primary.name(), "bar feed started");
    let mut target: Option<(String, Timeframe)> = None;
    let mut last = LastKnown::default();

    loop {
        if cancel.load(Ordering::Relaxed) {
            break;
        }
        let due = match rx.recv_timeout(options.poll_interval) {
            Ok(FeedCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Ok(FeedCommand::Watch { symbol, timeframe }) => {
                target = Some((symbol, timeframe));
                true
            }
            Ok(FeedCommand::Refresh) | Err(RecvTimeoutError::Timeout) => target.is_some(),
        };
        if !due || cancel.load(Ordering::Relaxed) {
            continue;
        }
        if let Some((symbol, timeframe)) = &target {
            debug!(%symbol, %timeframe, "polling bars");
            let update = fetch_once(primary, fallback, &mut last, symbol, *timeframe, options.history_bars);
            if tx.send(update).is_err() {
                break;
            }
        }
    }
    info!("bar feed stopped");
}

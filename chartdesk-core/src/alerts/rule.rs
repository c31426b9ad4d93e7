//! Alert rules and their lifecycle.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// What an alert watches: the last close, or a named indicator series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlertCondition {
    Price,
    Indicator(String),
}

impl AlertCondition {
    /// Conditions offered by the alert form.
    pub fn options() -> [AlertCondition; 3] {
        [
            AlertCondition::Price,
            AlertCondition::Indicator("rsi".into()),
            AlertCondition::Indicator("macd".into()),
        ]
    }

    pub fn as_str(&self) -> &str {
        match self {
            AlertCondition::Price => "price",
            AlertCondition::Indicator(name) => name,
        }
    }
}

impl From<String> for AlertCondition {
    fn from(s: String) -> Self {
        if s == "price" {
            AlertCondition::Price
        } else {
            AlertCondition::Indicator(s)
        }
    }
}

impl From<&str> for AlertCondition {
    fn from(s: &str) -> Self {
        s.to_string().into()
    }
}

impl From<AlertCondition> for String {
    fn from(c: AlertCondition) -> Self {
        match c {
            AlertCondition::Price => "price".into(),
            AlertCondition::Indicator(name) => name,
        }
    }
}

impl fmt::Display for AlertCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertStatus {
    Active,
    Triggered,
    Paused,
    Snoozed,
}

impl AlertStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Triggered => "triggered",
            AlertStatus::Paused => "paused",
            AlertStatus::Snoozed => "snoozed",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A threshold rule. Fires when the watched value is at or above `threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRule {
    pub id: String,
    pub symbol: String,
    pub condition: AlertCondition,
    #[serde(rename = "value")]
    pub threshold: f64,
    pub active: bool,
    pub triggered: bool,
    #[serde(default)]
    pub repeat: bool,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub snoozed_until: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created: DateTime<Utc>,
}

impl AlertRule {
    pub fn new(
        symbol: impl Into<String>,
        condition: AlertCondition,
        threshold: f64,
        repeat: bool,
        now: DateTime<Utc>,
    ) -> Self {
        let symbol = symbol.into();
        let id = rule_id(&symbol, &condition, threshold, now);
        Self {
            id,
            symbol,
            condition,
            threshold,
            active: true,
            triggered: false,
            repeat,
            snoozed_until: None,
            created: now,
        }
    }

    /// Whether the evaluator should look at this rule at `now`.
    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        if self.triggered {
            return false;
        }
        match self.snoozed_until {
            Some(until) => now >= until,
            None => self.active,
        }
    }

    pub fn status(&self, now: DateTime<Utc>) -> AlertStatus {
        if self.triggered {
            AlertStatus::Triggered
        } else if self.snoozed_until.is_some_and(|u| u > now) {
            AlertStatus::Snoozed
        } else if self.active || self.snoozed_until.is_some() {
            AlertStatus::Active
        } else {
            AlertStatus::Paused
        }
    }

    /// Pause or resume. Any snooze is dropped.
    pub fn toggle_active(&mut self) {
        self.active = !self.active;
        self.snoozed_until = None;
    }

    /// Re-arm after a trigger.
    pub fn reset(&mut self) {
        self.triggered = false;
        self.snoozed_until = None;
        self.active = true;
    }

    pub fn snooze(&mut self, duration: Duration, now: DateTime<Utc>) {
        self.active = false;
        self.snoozed_until = Some(now + duration);
    }

    /// Apply a trigger: one-shot rules finish, repeating rules snooze.
    pub fn mark_fired(&mut self, snooze: Duration, now: DateTime<Utc>) {
        self.active = false;
        if self.repeat {
            self.snoozed_until = Some(now + snooze);
        } else {
            self.triggered = true;
            self.snoozed_until = None;
        }
    }

    /// Notification title, e.g. `Alert: AAPL PRICE ≥ 150`.
    pub fn title(&self) -> String {
        format!(
            "Alert: {} {} \u{2265} {}",
            self.symbol,
            self.condition.as_str().to_uppercase(),
            self.threshold
        )
    }
}

fn rule_id(symbol: &str, condition: &AlertCondition, threshold: f64, created: DateTime<Utc>) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(symbol.as_bytes());
    hasher.update(b"\0");
    hasher.update(condition.as_str().as_bytes());
    hasher.update(b"\0");
    hasher.update(&threshold.to_le_bytes());
    hasher.update(&created.timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
    hasher.finalize().to_hex()[..16].to_string()
}

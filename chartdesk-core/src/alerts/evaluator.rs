//! Threshold evaluation over the latest price and indicator values.
//!
//! Comparison is `value >= threshold` only; there is no "falls below" rule.

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use super::rule::{AlertCondition, AlertRule};
use crate::indicators::IndicatorSet;

pub const DEFAULT_SNOOZE_MINUTES: i64 = 10;

/// Latest readings for one symbol.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub symbol: &'a str,
    pub last_close: Option<f64>,
    pub indicators: &'a IndicatorSet,
    pub now: DateTime<Utc>,
}

impl EvaluationContext<'_> {
    pub fn current_value(&self, condition: &AlertCondition) -> Option<f64> {
        match condition {
            AlertCondition::Price => self.last_close,
            AlertCondition::Indicator(name) => self.indicators.latest(name),
        }
        .filter(|v| v.is_finite())
    }
}

/// Emitted when a rule fires.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertNotification {
    pub rule_id: String,
    pub title: String,
    pub body: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct AlertEvaluator {
    snooze: Duration,
}

impl Default for AlertEvaluator {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_SNOOZE_MINUTES))
    }
}

impl AlertEvaluator {
    pub fn new(snooze: Duration) -> Self {
        Self { snooze }
    }

    pub fn snooze(&self) -> Duration {
        self.snooze
    }

    /// Evaluate every eligible rule of `ctx.symbol`, updating fired rules in place.
    ///
    /// Rules for other symbols and rules without a current value are left alone.
    pub fn evaluate(&self, rules: &mut [AlertRule], ctx: &EvaluationContext<'_>) -> Vec<AlertNotification> {
        let mut fired = Vec::new();
        for rule in rules.iter_mut() {
            if rule.symbol != ctx.symbol || !rule.is_eligible(ctx.now) {
                continue;
            }
            let Some(value) = ctx.current_value(&rule.condition) else {
                continue;
            };
            if value < rule.threshold {
                continue;
            }
            rule.mark_fired(self.snooze, ctx.now);
            info!(
                rule = %rule.id,
                symbol = %rule.symbol,
                condition = %rule.condition,
                threshold = rule.threshold,
                value,
                repeat = rule.repeat,
                "alert fired"
            );
            fired.push(AlertNotification {
                rule_id: rule.id.clone(),
                title: rule.title(),
                body: format!("Current value: {value:.2}"),
                value,
            });
        }
        fired
    }
}

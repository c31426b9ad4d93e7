//! Price and indicator alerts: rules, evaluation, persistence, notification.

pub mod evaluator;
pub mod notify;
pub mod rule;
pub mod store;

use thiserror::Error;

pub use evaluator::{AlertEvaluator, AlertNotification, EvaluationContext, DEFAULT_SNOOZE_MINUTES};
pub use notify::{dispatch, Delivery, NotificationCenter, Notifier, Toast, ToastLevel, DEFAULT_TOAST_TIMEOUT_MS};
pub use rule::{AlertCondition, AlertRule, AlertStatus};
pub use store::{validate_new, AlertStore, JsonFileAlertStore, MemoryAlertStore, StoreError};

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("please enter a valid number (got '{0}')")]
    InvalidThreshold(String),

    #[error("an active alert on {condition} at this level already exists")]
    Duplicate { condition: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Parse a user-entered threshold.
pub fn parse_threshold(input: &str) -> Result<f64, AlertError> {
    let trimmed = input.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(AlertError::InvalidThreshold(trimmed.to_string())),
    }
}

/// Validate and persist a new rule.
pub fn create_rule(
    store: &mut dyn AlertStore,
    rule: AlertRule,
) -> Result<AlertRule, AlertError> {
    let existing = store.list_for(&rule.symbol)?;
    validate_new(&existing, &rule.symbol, &rule.condition, rule.threshold)?;
    store.create(rule.clone())?;
    Ok(rule)
}

/// Evaluate the store's rules and write back the ones that fired.
pub fn evaluate_store(
    store: &mut dyn AlertStore,
    evaluator: &AlertEvaluator,
    ctx: &EvaluationContext<'_>,
) -> Result<Vec<AlertNotification>, StoreError> {
    let mut rules = store.list_for(ctx.symbol)?;
    let fired = evaluator.evaluate(&mut rules, ctx);
    for n in &fired {
        if let Some(rule) = rules.iter().find(|r| r.id == n.rule_id) {
            store.update(rule)?;
        }
    }
    Ok(fired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorSet;
    use chrono::{TimeZone, Utc};

    #[test]
    fn threshold_parsing() {
        assert_eq!(parse_threshold(" 150.5 ").unwrap(), 150.5);
        assert!(parse_threshold("abc").is_err());
        assert!(parse_threshold("").is_err());
        assert!(parse_threshold("inf").is_err());
    }

    #[test]
    fn create_rejects_duplicates() {
        let now = Utc.with_ymd_and_hms(2025, 7, 30, 0, 0, 0).unwrap();
        let mut store = MemoryAlertStore::new();
        create_rule(&mut store, AlertRule::new("AAPL", AlertCondition::Price, 150.0, false, now)).unwrap();
        let later = now + chrono::Duration::seconds(1);
        let dup = create_rule(&mut store, AlertRule::new("AAPL", AlertCondition::Price, 150.0, false, later));
        assert!(matches!(dup, Err(AlertError::Duplicate { .. })));
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn evaluate_store_writes_back() {
        let now = Utc.with_ymd_and_hms(2025, 7, 30, 0, 0, 0).unwrap();
        let mut store = MemoryAlertStore::new();
        store
            .create(AlertRule::new("AAPL", AlertCondition::Price, 100.0, false, now))
            .unwrap();
        let set = IndicatorSet::new();
        let ctx = EvaluationContext {
            symbol: "AAPL",
            last_close: Some(120.0),
            indicators: &set,
            now,
        };
        let fired = evaluate_store(&mut store, &AlertEvaluator::default(), &ctx).unwrap();
        assert_eq!(fired.len(), 1);
        assert!(store.list().unwrap()[0].triggered);
        assert!(evaluate_store(&mut store, &AlertEvaluator::default(), &ctx).unwrap().is_empty());
    }
}

//! Notification delivery: a primary notifier with an in-app toast fallback.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::evaluator::AlertNotification;

pub const DEFAULT_TOAST_TIMEOUT_MS: i64 = 3_000;

/// A system-level notification channel (desktop notification, terminal bell, ...).
pub trait Notifier: Send {
    /// Whether the channel may be used at all.
    fn is_permitted(&self) -> bool;

    /// Returns false when delivery failed.
    fn notify(&mut self, title: &str, body: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub level: ToastLevel,
    pub created: DateTime<Utc>,
    /// `None` keeps the toast until dismissed.
    pub timeout: Option<Duration>,
}

impl Toast {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.timeout.is_some_and(|t| now >= self.created + t)
    }
}

/// In-app toasts.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    toasts: Vec<Toast>,
    next_id: u64,
    default_timeout: Duration,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(Duration::milliseconds(DEFAULT_TOAST_TIMEOUT_MS))
    }
}

impl NotificationCenter {
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            toasts: Vec::new(),
            next_id: 1,
            default_timeout,
        }
    }

    pub fn push(&mut self, message: impl Into<String>, level: ToastLevel, now: DateTime<Utc>) -> u64 {
        let timeout = self.default_timeout;
        self.push_with_timeout(message, level, now, (timeout > Duration::zero()).then_some(timeout))
    }

    pub fn push_with_timeout(
        &mut self,
        message: impl Into<String>,
        level: ToastLevel,
        now: DateTime<Utc>,
        timeout: Option<Duration>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.toasts.push(Toast {
            id,
            message: message.into(),
            level,
            created: now,
            timeout,
        });
        id
    }

    /// Drop elapsed toasts. Returns how many were removed.
    pub fn expire(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.toasts.len();
        self.toasts.retain(|t| !t.is_expired(now));
        before - self.toasts.len()
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        self.toasts.len() != before
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Primary,
    InApp,
}

/// Send through `primary` when permitted and working, else raise an in-app toast.
pub fn dispatch(
    notification: &AlertNotification,
    primary: Option<&mut dyn Notifier>,
    center: &mut NotificationCenter,
    now: DateTime<Utc>,
) -> Delivery {
    if let Some(n) = primary {
        if n.is_permitted() && n.notify(&notification.title, &notification.body) {
            return Delivery::Primary;
        }
    }
    center.push(
        format!("{} ({})", notification.title.to_uppercase(), notification.body),
        ToastLevel::Warning,
        now,
    );
    Delivery::InApp
}

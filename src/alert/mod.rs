//! Ephemeral user-visible alerts (toasts).
//!
//! Facade operations and the push listener publish transient alerts here;
//! any number of UI consumers subscribe. Publishing never blocks and never
//! fails, even with no subscribers attached.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
}

/// Fan-out channel for transient alerts.
#[derive(Debug, Clone)]
pub struct AlertSink {
    tx: broadcast::Sender<Alert>,
}

impl AlertSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Alert> {
        self.tx.subscribe()
    }

    /// Subscribe as a `Stream`, convenient for UI event loops.
    pub fn stream(&self) -> BroadcastStream<Alert> {
        BroadcastStream::new(self.tx.subscribe())
    }

    pub fn publish(&self, level: AlertLevel, message: impl Into<String>) {
        let alert = Alert {
            level,
            message: message.into(),
        };
        // No subscribers is fine; the alert is simply not shown anywhere.
        if self.tx.send(alert.clone()).is_err() {
            tracing::debug!(message = %alert.message, "Alert published with no subscribers");
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.publish(AlertLevel::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(AlertLevel::Success, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.publish(AlertLevel::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(AlertLevel::Error, message);
    }
}

impl Default for AlertSink {
    fn default() -> Self {
        Self::new(32)
    }
}

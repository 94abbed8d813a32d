//! Notification sinks.
//!
//! The engine hands a title and message to a [`NotificationSink`] when a phase
//! completes. Delivery is best effort: errors are logged by the caller and
//! dropped.

use std::sync::Mutex;

use crate::error::NotifyError;

pub trait NotificationSink: Send + Sync {
    fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError>;
}

/// Writes notifications to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        tracing::info!(title, message, "notification");
        Ok(())
    }
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _title: &str, _message: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Keeps every notification in memory. Handy for tests and for hosts that
/// poll rather than push.
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that records the attempt and then reports failure.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((title.to_string(), message.to_string()));
        if self.fail {
            return Err(NotifyError::Unavailable("recording sink set to fail".into()));
        }
        Ok(())
    }
}

//! Operator notifications.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A single notification sent to operators. Output-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub subject: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl NotificationRecord {
    #[must_use]
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// `timestamp - subject: message`, the notification log line format.
impl fmt::Display for NotificationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}: {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            self.subject,
            self.message
        )
    }
}

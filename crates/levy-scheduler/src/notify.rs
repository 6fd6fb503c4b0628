//! Operator notifications.

use std::path::{Path, PathBuf};

use levy_core::errors::CoreError;
use levy_core::fs;
use levy_core::notification::NotificationRecord;

/// Where scheduler notifications go.
///
/// Implementations must not block for long: they are called from the
/// scheduler task between a check and the next sleep.
pub trait Notifier: Send + Sync {
    /// # Errors
    ///
    /// Returns `CoreError` if the notification could not be delivered.
    fn notify(&self, subject: &str, message: &str) -> Result<(), CoreError>;
}

/// Appends `timestamp - subject: message` lines to `notifications.log` and
/// mirrors each notification to the tracing output.
#[derive(Debug, Clone)]
pub struct LogFileNotifier {
    path: PathBuf,
}

impl LogFileNotifier {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Notifier for LogFileNotifier {
    fn notify(&self, subject: &str, message: &str) -> Result<(), CoreError> {
        let record = NotificationRecord::new(subject, message);
        tracing::info!(subject, message, "notification");
        fs::append_line(&self.path, &record.to_string())
    }
}

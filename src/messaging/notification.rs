// User-visible notifications for failed or noteworthy actions

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// Which part of the workshop raised it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    /// Generative model calls
    Model,
    /// Standard MIDI file import/export
    MidiFile,
    /// Track files and session archives
    TrackFile,
    /// Track mix operations
    Mix,
}

/// Notification with timestamp
#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub category: NotificationCategory,
    pub message: String,
    pub timestamp: u64, // Unix timestamp in milliseconds
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

impl Notification {
    pub fn new(
        level: NotificationLevel,
        category: NotificationCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            category,
            message: message.into(),
            timestamp: now_ms(),
        }
    }

    pub fn info(category: NotificationCategory, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, category, message)
    }

    pub fn warning(category: NotificationCategory, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, category, message)
    }

    pub fn error(category: NotificationCategory, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, category, message)
    }

    /// Raised less than `max_age_ms` ago
    pub fn is_recent(&self, max_age_ms: u64) -> bool {
        now_ms().saturating_sub(self.timestamp) < max_age_ms
    }
}

/// Bounded history of notifications, oldest dropped first
#[derive(Debug, Clone)]
pub struct NotificationLog {
    entries: VecDeque<Notification>,
    capacity: usize,
}

impl NotificationLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(256)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, notification: Notification) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(notification);
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Notification> {
        self.entries
            .iter()
            .filter(|n| n.level == NotificationLevel::Error)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return everything
    pub fn drain(&mut self) -> Vec<Notification> {
        self.entries.drain(..).collect()
    }
}

impl Default for NotificationLog {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_creation() {
        let notif = Notification::error(NotificationCategory::Model, "Melody RNN failed");

        assert_eq!(notif.level, NotificationLevel::Error);
        assert_eq!(notif.category, NotificationCategory::Model);
        assert_eq!(notif.message, "Melody RNN failed");
        assert!(notif.timestamp > 0);
        assert!(notif.is_recent(10_000));
    }

    #[test]
    fn test_notification_helpers() {
        let info = Notification::info(NotificationCategory::Mix, "Info");
        let warning = Notification::warning(NotificationCategory::MidiFile, "Warning");
        let error = Notification::error(NotificationCategory::TrackFile, "Error");

        assert_eq!(info.level, NotificationLevel::Info);
        assert_eq!(warning.level, NotificationLevel::Warning);
        assert_eq!(error.level, NotificationLevel::Error);
    }

    #[test]
    fn test_notification_log_is_bounded() {
        let mut log = NotificationLog::new(2);
        log.push(Notification::info(NotificationCategory::Mix, "one"));
        log.push(Notification::error(NotificationCategory::Model, "two"));
        log.push(Notification::info(NotificationCategory::Mix, "three"));

        assert_eq!(log.len(), 2);
        let messages: Vec<&str> = log.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["two", "three"]);
        assert_eq!(log.errors().count(), 1);
        assert_eq!(log.latest().unwrap().message, "three");

        assert_eq!(log.drain().len(), 2);
        assert!(log.is_empty());
    }
}

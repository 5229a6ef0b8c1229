//! Notifications collected while decoding.
//!
//! Recoverable problems never abort a decode. They are recorded here and
//! travel with the finished document so callers can tell the user that
//! decoding was imperfect.

use std::fmt;

use log::warn;

use crate::error::DviError;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationType {
    /// Something looked odd but nothing was lost (duplicate font ids,
    /// mismatched scale factors).
    Warning,
    /// A recoverable decode error; part of the document may be missing.
    Error,
}

/// A single recorded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub notification_type: NotificationType,
    pub message: String,
}

impl Notification {
    pub fn new(notification_type: NotificationType, message: impl Into<String>) -> Self {
        Self {
            notification_type,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.notification_type, self.message)
    }
}

/// Ordered list of notifications with an error counter.
///
/// The counter keeps counting after `limit` is reached; only the stored
/// messages are capped.
#[derive(Debug, Clone)]
pub struct NotificationCollection {
    entries: Vec<Notification>,
    error_count: u32,
    limit: usize,
}

impl Default for NotificationCollection {
    fn default() -> Self {
        Self::with_limit(usize::MAX)
    }
}

impl NotificationCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection that stores at most `limit` messages.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            error_count: 0,
            limit,
        }
    }

    /// Record a notification.
    pub fn notify(&mut self, notification_type: NotificationType, message: impl Into<String>) {
        let notification = Notification::new(notification_type, message);
        warn!("{}", notification);
        self.push(notification);
    }

    fn push(&mut self, notification: Notification) {
        if notification.notification_type == NotificationType::Error {
            self.error_count = self.error_count.saturating_add(1);
        }
        if self.entries.len() < self.limit {
            self.entries.push(notification);
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.notify(NotificationType::Warning, message);
    }

    /// Convert a recoverable error into an `Error` entry.
    pub fn error(&mut self, error: &DviError) {
        self.notify(NotificationType::Error, error.to_string());
    }

    /// Move every entry of `other` into this collection, in order.
    pub fn extend(&mut self, other: NotificationCollection) {
        for n in other.entries {
            self.push(n);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }

    /// Number of `Error` notifications recorded, including dropped ones.
    pub fn error_count(&self) -> u32 {
        self.error_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_counting() {
        let mut c = NotificationCollection::new();
        c.warn("duplicate font 3");
        c.error(&DviError::MalformedTrailer("no id byte".into()));
        assert_eq!(c.len(), 2);
        assert_eq!(c.error_count(), 1);
        let types: Vec<_> = c.iter().map(|n| n.notification_type).collect();
        assert_eq!(types, vec![NotificationType::Warning, NotificationType::Error]);
    }

    #[test]
    fn test_limit_keeps_counting() {
        let mut c = NotificationCollection::with_limit(1);
        c.error(&DviError::TruncatedPostamble("a".into()));
        c.error(&DviError::TruncatedPostamble("b".into()));
        assert_eq!(c.len(), 1);
        assert_eq!(c.error_count(), 2);
    }

    #[test]
    fn test_extend_preserves_order() {
        let mut a = NotificationCollection::new();
        a.warn("first");
        let mut b = NotificationCollection::new();
        b.warn("second");
        b.notify(NotificationType::Error, "third");
        a.extend(b);
        let messages: Vec<_> = a.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
        assert_eq!(a.error_count(), 1);
    }
}

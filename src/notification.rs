//! Sweep diagnostics.
//!
//! The unhide sweep never aborts on host variance: unsupported categories,
//! entities without the expected capability and calls that fail are
//! collected as [`Notification`] items instead. Absent capabilities
//! ([`NotificationType::NotSupported`]) are kept apart from capabilities
//! whose call failed ([`NotificationType::Error`]), so genuine host errors
//! are not hidden behind expected variance.

use std::fmt;

use crate::host::EntityCategory;

/// Category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationType {
    /// The host does not expose the category or capability.
    NotSupported,
    /// Non-fatal oddity (e.g. a cursor that stopped early).
    Warning,
    /// The capability exists but the host call failed.
    Error,
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSupported => write!(f, "NotSupported"),
            Self::Warning => write!(f, "Warning"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// A single diagnostic produced during a sweep.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Severity of the notification.
    pub notification_type: NotificationType,
    /// Category being swept when the notification was raised, if any.
    pub category: Option<EntityCategory>,
    /// Human readable description.
    pub message: String,
}

impl Notification {
    /// Create a notification without a category.
    pub fn new(notification_type: NotificationType, message: impl Into<String>) -> Self {
        Self {
            notification_type,
            category: None,
            message: message.into(),
        }
    }

    /// Attach the entity category the notification refers to.
    pub fn in_category(mut self, category: EntityCategory) -> Self {
        self.category = Some(category);
        self
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.category {
            Some(category) => write!(
                f,
                "[{}] {}: {}",
                self.notification_type, category, self.message
            ),
            None => write!(f, "[{}] {}", self.notification_type, self.message),
        }
    }
}

/// Collects notifications during a sweep.
#[derive(Debug, Clone, Default)]
pub struct NotificationCollection {
    items: Vec<Notification>,
}

impl NotificationCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Record a notification and mirror it to the log.
    pub fn push(&mut self, notification: Notification) {
        match notification.notification_type {
            NotificationType::NotSupported => tracing::trace!("{notification}"),
            NotificationType::Warning | NotificationType::Error => {
                tracing::debug!("{notification}")
            }
        }
        self.items.push(notification);
    }

    /// Add a notification from its parts.
    pub fn notify(&mut self, notification_type: NotificationType, message: impl Into<String>) {
        self.push(Notification::new(notification_type, message));
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of notifications.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Iterate over notifications in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Notification> {
        self.items.iter()
    }

    /// Get all notifications of a specific type.
    pub fn of_type(&self, nt: NotificationType) -> Vec<&Notification> {
        self.items.iter().filter(|n| n.notification_type == nt).collect()
    }

    /// Number of notifications of a given type.
    pub fn count(&self, nt: NotificationType) -> usize {
        self.items.iter().filter(|n| n.notification_type == nt).count()
    }

    /// Whether any notification has the given type.
    pub fn has_type(&self, nt: NotificationType) -> bool {
        self.items.iter().any(|n| n.notification_type == nt)
    }

    /// Remove all notifications.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<'a> IntoIterator for &'a NotificationCollection {
    type Item = &'a Notification;
    type IntoIter = std::slice::Iter<'a, Notification>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_basics() {
        let mut c = NotificationCollection::new();
        assert!(c.is_empty());

        c.notify(NotificationType::NotSupported, "category 301");
        c.notify(NotificationType::Error, "Update failed");
        c.notify(NotificationType::NotSupported, "category 302");

        assert_eq!(c.len(), 3);
        assert_eq!(c.count(NotificationType::NotSupported), 2);
        assert_eq!(c.of_type(NotificationType::Error).len(), 1);
        assert!(!c.has_type(NotificationType::Warning));
    }

    #[test]
    fn test_display_with_category() {
        let n = Notification::new(NotificationType::NotSupported, "collection unavailable")
            .in_category(EntityCategory::Fillet);
        assert_eq!(n.to_string(), "[NotSupported] Fillet (34): collection unavailable");

        let n = Notification::new(NotificationType::Warning, "cursor stopped");
        assert_eq!(n.to_string(), "[Warning] cursor stopped");
    }
}

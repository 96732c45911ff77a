use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Default,
    Destructive,
}

/// A toast shown to the user after an action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: Variant,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variant {
            Variant::Default => write!(f, "{}: {}", self.title, self.description),
            Variant::Destructive => write!(f, "[!] {}: {}", self.title, self.description),
        }
    }
}

/// Shared sink for notifications. Clones write to the same log.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    log: Arc<Mutex<Vec<Notification>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self, title: impl Into<String>, description: impl Into<String>) {
        self.push(Notification {
            title: title.into(),
            description: description.into(),
            variant: Variant::Default,
        });
    }

    pub fn failure(&self, title: impl Into<String>, description: impl Into<String>) {
        self.push(Notification {
            title: title.into(),
            description: description.into(),
            variant: Variant::Destructive,
        });
    }

    fn push(&self, notification: Notification) {
        match notification.variant {
            Variant::Default => info!(title = %notification.title, "{}", notification.description),
            Variant::Destructive => warn!(title = %notification.title, "{}", notification.description),
        }
        self.lock().push(notification);
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.lock().last().cloned()
    }

    /// Takes everything recorded so far, leaving the log empty.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_one_log() {
        let notifier = Notifier::new();
        let other = notifier.clone();

        other.success("Added to Watchlist", "Neon Dreams has been added to your watchlist.");
        notifier.failure("Error", "Failed to remove from watchlist.");

        let all = notifier.notifications();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].variant, Variant::Destructive);
        assert_eq!(all[1].to_string(), "[!] Error: Failed to remove from watchlist.");
    }

    #[test]
    fn drain_empties_the_log() {
        let notifier = Notifier::new();
        notifier.success("Welcome back!", "Successfully signed in.");

        assert_eq!(notifier.drain().len(), 1);
        assert!(notifier.notifications().is_empty());
        assert!(notifier.last().is_none());
    }
}

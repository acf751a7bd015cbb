//! Transient user-facing notifications and their broadcast fan-out.
//!
//! Notifications are fire-and-forget: the pipeline publishes them and moves on;
//! subscribers (the SSE surface, tests) receive whatever is published while they
//! are connected. A broadcast channel backs the hub so a slow consumer drops old
//! entries instead of blocking the pipeline.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::broadcast;

/// Default per-subscriber buffer before old notifications are dropped.
pub const DEFAULT_CAPACITY: usize = 256;

/// Severity of a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Routine progress feedback.
    Info,
    /// A failure the user should see.
    Destructive,
}

/// A single transient notification shown to the user.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Notification {
    /// Severity of the notification.
    pub kind: NotificationKind,
    /// Short heading.
    pub title: String,
    /// Human-readable description.
    pub message: String,
    /// RFC3339 timestamp captured when the notification was created.
    pub emitted_at: String,
}

impl Notification {
    /// Build an informational notification stamped with the current time.
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, title, message)
    }

    /// Build a destructive notification stamped with the current time.
    pub fn destructive(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Destructive, title, message)
    }

    fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            emitted_at: current_timestamp_rfc3339(),
        }
    }
}

/// Sink accepting pipeline notifications.
///
/// Delivery is best-effort; implementations must not block the publisher or
/// surface errors back to it.
pub trait NotificationSink: Send + Sync {
    /// Publish a notification to whoever is listening.
    fn publish(&self, notification: Notification);
}

/// Broadcast-backed hub fanning notifications out to any number of subscribers.
pub struct NotificationHub {
    tx: broadcast::Sender<Notification>,
}

impl NotificationHub {
    /// Create a hub buffering up to `capacity` notifications per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all notifications published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl NotificationSink for NotificationHub {
    fn publish(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Info => tracing::info!(
                title = %notification.title,
                message = %notification.message,
                "Notification"
            ),
            NotificationKind::Destructive => tracing::warn!(
                title = %notification.title,
                message = %notification.message,
                "Notification"
            ),
        }
        // Send fails only when no subscriber is connected.
        let _ = self.tx.send(notification);
    }
}

/// Current timestamp formatted for notification payloads.
fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_notifications() {
        let hub = NotificationHub::new(8);
        let mut rx = hub.subscribe();

        hub.publish(Notification::info(
            "Processing Document...",
            "Extracting content. Please wait...",
        ));

        let received = rx.recv().await.expect("notification");
        assert_eq!(received.kind, NotificationKind::Info);
        assert_eq!(received.title, "Processing Document...");
    }

    #[test]
    fn publishing_without_subscribers_is_a_no_op() {
        let hub = NotificationHub::new(8);
        hub.publish(Notification::destructive("Processing Failed", "boom"));
    }

    #[test]
    fn timestamp_is_rfc3339_like() {
        let notification = Notification::info("title", "message");
        assert!(notification.emitted_at.contains('T'));
        assert!(notification.emitted_at.ends_with('Z'));
    }
}

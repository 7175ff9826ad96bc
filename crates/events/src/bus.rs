//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`EditorEvent`]s. It is
//! shared via `Arc<EventBus>` between editing sessions, the autosave
//! scheduler, and anything that surfaces their outcome to the user.

use chrono::{DateTime, Utc};
use h2space_core::types::ContentId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// EditorEvent
// ---------------------------------------------------------------------------

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorEventKind {
    Saved,
    SaveFailed,
    Autosaved,
    AutosaveFailed,
    Restored,
    Deleted,
    DeleteFailed,
    UploadFailed,
}

impl EditorEventKind {
    /// Whether this event reports a failure the user should see.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            EditorEventKind::SaveFailed
                | EditorEventKind::AutosaveFailed
                | EditorEventKind::DeleteFailed
                | EditorEventKind::UploadFailed
        )
    }
}

/// An event emitted by the editor.
///
/// Constructed via [`EditorEvent::new`] and enriched with
/// [`with_content`](EditorEvent::with_content) and
/// [`with_message`](EditorEvent::with_message).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorEvent {
    pub kind: EditorEventKind,

    /// The content item concerned, once it has an id.
    pub content_id: Option<ContentId>,

    /// Human-readable detail, typically an error message.
    pub message: Option<String>,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl EditorEvent {
    pub fn new(kind: EditorEventKind) -> Self {
        Self {
            kind,
            content_id: None,
            message: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_content(mut self, content_id: impl Into<ContentId>) -> Self {
        self.content_id = Some(content_id.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// ```rust
/// use h2space_events::bus::{EditorEvent, EditorEventKind, EventBus};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(EditorEvent::new(EditorEventKind::Saved).with_content("c1"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<EditorEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unconsumed events are dropped and
    /// slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: EditorEvent) {
        // A SendError only means there are no receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            EditorEvent::new(EditorEventKind::AutosaveFailed)
                .with_content("c42")
                .with_message("connection refused"),
        );

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.kind, EditorEventKind::AutosaveFailed);
        assert_eq!(received.content_id.as_deref(), Some("c42"));
        assert_eq!(received.message.as_deref(), Some("connection refused"));
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(EditorEvent::new(EditorEventKind::Saved));

        assert_eq!(rx1.recv().await.unwrap().kind, EditorEventKind::Saved);
        assert_eq!(rx2.recv().await.unwrap().kind, EditorEventKind::Saved);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        EventBus::default().publish(EditorEvent::new(EditorEventKind::Deleted));
    }

    #[test]
    fn failure_kinds() {
        assert!(EditorEventKind::AutosaveFailed.is_failure());
        assert!(EditorEventKind::UploadFailed.is_failure());
        assert!(!EditorEventKind::Autosaved.is_failure());
        assert!(!EditorEventKind::Restored.is_failure());
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_value(EditorEvent::new(EditorEventKind::SaveFailed)).unwrap();
        assert_eq!(json["kind"], "save_failed");
        assert!(json["content_id"].is_null());
    }
}

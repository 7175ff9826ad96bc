//! Dismissible notices derived from editor failure events.
//!
//! [`run_notice_collector`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and turns every failure event into a [`Notice`] on a shared
//! [`NoticeBoard`]. A later successful save of the same content clears its
//! stale save-failure notices.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use h2space_core::types::ContentId;
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};

use crate::bus::{EditorEvent, EditorEventKind};

/// A user-visible, dismissible notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub id: u64,
    pub kind: EditorEventKind,
    pub content_id: Option<ContentId>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Notices currently shown to the user, oldest first.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    next_id: u64,
    notices: Vec<Notice>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `event`. Returns the id of the notice created, if any.
    pub fn record(&mut self, event: &EditorEvent) -> Option<u64> {
        match event.kind {
            EditorEventKind::Saved | EditorEventKind::Autosaved => {
                self.notices.retain(|notice| {
                    !(is_save_failure(notice.kind) && notice.content_id == event.content_id)
                });
                None
            }
            kind if kind.is_failure() => {
                self.next_id += 1;
                let id = self.next_id;
                self.notices.push(Notice {
                    id,
                    kind,
                    content_id: event.content_id.clone(),
                    message: notice_text(event),
                    created_at: event.timestamp,
                });
                Some(id)
            }
            _ => None,
        }
    }

    /// Dismiss a notice. Returns whether it was present.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.notices.len();
        self.notices.retain(|notice| notice.id != id);
        self.notices.len() != before
    }

    pub fn active(&self) -> &[Notice] {
        &self.notices
    }

    pub fn clear(&mut self) {
        self.notices.clear();
    }
}

fn is_save_failure(kind: EditorEventKind) -> bool {
    matches!(
        kind,
        EditorEventKind::SaveFailed | EditorEventKind::AutosaveFailed
    )
}

fn notice_text(event: &EditorEvent) -> String {
    let headline = match event.kind {
        EditorEventKind::SaveFailed => "Failed to save content",
        EditorEventKind::AutosaveFailed => "Failed to autosave content",
        EditorEventKind::DeleteFailed => "Failed to delete the content. Please try again.",
        EditorEventKind::UploadFailed => "Failed to upload file. Please try again.",
        _ => "Something went wrong",
    };
    match &event.message {
        Some(detail) => format!("{headline}: {detail}"),
        None => headline.to_string(),
    }
}

/// Feed events from `receiver` into `board` until the bus is dropped.
pub async fn run_notice_collector(
    board: Arc<Mutex<NoticeBoard>>,
    mut receiver: broadcast::Receiver<EditorEvent>,
) {
    loop {
        match receiver.recv().await {
            Ok(event) => {
                if let Some(id) = board.lock().await.record(&event) {
                    tracing::debug!(notice_id = id, kind = ?event.kind, "Notice raised");
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(skipped = n, "Notice collector lagged, some events were dropped");
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::debug!("Event bus closed, notice collector shutting down");
                break;
            }
        }
    }
}

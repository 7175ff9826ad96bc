//! Editing session.
//!
//! An [`EditingSession`] is the scoped lifetime of editing one content item.
//! Opening it loads the draft and the validation context; for identified
//! content it also starts the autosave loop. The loop runs under a child of
//! the session's [`CancellationToken`], so closing or dropping the session
//! always stops it. A confirmed delete stops autosave before the delete
//! request so a stale write cannot recreate the content.

use std::sync::{Arc, PoisonError};

use h2space_core::confirmation::Confirmation;
use h2space_core::content::{Content, ContentDraft, MediaFile, MediaUpload};
use h2space_core::error::CoreError;
use h2space_core::repository::ContentRepository;
use h2space_core::validation::ValidationRules;
use h2space_events::{EditorEvent, EditorEventKind, EventBus};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::autosave::AutosaveScheduler;
use crate::config::EditorConfig;
use crate::draft::{DraftEdit, DraftStateManager, SaveError};
use crate::versions::VersionHistoryManager;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Editing session is closed")]
    Closed,

    /// The operation needs content that has been saved at least once.
    #[error("Content has not been saved yet")]
    NotPersisted,

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

struct AutosaveTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl AutosaveTask {
    fn stop(self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

pub struct EditingSession {
    repo: Arc<dyn ContentRepository>,
    bus: Arc<EventBus>,
    config: EditorConfig,
    draft: Arc<DraftStateManager>,
    autosave: AutosaveScheduler,
    history: Mutex<Option<Arc<VersionHistoryManager>>>,
    /// Cancelled when the session ends.
    lifetime: CancellationToken,
    autosave_task: std::sync::Mutex<Option<AutosaveTask>>,
}

impl std::fmt::Debug for EditingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditingSession")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl EditingSession {
    /// Start editing a new, not yet persisted content item. Autosave starts
    /// after the first successful save.
    pub async fn open_new(
        repo: Arc<dyn ContentRepository>,
        bus: Arc<EventBus>,
        config: EditorConfig,
    ) -> Self {
        Self::build(repo, bus, config, None).await
    }

    /// Start editing existing content. Autosave starts immediately.
    pub async fn open(
        repo: Arc<dyn ContentRepository>,
        bus: Arc<EventBus>,
        config: EditorConfig,
        content_id: &str,
    ) -> Result<Self, SessionError> {
        let content = repo.get_content(content_id).await?;
        Ok(Self::build(repo, bus, config, Some(&content)).await)
    }

    async fn build(
        repo: Arc<dyn ContentRepository>,
        bus: Arc<EventBus>,
        config: EditorConfig,
        initial: Option<&Content>,
    ) -> Self {
        // Without categories the category field is simply optional.
        let categories = match repo.get_categories().await {
            Ok(categories) => categories,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load categories");
                Vec::new()
            }
        };
        let rules = ValidationRules {
            max_tags: config.max_tags,
            ..ValidationRules::default()
        }
        .with_category_options(&categories);

        let draft = Arc::new(
            DraftStateManager::load(repo.clone(), bus.clone(), initial).with_rules(rules),
        );
        let autosave = AutosaveScheduler::new(draft.clone(), bus.clone(), config.autosave);

        let session = Self {
            repo,
            bus,
            config,
            draft,
            autosave,
            history: Mutex::new(None),
            lifetime: CancellationToken::new(),
            autosave_task: std::sync::Mutex::new(None),
        };
        if let Some(content) = initial {
            tracing::info!(content_id = %content.id, "Editing session opened");
            session.start_autosave();
        }
        session
    }

    pub fn draft(&self) -> &Arc<DraftStateManager> {
        &self.draft
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.lifetime.is_cancelled()
    }

    pub fn is_autosaving(&self) -> bool {
        self.autosave_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.cancel.is_cancelled())
    }

    /// End the session. Stops autosave and abandons any in-flight autosave.
    pub fn close(&self) {
        self.stop_autosave();
        self.lifetime.cancel();
    }

    // ---- autosave lifetime ----

    fn start_autosave(&self) {
        if self.is_closed() {
            return;
        }
        let mut slot = self
            .autosave_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|task| !task.cancel.is_cancelled()) {
            return;
        }

        let cancel = self.lifetime.child_token();
        let scheduler = self.autosave.clone();
        let token = cancel.clone();
        let handle = tokio::spawn(async move { scheduler.run(token).await });
        tracing::debug!(interval_secs = self.autosave.interval().as_secs(), "Autosave started");
        *slot = Some(AutosaveTask { cancel, handle });
    }

    fn stop_autosave(&self) {
        let task = self
            .autosave_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.stop();
            tracing::debug!("Autosave stopped");
        }
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.is_closed() {
            Err(SessionError::Closed)
        } else {
            Ok(())
        }
    }

    // ---- operations ----

    /// Validate and save the draft. The first successful save of new content
    /// starts autosave.
    pub async fn save(&self, as_publish: bool) -> Result<Content, SessionError> {
        self.ensure_open()?;
        let content = self.draft.save(as_publish).await?;
        self.start_autosave();
        Ok(content)
    }

    /// Version history of the content being edited.
    pub async fn history(&self) -> Result<Arc<VersionHistoryManager>, SessionError> {
        let id = self.draft.id().await.ok_or(SessionError::NotPersisted)?;
        let mut slot = self.history.lock().await;
        let history =
            slot.get_or_insert_with(|| Arc::new(VersionHistoryManager::new(self.repo.clone(), id)));
        Ok(history.clone())
    }

    /// Load a historical version into the draft. Nothing is persisted until
    /// the next save, which the service records as a new version.
    pub async fn restore_version(&self, version_id: &str) -> Result<ContentDraft, SessionError> {
        self.ensure_open()?;
        let history = self.history().await?;
        let restored = history.restore(version_id).await?;
        self.draft.apply_restored(restored.clone()).await;

        self.bus.publish(
            EditorEvent::new(EditorEventKind::Restored)
                .with_content(history.content_id())
                .with_message(format!("Restored version {version_id}")),
        );
        Ok(restored)
    }

    /// Check `file` against the media policy and upload it.
    pub async fn upload_media(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<MediaUpload, SessionError> {
        self.ensure_open()?;
        let result = match self.config.media.check(file_name, bytes.len() as u64) {
            Ok(mime_type) => {
                self.repo
                    .upload_media(MediaFile {
                        file_name: file_name.to_string(),
                        mime_type,
                        bytes,
                    })
                    .await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(upload) => {
                tracing::info!(file_name, url = %upload.url, "Media uploaded");
                Ok(upload)
            }
            Err(e) => {
                tracing::warn!(file_name, error = %e, "Failed to upload media");
                let mut event =
                    EditorEvent::new(EditorEventKind::UploadFailed).with_message(e.to_string());
                if let Some(id) = self.draft.id().await {
                    event = event.with_content(id);
                }
                self.bus.publish(event);
                Err(e.into())
            }
        }
    }

    /// Upload `file` and use it as the featured image.
    pub async fn upload_featured_image(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<MediaUpload, SessionError> {
        let upload = self.upload_media(file_name, bytes).await?;
        self.draft
            .edit(DraftEdit::FeaturedImage(Some(upload.url.clone())))
            .await;
        Ok(upload)
    }

    /// Delete the content once the confirmation phrase matches.
    ///
    /// Autosave is stopped before the request. On success the session
    /// closes; on failure autosave resumes and the draft is left intact.
    pub async fn delete(&self, confirmation: &Confirmation) -> Result<(), SessionError> {
        self.ensure_open()?;
        confirmation.check()?;
        let id = self.draft.id().await.ok_or(SessionError::NotPersisted)?;

        self.stop_autosave();
        match self.repo.delete_content(&id).await {
            Ok(()) => {
                tracing::info!(content_id = %id, "Content deleted");
                self.bus
                    .publish(EditorEvent::new(EditorEventKind::Deleted).with_content(id));
                self.close();
                Ok(())
            }
            Err(e) => {
                tracing::error!(content_id = %id, error = %e, "Failed to delete content");
                self.bus.publish(
                    EditorEvent::new(EditorEventKind::DeleteFailed)
                        .with_content(id)
                        .with_message(e.to_string()),
                );
                self.start_autosave();
                Err(e.into())
            }
        }
    }
}

impl Drop for EditingSession {
    fn drop(&mut self) {
        self.lifetime.cancel();
        let task = self
            .autosave_task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.stop();
        }
    }
}

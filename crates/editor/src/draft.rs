//! Draft State Manager.
//!
//! [`DraftStateManager`] owns the working copy of one content item, the
//! validation errors last recorded against it, and the [`PersistedSnapshot`]
//! used for dirty checking. Saves dispatch to the [`ContentRepository`] and
//! replace the snapshot atomically on success.
//!
//! The state lock is never held across a repository call, so a manual save
//! and an autosave may overlap. Whichever write the service applies last wins.

use std::sync::Arc;

use chrono::Utc;
use h2space_core::content::{Content, ContentDraft, ContentFormData, ContentPatch, ContentStatus};
use h2space_core::error::CoreError;
use h2space_core::repository::ContentRepository;
use h2space_core::seo::{self, SeoMetadata, SeoReport};
use h2space_core::tags::{self, TagInsert};
use h2space_core::types::{ContentId, Timestamp};
use h2space_core::validation::{validate_draft, DraftField, FieldErrors, ValidationRules};
use h2space_core::versions::{diff_form_data, FieldChange};
use h2space_events::{EditorEvent, EditorEventKind, EventBus};
use tokio::sync::Mutex;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Last successfully persisted field values.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedSnapshot {
    pub fields: ContentFormData,
    pub saved_at: Timestamp,
}

/// A single field-level edit.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftEdit {
    Title(String),
    /// Rich text HTML produced by the editor component.
    Body(String),
    Excerpt(String),
    FeaturedImage(Option<String>),
    Status(ContentStatus),
    Category(String),
    Tags(Vec<String>),
    Seo(Option<SeoMetadata>),
}

impl DraftEdit {
    /// The field this edit touches.
    pub fn field(&self) -> DraftField {
        match self {
            DraftEdit::Title(_) => DraftField::Title,
            DraftEdit::Body(_) => DraftField::Body,
            DraftEdit::Excerpt(_) => DraftField::Excerpt,
            DraftEdit::FeaturedImage(_) => DraftField::FeaturedImage,
            DraftEdit::Status(_) => DraftField::Status,
            DraftEdit::Category(_) => DraftField::Category,
            DraftEdit::Tags(_) => DraftField::Tags,
            DraftEdit::Seo(_) => DraftField::Seo,
        }
    }

    fn apply(self, fields: &mut ContentFormData) {
        match self {
            DraftEdit::Title(v) => fields.title = v,
            DraftEdit::Body(v) => fields.body = v,
            DraftEdit::Excerpt(v) => fields.excerpt = v,
            DraftEdit::FeaturedImage(v) => fields.featured_image = v.filter(|url| !url.is_empty()),
            DraftEdit::Status(v) => fields.status = v,
            DraftEdit::Category(v) => fields.category = v,
            DraftEdit::Tags(v) => fields.tags = v,
            DraftEdit::Seo(v) => fields.seo = v,
        }
    }
}

/// Errors returned by [`DraftStateManager::save`].
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// The draft failed local validation. Nothing was sent.
    #[error("Draft has {} invalid field(s)", .0.len())]
    Validation(FieldErrors),

    /// The repository rejected or failed the write.
    #[error(transparent)]
    Repository(#[from] CoreError),
}

/// What an autosave attempt did.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AutosaveAttempt {
    /// The draft has never been persisted, so there is nothing to update.
    NotPersisted,
    /// The draft matches its snapshot.
    Clean,
    Saved(ContentId),
}

#[derive(Debug)]
struct DraftState {
    draft: ContentDraft,
    snapshot: Option<PersistedSnapshot>,
    errors: FieldErrors,
}

// ---------------------------------------------------------------------------
// DraftStateManager
// ---------------------------------------------------------------------------

pub struct DraftStateManager {
    repo: Arc<dyn ContentRepository>,
    bus: Arc<EventBus>,
    rules: ValidationRules,
    state: Mutex<DraftState>,
}

impl DraftStateManager {
    /// Produce an editable draft.
    ///
    /// With `initial`, fields are seeded from it and the snapshot equals the
    /// seeded values, so the draft starts clean. Without it, the draft is
    /// empty with `draft` status and has no snapshot.
    pub fn load(
        repo: Arc<dyn ContentRepository>,
        bus: Arc<EventBus>,
        initial: Option<&Content>,
    ) -> Self {
        let (draft, snapshot) = match initial {
            Some(content) => {
                let draft = ContentDraft::from_content(content);
                let snapshot = PersistedSnapshot {
                    fields: draft.fields.clone(),
                    saved_at: content.updated_at,
                };
                (draft, Some(snapshot))
            }
            None => (ContentDraft::new(), None),
        };

        Self {
            repo,
            bus,
            rules: ValidationRules::default(),
            state: Mutex::new(DraftState {
                draft,
                snapshot,
                errors: FieldErrors::new(),
            }),
        }
    }

    pub fn with_rules(mut self, rules: ValidationRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    // ---- reads ----

    pub async fn draft(&self) -> ContentDraft {
        self.state.lock().await.draft.clone()
    }

    pub async fn id(&self) -> Option<ContentId> {
        self.state.lock().await.draft.id.clone()
    }

    pub async fn fields(&self) -> ContentFormData {
        self.state.lock().await.draft.fields.clone()
    }

    pub async fn snapshot(&self) -> Option<PersistedSnapshot> {
        self.state.lock().await.snapshot.clone()
    }

    pub async fn last_saved_at(&self) -> Option<Timestamp> {
        self.state.lock().await.snapshot.as_ref().map(|s| s.saved_at)
    }

    /// Validation errors recorded by the last failed save, minus the fields
    /// edited since.
    pub async fn errors(&self) -> FieldErrors {
        self.state.lock().await.errors.clone()
    }

    /// Whether the draft differs from its snapshot. A draft that was never
    /// persisted is always dirty.
    pub async fn is_dirty(&self) -> bool {
        let state = self.state.lock().await;
        match &state.snapshot {
            Some(snapshot) => !state.draft.fields.same_content(&snapshot.fields),
            None => true,
        }
    }

    /// Field-level changes since the last save.
    pub async fn changed_fields(&self) -> Vec<FieldChange> {
        let state = self.state.lock().await;
        match &state.snapshot {
            Some(snapshot) => diff_form_data(&snapshot.fields, &state.draft.fields),
            None => diff_form_data(&ContentFormData::default(), &state.draft.fields),
        }
    }

    /// Run the validation rules without touching state.
    pub async fn validate(&self) -> FieldErrors {
        let fields = self.fields().await;
        validate_draft(&fields, &self.rules)
    }

    pub async fn seo_report(&self) -> SeoReport {
        let fields = self.fields().await;
        let seo = fields.seo.clone().unwrap_or_default();
        seo::analyze(&seo, &fields)
    }

    // ---- edits ----

    /// Apply a field update and clear that field's recorded error.
    pub async fn edit(&self, edit: DraftEdit) {
        let mut state = self.state.lock().await;
        state.errors.remove(&edit.field());
        edit.apply(&mut state.draft.fields);
    }

    pub async fn add_tag(&self, tag: &str) -> TagInsert {
        let mut state = self.state.lock().await;
        let outcome = tags::add_tag(&mut state.draft.fields.tags, tag, self.rules.max_tags);
        if outcome == TagInsert::Added {
            state.errors.remove(&DraftField::Tags);
        }
        outcome
    }

    pub async fn remove_tag(&self, tag: &str) -> bool {
        let mut state = self.state.lock().await;
        let removed = tags::remove_tag(&mut state.draft.fields.tags, tag);
        if removed {
            state.errors.remove(&DraftField::Tags);
        }
        removed
    }

    /// Remove the most recently added tag, as backspace on an empty tag
    /// input does.
    pub async fn pop_last_tag(&self) -> Option<String> {
        let mut state = self.state.lock().await;
        let popped = tags::pop_last_tag(&mut state.draft.fields.tags);
        if popped.is_some() {
            state.errors.remove(&DraftField::Tags);
        }
        popped
    }

    /// Fill empty SEO fields from the title, excerpt and featured image.
    pub async fn auto_populate_seo(&self) {
        let mut state = self.state.lock().await;
        let fields = &mut state.draft.fields;
        let mut seo = fields.seo.take().unwrap_or_default();
        seo::auto_populate(&mut seo, fields);
        fields.seo = Some(seo);
        state.errors.remove(&DraftField::Seo);
    }

    /// Replace the working copy with a draft restored from a version.
    ///
    /// The snapshot is kept, so the restored values read as unsaved changes
    /// until the next save writes them as a new version.
    pub async fn apply_restored(&self, restored: ContentDraft) {
        let mut state = self.state.lock().await;
        let id = restored.id.or_else(|| state.draft.id.clone());
        state.draft = ContentDraft {
            id,
            fields: restored.fields,
        };
        state.errors.clear();
    }

    // ---- persistence ----

    /// Validate and persist the draft.
    ///
    /// Validation failures are recorded and returned without any repository
    /// call. With `as_publish` the status is set to `published` first. A
    /// draft without an id is created, otherwise updated; on create the new
    /// id is kept so later saves update.
    pub async fn save(&self, as_publish: bool) -> Result<Content, SaveError> {
        let (id, submitted) = {
            let mut state = self.state.lock().await;
            let errors = validate_draft(&state.draft.fields, &self.rules);
            if !errors.is_empty() {
                tracing::debug!(invalid = errors.len(), "Save blocked by validation");
                state.errors = errors.clone();
                return Err(SaveError::Validation(errors));
            }
            state.errors.clear();
            if as_publish {
                state.draft.fields.status = ContentStatus::Published;
            }
            (state.draft.id.clone(), state.draft.fields.clone())
        };

        let result = match &id {
            Some(id) => {
                self.repo
                    .update_content(id, &ContentPatch::from(submitted.clone()))
                    .await
            }
            None => self.repo.create_content(&submitted).await,
        };

        match result {
            Ok(content) => {
                self.record_saved(&content.id, submitted).await;
                tracing::info!(content_id = %content.id, created = id.is_none(), "Content saved");
                self.bus.publish(
                    EditorEvent::new(EditorEventKind::Saved).with_content(content.id.clone()),
                );
                Ok(content)
            }
            Err(e) => {
                tracing::error!(content_id = ?id, error = %e, "Failed to save content");
                let mut event =
                    EditorEvent::new(EditorEventKind::SaveFailed).with_message(e.to_string());
                if let Some(id) = id {
                    event = event.with_content(id);
                }
                self.bus.publish(event);
                Err(SaveError::Repository(e))
            }
        }
    }

    /// Persist the draft without validating it, when it already has an id
    /// and differs from its snapshot.
    ///
    /// Status is left out: only a validated [`save`](Self::save) changes it.
    /// A status-only edit therefore counts as clean here.
    pub(crate) async fn autosave(&self) -> Result<AutosaveAttempt, CoreError> {
        let (id, submitted) = {
            let state = self.state.lock().await;
            let Some(id) = state.draft.id.clone() else {
                return Ok(AutosaveAttempt::NotPersisted);
            };
            let mut submitted = state.draft.fields.clone();
            if let Some(snapshot) = &state.snapshot {
                submitted.status = snapshot.fields.status;
                if submitted.same_content(&snapshot.fields) {
                    return Ok(AutosaveAttempt::Clean);
                }
            }
            (id, submitted)
        };

        let patch = ContentPatch {
            status: None,
            ..ContentPatch::from(submitted.clone())
        };
        self.repo.update_content(&id, &patch).await?;
        self.record_saved(&id, submitted).await;
        Ok(AutosaveAttempt::Saved(id))
    }

    async fn record_saved(&self, id: &str, submitted: ContentFormData) {
        let mut state = self.state.lock().await;
        state.snapshot = Some(PersistedSnapshot {
            fields: submitted,
            saved_at: Utc::now(),
        });
        if state.draft.id.is_none() {
            state.draft.id = Some(id.to_string());
        }
    }
}

//! Version History Manager.
//!
//! Lists the versions of one content item newest first, tracks the two-slot
//! comparison selection, compares two versions by the changes the later one
//! recorded, and hydrates drafts from historical versions. Restoring never
//! persists anything; the caller saves the restored draft, which the content
//! service records as a new version.

use std::sync::Arc;

use h2space_core::content::ContentDraft;
use h2space_core::error::{CoreError, CoreResult};
use h2space_core::repository::ContentRepository;
use h2space_core::types::{ContentId, VersionId};
use h2space_core::versions::{
    sort_newest_first, ContentVersion, VersionComparison, VersionSelection,
};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct HistoryState {
    /// Newest first, as of the last listing.
    versions: Vec<ContentVersion>,
    selection: VersionSelection,
}

pub struct VersionHistoryManager {
    repo: Arc<dyn ContentRepository>,
    content_id: ContentId,
    state: Mutex<HistoryState>,
}

impl VersionHistoryManager {
    pub fn new(repo: Arc<dyn ContentRepository>, content_id: impl Into<ContentId>) -> Self {
        Self {
            repo,
            content_id: content_id.into(),
            state: Mutex::new(HistoryState::default()),
        }
    }

    pub fn content_id(&self) -> &str {
        &self.content_id
    }

    /// Fetch the versions, newest first.
    ///
    /// A content id the service does not know has no history, so `NotFound`
    /// yields an empty list. Selected ids that no longer exist are dropped.
    pub async fn list_versions(&self) -> CoreResult<Vec<ContentVersion>> {
        let mut versions = match self.repo.get_versions(&self.content_id).await {
            Ok(versions) => versions,
            Err(CoreError::NotFound { .. }) => {
                tracing::debug!(content_id = %self.content_id, "No version history");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        sort_newest_first(&mut versions);

        let mut state = self.state.lock().await;
        let stale: Vec<VersionId> = state
            .selection
            .selected()
            .iter()
            .filter(|id| !versions.iter().any(|v| &v.id == *id))
            .cloned()
            .collect();
        for id in stale {
            state.selection.toggle(&id);
        }
        state.versions = versions.clone();
        Ok(versions)
    }

    /// Id of the version representing the live state: the highest version
    /// number from the last listing.
    pub async fn current(&self) -> Option<VersionId> {
        self.state.lock().await.versions.first().map(|v| v.id.clone())
    }

    pub async fn is_current(&self, version_id: &str) -> bool {
        self.current().await.as_deref() == Some(version_id)
    }

    /// Toggle `version_id` in the comparison selection. Returns the selection
    /// afterwards, in selection order.
    pub async fn select(&self, version_id: &str) -> Vec<VersionId> {
        let mut state = self.state.lock().await;
        state.selection.toggle(version_id);
        state.selection.selected().to_vec()
    }

    pub async fn selection(&self) -> Vec<VersionId> {
        self.state.lock().await.selection.selected().to_vec()
    }

    pub async fn clear_selection(&self) {
        self.state.lock().await.selection.clear();
    }

    /// Compare two distinct versions. The history is listed again when
    /// either id is missing from the last listing.
    pub async fn compare(&self, a: &str, b: &str) -> CoreResult<VersionComparison> {
        if a == b {
            return Err(CoreError::Validation(
                "Select two different versions to compare".into(),
            ));
        }

        let cached = {
            let state = self.state.lock().await;
            let known = |id: &str| state.versions.iter().any(|v| v.id == id);
            known(a) && known(b)
        };
        if !cached {
            self.list_versions().await?;
        }

        let state = self.state.lock().await;
        let find = |id: &str| {
            state
                .versions
                .iter()
                .find(|v| v.id == id)
                .ok_or_else(|| CoreError::NotFound {
                    entity: "version",
                    id: id.to_string(),
                })
        };
        Ok(VersionComparison::between(find(a)?, find(b)?))
    }

    /// Compare the two selected versions.
    pub async fn compare_selected(&self) -> CoreResult<VersionComparison> {
        let pair = {
            let state = self.state.lock().await;
            state
                .selection
                .pair()
                .map(|(a, b)| (a.to_string(), b.to_string()))
        };
        match pair {
            Some((a, b)) => self.compare(&a, &b).await,
            None => Err(CoreError::Validation("Select two versions to compare".into())),
        }
    }

    /// A new draft holding the field values recorded by `version_id`.
    ///
    /// Restoring the current version is allowed and yields the live values.
    pub async fn restore(&self, version_id: &str) -> CoreResult<ContentDraft> {
        let detail = self.repo.get_version(&self.content_id, version_id).await?;
        tracing::info!(
            content_id = %self.content_id,
            version_id,
            version_number = detail.version.version_number,
            "Version loaded for restore"
        );
        Ok(ContentDraft {
            id: Some(self.content_id.clone()),
            fields: detail.data,
        })
    }
}

//! The content repository collaborator.
//!
//! Every component that reads or writes content goes through
//! [`ContentRepository`]. Implementations are stateless from the caller's
//! point of view and safe to share across drafts and list views; each request
//! is independent and addressed by explicit id.

use async_trait::async_trait;

use crate::content::{
    Content, ContentAnalytics, ContentFormData, ContentPage, ContentPatch, MediaFile, MediaUpload,
};
use crate::error::CoreResult;
use crate::listing::ContentQuery;
use crate::versions::{ContentVersion, ContentVersionDetail};

#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Fetch one content item. Missing items yield `CoreError::NotFound`.
    async fn get_content(&self, id: &str) -> CoreResult<Content>;

    /// Create a content item; the service assigns its id.
    async fn create_content(&self, data: &ContentFormData) -> CoreResult<Content>;

    /// Apply a partial update to an existing content item.
    async fn update_content(&self, id: &str, patch: &ContentPatch) -> CoreResult<Content>;

    async fn delete_content(&self, id: &str) -> CoreResult<()>;

    async fn upload_media(&self, file: MediaFile) -> CoreResult<MediaUpload>;

    async fn get_categories(&self) -> CoreResult<Vec<String>>;

    async fn get_tags(&self) -> CoreResult<Vec<String>>;

    async fn get_contents(&self, query: &ContentQuery) -> CoreResult<ContentPage>;

    /// List the versions of a content item in any order.
    async fn get_versions(&self, content_id: &str) -> CoreResult<Vec<ContentVersion>>;

    /// Fetch one version with the field values it recorded.
    async fn get_version(
        &self,
        content_id: &str,
        version_id: &str,
    ) -> CoreResult<ContentVersionDetail>;

    async fn track_view(&self, id: &str) -> CoreResult<()>;

    async fn get_analytics(&self, id: &str) -> CoreResult<ContentAnalytics>;
}

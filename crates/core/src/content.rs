//! Content model shared by the editor, the list view, and the repository client.
//!
//! Field names serialize in camelCase to match the content service. The rich
//! body travels under the `content` key; in Rust it is `body` so it cannot be
//! confused with the entity itself.

use serde::{Deserialize, Serialize};

use crate::seo::SeoMetadata;
use crate::tags;
use crate::types::{ContentId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Publication status of a content item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Published => "published",
            ContentStatus::Archived => "archived",
        }
    }
}

impl std::fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentStatus {
    type Err = crate::error::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ContentStatus::Draft),
            "published" => Ok(ContentStatus::Published),
            "archived" => Ok(ContentStatus::Archived),
            other => Err(crate::error::CoreError::Validation(format!(
                "Invalid status '{other}'. Must be one of: draft, published, archived"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Persisted content
// ---------------------------------------------------------------------------

/// A content item as stored by the content service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub id: ContentId,
    pub title: String,
    /// Rich text body in HTML.
    #[serde(rename = "content")]
    pub body: String,
    pub excerpt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    pub status: ContentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub author_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo: Option<SeoMetadata>,
}

impl Content {
    /// The editable fields of this content item.
    pub fn form_data(&self) -> ContentFormData {
        ContentFormData {
            title: self.title.clone(),
            body: self.body.clone(),
            excerpt: self.excerpt.clone(),
            featured_image: self.featured_image.clone(),
            status: self.status,
            tags: self.tags.clone(),
            category: self.category.clone(),
            seo: self.seo.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Form data
// ---------------------------------------------------------------------------

/// The full set of editable fields submitted on create or update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentFormData {
    pub title: String,
    #[serde(rename = "content")]
    pub body: String,
    pub excerpt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub status: ContentStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo: Option<SeoMetadata>,
}

impl ContentFormData {
    /// Structural equality used for dirty checking.
    ///
    /// Tags compare as a set; every other field compares exactly. An empty
    /// featured image is the same as no featured image.
    pub fn same_content(&self, other: &ContentFormData) -> bool {
        self.title == other.title
            && self.body == other.body
            && self.excerpt == other.excerpt
            && normalized_image(&self.featured_image) == normalized_image(&other.featured_image)
            && self.status == other.status
            && self.category == other.category
            && self.seo == other.seo
            && tags::same_tags(&self.tags, &other.tags)
    }
}

fn normalized_image(image: &Option<String>) -> Option<&str> {
    image.as_deref().filter(|url| !url.is_empty())
}

/// Partial update payload. Only `Some` fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, rename = "content", skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ContentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo: Option<SeoMetadata>,
}

impl ContentPatch {
    pub fn is_empty(&self) -> bool {
        self == &ContentPatch::default()
    }

    /// Apply this patch on top of existing form data.
    pub fn apply_to(&self, data: &mut ContentFormData) {
        if let Some(title) = &self.title {
            data.title = title.clone();
        }
        if let Some(body) = &self.body {
            data.body = body.clone();
        }
        if let Some(excerpt) = &self.excerpt {
            data.excerpt = excerpt.clone();
        }
        if let Some(image) = &self.featured_image {
            data.featured_image = Some(image.clone()).filter(|url| !url.is_empty());
        }
        if let Some(status) = self.status {
            data.status = status;
        }
        if let Some(tags) = &self.tags {
            data.tags = tags.clone();
        }
        if let Some(category) = &self.category {
            data.category = category.clone();
        }
        if let Some(seo) = &self.seo {
            data.seo = Some(seo.clone());
        }
    }
}

impl From<ContentFormData> for ContentPatch {
    /// A patch that replaces every field. A cleared featured image is sent as
    /// an empty string so the service removes it.
    fn from(data: ContentFormData) -> Self {
        Self {
            title: Some(data.title),
            body: Some(data.body),
            excerpt: Some(data.excerpt),
            featured_image: Some(data.featured_image.unwrap_or_default()),
            status: Some(data.status),
            tags: Some(data.tags),
            category: Some(data.category),
            seo: data.seo,
        }
    }
}

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

/// Working copy of a content item.
///
/// `id` is `None` until the first save creates the content item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentDraft {
    pub id: Option<ContentId>,
    pub fields: ContentFormData,
}

impl ContentDraft {
    /// An empty draft for a new content item.
    pub fn new() -> Self {
        Self::default()
    }

    /// A draft seeded from persisted content.
    pub fn from_content(content: &Content) -> Self {
        Self {
            id: Some(content.id.clone()),
            fields: content.form_data(),
        }
    }
}

// ---------------------------------------------------------------------------
// List projection and service responses
// ---------------------------------------------------------------------------

/// Read-only projection of a content item for list display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentListItem {
    pub id: ContentId,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    pub status: ContentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Timestamp>,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
}

impl ContentListItem {
    /// View count, treating a missing count as zero.
    pub fn view_count(&self) -> u64 {
        self.views.unwrap_or(0)
    }
}

/// One page of content returned by the content service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPage {
    #[serde(alias = "data")]
    pub items: Vec<ContentListItem>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
}

/// Result of a media upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaUpload {
    pub url: String,
}

/// A file handed to the repository client for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Traffic source counted in content analytics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referrer {
    pub source: String,
    pub count: u64,
}

/// Aggregate analytics for one content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentAnalytics {
    pub views: u64,
    pub unique_visitors: u64,
    /// Average time on page in seconds.
    pub avg_time_on_page: f64,
    #[serde(default)]
    pub referrers: Vec<Referrer>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

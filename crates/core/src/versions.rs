//! Content version records, the two-slot comparison selection, and
//! field-level change detection between two sets of form data.

use serde::{Deserialize, Serialize};

use crate::content::ContentFormData;
use crate::tags;
use crate::types::{Timestamp, VersionId};
use crate::validation::DraftField;

// ---------------------------------------------------------------------------
// Version records
// ---------------------------------------------------------------------------

/// Maximum number of versions selected for comparison at once.
pub const MAX_SELECTED_VERSIONS: usize = 2;

/// Kind of change a version made to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// A single field-level change recorded with a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
}

impl FieldChange {
    pub fn new(field: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }
}

/// The author who created a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: String,
    pub name: String,
}

/// Immutable historical record of a content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentVersion {
    pub id: VersionId,
    pub version_number: u32,
    pub created_at: Timestamp,
    pub created_by: AuthorRef,
    #[serde(default)]
    pub changes: Vec<FieldChange>,
}

/// A version together with the field values it recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentVersionDetail {
    #[serde(flatten)]
    pub version: ContentVersion,
    pub data: ContentFormData,
}

/// Order versions newest first (highest version number first).
pub fn sort_newest_first(versions: &mut [ContentVersion]) {
    versions.sort_by(|a, b| b.version_number.cmp(&a.version_number));
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Selection of up to two versions, kept in selection order.
///
/// Selecting a third version evicts the one selected longest ago.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionSelection {
    selected: Vec<VersionId>,
}

impl VersionSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle `version_id`: deselect it if selected, otherwise select it,
    /// sliding the two-slot window when full.
    pub fn toggle(&mut self, version_id: &str) {
        if let Some(pos) = self.selected.iter().position(|id| id == version_id) {
            self.selected.remove(pos);
            return;
        }
        if self.selected.len() >= MAX_SELECTED_VERSIONS {
            self.selected.remove(0);
        }
        self.selected.push(version_id.to_string());
    }

    pub fn contains(&self, version_id: &str) -> bool {
        self.selected.iter().any(|id| id == version_id)
    }

    /// Selected ids in selection order.
    pub fn selected(&self) -> &[VersionId] {
        &self.selected
    }

    /// The selected pair, once exactly two versions are selected.
    pub fn pair(&self) -> Option<(&str, &str)> {
        match self.selected.as_slice() {
            [a, b] => Some((a.as_str(), b.as_str())),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Result of comparing two versions: the changes the later one recorded
/// relative to the earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionComparison {
    pub earlier: ContentVersion,
    pub later: ContentVersion,
    pub changes: Vec<FieldChange>,
}

impl VersionComparison {
    /// Order two versions by version number and take the later one's
    /// recorded changes.
    pub fn between(a: &ContentVersion, b: &ContentVersion) -> Self {
        let (earlier, later) = if a.version_number <= b.version_number {
            (a, b)
        } else {
            (b, a)
        };
        Self {
            earlier: earlier.clone(),
            later: later.clone(),
            changes: later.changes.clone(),
        }
    }
}

/// Field-level changes needed to turn `old` into `new`.
pub fn diff_form_data(old: &ContentFormData, new: &ContentFormData) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    let mut text = |field: DraftField, before: &str, after: &str| {
        if let Some(kind) = classify(before.is_empty(), after.is_empty(), before == after) {
            changes.push(FieldChange::new(field.as_str(), kind));
        }
    };

    text(DraftField::Title, &old.title, &new.title);
    text(DraftField::Body, &old.body, &new.body);
    text(DraftField::Excerpt, &old.excerpt, &new.excerpt);
    text(
        DraftField::FeaturedImage,
        old.featured_image.as_deref().unwrap_or_default(),
        new.featured_image.as_deref().unwrap_or_default(),
    );
    text(DraftField::Status, old.status.as_str(), new.status.as_str());
    text(DraftField::Category, &old.category, &new.category);

    if let Some(kind) = classify(
        old.tags.is_empty(),
        new.tags.is_empty(),
        tags::same_tags(&old.tags, &new.tags),
    ) {
        changes.push(FieldChange::new(DraftField::Tags.as_str(), kind));
    }
    if let Some(kind) = classify(old.seo.is_none(), new.seo.is_none(), old.seo == new.seo) {
        changes.push(FieldChange::new(DraftField::Seo.as_str(), kind));
    }

    changes
}

fn classify(before_empty: bool, after_empty: bool, equal: bool) -> Option<ChangeKind> {
    if equal {
        return None;
    }
    Some(match (before_empty, after_empty) {
        (true, false) => ChangeKind::Added,
        (false, true) => ChangeKind::Removed,
        _ => ChangeKind::Modified,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

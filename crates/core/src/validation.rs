//! Field-level validation of a content draft.
//!
//! Validation runs locally before any save and never mutates the draft. The
//! result maps each failing field to a human-readable message; an empty map
//! means the draft may be submitted.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::content::ContentFormData;
use crate::tags::DEFAULT_MAX_TAGS;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum excerpt length in characters.
pub const MAX_EXCERPT_LENGTH: usize = 300;

pub const TITLE_REQUIRED: &str = "Title is required";
pub const BODY_REQUIRED: &str = "Content is required";
pub const EXCERPT_REQUIRED: &str = "Excerpt is required";
pub const EXCERPT_TOO_LONG: &str = "Excerpt should be 300 characters or less";
pub const CATEGORY_REQUIRED: &str = "Category is required";

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// Editable fields of a draft, used as validation error keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftField {
    Title,
    Body,
    Excerpt,
    FeaturedImage,
    Status,
    Category,
    Tags,
    Seo,
}

impl DraftField {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftField::Title => "title",
            DraftField::Body => "body",
            DraftField::Excerpt => "excerpt",
            DraftField::FeaturedImage => "featured_image",
            DraftField::Status => "status",
            DraftField::Category => "category",
            DraftField::Tags => "tags",
            DraftField::Seo => "seo",
        }
    }
}

impl std::fmt::Display for DraftField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors keyed by field.
pub type FieldErrors = BTreeMap<DraftField, String>;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Configurable limits applied by [`validate_draft`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRules {
    pub max_excerpt_length: usize,
    pub max_tags: usize,
    /// Whether category options exist. When they do, a category is required.
    pub has_category_options: bool,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            max_excerpt_length: MAX_EXCERPT_LENGTH,
            max_tags: DEFAULT_MAX_TAGS,
            has_category_options: false,
        }
    }
}

impl ValidationRules {
    pub fn with_category_options(mut self, categories: &[String]) -> Self {
        self.has_category_options = !categories.is_empty();
        self
    }
}

/// Validate a draft's fields against `rules`.
pub fn validate_draft(form: &ContentFormData, rules: &ValidationRules) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if form.title.trim().is_empty() {
        errors.insert(DraftField::Title, TITLE_REQUIRED.to_string());
    }

    if form.body.trim().is_empty() {
        errors.insert(DraftField::Body, BODY_REQUIRED.to_string());
    }

    if form.excerpt.trim().is_empty() {
        errors.insert(DraftField::Excerpt, EXCERPT_REQUIRED.to_string());
    } else if form.excerpt.chars().count() > rules.max_excerpt_length {
        let message = if rules.max_excerpt_length == MAX_EXCERPT_LENGTH {
            EXCERPT_TOO_LONG.to_string()
        } else {
            format!(
                "Excerpt should be {} characters or less",
                rules.max_excerpt_length
            )
        };
        errors.insert(DraftField::Excerpt, message);
    }

    if rules.has_category_options && form.category.trim().is_empty() {
        errors.insert(DraftField::Category, CATEGORY_REQUIRED.to_string());
    }

    if form.tags.len() > rules.max_tags {
        errors.insert(
            DraftField::Tags,
            format!("A maximum of {} tags is allowed", rules.max_tags),
        );
    }

    if let Some(seo) = &form.seo {
        let invalid = seo.invalid_fields();
        if !invalid.is_empty() {
            errors.insert(
                DraftField::Seo,
                format!("Invalid URL in SEO metadata: {}", invalid.join(", ")),
            );
        }
    }

    errors
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

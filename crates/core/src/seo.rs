//! SEO metadata block, auto-population from the draft, and the on-page
//! SEO checklist.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateUrl, ValidationError};

use crate::content::ContentFormData;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Recommended meta title length range in characters.
pub const META_TITLE_RANGE: (usize, usize) = (30, 60);

/// Recommended meta description length range in characters.
pub const META_DESCRIPTION_RANGE: (usize, usize) = (70, 160);

/// Number of checks contributing to the SEO score.
pub const SEO_CHECK_COUNT: u32 = 10;

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Twitter card layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TwitterCardType {
    Summary,
    #[default]
    SummaryLargeImage,
}

/// Structured SEO metadata attached to a content item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct SeoMetadata {
    pub meta_title: String,
    pub meta_description: String,
    pub focus_keyword: String,
    #[validate(custom(function = "optional_url"))]
    pub canonical_url: String,
    pub open_graph_title: String,
    pub open_graph_description: String,
    #[validate(custom(function = "optional_url"))]
    pub open_graph_image: String,
    pub twitter_card_type: TwitterCardType,
    pub twitter_title: String,
    pub twitter_description: String,
    #[validate(custom(function = "optional_url"))]
    pub twitter_image: String,
    pub no_index: bool,
    pub no_follow: bool,
}

/// Empty is allowed; anything else must parse as a URL.
fn optional_url(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.validate_url() {
        Ok(())
    } else {
        Err(ValidationError::new("url").with_message("must be a valid URL".into()))
    }
}

impl SeoMetadata {
    /// Names of the fields that failed validation, sorted.
    pub fn invalid_fields(&self) -> Vec<String> {
        match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => {
                let mut fields: Vec<String> = errors
                    .field_errors()
                    .keys()
                    .map(|k| k.to_string())
                    .collect();
                fields.sort();
                fields
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Auto-population
// ---------------------------------------------------------------------------

/// Fill empty SEO fields from the draft: titles from the title, descriptions
/// from the excerpt, images from the featured image. Fields that already hold
/// a value are left alone.
pub fn auto_populate(seo: &mut SeoMetadata, form: &ContentFormData) {
    let image = form.featured_image.as_deref().unwrap_or_default();

    fill(&mut seo.meta_title, &form.title);
    fill(&mut seo.meta_description, &form.excerpt);
    fill(&mut seo.open_graph_title, &form.title);
    fill(&mut seo.open_graph_description, &form.excerpt);
    fill(&mut seo.twitter_title, &form.title);
    fill(&mut seo.twitter_description, &form.excerpt);
    fill(&mut seo.open_graph_image, image);
    fill(&mut seo.twitter_image, image);
}

fn fill(target: &mut String, source: &str) {
    if target.is_empty() && !source.is_empty() {
        *target = source.to_string();
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Result of running the SEO checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeoReport {
    /// Percentage of passed checks, rounded down.
    pub score: u32,
    pub issues: Vec<String>,
}

/// Run the SEO checklist over the metadata and the draft it describes.
pub fn analyze(seo: &SeoMetadata, form: &ContentFormData) -> SeoReport {
    let mut issues = Vec::new();
    let mut passed = 0u32;

    let mut check = |ok: bool, issue: &str| {
        if ok {
            passed += 1;
        } else {
            issues.push(issue.to_string());
        }
    };

    if seo.meta_title.is_empty() {
        check(false, "Meta title is missing");
    } else {
        check(
            in_range(&seo.meta_title, META_TITLE_RANGE),
            "Meta title should be between 30-60 characters",
        );
    }

    if seo.meta_description.is_empty() {
        check(false, "Meta description is missing");
    } else {
        check(
            in_range(&seo.meta_description, META_DESCRIPTION_RANGE),
            "Meta description should be between 70-160 characters",
        );
    }

    if seo.focus_keyword.is_empty() {
        check(false, "Focus keyword is missing");
    } else {
        let keyword = seo.focus_keyword.to_lowercase();
        check(
            seo.meta_title.to_lowercase().contains(&keyword),
            "Focus keyword should appear in the title",
        );
        check(
            seo.meta_description.to_lowercase().contains(&keyword),
            "Focus keyword should appear in the meta description",
        );
        check(
            form.body.to_lowercase().contains(&keyword),
            "Focus keyword should appear in the content",
        );
    }

    check(
        !seo.open_graph_title.is_empty() && !seo.open_graph_description.is_empty(),
        "Open Graph title and description should be set for social sharing",
    );
    check(
        !seo.twitter_title.is_empty() && !seo.twitter_description.is_empty(),
        "Twitter Card title and description should be set for Twitter sharing",
    );
    check(
        !seo.open_graph_image.is_empty(),
        "Open Graph image is missing for social sharing",
    );
    check(
        !seo.twitter_image.is_empty(),
        "Twitter Card image is missing for Twitter sharing",
    );
    // A titled draft gets a canonical URL derived from its slug by the service.
    check(
        !seo.canonical_url.is_empty() || !form.title.is_empty(),
        "Canonical URL should be set for avoiding duplicate content issues",
    );

    SeoReport {
        score: passed * 100 / SEO_CHECK_COUNT,
        issues,
    }
}

fn in_range(text: &str, (min, max): (usize, usize)) -> bool {
    (min..=max).contains(&text.chars().count())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

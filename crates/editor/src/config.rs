use std::str::FromStr;

use h2space_core::media::MediaPolicy;
use h2space_core::tags::DEFAULT_MAX_TAGS;

use crate::autosave::AutosaveConfig;

/// Editor configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    pub autosave: AutosaveConfig,
    /// Maximum number of tags on one content item.
    pub max_tags: usize,
    /// Checks applied to uploads before they leave the editor.
    pub media: MediaPolicy,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave: AutosaveConfig::default(),
            max_tags: DEFAULT_MAX_TAGS,
            media: MediaPolicy::default(),
        }
    }
}

impl EditorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default |
    /// |--------------------------|---------|
    /// | `AUTOSAVE_INTERVAL_SECS` | `60`    |
    /// | `MAX_TAGS`               | `10`    |
    /// | `MEDIA_MAX_SIZE_MB`      | `5`     |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            autosave: AutosaveConfig::from_lookup(&lookup),
            max_tags: parse_or(&lookup, "MAX_TAGS", defaults.max_tags),
            media: MediaPolicy {
                max_size_mb: parse_or(&lookup, "MEDIA_MAX_SIZE_MB", defaults.media.max_size_mb),
                ..defaults.media
            },
        }
    }
}

/// Parse `key` with `lookup`, falling back to `default` when the variable is
/// unset or malformed.
pub(crate) fn parse_or<T>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Malformed configuration value, using default");
            default
        }),
        None => default,
    }
}

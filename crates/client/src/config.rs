/// Default base URL of the content service API.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3001/api";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Repository client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL, e.g. `http://localhost:3001/api`.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Bearer token for an already signed-in user.
    pub auth_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            auth_token: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var            | Default                       |
    /// |--------------------|-------------------------------|
    /// | `API_BASE_URL`     | `http://localhost:3001/api`   |
    /// | `API_TIMEOUT_SECS` | `30`                          |
    /// | `AUTH_TOKEN`       | unset                         |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup("API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.into());

        let request_timeout_secs = match lookup("API_TIMEOUT_SECS") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "API_TIMEOUT_SECS is not a valid u64, using default");
                DEFAULT_TIMEOUT_SECS
            }),
            None => DEFAULT_TIMEOUT_SECS,
        };

        let auth_token = lookup("AUTH_TOKEN").filter(|v| !v.trim().is_empty());

        Self {
            base_url,
            request_timeout_secs,
            auth_token,
        }
    }
}

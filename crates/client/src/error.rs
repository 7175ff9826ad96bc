use h2space_core::error::CoreError;

/// Errors from the content service HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The content service returned a non-2xx status code.
    #[error("Content service error ({status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The configured base URL cannot be used to build endpoint URLs.
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Translate into the domain error for an operation on `entity` `id`.
    ///
    /// 404 becomes `NotFound`, 401 becomes `Unauthorized`, any other status
    /// becomes `Api`, and transport failures become `Network`.
    pub fn into_core(self, entity: &'static str, id: &str) -> CoreError {
        match self {
            ApiError::Status { status: 404, .. } => CoreError::NotFound {
                entity,
                id: id.to_string(),
            },
            ApiError::Status { status: 401, body } => {
                CoreError::Unauthorized(error_message(&body).unwrap_or(body))
            }
            ApiError::Status { status, body } => CoreError::Api {
                status,
                message: error_message(&body).unwrap_or(body),
            },
            ApiError::Request(e) => CoreError::Network(e.to_string()),
            ApiError::InvalidUrl(msg) => CoreError::Internal(msg),
        }
    }
}

/// Pull the human-readable message out of a JSON error body such as
/// `{"error": "..."}` or `{"message": "..."}`.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .or_else(|| value.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

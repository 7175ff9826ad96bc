//! Local checks applied to a media file before it is uploaded.

use crate::error::CoreError;

/// Default accepted media pattern.
pub const DEFAULT_ACCEPT: &str = "image/*";

/// Default maximum upload size in megabytes.
pub const DEFAULT_MAX_SIZE_MB: u64 = 5;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Accepted media types and size limit for an upload field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPolicy {
    /// A MIME pattern such as `image/*` or an exact type such as `image/png`.
    pub accept: String,
    pub max_size_mb: u64,
}

impl Default for MediaPolicy {
    fn default() -> Self {
        Self {
            accept: DEFAULT_ACCEPT.to_string(),
            max_size_mb: DEFAULT_MAX_SIZE_MB,
        }
    }
}

impl MediaPolicy {
    /// Whether `mime_type` satisfies the accept pattern.
    pub fn accepts(&self, mime_type: &str) -> bool {
        match self.accept.strip_suffix('*') {
            Some(prefix) => mime_type.starts_with(prefix),
            None => mime_type == self.accept,
        }
    }

    /// Check a file's type and size.
    ///
    /// The MIME type is guessed from the file name. Returns the guessed type
    /// so the caller can send it with the upload.
    pub fn check(&self, file_name: &str, size_bytes: u64) -> Result<String, CoreError> {
        let mime_type = guess_mime_type(file_name);

        if !self.accepts(&mime_type) {
            return Err(CoreError::Validation(format!(
                "Invalid file type. Please upload {}",
                self.accept.replace('*', "files").replace('/', " ")
            )));
        }

        if size_bytes > self.max_size_mb * BYTES_PER_MB {
            return Err(CoreError::Validation(format!(
                "File too large. Maximum size is {}MB",
                self.max_size_mb
            )));
        }

        Ok(mime_type)
    }
}

/// Guess a MIME type from a file name, falling back to
/// `application/octet-stream`.
pub fn guess_mime_type(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn accepts_images_by_default() {
        let policy = MediaPolicy::default();
        assert_eq!(policy.check("cover.png", 1024).unwrap(), "image/png");
        assert_eq!(policy.check("photo.JPG", 1024).unwrap(), "image/jpeg");
    }

    #[test]
    fn rejects_non_image_types() {
        let err = MediaPolicy::default().check("notes.pdf", 10).unwrap_err();
        assert_matches!(
            err,
            CoreError::Validation(msg) if msg == "Invalid file type. Please upload image files"
        );
    }

    #[test]
    fn rejects_files_over_limit() {
        let policy = MediaPolicy::default();
        let err = policy.check("big.png", 5 * 1024 * 1024 + 1).unwrap_err();
        assert_matches!(
            err,
            CoreError::Validation(msg) if msg == "File too large. Maximum size is 5MB"
        );
        assert!(policy.check("edge.png", 5 * 1024 * 1024).is_ok());
    }

    #[test]
    fn exact_accept_pattern() {
        let policy = MediaPolicy {
            accept: "image/png".into(),
            max_size_mb: 1,
        };
        assert!(policy.accepts("image/png"));
        assert!(!policy.accepts("image/jpeg"));
    }

    #[test]
    fn unknown_extension_is_octet_stream() {
        assert_eq!(guess_mime_type("blob.zzzunknown"), "application/octet-stream");
    }
}

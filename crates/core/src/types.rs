/// Content identifiers are opaque strings assigned by the content service.
pub type ContentId = String;

/// Version identifiers are opaque strings assigned by the content service.
pub type VersionId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

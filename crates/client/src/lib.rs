//! HTTP/JSON client for the H2Space content service.
//!
//! [`ContentApi`] implements
//! [`ContentRepository`](h2space_core::repository::ContentRepository) over
//! `reqwest`, attaching the bearer token held by a shared [`SessionContext`].

pub mod api;
pub mod config;
pub mod error;
pub mod session;

pub use api::ContentApi;
pub use config::ClientConfig;
pub use error::ApiError;
pub use session::SessionContext;

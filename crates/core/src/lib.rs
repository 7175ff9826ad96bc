//! Domain model and pure rules for the H2Space content editor.
//!
//! This crate has no I/O. The repository client, the editor state machines,
//! and the command-line console all build on the types defined here.

pub mod confirmation;
pub mod content;
pub mod dashboard;
pub mod error;
pub mod listing;
pub mod media;
pub mod repository;
pub mod seo;
pub mod tags;
pub mod types;
pub mod validation;
pub mod versions;

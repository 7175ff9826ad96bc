//! H2Space editor event bus and notice board.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`EditorEvent`] -- what happened to a draft or content item.
//! - [`NoticeBoard`] -- dismissible notices derived from failure events,
//!   fed by [`run_notice_collector`].

pub mod bus;
pub mod notices;

pub use bus::{EditorEvent, EditorEventKind, EventBus};
pub use notices::{run_notice_collector, Notice, NoticeBoard};

//! Content draft lifecycle: in-memory drafts with validation and dirty
//! tracking, periodic autosave, version history with compare and restore,
//! scoped editing sessions, and the filtered content list.

pub mod autosave;
pub mod config;
pub mod draft;
pub mod listing;
pub mod session;
pub mod versions;

pub use autosave::{AutosaveConfig, AutosaveScheduler, TickOutcome};
pub use config::EditorConfig;
pub use draft::{DraftEdit, DraftStateManager, PersistedSnapshot, SaveError};
pub use listing::ContentListView;
pub use session::{EditingSession, SessionError};
pub use versions::VersionHistoryManager;

//! Authentication state shared by everything that talks to the content
//! service.

use std::sync::{Arc, PoisonError, RwLock};

/// Holds the bearer token for the current user.
///
/// Cloning is cheap and every clone observes the same state, so the session
/// can be handed to the repository client and to whatever owns sign-in.
/// The repository client clears it when the service answers 401.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    token: Arc<RwLock<Option<String>>>,
}

impl SessionContext {
    /// An anonymous session.
    pub fn new() -> Self {
        Self::default()
    }

    /// A session already holding `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::new();
        session.load(token);
        session
    }

    /// Store a freshly issued token. Blank tokens clear the session.
    pub fn load(&self, token: impl Into<String>) {
        let token = token.into();
        let mut guard = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(token).filter(|t| !t.trim().is_empty());
    }

    /// Forget the token.
    pub fn clear(&self) {
        let mut guard = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }

    pub fn bearer_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer_token().is_some()
    }
}

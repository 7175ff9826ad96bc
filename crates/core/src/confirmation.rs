//! Typed confirmation guarding destructive actions.

use crate::error::CoreError;

/// Literal phrase the user must type before a delete proceeds.
pub const DELETE_CONFIRMATION_PHRASE: &str = "delete";

/// Text typed into a confirmation field, compared exactly and
/// case-sensitively against a required phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    phrase: &'static str,
    typed: String,
}

impl Confirmation {
    /// A confirmation for deleting content.
    pub fn for_delete() -> Self {
        Self::new(DELETE_CONFIRMATION_PHRASE)
    }

    pub fn new(phrase: &'static str) -> Self {
        Self {
            phrase,
            typed: String::new(),
        }
    }

    /// Replace the typed text.
    pub fn input(&mut self, text: impl Into<String>) {
        self.typed = text.into();
    }

    /// Whether the guarded action may be enabled.
    pub fn is_satisfied(&self) -> bool {
        self.typed == self.phrase
    }

    pub fn check(&self) -> Result<(), CoreError> {
        if self.is_satisfied() {
            Ok(())
        } else {
            Err(CoreError::ConfirmationMismatch {
                expected: self.phrase,
            })
        }
    }
}

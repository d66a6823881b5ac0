//! Errors reported by navigations.

use std::fmt::Display;

/// An error a navigation guard or an async component factory failed with.
///
/// The error only carries a message, which keeps it cheap to clone and compare.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct GuardError {
    message: String,
}

impl GuardError {
    /// Create a new [`GuardError`].
    pub fn new(message: impl Display) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    /// Capture the message of any other error.
    pub fn from_error(err: &dyn std::error::Error) -> Self {
        Self::new(err)
    }

    /// Get the message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for GuardError {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for GuardError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

/// The reasons a navigation can end without committing its target.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    /// A guard aborted the navigation.
    #[error("navigation aborted")]
    Aborted,
    /// A guard or an async component failed.
    #[error("navigation failed: {0}")]
    Guard(#[from] GuardError),
    /// A guard panicked while running. The navigation neither committed nor reverted.
    #[error("a navigation guard panicked")]
    GuardPanicked,
}

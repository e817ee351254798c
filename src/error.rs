//! Error types for the quire library
//!
//! This module defines all error types that can occur during quire operations.
//! Errors are designed to be informative and actionable, providing clear context
//! about what went wrong.

use crate::types::LessonId;
use thiserror::Error;

/// Type alias for Results in the quire library
pub type Result<T> = std::result::Result<T, QuireError>;

/// Main error type for all quire operations
#[derive(Debug, Error)]
pub enum QuireError {
    /// Lesson not found in the page store
    #[error("Lesson not found: {0}")]
    LessonNotFound(LessonId),

    /// Revision not found in the version store
    #[error("Revision not found: {0}")]
    RevisionNotFound(String),

    /// Parent revision referenced during branching does not exist
    #[error("Parent revision not found: {0}")]
    ParentRevisionNotFound(String),

    /// No suggestion recorded for the given lesson
    #[error("No suggestion found for lesson {0}")]
    SuggestionNotFound(LessonId),

    /// A revert was requested before any prior-content snapshot was captured
    #[error("No prior content snapshot available for lesson {0}")]
    SnapshotUnavailable(LessonId),

    /// Missing or malformed caller input; surfaced before any partial work
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The generation collaborator failed; original detail is preserved
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Store write failure; mid-reconciliation writes are not rolled back
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Invalid builder/runtime configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Errors during JSON serialization/deserialization
    ///
    /// Not raised by the in-memory stores; the `From` conversion exists
    /// for host-side store implementations that persist the serde types
    /// as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl QuireError {
    /// Create a persistence error with a custom message
    pub fn persistence(msg: impl Into<String>) -> Self {
        QuireError::Persistence(msg.into())
    }

    /// Create a generation error with a custom message
    pub fn generation(msg: impl Into<String>) -> Self {
        QuireError::Generation(msg.into())
    }

    /// Create an invalid-input error with a custom message
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        QuireError::InvalidInput(msg.into())
    }

    /// Create an internal error with a custom message
    pub fn internal(msg: impl Into<String>) -> Self {
        QuireError::Internal(msg.into())
    }

    /// Check if this error means a referenced entity is missing
    ///
    /// Not-found errors are surfaced to the caller without retry; nothing
    /// was written before they were raised.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            QuireError::LessonNotFound(_)
                | QuireError::RevisionNotFound(_)
                | QuireError::ParentRevisionNotFound(_)
                | QuireError::SuggestionNotFound(_)
                | QuireError::SnapshotUnavailable(_)
        )
    }

    /// Check if re-invoking the failed operation is safe
    ///
    /// Generation is idempotent once a suggestion has cached content, so a
    /// failed generation call may simply be issued again by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, QuireError::Generation(_))
    }
}

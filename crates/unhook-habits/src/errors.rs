//! Habit store error types.

use unhook_safety::ValidationError;
use unhook_storage::StorageError;

/// Onboarding input rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    /// Habit kind `other` needs a custom name.
    #[error("a custom habit name is required for kind `other`")]
    MissingCustomName,

    /// Only kind `other` carries a custom name.
    #[error("a custom habit name is only allowed for kind `other`")]
    UnexpectedCustomName,

    /// Custom name failed validation.
    #[error("invalid custom habit name: {0}")]
    InvalidCustomName(ValidationError),

    /// Display name failed validation.
    #[error("invalid display name: {0}")]
    InvalidDisplayName(ValidationError),
}

/// Journal submission dropped before creation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("journal entry rejected: {0}")]
pub struct JournalRejection(#[from] pub ValidationError);

/// Snapshot write failure.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Underlying key/value store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// State could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_error_display() {
        assert_eq!(
            ProfileError::MissingCustomName.to_string(),
            "a custom habit name is required for kind `other`"
        );
        assert_eq!(
            ProfileError::UnexpectedCustomName.to_string(),
            "a custom habit name is only allowed for kind `other`"
        );
        assert_eq!(
            ProfileError::InvalidDisplayName(ValidationError::Empty).to_string(),
            "invalid display name: content cannot be empty"
        );
    }

    #[test]
    fn journal_rejection_from_validation() {
        let err: JournalRejection = ValidationError::TooLong { max: 5000 }.into();
        assert_eq!(
            err.to_string(),
            "journal entry rejected: content must be at most 5000 characters"
        );
        assert_eq!(err.0, ValidationError::TooLong { max: 5000 });
    }
}

//! Storage error types.

/// Errors from a key/value or secret backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key cannot be mapped to a storage slot.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Backend-specific failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Errors from the record cipher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CipherError {
    /// Value does not carry the encryption prefix.
    #[error("value is not an encrypted record")]
    MissingPrefix,

    /// Payload is not valid base64.
    #[error("invalid base64 payload")]
    InvalidEncoding,

    /// Decrypted bytes are not UTF-8.
    #[error("decrypted payload is not valid UTF-8")]
    InvalidUtf8,

    /// Key has no bytes.
    #[error("encryption key is empty")]
    EmptyKey,
}

/// Result alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_key_display() {
        let err = StorageError::InvalidKey("../etc".to_string());
        assert_eq!(err.to_string(), "invalid storage key: \"../etc\"");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: StorageError = io.into();
        assert!(matches!(err, StorageError::Io(_)));
        assert_eq!(err.to_string(), "I/O error: denied");
    }

    #[test]
    fn cipher_error_display() {
        assert_eq!(
            CipherError::MissingPrefix.to_string(),
            "value is not an encrypted record"
        );
        assert_eq!(CipherError::InvalidEncoding.to_string(), "invalid base64 payload");
    }
}

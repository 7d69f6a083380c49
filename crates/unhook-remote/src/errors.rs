//! Remote collaborator error types.

/// Errors from the AI coach endpoint.
///
/// [`CoachError::PremiumRequired`] and [`CoachError::RateLimited`] are
/// contract-level signals callers branch on; everything else is a generic
/// failure.
#[derive(Debug, thiserror::Error)]
pub enum CoachError {
    /// The account needs a premium subscription for coach access.
    #[error("premium subscription required")]
    PremiumRequired,

    /// Too many coach requests.
    #[error("coach rate limit exceeded")]
    RateLimited,

    /// Transport failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status without a recognized error code.
    #[error("coach returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body or error code.
        message: String,
    },

    /// Response body could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Success response without a reply.
    #[error("coach response contained no reply")]
    EmptyReply,
}

/// Errors from the remote profile mirror.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status.
    #[error("profile upsert returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

//! Markup stripping and per-kind length/format validation.
//!
//! Every free-text input is reduced to plain text before anything else looks
//! at it. Validation never fails hard: callers get a [`ValidationResult`]
//! and decide whether to reject or accept the (possibly truncated) text.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

fn static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static sanitizer pattern must compile")
}

/// Substitutions applied in order; each match is replaced with nothing.
static MARKUP_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // Executable or styling blocks, content included
        static_regex(r"(?is)<script\b[^>]*>.*?</script\s*>"),
        static_regex(r"(?is)<style\b[^>]*>.*?</style\s*>"),
        static_regex(r"(?is)<iframe\b[^>]*>.*?</iframe\s*>"),
        // Inline event handlers: onclick="..." / onerror='...' / onload=x
        static_regex(r#"(?i)\son\w+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#),
        // Dangerous URI schemes
        static_regex(r"(?i)javascript\s*:"),
        static_regex(r"(?i)data\s*:\s*text/html"),
        // Whatever markup is left
        static_regex(r"<[^>]*>"),
    ]
});

static DISPLAY_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| static_regex(r"^[\p{L}\p{M}\p{N} .'\-]+$"));

static EMAIL_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| static_regex(r"^[^\s@]+@[^\s@]+\.[^\s@]+$"));

/// Class of user-generated text, each with its own bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Community post.
    Post,
    /// Reply to a community post.
    Reply,
    /// Direct or coach message.
    Message,
    /// Private journal entry.
    Journal,
    /// Public display name.
    DisplayName,
    /// Short label such as a coping-strategy title or custom habit name.
    Title,
    /// Account e-mail address.
    Email,
}

impl ContentKind {
    /// Maximum length in characters.
    pub fn max_len(self) -> usize {
        match self {
            Self::Post | Self::Message => 1000,
            Self::Reply => 500,
            Self::Journal => 5000,
            Self::DisplayName => 50,
            Self::Title => 100,
            Self::Email => 254,
        }
    }

    /// Minimum length in characters (after stripping).
    pub fn min_len(self) -> usize {
        match self {
            Self::Post => 3,
            _ => 1,
        }
    }
}

/// Why a submission failed validation.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum ValidationError {
    /// Nothing left after stripping markup and whitespace.
    #[error("content cannot be empty")]
    Empty,
    /// Shorter than the kind's minimum.
    #[error("content must be at least {min} characters")]
    TooShort {
        /// Required minimum.
        min: usize,
    },
    /// Longer than the kind's maximum.
    #[error("content must be at most {max} characters")]
    TooLong {
        /// Allowed maximum.
        max: usize,
    },
    /// Display name contains characters outside the allowed set.
    #[error("name may only contain letters, digits, spaces, dots, hyphens and apostrophes")]
    InvalidCharacters,
    /// Not an e-mail address.
    #[error("invalid email address")]
    InvalidEmail,
}

/// Outcome of [`sanitize_and_validate`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Whether the submission may be accepted as-is.
    pub is_valid: bool,
    /// Plain text, truncated to the kind's maximum when over-length.
    pub sanitized: String,
    /// Failure reason when `is_valid` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ValidationError>,
}

impl ValidationResult {
    fn ok(sanitized: String) -> Self {
        Self {
            is_valid: true,
            sanitized,
            error: None,
        }
    }

    fn invalid(sanitized: String, error: ValidationError) -> Self {
        Self {
            is_valid: false,
            sanitized,
            error: Some(error),
        }
    }

    /// Convert into a `Result`, discarding the truncated text on failure.
    pub fn into_result(self) -> Result<String, ValidationError> {
        match self.error {
            None => Ok(self.sanitized),
            Some(err) => Err(err),
        }
    }
}

/// Strip scripts, styles, iframes, event handlers, dangerous URIs and all
/// remaining tags, then trim.
pub fn sanitize_markup(raw: &str) -> String {
    let mut text = raw.to_owned();
    for pattern in MARKUP_PATTERNS.iter() {
        if pattern.is_match(&text) {
            text = pattern.replace_all(&text, "").into_owned();
        }
    }
    text.trim().to_owned()
}

/// Sanitize `raw` and check it against the bounds of `kind`.
pub fn sanitize_and_validate(kind: ContentKind, raw: &str) -> ValidationResult {
    let sanitized = sanitize_markup(raw);
    let len = sanitized.chars().count();

    if len == 0 {
        return ValidationResult::invalid(sanitized, ValidationError::Empty);
    }
    if len < kind.min_len() {
        return ValidationResult::invalid(
            sanitized,
            ValidationError::TooShort {
                min: kind.min_len(),
            },
        );
    }
    let max = kind.max_len();
    if len > max {
        let truncated: String = sanitized.chars().take(max).collect();
        return ValidationResult::invalid(truncated, ValidationError::TooLong { max });
    }

    match kind {
        ContentKind::DisplayName if !DISPLAY_NAME_CHARS.is_match(&sanitized) => {
            ValidationResult::invalid(sanitized, ValidationError::InvalidCharacters)
        }
        ContentKind::Email if !EMAIL_FORMAT.is_match(&sanitized) => {
            ValidationResult::invalid(sanitized, ValidationError::InvalidEmail)
        }
        _ => ValidationResult::ok(sanitized),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

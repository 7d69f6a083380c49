//! Profanity, slur and threat pre-filter for Turkish and English text.
//!
//! The filter is deterministic and client-side. It is not a moderation
//! system: it flags blocked terms and threat phrasing and produces a redacted
//! copy, and callers decide whether to reject (community writes) or store the
//! redacted text (journal, coach chat).
//!
//! Pipeline:
//! 1. Normalize: lowercase, fold leetspeak, collapse runs of 3+ identical
//!    characters to 2, drop separator punctuation.
//! 2. Blocked terms: each whitespace token (reduced to letters and digits) is
//!    checked for containment of a blocked word; the whole normalized text is
//!    checked for blocked multi-word phrases.
//! 3. Threats: regexes run against both the original and normalized text.
//! 4. Redaction: flagged terms are masked in the original text.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Replacement for every redacted occurrence.
pub const REDACTION_MASK: &str = "***";

/// Characters removed during normalization.
const SEPARATORS: &[char] = &['.', '_', '-', '*', '#', '~'];

/// Single-word blocked terms (substring match against normalized tokens).
const BLOCKED_WORDS: &[&str] = &[
    // Turkish
    "aptal",
    "salak",
    "gerizekalı",
    "gerizekali",
    "ahmak",
    "dangalak",
    "şerefsiz",
    "serefsiz",
    "orospu",
    "yavşak",
    "yavsak",
    "pezevenk",
    "kahpe",
    "siktir",
    "sikerim",
    "ibne",
    "kaltak",
    "hıyarağası",
    // English
    "fuck",
    "shit",
    "bitch",
    "bastard",
    "asshole",
    "dickhead",
    "motherfucker",
    "cunt",
    "whore",
    "slut",
    "retard",
    "faggot",
    "idiot",
    "moron",
];

/// Multi-word blocked phrases (containment in the full normalized text).
const BLOCKED_PHRASES: &[&str] = &[
    "orospu çocuğu",
    "orospu cocugu",
    "amına koyayım",
    "amina koyayim",
    "ananı sikeyim",
    "anani sikeyim",
    "son of a bitch",
    "piece of shit",
    "go to hell",
];

/// Threat and self-harm incitement patterns.
const THREAT_PATTERNS: &[&str] = &[
    // English
    r"(?i)\b(?:i\s*(?:will|'ll|’ll)|i\s*am\s+going\s+to|i'?m\s+going\s+to|i'?m\s+gonna)\s+(?:kill|murder|stab|shoot|hurt)\s+(?:you|u|ya)\b",
    r"(?i)\bi\s*(?:will|'ll|’ll)\s+find\s+(?:you|u|where\s+you\s+live)\b",
    r"(?i)\b(?:kill|hang|hurt)\s+your\s*self\b",
    r"(?i)\bkys\b",
    r"(?i)\byou\s+(?:should|deserve\s+to)\s+die\b",
    // Turkish
    r"(?i)\bseni\s+(?:bulaca[gğ][ıi]m|bulurum)\b",
    r"(?i)\bseni\s+[öo]ld[üu]r(?:ece[gğ]im|[üu]r[üu]m)\b",
    r"(?i)\b[öo]ld[üu]r[üu]r[üu]m\b",
    r"(?i)\bgebert(?:ece[gğ]im|irim)\b",
    r"(?i)\bkendini\s+[öo]ld[üu]r\b",
    r"(?i)\bintihar\s+et\b",
    r"(?i)\bgit\s+[öo]l\b",
];

static SHARED: LazyLock<Arc<ContentFilter>> = LazyLock::new(|| Arc::new(ContentFilter::new()));

/// Filter verdict for one piece of text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterResult {
    /// No blocked terms and no threat.
    pub is_safe: bool,
    /// Blocked terms found, deduplicated, in first-seen order.
    pub flagged_terms: Vec<String>,
    /// Original text with every flagged term masked.
    pub cleaned: String,
    /// A threat pattern matched.
    pub has_threat: bool,
}

impl FilterResult {
    /// Redacted text when unsafe, the original otherwise.
    pub fn safe_text(self, original: &str) -> String {
        if self.is_safe {
            original.to_owned()
        } else {
            self.cleaned
        }
    }
}

/// Blocklist and threat-pattern matcher.
#[derive(Clone, Debug)]
pub struct ContentFilter {
    words: Vec<String>,
    phrases: Vec<String>,
    threats: Vec<Regex>,
}

impl ContentFilter {
    /// Build the filter with the built-in lists.
    pub fn new() -> Self {
        let threats = THREAT_PATTERNS
            .iter()
            .filter_map(|p| match Regex::new(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::error!(pattern = *p, error = %e, "invalid threat pattern skipped");
                    None
                }
            })
            .collect();

        Self {
            words: BLOCKED_WORDS.iter().map(|w| (*w).to_owned()).collect(),
            phrases: BLOCKED_PHRASES.iter().map(|p| normalize(p)).collect(),
            threats,
        }
    }

    /// Built-in filter shared process-wide.
    pub fn shared() -> Arc<Self> {
        Arc::clone(&SHARED)
    }

    /// Built-in lists plus configured terms. Terms containing whitespace are
    /// treated as phrases.
    #[must_use]
    pub fn with_extra_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for term in terms {
            let term = term.as_ref().trim().to_lowercase();
            if term.is_empty() {
                continue;
            }
            if term.contains(char::is_whitespace) {
                self.phrases.push(normalize(&term));
            } else {
                self.words.push(term);
            }
        }
        self
    }

    /// Scan `text` and produce a verdict plus redacted copy.
    pub fn filter(&self, text: &str) -> FilterResult {
        if text.trim().is_empty() {
            return FilterResult {
                is_safe: true,
                flagged_terms: Vec::new(),
                cleaned: text.to_owned(),
                has_threat: false,
            };
        }

        let normalized = normalize(text);
        let mut flagged: Vec<String> = Vec::new();
        let mut flag = |term: &str| {
            if !flagged.iter().any(|f| f == term) {
                flagged.push(term.to_owned());
            }
        };

        for token in normalized.split_whitespace() {
            let stripped = strip_token(token);
            if stripped.is_empty() {
                continue;
            }
            for word in &self.words {
                if stripped.contains(word.as_str()) {
                    flag(word.as_str());
                }
            }
        }
        for phrase in &self.phrases {
            if normalized.contains(phrase.as_str()) {
                flag(phrase.as_str());
            }
        }

        let has_threat = self
            .threats
            .iter()
            .any(|re| re.is_match(text) || re.is_match(&normalized));

        let cleaned = redact(text, &flagged);
        let is_safe = flagged.is_empty() && !has_threat;
        if !is_safe {
            debug!(flagged = flagged.len(), has_threat, "content flagged");
        }

        FilterResult {
            is_safe,
            flagged_terms: flagged,
            cleaned,
            has_threat,
        }
    }
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a leetspeak substitute back to its letter.
fn fold_leet(c: char) -> char {
    match c {
        '@' | '4' => 'a',
        '3' => 'e',
        '1' | '!' => 'i',
        '0' => 'o',
        '5' | '$' => 's',
        '7' | '+' => 't',
        other => other,
    }
}

/// Lowercase, fold leetspeak, collapse long repeats and drop separators.
pub fn normalize(text: &str) -> String {
    let folded = text.to_lowercase().chars().map(fold_leet).collect::<String>();

    let mut collapsed = String::with_capacity(folded.len());
    let mut prev: Option<char> = None;
    let mut run = 0usize;
    for c in folded.chars() {
        if Some(c) == prev {
            run += 1;
        } else {
            prev = Some(c);
            run = 1;
        }
        if run <= 2 {
            collapsed.push(c);
        }
    }

    collapsed.chars().filter(|c| !SEPARATORS.contains(c)).collect()
}

/// Keep ASCII letters/digits and Turkish letters only.
fn strip_token(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "çğıöşü".contains(*c))
        .collect()
}

/// Mask every case-insensitive literal occurrence of each term.
fn redact(text: &str, terms: &[String]) -> String {
    let mut cleaned = text.to_owned();
    for term in terms {
        let Ok(re) = Regex::new(&format!("(?i){}", regex::escape(term))) else {
            continue;
        };
        cleaned = re.replace_all(&cleaned, REDACTION_MASK).into_owned();
    }
    cleaned
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(text: &str) -> FilterResult {
        ContentFilter::new().filter(text)
    }

    #[test]
    fn clean_text_is_safe() {
        let result = filter("Day 12 without a cigarette, proud of myself");
        assert!(result.is_safe);
        assert!(result.flagged_terms.is_empty());
        assert_eq!(result.cleaned, "Day 12 without a cigarette, proud of myself");
    }

    #[test]
    fn empty_string_is_safe() {
        let result = filter("");
        assert!(result.is_safe);
        assert_eq!(result.cleaned, "");
        assert!(!result.has_threat);
    }

    #[test]
    fn turkish_insults_are_redacted() {
        let result = filter("Seni aptal gerizekalı!");
        assert!(!result.is_safe);
        assert_eq!(result.flagged_terms, vec!["aptal", "gerizekalı"]);
        assert_eq!(result.cleaned, "Seni *** ***!");
    }

    #[test]
    fn leetspeak_is_folded() {
        let leet = filter("$h1t");
        let plain = filter("shit");
        assert!(!leet.is_safe);
        assert!(!plain.is_safe);
        assert_eq!(leet.flagged_terms, plain.flagged_terms);
        assert_eq!(leet.flagged_terms, vec!["shit"]);
    }

    #[test]
    fn separators_are_dropped() {
        let result = filter("you are an i.d.i.o.t");
        assert_eq!(result.flagged_terms, vec!["idiot"]);
        assert!(!filter("s_h-i*t").is_safe);
    }

    #[test]
    fn case_insensitive_redaction_keeps_surroundings() {
        let result = filter("What a MORON, honestly.");
        assert_eq!(result.flagged_terms, vec!["moron"]);
        assert_eq!(result.cleaned, "What a ***, honestly.");
    }

    #[test]
    fn duplicate_terms_reported_once() {
        let result = filter("idiot idiot IDIOT");
        assert_eq!(result.flagged_terms, vec!["idiot"]);
        assert_eq!(result.cleaned, "*** *** ***");
    }

    #[test]
    fn blocked_phrase_detected() {
        let result = filter("you piece of shit");
        assert!(result.flagged_terms.contains(&"piece of shit".to_string()));
        assert!(!result.is_safe);
    }

    #[test]
    fn turkish_threat_without_blocked_words() {
        let result = filter("Seni bulurum ve öldürürüm");
        assert!(result.has_threat);
        assert!(result.flagged_terms.is_empty());
        assert!(!result.is_safe);
        // Threats are not redacted
        assert_eq!(result.cleaned, "Seni bulurum ve öldürürüm");
    }

    #[test]
    fn english_threats() {
        assert!(filter("I will find you").has_threat);
        assert!(filter("i'll kill you tomorrow").has_threat);
        assert!(filter("just kys").has_threat);
        assert!(filter("go kill yourself").has_threat);
        assert!(!filter("I will find a way to quit").has_threat);
    }

    #[test]
    fn threat_detected_through_leetspeak() {
        assert!(filter("k1ll y0urself").has_threat);
    }

    #[test]
    fn extra_terms_extend_lists() {
        let filter = ContentFilter::new().with_extra_terms(["vape shop", "spamword", "  "]);
        let result = filter.filter("visit my Vape Shop for SPAMWORD deals");
        assert_eq!(result.flagged_terms, vec!["spamword", "vape shop"]);
        assert_eq!(result.cleaned, "visit my *** for *** deals");
    }

    #[test]
    fn normalize_rules() {
        assert_eq!(normalize("H3LL0"), "hello");
        assert_eq!(normalize("sooooo"), "soo");
        assert_eq!(normalize("a.b_c-d*e#f~g"), "abcdefg");
        assert_eq!(normalize("@+7"), "att");
    }

    #[test]
    fn safe_text_prefers_redaction() {
        let unsafe_result = filter("aptal");
        assert_eq!(unsafe_result.safe_text("aptal"), "***");
        let safe_result = filter("merhaba");
        assert_eq!(safe_result.safe_text("merhaba"), "merhaba");
    }

    #[test]
    fn shared_filter_is_reused() {
        let a = ContentFilter::shared();
        let b = ContentFilter::shared();
        assert!(Arc::ptr_eq(&a, &b));
    }
}

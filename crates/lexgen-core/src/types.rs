//! Core types for lexgen
//!
//! Defines the fundamental types for the pipeline:
//! - Generation requests and difficulty tiers
//! - Candidates produced by the generator
//! - Validation verdicts
//! - Success payloads returned to callers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Unique pipeline run identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Ulid);

impl RequestId {
    /// Generate new request ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Difficulty tier for quiz questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Everyday vocabulary
    Easy,
    /// Less common vocabulary
    Medium,
    /// Rare or advanced vocabulary
    Hard,
}

impl Tier {
    /// All tiers in ascending difficulty
    pub const ALL: [Tier; 3] = [Tier::Easy, Tier::Medium, Tier::Hard];

    /// Lower-case name used in prompts and config keys
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Easy => "easy",
            Tier::Medium => "medium",
            Tier::Hard => "hard",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Tier::Easy),
            "medium" => Ok(Tier::Medium),
            "hard" => Ok(Tier::Hard),
            other => Err(UnknownTier(other.to_string())),
        }
    }
}

/// Tier name that did not parse
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tier: {0:?} (expected easy, medium or hard)")]
pub struct UnknownTier(pub String);

/// Constraint a single pipeline invocation generates against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GenerationRequest {
    /// Word starting with the given letter
    ByStartingLetter(char),
    /// Quiz question of the given difficulty
    ByTier(Tier),
    /// Vocabulary word related to a topic
    ByTopic(String),
}

impl GenerationRequest {
    /// Short label for logs
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::ByStartingLetter(letter) => format!("letter:{letter}"),
            Self::ByTier(tier) => format!("tier:{tier}"),
            Self::ByTopic(topic) => format!("topic:{topic}"),
        }
    }
}

/// Unvalidated generator output
///
/// `options` is present only for question-shaped candidates and always
/// holds exactly four entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Headword as produced by the generator
    pub text: String,
    /// Four answer options (question mode)
    pub options: Option<[String; 4]>,
    /// Correct option (question mode)
    pub correct_answer: Option<String>,
}

impl Candidate {
    /// Single-word candidate
    #[inline]
    #[must_use]
    pub fn word(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: None,
            correct_answer: None,
        }
    }

    /// Question candidate
    #[inline]
    #[must_use]
    pub fn question(
        text: impl Into<String>,
        options: [String; 4],
        correct_answer: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            options: Some(options),
            correct_answer: Some(correct_answer.into()),
        }
    }

    /// Normalized headword used for validation and history
    #[inline]
    #[must_use]
    pub fn headword(&self) -> String {
        normalize_word(&self.text)
    }
}

/// Why the validator rejected a word
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Dictionary has no entry
    NotFound,
    /// Entry exists but carries no definitions
    NoDefinitions,
    /// Dictionary call failed
    LookupFailed(String),
    /// Translation call failed
    TranslationFailed(String),
}

impl Rejection {
    /// Whether the rejection came from an unavailable collaborator
    #[inline]
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::LookupFailed(_) | Self::TranslationFailed(_))
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("not found in dictionary"),
            Self::NoDefinitions => f.write_str("no definitions"),
            Self::LookupFailed(e) => write!(f, "dictionary lookup failed: {e}"),
            Self::TranslationFailed(e) => write!(f, "translation failed: {e}"),
        }
    }
}

/// Validity verdict plus definition payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Whether the word is a real, definable word
    pub valid: bool,
    /// First dictionary definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    /// Translated first definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_definition: Option<String>,
    #[serde(skip)]
    rejection: Option<Rejection>,
}

impl ValidationResult {
    /// Accepted word
    #[inline]
    #[must_use]
    pub fn accepted(definition: impl Into<String>, translated_definition: Option<String>) -> Self {
        Self {
            valid: true,
            definition: Some(definition.into()),
            translated_definition,
            rejection: None,
        }
    }

    /// Rejected word; definitions are always absent
    #[inline]
    #[must_use]
    pub fn rejected(reason: Rejection) -> Self {
        Self {
            valid: false,
            definition: None,
            translated_definition: None,
            rejection: Some(reason),
        }
    }

    /// Rejection reason, if rejected
    #[inline]
    #[must_use]
    pub fn rejection(&self) -> Option<&Rejection> {
        self.rejection.as_ref()
    }
}

/// Success payload of a generation flavor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedItem {
    /// Committed headword
    pub word: String,
    /// First dictionary definition (enriched flavors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    /// Translated definition (enriched flavors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_definition: Option<String>,
    /// Four answer options (question flavor)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<[String; 4]>,
    /// Correct option (question flavor)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

impl GeneratedItem {
    /// Assemble payload from a committed candidate and its verdict
    ///
    /// The word is reported as generated; history holds the normalized form.
    #[must_use]
    pub fn assemble(candidate: Candidate, validation: ValidationResult) -> Self {
        Self {
            word: candidate.text,
            definition: validation.definition,
            translated_definition: validation.translated_definition,
            options: candidate.options,
            correct_answer: candidate.correct_answer,
        }
    }

    /// Drop definition fields for flavors that return the bare word
    #[inline]
    #[must_use]
    pub fn without_definitions(mut self) -> Self {
        self.definition = None;
        self.translated_definition = None;
        self
    }
}

/// Translation payload of the translate flavor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    /// Source word
    pub word: String,
    /// Target language code
    pub target_language: String,
    /// Translated text, verbatim from the service
    pub translated: String,
}

/// Lower-case and keep alphabetic characters only
#[must_use]
pub fn normalize_word(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect()
}

//! Error types for lexgen Core
//!
//! Two layers:
//! - `AttemptFailure`: recovered inside the retry loop, never surfaced
//! - `PipelineError`: what a caller of a flavor can observe
//!
//! Collaborator adapters report `ServiceError`.

/// Failure of an outbound collaborator call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// Transport-level failure (connect, TLS, reset)
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status
    #[error("unexpected status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Body excerpt or reason
        message: String,
    },

    /// Response body did not have the expected shape
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    /// Call exceeded its timeout
    #[error("call timed out after {timeout_ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// Collaborator not configured (missing key, bad URL)
    #[error("not configured: {0}")]
    NotConfigured(String),
}

/// Generator output that does not match the expected pattern
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Response was empty after trimming
    #[error("empty response")]
    Empty,

    /// No alphabetic characters left after cleanup
    #[error("no word in response: {0:?}")]
    NoWord(String),

    /// A labeled field is missing
    #[error("missing field {field:?} in response")]
    MissingField {
        /// Field label
        field: &'static str,
    },

    /// Option list does not have exactly four entries
    #[error("expected 4 options, found {found}")]
    OptionCount {
        /// Number of options parsed
        found: usize,
    },
}

/// Retryable failure of a single attempt
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttemptFailure {
    /// Outbound generation call failed
    #[error("generator unavailable: {0}")]
    GeneratorUnavailable(#[from] ServiceError),

    /// Generator response did not parse
    #[error("malformed candidate: {0}")]
    MalformedCandidate(#[from] ParseError),

    /// Dictionary or translation call failed
    #[error("validation unavailable for {word:?}: {reason}")]
    ValidationUnavailable {
        /// Headword being validated
        word: String,
        /// Failure description
        reason: String,
    },

    /// Dictionary does not know the word
    #[error("invalid word {word:?}: {reason}")]
    InvalidWord {
        /// Headword being validated
        word: String,
        /// Rejection description
        reason: String,
    },

    /// Valid but already in history
    #[error("duplicate candidate {0:?}")]
    DuplicateCandidate(String),
}

impl AttemptFailure {
    /// Short kind label for logs and stats
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GeneratorUnavailable(_) => "generator_unavailable",
            Self::MalformedCandidate(_) => "malformed_candidate",
            Self::ValidationUnavailable { .. } => "validation_unavailable",
            Self::InvalidWord { .. } => "invalid_word",
            Self::DuplicateCandidate(_) => "duplicate_candidate",
        }
    }
}

/// Error surfaced to callers of a flavor
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// Attempt bound reached with no committed item
    #[error("retries exhausted after {attempts} attempts ({flavor})")]
    RetriesExhausted {
        /// Flavor that failed
        flavor: String,
        /// Attempts made
        attempts: u32,
        /// Last attempt failure, if any attempt ran
        last_failure: Option<AttemptFailure>,
    },

    /// Single-flight guard already held
    #[error("pipeline busy: {0} generation refused while another is in flight")]
    PipelineBusy(String),

    /// Request-scoped timeout elapsed
    #[error("operation timed out after {duration_secs}s")]
    Timeout {
        /// Timeout in seconds
        duration_secs: u64,
    },

    /// Direct translation failed
    #[error("translation unavailable: {0}")]
    TranslationUnavailable(ServiceError),

    /// Request constraint rejected before running
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Unexpected internal failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Short category message for user-visible responses
    #[inline]
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::RetriesExhausted { .. } => "Failed to generate a unique item",
            Self::PipelineBusy(_) => "Generation already in progress, try again shortly",
            Self::Timeout { .. } => "Generation timed out",
            Self::TranslationUnavailable(_) => "Translation service unavailable",
            Self::InvalidRequest(_) => "Invalid request",
            Self::Internal(_) => "Internal error",
        }
    }

    /// Whether the caller should retry the whole request later
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RetriesExhausted { .. }
                | Self::PipelineBusy(_)
                | Self::Timeout { .. }
                | Self::TranslationUnavailable(_)
        )
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Path that failed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// TOML did not deserialize
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value out of range
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Config key
        key: String,
        /// Why it was rejected
        reason: String,
    },
}

//! Candidate generator
//!
//! One best-effort call to the generative source per `generate`, followed by
//! a parse step that returns a typed result. Retry policy lives in
//! `retry::RetryController`.

use crate::error::{AttemptFailure, ParseError, ServiceError};
use crate::profile::{CandidateShape, PipelineProfile};
use crate::types::{normalize_word, Candidate, GenerationRequest};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

static WORD_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Word:\s*([^\n,]+)").expect("static regex"));
static OPTIONS_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Options:\s*\[?([^\]\n]+)").expect("static regex"));
static ANSWER_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Correct Answer:\s*([^\n,]+)").expect("static regex"));
static OPTION_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Da-d][).]\s*").expect("static regex"));

/// Structured request to the generative source
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System instruction
    pub system_prompt: String,
    /// User instruction
    pub user_prompt: String,
    /// Output token cap
    pub max_output_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling
    pub top_p: Option<f32>,
}

/// Generative text source
///
/// Implementations perform a single call and never retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GenerativeSource: Send + Sync {
    /// Complete the prompt into free text
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ServiceError>;
}

/// Turns requests into parsed candidates
#[derive(Clone)]
pub struct CandidateGenerator {
    source: Arc<dyn GenerativeSource>,
    call_timeout: Duration,
}

impl std::fmt::Debug for CandidateGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateGenerator")
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

impl CandidateGenerator {
    /// Create generator over a source
    #[inline]
    #[must_use]
    pub fn new(source: Arc<dyn GenerativeSource>, call_timeout: Duration) -> Self {
        Self {
            source,
            call_timeout,
        }
    }

    /// Build the completion request for a profile row
    #[must_use]
    pub fn build_request(
        profile: &PipelineProfile,
        request: &GenerationRequest,
        exclusions: &[String],
    ) -> CompletionRequest {
        let mut user_prompt = profile.render_user_prompt(request);
        if !exclusions.is_empty() {
            user_prompt.push_str("\nDo not use any of these words: ");
            user_prompt.push_str(&exclusions.join(", "));
            user_prompt.push('.');
        }

        CompletionRequest {
            system_prompt: profile.system_prompt.clone(),
            user_prompt,
            max_output_tokens: profile.max_output_tokens,
            temperature: profile.temperature,
            top_p: profile.top_p,
        }
    }

    /// Generate one candidate
    ///
    /// # Errors
    /// - `AttemptFailure::GeneratorUnavailable` if the call fails or times out
    /// - `AttemptFailure::MalformedCandidate` if the response does not parse
    pub async fn generate(
        &self,
        profile: &PipelineProfile,
        request: &GenerationRequest,
        exclusions: &[String],
    ) -> Result<Candidate, AttemptFailure> {
        let completion = Self::build_request(profile, request, exclusions);

        let text = tokio::time::timeout(self.call_timeout, self.source.complete(&completion))
            .await
            .map_err(|_| ServiceError::Timeout {
                timeout_ms: u64::try_from(self.call_timeout.as_millis()).unwrap_or(u64::MAX),
            })??;
        tracing::debug!(response = %text, "generator response");

        let candidate = match profile.shape {
            CandidateShape::SingleWord => parse_single_word(&text)?,
            CandidateShape::Question => parse_question(&text)?,
        };
        Ok(candidate)
    }
}

/// Parse a single-word response
///
/// Lower-cases, drops surrounding quotes, keeps the first
/// whitespace-delimited token and strips non-alphabetic characters.
///
/// # Errors
/// - `ParseError::Empty` for a blank response
/// - `ParseError::NoWord` if nothing alphabetic remains
pub fn parse_single_word(text: &str) -> Result<Candidate, ParseError> {
    let trimmed = text.trim().to_lowercase();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(&trimmed);

    let word: String = unquoted
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_alphabetic)
        .collect();

    if word.is_empty() {
        return Err(ParseError::NoWord(text.trim().to_string()));
    }
    Ok(Candidate::word(word))
}

/// Parse a `Word: .., Options: [..], Correct Answer: ..` response
///
/// # Errors
/// - `ParseError::Empty` for a blank response
/// - `ParseError::MissingField` if a label is absent
/// - `ParseError::NoWord` if the word has no letters
/// - `ParseError::OptionCount` unless exactly four options are listed
pub fn parse_question(text: &str) -> Result<Candidate, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    let word = capture(&WORD_FIELD, text, "Word")?;
    let options_raw = capture(&OPTIONS_FIELD, text, "Options")?;
    let answer = capture(&ANSWER_FIELD, text, "Correct Answer")?;

    let word = clean_field(&word);
    if normalize_word(&word).is_empty() {
        return Err(ParseError::NoWord(text.to_string()));
    }

    // Unbracketed single-line lists run into the answer label.
    let options_raw = options_raw
        .split("Correct Answer")
        .next()
        .unwrap_or_default();
    let options: Vec<String> = options_raw
        .split(',')
        .map(clean_field)
        .filter(|option| !option.is_empty())
        .collect();
    let found = options.len();
    let options: [String; 4] = options
        .try_into()
        .map_err(|_| ParseError::OptionCount { found })?;

    Ok(Candidate::question(word, options, clean_field(&answer)))
}

fn capture(pattern: &Regex, text: &str, field: &'static str) -> Result<String, ParseError> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or(ParseError::MissingField { field })
}

fn clean_field(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches(|c: char| matches!(c, '[' | ']' | '"'));
    OPTION_LABEL.replace(trimmed.trim(), "").trim().to_string()
}

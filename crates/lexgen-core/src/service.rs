//! Lexicon service
//!
//! The facade callers use. It owns:
//! - The flavor profile table
//! - The process-wide history store
//! - The single-flight guard for guarded flavors
//! - The retry controller wired to the collaborators
//!
//! Each flavor method validates its request, applies the guard when the
//! profile asks for it, and runs the controller under the request timeout.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::generator::{CandidateGenerator, GenerativeSource};
use crate::history::{HistoryStats, HistoryStore};
use crate::profile::{Flavor, ProfileTable};
use crate::retry::RetryController;
use crate::single_flight::{SingleFlight, SingleFlightStats};
use crate::types::{
    normalize_word, GeneratedItem, GenerationRequest, RequestId, Tier, Translation,
    ValidationResult,
};
use crate::validator::{DictionaryLookup, Translator, Validator};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Service counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceStats {
    /// Items committed
    pub committed: u64,
    /// Runs that exhausted their attempts
    pub exhausted: u64,
    /// Runs refused by the single-flight guard
    pub busy_rejections: u64,
    /// Runs cut off by the request timeout
    pub timeouts: u64,
    /// History store counters
    pub history: HistoryStats,
    /// Guard counters
    pub guard: SingleFlightStats,
}

#[derive(Debug, Default)]
struct Counters {
    committed: AtomicU64,
    exhausted: AtomicU64,
    busy_rejections: AtomicU64,
    timeouts: AtomicU64,
}

/// Generation, validation and translation entry points
#[derive(Debug)]
pub struct LexiconService {
    profiles: ProfileTable,
    history: Arc<HistoryStore>,
    guard: SingleFlight,
    controller: RetryController,
    request_timeout: Duration,
    counters: Counters,
}

impl LexiconService {
    /// Wire the service from configuration and collaborators
    #[must_use]
    pub fn new(
        config: &PipelineConfig,
        profiles: ProfileTable,
        source: Arc<dyn GenerativeSource>,
        dictionary: Arc<dyn DictionaryLookup>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        let call_timeout = config.call_timeout();
        let generator = CandidateGenerator::new(source, call_timeout);
        let validator = Validator::new(
            dictionary,
            translator,
            config.target_language.clone(),
            call_timeout,
        );
        let history = HistoryStore::with_policy(config.history_capacity, config.overflow_policy);

        Self {
            profiles,
            history: Arc::new(history),
            guard: SingleFlight::new(),
            controller: RetryController::new(generator, validator, config.exclusion_limit),
            request_timeout: config.request_timeout(),
            counters: Counters::default(),
        }
    }

    /// Share an existing history store
    #[inline]
    #[must_use]
    pub fn with_history(mut self, history: Arc<HistoryStore>) -> Self {
        self.history = history;
        self
    }

    /// Word starting with `letter`
    ///
    /// # Errors
    /// - `PipelineError::InvalidRequest` unless `letter` is an ASCII letter
    /// - `PipelineError::RetriesExhausted` / `PipelineError::Timeout`
    pub async fn generate_word(&self, letter: char) -> Result<GeneratedItem, PipelineError> {
        self.generate(Flavor::WordByLetter, GenerationRequest::ByStartingLetter(letter))
            .await
            .map(GeneratedItem::without_definitions)
    }

    /// Word starting with `letter`, with definitions
    ///
    /// # Errors
    /// See [`LexiconService::generate_word`].
    pub async fn generate_enriched_word(
        &self,
        letter: char,
    ) -> Result<GeneratedItem, PipelineError> {
        self.generate(
            Flavor::EnrichedWordByLetter,
            GenerationRequest::ByStartingLetter(letter),
        )
        .await
    }

    /// Quiz question for `tier`
    ///
    /// # Errors
    /// - `PipelineError::PipelineBusy` if a guarded run is in flight
    /// - `PipelineError::RetriesExhausted` / `PipelineError::Timeout`
    pub async fn generate_question(&self, tier: Tier) -> Result<GeneratedItem, PipelineError> {
        self.generate(Flavor::Question(tier), GenerationRequest::ByTier(tier))
            .await
    }

    /// Vocabulary word related to `topic`, with definitions
    ///
    /// # Errors
    /// - `PipelineError::InvalidRequest` for a blank topic
    /// - `PipelineError::RetriesExhausted` / `PipelineError::Timeout`
    pub async fn generate_topic_word(&self, topic: &str) -> Result<GeneratedItem, PipelineError> {
        self.generate(Flavor::Topic, GenerationRequest::ByTopic(topic.to_string()))
            .await
    }

    /// Validate a caller-supplied word; history is untouched
    ///
    /// # Errors
    /// - `PipelineError::InvalidRequest` if the word has no letters
    pub async fn validate_word(&self, word: &str) -> Result<ValidationResult, PipelineError> {
        let word = normalize_word(word);
        if word.is_empty() {
            return Err(PipelineError::InvalidRequest(
                "word must contain letters".to_string(),
            ));
        }
        let result = self.controller.validator().validate(&word, true).await;
        tracing::info!(%word, valid = result.valid, "validated word");
        Ok(result)
    }

    /// Translate a caller-supplied word into the target language
    ///
    /// # Errors
    /// - `PipelineError::InvalidRequest` for a blank word
    /// - `PipelineError::TranslationUnavailable` if the service fails
    pub async fn translate_word(&self, word: &str) -> Result<Translation, PipelineError> {
        let word = word.trim();
        if word.is_empty() {
            return Err(PipelineError::InvalidRequest(
                "word must not be empty".to_string(),
            ));
        }
        let validator = self.controller.validator();
        let translated = validator.translate(word).await.map_err(|e| {
            tracing::error!(word, error = %e, "translation failed");
            PipelineError::TranslationUnavailable(e)
        })?;
        Ok(Translation {
            word: word.to_string(),
            target_language: validator.target_language().to_string(),
            translated,
        })
    }

    /// Run a flavor against a request
    ///
    /// # Errors
    /// - `PipelineError::InvalidRequest` if the request does not fit the
    ///   flavor or fails its constraint check
    /// - `PipelineError::PipelineBusy` for a guarded flavor already in flight
    /// - `PipelineError::RetriesExhausted`, `PipelineError::Timeout`,
    ///   `PipelineError::Internal`
    pub async fn generate(
        &self,
        flavor: Flavor,
        request: GenerationRequest,
    ) -> Result<GeneratedItem, PipelineError> {
        check_request(flavor, &request)?;
        let profile = self.profiles.get(flavor);

        let _permit = if profile.guarded {
            match self.guard.try_acquire() {
                Some(permit) => Some(permit),
                None => {
                    self.counters.busy_rejections.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(%flavor, "single-flight guard held, rejecting");
                    return Err(PipelineError::PipelineBusy(flavor.to_string()));
                }
            }
        } else {
            None
        };

        let request_id = RequestId::new();
        let span = tracing::info_span!(
            "pipeline",
            %request_id,
            %flavor,
            request = %request.label()
        );
        let run = self.controller.run(flavor, profile, &request, &self.history);

        let outcome = async {
            tracing::info!(max_attempts = profile.max_attempts, "generation started");
            match AssertUnwindSafe(tokio::time::timeout(self.request_timeout, run))
                .catch_unwind()
                .await
            {
                Ok(Ok(result)) => result,
                Ok(Err(_elapsed)) => Err(PipelineError::Timeout {
                    duration_secs: self.request_timeout.as_secs(),
                }),
                Err(panic) => Err(PipelineError::Internal(panic_message(panic.as_ref()))),
            }
        }
        .instrument(span)
        .await;

        match &outcome {
            Ok(_) => self.counters.committed.fetch_add(1, Ordering::Relaxed),
            Err(PipelineError::RetriesExhausted { .. }) => {
                self.counters.exhausted.fetch_add(1, Ordering::Relaxed)
            }
            Err(PipelineError::Timeout { .. }) => {
                self.counters.timeouts.fetch_add(1, Ordering::Relaxed)
            }
            Err(_) => 0,
        };
        if let Err(e) = &outcome {
            tracing::error!(%flavor, %request_id, error = %e, "generation failed");
        }
        outcome
    }

    /// Shared history store
    #[inline]
    #[must_use]
    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    /// Effective profile table
    #[inline]
    #[must_use]
    pub fn profiles(&self) -> &ProfileTable {
        &self.profiles
    }

    /// Whether a guarded run is in flight
    #[inline]
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.guard.is_held()
    }

    /// Counters snapshot
    #[must_use]
    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            committed: self.counters.committed.load(Ordering::Relaxed),
            exhausted: self.counters.exhausted.load(Ordering::Relaxed),
            busy_rejections: self.counters.busy_rejections.load(Ordering::Relaxed),
            timeouts: self.counters.timeouts.load(Ordering::Relaxed),
            history: self.history.stats(),
            guard: self.guard.stats(),
        }
    }
}

fn check_request(flavor: Flavor, request: &GenerationRequest) -> Result<(), PipelineError> {
    if !flavor.accepts(request) {
        return Err(PipelineError::InvalidRequest(format!(
            "{flavor} does not accept {}",
            request.label()
        )));
    }
    match request {
        GenerationRequest::ByStartingLetter(letter) if !letter.is_ascii_alphabetic() => Err(
            PipelineError::InvalidRequest(format!("starting letter must be A-Z, got {letter:?}")),
        ),
        GenerationRequest::ByTopic(topic) if topic.trim().is_empty() => Err(
            PipelineError::InvalidRequest("topic must not be empty".to_string()),
        ),
        _ => Ok(()),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "pipeline panicked".to_string())
}

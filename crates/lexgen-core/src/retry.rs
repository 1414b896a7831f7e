//! Retry controller
//!
//! The generate → validate → dedupe loop. Each attempt either fails before
//! touching the history store or ends with exactly one commit.
//!
//! ```text
//! attempt n ──generate──▶ validate ──▶ dedupe ──▶ commit
//!     ▲          │            │           │
//!     └──────────┴────────────┴───────────┘   while n + 1 < max_attempts
//! ```

use crate::error::{AttemptFailure, PipelineError};
use crate::generator::CandidateGenerator;
use crate::history::HistoryStore;
use crate::profile::{Flavor, PipelineProfile};
use crate::types::{GeneratedItem, GenerationRequest};
use crate::validator::Validator;

/// Per-run attempt bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptLog {
    /// Failures in attempt order
    pub failures: Vec<AttemptFailure>,
}

impl AttemptLog {
    /// Failures of a given kind
    #[must_use]
    pub fn count(&self, kind: &str) -> usize {
        self.failures.iter().filter(|f| f.kind() == kind).count()
    }
}

/// Drives attempts for one flavor invocation
#[derive(Debug, Clone)]
pub struct RetryController {
    generator: CandidateGenerator,
    validator: Validator,
    exclusion_limit: usize,
}

impl RetryController {
    /// Create controller
    #[inline]
    #[must_use]
    pub fn new(
        generator: CandidateGenerator,
        validator: Validator,
        exclusion_limit: usize,
    ) -> Self {
        Self {
            generator,
            validator,
            exclusion_limit,
        }
    }

    /// Validator used by the loop
    #[inline]
    #[must_use]
    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Run the loop until a commit or the attempt bound
    ///
    /// # Errors
    /// - `PipelineError::RetriesExhausted` when no attempt commits
    pub async fn run(
        &self,
        flavor: Flavor,
        profile: &PipelineProfile,
        request: &GenerationRequest,
        history: &HistoryStore,
    ) -> Result<GeneratedItem, PipelineError> {
        let mut log = AttemptLog::default();

        for attempt in 0..profile.max_attempts {
            match self.attempt(profile, request, history).await {
                Ok(item) => {
                    tracing::info!(%flavor, attempt, word = %item.word, "committed");
                    return Ok(item);
                }
                Err(failure) => {
                    tracing::debug!(
                        %flavor,
                        attempt,
                        kind = failure.kind(),
                        %failure,
                        "attempt failed"
                    );
                    log.failures.push(failure);
                }
            }
        }

        let attempts = profile.max_attempts;
        tracing::warn!(
            %flavor,
            attempts,
            malformed = log.count("malformed_candidate"),
            invalid = log.count("invalid_word"),
            duplicate = log.count("duplicate_candidate"),
            "retries exhausted"
        );
        Err(PipelineError::RetriesExhausted {
            flavor: flavor.to_string(),
            attempts,
            last_failure: log.failures.pop(),
        })
    }

    /// One attempt: generate, validate, then dedupe and commit
    async fn attempt(
        &self,
        profile: &PipelineProfile,
        request: &GenerationRequest,
        history: &HistoryStore,
    ) -> Result<GeneratedItem, AttemptFailure> {
        let exclusions = history.recent(self.exclusion_limit);
        let candidate = self.generator.generate(profile, request, &exclusions).await?;

        let word = candidate.headword();
        let validation = self.validator.validate(&word, profile.enrich).await;
        if let Some(rejection) = validation.rejection() {
            let reason = rejection.to_string();
            return Err(if rejection.is_unavailable() {
                AttemptFailure::ValidationUnavailable { word, reason }
            } else {
                AttemptFailure::InvalidWord { word, reason }
            });
        }

        // Membership test and insert share one critical section.
        if !history.try_commit(&word) {
            return Err(AttemptFailure::DuplicateCandidate(word));
        }

        Ok(GeneratedItem::assemble(candidate, validation))
    }
}

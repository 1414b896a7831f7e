//! Word validator
//!
//! Dictionary lookup first; translation only once a definition exists.
//! Every failure is folded into the returned `ValidationResult`.

use crate::error::ServiceError;
use crate::types::{Rejection, ValidationResult};
use std::sync::Arc;
use std::time::Duration;

/// Dictionary entry for a word
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DictionaryEntry {
    /// Definitions in dictionary order
    pub definitions: Vec<String>,
}

/// Authoritative dictionary
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DictionaryLookup: Send + Sync {
    /// Look up a word; `Ok(None)` means the dictionary has no entry
    async fn lookup(&self, word: &str) -> Result<Option<DictionaryEntry>, ServiceError>;
}

/// Translation service
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    /// Translate text into the target language
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, ServiceError>;
}

/// Combines lookup and optional translation into one verdict
#[derive(Clone)]
pub struct Validator {
    dictionary: Arc<dyn DictionaryLookup>,
    translator: Arc<dyn Translator>,
    target_language: String,
    call_timeout: Duration,
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("target_language", &self.target_language)
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

impl Validator {
    /// Create validator
    #[must_use]
    pub fn new(
        dictionary: Arc<dyn DictionaryLookup>,
        translator: Arc<dyn Translator>,
        target_language: impl Into<String>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            dictionary,
            translator,
            target_language: target_language.into(),
            call_timeout,
        }
    }

    /// Target language of the enrichment step
    #[inline]
    #[must_use]
    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// Validate a normalized word
    ///
    /// With `enrich`, the first definition is translated and a translation
    /// failure rejects the word.
    pub async fn validate(&self, word: &str, enrich: bool) -> ValidationResult {
        let entry = match self.timed(self.dictionary.lookup(word)).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return ValidationResult::rejected(Rejection::NotFound),
            Err(e) => {
                tracing::warn!(word, error = %e, "dictionary lookup failed");
                return ValidationResult::rejected(Rejection::LookupFailed(e.to_string()));
            }
        };

        let Some(definition) = entry
            .definitions
            .into_iter()
            .find(|d| !d.trim().is_empty())
        else {
            return ValidationResult::rejected(Rejection::NoDefinitions);
        };

        if !enrich {
            return ValidationResult::accepted(definition, None);
        }

        match self
            .timed(self.translator.translate(&definition, &self.target_language))
            .await
        {
            Ok(translated) => ValidationResult::accepted(definition, Some(translated)),
            Err(e) => {
                tracing::warn!(word, error = %e, "definition translation failed");
                ValidationResult::rejected(Rejection::TranslationFailed(e.to_string()))
            }
        }
    }

    /// Translate arbitrary text with the call timeout applied
    ///
    /// # Errors
    /// - `ServiceError` from the translator, or `ServiceError::Timeout`
    pub async fn translate(&self, text: &str) -> Result<String, ServiceError> {
        self.timed(self.translator.translate(text, &self.target_language))
            .await
    }

    async fn timed<T>(
        &self,
        call: impl std::future::Future<Output = Result<T, ServiceError>>,
    ) -> Result<T, ServiceError> {
        tokio::time::timeout(self.call_timeout, call)
            .await
            .map_err(|_| ServiceError::Timeout {
                timeout_ms: u64::try_from(self.call_timeout.as_millis()).unwrap_or(u64::MAX),
            })?
    }
}

//! Testing utilities for lexgen workspace
//!
//! Scripted collaborators and service fixtures.

#![allow(missing_docs)]

use lexgen_core::{
    CompletionRequest, DictionaryEntry, DictionaryLookup, GenerativeSource, LexiconService,
    PipelineConfig, ProfileTable, ServiceError, Translator,
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};

/// Generative source replaying scripted responses
///
/// Once the script runs out, the last response repeats.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<String, ServiceError>>>,
    last: Mutex<Option<Result<String, ServiceError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedSource {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_results(responses.into_iter().map(|r| Ok(r.into())))
    }

    pub fn from_results(results: impl IntoIterator<Item = Result<String, ServiceError>>) -> Self {
        Self {
            script: Mutex::new(results.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn always(response: &str) -> Self {
        Self::new([response])
    }

    pub fn failing(error: ServiceError) -> Self {
        Self::from_results([Err(error)])
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait::async_trait]
impl GenerativeSource for ScriptedSource {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ServiceError> {
        self.requests.lock().push(request.clone());
        let next = self.script.lock().pop_front();
        let mut last = self.last.lock();
        if let Some(next) = next {
            *last = Some(next);
        }
        (*last)
            .clone()
            .unwrap_or_else(|| Err(ServiceError::Transport("script is empty".to_string())))
    }
}

/// Generative source that blocks until released
#[derive(Debug)]
pub struct GatedSource {
    response: String,
    started: Notify,
    gate: Semaphore,
}

impl GatedSource {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            started: Notify::new(),
            gate: Semaphore::new(0),
        }
    }

    /// Wait until a call is blocked on the gate
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Let `n` calls through
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }
}

#[async_trait::async_trait]
impl GenerativeSource for GatedSource {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, ServiceError> {
        self.started.notify_one();
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| ServiceError::Transport("gate closed".to_string()))?;
        permit.forget();
        Ok(self.response.clone())
    }
}

/// Generative source that panics on every call
#[derive(Debug, Default)]
pub struct PanickingSource;

#[async_trait::async_trait]
impl GenerativeSource for PanickingSource {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, ServiceError> {
        panic!("generative source panicked");
    }
}

#[derive(Debug, Clone)]
enum DictionaryMode {
    Known(HashMap<String, Vec<String>>),
    AcceptAll(String),
    RejectAll,
    Failing(ServiceError),
}

/// In-memory dictionary
#[derive(Debug)]
pub struct StubDictionary {
    mode: DictionaryMode,
    lookups: AtomicUsize,
}

impl StubDictionary {
    fn with_mode(mode: DictionaryMode) -> Self {
        Self {
            mode,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn with_words(words: &[(&str, &str)]) -> Self {
        let known = words
            .iter()
            .map(|(word, definition)| (word.to_lowercase(), vec![(*definition).to_string()]))
            .collect();
        Self::with_mode(DictionaryMode::Known(known))
    }

    pub fn accept_all(definition: &str) -> Self {
        Self::with_mode(DictionaryMode::AcceptAll(definition.to_string()))
    }

    pub fn reject_all() -> Self {
        Self::with_mode(DictionaryMode::RejectAll)
    }

    pub fn failing(error: ServiceError) -> Self {
        Self::with_mode(DictionaryMode::Failing(error))
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DictionaryLookup for StubDictionary {
    async fn lookup(&self, word: &str) -> Result<Option<DictionaryEntry>, ServiceError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            DictionaryMode::Known(words) => Ok(words.get(word).map(|definitions| DictionaryEntry {
                definitions: definitions.clone(),
            })),
            DictionaryMode::AcceptAll(definition) => Ok(Some(DictionaryEntry {
                definitions: vec![definition.clone()],
            })),
            DictionaryMode::RejectAll => Ok(None),
            DictionaryMode::Failing(error) => Err(error.clone()),
        }
    }
}

/// Translator tagging text with the target language
#[derive(Debug, Default)]
pub struct StubTranslator {
    failure: Option<ServiceError>,
    calls: AtomicUsize,
}

impl StubTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: ServiceError) -> Self {
        Self {
            failure: Some(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Translator for StubTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(format!("[{target_language}] {text}")),
        }
    }
}

/// Service with default configuration
pub fn build_service(
    source: Arc<dyn GenerativeSource>,
    dictionary: Arc<dyn DictionaryLookup>,
    translator: Arc<dyn Translator>,
) -> LexiconService {
    build_service_with(&PipelineConfig::default(), source, dictionary, translator)
}

/// Service with a custom pipeline configuration and default profiles
pub fn build_service_with(
    config: &PipelineConfig,
    source: Arc<dyn GenerativeSource>,
    dictionary: Arc<dyn DictionaryLookup>,
    translator: Arc<dyn Translator>,
) -> LexiconService {
    LexiconService::new(config, ProfileTable::new(), source, dictionary, translator)
}

/// Question response in the generator's expected format
pub fn question_response(word: &str, options: [&str; 4], answer: &str) -> String {
    format!(
        "Word: {word}, Options: [{}], Correct Answer: {answer}",
        options.join(", ")
    )
}

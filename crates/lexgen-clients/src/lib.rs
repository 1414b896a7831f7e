//! lexgen Clients - HTTP collaborators
//!
//! reqwest adapters for the three collaborator traits of `lexgen-core`:
//! - `OpenAiChatSource`: chat completions as the generative source
//! - `FreeDictionaryClient`: dictionary lookup with a moka cache
//! - `MyMemoryTranslator`: definition translation

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod dictionary;
pub mod http;
pub mod openai;
pub mod translation;

pub use dictionary::{parse_entries, FreeDictionaryClient, LookupCacheStats};
pub use http::build_client;
pub use openai::{parse_chat_response, OpenAiChatSource};
pub use translation::{parse_translation, MyMemoryTranslator};

use lexgen_core::{
    ConfigError, DictionaryLookup, GenerativeSource, LexgenConfig, LexiconService, ServiceError,
    Translator,
};
use std::sync::Arc;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Collaborators wired from configuration
#[derive(Clone)]
pub struct Collaborators {
    /// Generative source
    pub source: Arc<dyn GenerativeSource>,
    /// Dictionary
    pub dictionary: Arc<dyn DictionaryLookup>,
    /// Translator
    pub translator: Arc<dyn Translator>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Errors wiring collaborators into a service
#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    /// HTTP client could not be built
    #[error(transparent)]
    Client(#[from] ServiceError),
    /// Profile overrides are invalid
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Collaborators {
    /// Build HTTP collaborators sharing one client
    ///
    /// The API key is read from the environment variable named in
    /// `openai.api_key_env`.
    ///
    /// # Errors
    /// - `ServiceError::NotConfigured` if the HTTP client cannot be built
    pub fn from_config(config: &LexgenConfig) -> Result<Self, ServiceError> {
        let call_timeout = config.pipeline.call_timeout();
        let client = build_client(CONNECT_TIMEOUT.min(call_timeout), call_timeout)?;
        let api_key = std::env::var(&config.openai.api_key_env).ok();
        if api_key.is_none() {
            tracing::warn!(
                var = %config.openai.api_key_env,
                "API key not set; generation will fail"
            );
        }

        Ok(Self {
            source: Arc::new(OpenAiChatSource::new(
                client.clone(),
                &config.openai,
                api_key,
                call_timeout,
            )),
            dictionary: Arc::new(FreeDictionaryClient::new(
                client.clone(),
                &config.dictionary,
                call_timeout,
            )),
            translator: Arc::new(MyMemoryTranslator::new(
                client,
                &config.translation,
                call_timeout,
            )),
        })
    }

    /// Wire a service around these collaborators
    ///
    /// # Errors
    /// - `ConfigError` for invalid profile overrides
    pub fn into_service(self, config: &LexgenConfig) -> Result<LexiconService, ConfigError> {
        Ok(LexiconService::new(
            &config.pipeline,
            config.profile_table()?,
            self.source,
            self.dictionary,
            self.translator,
        ))
    }
}

/// Build a service backed by HTTP collaborators
///
/// # Errors
/// - `WiringError` if the client or profile table cannot be built
pub fn http_service(config: &LexgenConfig) -> Result<LexiconService, WiringError> {
    Ok(Collaborators::from_config(config)?.into_service(config)?)
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Configuration
//!
//! Loaded from an optional TOML file, then patched by `LEXGEN_*` environment
//! variables. Empty or unparsable variables are ignored.

use crate::error::ConfigError;
use crate::history::{OverflowPolicy, DEFAULT_HISTORY_CAPACITY};
use crate::profile::{ProfileOverride, ProfileTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

const ENV_HISTORY_CAPACITY: &str = "LEXGEN_HISTORY_CAPACITY";
const ENV_OVERFLOW_POLICY: &str = "LEXGEN_OVERFLOW_POLICY";
const ENV_REQUEST_TIMEOUT_SECS: &str = "LEXGEN_REQUEST_TIMEOUT_SECS";
const ENV_CALL_TIMEOUT_SECS: &str = "LEXGEN_CALL_TIMEOUT_SECS";
const ENV_TARGET_LANGUAGE: &str = "LEXGEN_TARGET_LANGUAGE";
const ENV_OPENAI_BASE_URL: &str = "LEXGEN_OPENAI_BASE_URL";
const ENV_OPENAI_MODEL: &str = "LEXGEN_OPENAI_MODEL";
const ENV_DICTIONARY_BASE_URL: &str = "LEXGEN_DICTIONARY_BASE_URL";
const ENV_TRANSLATION_BASE_URL: &str = "LEXGEN_TRANSLATION_BASE_URL";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexgenConfig {
    /// Pipeline settings
    pub pipeline: PipelineConfig,
    /// Generative source settings
    pub openai: OpenAiConfig,
    /// Dictionary settings
    pub dictionary: DictionaryConfig,
    /// Translation settings
    pub translation: TranslationConfig,
    /// Per-flavor profile overrides, keyed by flavor
    pub profiles: BTreeMap<String, ProfileOverride>,
}

/// Pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// History store capacity
    pub history_capacity: usize,
    /// History overflow policy
    pub overflow_policy: OverflowPolicy,
    /// Bound on one whole flavor invocation
    pub request_timeout_secs: u64,
    /// Bound on each outbound call
    pub call_timeout_secs: u64,
    /// Language code for translated definitions
    pub target_language: String,
    /// Most recent history entries listed in prompts
    pub exclusion_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            overflow_policy: OverflowPolicy::Clear,
            request_timeout_secs: 60,
            call_timeout_secs: 15,
            target_language: "es".to_string(),
            exclusion_limit: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl PipelineConfig {
    /// Request-scoped timeout
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Per-call timeout
    #[inline]
    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

/// OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API base, without `/chat/completions`
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

/// Dictionary endpoint and lookup cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    /// Entries endpoint; the word is appended as a path segment
    pub base_url: String,
    /// Cached lookups
    pub cache_capacity: u64,
    /// Cache time-to-live
    pub cache_ttl_secs: u64,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.dictionaryapi.dev/api/v2/entries/en".to_string(),
            cache_capacity: 1_000,
            cache_ttl_secs: 3_600,
        }
    }
}

/// Translation endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Translation endpoint
    pub base_url: String,
    /// Source language code
    pub source_language: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.mymemory.translated.net/get".to_string(),
            source_language: "en".to_string(),
        }
    }
}

impl LexgenConfig {
    /// Parse TOML text
    ///
    /// # Errors
    /// - `ConfigError::Parse` for malformed TOML
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from an optional file, apply process environment, validate
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - `ConfigError::Parse` / `ConfigError::InvalidValue` otherwise
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply `LEXGEN_*` overrides from a variable source
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(v) = read(ENV_HISTORY_CAPACITY).and_then(|v| v.parse().ok()) {
            self.pipeline.history_capacity = v;
        }
        if let Some(v) = read(ENV_OVERFLOW_POLICY).and_then(|v| parse_policy(&v)) {
            self.pipeline.overflow_policy = v;
        }
        if let Some(v) = read(ENV_REQUEST_TIMEOUT_SECS).and_then(|v| v.parse().ok()) {
            self.pipeline.request_timeout_secs = v;
        }
        if let Some(v) = read(ENV_CALL_TIMEOUT_SECS).and_then(|v| v.parse().ok()) {
            self.pipeline.call_timeout_secs = v;
        }
        if let Some(v) = read(ENV_TARGET_LANGUAGE) {
            self.pipeline.target_language = v;
        }
        if let Some(v) = read(ENV_OPENAI_BASE_URL) {
            self.openai.base_url = v;
        }
        if let Some(v) = read(ENV_OPENAI_MODEL) {
            self.openai.model = v;
        }
        if let Some(v) = read(ENV_DICTIONARY_BASE_URL) {
            self.dictionary.base_url = v;
        }
        if let Some(v) = read(ENV_TRANSLATION_BASE_URL) {
            self.translation.base_url = v;
        }
    }

    /// Check ranges and build the profile table once to catch bad overrides
    ///
    /// # Errors
    /// - `ConfigError::InvalidValue` naming the offending key
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |key: &str, value: u64| {
            if value == 0 {
                Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    reason: "must be greater than zero".to_string(),
                })
            } else {
                Ok(())
            }
        };
        positive("pipeline.history_capacity", self.pipeline.history_capacity as u64)?;
        positive("pipeline.request_timeout_secs", self.pipeline.request_timeout_secs)?;
        positive("pipeline.call_timeout_secs", self.pipeline.call_timeout_secs)?;
        if self.pipeline.target_language.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.target_language".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        self.profile_table().map(|_| ())
    }

    /// Effective profile table
    ///
    /// # Errors
    /// - `ConfigError::InvalidValue` for unknown flavors or bad fields
    pub fn profile_table(&self) -> Result<ProfileTable, ConfigError> {
        ProfileTable::with_overrides(&self.profiles)
    }
}

fn parse_policy(value: &str) -> Option<OverflowPolicy> {
    match value.to_ascii_lowercase().as_str() {
        "clear" => Some(OverflowPolicy::Clear),
        "evict-oldest" | "evict_oldest" => Some(OverflowPolicy::EvictOldest),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Flavor;
    use crate::types::Tier;
    use std::collections::HashMap;

    #[test]
    fn empty_toml_uses_defaults() {
        let config = LexgenConfig::from_toml_str("").unwrap();
        assert_eq!(config, LexgenConfig::default());
        assert_eq!(config.pipeline.history_capacity, 50);
        assert_eq!(config.pipeline.overflow_policy, OverflowPolicy::Clear);
    }

    #[test]
    fn toml_sections_and_profiles() {
        let text = r#"
            [pipeline]
            history_capacity = 20
            overflow_policy = "evict-oldest"
            target_language = "fr"

            [openai]
            model = "gpt-4o-mini"

            [profiles.question_easy]
            max_attempts = 12
        "#;
        let config = LexgenConfig::from_toml_str(text).unwrap();
        assert_eq!(config.pipeline.history_capacity, 20);
        assert_eq!(config.pipeline.overflow_policy, OverflowPolicy::EvictOldest);
        assert_eq!(config.pipeline.call_timeout_secs, 15);
        assert_eq!(config.openai.model, "gpt-4o-mini");

        let table = config.profile_table().unwrap();
        assert_eq!(table.get(Flavor::Question(Tier::Easy)).max_attempts, 12);
    }

    #[test]
    fn unknown_profile_field_rejected() {
        let text = "[profiles.word]\nretries = 4\n";
        assert!(LexgenConfig::from_toml_str(text).is_err());
    }

    #[test]
    fn env_overrides_skip_blank_and_bad_values() {
        let vars: HashMap<&str, &str> = [
            ("LEXGEN_HISTORY_CAPACITY", " 75 "),
            ("LEXGEN_CALL_TIMEOUT_SECS", "soon"),
            ("LEXGEN_TARGET_LANGUAGE", "  "),
            ("LEXGEN_OVERFLOW_POLICY", "evict_oldest"),
        ]
        .into_iter()
        .collect();

        let mut config = LexgenConfig::default();
        config.apply_env(|name| vars.get(name).map(ToString::to_string));

        assert_eq!(config.pipeline.history_capacity, 75);
        assert_eq!(config.pipeline.call_timeout_secs, 15);
        assert_eq!(config.pipeline.target_language, "es");
        assert_eq!(config.pipeline.overflow_policy, OverflowPolicy::EvictOldest);
    }

    #[test]
    fn zero_capacity_fails_validation() {
        let mut config = LexgenConfig::default();
        config.pipeline.history_capacity = 0;
        assert!(config.validate().is_err());
    }
}

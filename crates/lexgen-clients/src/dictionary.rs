//! Dictionary lookup over a dictionaryapi.dev-shaped endpoint
//!
//! Lookups are cached with moka, negative answers included. Failed calls
//! are never cached.

use crate::http::{join_url, success_body, transport_error};
use lexgen_core::{DictionaryConfig, DictionaryEntry, DictionaryLookup, ServiceError};
use moka::future::Cache;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct EntryBody {
    #[serde(default)]
    meanings: Vec<Meaning>,
}

#[derive(Debug, Deserialize)]
struct Meaning {
    #[serde(default)]
    definitions: Vec<Definition>,
}

#[derive(Debug, Deserialize)]
struct Definition {
    #[serde(default)]
    definition: String,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct LookupCacheStats {
    /// Entries currently cached
    pub entry_count: u64,
}

/// Dictionary client with a lookup cache
#[derive(Debug, Clone)]
pub struct FreeDictionaryClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    cache: Cache<String, Option<DictionaryEntry>>,
}

impl FreeDictionaryClient {
    /// Create from config
    #[must_use]
    pub fn new(client: reqwest::Client, config: &DictionaryConfig, timeout: Duration) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            timeout,
            cache: Cache::builder()
                .max_capacity(config.cache_capacity)
                .time_to_live(Duration::from_secs(config.cache_ttl_secs))
                .build(),
        }
    }

    /// Cache statistics
    #[must_use]
    pub fn cache_stats(&self) -> LookupCacheStats {
        LookupCacheStats {
            entry_count: self.cache.entry_count(),
        }
    }

    async fn fetch(&self, word: &str) -> Result<Option<DictionaryEntry>, ServiceError> {
        let response = self
            .client
            .get(join_url(&self.base_url, word))
            .send()
            .await
            .map_err(|e| transport_error(&e, self.timeout))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = success_body(response, self.timeout).await?;
        parse_entries(&body).map(Some)
    }
}

#[async_trait::async_trait]
impl DictionaryLookup for FreeDictionaryClient {
    async fn lookup(&self, word: &str) -> Result<Option<DictionaryEntry>, ServiceError> {
        let key = word.to_lowercase();
        if let Some(cached) = self.cache.get(&key).await {
            tracing::trace!(word = %key, "dictionary cache hit");
            return Ok(cached);
        }

        let entry = self.fetch(&key).await?;
        tracing::debug!(word = %key, found = entry.is_some(), "dictionary lookup");
        self.cache.insert(key, entry.clone()).await;
        Ok(entry)
    }
}

/// Flatten `[].meanings[].definitions[].definition` in order
///
/// # Errors
/// - `ServiceError::UnexpectedShape` if the body is not an entry list
pub fn parse_entries(body: &str) -> Result<DictionaryEntry, ServiceError> {
    let entries: Vec<EntryBody> = serde_json::from_str(body)
        .map_err(|e| ServiceError::UnexpectedShape(format!("dictionary entries: {e}")))?;

    let definitions = entries
        .into_iter()
        .flat_map(|entry| entry.meanings)
        .flat_map(|meaning| meaning.definitions)
        .map(|d| d.definition.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect();
    Ok(DictionaryEntry { definitions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BANANA: &str = r#"[
        {
            "word": "banana",
            "meanings": [
                {
                    "partOfSpeech": "noun",
                    "definitions": [
                        {"definition": "An elongated curved tropical fruit.", "synonyms": []},
                        {"definition": " "}
                    ]
                },
                {
                    "partOfSpeech": "adjective",
                    "definitions": [{"definition": "Crazy."}]
                }
            ]
        },
        {"word": "banana", "meanings": [{"definitions": [{"definition": "A banana plant."}]}]}
    ]"#;

    #[test]
    fn flattens_definitions_in_order() {
        let entry = parse_entries(BANANA).unwrap();
        assert_eq!(
            entry.definitions,
            vec![
                "An elongated curved tropical fruit.".to_string(),
                "Crazy.".to_string(),
                "A banana plant.".to_string(),
            ]
        );
    }

    #[test]
    fn entry_without_meanings_has_no_definitions() {
        let entry = parse_entries(r#"[{"word": "zzz"}]"#).unwrap();
        assert!(entry.definitions.is_empty());
    }

    #[test]
    fn not_found_body_is_unexpected_shape() {
        let body = r#"{"title": "No Definitions Found", "message": "Sorry pal"}"#;
        assert!(matches!(
            parse_entries(body),
            Err(ServiceError::UnexpectedShape(_))
        ));
    }

    #[tokio::test]
    async fn cache_starts_empty() {
        let client = FreeDictionaryClient::new(
            reqwest::Client::new(),
            &DictionaryConfig::default(),
            Duration::from_secs(1),
        );
        assert_eq!(client.cache_stats().entry_count, 0);
    }
}

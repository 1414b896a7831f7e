//! Translation over a MyMemory-shaped endpoint

use crate::http::{success_body, transport_error};
use lexgen_core::{ServiceError, TranslationConfig, Translator};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslationBody {
    response_data: Option<ResponseData>,
    #[serde(default)]
    response_status: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseData {
    #[serde(default)]
    translated_text: String,
}

/// Translation client
#[derive(Debug, Clone)]
pub struct MyMemoryTranslator {
    client: reqwest::Client,
    base_url: String,
    source_language: String,
    timeout: Duration,
}

impl MyMemoryTranslator {
    /// Create from config
    #[must_use]
    pub fn new(client: reqwest::Client, config: &TranslationConfig, timeout: Duration) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            source_language: config.source_language.clone(),
            timeout,
        }
    }

    fn language_pair(&self, target_language: &str) -> String {
        format!("{}|{}", self.source_language, target_language)
    }
}

#[async_trait::async_trait]
impl Translator for MyMemoryTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, ServiceError> {
        let langpair = self.language_pair(target_language);
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", text), ("langpair", langpair.as_str())])
            .send()
            .await
            .map_err(|e| transport_error(&e, self.timeout))?;

        let body = success_body(response, self.timeout).await?;
        let translated = parse_translation(&body)?;
        tracing::debug!(%langpair, chars = translated.len(), "translated");
        Ok(translated)
    }
}

/// Extract `responseData.translatedText`
///
/// # Errors
/// - `ServiceError::Status` when the body reports a non-200 status
/// - `ServiceError::UnexpectedShape` for a missing or blank translation
pub fn parse_translation(body: &str) -> Result<String, ServiceError> {
    let parsed: TranslationBody = serde_json::from_str(body)
        .map_err(|e| ServiceError::UnexpectedShape(format!("translation: {e}")))?;

    // The status arrives as either a number or a string.
    let status = parsed.response_status.as_ref().and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    });
    if let Some(status) = status.filter(|s| *s != 200) {
        return Err(ServiceError::Status {
            status: u16::try_from(status).unwrap_or(u16::MAX),
            message: "translation rejected".to_string(),
        });
    }

    parsed
        .response_data
        .map(|data| data.translated_text)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| ServiceError::UnexpectedShape("translation is empty".to_string()))
}

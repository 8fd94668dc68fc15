use crate::Result;
use crate::core::language::LanguageTag;
use crate::error::BisubError;
use crate::services::translator::retry::{RetryConfig, retry_with_backoff};
use crate::services::translator::Translator;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP translator speaking the LibreTranslate-compatible JSON protocol.
///
/// One request translates a whole batch; every request carries the
/// configured deadline (30 s by default) and failures are retried with
/// exponential backoff before surfacing as a translation error.
pub struct HttpTranslator {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    retry: RetryConfig,
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a [String],
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: Vec<String>,
}

#[derive(Deserialize)]
struct TranslateError {
    error: String,
}

impl HttpTranslator {
    /// Create a translator against `endpoint` with the given deadline.
    pub fn new(endpoint: String, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BisubError::translation(format!("client init failed: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            retry: RetryConfig::default(),
        })
    }

    /// Override the retry policy (tests use tight delays).
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn request_batch(
        &self,
        texts: &[String],
        source: &str,
        target: &str,
    ) -> Result<Vec<String>> {
        let body = TranslateRequest {
            q: texts,
            source,
            target,
            format: "text",
            api_key: self.api_key.as_deref(),
        };
        let response = self
            .client
            .post(format!("{}/translate", self.endpoint))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<TranslateError>()
                .await
                .map(|e| e.error)
                .unwrap_or_else(|_| status.to_string());
            return Err(BisubError::translation(format!(
                "translate request failed: {}",
                detail
            )));
        }

        let parsed: TranslateResponse = response
            .json()
            .await
            .map_err(|e| BisubError::translation(format!("malformed response: {}", e)))?;
        if parsed.translated_text.len() != texts.len() {
            return Err(BisubError::translation(format!(
                "expected {} translations, got {}",
                texts.len(),
                parsed.translated_text.len()
            )));
        }
        Ok(parsed.translated_text)
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(
        &self,
        texts: &[String],
        source: LanguageTag,
        target: LanguageTag,
    ) -> Result<Vec<String>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let source_code = source.short_code();
        let target_code = target.short_code();
        debug!(
            "translating {} texts {} -> {}",
            texts.len(),
            source_code,
            target_code
        );
        retry_with_backoff(
            || self.request_batch(texts, source_code, target_code),
            &self.retry,
        )
        .await
    }
}

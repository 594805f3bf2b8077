use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::TranslationBackend;

/// Calls an external HTTP translation endpoint (e.g. a LibreTranslate-compatible
/// API). The endpoint is expected to accept `TranslateRequest` as JSON and
/// respond with `TranslateResponse`.
pub struct RemoteHttpTranslationBackend {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

impl RemoteHttpTranslationBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl TranslationBackend for RemoteHttpTranslationBackend {
    async fn translate(&self, text: &str, source: &str, target: &str) -> anyhow::Result<String> {
        let body = TranslateRequest {
            q: text,
            source,
            target,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("translation request failed: {e}"))?
            .error_for_status()
            .map_err(|e| anyhow::anyhow!("translation endpoint returned an error: {e}"))?;

        let parsed: TranslateResponse = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("malformed translation response: {e}"))?;

        debug!(target, "remote translation complete");
        Ok(parsed.translated_text)
    }

    fn name(&self) -> &str {
        "remote_http"
    }
}

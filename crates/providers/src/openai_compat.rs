//! Chat-completions backend for OpenAI-compatible APIs (OpenRouter, OpenAI, ...).

use std::time::Duration;

use {
    async_trait::async_trait,
    parley_sessions::Message,
    secrecy::{ExposeSecret, Secret},
    serde::Serialize,
    tracing::{debug, trace, warn},
};

use crate::{
    CompletionProvider,
    error::{Error, Result},
};

pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Secret<String>,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

impl OpenAiCompatProvider {
    pub fn new(base_url: impl Into<String>, api_key: Secret<String>, timeout: Duration) -> Self {
        Self::with_client(
            crate::shared_http_client().clone(),
            base_url,
            api_key,
            timeout,
        )
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Secret<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            timeout,
        }
    }
}

/// First choice's message text.
fn first_choice_text(resp: &serde_json::Value) -> Result<String> {
    let choice = resp
        .get("choices")
        .and_then(|c| c.get(0))
        .ok_or_else(|| Error::malformed("no choices in response"))?;
    choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::malformed("first choice has no message content"))
}

#[async_trait]
impl CompletionProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai-compat"
    }

    async fn complete(&self, model: &str, messages: &[Message]) -> Result<String> {
        let body = ChatRequest { model, messages };
        debug!(model, messages_count = messages.len(), "chat completion request");

        let http_resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = http_resp.status();
        if !status.is_success() {
            let body_text = http_resp.text().await.unwrap_or_default();
            warn!(status = %status, model, body = %body_text, "completion API error");
            return Err(Error::Api {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let resp = http_resp
            .json::<serde_json::Value>()
            .await
            .map_err(|e| Error::malformed(e.to_string()))?;
        trace!(response = %resp, "completion raw response");
        first_choice_text(&resp)
    }
}

//! Completion provider clients.
//!
//! The rest of the assistant treats a provider as an opaque "text (and
//! optionally image) in, text out" service behind [`CompletionProvider`].
//! OpenAI and Anthropic are supported; tests substitute their own
//! implementations.

use crate::config::{AiConfig, ProviderKind};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;

const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const ANTHROPIC_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Failure talking to a completion provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("No AI provider configured. Set OPENAI_API_KEY or ANTHROPIC_API_KEY.")]
    NotConfigured,

    #[error("{0}")]
    Api(String),

    #[error("Request to {provider} failed: {source}")]
    Request {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected {0} response shape")]
    MalformedResponse(&'static str),
}

/// An image attached to a chat message, already base64-encoded.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    /// e.g. "image/png"
    pub media_type: String,
    pub data_base64: String,
}

/// Text/vision completion service.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run one completion. `instructions` is the system prompt, `prompt`
    /// the user content.
    async fn complete(
        &self,
        instructions: &str,
        prompt: &str,
        image: Option<&ImageAttachment>,
    ) -> Result<String, ProviderError>;
}

/// Human-readable message for a non-2xx provider status.
fn api_error_message(provider: &str, status: u16) -> String {
    let reason = match status {
        400 => "invalid request; please check your input",
        401 => "invalid API key; please check your credentials",
        403 => "access forbidden; please check your subscription",
        404 => "endpoint not found",
        429 => "rate limit exceeded; please try again later",
        500 | 502 | 503 => "service temporarily unavailable",
        _ => "request failed",
    };
    format!("{} API error: {} (status {})", provider, reason, status)
}

/// OpenAI chat-completions client.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(
        &self,
        instructions: &str,
        prompt: &str,
        image: Option<&ImageAttachment>,
    ) -> Result<String, ProviderError> {
        let user_content: Value = match image {
            None => json!(prompt),
            Some(img) => json!([
                { "type": "text", "text": prompt },
                {
                    "type": "image_url",
                    "image_url": {
                        "url": format!("data:{};base64,{}", img.media_type, img.data_base64)
                    }
                }
            ]),
        };

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": instructions },
                { "role": "user", "content": user_content }
            ],
            "max_tokens": 1024,
            "temperature": 0.7,
        });

        let response = self
            .client
            .post(OPENAI_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|source| ProviderError::Request {
                provider: "OpenAI",
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api(api_error_message("OpenAI", status.as_u16())));
        }

        let data: Value = response.json().await.map_err(|source| ProviderError::Request {
            provider: "OpenAI",
            source,
        })?;

        data["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or(ProviderError::MalformedResponse("OpenAI"))
    }
}

/// Anthropic messages client.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn complete(
        &self,
        instructions: &str,
        prompt: &str,
        image: Option<&ImageAttachment>,
    ) -> Result<String, ProviderError> {
        let mut content = Vec::new();
        if let Some(img) = image {
            content.push(json!({
                "type": "image",
                "source": {
                    "type": "base64",
                    "media_type": img.media_type,
                    "data": img.data_base64,
                }
            }));
        }
        content.push(json!({ "type": "text", "text": prompt }));

        let body = json!({
            "model": self.model,
            "system": instructions,
            "messages": [{ "role": "user", "content": content }],
            "max_tokens": 1024,
        });

        let response = self
            .client
            .post(ANTHROPIC_ENDPOINT)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|source| ProviderError::Request {
                provider: "Anthropic",
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api(api_error_message(
                "Anthropic",
                status.as_u16(),
            )));
        }

        let data: Value = response.json().await.map_err(|source| ProviderError::Request {
            provider: "Anthropic",
            source,
        })?;

        data["content"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or(ProviderError::MalformedResponse("Anthropic"))
    }
}

/// Build a provider from config. `Auto` prefers OpenAI when both keys are
/// present; a requested provider without its key is not configured.
pub fn provider_from_config(
    ai: &AiConfig,
) -> Result<Arc<dyn CompletionProvider>, ProviderError> {
    let openai = ai.openai_api_key.as_deref().filter(|k| !k.is_empty());
    let anthropic = ai.anthropic_api_key.as_deref().filter(|k| !k.is_empty());

    match ai.provider {
        ProviderKind::Openai => openai
            .map(|key| {
                Arc::new(OpenAiProvider::new(key.to_string(), ai.openai_model.clone()))
                    as Arc<dyn CompletionProvider>
            })
            .ok_or(ProviderError::NotConfigured),
        ProviderKind::Anthropic => anthropic
            .map(|key| {
                Arc::new(AnthropicProvider::new(
                    key.to_string(),
                    ai.anthropic_model.clone(),
                )) as Arc<dyn CompletionProvider>
            })
            .ok_or(ProviderError::NotConfigured),
        ProviderKind::Auto => {
            if let Some(key) = openai {
                Ok(Arc::new(OpenAiProvider::new(
                    key.to_string(),
                    ai.openai_model.clone(),
                )))
            } else if let Some(key) = anthropic {
                Ok(Arc::new(AnthropicProvider::new(
                    key.to_string(),
                    ai.anthropic_model.clone(),
                )))
            } else {
                Err(ProviderError::NotConfigured)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(openai: Option<&str>, anthropic: Option<&str>) -> AiConfig {
        AiConfig {
            openai_api_key: openai.map(String::from),
            anthropic_api_key: anthropic.map(String::from),
            ..AiConfig::default()
        }
    }

    #[test]
    fn auto_prefers_openai() {
        let provider = provider_from_config(&config_with(Some("sk-a"), Some("sk-b"))).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn auto_falls_back_to_anthropic() {
        let provider = provider_from_config(&config_with(None, Some("sk-b"))).unwrap();
        assert_eq!(provider.name(), "anthropic");
    }

    #[test]
    fn missing_keys_are_not_configured() {
        assert!(matches!(
            provider_from_config(&config_with(None, None)),
            Err(ProviderError::NotConfigured)
        ));

        let mut config = config_with(None, Some("sk-b"));
        config.provider = ProviderKind::Openai;
        assert!(matches!(
            provider_from_config(&config),
            Err(ProviderError::NotConfigured)
        ));
    }

    #[test]
    fn status_messages_name_the_provider() {
        let msg = api_error_message("OpenAI", 429);
        assert!(msg.contains("OpenAI"));
        assert!(msg.contains("rate limit"));
    }
}

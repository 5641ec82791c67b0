//! HTTP provider adapters
//!
//! One adapter per wire protocol. Each builds its own request body and
//! parses its own reply with a pure function so the parsing can be tested
//! without a network. None of them retry.

pub mod anthropic;
pub mod gemini;
pub mod openai;

use anthropic::AnthropicAdapter;
use gemini::GeminiAdapter;
use openai::OpenAiAdapter;
use roundtable_application::ports::provider::{ProviderAdapter, ProviderError, ProviderRegistry};
use roundtable_domain::ParticipantId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Sampling temperature sent with every request.
pub(crate) const TEMPERATURE: f32 = 0.7;
/// Reply length limit sent with every request.
pub(crate) const MAX_OUTPUT_TOKENS: u32 = 1024;

/// Wire protocol a participant speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "gemini")]
    Gemini,
    /// Any service that accepts OpenAI chat completions (DeepSeek, local servers)
    #[serde(rename = "openai_compatible")]
    OpenAiCompatible,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Gemini,
        ProviderKind::OpenAiCompatible,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAiCompatible => "openai_compatible",
        }
    }

    /// Base URL used when none is configured
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi | ProviderKind::OpenAiCompatible => openai::DEFAULT_BASE_URL,
            ProviderKind::Anthropic => anthropic::DEFAULT_BASE_URL,
            ProviderKind::Gemini => gemini::DEFAULT_BASE_URL,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown provider kind '{0}'")]
pub struct UnknownProviderKind(pub String);

impl std::str::FromStr for ProviderKind {
    type Err = UnknownProviderKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "openai_compatible" | "openai-compatible" | "deepseek" => {
                Ok(ProviderKind::OpenAiCompatible)
            }
            other => Err(UnknownProviderKind(other.to_string())),
        }
    }
}

/// Everything needed to build one participant's adapter
#[derive(Debug, Clone)]
pub struct ProviderSpec {
    pub participant: ParticipantId,
    pub kind: ProviderKind,
    pub model: String,
    pub base_url: Option<String>,
}

/// Build the adapter registry for the configured participants.
///
/// All adapters share one `reqwest::Client` so connections are pooled.
pub fn build_provider_registry(specs: &[ProviderSpec], client: reqwest::Client) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for spec in specs {
        let base_url = spec
            .base_url
            .clone()
            .unwrap_or_else(|| spec.kind.default_base_url().to_string());
        let adapter: Arc<dyn ProviderAdapter> = match spec.kind {
            ProviderKind::OpenAi | ProviderKind::OpenAiCompatible => Arc::new(OpenAiAdapter::new(
                client.clone(),
                spec.participant.clone(),
                &spec.model,
                base_url,
            )),
            ProviderKind::Anthropic => Arc::new(AnthropicAdapter::new(
                client.clone(),
                spec.participant.clone(),
                &spec.model,
                base_url,
            )),
            ProviderKind::Gemini => Arc::new(GeminiAdapter::new(
                client.clone(),
                spec.participant.clone(),
                &spec.model,
                base_url,
            )),
        };
        debug!(
            "Registered {} adapter for {} ({})",
            spec.kind, spec.participant, spec.model
        );
        registry.register(adapter);
    }
    registry
}

/// Classify an HTTP reply and pull the text out of it.
///
/// `reply_path` is a JSON pointer to the reply text.
pub(crate) fn parse_reply(
    provider: &ParticipantId,
    status: u16,
    body: &str,
    reply_path: &str,
) -> Result<String, ProviderError> {
    let payload = serde_json::from_str::<Value>(body);
    let error_message = payload
        .as_ref()
        .ok()
        .and_then(|value| value.get("error"))
        .map(describe_error);

    if !(200..300).contains(&status) {
        let message = error_message.unwrap_or_else(|| snippet(body));
        return Err(ProviderError::status(provider.clone(), status, message));
    }

    let payload = payload.map_err(|e| {
        ProviderError::malformed(provider.clone(), format!("invalid JSON: {}", e))
    })?;

    if let Some(message) = error_message {
        return Err(ProviderError::api(provider.clone(), message));
    }

    payload
        .pointer(reply_path)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            ProviderError::malformed(provider.clone(), format!("no reply at {}", reply_path))
        })
}

/// Send a prepared request and classify the result
pub(crate) async fn send(
    provider: &ParticipantId,
    request: reqwest::RequestBuilder,
    reply_path: &str,
) -> Result<String, ProviderError> {
    // without_url keeps query-string keys out of error messages
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::transport(provider.clone(), e.without_url().to_string()))?;
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::transport(provider.clone(), e.without_url().to_string()))?;
    parse_reply(provider, status, &body, reply_path)
}

fn describe_error(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        other => other
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| other.to_string()),
    }
}

fn snippet(body: &str) -> String {
    const LIMIT: usize = 200;
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    match trimmed.char_indices().nth(LIMIT) {
        Some((end, _)) => format!("{}...", &trimmed[..end]),
        None => trimmed.to_string(),
    }
}

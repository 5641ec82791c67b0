//! Anthropic messages adapter

use super::{MAX_OUTPUT_TOKENS, parse_reply, send};
use async_trait::async_trait;
use reqwest::Client;
use roundtable_application::ports::provider::{ProviderAdapter, ProviderError};
use roundtable_domain::ParticipantId;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const API_VERSION: &str = "2023-06-01";

const REPLY_PATH: &str = "/content/0/text";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

pub struct AnthropicAdapter {
    client: Client,
    participant: ParticipantId,
    model: String,
    endpoint: String,
}

impl AnthropicAdapter {
    pub fn new(client: Client, participant: ParticipantId, model: &str, base_url: String) -> Self {
        Self {
            client,
            participant,
            model: model.to_string(),
            endpoint: format!("{}/v1/messages", base_url.trim_end_matches('/')),
        }
    }
}

/// Extract the reply from a messages response.
pub fn parse_response(
    participant: &ParticipantId,
    status: u16,
    body: &str,
) -> Result<String, ProviderError> {
    parse_reply(participant, status, body, REPLY_PATH)
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn provider_id(&self) -> &ParticipantId {
        &self.participant
    }

    fn kind(&self) -> &'static str {
        "anthropic"
    }

    async fn invoke(&self, credential: &SecretString, prompt: &str) -> Result<String, ProviderError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_OUTPUT_TOKENS,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };
        let request = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", credential.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&body);
        send(&self.participant, request, REPLY_PATH).await
    }
}

//! OpenAI chat completions adapter.
//!
//! Also serves OpenAI-compatible services such as DeepSeek through a
//! different base URL.

use super::{MAX_OUTPUT_TOKENS, TEMPERATURE, parse_reply, send};
use async_trait::async_trait;
use reqwest::Client;
use roundtable_application::ports::provider::{ProviderAdapter, ProviderError};
use roundtable_domain::ParticipantId;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

const REPLY_PATH: &str = "/choices/0/message/content";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

pub struct OpenAiAdapter {
    client: Client,
    participant: ParticipantId,
    model: String,
    endpoint: String,
}

impl OpenAiAdapter {
    pub fn new(client: Client, participant: ParticipantId, model: &str, base_url: String) -> Self {
        Self {
            client,
            participant,
            model: model.to_string(),
            endpoint: format!("{}/v1/chat/completions", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Extract the reply from a chat completions response.
pub fn parse_response(
    participant: &ParticipantId,
    status: u16,
    body: &str,
) -> Result<String, ProviderError> {
    parse_reply(participant, status, body, REPLY_PATH)
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn provider_id(&self) -> &ParticipantId {
        &self.participant
    }

    fn kind(&self) -> &'static str {
        "openai"
    }

    async fn invoke(&self, credential: &SecretString, prompt: &str) -> Result<String, ProviderError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_OUTPUT_TOKENS,
        };
        let request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential.expose_secret())
            .json(&body);
        send(&self.participant, request, REPLY_PATH).await
    }
}

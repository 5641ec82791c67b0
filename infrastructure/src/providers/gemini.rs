//! Gemini generateContent adapter

use super::{MAX_OUTPUT_TOKENS, TEMPERATURE, parse_reply, send};
use async_trait::async_trait;
use reqwest::Client;
use roundtable_application::ports::provider::{ProviderAdapter, ProviderError};
use roundtable_domain::ParticipantId;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const REPLY_PATH: &str = "/candidates/0/content/parts/0/text";
const TOP_K: u32 = 40;
const TOP_P: f32 = 0.95;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

pub struct GeminiAdapter {
    client: Client,
    participant: ParticipantId,
    endpoint: String,
}

impl GeminiAdapter {
    pub fn new(client: Client, participant: ParticipantId, model: &str, base_url: String) -> Self {
        Self {
            client,
            participant,
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                base_url.trim_end_matches('/'),
                model
            ),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn request_body(prompt: &str) -> GenerateRequest<'_> {
    GenerateRequest {
        contents: vec![Content {
            parts: vec![Part { text: prompt }],
        }],
        generation_config: GenerationConfig {
            temperature: TEMPERATURE,
            top_k: TOP_K,
            top_p: TOP_P,
            max_output_tokens: MAX_OUTPUT_TOKENS,
        },
    }
}

/// Extract the reply from a generateContent response.
pub fn parse_response(
    participant: &ParticipantId,
    status: u16,
    body: &str,
) -> Result<String, ProviderError> {
    parse_reply(participant, status, body, REPLY_PATH)
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn provider_id(&self) -> &ParticipantId {
        &self.participant
    }

    fn kind(&self) -> &'static str {
        "gemini"
    }

    async fn invoke(&self, credential: &SecretString, prompt: &str) -> Result<String, ProviderError> {
        let request = self
            .client
            .post(&self.endpoint)
            .query(&[("key", credential.expose_secret())])
            .json(&request_body(prompt));
        send(&self.participant, request, REPLY_PATH).await
    }
}

//! Participant configuration from TOML (`[[participants]]` tables)

use crate::providers::{ProviderKind, ProviderSpec};
use roundtable_domain::{Appearance, Participant, ParticipantId, ResponseTimeRange};
use serde::{Deserialize, Serialize};

/// A `{ min, max }` range in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRangeMs {
    pub min: u64,
    pub max: u64,
}

impl FileRangeMs {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn is_inverted(&self) -> bool {
        self.min > self.max
    }

    pub fn to_range(self) -> ResponseTimeRange {
        ResponseTimeRange::new(self.min, self.max)
    }
}

/// One configured participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileParticipantConfig {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default = "default_true")]
    pub selected: bool,
    #[serde(default)]
    pub adversarial: bool,
    /// Wire protocol: openai, anthropic, gemini or openai_compatible
    pub provider: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Environment variable holding this participant's API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    #[serde(default = "default_response_time")]
    pub response_time_ms: FileRangeMs,
}

fn default_true() -> bool {
    true
}

fn default_response_time() -> FileRangeMs {
    FileRangeMs::new(1500, 3000)
}

impl FileParticipantConfig {
    fn stock(
        id: &str,
        display_name: &str,
        color: &str,
        provider: ProviderKind,
        model: &str,
        response_time_ms: FileRangeMs,
    ) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            color: Some(color.to_string()),
            avatar: None,
            selected: true,
            adversarial: false,
            provider: provider.as_str().to_string(),
            model: model.to_string(),
            base_url: None,
            api_key_env: None,
            response_time_ms,
        }
    }

    /// The four participants available out of the box
    pub fn defaults() -> Vec<Self> {
        let mut deepseek = Self::stock(
            "deepseek",
            "Deepseek",
            "#3e62f8",
            ProviderKind::OpenAiCompatible,
            "deepseek-chat",
            FileRangeMs::new(1800, 3500),
        );
        deepseek.base_url = Some("https://api.deepseek.com".to_string());
        deepseek.api_key_env = Some("DEEPSEEK_API_KEY".to_string());

        let mut chatgpt = Self::stock(
            "chatgpt",
            "ChatGPT",
            "#10a37f",
            ProviderKind::OpenAi,
            "gpt-4o",
            FileRangeMs::new(1500, 3000),
        );
        chatgpt.api_key_env = Some("OPENAI_API_KEY".to_string());

        let mut claude = Self::stock(
            "claude",
            "Claude",
            "#8e45dd",
            ProviderKind::Anthropic,
            "claude-3-opus-20240229",
            FileRangeMs::new(2000, 4000),
        );
        claude.api_key_env = Some("ANTHROPIC_API_KEY".to_string());

        let mut gemini = Self::stock(
            "gemini",
            "Gemini",
            "#4285f4",
            ProviderKind::Gemini,
            "gemini-pro",
            FileRangeMs::new(1000, 2500),
        );
        gemini.api_key_env = Some("GEMINI_API_KEY".to_string());

        vec![chatgpt, claude, gemini, deepseek]
    }

    pub fn parse_provider(&self) -> Option<ProviderKind> {
        self.provider.parse().ok()
    }

    pub fn to_participant(&self) -> Participant {
        Participant::new(self.id.trim(), self.display_name.clone())
            .with_appearance(Appearance {
                color: self.color.clone(),
                avatar: self.avatar.clone(),
            })
            .with_selected(self.selected)
            .with_adversarial(self.adversarial)
            .with_response_time(self.response_time_ms.to_range())
    }

    /// Adapter spec, or `None` when the provider kind is unknown
    pub fn to_provider_spec(&self) -> Option<ProviderSpec> {
        Some(ProviderSpec {
            participant: ParticipantId::new(self.id.trim()),
            kind: self.parse_provider()?,
            model: self.model.clone(),
            base_url: self.base_url.clone(),
        })
    }
}

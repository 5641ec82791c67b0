//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into domain and
//! application types after validation.

mod adversarial;
mod output;
mod participants;
mod timing;

pub use adversarial::FileAdversarialConfig;
pub use output::{FileCredentialsConfig, FileLoggingConfig, FileOutputConfig, expand_home};
pub use participants::{FileParticipantConfig, FileRangeMs};
pub use timing::{FileContextConfig, FileTimingConfig};

use crate::providers::{ProviderKind, ProviderSpec};
use roundtable_application::config::SchedulerConfig;
use roundtable_domain::{
    ConfigIssue, ConfigIssueCode, DomainError, ParticipantId, ParticipantRegistry,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Configured participants, in registry order
    pub participants: Vec<FileParticipantConfig>,
    /// Devil's advocate settings
    pub adversarial: FileAdversarialConfig,
    /// Operation delays
    pub timing: FileTimingConfig,
    /// Context window sizes
    pub context: FileContextConfig,
    /// Credential storage
    pub credentials: FileCredentialsConfig,
    /// Conversation transcript
    pub logging: FileLoggingConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            participants: FileParticipantConfig::defaults(),
            adversarial: FileAdversarialConfig::default(),
            timing: FileTimingConfig::default(),
            context: FileContextConfig::default(),
            credentials: FileCredentialsConfig::default(),
            logging: FileLoggingConfig::default(),
            output: FileOutputConfig::default(),
        }
    }
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Errors make the configuration unusable; warnings are reported and
    /// start-up continues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        // 1. Participants
        if self.participants.is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::NoParticipants,
                "no participants are configured",
            ));
        }

        let mut seen = HashSet::new();
        for (index, participant) in self.participants.iter().enumerate() {
            let id = participant.id.trim();
            if id.is_empty() {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::EmptyParticipantId,
                    format!("participants[{}]: id cannot be empty", index),
                ));
                continue;
            }
            if !seen.insert(id) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::DuplicateParticipant { id: id.to_string() },
                    format!("participants: id '{}' is used more than once", id),
                ));
            }
            if participant.response_time_ms.is_inverted() {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::InvertedRange {
                        field: format!("participants.{}.response_time_ms", id),
                    },
                    format!(
                        "participants.{}.response_time_ms: min ({}) is greater than max ({})",
                        id, participant.response_time_ms.min, participant.response_time_ms.max
                    ),
                ));
            }
            if participant.parse_provider().is_none() {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::InvalidEnumValue {
                        field: format!("participants.{}.provider", id),
                        value: participant.provider.clone(),
                        valid_values: ProviderKind::ALL
                            .iter()
                            .map(|k| k.as_str().to_string())
                            .collect(),
                    },
                    format!(
                        "participants.{}.provider: unknown provider '{}'",
                        id, participant.provider
                    ),
                ));
            }
        }

        // 2. Timing
        if self.timing.group_stagger_ms.is_inverted() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvertedRange {
                    field: "timing.group_stagger_ms".to_string(),
                },
                format!(
                    "timing.group_stagger_ms: min ({}) is greater than max ({})",
                    self.timing.group_stagger_ms.min, self.timing.group_stagger_ms.max
                ),
            ));
        }

        // 3. Adversarial cap
        if self.adversarial.max_turns == 0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::ZeroAdversarialCap,
                "adversarial.max_turns is 0, devil's advocate turns will always be skipped",
            ));
        }

        issues
    }

    /// Build the participant registry from `[[participants]]`
    pub fn to_registry(&self) -> Result<ParticipantRegistry, DomainError> {
        ParticipantRegistry::new(
            self.participants
                .iter()
                .map(FileParticipantConfig::to_participant)
                .collect(),
        )
    }

    pub fn to_scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig::default()
            .with_adversarial_cap(self.adversarial.max_turns)
            .with_adversarial_prefix(self.adversarial.prefix.clone())
            .with_timing(self.timing.to_turn_timing())
            .with_windows(self.context.to_windows())
    }

    /// Adapter specs for every participant with a known provider
    pub fn provider_specs(&self) -> Vec<ProviderSpec> {
        self.participants
            .iter()
            .filter_map(FileParticipantConfig::to_provider_spec)
            .collect()
    }

    /// `(participant, variable)` pairs for API keys read from the environment
    pub fn api_key_envs(&self) -> Vec<(ParticipantId, String)> {
        self.participants
            .iter()
            .filter_map(|p| {
                p.api_key_env
                    .as_ref()
                    .map(|var| (ParticipantId::new(p.id.trim()), var.clone()))
            })
            .collect()
    }
}

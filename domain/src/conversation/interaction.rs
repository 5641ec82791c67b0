//! Interaction kinds a participant can be asked to produce

use crate::participant::ParticipantId;
use serde::{Deserialize, Serialize};

/// The kind of turn a response is resolved for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Interaction {
    /// Answer to a fanned-out user prompt
    Prompt,
    /// Reply addressed to another participant
    Reply { to: ParticipantId },
    /// Consensus view of the discussion so far
    Consensus,
    /// Simple restatement of the discussion
    Explain,
}

impl Interaction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interaction::Prompt => "prompt",
            Interaction::Reply { .. } => "reply",
            Interaction::Consensus => "consensus",
            Interaction::Explain => "explain",
        }
    }
}

impl std::fmt::Display for Interaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Interaction::Reply { to } => write!(f, "reply to {}", to),
            other => f.write_str(other.as_str()),
        }
    }
}

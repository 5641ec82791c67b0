//! Conversation messages

use crate::participant::ParticipantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel sender for messages typed by the user.
pub const USER_SENDER: &str = "user";
/// Sentinel sender for consensus entries.
pub const CONSENSUS_SENDER: &str = "consensus";

/// Unique message identifier, increasing in generation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a message is, carrying only the fields relevant to that kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageKind {
    /// Prompt typed by the user
    UserPrompt,
    /// A participant's answer, optionally addressed to another participant
    ModelReply {
        from: ParticipantId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        responding_to: Option<ParticipantId>,
        #[serde(default)]
        adversarial: bool,
    },
    /// A participant's view of the consensus so far
    ConsensusReply { from: ParticipantId },
    /// A plain-language restatement of the discussion
    SimplifiedExplanation { from: ParticipantId },
}

impl MessageKind {
    pub fn reply(from: ParticipantId, adversarial: bool) -> Self {
        MessageKind::ModelReply {
            from,
            responding_to: None,
            adversarial,
        }
    }

    pub fn reply_to(from: ParticipantId, to: ParticipantId, adversarial: bool) -> Self {
        MessageKind::ModelReply {
            from,
            responding_to: Some(to),
            adversarial,
        }
    }
}

/// Who authored a message, as shown in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender<'a> {
    User,
    Participant(&'a ParticipantId),
    Consensus,
}

impl Sender<'_> {
    pub fn as_str(&self) -> &str {
        match self {
            Sender::User => USER_SENDER,
            Sender::Participant(id) => id.as_str(),
            Sender::Consensus => CONSENSUS_SENDER,
        }
    }
}

impl std::fmt::Display for Sender<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the ordered conversation log (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: MessageKind,
}

impl Message {
    pub fn new(id: MessageId, kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            timestamp: Utc::now(),
            kind,
        }
    }

    pub fn sender(&self) -> Sender<'_> {
        match &self.kind {
            MessageKind::UserPrompt => Sender::User,
            MessageKind::ConsensusReply { .. } => Sender::Consensus,
            MessageKind::ModelReply { from, .. }
            | MessageKind::SimplifiedExplanation { from } => Sender::Participant(from),
        }
    }

    /// The participant that produced this message, if any.
    pub fn author(&self) -> Option<&ParticipantId> {
        match &self.kind {
            MessageKind::UserPrompt => None,
            MessageKind::ModelReply { from, .. }
            | MessageKind::ConsensusReply { from }
            | MessageKind::SimplifiedExplanation { from } => Some(from),
        }
    }

    pub fn responding_to(&self) -> Option<&ParticipantId> {
        match &self.kind {
            MessageKind::ModelReply { responding_to, .. } => responding_to.as_ref(),
            _ => None,
        }
    }

    pub fn consensus_from(&self) -> Option<&ParticipantId> {
        match &self.kind {
            MessageKind::ConsensusReply { from } => Some(from),
            _ => None,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self.kind, MessageKind::UserPrompt)
    }

    pub fn is_consensus(&self) -> bool {
        matches!(self.kind, MessageKind::ConsensusReply { .. })
    }

    pub fn is_explain_simplified(&self) -> bool {
        matches!(self.kind, MessageKind::SimplifiedExplanation { .. })
    }

    pub fn is_adversarial(&self) -> bool {
        matches!(
            self.kind,
            MessageKind::ModelReply {
                adversarial: true,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_sentinels() {
        let user = Message::new(MessageId::new(1), MessageKind::UserPrompt, "hi");
        assert_eq!(user.sender().as_str(), "user");
        assert!(user.author().is_none());

        let consensus = Message::new(
            MessageId::new(2),
            MessageKind::ConsensusReply {
                from: "claude".into(),
            },
            "we agree",
        );
        assert_eq!(consensus.sender().as_str(), "consensus");
        assert_eq!(consensus.consensus_from().unwrap().as_str(), "claude");
        assert!(consensus.is_consensus());
    }

    #[test]
    fn test_reply_flags() {
        let msg = Message::new(
            MessageId::new(3),
            MessageKind::reply_to("chatgpt".into(), "gemini".into(), true),
            "I disagree",
        );
        assert_eq!(msg.sender().as_str(), "chatgpt");
        assert_eq!(msg.responding_to().unwrap().as_str(), "gemini");
        assert!(msg.is_adversarial());
        assert!(!msg.is_consensus());
        assert!(!msg.is_explain_simplified());
    }

    #[test]
    fn test_serialized_shape_is_flat() {
        let msg = Message::new(
            MessageId::new(7),
            MessageKind::SimplifiedExplanation {
                from: "gemini".into(),
            },
            "Think of it like...",
        );
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["kind"], "simplified_explanation");
        assert_eq!(value["from"], "gemini");
    }
}

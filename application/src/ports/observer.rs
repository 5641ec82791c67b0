//! Conversation observer port
//!
//! Defines how the turn scheduler reports state changes and user-facing
//! notices while operations settle in the background.

use roundtable_domain::{Message, ParticipantId};

/// The orchestration operations a user can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    SendPrompt,
    DirectTurn,
    GroupDiscussion,
    Consensus,
    Explain,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::SendPrompt => "send_prompt",
            Operation::DirectTurn => "direct_turn",
            Operation::GroupDiscussion => "group_discussion",
            Operation::Consensus => "consensus",
            Operation::Explain => "explain_simplified",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Operation::SendPrompt => "Prompt",
            Operation::DirectTurn => "Direct conversation",
            Operation::GroupDiscussion => "Group discussion",
            Operation::Consensus => "Consensus",
            Operation::Explain => "Simplified explanation",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Activities shown with a loading indicator rather than per-participant typing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Consensus,
    Explain,
}

/// User-facing notices raised while operations run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A provider call failed and a simulated response was used instead
    ProviderFailed {
        participant: ParticipantId,
        message: String,
    },
    /// A devil's advocate turn was skipped because the cap was reached
    AdversarialCapReached { participant: ParticipantId, cap: u32 },
    /// A batched operation ended without producing its result
    OperationAborted { operation: Operation, reason: String },
}

impl Notice {
    pub fn participant(&self) -> Option<&ParticipantId> {
        match self {
            Notice::ProviderFailed { participant, .. }
            | Notice::AdversarialCapReached { participant, .. } => Some(participant),
            Notice::OperationAborted { .. } => None,
        }
    }

    /// Informational notices do not indicate something went wrong
    pub fn is_informational(&self) -> bool {
        matches!(self, Notice::AdversarialCapReached { .. })
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::ProviderFailed {
                participant,
                message,
            } => write!(
                f,
                "{} failed ({}); showing a simulated response",
                participant, message
            ),
            Notice::AdversarialCapReached { participant, cap } => write!(
                f,
                "{} has reached the maximum of {} devil's advocate turns",
                participant, cap
            ),
            Notice::OperationAborted { operation, reason } => {
                write!(f, "{} failed: {}", operation, reason)
            }
        }
    }
}

/// Receives conversation updates as they happen.
///
/// Implementations live in the presentation layer. Callbacks run on the
/// task that caused the change, never while conversation state is locked,
/// and in the order the changes were applied. A callback may read a
/// snapshot but must not issue scheduler operations.
pub trait ConversationObserver: Send + Sync {
    /// Called after a message is appended to the log
    fn on_message_appended(&self, message: &Message);

    /// Called when a participant starts or stops typing
    fn on_busy_changed(&self, participant: &ParticipantId, busy: bool);

    /// Called for every notice
    fn on_notice(&self, notice: &Notice);

    /// Called when a consensus or explanation starts or finishes loading
    fn on_loading_changed(&self, _activity: Activity, _loading: bool) {}

    /// Called after the log was cleared or a new conversation started
    fn on_conversation_reset(&self) {}
}

/// No-op observer for when nobody is watching
pub struct NoObserver;

impl ConversationObserver for NoObserver {
    fn on_message_appended(&self, _message: &Message) {}
    fn on_busy_changed(&self, _participant: &ParticipantId, _busy: bool) {}
    fn on_notice(&self, _notice: &Notice) {}
}

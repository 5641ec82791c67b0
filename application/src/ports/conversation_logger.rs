//! Port for the structured conversation transcript.
//!
//! Defines the [`ConversationLogger`] trait for recording what happened in a
//! conversation: prompts, replies, consensus entries, notices and resets.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while this port captures the transcript in a
//! machine-readable format (JSONL).

use super::observer::{Notice, Operation};
use roundtable_domain::Message;
use serde_json::{Value, json};

/// A structured conversation event for logging.
pub struct ConversationEvent {
    /// Event type identifier (e.g., "message", "notice", "conversation_cleared").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }

    /// A message was appended to the log
    pub fn message(message: &Message) -> Self {
        let payload = serde_json::to_value(message).unwrap_or_else(|_| {
            json!({ "id": message.id.value(), "sender": message.sender().as_str() })
        });
        Self::new("message", payload)
    }

    /// A notice was shown to the user
    pub fn notice(notice: &Notice) -> Self {
        Self::new(
            "notice",
            json!({
                "participant": notice.participant().map(|p| p.as_str()),
                "text": notice.to_string(),
            }),
        )
    }

    /// An operation was issued
    pub fn issued(operation: Operation, participants: &[&str]) -> Self {
        Self::new(
            "operation_issued",
            json!({ "operation": operation.as_str(), "participants": participants }),
        )
    }
}

/// Port for logging conversation events to a structured log.
///
/// `log` is synchronous and infallible; logging failures are ignored so
/// they never disturb a running conversation.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}

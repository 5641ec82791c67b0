//! Append-only conversation log

use super::message::{Message, MessageId, MessageKind};

/// Ordered, append-only list of messages.
///
/// Order is insertion order, which may differ from timestamp order when
/// concurrent operations settle out of issuance order. Message ids keep
/// increasing across [`clear`](ConversationLog::clear) so they stay unique
/// for the whole session.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    messages: Vec<Message>,
    next_id: u64,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one message and return a copy of it.
    pub fn append(&mut self, kind: MessageKind, content: impl Into<String>) -> Message {
        self.next_id += 1;
        let message = Message::new(MessageId::new(self.next_id), kind, content);
        self.messages.push(message.clone());
        message
    }

    /// Append several messages back to back.
    pub fn append_batch(
        &mut self,
        entries: impl IntoIterator<Item = (MessageKind, String)>,
    ) -> Vec<Message> {
        entries
            .into_iter()
            .map(|(kind, content)| self.append(kind, content))
            .collect()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Content of the most recent user prompt.
    pub fn last_user_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.is_user())
            .map(|m| m.content.as_str())
    }

    /// The last `n` messages matching `filter`, oldest first.
    pub fn recent<F>(&self, n: usize, filter: F) -> Vec<&Message>
    where
        F: Fn(&Message) -> bool,
    {
        let mut window: Vec<&Message> = self
            .messages
            .iter()
            .rev()
            .filter(|m| filter(m))
            .take(n)
            .collect();
        window.reverse();
        window
    }
}

/// Render messages as `sender: content` blocks separated by blank lines.
pub fn format_transcript<'a>(messages: impl IntoIterator<Item = &'a Message>) -> String {
    messages
        .into_iter()
        .map(|m| format!("{}: {}", m.sender(), m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

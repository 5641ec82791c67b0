//! Prompt value object

use serde::{Deserialize, Serialize};

/// A validated user prompt (Value Object)
///
/// The text a user fans out to every selected participant.
/// Construction rejects empty or whitespace-only input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Prompt {
    content: String,
}

impl Prompt {
    /// Try to create a new prompt, returning None if invalid
    pub fn try_new(content: impl Into<String>) -> Option<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            None
        } else {
            Some(Self { content })
        }
    }

    /// Get the prompt content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Consume and return the inner content
    pub fn into_content(self) -> String {
        self.content
    }
}

impl std::fmt::Display for Prompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

impl TryFrom<String> for Prompt {
    type Error = crate::DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Prompt::try_new(value).ok_or(crate::DomainError::EmptyPrompt)
    }
}

impl From<Prompt> for String {
    fn from(prompt: Prompt) -> Self {
        prompt.content
    }
}

//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Prompt cannot be empty")]
    EmptyPrompt,

    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("Duplicate participant id: {0}")]
    DuplicateParticipant(String),

    #[error("Participant id cannot be empty")]
    EmptyParticipantId,
}

impl DomainError {
    /// Check if this error was caused by invalid user input
    pub fn is_validation(&self) -> bool {
        matches!(self, DomainError::EmptyPrompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_participant_display() {
        let error = DomainError::UnknownParticipant("mistral".to_string());
        assert_eq!(error.to_string(), "Unknown participant: mistral");
    }

    #[test]
    fn test_is_validation_check() {
        assert!(DomainError::EmptyPrompt.is_validation());
        assert!(!DomainError::EmptyParticipantId.is_validation());
        assert!(!DomainError::DuplicateParticipant("claude".to_string()).is_validation());
    }
}

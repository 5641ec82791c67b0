//! Participant registry
//!
//! Holds the configured participants in registry order, plus the snapshot
//! they were created from so a new conversation can start from scratch.

use super::entities::{Participant, ParticipantId};
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The set of configured LLM participants.
///
/// Ids are unique and immutable; the only mutations are the selection and
/// adversarial toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantRegistry {
    initial: Vec<Participant>,
    current: Vec<Participant>,
}

impl ParticipantRegistry {
    /// Build a registry from static configuration.
    pub fn new(participants: Vec<Participant>) -> Result<Self, DomainError> {
        let mut seen = HashSet::new();
        for p in &participants {
            if p.id().as_str().trim().is_empty() {
                return Err(DomainError::EmptyParticipantId);
            }
            if !seen.insert(p.id().clone()) {
                return Err(DomainError::DuplicateParticipant(p.id().to_string()));
            }
        }

        Ok(Self {
            initial: participants.clone(),
            current: participants,
        })
    }

    /// All participants in registry order.
    pub fn list(&self) -> &[Participant] {
        &self.current
    }

    pub fn get(&self, id: &str) -> Option<&Participant> {
        self.current.iter().find(|p| p.id().as_str() == id)
    }

    /// Selected participants in registry order.
    pub fn selected(&self) -> impl Iterator<Item = &Participant> {
        self.current.iter().filter(|p| p.is_selected())
    }

    pub fn selected_count(&self) -> usize {
        self.selected().count()
    }

    /// Flip the selection flag, returning the new value.
    pub fn toggle_selected(&mut self, id: &str) -> Result<bool, DomainError> {
        Ok(self.find_mut(id)?.toggle_selected())
    }

    /// Flip the adversarial flag, returning the new value.
    pub fn toggle_adversarial(&mut self, id: &str) -> Result<bool, DomainError> {
        Ok(self.find_mut(id)?.toggle_adversarial())
    }

    /// Restore the snapshot the registry was created from.
    pub fn reset(&mut self) {
        self.current = self.initial.clone();
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.current.iter().any(|p| p.id() == id)
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut Participant, DomainError> {
        self.current
            .iter_mut()
            .find(|p| p.id().as_str() == id)
            .ok_or_else(|| DomainError::UnknownParticipant(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ParticipantRegistry {
        ParticipantRegistry::new(vec![
            Participant::new("chatgpt", "ChatGPT"),
            Participant::new("claude", "Claude"),
            Participant::new("gemini", "Gemini").with_selected(false),
        ])
        .unwrap()
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = ParticipantRegistry::new(vec![
            Participant::new("claude", "Claude"),
            Participant::new("claude", "Claude 2"),
        ]);
        assert_eq!(
            result.unwrap_err(),
            DomainError::DuplicateParticipant("claude".to_string())
        );
    }

    #[test]
    fn test_empty_id_rejected() {
        let result = ParticipantRegistry::new(vec![Participant::new(" ", "Nobody")]);
        assert_eq!(result.unwrap_err(), DomainError::EmptyParticipantId);
    }

    #[test]
    fn test_selected_preserves_registry_order() {
        let reg = registry();
        let ids: Vec<_> = reg.selected().map(|p| p.id().as_str()).collect();
        assert_eq!(ids, vec!["chatgpt", "claude"]);
        assert_eq!(reg.selected_count(), 2);
    }

    #[test]
    fn test_toggles() {
        let mut reg = registry();
        assert!(reg.toggle_selected("gemini").unwrap());
        assert!(reg.get("gemini").unwrap().is_selected());

        assert!(reg.toggle_adversarial("claude").unwrap());
        assert!(!reg.toggle_adversarial("claude").unwrap());
    }

    #[test]
    fn test_toggle_unknown_participant() {
        let mut reg = registry();
        assert_eq!(
            reg.toggle_selected("mistral"),
            Err(DomainError::UnknownParticipant("mistral".to_string()))
        );
    }

    #[test]
    fn test_reset_restores_initial_snapshot() {
        let mut reg = registry();
        reg.toggle_selected("chatgpt").unwrap();
        reg.toggle_adversarial("claude").unwrap();

        reg.reset();

        assert!(reg.get("chatgpt").unwrap().is_selected());
        assert!(!reg.get("claude").unwrap().is_adversarial());
        assert!(!reg.get("gemini").unwrap().is_selected());
    }
}

//! Devil's advocate turn budget

use crate::participant::ParticipantId;
use std::collections::HashMap;
use thiserror::Error;

/// Default number of adversarial turns each participant may issue.
pub const DEFAULT_ADVERSARIAL_CAP: u32 = 100;

/// Returned when a participant has used up its adversarial turns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{participant} reached the maximum of {cap} devil's advocate turns")]
pub struct AdversarialCapReached {
    pub participant: ParticipantId,
    pub cap: u32,
}

/// Counts adversarial turns issued by each participant.
///
/// Survives clearing the log; only a new conversation resets it.
#[derive(Debug, Clone)]
pub struct AdversarialCounter {
    cap: u32,
    turns: HashMap<ParticipantId, u32>,
}

impl AdversarialCounter {
    pub fn new(cap: u32) -> Self {
        Self {
            cap,
            turns: HashMap::new(),
        }
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    pub fn count(&self, id: &ParticipantId) -> u32 {
        self.turns.get(id).copied().unwrap_or(0)
    }

    /// Check the cap and count one more turn in a single step.
    ///
    /// Returns the new count, or an error without counting anything.
    pub fn try_acquire(&mut self, id: &ParticipantId) -> Result<u32, AdversarialCapReached> {
        let count = self.turns.entry(id.clone()).or_insert(0);
        if *count >= self.cap {
            return Err(AdversarialCapReached {
                participant: id.clone(),
                cap: self.cap,
            });
        }
        *count += 1;
        Ok(*count)
    }

    pub fn reset(&mut self) {
        self.turns.clear();
    }
}

impl Default for AdversarialCounter {
    fn default() -> Self {
        Self::new(DEFAULT_ADVERSARIAL_CAP)
    }
}

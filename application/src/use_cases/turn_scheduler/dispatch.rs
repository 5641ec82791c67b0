//! Handles to issued operations

use crate::ports::observer::Operation;
use futures::future::join_all;
use roundtable_domain::{MessageId, ParticipantId};
use tokio::task::JoinHandle;
use tracing::warn;

/// How one spawned turn ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Messages were appended to the log
    Appended(Vec<MessageId>),
    /// The turn was skipped because its participant is out of adversarial turns
    CapReached { participant: ParticipantId, cap: u32 },
    /// The conversation was cleared before the turn settled
    Discarded,
    /// The task ended without settling (shutdown or panic)
    Aborted,
}

impl Outcome {
    pub fn appended(&self) -> &[MessageId] {
        match self {
            Outcome::Appended(ids) => ids,
            _ => &[],
        }
    }
}

/// An issued operation.
///
/// Dropping a `Dispatch` does not cancel anything; the spawned turns keep
/// running and settle on their own.
#[derive(Debug)]
pub struct Dispatch {
    operation: Operation,
    participants: Vec<ParticipantId>,
    handles: Vec<JoinHandle<Outcome>>,
}

impl Dispatch {
    pub(super) fn new(
        operation: Operation,
        participants: Vec<ParticipantId>,
        handles: Vec<JoinHandle<Outcome>>,
    ) -> Self {
        Self {
            operation,
            participants,
            handles,
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Participants the operation targets, in issuance order
    pub fn participants(&self) -> &[ParticipantId] {
        &self.participants
    }

    /// Wait for every spawned turn to settle.
    pub async fn settled(self) -> Vec<Outcome> {
        let operation = self.operation;
        join_all(self.handles)
            .await
            .into_iter()
            .map(|joined| {
                joined.unwrap_or_else(|e| {
                    warn!("{} task ended abnormally: {}", operation, e);
                    Outcome::Aborted
                })
            })
            .collect()
    }
}

//! Domain layer for roundtable
//!
//! This crate contains the core entities and value objects of a multi-model
//! chat. It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! - **Participant**: one configured LLM, with a selection flag and an
//!   independent devil's advocate flag
//! - **Conversation log**: append-only, ordered by insertion
//! - **Busy tracker**: per-participant typing indicator that stays set until
//!   the last outstanding operation settles
//! - **Adversarial counter**: caps the devil's advocate turns per participant

pub mod config;
pub mod conversation;
pub mod core;
pub mod participant;
pub mod prompt;
pub mod simulation;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigIssueCode, Severity};
pub use conversation::{
    AdversarialCapReached, AdversarialCounter, BusyTracker, CONSENSUS_SENDER, ConversationLog,
    DEFAULT_ADVERSARIAL_CAP, Interaction, Message, MessageId, MessageKind, Sender, USER_SENDER,
    format_transcript,
};
pub use core::{error::DomainError, prompt::Prompt};
pub use participant::{Appearance, Participant, ParticipantId, ParticipantRegistry, ResponseTimeRange};
pub use prompt::{
    ADVERSARIAL_REPLY_PREFIX, DEFAULT_ADVERSARIAL_PREFIX, FALLBACK_QUESTION, PromptTemplate,
};
pub use simulation::SimulatedResponder;

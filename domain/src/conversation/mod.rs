//! Conversation domain
//!
//! The state the turn scheduler owns: the append-only message log, the
//! per-participant busy tracker and the devil's advocate turn budget.

pub mod adversarial;
pub mod busy;
pub mod interaction;
pub mod log;
pub mod message;

pub use adversarial::{AdversarialCapReached, AdversarialCounter, DEFAULT_ADVERSARIAL_CAP};
pub use busy::BusyTracker;
pub use interaction::Interaction;
pub use log::{ConversationLog, format_transcript};
pub use message::{CONSENSUS_SENDER, Message, MessageId, MessageKind, Sender, USER_SENDER};

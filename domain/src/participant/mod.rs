//! Participant domain
//!
//! - [`Participant`] — one configured LLM endpoint
//! - [`ParticipantRegistry`] — the ordered set of participants for a session

pub mod entities;
pub mod registry;

pub use entities::{Appearance, Participant, ParticipantId, ResponseTimeRange};
pub use registry::ParticipantRegistry;

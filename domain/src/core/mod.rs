//! Core domain concepts shared across all subdomains.
//!
//! - [`prompt::Prompt`] — a validated prompt to fan out to participants
//! - [`error::DomainError`] — domain-level errors

pub mod error;
pub mod prompt;

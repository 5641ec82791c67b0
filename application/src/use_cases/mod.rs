//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod resolve_response;
pub mod turn_scheduler;

//! Configuration domain types
//!
//! Validation results shared by every configuration source.

pub mod validation;

pub use validation::{ConfigIssue, ConfigIssueCode, Severity};

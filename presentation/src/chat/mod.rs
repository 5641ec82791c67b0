//! Interactive chat module
//!
//! Provides a readline-based group chat with slash commands for every
//! conversation operation.

mod repl;

pub use repl::{ChatRepl, ReplCommand};

//! Presentation layer for roundtable
//!
//! This crate contains CLI definitions, the console formatter, typing
//! indicators, and the interactive chat REPL.

pub mod chat;
pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use chat::{ChatRepl, ReplCommand};
pub use cli::commands::{Cli, Command, KeysCommand};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::TypingIndicator;

//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for roundtable
#[derive(Parser, Debug)]
#[command(name = "roundtable")]
#[command(author, version, about = "Group chat with several LLMs at once")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = r#"
Roundtable puts several LLMs in one conversation. Your prompt goes to every
selected participant; from there you can let two of them talk directly, run a
group discussion, ask each for a consensus, or get the whole thread explained
simply.

Participants without an API key answer with simulated replies, so everything
works offline.

Configuration files are loaded from (in priority order):
1. --config <path>          Explicit config file
2. ./roundtable.toml        Project-level config
3. ~/.config/roundtable/config.toml   Global config

Example:
  roundtable "Is Rust a good first language?"
  roundtable                  (start the chat REPL)
  roundtable keys set claude sk-ant-...
"#)]
pub struct Cli {
    /// Prompt to send to every selected participant (starts the chat REPL when omitted)
    pub prompt: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and the effective configuration, then exit
    #[arg(long)]
    pub show_config: bool,

    /// Append the conversation as JSON lines to this file
    #[arg(long, value_name = "PATH")]
    pub conversation_log: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress typing indicators
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Manage stored API keys
    #[command(subcommand)]
    Keys(KeysCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum KeysCommand {
    /// Store the API key for a participant
    Set {
        /// Participant id (e.g. chatgpt, claude)
        participant: String,
        /// The API key
        secret: String,
    },
    /// List participants that have a key
    List,
    /// Remove the API key for a participant
    Remove {
        /// Participant id
        participant: String,
    },
}

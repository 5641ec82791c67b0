//! REPL (Read-Eval-Print Loop) for the group chat

use crate::ConsoleFormatter;
use colored::Colorize;
use roundtable_application::{Dispatch, SchedulerError, TurnScheduler};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// One line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Prompt(String),
    Toggle(String),
    Devil(String),
    Direct { from: String, to: String },
    Group,
    Consensus,
    Explain,
    New,
    Clear,
    Participants,
    Wait,
    Help,
    Quit,
}

impl ReplCommand {
    /// Parse a trimmed, non-empty input line.
    pub fn parse(line: &str) -> Result<Self, String> {
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(ReplCommand::Prompt(line.to_string()));
        };

        let mut words = rest.split_whitespace();
        let name = words.next().unwrap_or_default();
        let args: Vec<&str> = words.collect();

        let one = |usage: &str| match args.as_slice() {
            [id] => Ok(id.to_string()),
            _ => Err(format!("Usage: {}", usage)),
        };

        match name {
            "toggle" | "t" => one("/toggle <participant>").map(ReplCommand::Toggle),
            "devil" | "d" => one("/devil <participant>").map(ReplCommand::Devil),
            "direct" => match args.as_slice() {
                [from, to] => Ok(ReplCommand::Direct {
                    from: from.to_string(),
                    to: to.to_string(),
                }),
                _ => Err("Usage: /direct <from> <to>".to_string()),
            },
            "group" | "g" => Ok(ReplCommand::Group),
            "consensus" | "c" => Ok(ReplCommand::Consensus),
            "eli10" | "explain" => Ok(ReplCommand::Explain),
            "new" => Ok(ReplCommand::New),
            "clear" => Ok(ReplCommand::Clear),
            "participants" | "p" => Ok(ReplCommand::Participants),
            "wait" | "w" => Ok(ReplCommand::Wait),
            "help" | "h" | "?" => Ok(ReplCommand::Help),
            "quit" | "exit" | "q" => Ok(ReplCommand::Quit),
            _ => Err(format!(
                "Unknown command: /{}\nType /help for available commands",
                name
            )),
        }
    }
}

/// Interactive chat REPL
pub struct ChatRepl {
    scheduler: Arc<TurnScheduler>,
    formatter: ConsoleFormatter,
    history_path: Option<PathBuf>,
}

impl ChatRepl {
    pub fn new(scheduler: Arc<TurnScheduler>, formatter: ConsoleFormatter) -> Self {
        Self {
            scheduler,
            formatter,
            history_path: dirs::data_dir().map(|p| p.join("roundtable").join("history.txt")),
        }
    }

    /// Override where input history is kept (`None` disables it)
    pub fn with_history(mut self, path: Option<PathBuf>) -> Self {
        self.history_path = path;
        self
    }

    /// Run the interactive REPL
    pub async fn run(&self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        if let Some(ref path) = self.history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            match rl.readline(">>> ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(line);

                    match ReplCommand::parse(line) {
                        Ok(ReplCommand::Quit) => {
                            println!("Bye!");
                            break;
                        }
                        Ok(command) => self.execute(command).await,
                        Err(message) => println!("{}", message),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_path {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    async fn execute(&self, command: ReplCommand) {
        let scheduler = &self.scheduler;
        let issued: Result<Dispatch, SchedulerError> = match command {
            ReplCommand::Prompt(text) => scheduler.send_prompt(&text),
            ReplCommand::Direct { from, to } => scheduler.direct_turn(&from, &to),
            ReplCommand::Group => scheduler.group_discussion(),
            ReplCommand::Consensus => scheduler.request_consensus(),
            ReplCommand::Explain => scheduler.explain_simplified(),
            ReplCommand::Toggle(id) => {
                self.report_toggle(scheduler.toggle_selected(&id), &id, "selected", "deselected");
                return;
            }
            ReplCommand::Devil(id) => {
                self.report_toggle(
                    scheduler.toggle_adversarial(&id),
                    &id,
                    "is now playing devil's advocate",
                    "is no longer playing devil's advocate",
                );
                return;
            }
            ReplCommand::New => {
                scheduler.new_conversation();
                println!("{}", "Started a new conversation.".dimmed());
                return;
            }
            ReplCommand::Clear => {
                scheduler.clear_conversation();
                println!("{}", "Conversation cleared.".dimmed());
                return;
            }
            ReplCommand::Participants => {
                let snapshot = scheduler.snapshot();
                println!(
                    "{}",
                    self.formatter
                        .format_participants(&snapshot, |id| scheduler.adversarial_turns(id))
                );
                return;
            }
            ReplCommand::Wait => {
                scheduler.wait_idle().await;
                return;
            }
            ReplCommand::Help => {
                Self::print_help();
                return;
            }
            ReplCommand::Quit => return,
        };

        match issued {
            Ok(dispatch) => debug!(
                "Issued {} to {} participant(s)",
                dispatch.operation(),
                dispatch.participants().len()
            ),
            Err(e) => println!("{}", ConsoleFormatter::format_error(&e)),
        }
    }

    fn report_toggle(
        &self,
        result: Result<bool, SchedulerError>,
        id: &str,
        on: &str,
        off: &str,
    ) {
        match result {
            Ok(flag) => {
                let name = self.formatter.name(&id.into()).to_string();
                println!("{} {}", name.bold(), if flag { on } else { off });
            }
            Err(e) => println!("{}", ConsoleFormatter::format_error(&e)),
        }
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", ConsoleFormatter::header("Roundtable"));
        println!();
        let snapshot = self.scheduler.snapshot();
        let names: Vec<&str> = snapshot
            .participants
            .iter()
            .filter(|p| p.is_selected())
            .map(|p| p.display_name())
            .collect();
        println!("At the table: {}", names.join(", "));
        println!("Type a message to ask everyone, or /help for commands.");
        println!();
    }

    fn print_help() {
        println!();
        println!("Commands:");
        println!("  <text>                 - Ask every selected participant");
        println!("  /direct <from> <to>    - Let one participant answer another");
        println!("  /group, /g             - Run a group discussion round");
        println!("  /consensus, /c         - Ask each participant for the consensus");
        println!("  /eli10                 - Explain the discussion simply");
        println!("  /toggle <id>, /t       - Select or deselect a participant");
        println!("  /devil <id>, /d        - Toggle devil's advocate mode");
        println!("  /participants, /p      - Show participants");
        println!("  /wait, /w              - Wait until everyone has answered");
        println!("  /clear                 - Clear the messages");
        println!("  /new                   - Start over with the initial participants");
        println!("  /help, /h, /?          - Show this help");
        println!("  /quit, /exit, /q       - Exit chat");
        println!();
    }
}

//! Console output formatter for conversation messages

use colored::{Color, ColoredString, Colorize};
use roundtable_application::{ConversationSnapshot, Notice, SchedulerError};
use roundtable_domain::{Message, MessageKind, Participant, ParticipantId};
use std::collections::HashMap;

/// Display name and accent color of one participant
#[derive(Debug, Clone)]
struct Label {
    name: String,
    color: Option<Color>,
}

/// Formats conversation messages for console display
#[derive(Debug, Clone, Default)]
pub struct ConsoleFormatter {
    labels: HashMap<ParticipantId, Label>,
}

impl ConsoleFormatter {
    pub fn new(participants: &[Participant]) -> Self {
        let labels = participants
            .iter()
            .map(|p| {
                let label = Label {
                    name: p.display_name().to_string(),
                    color: p.appearance().color.as_deref().and_then(parse_hex_color),
                };
                (p.id().clone(), label)
            })
            .collect();
        Self { labels }
    }

    /// Display name for a participant, falling back to its id
    pub fn name<'a>(&'a self, id: &'a ParticipantId) -> &'a str {
        self.labels
            .get(id)
            .map(|label| label.name.as_str())
            .unwrap_or(id.as_str())
    }

    fn styled_name(&self, id: &ParticipantId) -> ColoredString {
        let name = self.name(id).bold();
        match self.labels.get(id).and_then(|label| label.color) {
            Some(color) => name.color(color),
            None => name,
        }
    }

    /// Format a single log entry
    pub fn format_message(&self, message: &Message) -> String {
        match &message.kind {
            MessageKind::UserPrompt => {
                format!("{} {}\n", "You:".cyan().bold(), message.content)
            }
            MessageKind::ModelReply {
                from,
                responding_to,
                adversarial,
            } => {
                let mut heading = format!("{}", self.styled_name(from));
                if let Some(to) = responding_to {
                    heading.push_str(&format!(" {} {}", "->".dimmed(), self.styled_name(to)));
                }
                if *adversarial {
                    heading.push_str(&format!(" {}", "[devil's advocate]".red()));
                }
                format!("{}\n{}\n", heading, Self::indent(&message.content, "  "))
            }
            MessageKind::ConsensusReply { from } => {
                let line = "-".repeat(40);
                format!(
                    "{}\n{} {}\n{}\n{}\n",
                    line.green(),
                    "Consensus".green().bold(),
                    self.styled_name(from),
                    Self::indent(&message.content, "  "),
                    line.green()
                )
            }
            MessageKind::SimplifiedExplanation { from } => format!(
                "{} {}\n{}\n",
                "Explained simply by".yellow().bold(),
                self.styled_name(from),
                Self::indent(&message.content, "  ")
            ),
        }
    }

    /// Format a whole log, one blank line between entries
    pub fn format_transcript<'a>(&self, messages: impl IntoIterator<Item = &'a Message>) -> String {
        messages
            .into_iter()
            .map(|m| self.format_message(m))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Participant list with selection, devil's advocate and typing state
    pub fn format_participants(
        &self,
        snapshot: &ConversationSnapshot,
        adversarial_turns: impl Fn(&ParticipantId) -> u32,
    ) -> String {
        let mut output = Self::section_header("Participants");
        for participant in &snapshot.participants {
            let id = participant.id();
            let mark = if participant.is_selected() {
                "[x]".green()
            } else {
                "[ ]".dimmed()
            };
            let mut line = format!("  {} {} ({})", mark, self.styled_name(id), id);
            if participant.is_adversarial() {
                line.push_str(&format!(
                    " {}",
                    format!("devil's advocate, {} turns", adversarial_turns(id)).red()
                ));
            }
            if snapshot.is_busy(id.as_str()) {
                line.push_str(&format!(" {}", "typing...".dimmed()));
            }
            output.push_str(&line);
            output.push('\n');
        }
        output
    }

    pub fn format_notice(notice: &Notice) -> String {
        if notice.is_informational() {
            format!("{} {}", "note:".yellow().bold(), notice)
        } else {
            format!("{} {}", "warning:".red().bold(), notice)
        }
    }

    pub fn format_error(error: &SchedulerError) -> String {
        if error.is_validation() {
            format!("{} {}", "!".yellow().bold(), error)
        } else {
            format!("{} {}", "Error:".red().bold(), error)
        }
    }

    pub fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Parse `#rrggbb` into a terminal color
pub fn parse_hex_color(value: &str) -> Option<Color> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Color::TrueColor {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
    })
}

//! JSONL file writer for conversation events.
//!
//! Each [`ConversationEvent`] becomes one JSON line carrying its `type` and a
//! `timestamp`. Lines are appended, so one file can hold several sessions.

use roundtable_application::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Conversation transcript writer, one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every line and on `Drop`.
pub struct JsonlConversationLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlConversationLogger {
    /// Open (or create) the log at `path`, creating parent directories.
    ///
    /// Returns `None` if the file cannot be opened; the caller then runs
    /// without a transcript.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create conversation log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!(
                    "Could not open conversation log file {}: {}",
                    path.display(),
                    e
                );
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(event: ConversationEvent) -> Value {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let mut map = match event.payload {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        map.insert("type".to_string(), Value::String(event.event_type.to_string()));
        map.insert("timestamp".to_string(), Value::String(timestamp));
        Value::Object(map)
    }
}

impl ConversationLogger for JsonlConversationLogger {
    fn log(&self, event: ConversationEvent) {
        let Ok(line) = serde_json::to_string(&Self::record(event)) else {
            return;
        };

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            warn!("Failed to write conversation log {}: {}", self.path.display(), e);
        }
    }
}

impl Drop for JsonlConversationLogger {
    fn drop(&mut self) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundtable_application::{Notice, Operation};
    use roundtable_domain::{Message, MessageId, MessageKind};

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.jsonl");
        let logger = JsonlConversationLogger::new(&path).unwrap();

        let prompt = Message::new(MessageId::new(1), MessageKind::UserPrompt, "What is Rust?");
        let reply = Message::new(
            MessageId::new(2),
            MessageKind::reply("claude".into(), false),
            "A systems language.",
        );
        logger.log(ConversationEvent::issued(Operation::SendPrompt, &["claude"]));
        logger.log(ConversationEvent::message(&prompt));
        logger.log(ConversationEvent::message(&reply));
        logger.log(ConversationEvent::notice(&Notice::AdversarialCapReached {
            participant: "claude".into(),
            cap: 3,
        }));
        drop(logger);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 4);
        for line in &lines {
            assert!(line.get("timestamp").is_some());
        }

        assert_eq!(lines[0]["type"], "operation_issued");
        assert_eq!(lines[0]["operation"], "send_prompt");
        assert_eq!(lines[1]["type"], "message");
        assert_eq!(lines[1]["content"], "What is Rust?");
        assert_eq!(lines[2]["content"], "A systems language.");
        assert_eq!(lines[3]["type"], "notice");
        assert_eq!(lines[3]["participant"], "claude");
    }

    #[test]
    fn test_appends_across_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("chat.jsonl");

        for _ in 0..2 {
            let logger = JsonlConversationLogger::new(&path).unwrap();
            logger.log(ConversationEvent::new(
                "conversation_started",
                serde_json::json!({}),
            ));
        }

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l["type"] == "conversation_started"));
    }

    #[test]
    fn test_non_object_payload_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wrapped.jsonl");
        let logger = JsonlConversationLogger::new(&path).unwrap();

        logger.log(ConversationEvent::new("raw", serde_json::json!("just text")));
        drop(logger);

        let lines = read_lines(&path);
        assert_eq!(lines[0]["type"], "raw");
        assert_eq!(lines[0]["data"], "just text");
    }

    #[test]
    fn test_directory_path_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(JsonlConversationLogger::new(dir.path()).is_none());
    }
}

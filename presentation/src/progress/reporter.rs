//! Typing indicators and live transcript output

use crate::output::console::ConsoleFormatter;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use roundtable_application::{Activity, ConversationObserver, Notice};
use roundtable_domain::{Message, ParticipantId};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Shows a spinner per typing participant and prints messages as they land.
pub struct TypingIndicator {
    multi: MultiProgress,
    formatter: ConsoleFormatter,
    spinners: Mutex<HashMap<String, ProgressBar>>,
    visible: bool,
    live_messages: bool,
}

impl TypingIndicator {
    /// `show_typing = false` keeps the bookkeeping but draws nothing.
    pub fn new(formatter: ConsoleFormatter, show_typing: bool) -> Self {
        let target = if show_typing {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        Self {
            multi: MultiProgress::with_draw_target(target),
            formatter,
            spinners: Mutex::new(HashMap::new()),
            visible: show_typing,
            live_messages: true,
        }
    }

    /// Print each message the moment it is appended (on by default)
    pub fn with_live_messages(mut self, live: bool) -> Self {
        self.live_messages = live;
        self
    }

    /// Keys of the spinners currently shown
    pub fn active(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, ProgressBar>> {
        self.spinners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn start(&self, key: String, prefix: String, message: &'static str) {
        let mut spinners = self.lock();
        if spinners.contains_key(&key) {
            return;
        }
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(Self::spinner_style());
        pb.set_prefix(prefix);
        pb.set_message(message);
        if self.visible {
            pb.enable_steady_tick(Duration::from_millis(100));
        }
        spinners.insert(key, pb);
    }

    fn stop(&self, key: &str) {
        if let Some(pb) = self.lock().remove(key) {
            pb.finish_and_clear();
            self.multi.remove(&pb);
        }
    }

    fn print(&self, text: &str) {
        if self.visible {
            // keeps spinners below the printed text
            let _ = self.multi.println(text);
        } else {
            println!("{}", text);
        }
    }
}

impl ConversationObserver for TypingIndicator {
    fn on_message_appended(&self, message: &Message) {
        if self.live_messages && !message.is_user() {
            self.print(&self.formatter.format_message(message));
        }
    }

    fn on_busy_changed(&self, participant: &ParticipantId, busy: bool) {
        if busy {
            let name = self.formatter.name(participant).to_string();
            self.start(participant.as_str().to_string(), name, "is typing...");
        } else {
            self.stop(participant.as_str());
        }
    }

    fn on_notice(&self, notice: &Notice) {
        self.print(&ConsoleFormatter::format_notice(notice));
    }

    fn on_loading_changed(&self, activity: Activity, loading: bool) {
        let (key, message) = match activity {
            Activity::Consensus => ("@consensus", "gathering views..."),
            Activity::Explain => ("@explain", "simplifying the discussion..."),
        };
        if loading {
            let prefix = match activity {
                Activity::Consensus => "Consensus",
                Activity::Explain => "Explanation",
            };
            self.start(key.to_string(), prefix.to_string(), message);
        } else {
            self.stop(key);
        }
    }

    fn on_conversation_reset(&self) {
        let keys: Vec<String> = self.lock().keys().cloned().collect();
        for key in keys {
            self.stop(&key);
        }
    }
}

//! Timing and context window configuration (`[timing]` and `[context]`)

use super::participants::FileRangeMs;
use roundtable_application::config::{ContextWindows, TurnTiming};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw `[timing]` section, all values in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTimingConfig {
    pub direct_turn_delay_ms: u64,
    pub group_stagger_ms: FileRangeMs,
    pub consensus_delay_ms: u64,
    pub explain_delay_ms: u64,
}

impl Default for FileTimingConfig {
    fn default() -> Self {
        Self {
            direct_turn_delay_ms: 2000,
            group_stagger_ms: FileRangeMs::new(1500, 3500),
            consensus_delay_ms: 3500,
            explain_delay_ms: 2000,
        }
    }
}

impl FileTimingConfig {
    pub fn to_turn_timing(&self) -> TurnTiming {
        TurnTiming {
            direct_turn_delay: Duration::from_millis(self.direct_turn_delay_ms),
            group_stagger: self.group_stagger_ms.to_range(),
            consensus_delay: Duration::from_millis(self.consensus_delay_ms),
            explain_delay: Duration::from_millis(self.explain_delay_ms),
        }
    }
}

/// Raw `[context]` section: how many log entries each interaction sees
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileContextConfig {
    pub direct_window: usize,
    pub group_window: usize,
    pub consensus_window: usize,
    pub explain_window: usize,
}

impl Default for FileContextConfig {
    fn default() -> Self {
        let windows = ContextWindows::default();
        Self {
            direct_window: windows.direct,
            group_window: windows.group,
            consensus_window: windows.consensus,
            explain_window: windows.explain,
        }
    }
}

impl FileContextConfig {
    pub fn to_windows(&self) -> ContextWindows {
        ContextWindows {
            direct: self.direct_window,
            group: self.group_window,
            consensus: self.consensus_window,
            explain: self.explain_window,
        }
    }
}

//! Scheduler parameters: adversarial policy, turn timing, context windows.
//!
//! These are application-layer concerns. Per-participant response-time
//! ranges live on the [`Participant`](roundtable_domain::Participant) itself.

use roundtable_domain::{DEFAULT_ADVERSARIAL_CAP, DEFAULT_ADVERSARIAL_PREFIX, ResponseTimeRange};
use std::time::Duration;

/// Delays between issuing an operation and resolving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnTiming {
    /// Delay before a direct turn resolves.
    pub direct_turn_delay: Duration,
    /// Range for the cumulative stagger between group discussion turns.
    pub group_stagger: ResponseTimeRange,
    /// Delay before consensus responses are requested.
    pub consensus_delay: Duration,
    /// Delay before a simplified explanation is requested.
    pub explain_delay: Duration,
}

impl Default for TurnTiming {
    fn default() -> Self {
        Self {
            direct_turn_delay: Duration::from_millis(2000),
            group_stagger: ResponseTimeRange::new(1500, 3500),
            consensus_delay: Duration::from_millis(3500),
            explain_delay: Duration::from_millis(2000),
        }
    }
}

impl TurnTiming {
    /// No delays at all.
    pub fn instant() -> Self {
        Self {
            direct_turn_delay: Duration::ZERO,
            group_stagger: ResponseTimeRange::instant(),
            consensus_delay: Duration::ZERO,
            explain_delay: Duration::ZERO,
        }
    }
}

/// How many log entries each interaction sees as context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextWindows {
    pub direct: usize,
    pub group: usize,
    pub consensus: usize,
    pub explain: usize,
}

impl Default for ContextWindows {
    fn default() -> Self {
        Self {
            direct: 3,
            group: 5,
            consensus: 10,
            explain: 10,
        }
    }
}

/// Configuration for the turn scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Maximum devil's advocate turns per participant and conversation.
    pub adversarial_cap: u32,
    /// Framing instruction prepended to fan-out prompts in adversarial mode.
    pub adversarial_prefix: String,
    pub timing: TurnTiming,
    pub windows: ContextWindows,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            adversarial_cap: DEFAULT_ADVERSARIAL_CAP,
            adversarial_prefix: DEFAULT_ADVERSARIAL_PREFIX.to_string(),
            timing: TurnTiming::default(),
            windows: ContextWindows::default(),
        }
    }
}

impl SchedulerConfig {
    /// Default policy without any artificial delay.
    pub fn instant() -> Self {
        Self {
            timing: TurnTiming::instant(),
            ..Self::default()
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_adversarial_cap(mut self, cap: u32) -> Self {
        self.adversarial_cap = cap;
        self
    }

    pub fn with_adversarial_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.adversarial_prefix = prefix.into();
        self
    }

    pub fn with_timing(mut self, timing: TurnTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_windows(mut self, windows: ContextWindows) -> Self {
        self.windows = windows;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timing_matches_stock_delays() {
        let timing = TurnTiming::default();
        assert_eq!(timing.direct_turn_delay, Duration::from_millis(2000));
        assert_eq!(timing.group_stagger.min_ms(), 1500);
        assert_eq!(timing.group_stagger.max_ms(), 3500);
        assert_eq!(timing.consensus_delay, Duration::from_millis(3500));
    }

    #[test]
    fn test_instant_keeps_policy() {
        let config = SchedulerConfig::instant().with_adversarial_cap(2);
        assert_eq!(config.adversarial_cap, 2);
        assert_eq!(config.timing.explain_delay, Duration::ZERO);
        assert_eq!(config.windows.group, 5);
    }
}

//! Participant entity and its value objects

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::time::Duration;

/// Stable identity of a participant (Value Object)
///
/// Doubles as the key for the participant's provider adapter and credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for ParticipantId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Simulated response-time window for a participant, in milliseconds.
///
/// Models the asymmetric latency of different remote providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseTimeRange {
    min_ms: u64,
    max_ms: u64,
}

impl ResponseTimeRange {
    /// Creates a range; bounds given in the wrong order are swapped.
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    /// A range that always yields zero delay.
    pub fn instant() -> Self {
        Self::new(0, 0)
    }

    pub fn min_ms(&self) -> u64 {
        self.min_ms
    }

    pub fn max_ms(&self) -> u64 {
        self.max_ms
    }

    pub fn min(&self) -> Duration {
        Duration::from_millis(self.min_ms)
    }

    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }
}

impl Default for ResponseTimeRange {
    fn default() -> Self {
        Self::new(1500, 3000)
    }
}

/// Display attributes of a participant. Opaque to the orchestration core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appearance {
    /// Accent color (e.g. `#10a37f`)
    pub color: Option<String>,
    /// Avatar image location
    pub avatar: Option<String>,
}

/// One configured LLM endpoint taking part in the conversation (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    id: ParticipantId,
    display_name: String,
    appearance: Appearance,
    selected: bool,
    adversarial: bool,
    response_time: ResponseTimeRange,
}

impl Participant {
    /// Creates a selected, non-adversarial participant.
    pub fn new(id: impl Into<ParticipantId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            appearance: Appearance::default(),
            selected: true,
            adversarial: false,
            response_time: ResponseTimeRange::default(),
        }
    }

    pub fn with_appearance(mut self, appearance: Appearance) -> Self {
        self.appearance = appearance;
        self
    }

    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn with_adversarial(mut self, adversarial: bool) -> Self {
        self.adversarial = adversarial;
        self
    }

    pub fn with_response_time(mut self, range: ResponseTimeRange) -> Self {
        self.response_time = range;
        self
    }

    pub fn id(&self) -> &ParticipantId {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn appearance(&self) -> &Appearance {
        &self.appearance
    }

    /// Whether this participant takes part in fan-out operations.
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Whether this participant argues as devil's advocate.
    pub fn is_adversarial(&self) -> bool {
        self.adversarial
    }

    pub fn response_time(&self) -> ResponseTimeRange {
        self.response_time
    }

    pub(crate) fn toggle_selected(&mut self) -> bool {
        self.selected = !self.selected;
        self.selected
    }

    pub(crate) fn toggle_adversarial(&mut self) -> bool {
        self.adversarial = !self.adversarial;
        self.adversarial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_time_range_swaps_inverted_bounds() {
        let range = ResponseTimeRange::new(3000, 1500);
        assert_eq!(range.min_ms(), 1500);
        assert_eq!(range.max_ms(), 3000);
    }

    #[test]
    fn test_participant_defaults() {
        let p = Participant::new("claude", "Claude");
        assert_eq!(p.id().as_str(), "claude");
        assert!(p.is_selected());
        assert!(!p.is_adversarial());
    }

    #[test]
    fn test_participant_id_serializes_as_plain_string() {
        let id = ParticipantId::from("gemini");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"gemini\"");
    }
}

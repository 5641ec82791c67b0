//! Per-participant busy (typing) tracking

use crate::participant::ParticipantId;
use std::collections::{BTreeMap, HashMap};

/// Counts outstanding operations per participant.
///
/// A participant is busy while at least one operation targeting it is
/// pending, so overlapping operations never clear the flag early.
#[derive(Debug, Clone, Default)]
pub struct BusyTracker {
    pending: HashMap<ParticipantId, usize>,
}

impl BusyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one more pending operation. Returns true if the participant
    /// just became busy.
    pub fn begin(&mut self, id: &ParticipantId) -> bool {
        let count = self.pending.entry(id.clone()).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Record a settled operation. Returns true if the participant just
    /// became idle. Settling an idle participant is a no-op.
    pub fn finish(&mut self, id: &ParticipantId) -> bool {
        match self.pending.get_mut(id) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                self.pending.remove(id);
                true
            }
            None => false,
        }
    }

    pub fn is_busy(&self, id: &ParticipantId) -> bool {
        self.pending.contains_key(id)
    }

    pub fn any_busy(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_count(&self, id: &ParticipantId) -> usize {
        self.pending.get(id).copied().unwrap_or(0)
    }

    /// Busy flag per participant, for the given participant ids.
    pub fn flags<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a ParticipantId>,
    ) -> BTreeMap<ParticipantId, bool> {
        ids.into_iter()
            .map(|id| (id.clone(), self.is_busy(id)))
            .collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlapping_operations_keep_busy_until_last_settles() {
        let mut busy = BusyTracker::new();
        let claude = ParticipantId::from("claude");

        assert!(busy.begin(&claude));
        assert!(!busy.begin(&claude));
        assert_eq!(busy.pending_count(&claude), 2);

        assert!(!busy.finish(&claude));
        assert!(busy.is_busy(&claude));

        assert!(busy.finish(&claude));
        assert!(!busy.is_busy(&claude));
        assert!(!busy.any_busy());
    }

    #[test]
    fn test_finish_on_idle_is_noop() {
        let mut busy = BusyTracker::new();
        assert!(!busy.finish(&"gemini".into()));
        assert!(!busy.any_busy());
    }

    #[test]
    fn test_flags_reports_every_requested_participant() {
        let mut busy = BusyTracker::new();
        let a = ParticipantId::from("a");
        let b = ParticipantId::from("b");
        busy.begin(&a);

        let flags = busy.flags([&a, &b]);
        assert_eq!(flags.get(&a), Some(&true));
        assert_eq!(flags.get(&b), Some(&false));
    }
}

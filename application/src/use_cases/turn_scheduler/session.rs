//! Shared conversation state and the guards that settle pending work.
//!
//! All mutation happens under the state lock; observer and logger callbacks
//! run after the lock is released. Each transition holds the order lock from
//! mutation until its events are published, so observers see transitions in
//! the order they were applied. Locks are taken order first, then state, then
//! the adversarial counter. Observer callbacks must not call back into the
//! scheduler's mutating operations.

use super::dispatch::Outcome;
use crate::config::SchedulerConfig;
use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use crate::ports::credential_store::CredentialStore;
use crate::ports::observer::{Activity, ConversationObserver, Notice, Operation};
use crate::use_cases::resolve_response::{Resolution, ResponseResolver};
use roundtable_domain::{
    AdversarialCounter, BusyTracker, ConversationLog, Message, MessageKind, Participant,
    ParticipantId, ParticipantRegistry,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Mutable state of one conversation
pub(super) struct ConversationState {
    /// Bumped by clear and new conversation; settlements from an older
    /// epoch are discarded.
    pub epoch: u64,
    pub log: ConversationLog,
    pub registry: ParticipantRegistry,
    pub busy: BusyTracker,
    pub consensus_pending: usize,
    pub explain_pending: usize,
}

impl ConversationState {
    /// Ids that are currently busy, in registry order
    pub fn busy_ids(&self) -> Vec<ParticipantId> {
        self.registry
            .list()
            .iter()
            .map(|p| p.id())
            .filter(|id| self.busy.is_busy(id))
            .cloned()
            .collect()
    }
}

/// Conversation state plus the adversarial counter, shared with every task
pub(super) struct SessionContext {
    order: Mutex<()>,
    state: Mutex<ConversationState>,
    adversarial: Mutex<AdversarialCounter>,
}

impl SessionContext {
    pub fn new(registry: ParticipantRegistry, adversarial_cap: u32) -> Self {
        Self {
            order: Mutex::new(()),
            state: Mutex::new(ConversationState {
                epoch: 0,
                log: ConversationLog::new(),
                registry,
                busy: BusyTracker::new(),
                consensus_pending: 0,
                explain_pending: 0,
            }),
            adversarial: Mutex::new(AdversarialCounter::new(adversarial_cap)),
        }
    }

    fn order(&self) -> MutexGuard<'_, ()> {
        self.order.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn adversarial(&self) -> MutexGuard<'_, AdversarialCounter> {
        self.adversarial
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Point-in-time copy of the conversation for rendering
#[derive(Debug, Clone)]
pub struct ConversationSnapshot {
    pub messages: Vec<Message>,
    pub participants: Vec<Participant>,
    pub busy: BTreeMap<ParticipantId, bool>,
    pub consensus_loading: bool,
    pub explain_loading: bool,
}

impl ConversationSnapshot {
    pub(super) fn capture(state: &ConversationState) -> Self {
        let participants = state.registry.list().to_vec();
        let busy = state.busy.flags(participants.iter().map(|p| p.id()));
        Self {
            messages: state.log.messages().to_vec(),
            participants,
            busy,
            consensus_loading: state.consensus_pending > 0,
            explain_loading: state.explain_pending > 0,
        }
    }

    pub fn any_busy(&self) -> bool {
        self.busy.values().any(|b| *b)
    }

    pub fn is_busy(&self, id: &str) -> bool {
        self.busy.get(id).copied().unwrap_or(false)
    }
}

/// Something observers should hear about once the lock is released
pub(super) enum Event {
    Message(Message),
    Busy(ParticipantId, bool),
    Loading(Activity, bool),
    Notice(Notice),
    Reset { fresh: bool },
}

/// Everything a spawned task needs, cheap to clone
#[derive(Clone)]
pub(super) struct Shared {
    pub config: Arc<SchedulerConfig>,
    pub session: Arc<SessionContext>,
    pub resolver: Arc<ResponseResolver>,
    pub credentials: Arc<dyn CredentialStore>,
    pub observer: Arc<dyn ConversationObserver>,
    pub logger: Arc<dyn ConversationLogger>,
    pub shutdown: CancellationToken,
}

impl Shared {
    /// Apply one state transition and publish the events it collected.
    ///
    /// The state lock is released before publishing; the order lock is held
    /// throughout.
    pub fn transition<R>(
        &self,
        apply: impl FnOnce(&mut ConversationState, &mut Vec<Event>) -> R,
    ) -> R {
        let _order = self.session.order();
        let mut events = Vec::new();
        let result = {
            let mut state = self.session.state();
            apply(&mut *state, &mut events)
        };
        self.publish(events);
        result
    }

    fn publish(&self, events: Vec<Event>) {
        for event in events {
            match event {
                Event::Message(message) => {
                    self.logger.log(ConversationEvent::message(&message));
                    self.observer.on_message_appended(&message);
                }
                Event::Busy(participant, busy) => {
                    self.observer.on_busy_changed(&participant, busy);
                }
                Event::Loading(activity, loading) => {
                    self.observer.on_loading_changed(activity, loading);
                }
                Event::Notice(notice) => {
                    self.logger.log(ConversationEvent::notice(&notice));
                    self.observer.on_notice(&notice);
                }
                Event::Reset { fresh } => {
                    let event_type = if fresh {
                        "conversation_started"
                    } else {
                        "conversation_cleared"
                    };
                    self.logger.log(ConversationEvent::new(event_type, json!({})));
                    self.observer.on_conversation_reset();
                }
            }
        }
    }

    pub fn notify(&self, notice: Notice) {
        let _order = self.session.order();
        self.publish(vec![Event::Notice(notice)]);
    }

    /// Run `work` unless the scheduler shuts down first.
    ///
    /// Dropping `work` on shutdown drops any lease it owns, which releases
    /// busy and loading state.
    pub async fn run<F>(&self, work: F) -> Outcome
    where
        F: Future<Output = Outcome>,
    {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Outcome::Aborted,
            outcome = work => outcome,
        }
    }
}

/// Notice for a resolution that fell back to the simulated response
pub(super) fn fallback_notice(participant: &ParticipantId, resolution: &Resolution) -> Option<Notice> {
    resolution.error().map(|err| Notice::ProviderFailed {
        participant: participant.clone(),
        message: format!("{}: {}", err.kind, err.message),
    })
}

/// One pending busy count for one participant.
///
/// Created right after the transition that called `busy.begin`. Settling
/// appends the reply and releases the count; dropping releases the count only.
pub(super) struct BusyLease {
    shared: Shared,
    participant: ParticipantId,
    epoch: u64,
    released: bool,
}

impl BusyLease {
    pub fn new(shared: Shared, participant: ParticipantId, epoch: u64) -> Self {
        Self {
            shared,
            participant,
            epoch,
            released: false,
        }
    }

    pub fn settle(mut self, kind: MessageKind, content: String, notice: Option<Notice>) -> Outcome {
        self.released = true;
        let participant = &self.participant;
        let epoch = self.epoch;

        self.shared.transition(|state, events| {
            events.extend(notice.map(Event::Notice));
            if state.epoch != epoch {
                debug!("Discarding stale reply from {} (epoch {})", participant, epoch);
                return Outcome::Discarded;
            }
            let message = state.log.append(kind, content);
            let id = message.id;
            events.push(Event::Message(message));
            if state.busy.finish(participant) {
                events.push(Event::Busy(participant.clone(), false));
            }
            Outcome::Appended(vec![id])
        })
    }
}

impl Drop for BusyLease {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        debug!("Released busy lease for {} without a reply", self.participant);
        let participant = &self.participant;
        let epoch = self.epoch;
        self.shared.transition(|state, events| {
            if state.epoch == epoch && state.busy.finish(participant) {
                events.push(Event::Busy(participant.clone(), false));
            }
        });
    }
}

/// A pending consensus batch.
///
/// Holds every selected participant's busy count and one consensus loading
/// count. Either the whole batch is committed or, when dropped, nothing is
/// appended and an abort notice is raised.
pub(super) struct ConsensusBatch {
    shared: Shared,
    participants: Vec<ParticipantId>,
    epoch: u64,
    committed: bool,
}

impl ConsensusBatch {
    pub fn new(shared: Shared, participants: Vec<ParticipantId>, epoch: u64) -> Self {
        Self {
            shared,
            participants,
            epoch,
            committed: false,
        }
    }

    pub fn commit(mut self, entries: Vec<(ParticipantId, String)>, notices: Vec<Notice>) -> Outcome {
        self.committed = true;
        let participants = &self.participants;
        let epoch = self.epoch;

        self.shared.transition(|state, events| {
            events.extend(notices.into_iter().map(Event::Notice));
            if state.epoch != epoch {
                debug!("Discarding stale consensus batch (epoch {})", epoch);
                return Outcome::Discarded;
            }
            let appended = state.log.append_batch(
                entries
                    .into_iter()
                    .map(|(from, content)| (MessageKind::ConsensusReply { from }, content)),
            );
            let ids = appended.iter().map(|m| m.id).collect();
            events.extend(appended.into_iter().map(Event::Message));
            release(state, participants, events);
            Outcome::Appended(ids)
        })
    }
}

impl Drop for ConsensusBatch {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let participants = &self.participants;
        let epoch = self.epoch;
        self.shared.transition(|state, events| {
            if state.epoch == epoch {
                release(state, participants, events);
            }
            events.push(Event::Notice(Notice::OperationAborted {
                operation: Operation::Consensus,
                reason: "interrupted before every response arrived".to_string(),
            }));
        });
    }
}

fn release(state: &mut ConversationState, participants: &[ParticipantId], events: &mut Vec<Event>) {
    for id in participants {
        if state.busy.finish(id) {
            events.push(Event::Busy(id.clone(), false));
        }
    }
    state.consensus_pending = state.consensus_pending.saturating_sub(1);
    if state.consensus_pending == 0 {
        events.push(Event::Loading(Activity::Consensus, false));
    }
}

/// A pending simplified explanation; holds one explain loading count.
pub(super) struct ExplainLease {
    shared: Shared,
    epoch: u64,
    released: bool,
}

impl ExplainLease {
    pub fn new(shared: Shared, epoch: u64) -> Self {
        Self {
            shared,
            epoch,
            released: false,
        }
    }

    pub fn settle(mut self, from: ParticipantId, content: String, notice: Option<Notice>) -> Outcome {
        self.released = true;
        let epoch = self.epoch;

        self.shared.transition(|state, events| {
            events.extend(notice.map(Event::Notice));
            if state.epoch != epoch {
                debug!("Discarding stale explanation from {}", from);
                return Outcome::Discarded;
            }
            let message = state
                .log
                .append(MessageKind::SimplifiedExplanation { from }, content);
            let id = message.id;
            events.push(Event::Message(message));
            finish_explain(state, events);
            Outcome::Appended(vec![id])
        })
    }
}

impl Drop for ExplainLease {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let epoch = self.epoch;
        self.shared.transition(|state, events| {
            if state.epoch == epoch {
                finish_explain(state, events);
            }
        });
    }
}

fn finish_explain(state: &mut ConversationState, events: &mut Vec<Event>) {
    state.explain_pending = state.explain_pending.saturating_sub(1);
    if state.explain_pending == 0 {
        events.push(Event::Loading(Activity::Explain, false));
    }
}

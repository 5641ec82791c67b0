//! Turn scheduler: the orchestration core.
//!
//! Owns the conversation log, per-participant busy counts and the adversarial
//! counter. Every operation validates synchronously, records its issuance in
//! one state transition, and spawns one task per participant turn. Tasks
//! settle independently, in completion order, through the guards in
//! [`session`].

mod dispatch;
mod session;
#[cfg(test)]
mod tests;

pub use dispatch::{Dispatch, Outcome};
pub use session::ConversationSnapshot;

use crate::config::SchedulerConfig;
use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger};
use crate::ports::credential_store::{CredentialSet, CredentialStore};
use crate::ports::observer::{Activity, ConversationObserver, NoObserver, Notice, Operation};
use crate::use_cases::resolve_response::{Resolution, ResponseResolver};
use rand::Rng;
use roundtable_domain::{
    AdversarialCapReached, DomainError, FALLBACK_QUESTION, Interaction, MessageKind,
    ParticipantId, ParticipantRegistry, Prompt, PromptTemplate, ResponseTimeRange, Sender,
    format_transcript,
};
use session::{BusyLease, ConsensusBatch, Event, ExplainLease, SessionContext, Shared, fallback_notice};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// Errors returned synchronously when an operation cannot be issued.
///
/// None of these mutate conversation state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Prompt cannot be empty")]
    EmptyPrompt,

    #[error("No participants selected")]
    NoParticipantsSelected,

    #[error("Participant {0} is not selected")]
    ParticipantNotSelected(ParticipantId),

    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("At least {required} participants must be selected ({selected} selected)")]
    InsufficientParticipants { required: usize, selected: usize },

    #[error("{participant} reached the maximum of {cap} devil's advocate turns")]
    AdversarialCapReached { participant: ParticipantId, cap: u32 },

    #[error(transparent)]
    Domain(DomainError),
}

impl SchedulerError {
    /// Input problems the user can fix by changing the request or selection
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SchedulerError::EmptyPrompt
                | SchedulerError::NoParticipantsSelected
                | SchedulerError::ParticipantNotSelected(_)
                | SchedulerError::UnknownParticipant(_)
                | SchedulerError::InsufficientParticipants { .. }
        )
    }
}

impl From<DomainError> for SchedulerError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::EmptyPrompt => SchedulerError::EmptyPrompt,
            DomainError::UnknownParticipant(id) => SchedulerError::UnknownParticipant(id),
            other => SchedulerError::Domain(other),
        }
    }
}

impl From<AdversarialCapReached> for SchedulerError {
    fn from(err: AdversarialCapReached) -> Self {
        SchedulerError::AdversarialCapReached {
            participant: err.participant,
            cap: err.cap,
        }
    }
}

/// Draw a delay uniformly from `range`.
fn sample_delay(range: ResponseTimeRange) -> Duration {
    if range.min_ms() >= range.max_ms() {
        return range.min();
    }
    Duration::from_millis(rand::rng().random_range(range.min_ms()..=range.max_ms()))
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// The single mutation entry point for a conversation.
pub struct TurnScheduler {
    shared: Shared,
    tracker: TaskTracker,
}

impl TurnScheduler {
    pub fn new(
        config: SchedulerConfig,
        registry: ParticipantRegistry,
        resolver: Arc<ResponseResolver>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        let session = SessionContext::new(registry, config.adversarial_cap);
        Self {
            shared: Shared {
                config: Arc::new(config),
                session: Arc::new(session),
                resolver,
                credentials,
                observer: Arc::new(NoObserver),
                logger: Arc::new(NoConversationLogger),
                shutdown: CancellationToken::new(),
            },
            tracker: TaskTracker::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ConversationObserver>) -> Self {
        self.shared.observer = observer;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.shared.logger = logger;
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.shared.config
    }

    // ==================== Operations ====================

    /// Fan a prompt out to every selected participant.
    pub fn send_prompt(&self, text: &str) -> Result<Dispatch, SchedulerError> {
        let prompt = Prompt::try_new(text).ok_or(SchedulerError::EmptyPrompt)?;

        let (epoch, targets) = self.shared.transition(|state, events| -> Result<_, SchedulerError> {
            let targets: Vec<(ParticipantId, bool, ResponseTimeRange)> = state
                .registry
                .selected()
                .map(|p| (p.id().clone(), p.is_adversarial(), p.response_time()))
                .collect();
            if targets.is_empty() {
                return Err(SchedulerError::NoParticipantsSelected);
            }

            let message = state.log.append(MessageKind::UserPrompt, prompt.content());
            events.push(Event::Message(message));
            for (id, _, _) in &targets {
                if state.busy.begin(id) {
                    events.push(Event::Busy(id.clone(), true));
                }
            }
            Ok((state.epoch, targets))
        })?;

        let ids: Vec<ParticipantId> = targets.iter().map(|(id, _, _)| id.clone()).collect();
        self.log_issued(Operation::SendPrompt, &ids);
        info!("Sending prompt to {} participant(s)", ids.len());

        let credentials = Arc::new(self.shared.credentials.get());
        let handles = targets
            .into_iter()
            .map(|(id, adversarial, range)| {
                let lease = BusyLease::new(self.shared.clone(), id.clone(), epoch);
                let delay = sample_delay(range);
                let effective = if adversarial {
                    PromptTemplate::adversarial(&self.shared.config.adversarial_prefix, prompt.content())
                } else {
                    prompt.content().to_string()
                };
                let shared = self.shared.clone();
                let credentials = Arc::clone(&credentials);

                self.tracker.spawn(async move {
                    shared
                        .run(async {
                            pause(delay).await;
                            let resolution = shared
                                .resolver
                                .resolve(&id, &Interaction::Prompt, &effective, &credentials)
                                .await;
                            debug!("{} settled after {:?}", id, delay);
                            let notice = fallback_notice(&id, &resolution);
                            lease.settle(
                                MessageKind::reply(id.clone(), adversarial),
                                resolution.content,
                                notice,
                            )
                        })
                        .await
                })
            })
            .collect();

        Ok(Dispatch::new(Operation::SendPrompt, ids, handles))
    }

    /// Ask `from` to reply to `to`.
    pub fn direct_turn(&self, from: &str, to: &str) -> Result<Dispatch, SchedulerError> {
        let windows = self.shared.config.windows;

        let issued = self.shared.transition(|state, events| -> Result<_, SchedulerError> {
            let from_p = state
                .registry
                .get(from)
                .ok_or_else(|| SchedulerError::UnknownParticipant(from.to_string()))?;
            let to_p = state
                .registry
                .get(to)
                .ok_or_else(|| SchedulerError::UnknownParticipant(to.to_string()))?;
            if !from_p.is_selected() {
                return Err(SchedulerError::ParticipantNotSelected(from_p.id().clone()));
            }
            if !to_p.is_selected() {
                return Err(SchedulerError::ParticipantNotSelected(to_p.id().clone()));
            }

            let from_id = from_p.id().clone();
            let to_id = to_p.id().clone();
            let adversarial = from_p.is_adversarial();
            let context = format_transcript(state.log.recent(windows.direct, |m| {
                m.is_user() || matches!(m.sender(), Sender::Participant(id) if *id == to_id)
            }));
            let prompt = PromptTemplate::direct_reply(
                from_p.display_name(),
                to_p.display_name(),
                &PromptTemplate::reply_context(&context, adversarial),
            );

            if adversarial {
                let turns = self.shared.session.adversarial().try_acquire(&from_id)?;
                debug!("{} adversarial turn {}", from_id, turns);
            }

            if state.busy.begin(&from_id) {
                events.push(Event::Busy(from_id.clone(), true));
            }
            Ok((state.epoch, from_id, to_id, prompt, adversarial))
        });
        if let Err(SchedulerError::AdversarialCapReached { participant, cap }) = &issued {
            info!("{} reached the devil's advocate cap of {}", participant, cap);
            self.shared.logger.log(ConversationEvent::notice(&Notice::AdversarialCapReached {
                participant: participant.clone(),
                cap: *cap,
            }));
        }
        let (epoch, from_id, to_id, prompt, adversarial) = issued?;

        self.log_issued(Operation::DirectTurn, &[from_id.clone(), to_id.clone()]);
        info!("Direct turn: {} replies to {}", from_id, to_id);

        let lease = BusyLease::new(self.shared.clone(), from_id.clone(), epoch);
        let delay = self.shared.config.timing.direct_turn_delay;
        let credentials = self.shared.credentials.get();
        let shared = self.shared.clone();
        let participants = vec![from_id.clone(), to_id.clone()];

        let handle = self.tracker.spawn(async move {
            shared
                .run(async {
                    pause(delay).await;
                    let interaction = Interaction::Reply { to: to_id.clone() };
                    let resolution = shared
                        .resolver
                        .resolve(&from_id, &interaction, &prompt, &credentials)
                        .await;
                    let notice = fallback_notice(&from_id, &resolution);
                    lease.settle(
                        MessageKind::reply_to(from_id.clone(), to_id.clone(), adversarial),
                        resolution.content,
                        notice,
                    )
                })
                .await
        });

        Ok(Dispatch::new(Operation::DirectTurn, participants, vec![handle]))
    }

    /// Round-robin discussion: each selected participant replies to the next
    /// one in registry order, with staggered start times.
    pub fn group_discussion(&self) -> Result<Dispatch, SchedulerError> {
        let (epoch, ring) = {
            let state = self.shared.session.state();
            let ring: Vec<(ParticipantId, String)> = state
                .registry
                .selected()
                .map(|p| (p.id().clone(), p.display_name().to_string()))
                .collect();
            if ring.len() < 3 {
                return Err(SchedulerError::InsufficientParticipants {
                    required: 3,
                    selected: ring.len(),
                });
            }
            (state.epoch, ring)
        };

        let ids: Vec<ParticipantId> = ring.iter().map(|(id, _)| id.clone()).collect();
        self.log_issued(Operation::GroupDiscussion, &ids);
        info!("Starting group discussion with {} participants", ring.len());

        let credentials = Arc::new(self.shared.credentials.get());
        let mut offset = Duration::ZERO;
        let mut handles = Vec::with_capacity(ring.len());
        for (i, from) in ring.iter().enumerate() {
            offset += sample_delay(self.shared.config.timing.group_stagger);
            let to = ring[(i + 1) % ring.len()].clone();
            let from = from.clone();
            let shared = self.shared.clone();
            let credentials = Arc::clone(&credentials);
            let start = offset;

            handles.push(self.tracker.spawn(async move {
                shared
                    .run(async {
                        pause(start).await;
                        group_turn(&shared, epoch, from, to, &credentials).await
                    })
                    .await
            }));
        }

        Ok(Dispatch::new(Operation::GroupDiscussion, ids, handles))
    }

    /// Ask every selected participant for its consensus view and append the
    /// answers as one batch.
    pub fn request_consensus(&self) -> Result<Dispatch, SchedulerError> {
        let windows = self.shared.config.windows;

        let (epoch, members, question, discussion) = self.shared.transition(|state, events| -> Result<_, SchedulerError> {
            let members: Vec<(ParticipantId, String)> = state
                .registry
                .selected()
                .map(|p| (p.id().clone(), p.display_name().to_string()))
                .collect();
            if members.len() < 2 {
                return Err(SchedulerError::InsufficientParticipants {
                    required: 2,
                    selected: members.len(),
                });
            }

            let question = state
                .log
                .last_user_prompt()
                .unwrap_or(FALLBACK_QUESTION)
                .to_string();
            let discussion = format_transcript(
                state
                    .log
                    .recent(windows.consensus, |m| !m.is_user() && !m.is_consensus()),
            );

            for (id, _) in &members {
                if state.busy.begin(id) {
                    events.push(Event::Busy(id.clone(), true));
                }
            }
            state.consensus_pending += 1;
            if state.consensus_pending == 1 {
                events.push(Event::Loading(Activity::Consensus, true));
            }
            Ok((state.epoch, members, question, discussion))
        })?;

        let ids: Vec<ParticipantId> = members.iter().map(|(id, _)| id.clone()).collect();
        self.log_issued(Operation::Consensus, &ids);
        info!("Requesting consensus from {} participants", ids.len());

        let batch = ConsensusBatch::new(self.shared.clone(), ids.clone(), epoch);
        let delay = self.shared.config.timing.consensus_delay;
        let credentials = Arc::new(self.shared.credentials.get());
        let shared = self.shared.clone();

        let handle = self.tracker.spawn(async move {
            shared
                .run(async {
                    pause(delay).await;
                    let prompts: Vec<String> = members
                        .iter()
                        .map(|(_, name)| PromptTemplate::consensus(name, &question, &discussion))
                        .collect();
                    let results = collect_consensus(&shared, &members, &prompts, &credentials).await;

                    let mut notices = Vec::new();
                    let entries = members
                        .iter()
                        .zip(prompts.iter())
                        .zip(results)
                        .map(|(((id, _), prompt), result)| match result {
                            Some(resolution) => {
                                notices.extend(fallback_notice(id, &resolution));
                                (id.clone(), resolution.content)
                            }
                            None => (
                                id.clone(),
                                shared.resolver.simulated(id, &Interaction::Consensus, prompt),
                            ),
                        })
                        .collect();
                    batch.commit(entries, notices)
                })
                .await
        });

        Ok(Dispatch::new(Operation::Consensus, ids, vec![handle]))
    }

    /// Ask one randomly chosen selected participant to restate the
    /// discussion simply.
    pub fn explain_simplified(&self) -> Result<Dispatch, SchedulerError> {
        let windows = self.shared.config.windows;

        let (epoch, chosen, transcript) = self.shared.transition(|state, events| -> Result<_, SchedulerError> {
            let selected: Vec<ParticipantId> =
                state.registry.selected().map(|p| p.id().clone()).collect();
            if selected.is_empty() {
                return Err(SchedulerError::NoParticipantsSelected);
            }
            let chosen = selected[rand::rng().random_range(0..selected.len())].clone();
            let transcript = format_transcript(state.log.recent(windows.explain, |_| true));

            state.explain_pending += 1;
            if state.explain_pending == 1 {
                events.push(Event::Loading(Activity::Explain, true));
            }
            Ok((state.epoch, chosen, transcript))
        })?;

        self.log_issued(Operation::Explain, std::slice::from_ref(&chosen));
        info!("{} will explain the discussion simply", chosen);

        let lease = ExplainLease::new(self.shared.clone(), epoch);
        let delay = self.shared.config.timing.explain_delay;
        let credentials = self.shared.credentials.get();
        let shared = self.shared.clone();
        let participants = vec![chosen.clone()];

        let handle = self.tracker.spawn(async move {
            shared
                .run(async {
                    pause(delay).await;
                    let prompt = PromptTemplate::explain_simply(&transcript);
                    let resolution = shared
                        .resolver
                        .resolve(&chosen, &Interaction::Explain, &prompt, &credentials)
                        .await;
                    let notice = fallback_notice(&chosen, &resolution);
                    lease.settle(chosen.clone(), resolution.content, notice)
                })
                .await
        });

        Ok(Dispatch::new(Operation::Explain, participants, vec![handle]))
    }

    // ==================== Registry intents ====================

    /// Flip a participant's selection, returning the new value.
    pub fn toggle_selected(&self, id: &str) -> Result<bool, SchedulerError> {
        let selected = self.shared.session.state().registry.toggle_selected(id)?;
        debug!("{} selected: {}", id, selected);
        Ok(selected)
    }

    /// Flip a participant's devil's advocate mode, returning the new value.
    pub fn toggle_adversarial(&self, id: &str) -> Result<bool, SchedulerError> {
        let adversarial = self.shared.session.state().registry.toggle_adversarial(id)?;
        debug!("{} adversarial: {}", id, adversarial);
        Ok(adversarial)
    }

    // ==================== Conversation lifecycle ====================

    /// Clear the log. Pending turns are discarded when they settle; the
    /// adversarial counter is kept.
    pub fn clear_conversation(&self) {
        self.reset(false);
        info!("Conversation cleared");
    }

    /// Start over: clear the log, restore the initial participants and
    /// reset the adversarial counter.
    pub fn new_conversation(&self) {
        self.reset(true);
        info!("New conversation started");
    }

    fn reset(&self, fresh: bool) {
        self.shared.transition(|state, events| {
            state.epoch += 1;
            for id in state.busy_ids() {
                events.push(Event::Busy(id, false));
            }
            state.busy.clear();
            state.log.clear();
            if state.consensus_pending > 0 {
                events.push(Event::Loading(Activity::Consensus, false));
            }
            if state.explain_pending > 0 {
                events.push(Event::Loading(Activity::Explain, false));
            }
            state.consensus_pending = 0;
            state.explain_pending = 0;

            if fresh {
                state.registry.reset();
                self.shared.session.adversarial().reset();
            }
            events.push(Event::Reset { fresh });
        });
    }

    // ==================== Observation ====================

    pub fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot::capture(&self.shared.session.state())
    }

    /// Whether any participant has a pending operation
    pub fn any_busy(&self) -> bool {
        self.shared.session.state().busy.any_busy()
    }

    /// Adversarial turns `id` has issued in this conversation
    pub fn adversarial_turns(&self, id: &ParticipantId) -> u32 {
        self.shared.session.adversarial().count(id)
    }

    /// Wait until every spawned turn has settled.
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Abort pending turns and wait for their guards to release state.
    pub async fn shutdown(&self) {
        self.shared.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }

    fn log_issued(&self, operation: Operation, participants: &[ParticipantId]) {
        let ids: Vec<&str> = participants.iter().map(|p| p.as_str()).collect();
        self.shared
            .logger
            .log(ConversationEvent::issued(operation, &ids));
    }
}

/// Fire one group discussion turn once its stagger has elapsed.
///
/// The adversarial check and the context read happen now, so later turns
/// see the replies of earlier ones.
async fn group_turn(
    shared: &Shared,
    epoch: u64,
    (from, from_name): (ParticipantId, String),
    (to, to_name): (ParticipantId, String),
    credentials: &CredentialSet,
) -> Outcome {
    let window = shared.config.windows.group;

    let issued = shared.transition(|state, events| {
        if state.epoch != epoch {
            debug!("Skipping group turn for {}: conversation was reset", from);
            return None;
        }
        let adversarial = state
            .registry
            .get(from.as_str())
            .is_some_and(|p| p.is_adversarial());
        let acquired = if adversarial {
            shared.session.adversarial().try_acquire(&from).map(|_| ())
        } else {
            Ok(())
        };

        Some(acquired.map(|()| {
            let context = format_transcript(state.log.recent(window, |_| true));
            if state.busy.begin(&from) {
                events.push(Event::Busy(from.clone(), true));
            }
            (adversarial, context)
        }))
    });

    let (adversarial, context) = match issued {
        None => return Outcome::Discarded,
        Some(Ok(issued)) => issued,
        Some(Err(cap)) => {
            info!("{}", cap);
            shared.notify(Notice::AdversarialCapReached {
                participant: cap.participant.clone(),
                cap: cap.cap,
            });
            return Outcome::CapReached {
                participant: cap.participant,
                cap: cap.cap,
            };
        }
    };

    let lease = BusyLease::new(shared.clone(), from.clone(), epoch);

    let prompt = PromptTemplate::direct_reply(
        &from_name,
        &to_name,
        &PromptTemplate::reply_context(&context, adversarial),
    );
    let interaction = Interaction::Reply { to: to.clone() };
    let resolution = shared
        .resolver
        .resolve(&from, &interaction, &prompt, credentials)
        .await;
    let notice = fallback_notice(&from, &resolution);
    lease.settle(
        MessageKind::reply_to(from, to, adversarial),
        resolution.content,
        notice,
    )
}

/// Resolve every member's consensus concurrently and wait for all of them.
///
/// A member whose task failed gets `None`; the caller substitutes the
/// simulated response so the batch is always complete.
async fn collect_consensus(
    shared: &Shared,
    members: &[(ParticipantId, String)],
    prompts: &[String],
    credentials: &Arc<CredentialSet>,
) -> Vec<Option<Resolution>> {
    let mut join_set = JoinSet::new();
    for (index, ((id, _), prompt)) in members.iter().zip(prompts).enumerate() {
        let resolver = Arc::clone(&shared.resolver);
        let credentials = Arc::clone(credentials);
        let id = id.clone();
        let prompt = prompt.clone();
        join_set.spawn(async move {
            let resolution = resolver
                .resolve(&id, &Interaction::Consensus, &prompt, &credentials)
                .await;
            (index, resolution)
        });
    }

    let mut results: Vec<Option<Resolution>> = vec![None; members.len()];
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, resolution)) => results[index] = Some(resolution),
            Err(e) => warn!("Consensus task failed, using simulated response: {}", e),
        }
    }
    results
}

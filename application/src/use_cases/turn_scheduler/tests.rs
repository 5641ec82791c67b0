use super::*;
use crate::ports::conversation_logger::ConversationEvent;
use crate::ports::credential_store::InMemoryCredentialStore;
use crate::ports::provider::{ProviderAdapter, ProviderError, ProviderRegistry};
use async_trait::async_trait;
use roundtable_domain::{DEFAULT_ADVERSARIAL_PREFIX, Message, MessageId, Participant};
use secrecy::SecretString;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio::sync::Notify;

// ==================== Test doubles ====================

/// Answers immediately and remembers every prompt it was sent
struct Recording {
    id: ParticipantId,
    prompts: Mutex<Vec<String>>,
}

impl Recording {
    fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderAdapter for Recording {
    fn provider_id(&self) -> &ParticipantId {
        &self.id
    }

    fn kind(&self) -> &'static str {
        "recording"
    }

    async fn invoke(&self, _credential: &SecretString, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(format!("live answer from {}", self.id))
    }
}

/// Always fails with a 500
struct Failing(ParticipantId);

#[async_trait]
impl ProviderAdapter for Failing {
    fn provider_id(&self) -> &ParticipantId {
        &self.0
    }

    fn kind(&self) -> &'static str {
        "failing"
    }

    async fn invoke(&self, _credential: &SecretString, _prompt: &str) -> Result<String, ProviderError> {
        Err(ProviderError::status(self.0.clone(), 500, "internal error"))
    }
}

/// Waits for a permit before answering
struct Gated {
    id: ParticipantId,
    gate: Arc<Notify>,
}

#[async_trait]
impl ProviderAdapter for Gated {
    fn provider_id(&self) -> &ParticipantId {
        &self.id
    }

    fn kind(&self) -> &'static str {
        "gated"
    }

    async fn invoke(&self, _credential: &SecretString, _prompt: &str) -> Result<String, ProviderError> {
        self.gate.notified().await;
        Ok(format!("gated answer from {}", self.id))
    }
}

#[derive(Default)]
struct RecordingObserver {
    messages: Mutex<Vec<MessageId>>,
    notices: Mutex<Vec<Notice>>,
    busy_changes: Mutex<Vec<(ParticipantId, bool)>>,
    resets: Mutex<usize>,
}

impl ConversationObserver for RecordingObserver {
    fn on_message_appended(&self, message: &Message) {
        self.messages.lock().unwrap().push(message.id);
    }

    fn on_busy_changed(&self, participant: &ParticipantId, busy: bool) {
        self.busy_changes
            .lock()
            .unwrap()
            .push((participant.clone(), busy));
    }

    fn on_notice(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }

    fn on_conversation_reset(&self) {
        *self.resets.lock().unwrap() += 1;
    }
}

impl RecordingObserver {
    /// Busy flag per participant after replaying every change in order
    fn last_busy(&self) -> HashMap<ParticipantId, bool> {
        self.busy_changes.lock().unwrap().iter().cloned().collect()
    }
}

#[derive(Default)]
struct RecordingLogger {
    events: Mutex<Vec<(String, serde_json::Value)>>,
}

impl ConversationLogger for RecordingLogger {
    fn log(&self, event: ConversationEvent) {
        self.events
            .lock()
            .unwrap()
            .push((event.event_type.to_string(), event.payload));
    }
}

// ==================== Helpers ====================

fn registry(ids: &[&str]) -> ParticipantRegistry {
    ParticipantRegistry::new(
        ids.iter()
            .map(|id| {
                Participant::new(*id, id.to_uppercase())
                    .with_response_time(ResponseTimeRange::instant())
            })
            .collect(),
    )
    .unwrap()
}

fn scheduler_with(
    ids: &[&str],
    config: SchedulerConfig,
    providers: ProviderRegistry,
    credentials: CredentialSet,
) -> TurnScheduler {
    TurnScheduler::new(
        config,
        registry(ids),
        Arc::new(ResponseResolver::new(providers)),
        Arc::new(InMemoryCredentialStore::new(credentials)),
    )
}

fn simulated(ids: &[&str]) -> TurnScheduler {
    scheduler_with(
        ids,
        SchedulerConfig::instant(),
        ProviderRegistry::new(),
        CredentialSet::new(),
    )
}

async fn eventually(scheduler: &TurnScheduler, condition: impl Fn(&ConversationSnapshot) -> bool) {
    for _ in 0..1_000 {
        if condition(&scheduler.snapshot()) {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition was never reached");
}

fn senders(messages: &[Message]) -> Vec<String> {
    messages.iter().map(|m| m.sender().to_string()).collect()
}

// ==================== Fan-out ====================

#[tokio::test]
async fn test_fan_out_appends_user_message_then_one_reply_each() {
    let scheduler = simulated(&["a", "b", "c", "d"]);

    let dispatch = scheduler.send_prompt("hello").unwrap();
    let first = scheduler.snapshot();
    assert_eq!(first.messages.len(), 1);
    assert!(first.messages[0].is_user());
    assert_eq!(first.messages[0].content, "hello");
    assert!(first.any_busy());

    let outcomes = dispatch.settled().await;
    assert_eq!(outcomes.len(), 4);

    let snapshot = scheduler.snapshot();
    assert_eq!(snapshot.messages.len(), 5);
    let replies: HashSet<String> = senders(&snapshot.messages[1..]).into_iter().collect();
    let expected: HashSet<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
    assert_eq!(replies, expected);
    assert!(!snapshot.any_busy());
    assert!(!scheduler.any_busy());
}

#[tokio::test]
async fn test_fan_out_without_selection_changes_nothing() {
    let scheduler = simulated(&["a", "b"]);
    scheduler.toggle_selected("a").unwrap();
    scheduler.toggle_selected("b").unwrap();
    let before = scheduler.snapshot();

    let err = scheduler.send_prompt("hello").unwrap_err();

    assert_eq!(err, SchedulerError::NoParticipantsSelected);
    assert!(err.is_validation());
    let after = scheduler.snapshot();
    assert_eq!(after.messages, before.messages);
    assert_eq!(after.busy, before.busy);
}

#[tokio::test]
async fn test_empty_prompt_is_rejected() {
    let scheduler = simulated(&["a"]);
    let err = scheduler.send_prompt("   ").unwrap_err();
    assert_eq!(err, SchedulerError::EmptyPrompt);
    assert!(scheduler.snapshot().messages.is_empty());
}

#[tokio::test]
async fn test_live_adapter_only_where_credential_exists() {
    let adapter = Recording::new("a");
    let scheduler = scheduler_with(
        &["a", "b"],
        SchedulerConfig::instant(),
        ProviderRegistry::new().with(adapter.clone()),
        CredentialSet::new().with("a", "sk-a"),
    );

    scheduler.send_prompt("hello").unwrap().settled().await;

    let snapshot = scheduler.snapshot();
    let from_a = snapshot.messages.iter().find(|m| m.sender().as_str() == "a").unwrap();
    let from_b = snapshot.messages.iter().find(|m| m.sender().as_str() == "b").unwrap();
    assert_eq!(from_a.content, "live answer from a");
    assert!(from_b.content.contains("[b]"));
    assert_eq!(adapter.prompts(), vec!["hello".to_string()]);
}

#[tokio::test]
async fn test_adversarial_fan_out_is_prefixed_but_not_counted() {
    let adapter = Recording::new("a");
    let scheduler = scheduler_with(
        &["a"],
        SchedulerConfig::instant(),
        ProviderRegistry::new().with(adapter.clone()),
        CredentialSet::new().with("a", "sk-a"),
    );
    scheduler.toggle_adversarial("a").unwrap();

    scheduler.send_prompt("is coffee healthy?").unwrap().settled().await;

    let prompts = adapter.prompts();
    assert!(prompts[0].starts_with(DEFAULT_ADVERSARIAL_PREFIX));
    assert!(prompts[0].ends_with("is coffee healthy?"));
    assert_eq!(scheduler.adversarial_turns(&"a".into()), 0);
    assert!(scheduler.snapshot().messages[1].is_adversarial());
}

#[tokio::test]
async fn test_provider_failure_falls_back_and_names_participant() {
    let observer = Arc::new(RecordingObserver::default());
    let scheduler = scheduler_with(
        &["a", "b"],
        SchedulerConfig::instant(),
        ProviderRegistry::new().with(Arc::new(Failing("a".into()))),
        CredentialSet::new().with("a", "sk-a"),
    )
    .with_observer(observer.clone());

    scheduler.send_prompt("hello").unwrap().settled().await;

    assert_eq!(scheduler.snapshot().messages.len(), 3);
    let notices = observer.notices.lock().unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].participant().unwrap().as_str(), "a");
    assert!(!scheduler.any_busy());
}

// ==================== Busy tracking ====================

#[tokio::test]
async fn test_busy_until_settlement() {
    let gate = Arc::new(Notify::new());
    let scheduler = scheduler_with(
        &["a", "b"],
        SchedulerConfig::instant(),
        ProviderRegistry::new().with(Arc::new(Gated {
            id: "a".into(),
            gate: gate.clone(),
        })),
        CredentialSet::new().with("a", "sk-a"),
    );

    let dispatch = scheduler.send_prompt("hello").unwrap();
    eventually(&scheduler, |s| !s.is_busy("b")).await;
    assert!(scheduler.snapshot().is_busy("a"));

    gate.notify_one();
    dispatch.settled().await;
    assert!(!scheduler.snapshot().is_busy("a"));
}

#[tokio::test]
async fn test_overlapping_turns_keep_participant_busy() {
    let gate = Arc::new(Notify::new());
    let scheduler = scheduler_with(
        &["a", "b"],
        SchedulerConfig::instant(),
        ProviderRegistry::new().with(Arc::new(Gated {
            id: "a".into(),
            gate: gate.clone(),
        })),
        CredentialSet::new().with("a", "sk-a"),
    );

    let first = scheduler.direct_turn("a", "b").unwrap();
    let second = scheduler.direct_turn("a", "b").unwrap();

    gate.notify_one();
    eventually(&scheduler, |s| s.messages.len() == 1).await;
    assert!(scheduler.snapshot().is_busy("a"));

    gate.notify_one();
    first.settled().await;
    second.settled().await;
    let snapshot = scheduler.snapshot();
    assert_eq!(snapshot.messages.len(), 2);
    assert!(!snapshot.is_busy("a"));
}

#[tokio::test]
async fn test_busy_events_pair_up() {
    let observer = Arc::new(RecordingObserver::default());
    let scheduler = simulated(&["a", "b", "c"]).with_observer(observer.clone());

    scheduler.send_prompt("hello").unwrap().settled().await;

    let changes = observer.busy_changes.lock().unwrap();
    assert_eq!(changes.iter().filter(|(_, busy)| *busy).count(), 3);
    assert_eq!(changes.iter().filter(|(_, busy)| !*busy).count(), 3);
    // every participant goes busy before anyone settles
    assert!(changes[..3].iter().all(|(_, busy)| *busy));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_observed_busy_flags_match_state_when_clear_races_turns() {
    let observer = Arc::new(RecordingObserver::default());
    let scheduler = Arc::new(simulated(&["a", "b", "c"]).with_observer(observer.clone()));

    let clearer = {
        let scheduler = Arc::clone(&scheduler);
        std::thread::spawn(move || {
            for _ in 0..200 {
                scheduler.clear_conversation();
                std::thread::yield_now();
            }
        })
    };
    for _ in 0..200 {
        scheduler.group_discussion().unwrap();
        tokio::task::yield_now().await;
    }
    clearer.join().unwrap();
    scheduler.wait_idle().await;

    let snapshot = scheduler.snapshot();
    assert!(!snapshot.any_busy());
    for (id, busy) in observer.last_busy() {
        assert_eq!(busy, snapshot.is_busy(id.as_str()), "{} left busy", id);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_observer_sees_messages_in_log_order() {
    let observer = Arc::new(RecordingObserver::default());
    let scheduler =
        simulated(&["a", "b", "c", "d", "e", "f"]).with_observer(observer.clone());

    for round in 0..20 {
        scheduler.send_prompt(&format!("round {}", round)).unwrap();
    }
    scheduler.wait_idle().await;

    let logged: Vec<MessageId> = scheduler.snapshot().messages.iter().map(|m| m.id).collect();
    assert_eq!(logged.len(), 20 * 7);
    assert_eq!(*observer.messages.lock().unwrap(), logged);
}

// ==================== Direct turns and the adversarial cap ====================

#[tokio::test]
async fn test_direct_turn_replies_to_target() {
    let adapter = Recording::new("a");
    let scheduler = scheduler_with(
        &["a", "b", "c"],
        SchedulerConfig::instant(),
        ProviderRegistry::new().with(adapter.clone()),
        CredentialSet::new().with("a", "sk-a"),
    );
    scheduler.send_prompt("hello").unwrap().settled().await;

    scheduler.direct_turn("a", "b").unwrap().settled().await;

    let snapshot = scheduler.snapshot();
    let reply = snapshot.messages.last().unwrap();
    assert_eq!(reply.sender().as_str(), "a");
    assert_eq!(reply.responding_to().unwrap().as_str(), "b");
    assert!(!reply.is_adversarial());

    let prompt = adapter.prompts().pop().unwrap();
    assert!(prompt.starts_with("You are A and should respond to the answer from B."));
    assert!(prompt.contains("user: hello"));
    assert!(prompt.contains("b: [b]"));
    assert!(!prompt.contains("c: [c]"));
}

#[tokio::test]
async fn test_direct_turn_requires_selection() {
    let scheduler = simulated(&["a", "b"]);
    scheduler.toggle_selected("b").unwrap();

    let err = scheduler.direct_turn("a", "b").unwrap_err();
    assert_eq!(err, SchedulerError::ParticipantNotSelected("b".into()));

    let err = scheduler.direct_turn("a", "zed").unwrap_err();
    assert_eq!(err, SchedulerError::UnknownParticipant("zed".to_string()));
    assert!(scheduler.snapshot().messages.is_empty());
}

#[tokio::test]
async fn test_direct_turn_context_leaves_out_consensus_entries() {
    let adapter = Recording::new("a");
    let scheduler = scheduler_with(
        &["a", "b"],
        SchedulerConfig::instant(),
        ProviderRegistry::new().with(adapter.clone()),
        CredentialSet::new().with("a", "sk-a"),
    );
    scheduler.send_prompt("hello").unwrap().settled().await;
    scheduler.request_consensus().unwrap().settled().await;
    let snapshot = scheduler.snapshot();
    assert!(snapshot.messages.iter().any(|m| m.consensus_from().map(|id| id.as_str()) == Some("b")));

    scheduler.direct_turn("a", "b").unwrap().settled().await;

    let prompt = adapter.prompts().pop().unwrap();
    assert!(prompt.contains("user: hello"));
    assert!(prompt.contains("b: [b]"));
    assert!(!prompt.contains("consensus: "));
    assert!(!prompt.contains("I see the following consensus"));
}

#[tokio::test]
async fn test_direct_turn_cap_is_logged() {
    let logger = Arc::new(RecordingLogger::default());
    let scheduler = scheduler_with(
        &["a", "b"],
        SchedulerConfig::instant().with_adversarial_cap(1),
        ProviderRegistry::new(),
        CredentialSet::new(),
    )
    .with_logger(logger.clone());
    scheduler.toggle_adversarial("a").unwrap();
    scheduler.direct_turn("a", "b").unwrap().settled().await;

    assert!(scheduler.direct_turn("a", "b").is_err());

    let events = logger.events.lock().unwrap();
    let (event_type, payload) = events.last().unwrap();
    assert_eq!(event_type, "notice");
    assert_eq!(payload["participant"], "a");
    assert!(payload["text"].as_str().unwrap().contains("devil's advocate"));
}

#[tokio::test]
async fn test_adversarial_cap_blocks_extra_turn() {
    let scheduler = scheduler_with(
        &["a", "b"],
        SchedulerConfig::instant().with_adversarial_cap(2),
        ProviderRegistry::new(),
        CredentialSet::new(),
    );
    scheduler.toggle_adversarial("a").unwrap();

    scheduler.direct_turn("a", "b").unwrap().settled().await;
    scheduler.direct_turn("a", "b").unwrap().settled().await;
    let before = scheduler.snapshot().messages.len();

    let err = scheduler.direct_turn("a", "b").unwrap_err();

    assert_eq!(
        err,
        SchedulerError::AdversarialCapReached {
            participant: "a".into(),
            cap: 2
        }
    );
    assert!(!err.is_validation());
    let snapshot = scheduler.snapshot();
    assert_eq!(snapshot.messages.len(), before);
    assert!(snapshot.messages.iter().all(|m| m.is_adversarial()));
    assert!(!snapshot.is_busy("a"));
}

#[tokio::test]
async fn test_clear_keeps_counter_new_conversation_resets_it() {
    let scheduler = scheduler_with(
        &["a", "b"],
        SchedulerConfig::instant().with_adversarial_cap(1),
        ProviderRegistry::new(),
        CredentialSet::new(),
    );
    scheduler.toggle_adversarial("a").unwrap();
    scheduler.direct_turn("a", "b").unwrap().settled().await;

    scheduler.clear_conversation();
    assert!(scheduler.snapshot().messages.is_empty());
    assert!(matches!(
        scheduler.direct_turn("a", "b"),
        Err(SchedulerError::AdversarialCapReached { .. })
    ));

    scheduler.new_conversation();
    assert_eq!(scheduler.adversarial_turns(&"a".into()), 0);
    // the registry snapshot is restored, so adversarial mode is off again
    assert!(!scheduler.snapshot().participants[0].is_adversarial());
    scheduler.toggle_adversarial("a").unwrap();
    assert!(scheduler.direct_turn("a", "b").is_ok());
}

// ==================== Group discussion ====================

#[tokio::test]
async fn test_group_discussion_needs_three() {
    let scheduler = simulated(&["a", "b", "c"]);
    scheduler.toggle_selected("b").unwrap();
    scheduler.toggle_selected("c").unwrap();

    let err = scheduler.group_discussion().unwrap_err();
    assert_eq!(
        err,
        SchedulerError::InsufficientParticipants {
            required: 3,
            selected: 1
        }
    );
    assert!(scheduler.snapshot().messages.is_empty());
}

#[tokio::test]
async fn test_group_discussion_runs_the_ring() {
    let scheduler = simulated(&["a", "b", "c"]);

    let outcomes = scheduler.group_discussion().unwrap().settled().await;

    assert!(outcomes.iter().all(|o| o.appended().len() == 1));
    let pairs: HashSet<(String, String)> = scheduler
        .snapshot()
        .messages
        .iter()
        .map(|m| {
            (
                m.sender().to_string(),
                m.responding_to().unwrap().to_string(),
            )
        })
        .collect();
    let expected: HashSet<(String, String)> = [("a", "b"), ("b", "c"), ("c", "a")]
        .iter()
        .map(|(f, t)| (f.to_string(), t.to_string()))
        .collect();
    assert_eq!(pairs, expected);
    assert!(!scheduler.any_busy());
}

#[tokio::test]
async fn test_group_discussion_skips_capped_participant() {
    let observer = Arc::new(RecordingObserver::default());
    let scheduler = scheduler_with(
        &["a", "b", "c"],
        SchedulerConfig::instant().with_adversarial_cap(1),
        ProviderRegistry::new(),
        CredentialSet::new(),
    )
    .with_observer(observer.clone());
    scheduler.toggle_adversarial("b").unwrap();
    scheduler.direct_turn("b", "c").unwrap().settled().await;

    let outcomes = scheduler.group_discussion().unwrap().settled().await;

    assert!(outcomes.contains(&Outcome::CapReached {
        participant: "b".into(),
        cap: 1
    }));
    let snapshot = scheduler.snapshot();
    assert_eq!(snapshot.messages.len(), 3);
    assert!(!snapshot.any_busy());
    let notices = observer.notices.lock().unwrap();
    assert!(notices.iter().any(|n| n.is_informational()));
}

// ==================== Consensus ====================

#[tokio::test]
async fn test_consensus_without_discussion_appends_one_per_participant() {
    let scheduler = simulated(&["a", "b", "c", "d"]);
    scheduler.send_prompt("hello").unwrap().settled().await;

    let outcomes = scheduler.request_consensus().unwrap().settled().await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].appended().len(), 4);
    let snapshot = scheduler.snapshot();
    let consensus: Vec<&Message> = snapshot.messages.iter().filter(|m| m.is_consensus()).collect();
    assert_eq!(consensus.len(), 4);
    let from: HashSet<&str> = consensus
        .iter()
        .map(|m| m.consensus_from().unwrap().as_str())
        .collect();
    assert_eq!(from.len(), 4);
    assert!(consensus.iter().all(|m| m.sender().as_str() == "consensus"));
    assert!(!snapshot.consensus_loading);
    assert!(!snapshot.any_busy());
}

#[tokio::test]
async fn test_consensus_needs_two() {
    let scheduler = simulated(&["a", "b"]);
    scheduler.toggle_selected("b").unwrap();
    assert_eq!(
        scheduler.request_consensus().unwrap_err(),
        SchedulerError::InsufficientParticipants {
            required: 2,
            selected: 1
        }
    );
    assert!(!scheduler.snapshot().consensus_loading);
}

#[tokio::test]
async fn test_consensus_is_all_or_nothing() {
    let gate = Arc::new(Notify::new());
    let scheduler = scheduler_with(
        &["a", "b", "c"],
        SchedulerConfig::instant(),
        ProviderRegistry::new().with(Arc::new(Gated {
            id: "c".into(),
            gate: gate.clone(),
        })),
        CredentialSet::new().with("c", "sk-c"),
    );

    let dispatch = scheduler.request_consensus().unwrap();
    for _ in 0..50 {
        tokio::task::yield_now().await;
        let snapshot = scheduler.snapshot();
        assert!(snapshot.messages.is_empty());
        assert!(snapshot.consensus_loading);
    }

    gate.notify_one();
    dispatch.settled().await;
    let snapshot = scheduler.snapshot();
    assert_eq!(snapshot.messages.len(), 3);
    assert!(!snapshot.consensus_loading);
}

#[tokio::test]
async fn test_consensus_failure_uses_simulated_text() {
    let observer = Arc::new(RecordingObserver::default());
    let scheduler = scheduler_with(
        &["a", "b"],
        SchedulerConfig::instant(),
        ProviderRegistry::new().with(Arc::new(Failing("a".into()))),
        CredentialSet::new().with("a", "sk-a"),
    )
    .with_observer(observer.clone());

    scheduler.request_consensus().unwrap().settled().await;

    let snapshot = scheduler.snapshot();
    assert_eq!(snapshot.messages.len(), 2);
    let from_a = snapshot
        .messages
        .iter()
        .find(|m| m.consensus_from().map(|id| id.as_str()) == Some("a"))
        .unwrap();
    assert!(from_a.content.starts_with("As a, I see the following consensus"));
    assert_eq!(observer.notices.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_shutdown_during_consensus_appends_nothing() {
    let gate = Arc::new(Notify::new());
    let observer = Arc::new(RecordingObserver::default());
    let scheduler = scheduler_with(
        &["a", "b"],
        SchedulerConfig::instant(),
        ProviderRegistry::new().with(Arc::new(Gated {
            id: "a".into(),
            gate,
        })),
        CredentialSet::new().with("a", "sk-a"),
    )
    .with_observer(observer.clone());

    let dispatch = scheduler.request_consensus().unwrap();
    scheduler.shutdown().await;

    assert_eq!(dispatch.settled().await, vec![Outcome::Aborted]);
    let snapshot = scheduler.snapshot();
    assert!(snapshot.messages.is_empty());
    assert!(!snapshot.any_busy());
    assert!(!snapshot.consensus_loading);
    let notices = observer.notices.lock().unwrap();
    assert!(matches!(
        notices.as_slice(),
        [Notice::OperationAborted {
            operation: Operation::Consensus,
            ..
        }]
    ));
}

// ==================== Explain ====================

#[tokio::test]
async fn test_explain_appends_single_simplified_message() {
    let scheduler = simulated(&["a", "b"]);
    scheduler.send_prompt("why is the sky blue?").unwrap().settled().await;

    let dispatch = scheduler.explain_simplified().unwrap();
    assert!(scheduler.snapshot().explain_loading);
    let chosen = dispatch.participants()[0].clone();
    dispatch.settled().await;

    let snapshot = scheduler.snapshot();
    let explanations: Vec<&Message> = snapshot
        .messages
        .iter()
        .filter(|m| m.is_explain_simplified())
        .collect();
    assert_eq!(explanations.len(), 1);
    assert_eq!(explanations[0].author(), Some(&chosen));
    assert!(!snapshot.explain_loading);
}

#[tokio::test]
async fn test_explain_without_selection_fails() {
    let scheduler = simulated(&["a"]);
    scheduler.toggle_selected("a").unwrap();
    assert_eq!(
        scheduler.explain_simplified().unwrap_err(),
        SchedulerError::NoParticipantsSelected
    );
    assert!(!scheduler.snapshot().explain_loading);
}

// ==================== Lifecycle ====================

#[tokio::test]
async fn test_clear_discards_pending_replies() {
    let gate = Arc::new(Notify::new());
    let observer = Arc::new(RecordingObserver::default());
    let scheduler = scheduler_with(
        &["a"],
        SchedulerConfig::instant(),
        ProviderRegistry::new().with(Arc::new(Gated {
            id: "a".into(),
            gate: gate.clone(),
        })),
        CredentialSet::new().with("a", "sk-a"),
    )
    .with_observer(observer.clone());

    let dispatch = scheduler.send_prompt("hello").unwrap();
    scheduler.clear_conversation();
    assert!(!scheduler.any_busy());

    gate.notify_one();
    assert_eq!(dispatch.settled().await, vec![Outcome::Discarded]);
    assert!(scheduler.snapshot().messages.is_empty());
    assert!(!scheduler.any_busy());
    assert_eq!(*observer.resets.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_message_ids_stay_unique_across_clear() {
    let scheduler = simulated(&["a"]);
    scheduler.send_prompt("one").unwrap().settled().await;
    let first = scheduler.snapshot().messages[0].id;

    scheduler.clear_conversation();
    scheduler.send_prompt("two").unwrap().settled().await;

    assert!(scheduler.snapshot().messages[0].id > first);
}

#[tokio::test]
async fn test_toggle_unknown_participant() {
    let scheduler = simulated(&["a"]);
    assert_eq!(
        scheduler.toggle_selected("nobody").unwrap_err(),
        SchedulerError::UnknownParticipant("nobody".to_string())
    );
    assert!(!scheduler.toggle_selected("a").unwrap());
    assert!(scheduler.toggle_adversarial("a").unwrap());
}

#[tokio::test]
async fn test_wait_idle_waits_for_everything() {
    let scheduler = simulated(&["a", "b", "c"]);
    scheduler.send_prompt("hello").unwrap();
    scheduler.group_discussion().unwrap();

    scheduler.wait_idle().await;

    assert_eq!(scheduler.snapshot().messages.len(), 7);
    assert!(!scheduler.any_busy());
    // the tracker accepts new work afterwards
    scheduler.send_prompt("again").unwrap().settled().await;
    assert_eq!(scheduler.snapshot().messages.len(), 11);
}

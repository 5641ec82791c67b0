//! Application layer for roundtable
//!
//! This crate contains the turn scheduler, the response resolver, port
//! definitions, and scheduler configuration. It depends only on the domain
//! layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ContextWindows, SchedulerConfig, TurnTiming};
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    credential_store::{CredentialSet, CredentialStore, CredentialStoreError, InMemoryCredentialStore},
    observer::{Activity, ConversationObserver, NoObserver, Notice, Operation},
    provider::{ProviderAdapter, ProviderError, ProviderErrorKind, ProviderRegistry},
};
pub use use_cases::resolve_response::{Origin, Resolution, ResponseResolver};
pub use use_cases::turn_scheduler::{
    ConversationSnapshot, Dispatch, Outcome, SchedulerError, TurnScheduler,
};

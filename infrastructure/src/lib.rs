//! Infrastructure layer for roundtable
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: HTTP provider adapters, configuration file
//! loading, the file-backed credential store and the JSONL transcript.

pub mod config;
pub mod credentials;
pub mod logging;
pub mod providers;

// Re-export commonly used types
pub use config::{
    ConfigLoader, FileAdversarialConfig, FileConfig, FileContextConfig, FileCredentialsConfig,
    FileLoggingConfig, FileOutputConfig, FileParticipantConfig, FileTimingConfig,
};
pub use credentials::FileCredentialStore;
pub use logging::JsonlConversationLogger;
pub use providers::{ProviderKind, ProviderSpec, build_provider_registry};

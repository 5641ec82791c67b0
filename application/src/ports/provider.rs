//! Provider adapter port
//!
//! Defines the interface for calling one remote LLM provider, and the
//! registry that maps participant ids to their adapters.

use async_trait::async_trait;
use roundtable_domain::ParticipantId;
use secrecy::SecretString;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Classification of a failed provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// The request never got a response (DNS, TLS, connection reset, ...)
    Transport,
    /// The provider answered with a non-2xx status
    Status(u16),
    /// The provider answered 2xx but with an error-shaped payload
    Api,
    /// The payload did not contain a reply where one was expected
    MalformedPayload,
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderErrorKind::Transport => write!(f, "transport error"),
            ProviderErrorKind::Status(code) => write!(f, "HTTP {}", code),
            ProviderErrorKind::Api => write!(f, "API error"),
            ProviderErrorKind::MalformedPayload => write!(f, "malformed payload"),
        }
    }
}

/// A failed call to a provider, naming the participant it was made for
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{provider} ({kind}): {message}")]
pub struct ProviderError {
    pub provider: ParticipantId,
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(
        provider: ParticipantId,
        kind: ProviderErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            kind,
            message: message.into(),
        }
    }

    pub fn transport(provider: ParticipantId, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::Transport, message)
    }

    pub fn status(provider: ParticipantId, code: u16, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::Status(code), message)
    }

    pub fn api(provider: ParticipantId, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::Api, message)
    }

    pub fn malformed(provider: ParticipantId, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::MalformedPayload, message)
    }
}

/// Adapter for one provider's request/response shape.
///
/// Implementations live in the infrastructure layer. They must not retry;
/// a failure is reported once and the caller decides what to do.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Participant this adapter answers for
    fn provider_id(&self) -> &ParticipantId;

    /// Short name of the wire protocol, used in logs (e.g. "openai")
    fn kind(&self) -> &'static str;

    /// Send `prompt` and return the reply text
    async fn invoke(&self, credential: &SecretString, prompt: &str)
    -> Result<String, ProviderError>;
}

/// Maps participant ids to their provider adapters.
///
/// New providers are added here; the scheduler never dispatches on ids.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    adapters: HashMap<ParticipantId, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own provider id, replacing any previous one
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.insert(adapter.provider_id().clone(), adapter);
    }

    pub fn with(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&Arc<dyn ProviderAdapter>> {
        self.adapters.get(id)
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut entries: Vec<_> = self
            .adapters
            .iter()
            .map(|(id, a)| format!("{}={}", id, a.kind()))
            .collect();
        entries.sort();
        f.debug_tuple("ProviderRegistry").field(&entries).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo(ParticipantId);

    #[async_trait]
    impl ProviderAdapter for Echo {
        fn provider_id(&self) -> &ParticipantId {
            &self.0
        }

        fn kind(&self) -> &'static str {
            "echo"
        }

        async fn invoke(
            &self,
            _credential: &SecretString,
            prompt: &str,
        ) -> Result<String, ProviderError> {
            Ok(prompt.to_string())
        }
    }

    #[test]
    fn test_registry_keys_by_provider_id() {
        let registry = ProviderRegistry::new()
            .with(Arc::new(Echo("claude".into())))
            .with(Arc::new(Echo("gemini".into())));

        assert_eq!(registry.len(), 2);
        assert!(registry.get(&"claude".into()).is_some());
        assert!(registry.get(&"chatgpt".into()).is_none());
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::status("chatgpt".into(), 401, "Incorrect API key provided");
        assert_eq!(
            err.to_string(),
            "chatgpt (HTTP 401): Incorrect API key provided"
        );
    }

    #[tokio::test]
    async fn test_adapter_invocation_through_registry() {
        let registry = ProviderRegistry::new().with(Arc::new(Echo("claude".into())));
        let adapter = registry.get(&"claude".into()).unwrap();
        let secret = SecretString::from("sk-test".to_string());
        assert_eq!(adapter.invoke(&secret, "ping").await.unwrap(), "ping");
    }
}

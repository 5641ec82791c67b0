//! Credential store port
//!
//! The core reads credentials through this port and never writes them
//! during an operation. Persistence lives in the infrastructure layer.

use roundtable_domain::ParticipantId;
use secrecy::SecretString;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Errors raised while persisting credentials
#[derive(Error, Debug)]
pub enum CredentialStoreError {
    #[error("Credential store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Credential store serialization error: {0}")]
    Serialization(String),
}

/// API keys per participant. May be partially populated.
#[derive(Clone, Default)]
pub struct CredentialSet {
    secrets: HashMap<ParticipantId, SecretString>,
}

impl CredentialSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&SecretString> {
        self.secrets.get(id)
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.secrets.contains_key(id)
    }

    /// Store a secret. Blank secrets remove the entry instead.
    pub fn insert(&mut self, id: impl Into<ParticipantId>, secret: impl Into<String>) {
        let id = id.into();
        let secret = secret.into();
        if secret.trim().is_empty() {
            self.secrets.remove(&id);
        } else {
            self.secrets.insert(id, SecretString::from(secret));
        }
    }

    pub fn with(mut self, id: impl Into<ParticipantId>, secret: impl Into<String>) -> Self {
        self.insert(id, secret);
        self
    }

    pub fn remove(&mut self, id: &ParticipantId) -> bool {
        self.secrets.remove(id).is_some()
    }

    /// Participant ids that have a credential, sorted.
    pub fn ids(&self) -> Vec<&ParticipantId> {
        let mut ids: Vec<_> = self.secrets.keys().collect();
        ids.sort();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, &SecretString)> {
        self.secrets.iter()
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

impl std::fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.ids().into_iter().map(|id| (id, "[REDACTED]")))
            .finish()
    }
}

/// Key-value store for credentials
pub trait CredentialStore: Send + Sync {
    /// Current credentials. Absent keys simply have no entry.
    fn get(&self) -> CredentialSet;

    /// Replace the stored credentials.
    fn put(&self, credentials: &CredentialSet) -> Result<(), CredentialStoreError>;
}

/// Process-local store, used in tests and when nothing should be persisted
#[derive(Default)]
pub struct InMemoryCredentialStore {
    credentials: Mutex<CredentialSet>,
}

impl InMemoryCredentialStore {
    pub fn new(credentials: CredentialSet) -> Self {
        Self {
            credentials: Mutex::new(credentials),
        }
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn get(&self) -> CredentialSet {
        self.credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn put(&self, credentials: &CredentialSet) -> Result<(), CredentialStoreError> {
        *self
            .credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = credentials.clone();
        Ok(())
    }
}

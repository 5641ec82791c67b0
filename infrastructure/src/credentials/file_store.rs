use roundtable_application::ports::credential_store::{
    CredentialSet, CredentialStore, CredentialStoreError,
};
use roundtable_domain::ParticipantId;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Top-level key of the credentials document
pub const STORAGE_KEY: &str = "roundtable-api-keys";

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialsDocument {
    #[serde(rename = "roundtable-api-keys", default)]
    keys: BTreeMap<String, String>,
}

/// Credential store persisted as JSON, with environment fallbacks
pub struct FileCredentialStore {
    path: PathBuf,
    env_overrides: Vec<(ParticipantId, String)>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            env_overrides: Vec::new(),
        }
    }

    /// Read `(participant, VAR)` pairs from the environment for participants
    /// that have no key in the file.
    pub fn with_env_overrides(mut self, overrides: Vec<(ParticipantId, String)>) -> Self {
        self.env_overrides = overrides;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keys stored in the file only, without environment fallbacks
    pub fn stored(&self) -> CredentialSet {
        let document = match std::fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str::<CredentialsDocument>(&content) {
                Ok(document) => document,
                Err(e) => {
                    warn!(
                        "Ignoring unreadable credentials file {}: {}",
                        self.path.display(),
                        e
                    );
                    CredentialsDocument::default()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => CredentialsDocument::default(),
            Err(e) => {
                warn!("Could not read credentials file {}: {}", self.path.display(), e);
                CredentialsDocument::default()
            }
        };

        document
            .keys
            .into_iter()
            .fold(CredentialSet::new(), |set, (id, secret)| set.with(id, secret))
    }

    fn write(&self, document: &CredentialsDocument) -> Result<(), CredentialStoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(document)
            .map_err(|e| CredentialStoreError::Serialization(e.to_string()))?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;

        // mode() only applies to newly created files
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }

        file.write_all(content.as_bytes())?;
        file.flush()?;

        debug!(
            "Saved {} credential(s) to {}",
            document.keys.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> CredentialSet {
        let mut set = self.stored();
        for (id, var) in &self.env_overrides {
            if set.contains(id) {
                continue;
            }
            if let Ok(secret) = std::env::var(var) {
                set.insert(id.clone(), secret);
            }
        }
        set
    }

    fn put(&self, credentials: &CredentialSet) -> Result<(), CredentialStoreError> {
        let keys = credentials
            .iter()
            .map(|(id, secret)| (id.as_str().to_string(), secret.expose_secret().to_string()))
            .collect();
        self.write(&CredentialsDocument { keys })
    }
}

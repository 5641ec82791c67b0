//! Response resolution: provider call or simulated fallback.
//!
//! The resolver never fails outward. Without a credential it answers with a
//! simulated response; when the provider call fails it reports the error in
//! the [`Resolution`] and still answers with the simulated response.

use crate::ports::credential_store::CredentialSet;
use crate::ports::provider::{ProviderError, ProviderRegistry};
use roundtable_domain::{Interaction, ParticipantId, SimulatedResponder};
use tracing::{debug, warn};

/// Where a resolved response came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// The provider adapter answered
    Provider,
    /// No credential (or no adapter) was available
    Simulated,
    /// The provider call failed and the simulated response was used
    Fallback(ProviderError),
}

/// A response that is always present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub content: String,
    pub origin: Origin,
}

impl Resolution {
    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, Origin::Fallback(_))
    }

    pub fn error(&self) -> Option<&ProviderError> {
        match &self.origin {
            Origin::Fallback(err) => Some(err),
            _ => None,
        }
    }
}

/// Resolves one participant's response for one interaction.
#[derive(Debug, Clone, Default)]
pub struct ResponseResolver {
    providers: ProviderRegistry,
    simulator: SimulatedResponder,
}

impl ResponseResolver {
    pub fn new(providers: ProviderRegistry) -> Self {
        Self {
            providers,
            simulator: SimulatedResponder::new(),
        }
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// The deterministic simulated response for these inputs
    pub fn simulated(
        &self,
        participant: &ParticipantId,
        interaction: &Interaction,
        prompt: &str,
    ) -> String {
        self.simulator.respond(participant, interaction, prompt)
    }

    pub async fn resolve(
        &self,
        participant: &ParticipantId,
        interaction: &Interaction,
        prompt: &str,
        credentials: &CredentialSet,
    ) -> Resolution {
        let Some(credential) = credentials.get(participant) else {
            debug!("No credential for {}, simulating {}", participant, interaction);
            return Resolution {
                content: self.simulated(participant, interaction, prompt),
                origin: Origin::Simulated,
            };
        };

        let Some(adapter) = self.providers.get(participant) else {
            debug!("No provider adapter for {}, simulating {}", participant, interaction);
            return Resolution {
                content: self.simulated(participant, interaction, prompt),
                origin: Origin::Simulated,
            };
        };

        debug!(
            "Invoking {} adapter for {} ({})",
            adapter.kind(),
            participant,
            interaction
        );
        match adapter.invoke(credential, prompt).await {
            Ok(content) => Resolution {
                content,
                origin: Origin::Provider,
            },
            Err(e) => {
                warn!("Provider call failed, using simulated response: {}", e);
                Resolution {
                    content: self.simulated(participant, interaction, prompt),
                    origin: Origin::Fallback(e),
                }
            }
        }
    }
}

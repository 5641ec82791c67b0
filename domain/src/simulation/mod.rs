//! Simulated responses
//!
//! Stand-in answers used when a participant has no credential or its
//! provider call failed. The same `(participant, interaction, prompt)`
//! always yields the same text, and the text always names the participant.

use crate::conversation::Interaction;
use crate::participant::ParticipantId;
use std::hash::{DefaultHasher, Hash, Hasher};

const PROMPT_OPENERS: &[&str] = &[
    "Having looked at this closely, I think that...",
    "After weighing the options, the best approach is...",
    "From my perspective, based on the available information...",
    "My analysis points in a clear direction here...",
];

const REPLY_OPENERS: &[&str] = &[
    "I partly agree with your analysis, but we should also consider...",
    "Interesting perspective. May I add that...",
    "I see what you mean, and I would like to contribute the following...",
    "That is an important point. I would also mention...",
];

const CONSENSUS_POINTS: &[&str] = &[
    "1. Nearly every participant agrees on the core solution, while the practical details vary.\n2. The factors to consider are largely undisputed.\n3. Different methods lead to similar conclusions, which underlines how robust the answer is.",
    "1. There is agreement on the key aspects, with some details weighed differently.\n2. Everyone stresses the importance of a balanced view.\n3. Despite different approaches, our conclusions converge on similar recommendations.",
    "1. The underlying assumptions are largely shared, with nuanced differences in interpretation.\n2. The basic facts are agreed on, while the weighting of individual aspects differs.\n3. The different perspectives complement each other into a coherent whole.",
];

const EXPLAIN_OPENERS: &[&str] = &[
    "Imagine a group of friends trying to solve a puzzle together.",
    "Think of it like a class where everyone shares their idea out loud.",
    "Picture a team building one big sandcastle, each adding their own tower.",
];

/// Produces deterministic simulated responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedResponder;

impl SimulatedResponder {
    pub fn new() -> Self {
        Self
    }

    /// Simulated response for `participant` producing `interaction` on `prompt`.
    pub fn respond(
        &self,
        participant: &ParticipantId,
        interaction: &Interaction,
        prompt: &str,
    ) -> String {
        let key = Self::key(participant, interaction, prompt);

        match interaction {
            Interaction::Prompt => format!(
                "[{}] {}\n\nRegarding your request \"{}\":\n\nHere is my detailed answer...",
                participant,
                pick(PROMPT_OPENERS, key),
                prompt
            ),
            Interaction::Reply { to } => {
                format!("[{}] {}, {}", participant, to, pick(REPLY_OPENERS, key))
            }
            Interaction::Consensus => format!(
                "As {}, I see the following consensus:\n\n{}",
                participant,
                pick(CONSENSUS_POINTS, key)
            ),
            Interaction::Explain => format!(
                "[{}] {} Everybody brings a piece, and together the picture gets clearer.",
                participant,
                pick(EXPLAIN_OPENERS, key)
            ),
        }
    }

    fn key(participant: &ParticipantId, interaction: &Interaction, prompt: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        participant.hash(&mut hasher);
        interaction.hash(&mut hasher);
        prompt.hash(&mut hasher);
        hasher.finish()
    }
}

fn pick(bank: &'static [&'static str], key: u64) -> &'static str {
    bank[(key % bank.len() as u64) as usize]
}

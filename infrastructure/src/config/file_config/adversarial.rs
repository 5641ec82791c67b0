//! Devil's advocate configuration from TOML (`[adversarial]` section)

use roundtable_domain::{DEFAULT_ADVERSARIAL_CAP, DEFAULT_ADVERSARIAL_PREFIX};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAdversarialConfig {
    /// Devil's advocate turns each participant may take per conversation
    pub max_turns: u32,
    /// Instruction prepended to prompts in devil's advocate mode
    pub prefix: String,
}

impl Default for FileAdversarialConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_ADVERSARIAL_CAP,
            prefix: DEFAULT_ADVERSARIAL_PREFIX.to_string(),
        }
    }
}

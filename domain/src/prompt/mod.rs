//! Prompt domain
//!
//! Templates for the prompts each interaction sends to a participant.

mod template;

pub use template::{
    ADVERSARIAL_REPLY_PREFIX, DEFAULT_ADVERSARIAL_PREFIX, FALLBACK_QUESTION, PromptTemplate,
};

//! Prompt templates for roundtable interactions

/// Framing prepended to prompts for participants in devil's advocate mode.
pub const DEFAULT_ADVERSARIAL_PREFIX: &str =
    "[Devil's advocate mode] Question everything and challenge it critically:";

/// Framing prepended to the context of an adversarial reply.
pub const ADVERSARIAL_REPLY_PREFIX: &str =
    "[Devil's advocate mode] Critically challenge every argument: ";

/// Used as the question when consensus is requested before any prompt.
pub const FALLBACK_QUESTION: &str = "the current question";

/// Templates for generating prompts for each interaction kind
pub struct PromptTemplate;

impl PromptTemplate {
    /// Prompt sent to an adversarial participant during fan-out
    pub fn adversarial(prefix: &str, prompt: &str) -> String {
        format!("{} {}", prefix.trim_end(), prompt)
    }

    /// Prompt asking `from` to reply to `to`, optionally grounded in context
    pub fn direct_reply(from: &str, to: &str, context: &str) -> String {
        let mut prompt = format!("You are {} and should respond to the answer from {}.", from, to);
        if !context.trim().is_empty() {
            prompt.push_str(&format!(" Refer to the following context: {}", context));
        }
        prompt
    }

    /// Context for a reply, with the adversarial framing when requested
    pub fn reply_context(transcript: &str, adversarial: bool) -> String {
        if adversarial {
            format!("{}{}", ADVERSARIAL_REPLY_PREFIX, transcript)
        } else {
            transcript.to_string()
        }
    }

    /// Prompt asking a participant to state the consensus of the discussion
    pub fn consensus(participant: &str, question: &str, discussion: &str) -> String {
        format!(
            r#"As {participant}, your task is to form a consensus from the following discussion.

Original question: "{question}"

Discussion:
{discussion}

Summarize the most important points of agreement and begin with "As {participant}, I see the following consensus:"."#
        )
    }

    /// Prompt asking for a restatement a ten-year-old would follow
    pub fn explain_simply(transcript: &str) -> String {
        format!(
            r#"Explain the following discussion as if I were 10 years old. Use simple words and short sentences. Explain complicated concepts with analogies a child can understand:

{}"#,
            transcript
        )
    }
}

//! Rough token counts for prompts and replies.
//!
//! Only used for logging prompt size and for billing when a provider omits
//! its usage block. Provider-reported usage always wins.

use habitcoach_core::message::Message;

/// Characters per token, rounded up.
const CHARS_PER_TOKEN: u64 = 4;

/// Role markers and delimiters added per message on the wire.
const MESSAGE_FRAMING: u64 = 4;

/// Tokens in a piece of text, counted over chars so non-ASCII journals
/// are not overbilled.
pub fn text_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(CHARS_PER_TOKEN)
}

/// Tokens for a whole prompt: the system message plus every turn.
pub fn prompt_tokens(system_prompt: &str, messages: &[Message]) -> u64 {
    let framed = |content: &str| MESSAGE_FRAMING + text_tokens(content);
    framed(system_prompt) + messages.iter().map(|m| framed(&m.content)).sum::<u64>()
}

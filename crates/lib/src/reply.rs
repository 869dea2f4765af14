//! Reply text generation.
//!
//! The current policy is a fixed echo template. [`ReplyGenerator`] is the seam where a
//! real response strategy would plug in without touching the relay or the front ends.

const REPLY_PREFIX: &str = "You said: ";

/// Produces the reply text for one input.
pub trait ReplyGenerator: Send + Sync {
    fn generate(&self, input: &str) -> String;
}

/// Echoes the input back behind a fixed prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoReply;

impl ReplyGenerator for EchoReply {
    fn generate(&self, input: &str) -> String {
        generate_reply(input)
    }
}

/// `"You said: " + input`.
pub fn generate_reply(input: &str) -> String {
    format!("{}{}", REPLY_PREFIX, input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_input() {
        for s in ["hi", "hello world", "  padded  ", "ünïcödé ✓", "{\"json\": true}"] {
            assert_eq!(generate_reply(s), format!("You said: {}", s));
        }
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(generate_reply("again"), generate_reply("again"));
        assert_eq!(EchoReply.generate("again"), generate_reply("again"));
    }
}

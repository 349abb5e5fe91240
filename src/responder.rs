/// Maps an inbound phrase and its sender to a reply.
///
/// An empty reply means "stay silent".
pub trait Responder: Send + Sync {
    fn reply(&self, sender: &str, text: &str) -> String;
}

/// Table-driven responder: the first entry whose trigger matches the
/// lowercased phrase wins. Single-word triggers match whole words only;
/// multi-word triggers match as substrings. `{sender}` in the reply
/// template is substituted with the sender identity.
pub struct DictionaryResponder {
    entries: Vec<(&'static str, &'static str)>,
}

impl DictionaryResponder {
    pub fn new() -> Self {
        Self {
            entries: vec![
                ("how are you", "I'm doing well, thank you for asking."),
                ("thank you", "You're welcome."),
                ("hello", "Hello, {sender}!"),
                ("hi", "Hi, {sender}!"),
                ("thanks", "You're welcome."),
                ("bye", "Goodbye, {sender}!"),
                ("goodbye", "Goodbye, {sender}!"),
            ],
        }
    }
}

impl Default for DictionaryResponder {
    fn default() -> Self {
        Self::new()
    }
}

impl Responder for DictionaryResponder {
    fn reply(&self, sender: &str, text: &str) -> String {
        let phrase = text.to_lowercase();
        let words: Vec<&str> = phrase
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        for (trigger, template) in &self.entries {
            let hit = if trigger.contains(' ') {
                phrase.contains(trigger)
            } else {
                words.iter().any(|w| w == trigger)
            };
            if hit {
                return template.replace("{sender}", sender);
            }
        }
        String::new()
    }
}

/// Never replies. Useful when the host should only log the conversation.
pub struct SilentResponder;

impl Responder for SilentResponder {
    fn reply(&self, _sender: &str, _text: &str) -> String {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_substitutes_sender() {
        let responder = DictionaryResponder::new();
        assert_eq!(responder.reply("alice", "Hello there"), "Hello, alice!");
        assert_eq!(responder.reply("bob", "hi!"), "Hi, bob!");
    }

    #[test]
    fn multi_word_trigger_matches_substring() {
        let responder = DictionaryResponder::new();
        assert_eq!(
            responder.reply("alice", "so, how are you today?"),
            "I'm doing well, thank you for asking."
        );
    }

    #[test]
    fn single_word_trigger_needs_a_whole_word() {
        let responder = DictionaryResponder::new();
        // "this" must not trigger "hi"
        assert_eq!(responder.reply("alice", "this is fine"), "");
    }

    #[test]
    fn unknown_phrase_stays_silent() {
        let responder = DictionaryResponder::new();
        assert_eq!(responder.reply("alice", "what is the weather"), "");
        assert_eq!(SilentResponder.reply("alice", "hello"), "");
    }
}

use serde::{Deserialize, Serialize};

/// A single inbound chat message pulled from a plugin.
///
/// Messages have no identity beyond arrival order; the relay consumes each
/// one exactly once and drops it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Inbound {
    pub sender: String,                  // who wrote it, as the plugin knows them
    pub text: String,                    // the raw phrase
}

impl Inbound {
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self { sender: sender.into(), text: text.into() }
    }
}

/// What a plugin can do. Checked once at load time by the validator.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PluginCapabilities {
    pub name: String,                    // e.g. "console", "irc", "xmpp"
    pub supports_sending: bool,
    pub supports_receiving: bool,
    pub supports_text: bool,
}

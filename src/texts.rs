use std::{fmt::Display, fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

/// Every user-facing string the host emits, in one swappable catalog.
///
/// Wording is a configuration concern: load an alternative catalog with
/// [`Texts::load`] to rephrase or translate the host without touching code.
/// `{error}` and `{seconds}` placeholders are substituted at emission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Texts {
    pub init_started: String,
    pub init_success: String,
    pub init_error: String,
    pub init_timeout: String,
    pub conversation_started: String,
    pub conversation_ended: String,
    pub host_closing: String,
    pub bot_prefix: String,
}

impl Default for Texts {
    fn default() -> Self {
        Self {
            init_started: "Initializing the input/output plugin.".into(),
            init_success: "The input/output plugin has successfully initialized.".into(),
            init_error: "Plugin initialization error: {error}".into(),
            init_timeout: "Cannot load input/output plugin: {seconds} seconds timeout was exceeded."
                .into(),
            conversation_started: "The conversation has begun.".into(),
            conversation_ended: "The conversation has ended.".into(),
            host_closing: "Shutting down.".into(),
            bot_prefix: "Bot".into(),
        }
    }
}

impl Texts {
    /// Load a catalog from a JSON file; missing keys fall back to the
    /// defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn init_failed(&self, error: &impl Display) -> String {
        self.init_error.replace("{error}", &error.to_string())
    }

    pub fn timed_out(&self, timeout: Duration) -> String {
        self.init_timeout
            .replace("{seconds}", &timeout.as_secs().to_string())
    }

    pub fn inbound(&self, sender: &str, text: &str) -> String {
        format!("{sender}: {text}")
    }

    pub fn outbound(&self, text: &str) -> String {
        format!("{}: {}", self.bot_prefix, text)
    }
}

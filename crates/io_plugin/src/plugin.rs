use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::message::{Inbound, PluginCapabilities};

/// The one trait plugin authors implement.
///
/// A plugin is the input/output side of a conversation: the host pushes
/// outbound text through [`IoPlugin::send_message`] and polls
/// [`IoPlugin::get_message`] for whatever arrived since the last tick.
///
/// The host never locks around plugin calls. A `send_message` issued from
/// the caller's context can overlap the relay loop's own
/// `is_ready`/`get_message` calls, so implementations must tolerate
/// concurrent use.
#[async_trait]
pub trait IoPlugin: Send + Sync {
    /// The display name of the plugin.
    fn name(&self) -> String;

    /// Static capability descriptor, checked once at load time.
    fn capabilities(&self) -> PluginCapabilities;

    /// Begin asynchronous setup. `bot_name` is fixed for the lifetime of the
    /// connection. Returning an error aborts the connection attempt before
    /// the relay ever starts.
    async fn init(&self, bot_name: &str) -> Result<(), PluginError>;

    /// Non-blocking readiness probe, safe to call every tick.
    fn is_ready(&self) -> bool;

    /// Non-blocking poll; `None` when nothing is pending.
    fn get_message(&self) -> Option<Inbound>;

    /// Best-effort outbound fire.
    async fn send_message(&self, text: &str) -> Result<(), PluginError>;

    /// Release plugin-held resources. Only called while ready.
    async fn end(&self) -> Result<(), PluginError>;
}

/// Errors that an `IoPlugin` implementation can return.
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum PluginError {
    /// Setup could not complete.
    #[error("initialization failed: {0}")]
    Init(String),

    /// An outbound message could not be handed to the transport.
    #[error("send failed: {0}")]
    Send(String),

    /// The plugin is not in a state where this operation is valid.
    #[error("invalid state for this operation")]
    InvalidState,

    /// The plugin returned an unspecified failure.
    #[error("plugin error: {0}")]
    Other(String),
}

impl From<std::io::Error> for PluginError {
    fn from(err: std::io::Error) -> PluginError {
        PluginError::Other(err.to_string())
    }
}

impl From<anyhow::Error> for PluginError {
    fn from(err: anyhow::Error) -> PluginError {
        PluginError::Other(err.to_string())
    }
}

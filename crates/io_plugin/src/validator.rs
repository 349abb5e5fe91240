use thiserror::Error;

use crate::plugin::IoPlugin;

/// Rejection reason produced by [`validate`].
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("plugin reports an empty name")]
    MissingName,

    #[error("plugin `{name}` is missing required capability `{capability}`")]
    MissingCapability {
        name: String,
        capability: &'static str,
    },
}

/// One-shot structural conformance check, run immediately after load and
/// before any lifecycle call.
///
/// A plugin that cannot both send and receive text is useless to the relay,
/// so the connection attempt is aborted before `init` is ever called.
pub fn validate(plugin: &dyn IoPlugin) -> Result<(), ValidationError> {
    let caps = plugin.capabilities();
    if caps.name.is_empty() {
        return Err(ValidationError::MissingName);
    }
    let required = [
        ("sending", caps.supports_sending),
        ("receiving", caps.supports_receiving),
        ("text", caps.supports_text),
    ];
    for (capability, present) in required {
        if !present {
            return Err(ValidationError::MissingCapability {
                name: caps.name.clone(),
                capability,
            });
        }
    }
    Ok(())
}

use std::time::Duration;

use io_plugin::plugin::IoPlugin;
use tokio::{sync::Notify, time::sleep};
use tracing::{debug, warn};

use crate::{notify::Notifier, responder::Responder, texts::Texts};

/// Steady-state message pump for one connection.
///
/// Polls the plugin while it stays ready: every inbound message is logged
/// through the notifier, handed to the responder, and any non-empty reply is
/// pushed back out through the plugin. Returns on the first tick the plugin
/// reports not-ready, or once the shutdown signal fires; the caller performs
/// the closing bookkeeping.
pub(crate) async fn run(
    plugin: &dyn IoPlugin,
    responder: &dyn Responder,
    notifier: &Notifier,
    texts: &Texts,
    poll_interval: Duration,
    shutdown: &Notify,
) {
    notifier.system_message(&texts.conversation_started);

    while plugin.is_ready() {
        let Some(inbound) = plugin.get_message() else {
            tokio::select! {
                _ = shutdown.notified() => break,
                _ = sleep(poll_interval) => {}
            }
            continue;
        };

        debug!(sender = %inbound.sender, "inbound message");
        notifier.system_message(&texts.inbound(&inbound.sender, &inbound.text));

        let reply = responder.reply(&inbound.sender, &inbound.text);
        if reply.is_empty() {
            continue;
        }
        if let Err(err) = plugin.send_message(&reply).await {
            warn!(%err, "outbound send failed");
            continue;
        }
        notifier.system_message(&texts.outbound(&reply));
    }

    notifier.system_message(&texts.conversation_ended);
}

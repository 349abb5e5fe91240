use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    sync::mpsc::{UnboundedReceiver, unbounded_channel},
    task::JoinHandle,
};
use tracing::debug;

use crate::{
    message::{Inbound, PluginCapabilities},
    plugin::{IoPlugin, PluginError},
};

/// Terminal plugin: every stdin line becomes an inbound message and every
/// outbound message is written back to stdout.
pub struct ConsolePlugin {
    ready: AtomicBool,
    inbound: Mutex<Option<UnboundedReceiver<Inbound>>>,
    reader: Mutex<Option<JoinHandle<()>>>,
    user: String,
}

impl ConsolePlugin {
    pub fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
            inbound: Mutex::new(None),
            reader: Mutex::new(None),
            user: "you".to_string(),
        }
    }
}

impl Default for ConsolePlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IoPlugin for ConsolePlugin {
    fn name(&self) -> String {
        "console".to_string()
    }

    fn capabilities(&self) -> PluginCapabilities {
        PluginCapabilities {
            name: "console".into(),
            supports_sending: true,
            supports_receiving: true,
            supports_text: true,
        }
    }

    async fn init(&self, bot_name: &str) -> Result<(), PluginError> {
        let (tx, rx) = unbounded_channel();
        let user = self.user.clone();
        let handle = tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                if tx.send(Inbound::new(user.clone(), line)).is_err() {
                    break;
                }
            }
        });
        *self.inbound.lock().unwrap() = Some(rx);
        *self.reader.lock().unwrap() = Some(handle);
        debug!(bot_name, "console plugin reading stdin");
        self.ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn get_message(&self) -> Option<Inbound> {
        self.inbound.lock().unwrap().as_mut()?.try_recv().ok()
    }

    async fn send_message(&self, text: &str) -> Result<(), PluginError> {
        let mut out = tokio::io::stdout();
        out.write_all(text.as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
        Ok(())
    }

    async fn end(&self) -> Result<(), PluginError> {
        self.ready.store(false, Ordering::SeqCst);
        if let Some(handle) = self.reader.lock().unwrap().take() {
            handle.abort();
        }
        self.inbound.lock().unwrap().take();
        Ok(())
    }
}

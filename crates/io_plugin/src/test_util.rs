use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    message::{Inbound, PluginCapabilities},
    plugin::{IoPlugin, PluginError},
};

enum Readiness {
    Immediate,
    After(Duration),
    Never,
}

/// Scriptable in-memory plugin for host tests.
///
/// Readiness is programmable (immediate, delayed, or never), inbound
/// messages are injected by the test, and outbound messages are captured
/// for assertions.
pub struct MockPlugin {
    caps: PluginCapabilities,
    readiness: Readiness,
    init_error: Option<String>,
    ready: Arc<AtomicBool>,
    bot_name: Mutex<Option<String>>,
    inbound: Mutex<VecDeque<Inbound>>,
    outgoing: Arc<Mutex<Vec<String>>>,
    ended: AtomicBool,
}

impl MockPlugin {
    fn with_readiness(readiness: Readiness) -> Self {
        Self {
            caps: PluginCapabilities {
                name: "mock".to_string(),
                supports_sending: true,
                supports_receiving: true,
                supports_text: true,
            },
            readiness,
            init_error: None,
            ready: Arc::new(AtomicBool::new(false)),
            bot_name: Mutex::new(None),
            inbound: Mutex::new(VecDeque::new()),
            outgoing: Arc::new(Mutex::new(Vec::new())),
            ended: AtomicBool::new(false),
        }
    }

    /// Ready as soon as `init` returns.
    pub fn ready() -> Self {
        Self::with_readiness(Readiness::Immediate)
    }

    /// Ready once `delay` has elapsed after `init`.
    pub fn ready_after(delay: Duration) -> Self {
        Self::with_readiness(Readiness::After(delay))
    }

    /// `init` succeeds but readiness never arrives.
    pub fn never_ready() -> Self {
        Self::with_readiness(Readiness::Never)
    }

    /// `init` fails with the given reason.
    pub fn failing(reason: &str) -> Self {
        let mut plugin = Self::with_readiness(Readiness::Never);
        plugin.init_error = Some(reason.to_string());
        plugin
    }

    pub fn named(mut self, name: &str) -> Self {
        self.caps.name = name.to_string();
        self
    }

    pub fn without_sending(mut self) -> Self {
        self.caps.supports_sending = false;
        self
    }

    pub fn without_receiving(mut self) -> Self {
        self.caps.supports_receiving = false;
        self
    }

    /// Queue an inbound message for the relay to pick up.
    pub fn inject(&self, sender: &str, text: &str) {
        self.inbound
            .lock()
            .unwrap()
            .push_back(Inbound::new(sender, text));
    }

    /// Everything the host sent out so far.
    pub fn sent(&self) -> Vec<String> {
        self.outgoing.lock().unwrap().clone()
    }

    /// Inbound messages not yet consumed.
    pub fn pending(&self) -> usize {
        self.inbound.lock().unwrap().len()
    }

    /// The bot name handed to `init`, if it was ever called.
    pub fn bot_name(&self) -> Option<String> {
        self.bot_name.lock().unwrap().clone()
    }

    pub fn ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IoPlugin for MockPlugin {
    fn name(&self) -> String {
        self.caps.name.clone()
    }

    fn capabilities(&self) -> PluginCapabilities {
        self.caps.clone()
    }

    async fn init(&self, bot_name: &str) -> Result<(), PluginError> {
        *self.bot_name.lock().unwrap() = Some(bot_name.to_string());
        if let Some(reason) = &self.init_error {
            return Err(PluginError::Init(reason.clone()));
        }
        match self.readiness {
            Readiness::Immediate => self.ready.store(true, Ordering::SeqCst),
            Readiness::After(delay) => {
                let ready = self.ready.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    ready.store(true, Ordering::SeqCst);
                });
            }
            Readiness::Never => {}
        }
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn get_message(&self) -> Option<Inbound> {
        self.inbound.lock().unwrap().pop_front()
    }

    async fn send_message(&self, text: &str) -> Result<(), PluginError> {
        self.outgoing.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn end(&self) -> Result<(), PluginError> {
        self.ended.store(true, Ordering::SeqCst);
        self.ready.store(false, Ordering::SeqCst);
        Ok(())
    }
}

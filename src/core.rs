use std::{
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU8, Ordering},
    },
};

use io_plugin::{
    loader::{LoadError, PluginRegistry},
    plugin::{IoPlugin, PluginError},
    validator::{self, ValidationError},
};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};
use thiserror::Error;
use tokio::{
    sync::Notify,
    task::JoinHandle,
    time::{Instant, sleep},
};
use tracing::{debug, info, warn};

use crate::{config::CoreSettings, notify::Notifier, relay, responder::Responder, texts::Texts};

/// Connection state of the host.
///
/// This is the single source of truth consulted by the public operations;
/// it is written only by `connect`, the init task, and the relay exit path.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum LinkState {
    #[default]
    Disconnected = 0,
    Initializing = 1,
    Ready = 2,
}

struct StateCell(AtomicU8);

impl StateCell {
    fn new() -> Self {
        Self(AtomicU8::new(LinkState::Disconnected as u8))
    }

    fn load(&self) -> LinkState {
        match self.0.load(Ordering::SeqCst) {
            1 => LinkState::Initializing,
            2 => LinkState::Ready,
            _ => LinkState::Disconnected,
        }
    }

    fn store(&self, state: LinkState) {
        debug!("link state -> {state}");
        self.0.store(state as u8, Ordering::SeqCst);
    }

    fn try_transition(&self, from: LinkState, to: LinkState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

/// Synchronous failures of [`ChatCore::connect`].
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("a plugin is already connected")]
    AlreadyConnected,

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Synchronous failures of the ready-only operations.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("no ready input/output plugin")]
    NotReady,

    #[error(transparent)]
    Plugin(#[from] PluginError),
}

struct Connection {
    plugin: Arc<dyn IoPlugin>,
    shutdown: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

/// State shared between the public surface and the spawned connection task.
struct Shared {
    notifier: Notifier,
    texts: Texts,
    state: StateCell,
    conn: Mutex<Option<Connection>>,
}

impl Shared {
    fn ready_plugin(&self) -> Result<Arc<dyn IoPlugin>, CoreError> {
        if self.state.load() != LinkState::Ready {
            return Err(CoreError::NotReady);
        }
        self.conn
            .lock()
            .unwrap()
            .as_ref()
            .map(|conn| conn.plugin.clone())
            .ok_or(CoreError::NotReady)
    }

    /// Terminal bookkeeping for one connection attempt: flips the link state
    /// back, drops the plugin handle, and fires the connection's single
    /// state-change(false).
    fn finish_connection(&self) {
        self.state.store(LinkState::Disconnected);
        drop(self.conn.lock().unwrap().take());
        self.notifier.state_changed(false);
    }
}

/// Owns at most one plugin connection at a time: loads and validates the
/// plugin, drives the timeout-bound initialization, supervises the relay
/// loop, and exposes the direct outbound path.
///
/// Success or failure of a connection attempt after `connect` returns is
/// reported only through the [`Notifier`]: a state-change(`true`) when the
/// plugin reaches readiness, a single state-change(`false`) when the attempt
/// fails or the conversation ends.
pub struct ChatCore {
    registry: PluginRegistry,
    responder: Arc<dyn Responder>,
    settings: CoreSettings,
    shared: Arc<Shared>,
}

impl ChatCore {
    pub fn new(
        registry: PluginRegistry,
        responder: Arc<dyn Responder>,
        settings: CoreSettings,
        texts: Texts,
    ) -> Self {
        Self {
            registry,
            responder,
            settings,
            shared: Arc::new(Shared {
                notifier: Notifier::default(),
                texts,
                state: StateCell::new(),
                conn: Mutex::new(None),
            }),
        }
    }

    /// Observer registration point for host front ends.
    pub fn notifier(&self) -> &Notifier {
        &self.shared.notifier
    }

    pub fn state(&self) -> LinkState {
        self.shared.state.load()
    }

    /// Load, validate and asynchronously initialize the plugin at
    /// `plugin_path`, announcing itself as `bot_name`.
    ///
    /// Returns as soon as the init task is spawned. Load and validation
    /// problems surface here; everything later arrives via the notifier.
    pub fn connect(&self, bot_name: &str, plugin_path: &Path) -> Result<(), ConnectError> {
        let shared = &self.shared;
        if !shared
            .state
            .try_transition(LinkState::Disconnected, LinkState::Initializing)
        {
            return Err(ConnectError::AlreadyConnected);
        }

        let plugin = match self.registry.load(plugin_path) {
            Ok(plugin) => plugin,
            Err(err) => {
                shared.state.store(LinkState::Disconnected);
                return Err(err.into());
            }
        };
        if let Err(err) = validator::validate(plugin.as_ref()) {
            shared.state.store(LinkState::Disconnected);
            return Err(err.into());
        }

        info!(plugin = %plugin.name(), bot = bot_name, "plugin loaded and validated");
        shared.notifier.system_message(&shared.texts.init_started);

        let shutdown = Arc::new(Notify::new());
        *shared.conn.lock().unwrap() = Some(Connection {
            plugin: plugin.clone(),
            shutdown: shutdown.clone(),
            task: None,
        });

        let task = tokio::spawn(run_connection(
            shared.clone(),
            self.responder.clone(),
            self.settings,
            plugin,
            bot_name.to_string(),
            shutdown,
        ));
        if let Some(conn) = shared.conn.lock().unwrap().as_mut() {
            conn.task = Some(task);
        }
        Ok(())
    }

    /// Direct outbound push, independent of the relay loop.
    pub async fn send_message(&self, text: &str) -> Result<(), CoreError> {
        let plugin = self.shared.ready_plugin()?;
        plugin.send_message(text).await?;
        self.shared
            .notifier
            .system_message(&self.shared.texts.outbound(text));
        Ok(())
    }

    /// Explicitly terminate the connection.
    ///
    /// Calls `end` on the plugin and fires the shutdown signal so the relay
    /// does not sit out its poll sleep. The relay exit path reports the
    /// closure through the notifier.
    pub async fn disconnect(&self) -> Result<(), CoreError> {
        let plugin = self.shared.ready_plugin()?;
        let shutdown = self
            .shared
            .conn
            .lock()
            .unwrap()
            .as_ref()
            .map(|conn| conn.shutdown.clone())
            .ok_or(CoreError::NotReady)?;
        plugin.end().await?;
        shutdown.notify_one();
        Ok(())
    }

    /// Cancel any in-flight connection and wait for its task to finish.
    pub async fn shutdown(&self) {
        let _ = self.disconnect().await;
        let (shutdown, task) = {
            let mut guard = self.shared.conn.lock().unwrap();
            match guard.as_mut() {
                Some(conn) => (Some(conn.shutdown.clone()), conn.task.take()),
                None => (None, None),
            }
        };
        if let Some(shutdown) = shutdown {
            shutdown.notify_one();
        }
        if let Some(task) = task {
            if let Err(err) = task.await {
                warn!(?err, "connection task aborted");
            }
        }
    }
}

/// One connection attempt end to end: init, timeout-bound readiness wait,
/// relay loop. Runs detached from the caller; talks back only through the
/// notifier.
async fn run_connection(
    shared: Arc<Shared>,
    responder: Arc<dyn Responder>,
    settings: CoreSettings,
    plugin: Arc<dyn IoPlugin>,
    bot_name: String,
    shutdown: Arc<Notify>,
) {
    let started = Instant::now();

    if let Err(err) = plugin.init(&bot_name).await {
        warn!(%err, "plugin init failed");
        shared.notifier.system_message(&shared.texts.init_failed(&err));
        shared.finish_connection();
        return;
    }

    while !plugin.is_ready() {
        if started.elapsed() >= settings.init_timeout {
            shared
                .notifier
                .system_message(&shared.texts.timed_out(settings.init_timeout));
            shared.finish_connection();
            return;
        }
        tokio::select! {
            _ = shutdown.notified() => {
                shared.notifier.system_message(&shared.texts.host_closing);
                shared.finish_connection();
                return;
            }
            _ = sleep(settings.poll_interval) => {}
        }
    }

    shared.state.store(LinkState::Ready);
    shared.notifier.system_message(&shared.texts.init_success);
    shared.notifier.state_changed(true);

    relay::run(
        plugin.as_ref(),
        responder.as_ref(),
        &shared.notifier,
        &shared.texts,
        settings.poll_interval,
        &shutdown,
    )
    .await;

    shared.finish_connection();
}

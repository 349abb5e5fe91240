use std::{
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use chatlink::{
    config::CoreSettings,
    core::{ChatCore, ConnectError, CoreError, LinkState},
    responder::{Responder, SilentResponder},
    texts::Texts,
};
use io_plugin::{loader::PluginRegistry, test_util::MockPlugin};
use tokio::{
    sync::mpsc::{UnboundedReceiver, unbounded_channel},
    time::{Instant, timeout},
};

/// Replies "hi <sender>" to everything.
struct Greeter;

impl Responder for Greeter {
    fn reply(&self, sender: &str, _text: &str) -> String {
        format!("hi {sender}")
    }
}

struct Harness {
    core: ChatCore,
    plugin: Arc<MockPlugin>,
    messages: Arc<Mutex<Vec<String>>>,
    states: UnboundedReceiver<bool>,
}

fn harness(plugin: MockPlugin, responder: Arc<dyn Responder>) -> Harness {
    let plugin = Arc::new(plugin);
    let registry = PluginRegistry::new();
    let registered = plugin.clone();
    registry.register("mock", move || registered.clone());

    let core = ChatCore::new(registry, responder, CoreSettings::default(), Texts::default());

    let messages = Arc::new(Mutex::new(Vec::new()));
    let sink = messages.clone();
    core.notifier()
        .on_system_message(move |m| sink.lock().unwrap().push(m.to_string()));
    let (state_tx, states) = unbounded_channel();
    core.notifier().on_state_change(move |up| {
        let _ = state_tx.send(up);
    });

    Harness {
        core,
        plugin,
        messages,
        states,
    }
}

/// Poll `cond` until it holds, bounded so a broken relay cannot hang the test.
async fn wait_until(cond: impl Fn() -> bool) {
    timeout(Duration::from_secs(60), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

fn count_with_suffix(messages: &Mutex<Vec<String>>, suffix: &str) -> usize {
    messages
        .lock()
        .unwrap()
        .iter()
        .filter(|m| m.ends_with(suffix))
        .count()
}

#[tokio::test(start_paused = true)]
async fn ready_plugin_connects_and_relays() {
    let mut h = harness(MockPlugin::ready(), Arc::new(Greeter));

    h.core.connect("bot", Path::new("mock")).unwrap();
    assert!(h.states.recv().await.unwrap());
    assert_eq!(h.core.state(), LinkState::Ready);
    assert_eq!(h.plugin.bot_name().as_deref(), Some("bot"));

    h.plugin.inject("alice", "hello");
    wait_until(|| !h.plugin.sent().is_empty()).await;
    assert_eq!(h.plugin.sent(), vec!["hi alice".to_string()]);

    // exactly one inbound log and one outbound log
    assert_eq!(count_with_suffix(&h.messages, "alice: hello"), 1);
    assert_eq!(count_with_suffix(&h.messages, "Bot: hi alice"), 1);
}

#[tokio::test(start_paused = true)]
async fn silent_reply_sends_nothing() {
    let mut h = harness(MockPlugin::ready(), Arc::new(SilentResponder));

    h.core.connect("bot", Path::new("mock")).unwrap();
    assert!(h.states.recv().await.unwrap());

    h.plugin.inject("carol", "ping");
    wait_until(|| h.plugin.pending() == 0).await;
    // a few extra ticks so a stray outbound would have happened by now
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(h.plugin.sent().is_empty());
    assert_eq!(count_with_suffix(&h.messages, "carol: ping"), 1);
    assert!(
        !h.messages
            .lock()
            .unwrap()
            .iter()
            .any(|m| m.contains("Bot:"))
    );
}

#[tokio::test(start_paused = true)]
async fn idle_polling_emits_nothing() {
    let mut h = harness(MockPlugin::ready(), Arc::new(Greeter));

    h.core.connect("bot", Path::new("mock")).unwrap();
    assert!(h.states.recv().await.unwrap());
    wait_until(|| {
        h.messages
            .lock()
            .unwrap()
            .iter()
            .any(|m| m.contains("conversation has begun"))
    })
    .await;
    let baseline = h.messages.lock().unwrap().len();

    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(h.messages.lock().unwrap().len(), baseline);
    assert!(h.plugin.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn never_ready_plugin_times_out() {
    let mut h = harness(MockPlugin::never_ready(), Arc::new(SilentResponder));

    h.core.connect("bot", Path::new("mock")).unwrap();
    let started = Instant::now();
    let up = timeout(Duration::from_secs(30), h.states.recv())
        .await
        .unwrap()
        .unwrap();

    assert!(!up);
    assert!(started.elapsed() >= Duration::from_secs(10));
    assert_eq!(h.core.state(), LinkState::Disconnected);
    assert!(h.states.try_recv().is_err());

    let messages = h.messages.lock().unwrap();
    assert!(messages.iter().any(|m| m.contains("timeout was exceeded")));
    assert!(!messages.iter().any(|m| m.contains("conversation has begun")));
}

#[tokio::test(start_paused = true)]
async fn failing_init_reports_and_never_relays() {
    let mut h = harness(MockPlugin::failing("no backend"), Arc::new(SilentResponder));

    h.core.connect("bot", Path::new("mock")).unwrap();
    let up = timeout(Duration::from_secs(5), h.states.recv())
        .await
        .unwrap()
        .unwrap();

    assert!(!up);
    assert!(h.states.try_recv().is_err());
    assert_eq!(h.core.state(), LinkState::Disconnected);

    let messages = h.messages.lock().unwrap();
    assert!(messages.iter().any(|m| m.contains("no backend")));
    assert!(!messages.iter().any(|m| m.contains("conversation has begun")));
}

#[tokio::test(start_paused = true)]
async fn ready_after_three_seconds_within_ten_second_window() {
    let mut h = harness(
        MockPlugin::ready_after(Duration::from_secs(3)),
        Arc::new(Greeter),
    );

    let started = Instant::now();
    h.core.connect("bot", Path::new("mock")).unwrap();
    let up = timeout(Duration::from_secs(30), h.states.recv())
        .await
        .unwrap()
        .unwrap();

    assert!(up);
    assert!(started.elapsed() >= Duration::from_secs(3));
    assert!(started.elapsed() < Duration::from_secs(10));

    h.plugin.inject("alice", "hello");
    wait_until(|| !h.plugin.sent().is_empty()).await;
    assert_eq!(h.plugin.sent(), vec!["hi alice".to_string()]);
}

#[tokio::test]
async fn operations_require_a_ready_plugin() {
    let h = harness(MockPlugin::ready(), Arc::new(SilentResponder));

    assert!(matches!(
        h.core.send_message("hi").await,
        Err(CoreError::NotReady)
    ));
    assert!(matches!(h.core.disconnect().await, Err(CoreError::NotReady)));
}

#[tokio::test(start_paused = true)]
async fn direct_send_logs_the_outbound_text() {
    let mut h = harness(MockPlugin::ready(), Arc::new(SilentResponder));

    h.core.connect("bot", Path::new("mock")).unwrap();
    assert!(h.states.recv().await.unwrap());

    h.core.send_message("broadcast").await.unwrap();
    assert_eq!(h.plugin.sent(), vec!["broadcast".to_string()]);
    assert_eq!(count_with_suffix(&h.messages, "Bot: broadcast"), 1);
}

#[tokio::test(start_paused = true)]
async fn disconnect_ends_the_conversation() {
    let mut h = harness(MockPlugin::ready(), Arc::new(SilentResponder));

    h.core.connect("bot", Path::new("mock")).unwrap();
    assert!(h.states.recv().await.unwrap());

    h.core.disconnect().await.unwrap();
    let down = timeout(Duration::from_secs(5), h.states.recv())
        .await
        .unwrap()
        .unwrap();

    assert!(!down);
    assert!(h.plugin.ended());
    assert_eq!(h.core.state(), LinkState::Disconnected);
    assert!(
        h.messages
            .lock()
            .unwrap()
            .iter()
            .any(|m| m.contains("conversation has ended"))
    );

    // the handle is gone; ready-only operations fail again
    assert!(matches!(h.core.disconnect().await, Err(CoreError::NotReady)));
}

#[tokio::test(start_paused = true)]
async fn second_connect_while_active_is_rejected() {
    let mut h = harness(MockPlugin::ready(), Arc::new(SilentResponder));

    h.core.connect("bot", Path::new("mock")).unwrap();
    assert!(matches!(
        h.core.connect("bot", Path::new("mock")),
        Err(ConnectError::AlreadyConnected)
    ));
    assert!(h.states.recv().await.unwrap());
}

#[tokio::test]
async fn unknown_plugin_path_fails_synchronously() {
    let h = harness(MockPlugin::ready(), Arc::new(SilentResponder));

    let err = h.core.connect("bot", Path::new("missing")).unwrap_err();
    assert!(matches!(err, ConnectError::Load(_)));
    // the attempt left no trace and the core is reusable
    assert_eq!(h.core.state(), LinkState::Disconnected);
    assert!(h.messages.lock().unwrap().is_empty());
    assert!(h.core.connect("bot", Path::new("mock")).is_ok());
}

#[tokio::test]
async fn deficient_plugin_is_rejected_before_init() {
    let plugin = Arc::new(MockPlugin::ready().without_sending());
    let registry = PluginRegistry::new();
    let registered = plugin.clone();
    registry.register("mock", move || registered.clone());
    let core = ChatCore::new(
        registry,
        Arc::new(SilentResponder),
        CoreSettings::default(),
        Texts::default(),
    );

    let err = core.connect("bot", Path::new("mock")).unwrap_err();
    assert!(matches!(err, ConnectError::Validation(_)));
    assert!(err.to_string().contains("sending"));
    // init was never attempted
    assert!(plugin.bot_name().is_none());
    assert_eq!(core.state(), LinkState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn system_messages_carry_a_clock_stamp() {
    let mut h = harness(MockPlugin::ready(), Arc::new(SilentResponder));

    h.core.connect("bot", Path::new("mock")).unwrap();
    assert!(h.states.recv().await.unwrap());

    let messages = h.messages.lock().unwrap();
    assert!(!messages.is_empty());
    for msg in messages.iter() {
        let bytes = msg.as_bytes();
        assert_eq!(bytes[0], b'[');
        assert_eq!(bytes[3], b':');
        assert_eq!(bytes[6], b':');
        assert_eq!(bytes[9], b']');
        assert_eq!(bytes[10], b' ');
    }
}

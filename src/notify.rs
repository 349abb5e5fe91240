use std::sync::{Arc, Mutex};

use chrono::Local;

type StateChangeFn = Arc<dyn Fn(bool) + Send + Sync>;
type SystemMessageFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Fan-out point for host observers.
///
/// Two subscriber slots: connection state changes and timestamped system
/// messages. Delivery is fire-and-forget and happens inline on the emitting
/// task, so messages arrive in generation order.
#[derive(Default)]
pub struct Notifier {
    state_subs: Mutex<Vec<StateChangeFn>>,
    message_subs: Mutex<Vec<SystemMessageFn>>,
}

impl Notifier {
    pub fn on_state_change(&self, f: impl Fn(bool) + Send + Sync + 'static) {
        self.state_subs.lock().unwrap().push(Arc::new(f));
    }

    pub fn on_system_message(&self, f: impl Fn(&str) + Send + Sync + 'static) {
        self.message_subs.lock().unwrap().push(Arc::new(f));
    }

    /// Push a state transition to every subscriber.
    pub(crate) fn state_changed(&self, ready: bool) {
        // snapshot under the lock, call outside it
        let subs: Vec<StateChangeFn> = self.state_subs.lock().unwrap().clone();
        for sub in subs {
            sub(ready);
        }
    }

    /// Stamp and push a system message to every subscriber.
    pub(crate) fn system_message(&self, text: &str) {
        let stamped = format!("[{}] {}", Local::now().format("%H:%M:%S"), text);
        let subs: Vec<SystemMessageFn> = self.message_subs.lock().unwrap().clone();
        for sub in subs {
            sub(&stamped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_stamped_and_ordered() {
        let notifier = Notifier::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        notifier.on_system_message(move |m| sink.lock().unwrap().push(m.to_string()));

        notifier.system_message("first");
        notifier.system_message("second");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].ends_with("] first"));
        assert!(seen[1].ends_with("] second"));
        // [HH:MM:SS] prefix
        let bytes = seen[0].as_bytes();
        assert_eq!(bytes[0], b'[');
        assert_eq!(bytes[3], b':');
        assert_eq!(bytes[6], b':');
        assert_eq!(bytes[9], b']');
        assert_eq!(bytes[10], b' ');
    }

    #[test]
    fn state_changes_reach_every_subscriber() {
        let notifier = Notifier::default();
        let hits = Arc::new(Mutex::new(Vec::new()));
        for _ in 0..2 {
            let sink = hits.clone();
            notifier.on_state_change(move |up| sink.lock().unwrap().push(up));
        }

        notifier.state_changed(true);
        notifier.state_changed(false);

        assert_eq!(*hits.lock().unwrap(), vec![true, true, false, false]);
    }
}

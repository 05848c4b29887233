//! Per-session publish/subscribe channel
//!
//! Dispatch happens inside [`EventBus::emit`]: every matching subscriber runs,
//! in subscription order, before `emit` returns. Handlers receive the bus so
//! they can emit follow-up events, which are dispatched depth-first.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;

use super::Event;
use crate::log_debug;

const MODULE: &str = "events::bus";

type Handler = Arc<dyn Fn(&EventBus, &Event) + Send + Sync>;

/// Handle returned by [`EventBus::on`] and [`EventBus::on_any`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

enum Listener {
    Persistent(Handler),
    Once(oneshot::Sender<Event>),
}

struct Subscription {
    id: SubscriptionId,
    /// `None` matches every event
    name: Option<String>,
    listener: Listener,
}

impl Subscription {
    fn matches(&self, name: &str) -> bool {
        self.name.as_deref().is_none_or(|n| n == name)
    }

    /// A one-shot whose receiver was dropped can never be resolved
    fn is_stale(&self) -> bool {
        matches!(&self.listener, Listener::Once(tx) if tx.is_closed())
    }
}

enum Target {
    Call(Handler),
    Resolve(oneshot::Sender<Event>),
}

#[derive(Default)]
struct Inner {
    subscriptions: Mutex<Vec<Subscription>>,
    next_id: AtomicU64,
}

#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn subscriptions(&self) -> MutexGuard<'_, Vec<Subscription>> {
        self.inner
            .subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn subscribe(&self, name: Option<&str>, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::SeqCst));
        let mut subscriptions = self.subscriptions();
        subscriptions.retain(|sub| !sub.is_stale());
        subscriptions.push(Subscription {
            id,
            name: name.map(str::to_string),
            listener,
        });
        id
    }

    /// Persistent listener for every future emission of `name`
    pub fn on<F>(&self, name: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&EventBus, &Event) + Send + Sync + 'static,
    {
        self.subscribe(Some(name), Listener::Persistent(Arc::new(handler)))
    }

    /// Persistent listener for every event regardless of name
    pub fn on_any<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&EventBus, &Event) + Send + Sync + 'static,
    {
        self.subscribe(None, Listener::Persistent(Arc::new(handler)))
    }

    /// Resolves with the next emission of `name`; the subscription is then removed.
    ///
    /// Register before triggering the emission: events are not buffered.
    pub fn once(&self, name: &str) -> oneshot::Receiver<Event> {
        let (tx, rx) = oneshot::channel();
        self.subscribe(Some(name), Listener::Once(tx));
        rx
    }

    pub fn off(&self, id: SubscriptionId) {
        self.subscriptions().retain(|sub| sub.id != id);
    }

    /// Number of live subscriptions that would receive `name`
    pub fn listener_count(&self, name: &str) -> usize {
        self.subscriptions()
            .iter()
            .filter(|sub| sub.matches(name) && !sub.is_stale())
            .count()
    }

    pub fn emit(&self, event: Event) {
        let name = event.name();
        log_debug!(MODULE, "emit {}", name);

        // Collect targets under the lock, dispatch without it so handlers can re-enter.
        let targets = {
            let mut subscriptions = self.subscriptions();
            let mut targets = Vec::new();
            let mut i = 0;
            while i < subscriptions.len() {
                if !subscriptions[i].matches(name) {
                    i += 1;
                    continue;
                }
                match &subscriptions[i].listener {
                    Listener::Persistent(handler) => {
                        targets.push(Target::Call(Arc::clone(handler)));
                        i += 1;
                    }
                    Listener::Once(_) => {
                        let sub = subscriptions.remove(i);
                        if let Listener::Once(tx) = sub.listener {
                            if !tx.is_closed() {
                                targets.push(Target::Resolve(tx));
                            }
                        }
                    }
                }
            }
            targets
        };

        for target in targets {
            match target {
                Target::Call(handler) => handler(self, &event),
                Target::Resolve(tx) => {
                    let _ = tx.send(event.clone());
                }
            }
        }
    }
}

//! Named-channel publish/subscribe bus.
//!
//! Each channel holds an ordered list of listeners. A listener is either a
//! persistent callback, invoked on every emission until removed, or a
//! single-fire resolver backing the future returned by [`EventBus::once`].
//!
//! # Example
//!
//! ```
//! use blockv_realtime::EventBus;
//!
//! let bus: EventBus<u32> = EventBus::new();
//! let id = bus.subscribe("ticks", |n| println!("tick {n}"));
//!
//! assert_eq!(bus.emit("ticks", &1), 1);
//! assert!(bus.unsubscribe("ticks", id));
//! assert_eq!(bus.emit("ticks", &2), 0);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::trace;

use crate::error::{Error, Result};
use crate::identifiers::ListenerId;

// ============================================================================
// Types
// ============================================================================

/// Persistent listener callback.
pub type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// How a registered listener is invoked.
enum ListenerKind<T> {
    /// Invoked on every emission.
    Persistent(Callback<T>),
    /// Resolved by the first emission, then discarded.
    Once(oneshot::Sender<T>),
}

/// A listener registered on one channel.
struct Listener<T> {
    id: ListenerId,
    kind: ListenerKind<T>,
}

/// Listener snapshot taken under the lock and invoked after releasing it.
enum Dispatch<T> {
    Callback(Callback<T>),
    Once(oneshot::Sender<T>),
}

// ============================================================================
// EventBus
// ============================================================================

/// In-process publish/subscribe bus keyed by channel name.
///
/// Channels are created lazily on first subscription. Emitting on a
/// channel nobody listens to is a no-op.
///
/// # Thread Safety
///
/// `EventBus` is `Send + Sync`. Listeners run on the emitting task with
/// no internal lock held, so they may subscribe, unsubscribe or emit
/// from inside a callback.
pub struct EventBus<T = Value> {
    /// Listener lists by channel name, in subscription order.
    channels: Mutex<FxHashMap<String, Vec<Listener<T>>>>,
}

impl<T> Default for EventBus<T> {
    fn default() -> Self {
        Self {
            channels: Mutex::new(FxHashMap::default()),
        }
    }
}

impl<T> fmt::Debug for EventBus<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channels = self.channels.lock();
        f.debug_struct("EventBus")
            .field("channels", &channels.len())
            .field(
                "listeners",
                &channels.values().map(Vec::len).sum::<usize>(),
            )
            .finish()
    }
}

// ============================================================================
// EventBus - Subscription
// ============================================================================

impl<T> EventBus<T>
where
    T: Clone + Send + 'static,
{
    /// Creates an empty bus.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a persistent listener on `channel`.
    ///
    /// The callback is invoked for every emission until removed with
    /// [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe<F>(&self, channel: &str, callback: F) -> ListenerId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = ListenerId::next();
        self.channels
            .lock()
            .entry(channel.to_string())
            .or_default()
            .push(Listener {
                id,
                kind: ListenerKind::Persistent(Arc::new(callback)),
            });

        trace!(channel, %id, "Listener subscribed");
        id
    }

    /// Registers a single-fire listener on `channel`.
    ///
    /// Registration happens immediately, so an emission that occurs before
    /// the returned future is first polled is not missed. The future
    /// resolves with the first payload emitted afterwards.
    ///
    /// # Errors
    ///
    /// The future resolves to [`Error::ChannelClosed`] if the bus is cleared
    /// or dropped before anything is emitted on `channel`.
    pub fn once(&self, channel: &str) -> impl Future<Output = Result<T>> + Send + use<T> {
        let (tx, rx) = oneshot::channel();
        {
            let mut channels = self.channels.lock();
            let listeners = channels.entry(channel.to_string()).or_default();

            // Drop resolvers whose futures were abandoned.
            listeners.retain(|listener| match &listener.kind {
                ListenerKind::Once(tx) => !tx.is_closed(),
                ListenerKind::Persistent(_) => true,
            });

            listeners.push(Listener {
                id: ListenerId::next(),
                kind: ListenerKind::Once(tx),
            });
        }

        async move { rx.await.map_err(Error::from) }
    }

    /// Removes a listener from `channel`.
    ///
    /// Returns `false` without side effects if the channel or listener
    /// does not exist.
    pub fn unsubscribe(&self, channel: &str, id: ListenerId) -> bool {
        let mut channels = self.channels.lock();
        let Some(listeners) = channels.get_mut(channel) else {
            return false;
        };

        let before = listeners.len();
        listeners.retain(|listener| listener.id != id);
        let removed = listeners.len() != before;

        if removed {
            trace!(channel, %id, "Listener unsubscribed");
        }
        removed
    }

    /// Returns the number of listeners currently registered on `channel`.
    #[must_use]
    pub fn listener_count(&self, channel: &str) -> usize {
        self.channels.lock().get(channel).map_or(0, Vec::len)
    }

    /// Removes every listener from every channel.
    ///
    /// Pending [`once`](Self::once) futures resolve to an error.
    pub fn clear(&self) {
        self.channels.lock().clear();
    }
}

// ============================================================================
// EventBus - Emission
// ============================================================================

impl<T> EventBus<T>
where
    T: Clone + Send + 'static,
{
    /// Delivers `payload` to every listener on `channel`, in subscription
    /// order, and returns how many listeners were invoked.
    ///
    /// Single-fire listeners are removed by this call. The listener list is
    /// snapshotted first, so listeners added during emission are not invoked
    /// until the next emission. Panics raised by a listener propagate to the
    /// caller.
    pub fn emit(&self, channel: &str, payload: &T) -> usize {
        let dispatch = {
            let mut channels = self.channels.lock();
            let Some(listeners) = channels.get_mut(channel) else {
                return 0;
            };

            let mut dispatch = Vec::with_capacity(listeners.len());
            for listener in std::mem::take(listeners) {
                match listener.kind {
                    ListenerKind::Persistent(callback) => {
                        dispatch.push(Dispatch::Callback(Arc::clone(&callback)));
                        listeners.push(Listener {
                            id: listener.id,
                            kind: ListenerKind::Persistent(callback),
                        });
                    }
                    ListenerKind::Once(tx) => dispatch.push(Dispatch::Once(tx)),
                }
            }
            dispatch
        };

        let count = dispatch.len();
        for target in dispatch {
            match target {
                Dispatch::Callback(callback) => callback(payload),
                Dispatch::Once(tx) => {
                    // Receiver may have been dropped; nothing to deliver to.
                    let _ = tx.send(payload.clone());
                }
            }
        }

        trace!(channel, count, "Event emitted");
        count
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use proptest::prelude::*;
    use tokio_test::{assert_pending, assert_ready_err, assert_ready_ok, task};

    fn recorder(
        bus: &EventBus<u32>,
        channel: &str,
        tag: u32,
        log: &Arc<Mutex<Vec<u32>>>,
    ) -> ListenerId {
        let log = Arc::clone(log);
        bus.subscribe(channel, move |_| log.lock().push(tag))
    }

    #[test]
    fn test_emit_in_subscription_order() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for tag in 0..5 {
            recorder(&bus, "ch", tag, &log);
        }

        assert_eq!(bus.emit("ch", &0), 5);
        assert_eq!(*log.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_emit_without_listeners_is_noop() {
        let bus: EventBus<u32> = EventBus::new();
        assert_eq!(bus.emit("nobody", &1), 0);
        assert_eq!(bus.listener_count("nobody"), 0);
    }

    #[test]
    fn test_payload_is_passed_to_callback() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);
        bus.subscribe("ch", move |v: &Value| *seen_clone.lock() = Some(v.clone()));

        bus.emit("ch", &serde_json::json!({ "a": 1 }));
        assert_eq!(*seen.lock(), Some(serde_json::json!({ "a": 1 })));
    }

    #[test]
    fn test_channels_are_isolated() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        recorder(&bus, "a", 1, &log);
        recorder(&bus, "b", 2, &log);

        bus.emit("b", &0);
        assert_eq!(*log.lock(), vec![2]);
    }

    #[test]
    fn test_unsubscribe_removes_listener() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = recorder(&bus, "ch", 1, &log);
        recorder(&bus, "ch", 2, &log);

        assert!(bus.unsubscribe("ch", first));
        bus.emit("ch", &0);
        assert_eq!(*log.lock(), vec![2]);
    }

    #[test]
    fn test_unsubscribe_unknown_is_noop() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let id = recorder(&bus, "ch", 1, &log);

        assert!(!bus.unsubscribe("other", id));
        assert!(!bus.unsubscribe("ch", ListenerId::next()));
        assert!(bus.unsubscribe("ch", id));
        assert!(!bus.unsubscribe("ch", id));
        assert_eq!(bus.listener_count("ch"), 0);
    }

    #[test]
    fn test_listener_can_unsubscribe_itself_during_emit() {
        let bus = Arc::new(EventBus::<u32>::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let own_id = Arc::new(Mutex::new(None));

        recorder(&bus, "ch", 1, &log);
        let id = {
            let inner_bus = Arc::clone(&bus);
            let log = Arc::clone(&log);
            let own_id = Arc::clone(&own_id);
            bus.subscribe("ch", move |_| {
                log.lock().push(2);
                if let Some(id) = *own_id.lock() {
                    inner_bus.unsubscribe("ch", id);
                }
            })
        };
        *own_id.lock() = Some(id);
        recorder(&bus, "ch", 3, &log);

        bus.emit("ch", &0);
        bus.emit("ch", &0);
        assert_eq!(*log.lock(), vec![1, 2, 3, 1, 3]);
    }

    #[test]
    fn test_listener_added_during_emit_fires_next_time() {
        let bus = Arc::new(EventBus::<u32>::new());
        let calls = Arc::new(AtomicUsize::new(0));

        {
            let inner_bus = Arc::clone(&bus);
            let calls = Arc::clone(&calls);
            bus.subscribe("ch", move |_| {
                let calls = Arc::clone(&calls);
                inner_bus.subscribe("ch", move |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                });
            });
        }

        assert_eq!(bus.emit("ch", &0), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(bus.emit("ch", &0), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_once_resolves_with_first_payload() {
        let bus = EventBus::new();
        let mut first = task::spawn(bus.once("ch"));

        assert_pending!(first.poll());
        assert_eq!(bus.listener_count("ch"), 1);

        bus.emit("ch", &7);
        bus.emit("ch", &8);

        assert_eq!(assert_ready_ok!(first.poll()), 7);
        assert_eq!(bus.listener_count("ch"), 0);
    }

    #[test]
    fn test_once_registers_before_first_poll() {
        let bus = EventBus::new();
        let future = bus.once("ch");
        bus.emit("ch", &3);

        let mut future = task::spawn(future);
        assert_eq!(assert_ready_ok!(future.poll()), 3);
    }

    #[test]
    fn test_once_keeps_order_with_callbacks() {
        let bus = Arc::new(EventBus::<u32>::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        recorder(&bus, "ch", 1, &log);
        let mut once = task::spawn(bus.once("ch"));
        recorder(&bus, "ch", 2, &log);

        assert_eq!(bus.emit("ch", &9), 3);
        assert_eq!(*log.lock(), vec![1, 2]);
        assert_eq!(assert_ready_ok!(once.poll()), 9);
        assert_eq!(bus.listener_count("ch"), 2);
    }

    #[test]
    fn test_once_errors_when_cleared() {
        let bus: EventBus<u32> = EventBus::new();
        let mut once = task::spawn(bus.once("ch"));
        bus.clear();
        assert_ready_err!(once.poll());
    }

    #[test]
    fn test_abandoned_once_is_pruned() {
        let bus: EventBus<u32> = EventBus::new();
        drop(bus.once("ch"));
        assert_eq!(bus.listener_count("ch"), 1);

        let _pending = bus.once("ch");
        assert_eq!(bus.listener_count("ch"), 1);
    }

    #[test]
    fn test_debug_reports_counts() {
        let bus: EventBus<u32> = EventBus::new();
        bus.subscribe("a", |_| {});
        bus.subscribe("b", |_| {});
        let text = format!("{bus:?}");
        assert!(text.contains("channels: 2"));
        assert!(text.contains("listeners: 2"));
    }

    proptest! {
        #[test]
        fn prop_listeners_fire_in_order_and_once_at_most_once(
            listeners in proptest::collection::vec(any::<bool>(), 1..12),
            emissions in 1usize..6,
        ) {
            let bus = EventBus::<u32>::new();
            let log = Arc::new(Mutex::new(Vec::new()));
            let mut once_futures = Vec::new();

            for (index, is_once) in listeners.iter().enumerate() {
                if *is_once {
                    once_futures.push(task::spawn(bus.once("ch")));
                } else {
                    recorder(&bus, "ch", index as u32, &log);
                }
            }

            for round in 0..emissions {
                bus.emit("ch", &(round as u32));
            }

            let persistent: Vec<u32> = listeners
                .iter()
                .enumerate()
                .filter(|(_, is_once)| !**is_once)
                .map(|(index, _)| index as u32)
                .collect();
            let expected: Vec<u32> = (0..emissions).flat_map(|_| persistent.clone()).collect();
            prop_assert_eq!(&*log.lock(), &expected);

            for future in &mut once_futures {
                prop_assert_eq!(assert_ready_ok!(future.poll()), 0);
            }
            prop_assert_eq!(bus.listener_count("ch"), persistent.len());
        }
    }
}

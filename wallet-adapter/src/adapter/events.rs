//! Adapter lifecycle events and the listener registry that dispatches them.
//!
//! Every adapter owns one [`EventEmitter`]. Listeners are plain synchronous
//! closures; the coordinator registers them with [`EventEmitter::on`] and
//! removes them with [`EventEmitter::off`] when the adapter set or the
//! selected adapter changes.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::{NetworkInfo, WalletReadyState};
use crate::error::WalletError;

/// An event pushed by a wallet adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AdapterEvent {
    /// The wallet connected; carries the connected address (may be empty).
    Connect {
        /// Address reported by the wallet.
        address: String,
    },
    /// The wallet disconnected.
    Disconnect,
    /// The adapter hit an error, already wrapped into a [`WalletError`].
    Error(WalletError),
    /// The adapter's readiness changed (e.g. an extension was detected).
    ReadyStateChange(WalletReadyState),
    /// The user switched accounts inside the wallet.
    AccountChange {
        /// Address of the newly active account.
        address: String,
    },
    /// The wallet switched networks.
    NetworkChange(NetworkInfo),
}

impl AdapterEvent {
    /// The event's wire name, as wallets spell it.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::Disconnect => "disconnect",
            Self::Error(_) => "error",
            Self::ReadyStateChange(_) => "readyStateChange",
            Self::AccountChange { .. } => "accountChange",
            Self::NetworkChange(_) => "networkChange",
        }
    }
}

/// Handle returned by [`EventEmitter::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A shared event listener.
pub type Listener = Arc<dyn Fn(&AdapterEvent) + Send + Sync>;

/// Registry of event listeners for one adapter.
///
/// Dispatch works on a snapshot of the registered listeners, so a listener
/// may subscribe or unsubscribe (itself included) while an event is being
/// delivered.
#[derive(Default)]
pub struct EventEmitter {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Create an emitter with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for every event this adapter emits.
    pub fn on<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&AdapterEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Deliver `event` to every registered listener, in registration order.
    pub fn emit(&self, event: &AdapterEvent) {
        let snapshot: Vec<Listener> = self
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        tracing::trace!(event = event.name(), listeners = snapshot.len(), "emitting adapter event");
        for listener in snapshot {
            listener(event);
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(ListenerId, Listener)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn on_and_emit_reach_every_listener() {
        let emitter = EventEmitter::new();
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let hits = Arc::clone(&hits);
            emitter.on(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        emitter.emit(&AdapterEvent::Disconnect);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn off_removes_only_that_listener() {
        let emitter = EventEmitter::new();
        let a = emitter.on(|_| {});
        let _b = emitter.on(|_| {});

        assert!(emitter.off(a));
        assert!(!emitter.off(a));
        assert_eq!(emitter.listener_count(), 1);
    }

    #[test]
    fn listener_can_unsubscribe_itself_during_dispatch() {
        let emitter = Arc::new(EventEmitter::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let slot: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));

        let id = {
            let handle = Arc::clone(&emitter);
            let hits = Arc::clone(&hits);
            let slot = Arc::clone(&slot);
            emitter.on(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
                if let Some(id) = *slot.lock().unwrap() {
                    handle.off(id);
                }
            })
        };
        *slot.lock().unwrap() = Some(id);

        emitter.emit(&AdapterEvent::ReadyStateChange(WalletReadyState::Installed));
        emitter.emit(&AdapterEvent::ReadyStateChange(WalletReadyState::Installed));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn event_names_match_wallet_spelling() {
        assert_eq!(AdapterEvent::Disconnect.name(), "disconnect");
        assert_eq!(
            AdapterEvent::ReadyStateChange(WalletReadyState::Loadable).name(),
            "readyStateChange"
        );
        assert_eq!(
            AdapterEvent::AccountChange { address: "0x1".into() }.name(),
            "accountChange"
        );
    }
}

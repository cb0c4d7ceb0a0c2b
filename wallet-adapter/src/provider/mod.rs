//! The wallet-session coordinator.
//!
//! [`WalletProvider`] owns the set of known wallets, the selected wallet and
//! the connection flags derived from it. Commands flow in through its async
//! methods; state flows out through a [`tokio::sync::watch`] channel that UI
//! code (or [`WalletStore`](crate::store::WalletStore)) subscribes to.
//!
//! # Lifecycle
//!
//! 1. **build**: the persisted selection is read and every adapter's
//!    `readyStateChange` is relayed into [`SessionState::wallets`].
//! 2. **connect**: the named wallet becomes the selected one, its
//!    `connect`/`disconnect`/`error`/`accountChange`/`networkChange` events
//!    are bound, and the adapter is asked to connect.
//! 3. **disconnect**: the adapter is asked to disconnect and the session is
//!    reset, whatever the adapter answers.
//!
//! `connecting` and `disconnecting` are flipped inside the same synchronous
//! state update that checks them, before the first await, so overlapping
//! calls observe each other and back off. A disconnect issued while a connect
//! is in flight takes over: it clears `connecting` and the superseded connect
//! leaves the session alone when it finishes.

use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

mod builder;
mod config;
mod hooks;
mod state;

pub use builder::WalletProviderBuilder;
pub use config::{DEFAULT_PERSISTENCE_KEY, WalletProviderConfig};
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub use hooks::WindowOpener;
pub use hooks::{ErrorHandler, LogOpener, UrlOpener, default_opener};
pub use state::{SessionState, Wallet};

use self::hooks::log_error;
use self::state::account_of;
use crate::adapter::{
    AccountKeys, AdapterEvent, ListenerId, NetworkInfo, SharedWalletAdapter, SignMessageInput,
    SignMessageResponse, SubmitResponse, WalletName, WalletReadyState,
};
use crate::error::{Result, WalletError, WalletErrorKind};
use crate::payload::TransactionPayload;
use crate::runtime;
use crate::storage::{PersistedSelection, SharedStorage};

type Subscription = (SharedWalletAdapter, ListenerId);

/// Which wallet a connect attempt targets.
enum Target {
    /// A wallet the caller picked; persisted on success.
    Named(WalletName),
    /// Whatever the persisted selection points at.
    Selected,
}

/// Outcome of the synchronous first half of a connect.
enum Begin {
    Busy,
    Missing,
    NotReady(SharedWalletAdapter),
    Ready(SharedWalletAdapter, WalletName, u64),
}

/// Outcome of the synchronous first half of a disconnect.
enum Leave {
    Busy,
    Idle,
    Adapter(SharedWalletAdapter),
}

/// Coordinates the wallet session: selection, connect/disconnect lifecycle,
/// persistence of the chosen wallet and relaying adapter events into
/// [`SessionState`].
///
/// Cloning is cheap and every clone drives the same session.
///
/// # Example
///
/// ```rust,ignore
/// use wallet_adapter::prelude::*;
///
/// let provider = WalletProvider::builder()
///     .wallet(petra)
///     .storage(Arc::new(MemoryStorage::new()))
///     .build();
///
/// provider.connect("Petra").await?;
/// let signed = provider.sign_message(&"hello".into()).await?;
/// provider.disconnect().await?;
/// ```
#[derive(Clone)]
pub struct WalletProvider {
    inner: Arc<Inner>,
}

struct Inner {
    state: watch::Sender<SessionState>,
    selection: PersistedSelection,
    auto_connect: bool,
    on_error: Option<ErrorHandler>,
    opener: Arc<dyn UrlOpener>,
    unloading: AtomicBool,
    auto_connect_pending: AtomicBool,
    /// Bumped when a disconnect takes over an in-flight connect.
    connect_epoch: AtomicU64,
    readiness: Mutex<Vec<Subscription>>,
    selected: Mutex<Option<Subscription>>,
}

impl fmt::Debug for WalletProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletProvider")
            .field("persistence_key", &self.inner.selection.key())
            .field("auto_connect", &self.inner.auto_connect)
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

impl WalletProvider {
    /// Create a builder.
    #[must_use]
    pub fn builder() -> WalletProviderBuilder {
        WalletProviderBuilder::new()
    }

    pub(crate) fn from_parts(
        wallets: Vec<SharedWalletAdapter>,
        config: &WalletProviderConfig,
        storage: SharedStorage,
        on_error: Option<ErrorHandler>,
        opener: Arc<dyn UrlOpener>,
    ) -> Self {
        let selection = PersistedSelection::new(storage, config.persistence_key.clone());
        let initial = SessionState {
            wallet_name: selection.load(),
            ..SessionState::default()
        };
        debug!(
            key = selection.key(),
            auto_connect = config.auto_connect,
            persisted = ?initial.wallet_name,
            "wallet provider created"
        );

        let inner = Arc::new(Inner {
            state: watch::Sender::new(initial),
            selection,
            auto_connect: config.auto_connect,
            on_error,
            opener,
            unloading: AtomicBool::new(false),
            auto_connect_pending: AtomicBool::new(false),
            connect_epoch: AtomicU64::new(0),
            readiness: Mutex::new(Vec::new()),
            selected: Mutex::new(None),
        });
        inner.set_adapters(wallets);
        Self { inner }
    }

    /// Persist `name` as the chosen wallet, or clear the choice with `None`.
    ///
    /// Does not connect by itself; with auto-connect enabled a ready wallet
    /// is connected as a consequence.
    pub fn select(&self, name: Option<WalletName>) {
        self.inner.set_wallet_name(name);
    }

    /// Select the wallet called `name` and connect to it.
    ///
    /// Returns `Ok(())` without doing anything while another connect or a
    /// disconnect is in flight, or while already connected.
    ///
    /// # Errors
    ///
    /// - [`WalletError::NotSelected`] if no wallet is called `name`.
    /// - [`WalletError::NotReady`] if the wallet is neither installed nor
    ///   loadable; its install page is opened and its `connect` is not called.
    /// - Whatever the adapter's `connect` fails with.
    ///
    /// Every failure clears the persisted selection.
    pub async fn connect(&self, name: impl Into<WalletName>) -> Result<()> {
        self.inner.connect(Target::Named(name.into())).await
    }

    /// Like [`connect`](Self::connect), but gives up waiting after `after`.
    ///
    /// The attempt keeps running in the background after the deadline and
    /// still clears `connecting` when the wallet finally answers.
    ///
    /// # Errors
    ///
    /// [`WalletError::Timeout`] when the deadline elapses first, otherwise the
    /// same errors as [`connect`](Self::connect). Timeouts reach the error hook
    /// like every other coordinator failure.
    pub async fn connect_with_timeout(
        &self,
        name: impl Into<WalletName>,
        after: Duration,
    ) -> Result<()> {
        let (tx, rx) = futures::channel::oneshot::channel();
        let inner = Arc::clone(&self.inner);
        let name = name.into();
        runtime::spawn(async move {
            let result = inner.connect(Target::Named(name)).await;
            let _ = tx.send(result);
        });
        runtime::with_timeout(after, async move {
            rx.await
                .unwrap_or_else(|_| Err(WalletError::connection("connect task was dropped")))
        })
        .await
        .map_err(|e| {
            if e.kind() == WalletErrorKind::Timeout {
                self.inner.report(e)
            } else {
                e
            }
        })
    }

    /// Disconnect the selected wallet and reset the session.
    ///
    /// Returns `Ok(())` without doing anything while another disconnect is in
    /// flight. A connect in flight is superseded: the wallet is asked to
    /// disconnect right away and the connect no longer updates the session
    /// when it finishes. Without a selected wallet it only clears the
    /// persisted selection.
    ///
    /// # Errors
    ///
    /// Whatever the adapter's `disconnect` fails with. The session is reset
    /// and the selection cleared regardless.
    pub async fn disconnect(&self) -> Result<()> {
        self.inner.disconnect().await
    }

    /// Ask the connected wallet to sign a transaction.
    ///
    /// # Errors
    ///
    /// [`WalletError::NotSelected`], then [`WalletError::NotConnected`], then
    /// whatever the adapter fails with.
    pub async fn sign_transaction(
        &self,
        payload: &TransactionPayload,
        options: Option<&Value>,
    ) -> Result<Vec<u8>> {
        let adapter = self.inner.connected_adapter()?;
        adapter.sign_transaction(payload, options).await
    }

    /// Ask the connected wallet to sign and submit a transaction.
    ///
    /// # Errors
    ///
    /// [`WalletError::NotSelected`], then [`WalletError::NotConnected`], then
    /// whatever the adapter fails with.
    pub async fn sign_and_submit_transaction(
        &self,
        payload: &TransactionPayload,
        options: Option<&Value>,
    ) -> Result<SubmitResponse> {
        let adapter = self.inner.connected_adapter()?;
        adapter.sign_and_submit_transaction(payload, options).await
    }

    /// Ask the connected wallet to sign a message.
    ///
    /// # Errors
    ///
    /// [`WalletError::NotSelected`], then [`WalletError::NotConnected`], then
    /// whatever the adapter fails with.
    pub async fn sign_message(&self, message: &SignMessageInput) -> Result<SignMessageResponse> {
        let adapter = self.inner.connected_adapter()?;
        adapter.sign_message(message).await
    }

    /// Replace the set of known wallets.
    ///
    /// Readiness subscriptions on the previous set are dropped before the new
    /// set is subscribed.
    pub fn set_wallets(&self, wallets: Vec<SharedWalletAdapter>) {
        self.inner.set_adapters(wallets);
    }

    /// Mark the page (or process) as going away.
    ///
    /// From now on errors no longer reach the error hook, disconnects keep the
    /// persisted selection so the next load can reconnect, and auto-connect
    /// stops.
    pub fn unload(&self) {
        debug!("wallet provider unloading");
        self.inner.unloading.store(true, Ordering::SeqCst);
    }

    /// Whether [`unload`](Self::unload) was called.
    #[must_use]
    pub fn is_unloading(&self) -> bool {
        self.inner.unloading.load(Ordering::SeqCst)
    }

    /// Snapshot of the whole session.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// All known wallets.
    #[must_use]
    pub fn wallets(&self) -> Vec<Wallet> {
        self.inner.state.borrow().wallets.clone()
    }

    /// The selected wallet.
    #[must_use]
    pub fn wallet(&self) -> Option<Wallet> {
        self.inner.state.borrow().wallet.clone()
    }

    /// The persisted wallet selection.
    #[must_use]
    pub fn wallet_name(&self) -> Option<WalletName> {
        self.inner.state.borrow().wallet_name.clone()
    }

    /// Keys of the connected account.
    #[must_use]
    pub fn account(&self) -> Option<AccountKeys> {
        self.inner.state.borrow().account.clone()
    }

    /// Network of the connected wallet.
    #[must_use]
    pub fn network(&self) -> Option<NetworkInfo> {
        self.inner.state.borrow().network.clone()
    }

    /// Whether the selected wallet is connected.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.inner.state.borrow().connected
    }

    /// Whether a connect call is in flight.
    #[must_use]
    pub fn connecting(&self) -> bool {
        self.inner.state.borrow().connecting
    }

    /// Whether a disconnect call is in flight.
    #[must_use]
    pub fn disconnecting(&self) -> bool {
        self.inner.state.borrow().disconnecting
    }

    /// Key the selection is persisted under.
    #[must_use]
    pub fn persistence_key(&self) -> &str {
        self.inner.selection.key()
    }
}

impl Inner {
    async fn connect(self: &Arc<Self>, target: Target) -> Result<()> {
        let manual = matches!(target, Target::Named(_));
        let mut begin = Begin::Busy;
        self.state.send_if_modified(|s| {
            if s.connecting || s.disconnecting || s.connected {
                return false;
            }
            let name = match target {
                Target::Named(name) => Some(name),
                Target::Selected => s.wallet_name.clone(),
            };
            let Some(wallet) = name.as_ref().and_then(|n| s.find(n.as_str())).cloned() else {
                s.reset_session();
                begin = Begin::Missing;
                return true;
            };
            let adapter = Arc::clone(&wallet.adapter);
            let name = wallet.name().clone();
            s.wallet = Some(wallet);
            s.connected = adapter.connected();
            s.account = account_of(&adapter);
            if adapter.ready_state().is_ready() {
                s.connecting = true;
                if manual {
                    s.wallet_name = Some(name.clone());
                }
                begin = Begin::Ready(adapter, name, self.connect_epoch.load(Ordering::SeqCst));
            } else {
                begin = Begin::NotReady(adapter);
            }
            true
        });

        match begin {
            Begin::Busy => {
                debug!("connect ignored, session busy");
                Ok(())
            }
            Begin::Missing => {
                self.bind_selected(None);
                self.set_wallet_name(None);
                Err(self.report(WalletError::NotSelected))
            }
            Begin::NotReady(adapter) => {
                if let Some(previous) = self.bind_selected(Some(&adapter)) {
                    runtime::spawn(async move { teardown(previous).await });
                }
                self.set_wallet_name(None);
                let url = adapter.url();
                if !url.is_empty() {
                    if let Err(error) = self.opener.open(url) {
                        warn!(wallet = %adapter.name(), %error, "could not open install page");
                    }
                }
                Err(self.report(WalletError::NotReady))
            }
            Begin::Ready(adapter, name, epoch) => {
                if manual {
                    self.selection.store(Some(&name));
                }
                let previous = self.bind_selected(Some(&adapter));
                let connecting = ConnectingGuard { inner: self, epoch };
                if let Some(previous) = previous {
                    teardown(previous).await;
                }
                debug!(wallet = %name, "connecting");
                let result = adapter.connect().await;
                if connecting.superseded() {
                    debug!(wallet = %name, "connect superseded by disconnect");
                    return result;
                }
                match result {
                    Ok(()) => {
                        info!(wallet = %name, "wallet connected");
                        Ok(())
                    }
                    Err(error) => {
                        debug!(wallet = %name, %error, "wallet connect failed");
                        self.set_wallet_name(None);
                        Err(error)
                    }
                }
            }
        }
    }

    async fn disconnect(self: &Arc<Self>) -> Result<()> {
        let mut leave = Leave::Busy;
        self.state.send_if_modified(|s| {
            if s.disconnecting {
                return false;
            }
            match s.wallet.as_ref() {
                None => {
                    leave = Leave::Idle;
                    false
                }
                Some(wallet) => {
                    leave = Leave::Adapter(Arc::clone(&wallet.adapter));
                    if s.connecting {
                        self.connect_epoch.fetch_add(1, Ordering::SeqCst);
                        s.connecting = false;
                    }
                    s.disconnecting = true;
                    true
                }
            }
        });

        match leave {
            Leave::Busy => {
                debug!("disconnect ignored, already disconnecting");
                Ok(())
            }
            Leave::Idle => {
                self.set_wallet_name(None);
                Ok(())
            }
            Leave::Adapter(adapter) => {
                let _disconnecting = DisconnectingGuard { inner: self };
                debug!(wallet = %adapter.name(), "disconnecting");
                let result = adapter.disconnect().await;
                if let Err(error) = &result {
                    debug!(wallet = %adapter.name(), %error, "wallet disconnect failed");
                    self.set_wallet_name(None);
                }
                result
            }
        }
    }

    fn connected_adapter(&self) -> Result<SharedWalletAdapter> {
        let (adapter, connected) = {
            let s = self.state.borrow();
            (s.wallet.as_ref().map(|w| Arc::clone(&w.adapter)), s.connected)
        };
        let Some(adapter) = adapter else {
            return Err(self.report(WalletError::NotSelected));
        };
        if !connected {
            return Err(self.report(WalletError::NotConnected));
        }
        Ok(adapter)
    }

    /// Route `error` to the hook unless unloading, and hand it back.
    fn report(&self, error: WalletError) -> WalletError {
        if !self.unloading.load(Ordering::SeqCst) {
            match &self.on_error {
                Some(handler) => handler(&error),
                None => log_error(&error),
            }
        }
        error
    }

    fn set_wallet_name(self: &Arc<Self>, name: Option<WalletName>) {
        self.selection.store(name.as_ref());
        self.state.send_if_modified(|s| {
            if s.wallet_name == name {
                return false;
            }
            s.wallet_name = name;
            true
        });
        self.maybe_auto_connect();
    }

    fn reset_session(self: &Arc<Self>) {
        self.state.send_modify(SessionState::reset_session);
        self.bind_selected(None);
    }

    fn handle_disconnect(self: &Arc<Self>) {
        if !self.unloading.load(Ordering::SeqCst) {
            self.set_wallet_name(None);
        }
        self.reset_session();
    }

    fn set_adapters(self: &Arc<Self>, adapters: Vec<SharedWalletAdapter>) {
        let previous = mem::take(&mut *lock(&self.readiness));
        for (adapter, id) in previous {
            adapter.events().off(id);
        }

        let mut subscriptions = Vec::with_capacity(adapters.len());
        for adapter in &adapters {
            let weak = Arc::downgrade(self);
            let name = adapter.name().clone();
            let id = adapter.events().on(move |event| {
                if let AdapterEvent::ReadyStateChange(ready_state) = event {
                    if let Some(inner) = weak.upgrade() {
                        inner.update_ready_state(&name, *ready_state);
                    }
                }
            });
            subscriptions.push((Arc::clone(adapter), id));
        }
        *lock(&self.readiness) = subscriptions;

        let wallets: Vec<Wallet> = adapters.into_iter().map(Wallet::new).collect();
        debug!(
            wallets = ?wallets.iter().map(Wallet::name).collect::<Vec<_>>(),
            "wallet set changed"
        );
        self.state.send_modify(|s| s.wallets = wallets);
        self.maybe_auto_connect();
    }

    fn update_ready_state(self: &Arc<Self>, name: &WalletName, ready_state: WalletReadyState) {
        let changed = self.state.send_if_modified(|s| {
            let mut changed = false;
            for wallet in s.wallets.iter_mut().chain(s.wallet.iter_mut()) {
                if wallet.name() == name && wallet.ready_state != ready_state {
                    wallet.ready_state = ready_state;
                    changed = true;
                }
            }
            changed
        });
        if changed {
            debug!(wallet = %name, %ready_state, "relayed ready state");
            self.maybe_auto_connect();
        }
    }

    /// Bind the selected adapter's events, unbinding the previous adapter.
    ///
    /// Returns the previous adapter when a different adapter replaced it, so
    /// the caller can disconnect it. This includes a provisionally selected
    /// adapter that never connected.
    fn bind_selected(
        self: &Arc<Self>,
        next: Option<&SharedWalletAdapter>,
    ) -> Option<SharedWalletAdapter> {
        let mut selected = lock(&self.selected);
        let unchanged = match (selected.as_ref(), next) {
            (Some((current, _)), Some(next)) => current.name() == next.name(),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return None;
        }

        let previous = selected.take();
        if let Some(next) = next {
            let weak = Arc::downgrade(self);
            let id = next.events().on(move |event| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_selected_event(event);
                }
            });
            *selected = Some((Arc::clone(next), id));
        }
        drop(selected);

        let (previous, id) = previous?;
        previous.events().off(id);
        next.is_some().then_some(previous)
    }

    fn on_selected_event(self: &Arc<Self>, event: &AdapterEvent) {
        match event {
            AdapterEvent::Connect { .. } | AdapterEvent::AccountChange { .. } => {
                debug!(event = event.name(), "refreshing session from wallet");
                self.state.send_modify(SessionState::refresh_from_adapter);
            }
            AdapterEvent::NetworkChange(network) => {
                debug!(?network, "wallet network changed");
                self.state.send_if_modified(|s| {
                    if !s.connected {
                        return false;
                    }
                    s.network = Some(network.clone());
                    true
                });
            }
            AdapterEvent::Disconnect => {
                debug!("wallet reported disconnect");
                self.handle_disconnect();
            }
            AdapterEvent::Error(error) => {
                self.report(error.clone());
            }
            AdapterEvent::ReadyStateChange(_) => {}
        }
    }

    fn maybe_auto_connect(self: &Arc<Self>) {
        if !self.auto_connect || self.unloading.load(Ordering::SeqCst) {
            return;
        }
        let eligible = {
            let s = self.state.borrow();
            !s.connecting
                && !s.connected
                && !s.disconnecting
                && s.wallet_name.is_some()
                && s.selected_ready_state().is_ready()
        };
        if !eligible {
            return;
        }
        if self
            .auto_connect_pending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        debug!("auto-connecting to persisted wallet");
        let inner = Arc::clone(self);
        runtime::spawn(async move {
            let result = inner.connect(Target::Selected).await;
            inner.auto_connect_pending.store(false, Ordering::SeqCst);
            if let Err(error) = result {
                debug!(%error, "auto-connect failed");
                inner.set_wallet_name(None);
            }
        });
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let readiness = mem::take(self.readiness.get_mut().unwrap_or_else(PoisonError::into_inner));
        for (adapter, id) in readiness {
            adapter.events().off(id);
        }
        if let Some((adapter, id)) = self
            .selected
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            adapter.events().off(id);
        }
    }
}

/// Clears `connecting` and refreshes from the adapter when a connect ends,
/// including when its future is dropped mid-flight.
///
/// Does nothing once a disconnect has taken the session over.
struct ConnectingGuard<'a> {
    inner: &'a Arc<Inner>,
    epoch: u64,
}

impl ConnectingGuard<'_> {
    fn superseded(&self) -> bool {
        self.inner.connect_epoch.load(Ordering::SeqCst) != self.epoch
    }
}

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        let epoch = self.epoch;
        let connect_epoch = &self.inner.connect_epoch;
        let finished = self.inner.state.send_if_modified(|s| {
            // Checked under the state lock so a concurrent takeover is seen.
            if connect_epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            s.connecting = false;
            s.refresh_from_adapter();
            true
        });
        if finished {
            self.inner.maybe_auto_connect();
        }
    }
}

/// Clears `disconnecting` and resets the session when a disconnect ends,
/// including when its future is dropped mid-flight.
struct DisconnectingGuard<'a> {
    inner: &'a Arc<Inner>,
}

impl Drop for DisconnectingGuard<'_> {
    fn drop(&mut self) {
        self.inner.state.send_modify(|s| s.disconnecting = false);
        if !self.inner.unloading.load(Ordering::SeqCst) {
            self.inner.set_wallet_name(None);
        }
        self.inner.reset_session();
    }
}

async fn teardown(previous: SharedWalletAdapter) {
    debug!(wallet = %previous.name(), "disconnecting previously selected wallet");
    if let Err(error) = previous.disconnect().await {
        warn!(wallet = %previous.name(), %error, "failed to disconnect previous wallet");
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

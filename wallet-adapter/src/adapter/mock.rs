//! Scripted adapter for tests and demos.
//!
//! [`MockWalletAdapter`] behaves like a well-mannered browser wallet without
//! any native API behind it: it connects to a fixed account, signs
//! deterministically, and can be told to fail or to report readiness and
//! account changes on demand.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{
    AccountKeys, AdapterCore, EventEmitter, NetworkInfo, SignMessageInput, SignMessageResponse,
    SubmitResponse, WalletAdapter, WalletName, WalletReadyState,
};
use crate::error::{Result, WalletError};
use crate::payload::TransactionPayload;

#[derive(Debug, Default)]
struct Failures {
    connect: Option<WalletError>,
    disconnect: Option<WalletError>,
    sign: Option<WalletError>,
}

/// A wallet adapter driven entirely from code.
///
/// # Example
///
/// ```rust,ignore
/// use wallet_adapter::adapter::{AccountKeys, MockWalletAdapter, WalletReadyState};
///
/// let petra = MockWalletAdapter::new("Petra")
///     .with_ready_state(WalletReadyState::Installed)
///     .with_account(AccountKeys::with_address("0x1"));
/// ```
#[derive(Debug)]
pub struct MockWalletAdapter {
    core: AdapterCore,
    account: AccountKeys,
    network: NetworkInfo,
    latency: Option<Duration>,
    failures: Mutex<Failures>,
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    sign_calls: AtomicUsize,
}

impl MockWalletAdapter {
    /// Create an installed mock wallet with an empty account.
    #[must_use]
    pub fn new(name: impl Into<WalletName>) -> Self {
        let name = name.into();
        let url = format!("https://wallets.example/{}", name.as_str().to_lowercase());
        Self {
            core: AdapterCore::new(name, url, "", WalletReadyState::Installed),
            account: AccountKeys::default(),
            network: NetworkInfo::default(),
            latency: None,
            failures: Mutex::new(Failures::default()),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            sign_calls: AtomicUsize::new(0),
        }
    }

    /// Set the initial readiness.
    #[must_use]
    pub fn with_ready_state(self, ready_state: WalletReadyState) -> Self {
        self.core.set_ready_state(ready_state);
        self
    }

    /// Replace the install URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        let core = AdapterCore::new(
            self.core.name().clone(),
            url,
            self.core.icon(),
            self.core.ready_state(),
        );
        self.core = core;
        self
    }

    /// Account handed out on connect.
    #[must_use]
    pub fn with_account(mut self, account: AccountKeys) -> Self {
        self.account = account;
        self
    }

    /// Network reported after connect.
    #[must_use]
    pub fn with_network(mut self, network: NetworkInfo) -> Self {
        self.network = network;
        self
    }

    /// Delay every async call by `latency`, so overlapping calls can be observed.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make subsequent connect calls fail with `error`.
    pub fn fail_connect(&self, error: Option<WalletError>) {
        self.failures().connect = error;
    }

    /// Make subsequent disconnect calls fail with `error`.
    pub fn fail_disconnect(&self, error: Option<WalletError>) {
        self.failures().disconnect = error;
    }

    /// Make subsequent sign calls fail with `error`.
    pub fn fail_sign(&self, error: Option<WalletError>) {
        self.failures().sign = error;
    }

    /// Change readiness, emitting `readyStateChange` like a detected extension.
    pub fn set_ready_state(&self, ready_state: WalletReadyState) {
        self.core.set_ready_state(ready_state);
    }

    /// Switch accounts inside the wallet.
    pub fn switch_account(&self, account: AccountKeys) {
        self.core.change_account(account);
    }

    /// Switch networks inside the wallet.
    pub fn switch_network(&self, network: NetworkInfo) {
        self.core.change_network(network);
    }

    /// Number of times `connect` reached the wallet.
    #[must_use]
    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    /// Number of times `disconnect` reached the wallet.
    #[must_use]
    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    /// Number of sign calls that reached the wallet.
    #[must_use]
    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    fn failures(&self) -> std::sync::MutexGuard<'_, Failures> {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn wait(&self) {
        if let Some(latency) = self.latency {
            futures_timer::Delay::new(latency).await;
        }
    }

    fn begin_sign(&self) -> Result<()> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        if !self.core.connected() {
            return Err(WalletError::NotConnected);
        }
        Ok(())
    }

    fn sign_failure(&self, wrap: fn(String) -> WalletError) -> Option<WalletError> {
        self.failures().sign.clone().map(|e| wrap(e.to_string()))
    }

    fn address(&self) -> String {
        self.account.address.clone().unwrap_or_default()
    }
}

#[async_trait]
impl WalletAdapter for MockWalletAdapter {
    fn name(&self) -> &WalletName {
        self.core.name()
    }

    fn url(&self) -> &str {
        self.core.url()
    }

    fn icon(&self) -> &str {
        self.core.icon()
    }

    fn ready_state(&self) -> WalletReadyState {
        self.core.ready_state()
    }

    fn connected(&self) -> bool {
        self.core.connected()
    }

    fn connecting(&self) -> bool {
        self.core.connecting()
    }

    fn public_account(&self) -> AccountKeys {
        self.core.public_account()
    }

    fn network(&self) -> NetworkInfo {
        self.core.network()
    }

    fn events(&self) -> &EventEmitter {
        self.core.events()
    }

    async fn connect(&self) -> Result<()> {
        if self.core.connected() || !self.core.begin_connect() {
            return Ok(());
        }
        self.connect_calls.fetch_add(1, Ordering::SeqCst);

        if !self.core.ready_state().is_ready() {
            self.core.end_connect();
            return Err(self.core.fail(WalletError::NotReady));
        }

        self.wait().await;
        let failure = self.failures().connect.clone();
        let result = match failure {
            Some(error) => Err(self.core.fail(error)),
            None => {
                self.core.set_network(self.network.clone());
                self.core.set_connected(self.account.clone());
                Ok(())
            }
        };
        self.core.end_connect();
        result
    }

    async fn disconnect(&self) -> Result<()> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        let failure = self.failures().disconnect.clone();
        if let Some(error) = failure {
            return Err(self.core.fail(WalletError::disconnection(error.to_string())));
        }
        if self.core.connected() {
            self.core.set_disconnected();
        }
        Ok(())
    }

    async fn sign_transaction(
        &self,
        payload: &TransactionPayload,
        _options: Option<&Value>,
    ) -> Result<Vec<u8>> {
        self.begin_sign()?;
        self.wait().await;
        if let Some(error) = self.sign_failure(WalletError::SignTransaction) {
            return Err(self.core.fail(error));
        }
        serde_json::to_vec(payload).map_err(|e| self.core.fail(WalletError::sign_transaction(e.to_string())))
    }

    async fn sign_and_submit_transaction(
        &self,
        payload: &TransactionPayload,
        _options: Option<&Value>,
    ) -> Result<SubmitResponse> {
        self.begin_sign()?;
        self.wait().await;
        if let Some(error) = self.sign_failure(WalletError::SignAndSubmit) {
            return Err(self.core.fail(error));
        }
        let bytes = serde_json::to_vec(payload)
            .map_err(|e| self.core.fail(WalletError::sign_and_submit(e.to_string())))?;
        let digest = bytes
            .iter()
            .fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
                (hash ^ u64::from(*byte)).wrapping_mul(0x0100_0000_01b3)
            });
        Ok(SubmitResponse {
            hash: format!("0x{digest:016x}"),
        })
    }

    async fn sign_message(&self, message: &SignMessageInput) -> Result<SignMessageResponse> {
        self.begin_sign()?;
        self.wait().await;
        if let Some(error) = self.sign_failure(WalletError::SignMessage) {
            return Err(self.core.fail(error));
        }

        let (text, nonce, with_address) = match message {
            SignMessageInput::Text(text) => (text.clone(), String::new(), false),
            SignMessageInput::Payload(payload) => (
                payload.message.clone(),
                payload.nonce.clone(),
                payload.address.unwrap_or(false),
            ),
            SignMessageInput::Bytes(bytes) => {
                (String::from_utf8_lossy(bytes).into_owned(), String::new(), false)
            }
        };

        let address = with_address.then(|| self.address());
        let mut full_message = String::from("APTOS");
        if let Some(address) = &address {
            full_message.push_str(&format!("\naddress: {address}"));
        }
        full_message.push_str(&format!("\nmessage: {text}\nnonce: {nonce}"));

        let signature: String = full_message
            .bytes()
            .take(32)
            .map(|b| format!("{b:02x}"))
            .collect();

        Ok(SignMessageResponse {
            address,
            application: None,
            chain_id: None,
            full_message,
            message: text,
            nonce,
            prefix: "APTOS".to_owned(),
            signature: format!("0x{signature}"),
        })
    }
}

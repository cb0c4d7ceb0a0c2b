//! Integration tests for the wallet session coordinator.

#![allow(clippy::unwrap_used, clippy::panic, clippy::clone_on_ref_ptr)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_fs::TempDir;
use wallet_adapter::prelude::*;

const KEY: &str = "walletName";

#[derive(Debug, Default)]
struct RecordingOpener {
    opened: Mutex<Vec<String>>,
}

impl UrlOpener for RecordingOpener {
    fn open(&self, url: &str) -> Result<()> {
        self.opened.lock().unwrap().push(url.to_owned());
        Ok(())
    }
}

struct Harness {
    provider: WalletProvider,
    storage: Arc<MemoryStorage>,
    opener: Arc<RecordingOpener>,
    errors: Arc<Mutex<Vec<WalletErrorKind>>>,
}

impl Harness {
    fn new(wallets: &[&Arc<MockWalletAdapter>]) -> Self {
        Self::with(wallets, Arc::new(MemoryStorage::new()), false)
    }

    fn with(
        wallets: &[&Arc<MockWalletAdapter>],
        storage: Arc<MemoryStorage>,
        auto: bool,
    ) -> Self {
        let opener = Arc::new(RecordingOpener::default());
        let errors = Arc::new(Mutex::new(Vec::new()));
        let seen = errors.clone();
        let provider = WalletProvider::builder()
            .wallets(wallets.iter().map(|w| -> SharedWalletAdapter { (*w).clone() }))
            .storage(storage.clone())
            .opener(opener.clone())
            .auto_connect(auto)
            .on_error(move |e| seen.lock().unwrap().push(e.kind()))
            .build();
        Self {
            provider,
            storage,
            opener,
            errors,
        }
    }

    fn persisted(&self) -> Option<String> {
        self.storage.get(KEY).unwrap()
    }

    fn errors(&self) -> Vec<WalletErrorKind> {
        self.errors.lock().unwrap().clone()
    }
}

fn wallet(name: &str) -> Arc<MockWalletAdapter> {
    Arc::new(MockWalletAdapter::new(name).with_account(AccountKeys::with_address("0x1")))
}

fn wallet_in(name: &str, ready_state: WalletReadyState) -> Arc<MockWalletAdapter> {
    Arc::new(
        MockWalletAdapter::new(name)
            .with_account(AccountKeys::with_address("0x1"))
            .with_ready_state(ready_state),
    )
}

fn slow_wallet(name: &str) -> Arc<MockWalletAdapter> {
    Arc::new(
        MockWalletAdapter::new(name)
            .with_account(AccountKeys::with_address("0x1"))
            .with_latency(Duration::from_millis(50)),
    )
}

async fn settle<F>(provider: &WalletProvider, done: F)
where
    F: FnMut(&SessionState) -> bool,
{
    let mut rx = provider.subscribe();
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(done))
        .await
        .unwrap()
        .unwrap();
}

// ============================================================================
// Readiness
// ============================================================================

#[tokio::test]
async fn test_not_ready_wallet_is_never_connected() {
    for ready_state in [WalletReadyState::Unsupported, WalletReadyState::NotDetected] {
        let a = wallet_in("A", ready_state);
        let h = Harness::new(&[&a]);

        let err = h.provider.connect("A").await.unwrap_err();

        assert_eq!(err, WalletError::NotReady);
        assert_eq!(a.connect_calls(), 0);
        assert!(!h.provider.connected());
        assert!(!h.provider.connecting());
        assert_eq!(*h.opener.opened.lock().unwrap(), vec!["https://wallets.example/a"]);
    }
}

#[tokio::test]
async fn test_loadable_wallet_connects() {
    let a = wallet_in("A", WalletReadyState::Loadable);
    let h = Harness::new(&[&a]);

    h.provider.connect("A").await.unwrap();
    assert!(h.provider.connected());
}

#[tokio::test]
async fn test_installed_and_unsupported_scenario() {
    let a = wallet("A");
    let b = wallet_in("B", WalletReadyState::Unsupported);
    let h = Harness::new(&[&a, &b]);

    let err = h.provider.connect("B").await.unwrap_err();

    assert_eq!(err.kind(), WalletErrorKind::NotReady);
    assert!(!h.provider.connected());
    assert!(h.persisted().is_none());
    assert!(h.provider.wallet_name().is_none());
    assert_eq!(h.errors(), vec![WalletErrorKind::NotReady]);
}

// ============================================================================
// Connect / disconnect lifecycle
// ============================================================================

#[tokio::test]
async fn test_connect_then_disconnect() {
    let a = wallet("A");
    let h = Harness::new(&[&a]);

    h.provider.connect("A").await.unwrap();

    let state = h.provider.state();
    assert!(state.connected);
    assert!(!state.connecting);
    assert_eq!(state.wallet.unwrap().name(), "A");
    assert_eq!(state.account.unwrap().address.as_deref(), Some("0x1"));
    assert_eq!(h.persisted().as_deref(), Some("\"A\""));
    assert_eq!(h.provider.wallet_name().unwrap(), "A");

    h.provider.disconnect().await.unwrap();

    let state = h.provider.state();
    assert!(state.wallet.is_none());
    assert!(state.account.is_none());
    assert!(state.network.is_none());
    assert!(!state.connected);
    assert!(!state.disconnecting);
    assert!(h.persisted().is_none());
    assert_eq!(a.disconnect_calls(), 1);
    assert!(h.errors().is_empty());
}

#[tokio::test]
async fn test_unknown_wallet_is_not_selected() {
    let a = wallet("A");
    let h = Harness::new(&[&a]);

    let err = h.provider.connect("Z").await.unwrap_err();

    assert_eq!(err, WalletError::NotSelected);
    assert!(h.provider.wallet().is_none());
    assert_eq!(h.errors(), vec![WalletErrorKind::NotSelected]);
}

#[tokio::test]
async fn test_concurrent_connects_reach_the_wallet_once() {
    let a = slow_wallet("A");
    let h = Harness::new(&[&a]);

    let (first, second) = tokio::join!(h.provider.connect("A"), h.provider.connect("A"));

    first.unwrap();
    second.unwrap();
    assert_eq!(a.connect_calls(), 1);
    assert!(h.provider.connected());
}

#[tokio::test]
async fn test_connect_while_connected_is_ignored() {
    let a = wallet("A");
    let b = wallet("B");
    let h = Harness::new(&[&a, &b]);

    h.provider.connect("A").await.unwrap();
    h.provider.connect("B").await.unwrap();

    assert_eq!(b.connect_calls(), 0);
    assert_eq!(h.provider.wallet().unwrap().name(), "A");
    assert_eq!(h.persisted().as_deref(), Some("\"A\""));
}

#[tokio::test]
async fn test_concurrent_disconnects_reach_the_wallet_once() {
    let a = slow_wallet("A");
    let h = Harness::new(&[&a]);
    h.provider.connect("A").await.unwrap();

    let (first, second) = tokio::join!(h.provider.disconnect(), h.provider.disconnect());

    first.unwrap();
    second.unwrap();
    assert_eq!(a.disconnect_calls(), 1);
    assert!(!h.provider.connected());
}

#[tokio::test]
async fn test_disconnect_supersedes_connect_in_flight() {
    let a = slow_wallet("A");
    let h = Harness::new(&[&a]);

    let (connected, disconnected) = tokio::join!(h.provider.connect("A"), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(h.provider.connecting());
        h.provider.disconnect().await
    });

    connected.unwrap();
    disconnected.unwrap();
    assert_eq!(a.disconnect_calls(), 1);

    let state = h.provider.state();
    assert!(state.wallet.is_none());
    assert!(state.account.is_none());
    assert!(!state.connected);
    assert!(!state.connecting);
    assert!(!state.disconnecting);
    assert!(h.provider.wallet_name().is_none());
    assert!(h.persisted().is_none());
}

#[tokio::test]
async fn test_disconnect_takes_over_the_connecting_flag() {
    let a = slow_wallet("A");
    let h = Harness::new(&[&a]);

    let (connected, ()) = tokio::join!(h.provider.connect("A"), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let disconnect = h.provider.disconnect();
        tokio::pin!(disconnect);
        // Poll once so the disconnect starts, then inspect the flags.
        assert!(futures::poll!(disconnect.as_mut()).is_pending());
        let state = h.provider.state();
        assert!(state.disconnecting);
        assert!(!state.connecting);
        disconnect.await.unwrap();
    });
    connected.unwrap();

    // Once idle, the session accepts a fresh connect.
    h.provider.connect("A").await.unwrap();
    assert_eq!(a.connect_calls(), 2);
    assert!(h.provider.connected());
    assert_eq!(h.persisted().as_deref(), Some("\"A\""));
}

#[tokio::test]
async fn test_disconnect_without_wallet_clears_selection() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set(KEY, "\"A\"").unwrap();
    let a = wallet_in("A", WalletReadyState::NotDetected);
    let h = Harness::with(&[&a], storage, false);
    assert_eq!(h.provider.wallet_name().unwrap(), "A");

    h.provider.disconnect().await.unwrap();

    assert!(h.persisted().is_none());
    assert!(h.provider.wallet_name().is_none());
    assert_eq!(a.disconnect_calls(), 0);
}

#[tokio::test]
async fn test_failed_disconnect_still_resets_session() {
    let a = wallet("A");
    let h = Harness::new(&[&a]);
    h.provider.connect("A").await.unwrap();
    a.fail_disconnect(Some(WalletError::disconnection("extension crashed")));

    let err = h.provider.disconnect().await.unwrap_err();

    assert_eq!(err.kind(), WalletErrorKind::Disconnection);
    let state = h.provider.state();
    assert!(state.wallet.is_none());
    assert!(state.account.is_none());
    assert!(!state.connected);
    assert!(!state.disconnecting);
    assert!(h.persisted().is_none());
    assert_eq!(h.errors(), vec![WalletErrorKind::Disconnection]);
}

#[tokio::test]
async fn test_failed_connect_clears_selection() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set(KEY, "\"A\"").unwrap();
    let a = wallet("A");
    a.fail_connect(Some(WalletError::connection("user rejected")));
    let h = Harness::with(&[&a], storage, false);

    let err = h.provider.connect("A").await.unwrap_err();

    assert_eq!(err, WalletError::connection("user rejected"));
    assert!(h.persisted().is_none());
    assert!(h.provider.wallet_name().is_none());
    assert!(!h.provider.connected());
    assert!(!h.provider.connecting());
    assert_eq!(a.connect_calls(), 1);
}

#[tokio::test]
async fn test_select_only_persists() {
    let a = wallet("A");
    let h = Harness::new(&[&a]);

    h.provider.select(Some(WalletName::new("A")));
    assert_eq!(h.persisted().as_deref(), Some("\"A\""));
    assert_eq!(a.connect_calls(), 0);

    h.provider.select(None);
    assert!(h.persisted().is_none());
}

// ============================================================================
// Signing
// ============================================================================

#[tokio::test]
async fn test_sign_checks_selection_before_connection() {
    let a = wallet("A");
    let b = wallet_in("B", WalletReadyState::NotDetected);
    let h = Harness::new(&[&a, &b]);
    let payload = TransactionPayload::entry_function("0x1::coin::transfer", vec![], vec![]);

    let err = h.provider.sign_transaction(&payload, None).await.unwrap_err();
    assert_eq!(err, WalletError::NotSelected);

    // A wallet that is not ready stays selected but never connects.
    let _ = h.provider.connect("B").await;
    assert_eq!(h.provider.wallet().unwrap().name(), "B");

    let err = h.provider.sign_message(&"hi".into()).await.unwrap_err();
    assert_eq!(err, WalletError::NotConnected);
    assert_eq!(b.sign_calls(), 0);
}

#[tokio::test]
async fn test_switching_away_from_unready_wallet_disconnects_it() {
    let a = wallet("A");
    let b = wallet_in("B", WalletReadyState::NotDetected);
    let h = Harness::new(&[&a, &b]);

    let _ = h.provider.connect("B").await;
    assert_eq!(h.provider.wallet().unwrap().name(), "B");

    h.provider.connect("A").await.unwrap();

    assert_eq!(b.disconnect_calls(), 1);
    assert_eq!(b.connect_calls(), 0);
    assert_eq!(h.provider.wallet().unwrap().name(), "A");
    assert!(h.provider.connected());
}

#[tokio::test]
async fn test_sign_delegates_to_the_wallet() {
    let a = wallet("A");
    let h = Harness::new(&[&a]);
    h.provider.connect("A").await.unwrap();
    let payload = TransactionPayload::entry_function(
        "0x1::coin::transfer",
        vec!["0x1::aptos_coin::AptosCoin".into()],
        vec!["0x2".into(), "100".into()],
    );

    let bytes = h.provider.sign_transaction(&payload, None).await.unwrap();
    let echoed: TransactionPayload = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(echoed, payload);

    let submitted = h.provider.sign_and_submit_transaction(&payload, None).await.unwrap();
    assert!(submitted.hash.starts_with("0x"));

    let message = SignMessagePayload {
        address: Some(true),
        message: "welcome".into(),
        nonce: "42".into(),
        ..SignMessagePayload::default()
    };
    let signed = h.provider.sign_message(&message.into()).await.unwrap();
    assert_eq!(signed.full_message, "APTOS\naddress: 0x1\nmessage: welcome\nnonce: 42");
    assert_eq!(a.sign_calls(), 3);
}

#[tokio::test]
async fn test_sign_errors_are_passed_through() {
    let a = wallet("A");
    let h = Harness::new(&[&a]);
    h.provider.connect("A").await.unwrap();
    a.fail_sign(Some(WalletError::sign_message("user rejected")));

    let err = h.provider.sign_message(&"hi".into()).await.unwrap_err();

    assert_eq!(err.kind(), WalletErrorKind::SignMessage);
    assert!(h.provider.connected());
    assert_eq!(h.errors(), vec![WalletErrorKind::SignMessage]);
}

// ============================================================================
// Adapter events
// ============================================================================

#[tokio::test]
async fn test_account_and_network_changes_are_relayed() {
    let a = Arc::new(
        MockWalletAdapter::new("A")
            .with_account(AccountKeys::with_address("0x1"))
            .with_network(NetworkInfo {
                name: Some(WalletAdapterNetwork::Mainnet),
                ..NetworkInfo::default()
            }),
    );
    let h = Harness::new(&[&a]);
    h.provider.connect("A").await.unwrap();
    assert_eq!(h.provider.network().unwrap().name, Some(WalletAdapterNetwork::Mainnet));

    a.switch_account(AccountKeys::with_address("0x2"));
    assert_eq!(h.provider.account().unwrap().address.as_deref(), Some("0x2"));

    a.switch_network(NetworkInfo {
        name: Some(WalletAdapterNetwork::Testnet),
        chain_id: Some("2".into()),
        api: None,
    });
    let network = h.provider.network().unwrap();
    assert_eq!(network.name, Some(WalletAdapterNetwork::Testnet));
    assert_eq!(network.chain_id.as_deref(), Some("2"));
}

#[tokio::test]
async fn test_wallet_side_disconnect_resets_session() {
    let a = wallet("A");
    let h = Harness::new(&[&a]);
    h.provider.connect("A").await.unwrap();

    a.disconnect().await.unwrap();

    assert!(!h.provider.connected());
    assert!(h.provider.wallet().is_none());
    assert!(h.persisted().is_none());
}

#[tokio::test]
async fn test_unload_keeps_selection_and_silences_errors() {
    let a = wallet("A");
    let h = Harness::new(&[&a]);
    h.provider.connect("A").await.unwrap();

    h.provider.unload();
    a.fail_sign(Some(WalletError::sign_message("page closing")));
    let _ = h.provider.sign_message(&"bye".into()).await;
    h.provider.disconnect().await.unwrap();

    assert!(!h.provider.connected());
    assert_eq!(h.persisted().as_deref(), Some("\"A\""));
    assert!(h.errors().is_empty());
}

// ============================================================================
// Auto-connect
// ============================================================================

#[tokio::test]
async fn test_auto_connect_waits_for_readiness() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set(KEY, "\"A\"").unwrap();
    let a = wallet_in("A", WalletReadyState::NotDetected);
    let h = Harness::with(&[&a], storage, true);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(a.connect_calls(), 0);

    a.set_ready_state(WalletReadyState::Installed);
    settle(&h.provider, |s| s.connected).await;
    assert_eq!(a.connect_calls(), 1);

    a.set_ready_state(WalletReadyState::Installed);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(a.connect_calls(), 1);
    assert_eq!(h.persisted().as_deref(), Some("\"A\""));
}

#[tokio::test]
async fn test_auto_connect_on_build_when_ready() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set(KEY, "\"A\"").unwrap();
    let a = wallet("A");
    let h = Harness::with(&[&a], storage, true);

    settle(&h.provider, |s| s.connected).await;
    assert_eq!(a.connect_calls(), 1);
}

#[tokio::test]
async fn test_auto_connect_failure_clears_selection() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set(KEY, "\"A\"").unwrap();
    let a = wallet("A");
    a.fail_connect(Some(WalletError::connection("locked")));
    let h = Harness::with(&[&a], storage, true);

    settle(&h.provider, |s| s.wallet_name.is_none() && !s.connecting).await;
    assert!(h.persisted().is_none());
    assert_eq!(a.connect_calls(), 1);
}

#[tokio::test]
async fn test_auto_connect_disabled_by_default() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set(KEY, "\"A\"").unwrap();
    let a = wallet("A");
    let h = Harness::with(&[&a], storage, false);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(a.connect_calls(), 0);
    assert_eq!(h.provider.wallet_name().unwrap(), "A");
}

// ============================================================================
// Timeouts and persistence
// ============================================================================

#[tokio::test]
async fn test_connect_with_timeout_gives_up_but_finishes() {
    let a = Arc::new(
        MockWalletAdapter::new("A")
            .with_account(AccountKeys::with_address("0x1"))
            .with_latency(Duration::from_millis(200)),
    );
    let h = Harness::new(&[&a]);

    let err = h
        .provider
        .connect_with_timeout("A", Duration::from_millis(10))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), WalletErrorKind::Timeout);
    assert_eq!(h.errors(), vec![WalletErrorKind::Timeout]);
    assert!(h.provider.connecting());

    settle(&h.provider, |s| !s.connecting).await;
    assert!(h.provider.connected());
}

#[tokio::test]
async fn test_file_selection_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");
    let a = wallet("A");

    let first = WalletProvider::builder()
        .wallet(a.clone())
        .storage(Arc::new(FileStorage::new(&path)))
        .build();
    first.connect("A").await.unwrap();
    first.unload();
    drop(first);

    let a = wallet("A");
    let second = WalletProvider::builder()
        .wallet(a.clone())
        .storage(Arc::new(FileStorage::new(&path)))
        .auto_connect(true)
        .build();
    assert_eq!(second.wallet_name().unwrap(), "A");

    settle(&second, |s| s.connected).await;
    assert_eq!(a.connect_calls(), 1);
}

#[tokio::test]
async fn test_store_projects_provider_state() {
    let a = wallet("A");
    let h = Harness::new(&[&a]);
    let store = WalletStore::new(h.provider.clone());

    store.connect("A").await.unwrap();

    assert!(store.connected());
    assert_eq!(store.snapshot(), h.provider.state());
    assert_eq!(store.ready_wallets().len(), 1);
}

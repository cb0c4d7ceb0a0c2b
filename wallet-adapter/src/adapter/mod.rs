//! The uniform capability surface every wallet adapter exposes.
//!
//! Each supported wallet gets one concrete type implementing
//! [`WalletAdapter`]. The coordinator only ever talks to wallets through this
//! trait and through the [`EventEmitter`] each adapter owns.
//!
//! # Architecture
//!
//! ```text
//! native wallet API (extension, iframe bridge, ...)
//!   → concrete adapter (AdapterCore bookkeeping + native calls)
//!     → WalletAdapter trait + AdapterEvent stream
//!       → WalletProvider (session coordinator)
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

mod base;
mod events;
mod mock;

pub use base::AdapterCore;
pub use events::{AdapterEvent, EventEmitter, Listener, ListenerId};
pub use mock::MockWalletAdapter;

use crate::error::Result;
use crate::payload::TransactionPayload;

/// Unique identifier of a wallet, e.g. `"Petra"` or `"Martian"`.
///
/// The name joins the adapter set, the persisted selection and the active
/// session, so two adapters must never share one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletName(String);

impl WalletName {
    /// Wrap a wallet name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WalletName {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<String> for WalletName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for WalletName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for WalletName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for WalletName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for WalletName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Whether a wallet can be used in the current environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WalletReadyState {
    /// The wallet is installed and can be connected right away.
    Installed,
    /// The wallet has not been detected (yet). Extensions often inject
    /// themselves after page load, so this may later become `Installed`.
    NotDetected,
    /// The wallet can be loaded on demand (e.g. a web wallet in a popup).
    Loadable,
    /// The wallet cannot work in this environment.
    Unsupported,
}

impl WalletReadyState {
    /// `true` for [`Installed`](Self::Installed) and [`Loadable`](Self::Loadable).
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Installed | Self::Loadable)
    }
}

impl fmt::Display for WalletReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installed => write!(f, "Installed"),
            Self::NotDetected => write!(f, "NotDetected"),
            Self::Loadable => write!(f, "Loadable"),
            Self::Unsupported => write!(f, "Unsupported"),
        }
    }
}

/// Keys of the account a wallet exposes.
///
/// Fields are `None` until the wallet is connected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountKeys {
    /// Hex-encoded public key.
    pub public_key: Option<String>,
    /// Account address.
    pub address: Option<String>,
    /// Authentication key.
    pub auth_key: Option<String>,
}

impl AccountKeys {
    /// Account keys with only an address set.
    #[must_use]
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            ..Self::default()
        }
    }

    /// `true` when no key is known.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.public_key.is_none() && self.address.is_none() && self.auth_key.is_none()
    }
}

/// Networks a wallet may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WalletAdapterNetwork {
    /// Aptos mainnet.
    Mainnet,
    /// Aptos testnet.
    Testnet,
    /// Aptos devnet.
    Devnet,
}

/// The network a wallet is currently pointed at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    /// Well-known network, if the wallet reports one.
    pub name: Option<WalletAdapterNetwork>,
    /// Chain id as reported by the wallet.
    pub chain_id: Option<String>,
    /// Node API URL, if the wallet exposes it.
    pub api: Option<String>,
}

/// Structured message-signing request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignMessagePayload {
    /// Include the account address in the signed message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<bool>,
    /// Include the dapp domain in the signed message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<bool>,
    /// Include the chain id in the signed message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<bool>,
    /// The message to sign.
    pub message: String,
    /// Nonce the dapp uses to prevent replay.
    pub nonce: String,
}

/// Anything a wallet may be asked to sign as a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignMessageInput {
    /// A plain text message.
    Text(String),
    /// A structured request.
    Payload(SignMessagePayload),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl From<&str> for SignMessageInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<SignMessagePayload> for SignMessageInput {
    fn from(payload: SignMessagePayload) -> Self {
        Self::Payload(payload)
    }
}

/// A wallet's answer to a message-signing request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignMessageResponse {
    /// Address included in the signed message, if requested.
    pub address: Option<String>,
    /// Dapp domain included in the signed message, if requested.
    pub application: Option<String>,
    /// Chain id included in the signed message, if requested.
    pub chain_id: Option<u64>,
    /// The exact text that was signed.
    pub full_message: String,
    /// The caller's message.
    pub message: String,
    /// The caller's nonce.
    pub nonce: String,
    /// Prefix the wallet prepended (e.g. `"APTOS"`).
    pub prefix: String,
    /// Hex-encoded signature.
    pub signature: String,
}

/// Result of a sign-and-submit call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// Hash of the submitted transaction.
    pub hash: String,
}

/// A shared, thread-safe [`WalletAdapter`] trait object.
pub type SharedWalletAdapter = Arc<dyn WalletAdapter>;

/// Uniform interface over one wallet's native API.
///
/// Getters report the adapter's current observable state and must not block.
/// Async methods wrap native failures into the matching
/// [`WalletError`](crate::WalletError) kind, emit it as
/// [`AdapterEvent::Error`], and return it.
#[async_trait]
pub trait WalletAdapter: Send + Sync + fmt::Debug {
    /// Unique wallet name.
    fn name(&self) -> &WalletName;

    /// Install or landing page URL. Empty when the wallet has none.
    fn url(&self) -> &str;

    /// Icon URL.
    fn icon(&self) -> &str;

    /// Current readiness.
    fn ready_state(&self) -> WalletReadyState;

    /// Whether the wallet is connected.
    fn connected(&self) -> bool;

    /// Whether a connect call is in flight inside the adapter.
    fn connecting(&self) -> bool {
        false
    }

    /// Keys of the connected account; empty keys when disconnected.
    fn public_account(&self) -> AccountKeys;

    /// The network the wallet is pointed at.
    fn network(&self) -> NetworkInfo;

    /// The adapter's event registry.
    fn events(&self) -> &EventEmitter;

    /// Ask the wallet to connect.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::NotReady`](crate::WalletError::NotReady) when the
    /// wallet cannot be used, or a connection error from the wallet.
    async fn connect(&self) -> Result<()>;

    /// Disconnect from the wallet.
    ///
    /// # Errors
    ///
    /// Returns a disconnection error if the wallet fails to disconnect.
    async fn disconnect(&self) -> Result<()>;

    /// Sign a transaction without submitting it; returns the signed bytes.
    ///
    /// # Errors
    ///
    /// Returns a sign-transaction error if the wallet refuses or fails.
    async fn sign_transaction(
        &self,
        payload: &TransactionPayload,
        options: Option<&Value>,
    ) -> Result<Vec<u8>>;

    /// Sign a transaction and submit it through the wallet's node.
    ///
    /// # Errors
    ///
    /// Returns a sign-and-submit error if the wallet refuses or fails.
    async fn sign_and_submit_transaction(
        &self,
        payload: &TransactionPayload,
        options: Option<&Value>,
    ) -> Result<SubmitResponse>;

    /// Sign an arbitrary message.
    ///
    /// # Errors
    ///
    /// Returns a sign-message error if the wallet refuses or fails.
    async fn sign_message(&self, message: &SignMessageInput) -> Result<SignMessageResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_states_that_allow_connecting() {
        assert!(WalletReadyState::Installed.is_ready());
        assert!(WalletReadyState::Loadable.is_ready());
        assert!(!WalletReadyState::NotDetected.is_ready());
        assert!(!WalletReadyState::Unsupported.is_ready());
    }

    #[test]
    fn wallet_name_serializes_as_plain_string() {
        let name = WalletName::new("Petra");
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"Petra\"");
        assert_eq!(name, "Petra");
    }

    #[test]
    fn account_keys_use_camel_case() {
        let keys = AccountKeys {
            public_key: Some("0xpub".into()),
            address: Some("0x1".into()),
            auth_key: None,
        };
        let json = serde_json::to_value(&keys).unwrap();
        assert_eq!(json["publicKey"], "0xpub");
        assert!(json["authKey"].is_null());
        assert!(!keys.is_empty());
        assert!(AccountKeys::default().is_empty());
    }

    #[test]
    fn sign_message_input_accepts_text_or_payload() {
        let text: SignMessageInput = serde_json::from_str("\"hello\"").unwrap();
        assert_eq!(text, SignMessageInput::Text("hello".into()));

        let payload: SignMessageInput =
            serde_json::from_str(r#"{"message":"hello","nonce":"42","address":true}"#).unwrap();
        match payload {
            SignMessageInput::Payload(p) => {
                assert_eq!(p.nonce, "42");
                assert_eq!(p.address, Some(true));
            }
            other => panic!("unexpected input: {other:?}"),
        }
    }
}

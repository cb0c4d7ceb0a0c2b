//! Wallet adapters and a wallet-session coordinator for Aptos-style wallets.
//!
//! Applications talk to many wallets through one [`WalletAdapter`] trait and
//! let a [`WalletProvider`] own the session: which wallet is selected, whether
//! it is connected, which account and network it reports, and which wallet to
//! reconnect to next time.
//!
//! ```rust,ignore
//! use wallet_adapter::prelude::*;
//!
//! let provider = WalletProvider::builder()
//!     .wallet(Arc::new(MockWalletAdapter::new("Petra")))
//!     .auto_connect(true)
//!     .build();
//!
//! provider.connect("Petra").await?;
//! ```
//!
//! [`WalletAdapter`]: adapter::WalletAdapter

pub mod adapter;
pub mod error;
pub mod payload;
pub mod prelude;
pub mod provider;
pub mod runtime;
pub mod storage;
pub mod store;

pub use error::{Result, WalletError, WalletErrorKind};
pub use provider::{
    SessionState, Wallet, WalletProvider, WalletProviderBuilder, WalletProviderConfig,
};
pub use store::WalletStore;

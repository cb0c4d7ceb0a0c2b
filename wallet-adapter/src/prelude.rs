//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use wallet_adapter::prelude::*;
//! ```

pub use crate::adapter::{
    AccountKeys, AdapterCore, AdapterEvent, EventEmitter, ListenerId, MockWalletAdapter,
    NetworkInfo, SharedWalletAdapter, SignMessageInput, SignMessagePayload, SignMessageResponse,
    SubmitResponse, WalletAdapter, WalletAdapterNetwork, WalletName, WalletReadyState,
};
pub use crate::error::{Result, WalletError, WalletErrorKind};
pub use crate::payload::{
    EntryFunctionPayload, ModuleBundlePayload, ScriptFunctionPayload, ScriptPayload,
    TransactionPayload, payload_v1_to_v0,
};
pub use crate::provider::{
    SessionState, UrlOpener, Wallet, WalletProvider, WalletProviderBuilder, WalletProviderConfig,
};
pub use crate::runtime::with_timeout;
pub use crate::storage::{
    FileStorage, MemoryStorage, PersistedSelection, SelectionStorage, SharedStorage, StorageKind,
};
pub use crate::store::WalletStore;

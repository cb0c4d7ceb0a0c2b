//! Error types for wallet adapters and the session coordinator.
//!
//! [`WalletError`] covers the coordinator's own selection, readiness and
//! connection-state checks, the failures adapters wrap their native errors
//! into, and the persistence and timeout failures around them.

/// Result type alias for wallet operations.
pub type Result<T> = std::result::Result<T, WalletError>;

/// Error type for wallet operations.
///
/// Coordinator-level checks produce [`WalletError::NotSelected`],
/// [`WalletError::NotReady`] and [`WalletError::NotConnected`]. Every other
/// variant is produced by an adapter (or a collaborator such as storage) and
/// passed through the coordinator unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum WalletError {
    /// No wallet has been selected.
    #[error("Wallet not selected")]
    NotSelected,

    /// The selected wallet is neither installed nor loadable.
    #[error("Wallet not ready")]
    NotReady,

    /// The operation requires a connected wallet.
    #[error("Wallet not connected")]
    NotConnected,

    /// The adapter failed to connect.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The adapter failed to disconnect.
    #[error("Disconnection error: {0}")]
    Disconnection(String),

    /// The wallet refused or failed to sign a transaction.
    #[error("Sign transaction error: {0}")]
    SignTransaction(String),

    /// The wallet failed to sign and submit a transaction.
    #[error("Sign and submit error: {0}")]
    SignAndSubmit(String),

    /// The wallet failed to sign a message.
    #[error("Sign message error: {0}")]
    SignMessage(String),

    /// The wallet could not report its network.
    #[error("Get network error: {0}")]
    GetNetwork(String),

    /// Handling an account change reported by the wallet failed.
    #[error("Account change error: {0}")]
    AccountChange(String),

    /// Handling a network change reported by the wallet failed.
    #[error("Network change error: {0}")]
    NetworkChange(String),

    /// An install page could not be opened.
    #[error("Wallet window blocked: {0}")]
    WindowBlocked(String),

    /// A wallet call did not complete before its deadline.
    #[error("Wallet call timed out after {millis} ms")]
    Timeout {
        /// The deadline that elapsed, in milliseconds.
        millis: u64,
    },

    /// The persisted-selection backend failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Field-less discriminant of [`WalletError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum WalletErrorKind {
    /// See [`WalletError::NotSelected`].
    NotSelected,
    /// See [`WalletError::NotReady`].
    NotReady,
    /// See [`WalletError::NotConnected`].
    NotConnected,
    /// See [`WalletError::Connection`].
    Connection,
    /// See [`WalletError::Disconnection`].
    Disconnection,
    /// See [`WalletError::SignTransaction`].
    SignTransaction,
    /// See [`WalletError::SignAndSubmit`].
    SignAndSubmit,
    /// See [`WalletError::SignMessage`].
    SignMessage,
    /// See [`WalletError::GetNetwork`].
    GetNetwork,
    /// See [`WalletError::AccountChange`].
    AccountChange,
    /// See [`WalletError::NetworkChange`].
    NetworkChange,
    /// See [`WalletError::WindowBlocked`].
    WindowBlocked,
    /// See [`WalletError::Timeout`].
    Timeout,
    /// See [`WalletError::Storage`].
    Storage,
}

impl WalletError {
    /// Create a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a disconnection error.
    #[must_use]
    pub fn disconnection(msg: impl Into<String>) -> Self {
        Self::Disconnection(msg.into())
    }

    /// Create a sign-transaction error.
    #[must_use]
    pub fn sign_transaction(msg: impl Into<String>) -> Self {
        Self::SignTransaction(msg.into())
    }

    /// Create a sign-and-submit error.
    #[must_use]
    pub fn sign_and_submit(msg: impl Into<String>) -> Self {
        Self::SignAndSubmit(msg.into())
    }

    /// Create a sign-message error.
    #[must_use]
    pub fn sign_message(msg: impl Into<String>) -> Self {
        Self::SignMessage(msg.into())
    }

    /// Create a get-network error.
    #[must_use]
    pub fn get_network(msg: impl Into<String>) -> Self {
        Self::GetNetwork(msg.into())
    }

    /// Create an account-change error.
    #[must_use]
    pub fn account_change(msg: impl Into<String>) -> Self {
        Self::AccountChange(msg.into())
    }

    /// Create a network-change error.
    #[must_use]
    pub fn network_change(msg: impl Into<String>) -> Self {
        Self::NetworkChange(msg.into())
    }

    /// Create a storage error.
    #[must_use]
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a timeout error from an elapsed deadline.
    #[must_use]
    pub fn timeout(after: std::time::Duration) -> Self {
        Self::Timeout {
            millis: u64::try_from(after.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// The field-less kind of this error.
    #[must_use]
    pub const fn kind(&self) -> WalletErrorKind {
        match self {
            Self::NotSelected => WalletErrorKind::NotSelected,
            Self::NotReady => WalletErrorKind::NotReady,
            Self::NotConnected => WalletErrorKind::NotConnected,
            Self::Connection(_) => WalletErrorKind::Connection,
            Self::Disconnection(_) => WalletErrorKind::Disconnection,
            Self::SignTransaction(_) => WalletErrorKind::SignTransaction,
            Self::SignAndSubmit(_) => WalletErrorKind::SignAndSubmit,
            Self::SignMessage(_) => WalletErrorKind::SignMessage,
            Self::GetNetwork(_) => WalletErrorKind::GetNetwork,
            Self::AccountChange(_) => WalletErrorKind::AccountChange,
            Self::NetworkChange(_) => WalletErrorKind::NetworkChange,
            Self::WindowBlocked(_) => WalletErrorKind::WindowBlocked,
            Self::Timeout { .. } => WalletErrorKind::Timeout,
            Self::Storage(_) => WalletErrorKind::Storage,
        }
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(e: serde_json::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<std::io::Error> for WalletError {
    fn from(e: std::io::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

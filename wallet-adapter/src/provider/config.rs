//! Coordinator configuration.

use serde::{Deserialize, Serialize};

use crate::storage::StorageKind;

/// Storage key used when none is configured.
pub const DEFAULT_PERSISTENCE_KEY: &str = "walletName";

/// Serializable coordinator settings.
///
/// The adapter list, error hook and opener are code, not data, and are set on
/// the [`WalletProviderBuilder`](super::WalletProviderBuilder) instead.
///
/// # Example
///
/// ```toml
/// persistence_key = "walletName"
/// auto_connect = true
/// storage = "session"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WalletProviderConfig {
    /// Key the selected wallet name is persisted under.
    pub persistence_key: String,
    /// Reconnect to the persisted wallet as soon as it is ready.
    pub auto_connect: bool,
    /// Durable or session-only persistence.
    pub storage: StorageKind,
}

impl Default for WalletProviderConfig {
    fn default() -> Self {
        Self {
            persistence_key: DEFAULT_PERSISTENCE_KEY.to_owned(),
            auto_connect: false,
            storage: StorageKind::Durable,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = WalletProviderConfig::default();
        assert_eq!(config.persistence_key, "walletName");
        assert!(!config.auto_connect);
        assert_eq!(config.storage, StorageKind::Durable);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: WalletProviderConfig =
            serde_json::from_str(r#"{"auto_connect": true}"#).unwrap();
        assert!(config.auto_connect);
        assert_eq!(config.persistence_key, DEFAULT_PERSISTENCE_KEY);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_str::<WalletProviderConfig>(r#"{"autoconnect": true}"#);
        assert!(result.is_err());
    }
}

//! Configuration schema definitions.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wallet_adapter::adapter::{
    AccountKeys, MockWalletAdapter, NetworkInfo, WalletAdapterNetwork, WalletReadyState,
};
use wallet_adapter::{WalletError, WalletProviderConfig};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DemoConfig {
    /// Coordinator settings.
    #[serde(default)]
    pub provider: WalletProviderConfig,

    /// Scripted wallets offered to the session.
    #[serde(default = "default_wallets")]
    pub wallets: Vec<WalletSpec>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            provider: WalletProviderConfig::default(),
            wallets: default_wallets(),
        }
    }
}

/// One scripted wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WalletSpec {
    /// Unique wallet name.
    pub name: String,

    /// Readiness at startup.
    #[serde(default = "default_ready_state")]
    pub ready_state: WalletReadyState,

    /// Readiness reached after `detect_after_ms`, like a late-injected extension.
    #[serde(default)]
    pub becomes: Option<WalletReadyState>,

    /// Delay before `becomes` applies.
    #[serde(default)]
    pub detect_after_ms: u64,

    /// Account address handed out on connect.
    #[serde(default)]
    pub address: Option<String>,

    /// Account public key handed out on connect.
    #[serde(default)]
    pub public_key: Option<String>,

    /// Network reported after connect.
    #[serde(default)]
    pub network: Option<WalletAdapterNetwork>,

    /// Latency of every wallet call.
    #[serde(default)]
    pub latency_ms: u64,

    /// Make connect fail with this message.
    #[serde(default)]
    pub fail_connect: Option<String>,
}

impl WalletSpec {
    /// An installed wallet called `name` holding `address`.
    #[must_use]
    pub fn installed(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ready_state: WalletReadyState::Installed,
            becomes: None,
            detect_after_ms: 0,
            address: Some(address.into()),
            public_key: None,
            network: Some(WalletAdapterNetwork::Mainnet),
            latency_ms: 0,
            fail_connect: None,
        }
    }

    /// Build the scripted adapter this entry describes.
    #[must_use]
    pub fn build(&self) -> Arc<MockWalletAdapter> {
        let account = AccountKeys {
            public_key: self.public_key.clone(),
            address: self.address.clone(),
            auth_key: None,
        };
        let network = NetworkInfo {
            name: self.network,
            ..NetworkInfo::default()
        };
        let mut wallet = MockWalletAdapter::new(self.name.as_str())
            .with_ready_state(self.ready_state)
            .with_account(account)
            .with_network(network);
        if self.latency_ms > 0 {
            wallet = wallet.with_latency(Duration::from_millis(self.latency_ms));
        }
        if let Some(message) = &self.fail_connect {
            wallet.fail_connect(Some(WalletError::connection(message.as_str())));
        }
        Arc::new(wallet)
    }
}

fn default_wallets() -> Vec<WalletSpec> {
    vec![
        WalletSpec::installed("Petra", "0x1"),
        WalletSpec {
            ready_state: WalletReadyState::NotDetected,
            becomes: Some(WalletReadyState::Installed),
            detect_after_ms: 200,
            ..WalletSpec::installed("Martian", "0x2")
        },
        WalletSpec {
            ready_state: WalletReadyState::Unsupported,
            ..WalletSpec::installed("Pontem", "0x3")
        },
    ]
}

const fn default_ready_state() -> WalletReadyState {
    WalletReadyState::Installed
}

impl DemoConfig {
    /// Check the configuration for problems.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.provider.persistence_key.trim().is_empty() {
            issues.push(ConfigIssue::error(
                "provider.persistence_key",
                "must not be empty",
            ));
        }

        if self.wallets.is_empty() {
            issues.push(ConfigIssue::warning("wallets", "no wallets configured"));
        }

        for (i, wallet) in self.wallets.iter().enumerate() {
            if self.wallets[..i].iter().any(|w| w.name == wallet.name) {
                issues.push(ConfigIssue::error(
                    format!("wallets[{i}].name"),
                    format!("duplicate wallet name {:?}", wallet.name),
                ));
            }
            if wallet.becomes.is_none() && wallet.detect_after_ms > 0 {
                issues.push(ConfigIssue::warning(
                    format!("wallets[{i}].detect_after_ms"),
                    "has no effect without `becomes`",
                ));
            }
        }

        issues
    }

    /// Returns `true` when [`validate`](Self::validate) reports no errors.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate()
            .iter()
            .all(|issue| issue.level != IssueLevel::Error)
    }
}

/// A configuration problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Severity.
    pub level: IssueLevel,
    /// Dotted path of the offending field.
    pub path: String,
    /// What is wrong.
    pub message: String,
}

impl ConfigIssue {
    /// Create an error-level issue.
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a warning-level issue.
    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.level {
            IssueLevel::Error => "error",
            IssueLevel::Warning => "warning",
        };
        write!(f, "[{tag}] {}: {}", self.path, self.message)
    }
}

/// Severity level for configuration issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueLevel {
    /// The session cannot run with this value.
    Error,
    /// Probably not what was intended.
    Warning,
}

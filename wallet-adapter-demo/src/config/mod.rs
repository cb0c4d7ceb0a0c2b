//! Configuration management for the wallet demo.
//!
//! Settings come from defaults, overridden by a TOML file
//! (`~/.wallet-adapter/demo.toml` unless `--config` says otherwise).

mod schema;

pub use schema::{ConfigIssue, DemoConfig, IssueLevel, WalletSpec};

use std::path::{Path, PathBuf};

use tracing::{debug, info};

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// TOML serialization error.
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Directory holding the demo config and the durable wallet selection.
#[must_use]
pub fn default_config_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".wallet-adapter")
}

/// Default config file path.
#[must_use]
pub fn config_path() -> PathBuf {
    default_config_dir().join("demo.toml")
}

/// Load configuration from `path`, or defaults when the file is missing.
pub async fn load_config_from(path: &Path) -> ConfigResult<DemoConfig> {
    if !path.exists() {
        info!(path = %path.display(), "config file not found, using defaults");
        return Ok(DemoConfig::default());
    }

    let content = tokio::fs::read_to_string(path).await?;
    let config: DemoConfig = toml::from_str(&content)?;
    debug!(path = %path.display(), wallets = config.wallets.len(), "loaded config file");

    Ok(config)
}

/// Write `config` to `path`, creating parent directories.
pub async fn save_config_to(config: &DemoConfig, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let content = toml::to_string_pretty(config)?;
    tokio::fs::write(path, content).await?;
    info!(path = %path.display(), "saved config file");

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        assert!(default_config_dir().ends_with(".wallet-adapter"));
        assert!(config_path().ends_with("demo.toml"));
    }

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let dir = std::env::temp_dir().join("wallet-adapter-demo-missing");
        let config = load_config_from(&dir.join("nope.toml")).await.unwrap();
        assert_eq!(config.wallets.len(), DemoConfig::default().wallets.len());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = std::env::temp_dir().join(format!("wallet-adapter-demo-{}", std::process::id()));
        let path = dir.join("demo.toml");
        let mut config = DemoConfig::default();
        config.provider.auto_connect = true;

        save_config_to(&config, &path).await.unwrap();
        let loaded = load_config_from(&path).await.unwrap();
        assert!(loaded.provider.auto_connect);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}

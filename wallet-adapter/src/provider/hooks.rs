//! Seams the coordinator calls out through: the error hook and the opener
//! used to send users to a wallet's install page.

use std::fmt;
use std::sync::Arc;

use crate::error::{Result, WalletError};

/// Callback receiving every error the coordinator reports.
pub type ErrorHandler = Arc<dyn Fn(&WalletError) + Send + Sync>;

/// Opens a wallet's install page when the user picks a wallet that is not
/// ready.
pub trait UrlOpener: Send + Sync + fmt::Debug {
    /// Open `url` in a new browsing context.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::WindowBlocked`] when the page could not be opened.
    fn open(&self, url: &str) -> Result<()>;
}

/// Opener that only logs the URL. Default outside the browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOpener;

impl UrlOpener for LogOpener {
    fn open(&self, url: &str) -> Result<()> {
        tracing::info!(url, "wallet not ready, install page");
        Ok(())
    }
}

/// Opener calling `window.open(url, "_blank")`. Default in the browser.
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowOpener;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
impl UrlOpener for WindowOpener {
    fn open(&self, url: &str) -> Result<()> {
        let window = web_sys::window().ok_or_else(|| WalletError::WindowBlocked(url.to_owned()))?;
        window
            .open_with_url_and_target(url, "_blank")
            .map_err(|e| WalletError::WindowBlocked(format!("{url}: {e:?}")))?
            .map(drop)
            .ok_or_else(|| WalletError::WindowBlocked(url.to_owned()))
    }
}

/// The opener used when none is configured.
#[must_use]
pub fn default_opener() -> Arc<dyn UrlOpener> {
    #[cfg(all(feature = "wasm", target_arch = "wasm32"))]
    {
        Arc::new(WindowOpener)
    }
    #[cfg(not(all(feature = "wasm", target_arch = "wasm32")))]
    {
        Arc::new(LogOpener)
    }
}

/// Report `error` the way the coordinator does when no hook is configured.
pub(crate) fn log_error(error: &WalletError) {
    tracing::error!(%error, kind = ?error.kind(), "wallet error");
}

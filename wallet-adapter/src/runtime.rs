//! Runtime glue shared by native and browser targets.
//!
//! Background work (auto-connect attempts, swap teardown, timeout-bounded
//! connects) is spawned onto the ambient Tokio runtime natively and onto the
//! browser microtask queue under the `wasm` feature.

use std::future::Future;
use std::time::Duration;

use futures::future::{self, Either};

use crate::error::{Result, WalletError};

/// Spawn a detached task on the current Tokio runtime.
///
/// Outside a runtime the task is dropped with a warning; the coordinator
/// stays usable, only background reactions (auto-connect, teardown) are lost.
#[cfg(not(all(feature = "wasm", target_arch = "wasm32")))]
pub(crate) fn spawn<F>(task: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(task);
        }
        Err(_) => tracing::warn!("no async runtime available, dropping background wallet task"),
    }
}

/// Spawn a detached task on the browser event loop.
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub(crate) fn spawn<F>(task: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(task);
}

/// Race `operation` against a timer.
///
/// Timer-first yields [`WalletError::Timeout`] and drops `operation`. To keep
/// an operation running past its deadline, spawn it and race the handle
/// instead, as [`WalletProvider::connect_with_timeout`](crate::WalletProvider::connect_with_timeout) does.
///
/// # Errors
///
/// Returns the operation's own error, or [`WalletError::Timeout`] when the
/// deadline elapses first.
pub async fn with_timeout<F, T>(after: Duration, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let operation = std::pin::pin!(operation);
    let timer = futures_timer::Delay::new(after);
    match future::select(operation, timer).await {
        Either::Left((result, _)) => result,
        Either::Right(((), _)) => {
            tracing::debug!(millis = after.as_millis(), "wallet call timed out");
            Err(WalletError::timeout(after))
        }
    }
}

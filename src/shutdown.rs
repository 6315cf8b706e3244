//! # Shutdown handling
//!
//! Waiting on the drone is cooperative: every wait in this crate races its timer against a
//! [CancellationToken] and gives up with [Error::Interrupted] as soon as the token is cancelled.
//!
//! ``` no_run
//! # async fn example() {
//! let shutdown = formation_flight::shutdown::on_ctrl_c();
//! // Hand `shutdown` to the navigator or the mission ...
//! # }
//! ```

use std::time::Duration;

use log::{error, warn};
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Token cancelled when the process receives Ctrl-C
///
/// Must be called from within a tokio runtime. If the signal handler cannot be installed, the error is logged and the
/// returned token is simply never cancelled by a signal.
pub fn on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let signaled = token.clone();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Shutdown requested");
                signaled.cancel();
            }
            Err(e) => error!("Cannot listen for Ctrl-C: {}", e),
        }
    });

    token
}

/// Sleep for `duration` unless shutdown is requested first
///
/// Returns [Error::Interrupted] without waiting if the token is already cancelled.
pub async fn sleep_or_shutdown(duration: Duration, shutdown: &CancellationToken) -> Result<()> {
    tokio::select! {
        biased;
        _ = shutdown.cancelled() => Err(Error::Interrupted),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

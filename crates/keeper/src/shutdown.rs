// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps process signals onto the runner's cancellation token.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Installs handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal
/// arrives. The SIGTERM handler is registered before this returns, so a
/// signal sent right after the pid file is written is not lost.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    #[cfg(unix)]
    let sigterm = {
        use tokio::signal::unix::{SignalKind, signal};
        signal(SignalKind::terminate())
            .inspect_err(|e| warn!(error = %e, "failed to install SIGTERM handler"))
            .ok()
    };

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            match sigterm {
                Some(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), stopping scheduler"),
                        _ = sigterm.recv() => info!("received SIGTERM, stopping scheduler"),
                    }
                }
                None => {
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), stopping scheduler");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, stopping scheduler");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

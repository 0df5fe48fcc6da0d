//! Process termination wiring.
//!
//! [`listen`] installs a background task that waits for SIGINT or
//! SIGTERM and cancels the returned token. The workflow checks the token
//! between steps and winds down its connection cooperatively instead of
//! being killed mid-frame.

use tokio_util::sync::CancellationToken;

/// Spawn the signal listener and return the token it cancels.
///
/// Must be called from within a tokio runtime.
pub fn listen() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        let signal = wait_for_signal().await;
        tracing::info!(%signal, "termination signal received, shutting down");
        trigger.cancel();
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => "SIGINT",
                _ = term.recv() => "SIGTERM",
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "SIGTERM handler unavailable, listening for ctrl-c only");
            let _ = tokio::signal::ctrl_c().await;
            "SIGINT"
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "SIGINT"
}

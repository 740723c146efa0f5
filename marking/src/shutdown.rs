use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;

/// Installs a handler for SIGTERM and SIGINT.
///
/// The returned token is cancelled when either signal arrives. If a handler
/// cannot be installed the node still stops on the other signal.
pub fn install_shutdown_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                None
            }
        };
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGINT handler");
                None
            }
        };

        tokio::select! {
            Some(_) = recv(sigterm.as_mut()) => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown");
            }
            Some(_) = recv(sigint.as_mut()) => {
                tracing::info!("Received SIGINT, initiating graceful shutdown");
            }
            else => {
                tracing::warn!("No shutdown signal handler installed");
                return;
            }
        }

        token_clone.cancel();
    });

    token
}

async fn recv(sig: Option<&mut tokio::signal::unix::Signal>) -> Option<()> {
    match sig {
        Some(s) => s.recv().await,
        None => None,
    }
}

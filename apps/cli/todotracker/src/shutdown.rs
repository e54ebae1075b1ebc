use crate::error::TodotrackerError;

use log::info;
#[cfg(not(unix))]
use log::warn;
#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

/// Ctrl-C or, on unix, SIGTERM.
///
/// Handlers are installed by [`ShutdownSignal::install`], not on first poll, so
/// a signal arriving between registration and serving is held until
/// [`ShutdownSignal::recv`] is awaited.
#[derive(Debug)]
pub struct ShutdownSignal {
    #[cfg(unix)]
    interrupt: Signal,
    #[cfg(unix)]
    terminate: Signal,
}

impl ShutdownSignal {
    /// Must be called from within the tokio runtime.
    #[cfg(unix)]
    #[track_caller]
    pub fn install() -> Result<Self, TodotrackerError> {
        let interrupt = signal(SignalKind::interrupt())
            .map_err(|e| TodotrackerError::io("Failed to listen for SIGINT", e))?;
        let terminate = signal(SignalKind::terminate())
            .map_err(|e| TodotrackerError::io("Failed to listen for SIGTERM", e))?;
        Ok(Self {
            interrupt,
            terminate,
        })
    }

    #[cfg(not(unix))]
    pub fn install() -> Result<Self, TodotrackerError> {
        Ok(Self {})
    }

    /// Resolves once a shutdown signal has been received.
    #[cfg(unix)]
    pub async fn recv(mut self) {
        tokio::select! {
            _ = self.interrupt.recv() => info!("Received SIGINT, shutting down"),
            _ = self.terminate.recv() => info!("Received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    pub async fn recv(self) {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl-C, shutting down"),
            Err(e) => {
                warn!("Failed to listen for Ctrl-C: {e}");
                std::future::pending::<()>().await;
            }
        }
    }
}

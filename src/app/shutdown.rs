//! Graceful shutdown handling.

use log::{info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancels `cancel` when the process receives Ctrl-C.
///
/// Running cases stop at their next polling boundary and are reported as
/// cancelled. The returned task ends on its own once `cancel` fires for any
/// other reason.
pub fn cancel_on_ctrl_c(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            signal = tokio::signal::ctrl_c() => {
                match signal {
                    Ok(()) => {
                        info!("Received Ctrl-C, cancelling remaining cases");
                        cancel.cancel();
                    }
                    Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
                }
            }
        }
    })
}

/// Stops the signal listener once the run is over.
pub async fn shutdown_gracefully(cancel: CancellationToken, signal_task: JoinHandle<()>) {
    cancel.cancel();
    let _ = signal_task.await;
}

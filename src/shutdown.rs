//! Termination signal handling
//!
//! Signal handlers are registered once per process by [`Shutdown::listen`];
//! a delivered signal latches a flag that every later check observes, so a
//! signal arriving between batch runs is never lost.

use crate::error::{Error, Result};
use crate::pipeline::Pipeline;
use crate::types::{GenerationRequest, RunResult, Stage};
use tokio::sync::watch;

/// Latched shutdown request
#[derive(Clone, Debug)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Register SIGTERM/SIGINT (Ctrl+C elsewhere) and latch the first one received
    ///
    /// Must be called from within a tokio runtime.
    pub fn listen() -> Self {
        let (tx, shutdown) = Self::channel();
        let signals = register();
        tokio::spawn(async move {
            wait_for_signal(signals).await;
            tx.send_replace(true);
        });
        shutdown
    }

    /// A shutdown flag driven by the returned sender instead of OS signals
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    /// Whether shutdown has been requested
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been requested, immediately if it already was
    ///
    /// Never resolves if every sender is gone without a request.
    pub async fn requested(&mut self) {
        if self.rx.wait_for(|requested| *requested).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Execute one run, abandoning it if shutdown is requested first
///
/// # Errors
///
/// Returns [`Error::Interrupted`] carrying the stage that was executing when
/// the request arrived, or [`Stage::Idle`] if it was already pending.
/// Nothing further is written after an interruption.
pub async fn run_until_signal(
    pipeline: &Pipeline,
    request: &GenerationRequest,
    shutdown: &mut Shutdown,
) -> Result<RunResult> {
    if shutdown.is_requested() {
        tracing::warn!(run_id = %request.run_id, "shutdown requested, run not started");
        return Err(Error::Interrupted { stage: Stage::Idle });
    }

    tokio::select! {
        biased;
        () = shutdown.requested() => {
            let stage = pipeline.current_stage();
            tracing::warn!(
                run_id = %request.run_id,
                stage = %stage,
                "run interrupted by signal"
            );
            Err(Error::Interrupted { stage })
        }
        result = pipeline.run(request) => Ok(result),
    }
}

#[cfg(unix)]
type Signals = (
    std::io::Result<tokio::signal::unix::Signal>,
    std::io::Result<tokio::signal::unix::Signal>,
);

#[cfg(unix)]
fn register() -> Signals {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    (signal(SignalKind::terminate()), signal(SignalKind::interrupt()))
}

#[cfg(unix)]
async fn wait_for_signal(signals: Signals) {
    match signals {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received Ctrl+C signal");
            } else {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(not(unix))]
type Signals = ();

#[cfg(not(unix))]
fn register() -> Signals {}

#[cfg(not(unix))]
async fn wait_for_signal((): Signals) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    }
}

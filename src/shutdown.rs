//! Graceful shutdown signalling
//!
//! A [`ShutdownTrigger`] and any number of [`ShutdownSignal`] clones share one
//! `watch` channel. Orchestrators poll the signal at batch and per-page
//! boundaries; work already dispatched always completes and is persisted.

use std::sync::Arc;
use tokio::sync::watch;

/// Creates a connected trigger/signal pair
pub fn channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (
        ShutdownTrigger { tx: Arc::new(tx) },
        ShutdownSignal { rx },
    )
}

/// Requests shutdown
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        // send_replace never fails, even with no receivers left
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Observes whether shutdown was requested
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// A signal that is never triggered
    pub fn never() -> Self {
        let (_, signal) = channel();
        signal
    }

    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown is requested
    pub async fn requested(&mut self) {
        // An error means every trigger is gone and shutdown can no longer happen
        if self.rx.wait_for(|requested| *requested).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Triggers shutdown on the first Ctrl+C
pub fn listen_for_ctrl_c(trigger: ShutdownTrigger) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received Ctrl+C, finishing in-flight work before exiting");
            trigger.trigger();
        }
    });
}

//! Cooperative cancellation.
//!
//! Ctrl-C never kills the REPL. It trips a [`CancelToken`] that the router
//! and executor check at fixed points: the top of every loop iteration,
//! before each step of a multi-command run, and after a translation returns.
//! An in-flight child process receives the terminal's SIGINT on its own.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clears the flag and reports whether it was set.
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::SeqCst)
    }
}

/// Spawns a task that trips `token` on every Ctrl-C.
///
/// Must be called from within a tokio runtime.
pub fn listen_for_interrupts(token: CancelToken) {
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Could not listen for Ctrl-C: {}", e);
                break;
            }
            debug!("Interrupt received");
            token.cancel();
            println!();
        }
    });
}

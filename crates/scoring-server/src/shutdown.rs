//! Graceful shutdown.
//!
//! The accept loop and every open connection watch one [`ShutdownSignal`].
//! Once it fires, the listener closes and [`ConnectionTracker`] tells the
//! server when the last in-flight exchange is done.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

/// One-shot, cloneable shutdown flag.
///
/// # Example
///
/// ```rust
/// use scoring_server::ShutdownSignal;
///
/// let shutdown = ShutdownSignal::new();
/// let other = shutdown.clone();
///
/// shutdown.trigger();
/// assert!(other.is_shutdown());
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    state: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Creates a signal that has not fired.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    /// Fires the signal. Later calls do nothing.
    pub fn trigger(&self) {
        self.state.send_if_modified(|fired| !std::mem::replace(fired, true));
    }

    /// Returns `true` once the signal has fired.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.state.borrow()
    }

    /// Waits for the signal. Returns at once if it already fired.
    pub async fn recv(&self) {
        let mut rx = self.state.subscribe();
        // the sender lives in `self`, so this cannot fail
        let _ = rx.wait_for(|fired| *fired).await;
    }

    /// Creates a signal fired by SIGTERM or SIGINT.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let trigger = signal.clone();

        tokio::spawn(async move {
            wait_for_os_signal().await;
            trigger.trigger();
        });

        signal
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn wait_for_os_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "cannot install signal handlers, falling back to Ctrl+C");
                wait_for_ctrl_c().await;
                return;
            }
        };

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }
}

#[cfg(not(unix))]
async fn wait_for_os_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl+C, shutting down"),
        Err(e) => {
            warn!(error = %e, "cannot listen for Ctrl+C; only manual shutdown will work");
            std::future::pending::<()>().await;
        }
    }
}

/// Counts open connections.
///
/// # Example
///
/// ```rust
/// use scoring_server::shutdown::ConnectionTracker;
///
/// let tracker = ConnectionTracker::new();
/// let token = tracker.acquire();
/// assert_eq!(tracker.active_connections(), 1);
///
/// drop(token);
/// assert_eq!(tracker.active_connections(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    open: Arc<watch::Sender<usize>>,
}

impl ConnectionTracker {
    /// Creates a tracker with no open connections.
    #[must_use]
    pub fn new() -> Self {
        let (open, _) = watch::channel(0);
        Self {
            open: Arc::new(open),
        }
    }

    /// Registers a connection. It counts as open until the token drops.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.open.send_modify(|n| *n += 1);
        ConnectionToken {
            open: Arc::clone(&self.open),
        }
    }

    /// Returns the number of open connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        *self.open.borrow()
    }

    /// Waits until no connection is open.
    pub async fn wait_idle(&self) {
        let mut rx = self.open.subscribe();
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// An open connection, released on drop.
#[derive(Debug)]
pub struct ConnectionToken {
    open: Arc<watch::Sender<usize>>,
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        self.open.send_modify(|n| *n = n.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn trigger_twice() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_shutdown());
        signal.trigger();
        signal.trigger();
        assert!(signal.is_shutdown());
    }

    #[tokio::test]
    async fn recv_wakes_on_trigger() {
        let signal = ShutdownSignal::new();
        let trigger = signal.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.trigger();
        });

        tokio::time::timeout(Duration::from_secs(1), signal.recv())
            .await
            .expect("recv should complete");
    }

    #[tokio::test]
    async fn recv_after_trigger() {
        let signal = ShutdownSignal::new();
        signal.trigger();

        tokio::time::timeout(Duration::from_millis(10), signal.recv())
            .await
            .expect("recv should complete immediately");
    }

    #[test]
    fn tracker_counts_tokens() {
        let tracker = ConnectionTracker::new();
        let first = tracker.acquire();
        let second = tracker.acquire();
        assert_eq!(tracker.active_connections(), 2);

        drop(first);
        assert_eq!(tracker.active_connections(), 1);
        drop(second);
        assert_eq!(tracker.active_connections(), 0);
    }

    #[tokio::test]
    async fn wait_idle_follows_last_token() {
        let tracker = ConnectionTracker::new();
        tokio::time::timeout(Duration::from_millis(10), tracker.wait_idle())
            .await
            .expect("idle tracker returns at once");

        let token = tracker.acquire();
        let waiter = tracker.clone();
        let handle = tokio::spawn(async move { waiter.wait_idle().await });

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            drop(token);
        });

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("wait should complete")
            .expect("task should not panic");
    }
}

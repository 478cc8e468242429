//! One-shot readiness signal for store initialization.

use std::fmt;

use tokio::sync::watch;

/// Lifecycle of a store's initialization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Readiness {
    /// Initialization (or a reload) is in progress.
    Uninitialized,
    /// The in-memory view matches the log; operations are allowed.
    Ready,
    /// Initialization failed; the reason is kept for every later caller.
    Failed(String),
}

impl Readiness {
    /// Returns `true` once initialization has finished, successfully or not.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Uninitialized)
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => f.write_str("initializing"),
            Self::Ready => f.write_str("ready"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Broadcast readiness state that any number of tasks can wait on.
///
/// Backed by a `watch` channel: waiters see the latest state, never a queue
/// of past transitions.
#[derive(Debug)]
pub struct ReadinessGate {
    tx: watch::Sender<Readiness>,
}

impl ReadinessGate {
    /// A gate in the `Uninitialized` state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Readiness::Uninitialized);
        Self { tx }
    }

    /// Current state, without waiting.
    pub fn current(&self) -> Readiness {
        self.tx.borrow().clone()
    }

    /// Publish a new state to every waiter.
    pub(crate) fn set(&self, state: Readiness) {
        self.tx.send_replace(state);
    }

    /// Receiver that observes every future state change.
    pub fn subscribe(&self) -> watch::Receiver<Readiness> {
        self.tx.subscribe()
    }

    /// Wait until the state is `Ready` or `Failed` and return it.
    ///
    /// Returns immediately if already resolved. No timeout is applied.
    pub async fn wait(&self) -> Readiness {
        let mut rx = self.subscribe();
        let resolved = match rx.wait_for(Readiness::is_resolved).await {
            Ok(state) => Some(state.clone()),
            Err(_) => None,
        };
        // The sender lives as long as `self`, so the channel cannot close here.
        resolved.unwrap_or_else(|| self.current())
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

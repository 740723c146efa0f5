//! Host readiness signal.
//!
//! The poller and the workers must not touch the store before the host has
//! finished starting up. They wait on a `watch` channel instead of polling.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Starting,
    Running,
    Stopping,
}

/// Sending half of the readiness signal, owned by the host.
#[derive(Clone)]
pub struct NodeStatus {
    tx: Arc<watch::Sender<NodeState>>,
}

impl NodeStatus {
    pub fn new() -> Self {
        Self {
            tx: Arc::new(watch::Sender::new(NodeState::Starting)),
        }
    }

    pub fn set(&self, state: NodeState) {
        self.tx.send_replace(state);
    }

    pub fn current(&self) -> NodeState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<NodeState> {
        self.tx.subscribe()
    }
}

impl Default for NodeStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits until the host leaves `Starting`.
///
/// Returns `true` once it is `Running`; `false` if it went straight to
/// `Stopping`, the sender was dropped, or `cancel` fired first.
pub async fn wait_until_running(
    rx: &mut watch::Receiver<NodeState>,
    cancel: &CancellationToken,
) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        state = rx.wait_for(|s| *s != NodeState::Starting) => {
            state.map(|s| *s == NodeState::Running).unwrap_or(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn waiters_are_released_when_running() {
        let status = NodeStatus::new();
        let mut rx = status.subscribe();
        let cancel = CancellationToken::new();

        let waiter = tokio::spawn(async move { wait_until_running(&mut rx, &cancel).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished(), "must block while starting");

        status.set(NodeState::Running);
        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn cancellation_releases_waiters() {
        let status = NodeStatus::new();
        let mut rx = status.subscribe();
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(!wait_until_running(&mut rx, &cancel).await);
        assert_eq!(status.current(), NodeState::Starting);
    }

    #[tokio::test]
    async fn stopping_before_running_is_not_ready() {
        let status = NodeStatus::new();
        let mut rx = status.subscribe();
        status.set(NodeState::Stopping);

        assert!(!wait_until_running(&mut rx, &CancellationToken::new()).await);
    }
}

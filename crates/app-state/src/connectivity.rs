//! Connectivity-gated execution
//!
//! [`ConnectivityGate`] answers the point-in-time "are we online" question
//! and hands out [`OfflineFirst`] runners: an operation with an online and
//! an offline implementation, selected by current reachability. Unlike the
//! permission layer, a failing action here is re-surfaced to the caller —
//! calling code must be able to tell "took the offline path" apart from
//! "the action itself failed".

use app_platform::{AlwaysOnline, ConnectivitySource, NetworkStatus};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Branch point between online and offline code paths
#[derive(Clone)]
pub struct ConnectivityGate {
    source: Arc<dyn ConnectivitySource>,
    last: Arc<RwLock<Option<NetworkStatus>>>,
}

impl ConnectivityGate {
    /// Create a gate over a platform connectivity source
    pub fn new(source: Arc<dyn ConnectivitySource>) -> Self {
        Self {
            source,
            last: Arc::new(RwLock::new(None)),
        }
    }

    /// Gate that always reports a reachable connection
    ///
    /// Used where no platform connectivity signal is wired up.
    pub fn always_online() -> Self {
        Self::new(Arc::new(AlwaysOnline))
    }

    /// Query the current network status
    pub async fn status(&self) -> NetworkStatus {
        self.source.status().await
    }

    /// Query the current network status and remember the snapshot
    pub async fn check_connection(&self) -> NetworkStatus {
        let status = self.source.status().await;
        *self.last.write().await = Some(status);
        status
    }

    /// The most recently checked status, if any check has run
    pub async fn last_known(&self) -> Option<NetworkStatus> {
        *self.last.read().await
    }

    /// Whether the device currently has a connection
    pub async fn is_connected(&self) -> bool {
        self.source.status().await.is_connected
    }

    /// Create an offline-first runner sharing this gate's source
    pub fn offline_first<T>(&self) -> OfflineFirst<T>
    where
        T: Clone + Send + Sync,
    {
        OfflineFirst::new(Arc::clone(&self.source))
    }
}

/// Observable state of the latest offline-first invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineFirstState<T> {
    /// Whether an action is in flight
    pub loading: bool,
    /// Result of the last successful invocation
    pub data: Option<T>,
    /// Message of the last failed invocation
    pub error: Option<String>,
}

impl<T> Default for OfflineFirstState<T> {
    fn default() -> Self {
        Self {
            loading: false,
            data: None,
            error: None,
        }
    }
}

/// Runner for an operation with online and offline implementations
///
/// Holds the state of one invocation at a time; a new run overwrites the
/// previous `data`/`error`.
#[derive(Clone)]
pub struct OfflineFirst<T> {
    source: Arc<dyn ConnectivitySource>,
    state: Arc<RwLock<OfflineFirstState<T>>>,
}

impl<T> OfflineFirst<T>
where
    T: Clone + Send + Sync,
{
    /// Create a runner over a connectivity source
    pub fn new(source: Arc<dyn ConnectivitySource>) -> Self {
        Self {
            source,
            state: Arc::new(RwLock::new(OfflineFirstState::default())),
        }
    }

    /// Execute the online action if connected, the offline one otherwise
    ///
    /// Failures are stored in the observable state and propagated to the
    /// caller unchanged.
    pub async fn run<FOn, FOff>(&self, online: FOn, offline: FOff) -> anyhow::Result<T>
    where
        FOn: Future<Output = anyhow::Result<T>>,
        FOff: Future<Output = anyhow::Result<T>>,
    {
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.data = None;
            state.error = None;
        }

        let connected = self.source.status().await.is_connected;
        debug!(connected, "running offline-first action");
        let outcome = if connected {
            online.await
        } else {
            offline.await
        };

        let mut state = self.state.write().await;
        state.loading = false;
        match outcome {
            Ok(value) => {
                state.data = Some(value.clone());
                Ok(value)
            }
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Clone out the current invocation state for the UI
    pub async fn state(&self) -> OfflineFirstState<T> {
        self.state.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use app_platform::sim::SimConnectivity;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn gate_with(status: NetworkStatus) -> (Arc<SimConnectivity>, ConnectivityGate) {
        let sim = Arc::new(SimConnectivity::new(status));
        let gate = ConnectivityGate::new(Arc::clone(&sim) as Arc<dyn ConnectivitySource>);
        (sim, gate)
    }

    #[tokio::test]
    async fn test_always_online_gate() {
        let gate = ConnectivityGate::always_online();
        let status = gate.check_connection().await;
        assert!(status.is_connected);
        assert_eq!(gate.last_known().await, Some(status));
    }

    #[tokio::test]
    async fn test_online_runs_only_online_action() {
        let (_sim, gate) = gate_with(NetworkStatus::online());
        let online_calls = AtomicU32::new(0);
        let offline_calls = AtomicU32::new(0);

        let runner = gate.offline_first::<&str>();
        let result = runner
            .run(
                async {
                    online_calls.fetch_add(1, Ordering::SeqCst);
                    Ok("from network")
                },
                async {
                    offline_calls.fetch_add(1, Ordering::SeqCst);
                    Ok("from cache")
                },
            )
            .await
            .unwrap();

        assert_eq!(result, "from network");
        assert_eq!(online_calls.load(Ordering::SeqCst), 1);
        assert_eq!(offline_calls.load(Ordering::SeqCst), 0);

        let state = runner.state().await;
        assert!(!state.loading);
        assert_eq!(state.data, Some("from network"));
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn test_offline_runs_only_offline_action() {
        let (_sim, gate) = gate_with(NetworkStatus::offline());
        let online_calls = AtomicU32::new(0);

        let runner = gate.offline_first::<&str>();
        let result = runner
            .run(
                async {
                    online_calls.fetch_add(1, Ordering::SeqCst);
                    Ok("from network")
                },
                async { Ok("from cache") },
            )
            .await
            .unwrap();

        assert_eq!(result, "from cache");
        assert_eq!(online_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_is_stored_and_propagated() {
        let (_sim, gate) = gate_with(NetworkStatus::online());

        let runner = gate.offline_first::<&str>();
        let result = runner
            .run(
                async { Err(anyhow!("trip fetch failed")) },
                async { Ok("unused") },
            )
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "trip fetch failed");

        let state = runner.state().await;
        assert!(!state.loading);
        assert_eq!(state.data, None);
        assert_eq!(state.error, Some("trip fetch failed".to_string()));
    }

    #[tokio::test]
    async fn test_new_run_overwrites_previous_state() {
        let (sim, gate) = gate_with(NetworkStatus::online());
        let runner = gate.offline_first::<&str>();

        runner
            .run(
                async { Err(anyhow!("first failure")) },
                async { Ok("unused") },
            )
            .await
            .unwrap_err();
        assert!(runner.state().await.error.is_some());

        sim.set_status(NetworkStatus::offline()).await;
        let result = runner
            .run(async { Ok("online") }, async { Ok("cached trips") })
            .await
            .unwrap();

        assert_eq!(result, "cached trips");
        let state = runner.state().await;
        assert_eq!(state.data, Some("cached trips"));
        assert_eq!(state.error, None);
    }
}

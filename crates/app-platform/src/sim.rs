//! Simulated platform backends
//!
//! Scripted in-memory implementations of the platform traits. Tests drive
//! them to reproduce OS behaviors (denials, blocked prompts, watch errors,
//! offline networks) that are hard to provoke against real bridges, and
//! development builds use them where no native bridge is wired up.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, Notify, RwLock};
use tracing::debug;

use crate::connectivity::{ConnectivitySource, NetworkStatus};
use crate::location::{GeoBackend, WatchEvent, WatchId, WatchOptions};
use crate::permissions::{PermissionBackend, PermissionKind, PermissionStatus};
use crate::{PlatformError, Result};

#[derive(Debug, Default)]
struct KindScript {
    status: Option<PermissionStatus>,
    grant_on_prompt: bool,
    status_after_prompt: Option<PermissionStatus>,
    fail_next_check: bool,
    prompts: u32,
    prompt_gate: Option<Arc<Notify>>,
}

/// Scripted permission backend
///
/// Each kind carries a current status, an instruction for what the next
/// prompt should resolve to, and a count of how many times the OS dialog
/// was shown. An optional gate holds a prompt open until the test releases
/// it, which is how stale-grant races are reproduced deterministically.
#[derive(Default)]
pub struct SimPermissions {
    scripts: Mutex<HashMap<PermissionKind, KindScript>>,
}

impl SimPermissions {
    /// Create a backend where every kind starts out `Unknown`
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current status for a kind
    pub async fn set_status(&self, kind: PermissionKind, status: PermissionStatus) {
        self.scripts.lock().await.entry(kind).or_default().status = Some(status);
    }

    /// Script whether the next prompt for a kind resolves to a grant
    pub async fn set_grant_on_prompt(&self, kind: PermissionKind, grant: bool) {
        self.scripts
            .lock()
            .await
            .entry(kind)
            .or_default()
            .grant_on_prompt = grant;
    }

    /// Script the status later checks see after a prompt, regardless of
    /// what the prompt itself resolved to
    ///
    /// Reproduces an OS that updates its permission tables asynchronously:
    /// the dialog result and a subsequent explicit check can disagree.
    pub async fn set_status_after_prompt(&self, kind: PermissionKind, status: PermissionStatus) {
        self.scripts
            .lock()
            .await
            .entry(kind)
            .or_default()
            .status_after_prompt = Some(status);
    }

    /// Make the next `check` for a kind fail at the bridge level
    pub async fn fail_next_check(&self, kind: PermissionKind) {
        self.scripts
            .lock()
            .await
            .entry(kind)
            .or_default()
            .fail_next_check = true;
    }

    /// How many times the OS dialog was shown for a kind
    pub async fn prompt_count(&self, kind: PermissionKind) -> u32 {
        self.scripts
            .lock()
            .await
            .get(&kind)
            .map(|s| s.prompts)
            .unwrap_or(0)
    }

    /// Hold the next prompt for a kind open until the returned handle is notified
    pub async fn gate_prompt(&self, kind: PermissionKind) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.scripts.lock().await.entry(kind).or_default().prompt_gate = Some(Arc::clone(&gate));
        gate
    }

    /// Whether a gated prompt for a kind has not yet been reached
    ///
    /// Returns `false` once a caller has picked the gate up and is waiting
    /// on it; tests use this as a synchronization point.
    pub async fn gate_pending(&self, kind: PermissionKind) -> bool {
        self.scripts
            .lock()
            .await
            .get(&kind)
            .map(|s| s.prompt_gate.is_some())
            .unwrap_or(false)
    }
}

#[async_trait]
impl PermissionBackend for SimPermissions {
    async fn check(&self, kind: PermissionKind) -> Result<PermissionStatus> {
        let mut scripts = self.scripts.lock().await;
        let script = scripts.entry(kind).or_default();
        if script.fail_next_check {
            script.fail_next_check = false;
            return Err(PlatformError::Bridge(format!(
                "simulated check failure for {kind}"
            )));
        }
        Ok(script.status.unwrap_or(PermissionStatus::Unknown))
    }

    async fn request(&self, kind: PermissionKind) -> Result<PermissionStatus> {
        let gate = {
            let mut scripts = self.scripts.lock().await;
            scripts.entry(kind).or_default().prompt_gate.take()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut scripts = self.scripts.lock().await;
        let script = scripts.entry(kind).or_default();
        script.prompts += 1;
        let status = if script.grant_on_prompt {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        };
        script.status = Some(script.status_after_prompt.unwrap_or(status));
        debug!(%kind, ?status, "simulated permission prompt");
        Ok(status)
    }

    async fn open_settings(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SimLocationInner {
    next_id: u64,
    watches: HashMap<WatchId, mpsc::Sender<WatchEvent>>,
    cancels: u32,
    fail_next_start: bool,
}

/// Scripted continuous-location backend
///
/// Allocates incrementing watch ids and lets tests push fixes and errors
/// into any live watch. Cancelling drops the watch's sender, so no event
/// can be delivered to a cancelled watch.
#[derive(Default)]
pub struct SimLocation {
    inner: Mutex<SimLocationInner>,
}

impl SimLocation {
    /// Create a backend with no active watches
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `start_watch` fail
    pub async fn fail_next_start(&self) {
        self.inner.lock().await.fail_next_start = true;
    }

    /// Push a reading into a live watch; returns whether it was delivered
    pub async fn emit_fix(
        &self,
        id: WatchId,
        latitude: f64,
        longitude: f64,
        heading: Option<f64>,
        accuracy: Option<f64>,
    ) -> bool {
        let sender = self.inner.lock().await.watches.get(&id).cloned();
        match sender {
            Some(tx) => tx
                .send(WatchEvent::Fix {
                    latitude,
                    longitude,
                    heading,
                    accuracy,
                })
                .await
                .is_ok(),
            None => false,
        }
    }

    /// Push an OS error into a live watch; returns whether it was delivered
    pub async fn emit_error(&self, id: WatchId, message: impl Into<String>) -> bool {
        let sender = self.inner.lock().await.watches.get(&id).cloned();
        match sender {
            Some(tx) => tx.send(WatchEvent::Error(message.into())).await.is_ok(),
            None => false,
        }
    }

    /// Id of the most recently started watch, if any is live
    pub async fn latest_watch(&self) -> Option<WatchId> {
        let inner = self.inner.lock().await;
        inner.watches.keys().max_by_key(|id| id.0).copied()
    }

    /// Number of currently live watches
    pub async fn active_watch_count(&self) -> usize {
        self.inner.lock().await.watches.len()
    }

    /// Number of cancel calls issued against this backend
    pub async fn cancel_count(&self) -> u32 {
        self.inner.lock().await.cancels
    }
}

#[async_trait]
impl GeoBackend for SimLocation {
    async fn start_watch(
        &self,
        options: WatchOptions,
        events: mpsc::Sender<WatchEvent>,
    ) -> Result<WatchId> {
        let mut inner = self.inner.lock().await;
        if inner.fail_next_start {
            inner.fail_next_start = false;
            return Err(PlatformError::WatchFailed(
                "simulated start failure".to_string(),
            ));
        }
        inner.next_id += 1;
        let id = WatchId(inner.next_id);
        inner.watches.insert(id, events);
        debug!(%id, ?options, "simulated watch started");
        Ok(id)
    }

    async fn cancel_watch(&self, id: WatchId) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.cancels += 1;
        match inner.watches.remove(&id) {
            Some(_) => {
                debug!(%id, "simulated watch cancelled");
                Ok(())
            }
            None => Err(PlatformError::NoSuchWatch(id)),
        }
    }
}

/// Scripted connectivity source with settable status
#[derive(Debug)]
pub struct SimConnectivity {
    status: RwLock<NetworkStatus>,
}

impl SimConnectivity {
    /// Create a source reporting the given initial status
    pub fn new(status: NetworkStatus) -> Self {
        Self {
            status: RwLock::new(status),
        }
    }

    /// Replace the reported status
    pub async fn set_status(&self, status: NetworkStatus) {
        *self.status.write().await = status;
    }
}

impl Default for SimConnectivity {
    fn default() -> Self {
        Self::new(NetworkStatus::online())
    }
}

#[async_trait]
impl ConnectivitySource for SimConnectivity {
    async fn status(&self) -> NetworkStatus {
        *self.status.read().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sim_watch_lifecycle() {
        let sim = SimLocation::new();
        let (tx, mut rx) = mpsc::channel(4);

        let id = sim.start_watch(WatchOptions::default(), tx).await.unwrap();
        assert_eq!(sim.active_watch_count().await, 1);

        assert!(sim.emit_fix(id, 51.5, -0.12, Some(180.0), Some(5.0)).await);
        match rx.recv().await.unwrap() {
            WatchEvent::Fix { latitude, .. } => assert_eq!(latitude, 51.5),
            other => panic!("unexpected event: {other:?}"),
        }

        sim.cancel_watch(id).await.unwrap();
        assert_eq!(sim.active_watch_count().await, 0);
        assert!(!sim.emit_fix(id, 0.0, 0.0, None, None).await);
    }

    #[tokio::test]
    async fn test_cancel_unknown_watch_fails() {
        let sim = SimLocation::new();
        let err = sim.cancel_watch(WatchId(42)).await.unwrap_err();
        assert!(matches!(err, PlatformError::NoSuchWatch(WatchId(42))));
    }

    #[tokio::test]
    async fn test_sim_connectivity_toggles() {
        let sim = SimConnectivity::default();
        assert!(sim.status().await.is_connected);

        sim.set_status(NetworkStatus::offline()).await;
        assert!(!sim.status().await.is_connected);
    }
}

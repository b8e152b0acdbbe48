//! Continuous-location tracking
//!
//! [`LocationTracker`] is a two-state machine driven by a UI "active"
//! signal: Idle (no watch) and Tracking (exactly one live watch handle).
//! Activation negotiates the location permission, then starts an OS watch;
//! deactivation cancels it exactly once. The handle is owned by the
//! tracker and never leaves it, which is what makes the at-most-one-watch
//! invariant enforceable even under rapid signal toggling.

use app_platform::{
    GeoBackend, PermissionGateway, PermissionKind, WatchEvent, WatchId, WatchOptions,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Buffer for watch events between the OS bridge and the reader task
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Transient OS-reported failure during an active watch
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("location watch error: {0}")]
pub struct WatchError(pub String);

/// Most recent location reading, or the most recent failure
///
/// A good fix replaces the coordinate fields and clears `error`; a watch
/// error sets only `error`, so stale coordinates survive transient
/// failures and the UI can keep showing them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    /// Latitude in degrees
    pub latitude: Option<f64>,
    /// Longitude in degrees
    pub longitude: Option<f64>,
    /// Heading in degrees from true north
    pub heading: Option<f64>,
    /// Horizontal accuracy in meters
    pub accuracy: Option<f64>,
    /// Most recent watch failure, cleared by the next good fix
    pub error: Option<WatchError>,
}

#[derive(Debug, Default)]
struct TrackerInner {
    watch: Option<WatchId>,
    reader: Option<JoinHandle<()>>,
    // Bumped on every deactivation; a permission grant that resolves
    // against an older generation is stale and must not start a watch.
    generation: u64,
}

/// Lifecycle-bound continuous-location state machine
pub struct LocationTracker {
    permissions: PermissionGateway,
    geo: Arc<dyn GeoBackend>,
    options: WatchOptions,
    inner: Arc<Mutex<TrackerInner>>,
    fix: Arc<RwLock<LocationFix>>,
}

impl LocationTracker {
    /// Create an idle tracker with the default watch parameters
    pub fn new(permissions: PermissionGateway, geo: Arc<dyn GeoBackend>) -> Self {
        Self::with_options(permissions, geo, WatchOptions::default())
    }

    /// Create an idle tracker with explicit watch parameters
    pub fn with_options(
        permissions: PermissionGateway,
        geo: Arc<dyn GeoBackend>,
        options: WatchOptions,
    ) -> Self {
        Self {
            permissions,
            geo,
            options,
            inner: Arc::new(Mutex::new(TrackerInner::default())),
            fix: Arc::new(RwLock::new(LocationFix::default())),
        }
    }

    /// Drive the tracker from the caller's "active" signal
    pub async fn set_active(&self, active: bool) {
        if active {
            self.activate().await;
        } else {
            self.deactivate().await;
        }
    }

    /// Clone out the most recent fix for the UI
    pub async fn fix(&self) -> LocationFix {
        self.fix.read().await.clone()
    }

    /// Whether a watch is currently live
    pub async fn is_tracking(&self) -> bool {
        self.inner.lock().await.watch.is_some()
    }

    /// Tear the tracker down; equivalent to the signal going inactive
    pub async fn shutdown(&self) {
        self.deactivate().await;
    }

    async fn activate(&self) {
        let epoch = self.inner.lock().await.generation;

        // Suspends on the OS dialog. Denial is terminal for this
        // activation cycle; there is no automatic retry.
        if !self
            .permissions
            .request_with_prompt(PermissionKind::Location)
            .await
        {
            debug!("location permission not granted, staying idle");
            return;
        }

        let mut inner = self.inner.lock().await;
        if inner.generation != epoch {
            // Deactivated while the prompt was open; the grant is stale.
            debug!("activation superseded during permission prompt");
            return;
        }

        // A leftover handle must be cancelled before a new watch starts.
        if let Some(stale) = inner.watch.take() {
            if let Err(e) = self.geo.cancel_watch(stale).await {
                warn!(id = %stale, error = %e, "failed to cancel stale watch");
            }
        }
        if let Some(reader) = inner.reader.take() {
            reader.abort();
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let id = match self.geo.start_watch(self.options, tx).await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "failed to start location watch");
                self.fix.write().await.error = Some(WatchError(e.to_string()));
                return;
            }
        };
        inner.watch = Some(id);
        inner.reader = Some(tokio::spawn(Self::read_events(
            rx,
            id,
            Arc::clone(&self.inner),
            Arc::clone(&self.fix),
        )));
        debug!(%id, "location watch started");
    }

    async fn deactivate(&self) {
        let mut inner = self.inner.lock().await;
        inner.generation = inner.generation.wrapping_add(1);

        // Deactivating while idle is a no-op: no cancel call is issued.
        let Some(id) = inner.watch.take() else {
            return;
        };
        if let Some(reader) = inner.reader.take() {
            reader.abort();
        }
        if let Err(e) = self.geo.cancel_watch(id).await {
            warn!(%id, error = %e, "failed to cancel location watch");
        }
        debug!(%id, "location watch cancelled");
    }

    async fn read_events(
        mut events: mpsc::Receiver<WatchEvent>,
        id: WatchId,
        inner: Arc<Mutex<TrackerInner>>,
        fix: Arc<RwLock<LocationFix>>,
    ) {
        while let Some(event) = events.recv().await {
            // A late delivery from a watch that is no longer the held
            // one is ignored.
            let current = inner.lock().await.watch;
            if current != Some(id) {
                continue;
            }
            match event {
                WatchEvent::Fix {
                    latitude,
                    longitude,
                    heading,
                    accuracy,
                } => {
                    let mut fix = fix.write().await;
                    fix.latitude = Some(latitude);
                    fix.longitude = Some(longitude);
                    fix.heading = heading;
                    fix.accuracy = accuracy;
                    fix.error = None;
                }
                WatchEvent::Error(message) => {
                    warn!(%id, %message, "location watch reported an error");
                    fix.write().await.error = Some(WatchError(message));
                }
            }
        }
    }
}

impl Clone for LocationTracker {
    fn clone(&self) -> Self {
        Self {
            permissions: self.permissions.clone(),
            geo: Arc::clone(&self.geo),
            options: self.options,
            inner: Arc::clone(&self.inner),
            fix: Arc::clone(&self.fix),
        }
    }
}

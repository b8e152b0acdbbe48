//! Permission session state
//!
//! [`PermissionCoordinator`] caches the latest known camera and gallery
//! results for one UI session and exposes check/request operations over the
//! [`PermissionGateway`]. Every operation applies its outcome as a single
//! state transition, so observers never see a half-updated session. None of
//! the operations can fail: the gateway has already normalized platform
//! failures into statuses.

use app_platform::{PermissionGateway, PermissionKind, PermissionResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Snapshot of the permission session
///
/// `camera`/`gallery` hold the latest known result per kind, absent until
/// first queried. `loading` is a single flag shared across all operations;
/// overlapping ad hoc single-kind calls resolve it last-write-wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSessionState {
    /// Latest known camera result
    pub camera: Option<PermissionResult>,
    /// Latest known gallery result
    pub gallery: Option<PermissionResult>,
    /// Whether an operation is in flight
    pub loading: bool,
}

/// Session-scoped coordinator for camera and gallery permissions
#[derive(Clone)]
pub struct PermissionCoordinator {
    gateway: PermissionGateway,
    state: Arc<RwLock<PermissionSessionState>>,
}

impl PermissionCoordinator {
    /// Create a coordinator with an empty session
    pub fn new(gateway: PermissionGateway) -> Self {
        Self {
            gateway,
            state: Arc::new(RwLock::new(PermissionSessionState::default())),
        }
    }

    /// Clone out the current session state for the UI
    pub async fn snapshot(&self) -> PermissionSessionState {
        self.state.read().await.clone()
    }

    /// Query the current camera status
    pub async fn check_camera(&self) -> PermissionResult {
        self.check_kind(PermissionKind::Camera).await
    }

    /// Query the current gallery status
    pub async fn check_gallery(&self) -> PermissionResult {
        self.check_kind(PermissionKind::Gallery).await
    }

    /// Prompt for the camera permission
    pub async fn request_camera(&self) -> bool {
        self.request_kind(PermissionKind::Camera).await
    }

    /// Prompt for the gallery permission
    pub async fn request_gallery(&self) -> bool {
        self.request_kind(PermissionKind::Gallery).await
    }

    /// Query camera and gallery concurrently
    ///
    /// Both checks complete before the session is touched; the two fields
    /// are replaced together in one transition.
    pub async fn check_all(&self) -> (PermissionResult, PermissionResult) {
        self.begin().await;
        let (camera, gallery) = tokio::join!(
            self.gateway.check(PermissionKind::Camera),
            self.gateway.check(PermissionKind::Gallery)
        );
        let mut state = self.state.write().await;
        state.camera = Some(camera);
        state.gallery = Some(gallery);
        state.loading = false;
        (camera, gallery)
    }

    /// Prompt for camera and gallery, then refresh both cached results
    ///
    /// Returns the composite prompt outcome, not the refreshed checks.
    pub async fn request_all(&self) -> bool {
        self.begin().await;
        let granted = self.gateway.request_camera_and_gallery().await;
        let (camera, gallery) = tokio::join!(
            self.gateway.check(PermissionKind::Camera),
            self.gateway.check(PermissionKind::Gallery)
        );
        let mut state = self.state.write().await;
        state.camera = Some(camera);
        state.gallery = Some(gallery);
        state.loading = false;
        debug!(granted, "composite permission request completed");
        granted
    }

    /// Open the OS app-settings screen; no session state changes
    pub async fn open_settings(&self) {
        self.gateway.open_settings().await;
    }

    async fn begin(&self) {
        self.state.write().await.loading = true;
    }

    async fn check_kind(&self, kind: PermissionKind) -> PermissionResult {
        self.begin().await;
        let result = self.gateway.check(kind).await;
        self.apply_one(result).await;
        result
    }

    async fn request_kind(&self, kind: PermissionKind) -> bool {
        self.begin().await;
        let granted = self.gateway.request_with_prompt(kind).await;
        // The OS can update its permission tables after the dialog
        // resolves; the cache trusts an explicit re-check, while the
        // prompt's own outcome is what gets returned.
        let refreshed = self.gateway.check(kind).await;
        self.apply_one(refreshed).await;
        granted
    }

    async fn apply_one(&self, result: PermissionResult) {
        let mut state = self.state.write().await;
        match result.kind {
            PermissionKind::Camera => state.camera = Some(result),
            PermissionKind::Gallery => state.gallery = Some(result),
            PermissionKind::Location => {}
        }
        state.loading = false;
    }
}

//! Permission queries and prompts
//!
//! This module normalizes OS-level permission handling behind a single
//! vocabulary. The [`PermissionBackend`] trait is the raw native bridge;
//! [`PermissionGateway`] wraps it and guarantees that no platform failure
//! ever escapes as an error — every outcome is expressed as a
//! [`PermissionStatus`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::Result;

/// An OS-mediated capability requiring user consent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionKind {
    /// Device camera
    Camera,
    /// Photo gallery / media storage
    Gallery,
    /// Fine (GPS-grade) location
    Location,
}

impl PermissionKind {
    /// Native Android permission identifier for this kind
    pub fn android_id(&self) -> &'static str {
        match self {
            Self::Camera => "android.permission.CAMERA",
            Self::Gallery => "android.permission.READ_MEDIA_IMAGES",
            Self::Location => "android.permission.ACCESS_FINE_LOCATION",
        }
    }

    /// Native iOS permission identifier for this kind
    pub fn ios_id(&self) -> &'static str {
        match self {
            Self::Camera => "ios.permission.CAMERA",
            Self::Gallery => "ios.permission.PHOTO_LIBRARY",
            Self::Location => "ios.permission.LOCATION_WHEN_IN_USE",
        }
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Camera => write!(f, "camera"),
            Self::Gallery => write!(f, "gallery"),
            Self::Location => write!(f, "location"),
        }
    }
}

/// Normalized permission status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionStatus {
    /// The user has granted the capability
    Granted,
    /// The user declined; prompting again is allowed
    Denied,
    /// The user permanently declined; only a settings redirect can help
    Blocked,
    /// The platform or device does not support the capability
    Unavailable,
    /// The status has not been determined yet
    Unknown,
}

impl PermissionStatus {
    /// Whether the capability is usable right now
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }

    /// Whether prompting cannot change the outcome (Granted or Blocked)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Granted | Self::Blocked)
    }
}

/// Outcome of a single permission query or prompt
///
/// Immutable once produced; a fresh request always yields a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionResult {
    /// Which capability was negotiated
    pub kind: PermissionKind,
    /// Its normalized status
    pub status: PermissionStatus,
}

impl PermissionResult {
    /// Create a new permission result
    pub fn new(kind: PermissionKind, status: PermissionStatus) -> Self {
        Self { kind, status }
    }
}

/// Raw bridge to the OS permission subsystem
///
/// Implementations may fail; the gateway translates every failure into a
/// status value before it reaches the session layer.
#[async_trait]
pub trait PermissionBackend: Send + Sync {
    /// Query the current status without prompting the user
    async fn check(&self, kind: PermissionKind) -> Result<PermissionStatus>;

    /// Show the OS permission dialog and return the resulting status
    async fn request(&self, kind: PermissionKind) -> Result<PermissionStatus>;

    /// Open the OS app-settings screen
    async fn open_settings(&self) -> Result<()>;
}

/// Uniform front for permission checks and prompts
///
/// All methods are infallible from the caller's point of view: bridge
/// errors are mapped to `Unavailable` (checks) or a `false` outcome
/// (prompts), and settings-open failures are swallowed.
#[derive(Clone)]
pub struct PermissionGateway {
    backend: Arc<dyn PermissionBackend>,
}

impl PermissionGateway {
    /// Create a gateway over a native or simulated backend
    pub fn new(backend: Arc<dyn PermissionBackend>) -> Self {
        Self { backend }
    }

    /// Query the current status of a permission without prompting
    pub async fn check(&self, kind: PermissionKind) -> PermissionResult {
        let status = match self.backend.check(kind).await {
            Ok(status) => status,
            Err(e) => {
                warn!(%kind, error = %e, "permission check failed, reporting unavailable");
                PermissionStatus::Unavailable
            }
        };
        PermissionResult::new(kind, status)
    }

    /// Prompt for a permission, returning whether it ended up granted
    ///
    /// Does not invoke the OS dialog when the status is already terminal:
    /// an existing grant short-circuits to `true`, and `Blocked` returns
    /// `false` immediately since the OS would refuse to re-prompt and a
    /// settings redirect is the only remaining path.
    pub async fn request_with_prompt(&self, kind: PermissionKind) -> bool {
        let current = self.check(kind).await.status;
        match current {
            PermissionStatus::Granted => return true,
            PermissionStatus::Blocked => {
                debug!(%kind, "permission blocked, skipping prompt");
                return false;
            }
            _ => {}
        }

        match self.backend.request(kind).await {
            Ok(status) => {
                debug!(%kind, ?status, "permission prompt completed");
                status.is_granted()
            }
            Err(e) => {
                warn!(%kind, error = %e, "permission prompt failed");
                false
            }
        }
    }

    /// Open the OS app-settings screen; best-effort, never fails
    pub async fn open_settings(&self) {
        if let Err(e) = self.backend.open_settings().await {
            warn!(error = %e, "failed to open app settings");
        }
    }

    /// Request camera and gallery in sequence, camera first
    ///
    /// The gallery prompt is attempted even when the camera prompt fails;
    /// sibling permission outcomes are independent. Returns `true` only
    /// when both end up granted.
    pub async fn request_camera_and_gallery(&self) -> bool {
        let camera = self.request_with_prompt(PermissionKind::Camera).await;
        let gallery = self.request_with_prompt(PermissionKind::Gallery).await;
        camera && gallery
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimPermissions;

    #[tokio::test]
    async fn test_check_maps_backend_status() {
        let sim = Arc::new(SimPermissions::new());
        sim.set_status(PermissionKind::Camera, PermissionStatus::Denied)
            .await;

        let gateway = PermissionGateway::new(sim);
        let result = gateway.check(PermissionKind::Camera).await;

        assert_eq!(result.kind, PermissionKind::Camera);
        assert_eq!(result.status, PermissionStatus::Denied);
    }

    #[tokio::test]
    async fn test_blocked_never_prompts() {
        let sim = Arc::new(SimPermissions::new());
        sim.set_status(PermissionKind::Gallery, PermissionStatus::Blocked)
            .await;

        let gateway = PermissionGateway::new(Arc::clone(&sim) as Arc<dyn PermissionBackend>);
        let granted = gateway.request_with_prompt(PermissionKind::Gallery).await;

        assert!(!granted);
        assert_eq!(sim.prompt_count(PermissionKind::Gallery).await, 0);
    }

    #[tokio::test]
    async fn test_already_granted_short_circuits() {
        let sim = Arc::new(SimPermissions::new());
        sim.set_status(PermissionKind::Camera, PermissionStatus::Granted)
            .await;

        let gateway = PermissionGateway::new(Arc::clone(&sim) as Arc<dyn PermissionBackend>);
        let granted = gateway.request_with_prompt(PermissionKind::Camera).await;

        assert!(granted);
        assert_eq!(sim.prompt_count(PermissionKind::Camera).await, 0);
    }

    #[tokio::test]
    async fn test_denied_then_granted_on_prompt() {
        let sim = Arc::new(SimPermissions::new());
        sim.set_status(PermissionKind::Camera, PermissionStatus::Denied)
            .await;
        sim.set_grant_on_prompt(PermissionKind::Camera, true).await;

        let gateway = PermissionGateway::new(Arc::clone(&sim) as Arc<dyn PermissionBackend>);
        let granted = gateway.request_with_prompt(PermissionKind::Camera).await;

        assert!(granted);
        assert_eq!(sim.prompt_count(PermissionKind::Camera).await, 1);
    }

    #[tokio::test]
    async fn test_bridge_failure_reports_unavailable() {
        let sim = Arc::new(SimPermissions::new());
        sim.fail_next_check(PermissionKind::Gallery).await;

        let gateway = PermissionGateway::new(Arc::clone(&sim) as Arc<dyn PermissionBackend>);
        let result = gateway.check(PermissionKind::Gallery).await;

        assert_eq!(result.status, PermissionStatus::Unavailable);
    }

    #[tokio::test]
    async fn test_composite_attempts_gallery_after_camera_blocked() {
        let sim = Arc::new(SimPermissions::new());
        sim.set_status(PermissionKind::Camera, PermissionStatus::Blocked)
            .await;
        sim.set_status(PermissionKind::Gallery, PermissionStatus::Denied)
            .await;
        sim.set_grant_on_prompt(PermissionKind::Gallery, true).await;

        let gateway = PermissionGateway::new(Arc::clone(&sim) as Arc<dyn PermissionBackend>);
        let both = gateway.request_camera_and_gallery().await;

        assert!(!both);
        // Camera was blocked but the gallery prompt still ran.
        assert_eq!(sim.prompt_count(PermissionKind::Camera).await, 0);
        assert_eq!(sim.prompt_count(PermissionKind::Gallery).await, 1);
    }
}

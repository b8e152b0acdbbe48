//! RouteMate core
//!
//! Facade over the driver-facing app core: the permission acquisition,
//! location tracking, and connectivity subsystem. UI surfaces depend on
//! this crate and consume the re-exported session types.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use app_platform::{
    AlwaysOnline, ConnectivitySource, GeoBackend, NetworkStatus, PermissionBackend,
    PermissionGateway, PermissionKind, PermissionResult, PermissionStatus, PlatformError,
    WatchEvent, WatchOptions,
};
pub use app_state::{
    ConnectivityGate, LocationFix, LocationTracker, OfflineFirst, OfflineFirstState,
    PermissionCoordinator, PermissionSessionState, WatchError,
};

//! Platform seam for RouteMate
//!
//! This crate defines the OS-facing contracts the core drives: permission
//! queries and prompts, the continuous-location watch, and network
//! reachability. Production builds wire native bridges in behind these
//! traits; the [`sim`] module provides scripted in-memory backends for
//! tests and development builds.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod connectivity;
pub mod location;
pub mod permissions;
pub mod sim;

pub use connectivity::{AlwaysOnline, ConnectivitySource, NetworkStatus};
pub use location::{GeoBackend, WatchEvent, WatchId, WatchOptions};
pub use permissions::{
    PermissionBackend, PermissionGateway, PermissionKind, PermissionResult, PermissionStatus,
};

use thiserror::Error;

/// Errors reported by native platform bridges
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The capability does not exist on this platform or device
    #[error("Capability unsupported on this platform: {0}")]
    Unsupported(PermissionKind),

    /// A native bridge call failed
    #[error("Platform bridge call failed: {0}")]
    Bridge(String),

    /// The location watch could not be started
    #[error("Failed to start location watch: {0}")]
    WatchFailed(String),

    /// The referenced watch is not active
    #[error("No active watch with id {0}")]
    NoSuchWatch(WatchId),
}

/// Result type for platform bridge operations
pub type Result<T> = std::result::Result<T, PlatformError>;

//! Session state management for RouteMate
//!
//! This crate holds the stateful core a driver-facing UI mounts: the
//! permission session ([`PermissionCoordinator`]), the continuous-location
//! state machine ([`LocationTracker`]), and the connectivity branch point
//! ([`ConnectivityGate`]). All state is owned here and handed to the UI as
//! cloned snapshots; no caller mutates it directly.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod connectivity;
pub mod location;
pub mod permissions;

pub use connectivity::{ConnectivityGate, OfflineFirst, OfflineFirstState};
pub use location::{LocationFix, LocationTracker, WatchError};
pub use permissions::{PermissionCoordinator, PermissionSessionState};

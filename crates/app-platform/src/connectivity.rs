//! Network reachability contract
//!
//! Connectivity is a point-in-time query, not a live subscription. Where
//! no platform signal is wired up, [`AlwaysOnline`] stands in.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Point-in-time network reachability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkStatus {
    /// Whether the device has an active network connection
    pub is_connected: bool,
    /// Whether the internet is reachable over that connection, when known
    pub is_internet_reachable: Option<bool>,
}

impl NetworkStatus {
    /// Status for a connected device with reachable internet
    pub fn online() -> Self {
        Self {
            is_connected: true,
            is_internet_reachable: Some(true),
        }
    }

    /// Status for a device with no network connection
    pub fn offline() -> Self {
        Self {
            is_connected: false,
            is_internet_reachable: Some(false),
        }
    }
}

/// Source of network reachability information
#[async_trait]
pub trait ConnectivitySource: Send + Sync {
    /// Query the current network status
    async fn status(&self) -> NetworkStatus;
}

/// Connectivity source that always reports a reachable connection
///
/// Used where no platform connectivity signal is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

#[async_trait]
impl ConnectivitySource for AlwaysOnline {
    async fn status(&self) -> NetworkStatus {
        NetworkStatus::online()
    }
}

//! Continuous-location watch contract
//!
//! The OS delivers location readings on its own timeline; a watch is the
//! subscription that receives them. Backends push [`WatchEvent`]s through
//! the channel the caller supplies at start and stop delivering once the
//! watch is cancelled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::Result;

/// Default reporting interval for a watch (5 seconds)
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(5000);

/// Fastest interval the OS may deliver readings at (2 seconds)
pub const DEFAULT_FASTEST_INTERVAL: Duration = Duration::from_millis(2000);

/// Minimum movement before a new reading is reported (1 meter)
pub const DEFAULT_DISTANCE_FILTER_M: f64 = 1.0;

/// Opaque identifier for one active continuous-location subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WatchId(pub u64);

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parameters for starting a location watch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WatchOptions {
    /// Request GPS-grade accuracy
    pub high_accuracy: bool,
    /// Minimum movement distance in meters before a new reading
    pub distance_filter_m: f64,
    /// Target reporting interval
    pub interval: Duration,
    /// Fastest interval readings may arrive at
    pub fastest_interval: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            distance_filter_m: DEFAULT_DISTANCE_FILTER_M,
            interval: DEFAULT_INTERVAL,
            fastest_interval: DEFAULT_FASTEST_INTERVAL,
        }
    }
}

/// One delivery from an active watch: a reading or a transient failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WatchEvent {
    /// A successful location reading
    Fix {
        /// Latitude in degrees
        latitude: f64,
        /// Longitude in degrees
        longitude: f64,
        /// Heading in degrees from true north, when the device reports one
        heading: Option<f64>,
        /// Horizontal accuracy in meters, when the device reports one
        accuracy: Option<f64>,
    },
    /// An OS-reported failure; the watch stays running
    Error(String),
}

/// Raw bridge to the OS continuous-location subsystem
#[async_trait]
pub trait GeoBackend: Send + Sync {
    /// Start a watch, delivering events into `events` until cancelled
    async fn start_watch(
        &self,
        options: WatchOptions,
        events: mpsc::Sender<WatchEvent>,
    ) -> Result<WatchId>;

    /// Cancel an active watch; no further events are delivered after this
    async fn cancel_watch(&self, id: WatchId) -> Result<()>;
}

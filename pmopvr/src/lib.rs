//! # pmopvr
//!
//! Coordination layer between a media center and its live-TV / DVR backend
//! add-ons. Each enabled add-on gets a [`ClientHandle`] that guards every
//! call to the backend, caches its properties and tracks its connection
//! state. The [`ClientRegistry`] keeps the handles in line with the add-on
//! manager and routes operations to one client, to all of them, or to the
//! client owning the playing item.

pub mod addons;
pub mod backend;
pub mod capabilities;
pub mod client;
pub mod config;
pub mod connection;
pub mod edl;
pub mod errors;
pub mod events;
pub mod gateway;
pub mod ids;
pub mod logging;
pub mod menu_hooks;
pub mod model;
pub mod notifier;
pub mod playback;
pub mod registry;
pub mod strings;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use addons::{AddonEvent, AddonInfo, AddonManager, InstalledAddon, PvrSubsystem};
pub use backend::{BackendConnection, ClientContext, ConnectionReporter, EpgSink};
pub use capabilities::{BackendCapabilities, ClientCapabilities};
pub use client::{ClientHandle, ClientLifecycle, ClientServices};
pub use config::PvrConfig;
pub use connection::ConnectionState;
pub use errors::{AddonStatus, ClientsError, PvrError, PvrResult};
pub use events::{EventSeverity, EventSink, PvrEvent, PvrEventBus};
pub use ids::ClientIdTable;
pub use logging::init_logging;
pub use playback::{PlaybackKind, PlaybackStateTracker, PlayingItem};
pub use registry::{ClientRegistry, FanOutReport, RegistryServices, RegistrySettings};
pub use strings::{DefaultStrings, Localizer};

/// Numeric id of a client, unique per add-on for the life of the process
/// (and across restarts with a persisted [`ClientIdTable`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub i32);

impl ClientId {
    /// Id of a client that was never created or has been destroyed.
    pub const INVALID: ClientId = ClientId(-1);

    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//! Collaborators of the registry: the add-on manager that knows which
//! backends are installed and enabled, and the wider PVR subsystem the
//! registry stops and restarts around client changes.

use std::fmt;
use std::sync::Arc;

use crate::backend::BackendConnection;

/// Static description of an installed backend add-on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonInfo {
    /// Identifiant textuel, p. ex. "pvr.hts"
    pub id: String,
    pub name: String,
    pub version: String,
    pub icon: String,
}

impl AddonInfo {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            version: String::new(),
            icon: String::new(),
        }
    }
}

/// An installed add-on together with the connection it provides.
#[derive(Clone)]
pub struct InstalledAddon {
    pub info: AddonInfo,
    pub backend: Arc<dyn BackendConnection>,
}

impl InstalledAddon {
    pub fn new(info: AddonInfo, backend: Arc<dyn BackendConnection>) -> Self {
        Self { info, backend }
    }
}

impl fmt::Debug for InstalledAddon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstalledAddon")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Events published by the add-on manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddonEvent {
    Enabled(String),
    Disabled(String),
    Installed(String),
    Uninstalled(String),
}

impl AddonEvent {
    /// Id of the add-on whose enablement changed, for the events the
    /// registry reacts to.
    pub fn enablement_change(&self) -> Option<&str> {
        match self {
            AddonEvent::Enabled(id) | AddonEvent::Disabled(id) => Some(id),
            AddonEvent::Installed(_) | AddonEvent::Uninstalled(_) => None,
        }
    }
}

pub trait AddonManager: Send + Sync {
    /// Installed PVR backend add-ons, enabled or not.
    fn installed_addons(&self) -> Vec<InstalledAddon>;

    fn is_addon_disabled(&self, addon_id: &str) -> bool;

    fn disable_addon(&self, addon_id: &str) -> bool;

    fn enable_addon(&self, addon_id: &str) -> bool;
}

/// The PVR subsystem built on top of the clients (channel, EPG, timer and
/// recording managers).
pub trait PvrSubsystem: Send + Sync {
    fn stop(&self);

    fn start(&self);

    /// Stops whatever media is currently being played.
    fn stop_playback(&self);
}

//! Capability flags declared by a backend.
//!
//! [`BackendCapabilities`] is what the backend reports. [`ClientCapabilities`]
//! is the derived, immutable view the rest of the layer consults: it is built
//! once per property refresh and shared behind an `Arc`.

use serde::{Deserialize, Serialize};

use crate::strings::{self, Localizer};

/// Longest recording lifetime offered when a backend supports changing
/// lifetimes without publishing its own list of values.
pub const MAX_DEFAULT_LIFETIME_DAYS: i32 = 365;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifetimeValue {
    pub value: i32,
    #[serde(default)]
    pub description: String,
}

/// Raw capability flags, as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendCapabilities {
    pub supports_tv: bool,
    pub supports_radio: bool,
    pub supports_channel_groups: bool,
    pub supports_channel_scan: bool,
    pub supports_channel_settings: bool,
    pub supports_descramble_info: bool,
    pub supports_epg: bool,
    pub supports_timers: bool,
    pub supports_recordings: bool,
    pub supports_recordings_undelete: bool,
    pub supports_recording_play_count: bool,
    pub supports_last_played_position: bool,
    pub supports_recording_edl: bool,
    pub supports_recordings_rename: bool,
    pub supports_recordings_lifetime_change: bool,
    pub handles_input_stream: bool,
    pub handles_demuxing: bool,
    pub recordings_lifetime_values: Vec<LifetimeValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientCapabilities {
    raw: BackendCapabilities,
    lifetime_values: Vec<LifetimeValue>,
}

impl ClientCapabilities {
    pub fn from_backend(raw: BackendCapabilities, localizer: &dyn Localizer) -> Self {
        let lifetime_values = Self::build_lifetime_values(&raw, localizer);
        Self {
            raw,
            lifetime_values,
        }
    }

    fn build_lifetime_values(
        raw: &BackendCapabilities,
        localizer: &dyn Localizer,
    ) -> Vec<LifetimeValue> {
        if !raw.recordings_lifetime_values.is_empty() {
            return raw
                .recordings_lifetime_values
                .iter()
                .map(|lifetime| LifetimeValue {
                    value: lifetime.value,
                    description: if lifetime.description.is_empty() {
                        lifetime.value.to_string()
                    } else {
                        lifetime.description.clone()
                    },
                })
                .collect();
        }

        if raw.supports_recordings && raw.supports_recordings_lifetime_change {
            let pattern = localizer.localize(strings::MSG_DAYS);
            return (1..=MAX_DEFAULT_LIFETIME_DAYS)
                .map(|days| LifetimeValue {
                    value: days,
                    description: strings::format_count(&pattern, days),
                })
                .collect();
        }

        Vec::new()
    }

    pub fn raw(&self) -> &BackendCapabilities {
        &self.raw
    }

    pub fn supports_tv(&self) -> bool {
        self.raw.supports_tv
    }

    pub fn supports_radio(&self) -> bool {
        self.raw.supports_radio
    }

    pub fn supports_channel_groups(&self) -> bool {
        self.raw.supports_channel_groups
    }

    pub fn supports_channel_scan(&self) -> bool {
        self.raw.supports_channel_scan
    }

    pub fn supports_channel_settings(&self) -> bool {
        self.raw.supports_channel_settings
    }

    pub fn supports_descramble_info(&self) -> bool {
        self.raw.supports_descramble_info
    }

    pub fn supports_epg(&self) -> bool {
        self.raw.supports_epg
    }

    pub fn supports_timers(&self) -> bool {
        self.raw.supports_timers
    }

    pub fn supports_recordings(&self) -> bool {
        self.raw.supports_recordings
    }

    // Les capacités liées aux enregistrements n'ont de sens que si le
    // backend gère les enregistrements.

    pub fn supports_recordings_undelete(&self) -> bool {
        self.raw.supports_recordings && self.raw.supports_recordings_undelete
    }

    pub fn supports_recording_play_count(&self) -> bool {
        self.raw.supports_recordings && self.raw.supports_recording_play_count
    }

    pub fn supports_last_played_position(&self) -> bool {
        self.raw.supports_recordings && self.raw.supports_last_played_position
    }

    pub fn supports_recording_edl(&self) -> bool {
        self.raw.supports_recordings && self.raw.supports_recording_edl
    }

    pub fn supports_recordings_rename(&self) -> bool {
        self.raw.supports_recordings && self.raw.supports_recordings_rename
    }

    pub fn supports_recordings_lifetime_change(&self) -> bool {
        self.raw.supports_recordings && self.raw.supports_recordings_lifetime_change
    }

    pub fn handles_input_stream(&self) -> bool {
        self.raw.handles_input_stream
    }

    pub fn handles_demuxing(&self) -> bool {
        self.raw.handles_demuxing
    }

    pub fn recordings_lifetime_values(&self) -> &[LifetimeValue] {
        &self.lifetime_values
    }
}

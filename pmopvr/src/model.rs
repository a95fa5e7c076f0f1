//! Value types exchanged with backends.
//!
//! These are plain data: they carry the id of the client that owns them so
//! the registry can route follow-up calls to the right backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ClientId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub client_id: ClientId,
    /// Identifiant unique du canal côté backend
    pub unique_id: u32,
    pub is_radio: bool,
    pub channel_number: u32,
    pub sub_channel_number: u32,
    pub name: String,
    #[serde(default)]
    pub icon_path: String,
    #[serde(default)]
    pub is_hidden: bool,
    /// 0 when the channel is not scrambled.
    #[serde(default)]
    pub encryption_system: u32,
}

impl Channel {
    pub fn new(client_id: ClientId, unique_id: u32, name: &str) -> Self {
        Self {
            client_id,
            unique_id,
            is_radio: false,
            channel_number: unique_id,
            sub_channel_number: 0,
            name: name.to_string(),
            icon_path: String::new(),
            is_hidden: false,
            encryption_system: 0,
        }
    }

    pub fn is_encrypted(&self) -> bool {
        self.encryption_system > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelGroup {
    pub client_id: ClientId,
    pub name: String,
    pub is_radio: bool,
    #[serde(default)]
    pub position: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelGroupMember {
    pub group_name: String,
    pub channel_unique_id: u32,
    pub channel_number: u32,
    #[serde(default)]
    pub sub_channel_number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    pub client_id: ClientId,
    pub recording_id: String,
    pub title: String,
    #[serde(default)]
    pub episode_name: String,
    #[serde(default)]
    pub plot: String,
    #[serde(default)]
    pub channel_name: String,
    pub channel_unique_id: Option<u32>,
    #[serde(default)]
    pub directory: String,
    pub recording_time: DateTime<Utc>,
    pub duration_secs: u32,
    #[serde(default)]
    pub play_count: u32,
    #[serde(default)]
    pub last_played_position: i32,
    /// Days the backend keeps the recording, 0 for ever.
    #[serde(default)]
    pub lifetime: i32,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub is_radio: bool,
}

impl Recording {
    pub fn new(client_id: ClientId, recording_id: &str, title: &str) -> Self {
        Self {
            client_id,
            recording_id: recording_id.to_string(),
            title: title.to_string(),
            episode_name: String::new(),
            plot: String::new(),
            channel_name: String::new(),
            channel_unique_id: None,
            directory: String::new(),
            recording_time: DateTime::<Utc>::default(),
            duration_secs: 0,
            play_count: 0,
            last_played_position: 0,
            lifetime: 0,
            is_deleted: false,
            is_radio: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerState {
    New,
    Scheduled,
    Recording,
    Completed,
    Aborted,
    Cancelled,
    Conflict,
    Error,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    pub client_id: ClientId,
    /// Index du timer dans le backend
    pub client_index: u32,
    pub timer_type: u32,
    pub state: TimerState,
    pub title: String,
    pub channel_unique_id: Option<u32>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub epg_unique_id: Option<u32>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub lifetime: i32,
    #[serde(default)]
    pub directory: String,
    #[serde(default)]
    pub summary: String,
}

impl Timer {
    pub fn is_recording(&self) -> bool {
        self.state == TimerState::Recording
    }
}

/// Attribute bits of a [`TimerType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TimerTypeAttributes(pub u32);

impl TimerTypeAttributes {
    pub const NONE: Self = Self(0);
    pub const IS_MANUAL: Self = Self(1 << 0);
    pub const IS_REPEATING: Self = Self(1 << 1);
    pub const IS_READONLY: Self = Self(1 << 2);
    pub const FORBIDS_NEW_INSTANCES: Self = Self(1 << 3);
    pub const SUPPORTS_ENABLE_DISABLE: Self = Self(1 << 4);
    pub const SUPPORTS_CHANNELS: Self = Self(1 << 5);
    pub const SUPPORTS_START_TIME: Self = Self(1 << 6);
    pub const SUPPORTS_TITLE_EPG_MATCH: Self = Self(1 << 7);
    pub const SUPPORTS_FULLTEXT_EPG_MATCH: Self = Self(1 << 8);
    pub const SUPPORTS_FIRST_DAY: Self = Self(1 << 9);
    pub const SUPPORTS_WEEKDAYS: Self = Self(1 << 10);
    pub const SUPPORTS_RECORD_ONLY_NEW_EPISODES: Self = Self(1 << 11);
    pub const SUPPORTS_START_END_MARGIN: Self = Self(1 << 12);
    pub const SUPPORTS_PRIORITY: Self = Self(1 << 13);
    pub const SUPPORTS_LIFETIME: Self = Self(1 << 14);
    pub const SUPPORTS_RECORDING_FOLDERS: Self = Self(1 << 15);
    pub const SUPPORTS_RECORDING_GROUP: Self = Self(1 << 16);
    pub const SUPPORTS_END_TIME: Self = Self(1 << 17);
    pub const REQUIRES_EPG_TAG_ON_CREATE: Self = Self(1 << 20);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for TimerTypeAttributes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Id 0 is reserved and never designates a usable timer type.
pub const TIMER_TYPE_NONE: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerType {
    pub id: u32,
    pub attributes: TimerTypeAttributes,
    #[serde(default)]
    pub description: String,
}

impl TimerType {
    pub fn new(id: u32, attributes: TimerTypeAttributes) -> Self {
        Self {
            id,
            attributes,
            description: String::new(),
        }
    }

    pub fn is_manual(&self) -> bool {
        self.attributes.contains(TimerTypeAttributes::IS_MANUAL)
    }

    pub fn is_repeating(&self) -> bool {
        self.attributes.contains(TimerTypeAttributes::IS_REPEATING)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpgTag {
    pub client_id: ClientId,
    pub unique_broadcast_id: u32,
    pub channel_unique_id: u32,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub plot: String,
    #[serde(default)]
    pub genre_type: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamTimes {
    pub start_time: DateTime<Utc>,
    pub pts_start: i64,
    pub pts_begin: i64,
    pub pts_end: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalStatus {
    pub adapter_name: String,
    pub adapter_status: String,
    pub service_name: String,
    pub provider_name: String,
    pub mux_name: String,
    /// Rapport signal/bruit, de 0 à 65535
    pub snr: i32,
    /// Force du signal, de 0 à 65535
    pub signal: i32,
    pub ber: i64,
    pub unc: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescrambleInfo {
    pub pid: i32,
    pub caid: i32,
    pub provider_id: i32,
    pub ecm_time: i32,
    pub hops: i32,
    pub card_system: String,
    pub reader: String,
    pub from: String,
    pub protocol: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodecType {
    Video,
    Audio,
    Subtitle,
    Teletext,
    Rds,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub pid: u32,
    pub codec_type: CodecType,
    pub codec_name: String,
    #[serde(default)]
    pub language: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamProperties {
    pub streams: Vec<StreamInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemuxPacket {
    pub stream_id: i32,
    pub pts: f64,
    pub dts: f64,
    pub duration: f64,
    pub data: Vec<u8>,
}

/// Origin of a stream seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeekWhence {
    Set,
    Current,
    End,
}

/// Disk usage as reported by a backend, in KiB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveSpace {
    pub total_kib: u64,
    pub used_kib: u64,
}

/// Aggregated backend summary for one client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendProperties {
    pub client_id: ClientId,
    pub name: String,
    pub version: String,
    pub host: String,
    pub num_channels: Option<usize>,
    pub num_timers: Option<usize>,
    pub num_recordings: Option<usize>,
    pub num_deleted_recordings: Option<usize>,
    /// Bytes
    pub disk_used: u64,
    /// Bytes
    pub disk_total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_type_attributes() {
        let attrs = TimerTypeAttributes::IS_MANUAL | TimerTypeAttributes::IS_REPEATING;
        let timer_type = TimerType::new(2, attrs);
        assert!(timer_type.is_manual());
        assert!(timer_type.is_repeating());
        assert!(!attrs.contains(TimerTypeAttributes::SUPPORTS_CHANNELS));
    }

    #[test]
    fn test_channel_encryption() {
        let mut channel = Channel::new(ClientId(1), 10, "Arte");
        assert!(!channel.is_encrypted());
        channel.encryption_system = 0x0500;
        assert!(channel.is_encrypted());
    }
}

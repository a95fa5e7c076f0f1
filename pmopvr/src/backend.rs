//! The call surface every PVR backend implements.
//!
//! One method per backend operation. Everything except [`BackendConnection::create`]
//! is optional: the default implementations answer
//! [`PvrError::NotImplemented`], which the call gateway treats as "feature
//! absent" rather than as a failure.

use std::sync::Weak;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::ClientId;
use crate::capabilities::BackendCapabilities;
use crate::client::ClientHandle;
use crate::connection::ConnectionState;
use crate::edl::EdlEntry;
use crate::errors::{AddonStatus, PvrError, PvrResult};
use crate::menu_hooks::{MenuHook, MenuHookData};
use crate::model::{
    Channel, ChannelGroup, ChannelGroupMember, DemuxPacket, DescrambleInfo, DriveSpace, EpgTag,
    Recording, SeekWhence, SignalStatus, StreamProperties, StreamTimes, Timer, TimerType,
};

/// Receives EPG entries fetched from a backend.
pub trait EpgSink {
    fn add_tag(&mut self, tag: EpgTag);
}

impl EpgSink for Vec<EpgTag> {
    fn add_tag(&mut self, tag: EpgTag) {
        self.push(tag);
    }
}

/// Handle given to a backend at creation time to report connection state
/// changes, from any thread.
#[derive(Clone)]
pub struct ConnectionReporter {
    client: Weak<ClientHandle>,
}

impl ConnectionReporter {
    pub(crate) fn new(client: Weak<ClientHandle>) -> Self {
        Self { client }
    }

    /// Reports a new connection state. `message` overrides the default
    /// user-facing text when present.
    pub fn report(&self, connection_string: &str, state: ConnectionState, message: Option<&str>) {
        match self.client.upgrade() {
            Some(client) => client.set_connection_state(connection_string, state, message),
            None => warn!(
                connection = connection_string,
                state = %state,
                "Connection state reported for a dropped client"
            ),
        }
    }
}

/// Parameters handed to a backend when it is created.
#[derive(Clone)]
pub struct ClientContext {
    pub client_id: ClientId,
    pub addon_id: String,
    /// Number of days of EPG data the backend should provide.
    pub epg_max_days: u32,
    pub reporter: ConnectionReporter,
}

pub trait BackendConnection: Send + Sync {
    fn create(&self, context: &ClientContext) -> AddonStatus;

    fn destroy(&self) {}

    // --- Métadonnées ---

    fn capabilities(&self) -> PvrResult<BackendCapabilities>;

    fn backend_name(&self) -> PvrResult<String> {
        Err(PvrError::NotImplemented)
    }

    fn backend_version(&self) -> PvrResult<String> {
        Err(PvrError::NotImplemented)
    }

    fn backend_hostname(&self) -> PvrResult<String> {
        Err(PvrError::NotImplemented)
    }

    fn connection_string(&self) -> PvrResult<String> {
        Err(PvrError::NotImplemented)
    }

    fn timer_types(&self) -> PvrResult<Vec<TimerType>> {
        Err(PvrError::NotImplemented)
    }

    fn menu_hooks(&self) -> PvrResult<Vec<MenuHook>> {
        Err(PvrError::NotImplemented)
    }

    fn drive_space(&self) -> PvrResult<DriveSpace> {
        Err(PvrError::NotImplemented)
    }

    // --- Chaînes et groupes ---

    fn channel_count(&self) -> PvrResult<usize> {
        Err(PvrError::NotImplemented)
    }

    fn channels(&self, _radio: bool) -> PvrResult<Vec<Channel>> {
        Err(PvrError::NotImplemented)
    }

    fn channel_group_count(&self) -> PvrResult<usize> {
        Err(PvrError::NotImplemented)
    }

    fn channel_groups(&self, _radio: bool) -> PvrResult<Vec<ChannelGroup>> {
        Err(PvrError::NotImplemented)
    }

    fn channel_group_members(&self, _group: &ChannelGroup) -> PvrResult<Vec<ChannelGroupMember>> {
        Err(PvrError::NotImplemented)
    }

    fn delete_channel(&self, _channel: &Channel) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn rename_channel(&self, _channel: &Channel) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn open_dialog_channel_scan(&self) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn open_dialog_channel_add(&self, _channel: &Channel) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn open_dialog_channel_settings(&self, _channel: &Channel) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    // --- Guide des programmes ---

    fn epg_for_channel(
        &self,
        _channel: &Channel,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
        _sink: &mut dyn EpgSink,
    ) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn set_epg_time_frame(&self, _days: u32) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn is_epg_tag_recordable(&self, _tag: &EpgTag) -> PvrResult<bool> {
        Err(PvrError::NotImplemented)
    }

    fn is_epg_tag_playable(&self, _tag: &EpgTag) -> PvrResult<bool> {
        Err(PvrError::NotImplemented)
    }

    // --- Enregistrements ---

    fn recording_count(&self, _deleted: bool) -> PvrResult<usize> {
        Err(PvrError::NotImplemented)
    }

    fn recordings(&self, _deleted: bool) -> PvrResult<Vec<Recording>> {
        Err(PvrError::NotImplemented)
    }

    fn delete_recording(&self, _recording: &Recording) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn undelete_recording(&self, _recording: &Recording) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn delete_all_recordings_from_trash(&self) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn rename_recording(&self, _recording: &Recording) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn set_recording_lifetime(&self, _recording: &Recording) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn set_recording_play_count(&self, _recording: &Recording, _count: u32) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn set_recording_last_played_position(
        &self,
        _recording: &Recording,
        _position: i32,
    ) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn recording_last_played_position(&self, _recording: &Recording) -> PvrResult<i32> {
        Err(PvrError::NotImplemented)
    }

    fn recording_edl(&self, _recording: &Recording) -> PvrResult<Vec<EdlEntry>> {
        Err(PvrError::NotImplemented)
    }

    // --- Timers ---

    fn timer_count(&self) -> PvrResult<usize> {
        Err(PvrError::NotImplemented)
    }

    fn timers(&self) -> PvrResult<Vec<Timer>> {
        Err(PvrError::NotImplemented)
    }

    fn add_timer(&self, _timer: &Timer) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn delete_timer(&self, _timer: &Timer, _force: bool) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn update_timer(&self, _timer: &Timer) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    // --- Flux ---

    fn open_live_stream(&self, _channel: &Channel) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn close_live_stream(&self) {}

    fn open_recorded_stream(&self, _recording: &Recording) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn close_recorded_stream(&self) {}

    fn read_stream(&self, _buffer: &mut [u8]) -> PvrResult<usize> {
        Err(PvrError::NotImplemented)
    }

    fn seek_stream(&self, _position: i64, _whence: SeekWhence) -> PvrResult<i64> {
        Err(PvrError::NotImplemented)
    }

    fn stream_position(&self) -> PvrResult<i64> {
        Err(PvrError::NotImplemented)
    }

    fn stream_length(&self) -> PvrResult<i64> {
        Err(PvrError::NotImplemented)
    }

    fn pause_stream(&self, _paused: bool) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn set_speed(&self, _speed: i32) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn can_pause_stream(&self) -> PvrResult<bool> {
        Err(PvrError::NotImplemented)
    }

    fn can_seek_stream(&self) -> PvrResult<bool> {
        Err(PvrError::NotImplemented)
    }

    fn is_timeshifting(&self) -> PvrResult<bool> {
        Err(PvrError::NotImplemented)
    }

    fn is_real_time_stream(&self) -> PvrResult<bool> {
        Err(PvrError::NotImplemented)
    }

    fn stream_times(&self) -> PvrResult<StreamTimes> {
        Err(PvrError::NotImplemented)
    }

    fn signal_status(&self) -> PvrResult<SignalStatus> {
        Err(PvrError::NotImplemented)
    }

    fn descramble_info(&self) -> PvrResult<DescrambleInfo> {
        Err(PvrError::NotImplemented)
    }

    fn stream_properties(&self) -> PvrResult<StreamProperties> {
        Err(PvrError::NotImplemented)
    }

    // --- Démultiplexeur ---

    fn demux_reset(&self) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn demux_abort(&self) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn demux_flush(&self) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn demux_read(&self) -> PvrResult<Option<DemuxPacket>> {
        Err(PvrError::NotImplemented)
    }

    // --- Divers ---

    fn call_menu_hook(&self, _hook: &MenuHook, _data: &MenuHookData) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn on_system_sleep(&self) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn on_system_wake(&self) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn on_power_saving_activated(&self) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }

    fn on_power_saving_deactivated(&self) -> PvrResult<()> {
        Err(PvrError::NotImplemented)
    }
}

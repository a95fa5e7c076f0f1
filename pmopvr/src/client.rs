//! One backend connection: lifecycle, cached backend metadata and the
//! operations it offers.
//!
//! Every operation goes through the client's [`CallGateway`], so readiness,
//! blocking and error logging are applied uniformly. The state mutex is never
//! held while the backend runs: a backend may report its connection state
//! from inside any call.

use std::sync::{Arc, Mutex, Weak};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::ClientId;
use crate::addons::{AddonInfo, InstalledAddon};
use crate::backend::{BackendConnection, ClientContext, ConnectionReporter, EpgSink};
use crate::capabilities::{BackendCapabilities, ClientCapabilities};
use crate::connection::ConnectionState;
use crate::edl::{self, EdlEntry};
use crate::errors::{AddonStatus, PvrError, PvrResult};
use crate::gateway::CallGateway;
use crate::ids::ClientIdTable;
use crate::menu_hooks::{MenuHook, MenuHookData, MenuHooks};
use crate::model::{
    BackendProperties, Channel, ChannelGroup, ChannelGroupMember, DemuxPacket, DescrambleInfo,
    DriveSpace, EpgTag, Recording, SeekWhence, SignalStatus, StreamProperties, StreamTimes, Timer,
    TIMER_TYPE_NONE, TimerType,
};
use crate::notifier::ConnectionStateNotifier;
use crate::playback::{PlaybackKind, PlaybackTarget, PlayingItem};
use crate::strings::{self, Localizer};

const UNKNOWN: &str = "unknown";

/// Creation progress of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientLifecycle {
    Uninitialized,
    Creating,
    Ready,
    Failed,
}

/// Services shared by every client of a registry.
#[derive(Clone)]
pub struct ClientServices {
    pub notifier: Arc<ConnectionStateNotifier>,
    pub ids: Arc<ClientIdTable>,
    pub localizer: Arc<dyn Localizer>,
    pub epg_max_days: u32,
}

struct ClientState {
    client_id: ClientId,
    lifecycle: ClientLifecycle,
    backend_name: String,
    backend_version: String,
    backend_hostname: String,
    connection_string: String,
    friendly_name: String,
    capabilities: Arc<ClientCapabilities>,
    menu_hooks: Arc<MenuHooks>,
    timer_types: Vec<TimerType>,
    connection_state: ConnectionState,
    previous_connection_state: ConnectionState,
    ignore_client: bool,
    priority: Option<i32>,
    playing: Option<PlayingItem>,
}

impl ClientState {
    fn new(client_id: ClientId) -> Self {
        Self {
            client_id,
            lifecycle: ClientLifecycle::Uninitialized,
            backend_name: UNKNOWN.to_string(),
            backend_version: UNKNOWN.to_string(),
            backend_hostname: UNKNOWN.to_string(),
            connection_string: UNKNOWN.to_string(),
            friendly_name: UNKNOWN.to_string(),
            capabilities: Arc::new(ClientCapabilities::default()),
            menu_hooks: Arc::new(MenuHooks::new()),
            timer_types: Vec::new(),
            connection_state: ConnectionState::Unknown,
            previous_connection_state: ConnectionState::Unknown,
            ignore_client: false,
            priority: None,
            playing: None,
        }
    }
}

/// Properties read from the backend during a refresh.
struct FetchedProperties {
    capabilities: BackendCapabilities,
    backend_name: String,
    backend_version: String,
    backend_hostname: String,
    connection_string: String,
    timer_types: Vec<TimerType>,
    menu_hooks: MenuHooks,
}

pub struct ClientHandle {
    addon: AddonInfo,
    backend: Arc<dyn BackendConnection>,
    gateway: CallGateway,
    services: ClientServices,
    this: Weak<ClientHandle>,
    state: Mutex<ClientState>,
}

impl ClientHandle {
    pub fn new(addon: InstalledAddon, services: ClientServices) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            addon: addon.info,
            backend: addon.backend,
            gateway: CallGateway::new(),
            services,
            this: this.clone(),
            state: Mutex::new(ClientState::new(ClientId::INVALID)),
        })
    }

    // ------------------------------------------------------------------
    // Cycle de vie
    // ------------------------------------------------------------------

    /// Creates the backend instance under `client_id` and reads its
    /// properties. The client is ready once both succeeded.
    pub fn create(&self, client_id: ClientId) -> AddonStatus {
        if !client_id.is_valid() {
            error!(addon = %self.addon.id, client_id = %client_id, "Invalid client id");
            return AddonStatus::Unknown;
        }

        self.reset_properties(client_id);
        self.set_lifecycle(ClientLifecycle::Creating);
        info!(addon = %self.addon.id, client_id = %client_id, "Creating PVR add-on instance");

        let context = ClientContext {
            client_id,
            addon_id: self.addon.id.clone(),
            epg_max_days: self.services.epg_max_days,
            reporter: ConnectionReporter::new(self.this.clone()),
        };
        let status = self.backend.create(&context);

        let ready = status.is_ok() && self.refresh_properties();
        self.gateway.set_ready(ready);
        self.set_lifecycle(if ready {
            ClientLifecycle::Ready
        } else {
            ClientLifecycle::Failed
        });

        if !ready {
            warn!(addon = %self.addon.id, status = %status, "PVR add-on instance not ready");
        }
        status
    }

    /// Releases the backend instance and forgets every cached property.
    /// Does nothing if the client is not ready.
    pub fn destroy(&self) {
        if !self.gateway.is_ready() {
            return;
        }
        self.gateway.set_ready(false);

        info!(addon = %self.addon.id, client_id = %self.client_id(), "Destroying PVR add-on instance");
        self.backend.destroy();
        self.reset_properties(ClientId::INVALID);
    }

    /// Destroys then creates the backend again under the same id.
    pub fn recreate(&self) -> AddonStatus {
        let client_id = self.client_id();
        self.destroy();
        self.create(client_id)
    }

    /// Rejects new calls until [`ClientHandle::continue_calls`]. Cached
    /// properties are kept.
    pub fn stop(&self) {
        self.gateway.block();
    }

    pub fn continue_calls(&self) {
        self.gateway.unblock();
    }

    fn reset_properties(&self, client_id: ClientId) {
        *self.state.lock().unwrap() = ClientState::new(client_id);
    }

    fn set_lifecycle(&self, lifecycle: ClientLifecycle) {
        self.state.lock().unwrap().lifecycle = lifecycle;
    }

    /// Re-reads capabilities, names, timer types and menu hooks from the
    /// backend. Returns false when the backend could not provide them.
    pub fn refresh_properties(&self) -> bool {
        match self.fetch_properties() {
            Some((fetched, complete)) => {
                self.store_properties(fetched);
                complete
            }
            None => false,
        }
    }

    fn fetch_properties(&self) -> Option<(FetchedProperties, bool)> {
        let name = self.friendly_name();
        let backend = self.backend.as_ref();

        let capabilities = self
            .gateway
            .invoke(&name, "capabilities", true, false, || backend.capabilities())
            .ok()?;

        let text = |function: &str, fetch: fn(&dyn BackendConnection) -> PvrResult<String>| {
            self.gateway
                .invoke(&name, function, true, false, || fetch(backend))
                .unwrap_or_else(|_| UNKNOWN.to_string())
        };
        let backend_name = text("backend_name", |b| b.backend_name());
        let backend_version = text("backend_version", |b| b.backend_version());
        let backend_hostname = text("backend_hostname", |b| b.backend_hostname());
        let connection_string = text("connection_string", |b| b.connection_string());

        let supports_epg = capabilities.supports_epg;
        let timer_types = self.gateway.invoke(
            &name,
            "timer_types",
            capabilities.supports_timers,
            false,
            || match backend.timer_types() {
                Err(PvrError::NotImplemented) => {
                    warn!(
                        client = %name,
                        "Add-on does not support timer types, using default types"
                    );
                    Ok(default_timer_types(supports_epg))
                }
                other => other,
            },
        );
        // Les timers sont optionnels
        let (timer_types, complete) = match timer_types {
            Ok(types) => (self.check_timer_types(types), true),
            Err(PvrError::NotImplemented) => (Vec::new(), true),
            Err(_) => (Vec::new(), false),
        };

        let menu_hooks = self
            .gateway
            .invoke(&name, "menu_hooks", true, false, || backend.menu_hooks())
            .map(MenuHooks::from_hooks)
            .unwrap_or_default();

        let fetched = FetchedProperties {
            capabilities,
            backend_name,
            backend_version,
            backend_hostname,
            connection_string,
            timer_types,
            menu_hooks,
        };
        Some((fetched, complete))
    }

    fn store_properties(&self, fetched: FetchedProperties) {
        let capabilities =
            ClientCapabilities::from_backend(fetched.capabilities, self.services.localizer.as_ref());

        let mut state = self.state.lock().unwrap();
        state.friendly_name = format!("{}:{}", fetched.backend_name, fetched.connection_string);
        state.backend_name = fetched.backend_name;
        state.backend_version = fetched.backend_version;
        state.backend_hostname = fetched.backend_hostname;
        state.connection_string = fetched.connection_string;
        state.capabilities = Arc::new(capabilities);
        state.timer_types = fetched.timer_types;
        state.menu_hooks = Arc::new(fetched.menu_hooks);
    }

    /// Drops timer types with the reserved id and gives a default
    /// description to those without one.
    fn check_timer_types(&self, types: Vec<TimerType>) -> Vec<TimerType> {
        types
            .into_iter()
            .filter_map(|mut timer_type| {
                if timer_type.id == TIMER_TYPE_NONE {
                    error!(addon = %self.addon.id, "Invalid timer type supplied by add-on");
                    return None;
                }
                if timer_type.description.is_empty() {
                    let id = match (timer_type.is_repeating(), timer_type.is_manual()) {
                        (true, true) => strings::MSG_TIMER_RULE,
                        (true, false) => strings::MSG_TIMER_RULE_GUIDE,
                        (false, true) => strings::MSG_TIMER_ONE_TIME,
                        (false, false) => strings::MSG_TIMER_ONE_TIME_GUIDE,
                    };
                    timer_type.description = self.services.localizer.localize(id);
                }
                Some(timer_type)
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Etat de connexion
    // ------------------------------------------------------------------

    /// Records a connection state reported by the backend and hands the
    /// transition to the notifier. A report equal to the current state is
    /// dropped.
    pub fn set_connection_state(
        &self,
        connection_string: &str,
        new: ConnectionState,
        message: Option<&str>,
    ) {
        let previous = {
            let mut state = self.state.lock().unwrap();
            let previous = state.connection_state;
            if previous == new {
                return;
            }
            state.previous_connection_state = previous;
            state.connection_state = new;

            if new == ConnectionState::Connected {
                state.ignore_client = false;
            } else if new == ConnectionState::Connecting && previous == ConnectionState::Unknown {
                // Le backend n'a encore jamais été joignable
                state.ignore_client = true;
            }
            previous
        };

        debug!(
            addon = %self.addon.id,
            connection = connection_string,
            previous = %previous,
            state = %new,
            "Connection state changed"
        );
        self.services
            .notifier
            .on_state_changed(self, connection_string, previous, new, message);
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state.lock().unwrap().connection_state
    }

    pub fn previous_connection_state(&self) -> ConnectionState {
        self.state.lock().unwrap().previous_connection_state
    }

    /// True while the backend has never been reachable since its creation.
    pub fn ignore_client(&self) -> bool {
        self.state.lock().unwrap().ignore_client
    }

    // ------------------------------------------------------------------
    // Accesseurs
    // ------------------------------------------------------------------

    pub fn addon(&self) -> &AddonInfo {
        &self.addon
    }

    pub fn addon_id(&self) -> &str {
        &self.addon.id
    }

    pub fn client_id(&self) -> ClientId {
        self.state.lock().unwrap().client_id
    }

    pub fn lifecycle(&self) -> ClientLifecycle {
        self.state.lock().unwrap().lifecycle
    }

    pub fn is_ready(&self) -> bool {
        self.gateway.is_ready()
    }

    pub fn is_blocked(&self) -> bool {
        self.gateway.is_blocked()
    }

    /// Ready and not blocked.
    pub fn calls_allowed(&self) -> bool {
        self.gateway.calls_allowed()
    }

    pub fn backend_name(&self) -> String {
        self.state.lock().unwrap().backend_name.clone()
    }

    pub fn backend_version(&self) -> String {
        self.state.lock().unwrap().backend_version.clone()
    }

    pub fn backend_hostname(&self) -> String {
        self.state.lock().unwrap().backend_hostname.clone()
    }

    pub fn connection_string(&self) -> String {
        self.state.lock().unwrap().connection_string.clone()
    }

    /// `"<backend name>:<connection string>"`
    pub fn friendly_name(&self) -> String {
        self.state.lock().unwrap().friendly_name.clone()
    }

    pub fn capabilities(&self) -> Arc<ClientCapabilities> {
        self.state.lock().unwrap().capabilities.clone()
    }

    pub fn menu_hooks(&self) -> Arc<MenuHooks> {
        self.state.lock().unwrap().menu_hooks.clone()
    }

    pub fn timer_types(&self) -> Vec<TimerType> {
        self.state.lock().unwrap().timer_types.clone()
    }

    /// Priority of the client, read once from the id table. 0 by default.
    pub fn priority(&self) -> i32 {
        let mut state = self.state.lock().unwrap();
        if let Some(priority) = state.priority {
            return priority;
        }
        if !state.client_id.is_valid() {
            return 0;
        }
        let priority = self.services.ids.priority(&self.addon.id).unwrap_or(0);
        state.priority = Some(priority);
        priority
    }

    pub fn set_priority(&self, priority: i32) {
        let persist = {
            let mut state = self.state.lock().unwrap();
            if state.priority == Some(priority) {
                return;
            }
            state.priority = Some(priority);
            state.client_id.is_valid()
        };
        if persist {
            self.services.ids.set_priority(&self.addon.id, priority);
        }
    }

    // ------------------------------------------------------------------
    // Appels backend
    // ------------------------------------------------------------------

    fn invoke<T, F>(&self, function: &str, implemented: bool, requires_ready: bool, f: F) -> PvrResult<T>
    where
        F: FnOnce(&dyn BackendConnection) -> PvrResult<T>,
    {
        let name = self.friendly_name();
        let backend = self.backend.as_ref();
        self.gateway
            .invoke(&name, function, implemented, requires_ready, || f(backend))
    }

    fn call<T, F>(&self, function: &str, implemented: bool, f: F) -> PvrResult<T>
    where
        F: FnOnce(&dyn BackendConnection) -> PvrResult<T>,
    {
        self.invoke(function, implemented, true, f)
    }

    pub fn drive_space(&self) -> PvrResult<DriveSpace> {
        self.call("drive_space", true, |b| b.drive_space())
    }

    /// Summary of the backend: names, item counts and disk usage in bytes.
    pub fn backend_properties(&self) -> BackendProperties {
        let (name, version, host, client_id) = {
            let state = self.state.lock().unwrap();
            (
                state.backend_name.clone(),
                state.backend_version.clone(),
                state.backend_hostname.clone(),
                state.client_id,
            )
        };
        let drive = self.drive_space().unwrap_or_default();
        BackendProperties {
            client_id,
            name,
            version,
            host,
            num_channels: self.channel_count().ok(),
            num_timers: self.timer_count().ok(),
            num_recordings: self.recording_count(false).ok(),
            num_deleted_recordings: self.recording_count(true).ok(),
            disk_used: drive.used_kib * 1024,
            disk_total: drive.total_kib * 1024,
        }
    }

    // --- Chaînes ---

    fn supports_channel_kind(&self, radio: bool) -> bool {
        let caps = self.capabilities();
        if radio {
            caps.supports_radio()
        } else {
            caps.supports_tv()
        }
    }

    pub fn can_play_channel(&self, channel: &Channel) -> bool {
        self.is_ready() && self.supports_channel_kind(channel.is_radio)
    }

    pub fn channel_count(&self) -> PvrResult<usize> {
        let caps = self.capabilities();
        let implemented = caps.supports_tv() || caps.supports_radio();
        self.call("channel_count", implemented, |b| b.channel_count())
    }

    pub fn channels(&self, radio: bool) -> PvrResult<Vec<Channel>> {
        let implemented = self.supports_channel_kind(radio);
        self.call("channels", implemented, |b| b.channels(radio))
    }

    pub fn channel_group_count(&self) -> PvrResult<usize> {
        let implemented = self.capabilities().supports_channel_groups();
        self.call("channel_group_count", implemented, |b| b.channel_group_count())
    }

    pub fn channel_groups(&self, radio: bool) -> PvrResult<Vec<ChannelGroup>> {
        let implemented = self.capabilities().supports_channel_groups();
        self.call("channel_groups", implemented, |b| b.channel_groups(radio))
    }

    pub fn channel_group_members(&self, group: &ChannelGroup) -> PvrResult<Vec<ChannelGroupMember>> {
        let implemented = self.capabilities().supports_channel_groups();
        self.call("channel_group_members", implemented, |b| {
            b.channel_group_members(group)
        })
    }

    pub fn delete_channel(&self, channel: &Channel) -> PvrResult<()> {
        let implemented = self.capabilities().supports_channel_settings();
        self.call("delete_channel", implemented, |b| b.delete_channel(channel))
    }

    pub fn rename_channel(&self, channel: &Channel) -> PvrResult<()> {
        let implemented = self.capabilities().supports_channel_settings();
        self.call("rename_channel", implemented, |b| b.rename_channel(channel))
    }

    pub fn open_dialog_channel_scan(&self) -> PvrResult<()> {
        let implemented = self.capabilities().supports_channel_scan();
        self.call("open_dialog_channel_scan", implemented, |b| {
            b.open_dialog_channel_scan()
        })
    }

    pub fn open_dialog_channel_add(&self, channel: &Channel) -> PvrResult<()> {
        let implemented = self.capabilities().supports_channel_settings();
        self.call("open_dialog_channel_add", implemented, |b| {
            b.open_dialog_channel_add(channel)
        })
    }

    pub fn open_dialog_channel_settings(&self, channel: &Channel) -> PvrResult<()> {
        let implemented = self.capabilities().supports_channel_settings();
        self.call("open_dialog_channel_settings", implemented, |b| {
            b.open_dialog_channel_settings(channel)
        })
    }

    // --- EPG ---

    pub fn epg_for_channel(
        &self,
        channel: &Channel,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        sink: &mut dyn EpgSink,
    ) -> PvrResult<()> {
        let implemented = self.capabilities().supports_epg();
        self.call("epg_for_channel", implemented, |b| {
            b.epg_for_channel(channel, start, end, sink)
        })
    }

    pub fn set_epg_time_frame(&self, days: u32) -> PvrResult<()> {
        let implemented = self.capabilities().supports_epg();
        self.call("set_epg_time_frame", implemented, |b| b.set_epg_time_frame(days))
    }

    pub fn is_recordable(&self, tag: &EpgTag) -> PvrResult<bool> {
        let implemented = self.capabilities().supports_epg();
        self.call("is_recordable", implemented, |b| b.is_epg_tag_recordable(tag))
    }

    pub fn is_playable(&self, tag: &EpgTag) -> PvrResult<bool> {
        let implemented = self.capabilities().supports_epg();
        self.call("is_playable", implemented, |b| b.is_epg_tag_playable(tag))
    }

    // --- Enregistrements ---

    fn supports_recording_list(&self, deleted: bool) -> bool {
        let caps = self.capabilities();
        caps.supports_recordings() && (!deleted || caps.supports_recordings_undelete())
    }

    pub fn recording_count(&self, deleted: bool) -> PvrResult<usize> {
        let implemented = self.supports_recording_list(deleted);
        self.call("recording_count", implemented, |b| b.recording_count(deleted))
    }

    pub fn recordings(&self, deleted: bool) -> PvrResult<Vec<Recording>> {
        let implemented = self.supports_recording_list(deleted);
        self.call("recordings", implemented, |b| b.recordings(deleted))
    }

    pub fn delete_recording(&self, recording: &Recording) -> PvrResult<()> {
        let implemented = self.capabilities().supports_recordings();
        self.call("delete_recording", implemented, |b| b.delete_recording(recording))
    }

    pub fn undelete_recording(&self, recording: &Recording) -> PvrResult<()> {
        let implemented = self.capabilities().supports_recordings_undelete();
        self.call("undelete_recording", implemented, |b| {
            b.undelete_recording(recording)
        })
    }

    pub fn delete_all_recordings_from_trash(&self) -> PvrResult<()> {
        let implemented = self.capabilities().supports_recordings_undelete();
        self.call("delete_all_recordings_from_trash", implemented, |b| {
            b.delete_all_recordings_from_trash()
        })
    }

    pub fn rename_recording(&self, recording: &Recording) -> PvrResult<()> {
        let implemented = self.capabilities().supports_recordings_rename();
        self.call("rename_recording", implemented, |b| b.rename_recording(recording))
    }

    pub fn set_recording_lifetime(&self, recording: &Recording) -> PvrResult<()> {
        let implemented = self.capabilities().supports_recordings_lifetime_change();
        self.call("set_recording_lifetime", implemented, |b| {
            b.set_recording_lifetime(recording)
        })
    }

    pub fn set_recording_play_count(&self, recording: &Recording, count: u32) -> PvrResult<()> {
        let implemented = self.capabilities().supports_recording_play_count();
        self.call("set_recording_play_count", implemented, |b| {
            b.set_recording_play_count(recording, count)
        })
    }

    pub fn set_recording_last_played_position(
        &self,
        recording: &Recording,
        position: i32,
    ) -> PvrResult<()> {
        let implemented = self.capabilities().supports_last_played_position();
        self.call("set_recording_last_played_position", implemented, |b| {
            b.set_recording_last_played_position(recording, position)
        })
    }

    pub fn recording_last_played_position(&self, recording: &Recording) -> PvrResult<i32> {
        let implemented = self.capabilities().supports_last_played_position();
        self.call("recording_last_played_position", implemented, |b| {
            b.recording_last_played_position(recording)
        })
    }

    pub fn recording_edl(&self, recording: &Recording) -> PvrResult<Vec<EdlEntry>> {
        let implemented = self.capabilities().supports_recording_edl();
        self.call("recording_edl", implemented, |b| b.recording_edl(recording))
            .map(edl::normalize)
    }

    // --- Timers ---

    pub fn timer_count(&self) -> PvrResult<usize> {
        let implemented = self.capabilities().supports_timers();
        self.call("timer_count", implemented, |b| b.timer_count())
    }

    pub fn timers(&self) -> PvrResult<Vec<Timer>> {
        let implemented = self.capabilities().supports_timers();
        self.call("timers", implemented, |b| b.timers())
    }

    pub fn add_timer(&self, timer: &Timer) -> PvrResult<()> {
        let implemented = self.capabilities().supports_timers();
        self.call("add_timer", implemented, |b| b.add_timer(timer))
    }

    pub fn update_timer(&self, timer: &Timer) -> PvrResult<()> {
        let implemented = self.capabilities().supports_timers();
        self.call("update_timer", implemented, |b| b.update_timer(timer))
    }

    /// Fails with [`PvrError::RecordingRunning`] when the timer is recording
    /// and `force` is false.
    pub fn delete_timer(&self, timer: &Timer, force: bool) -> PvrResult<()> {
        let implemented = self.capabilities().supports_timers();
        self.call("delete_timer", implemented, |b| b.delete_timer(timer, force))
    }

    // --- Flux ---

    /// Opens the live stream of `channel`, closing the current stream first.
    pub fn open_channel_stream(&self, channel: &Channel) -> PvrResult<()> {
        self.close_previous_stream();
        if !self.can_play_channel(channel) {
            debug!(addon = %self.addon.id, channel = %channel.name, "Add-on can not play channel");
            return Err(PvrError::ServerError);
        }
        self.call("open_channel_stream", true, |b| {
            debug!(channel = %channel.name, "Opening live stream");
            b.open_live_stream(channel)
        })
    }

    pub fn open_recording_stream(&self, recording: &Recording) -> PvrResult<()> {
        self.close_previous_stream();
        let implemented = self.capabilities().supports_recordings();
        self.call("open_recording_stream", implemented, |b| {
            b.open_recorded_stream(recording)
        })
    }

    /// Closes the stream of whatever this client plays.
    pub fn close_stream(&self) -> PvrResult<()> {
        self.call("close_stream", true, |b| {
            match self.playing_kind() {
                PlaybackKind::LiveTv => {
                    b.close_live_stream();
                    self.clear_playing(PlaybackKind::LiveTv);
                }
                PlaybackKind::Recording => {
                    b.close_recorded_stream();
                    self.clear_playing(PlaybackKind::Recording);
                }
                PlaybackKind::EpgTag | PlaybackKind::None => {}
            }
            Ok(())
        })
    }

    fn close_previous_stream(&self) {
        if let Err(err) = self.close_stream() {
            warn!(addon = %self.addon.id, error = %err, "Could not close previous stream");
        }
    }

    fn require_playing(&self) -> PvrResult<()> {
        if self.is_playing() {
            Ok(())
        } else {
            Err(PvrError::Failed)
        }
    }

    fn stream_call<T, F>(&self, function: &str, f: F) -> PvrResult<T>
    where
        F: FnOnce(&dyn BackendConnection) -> PvrResult<T>,
    {
        self.require_playing()?;
        let implemented = self.capabilities().handles_input_stream();
        self.call(function, implemented, f)
    }

    pub fn read_stream(&self, buffer: &mut [u8]) -> PvrResult<usize> {
        self.stream_call("read_stream", |b| b.read_stream(buffer))
    }

    pub fn seek_stream(&self, position: i64, whence: SeekWhence) -> PvrResult<i64> {
        self.stream_call("seek_stream", |b| b.seek_stream(position, whence))
    }

    pub fn stream_position(&self) -> PvrResult<i64> {
        self.stream_call("stream_position", |b| b.stream_position())
    }

    pub fn stream_length(&self) -> PvrResult<i64> {
        self.stream_call("stream_length", |b| b.stream_length())
    }

    pub fn pause_stream(&self, paused: bool) -> PvrResult<()> {
        self.stream_call("pause_stream", |b| b.pause_stream(paused))
    }

    pub fn set_speed(&self, speed: i32) -> PvrResult<()> {
        self.stream_call("set_speed", |b| b.set_speed(speed))
    }

    pub fn can_pause_stream(&self) -> PvrResult<bool> {
        self.stream_call("can_pause_stream", |b| b.can_pause_stream())
    }

    pub fn can_seek_stream(&self) -> PvrResult<bool> {
        self.stream_call("can_seek_stream", |b| b.can_seek_stream())
    }

    pub fn is_timeshifting(&self) -> PvrResult<bool> {
        self.stream_call("is_timeshifting", |b| b.is_timeshifting())
    }

    pub fn is_real_time_stream(&self) -> PvrResult<bool> {
        self.stream_call("is_real_time_stream", |b| b.is_real_time_stream())
    }

    pub fn stream_times(&self) -> PvrResult<StreamTimes> {
        self.require_playing()?;
        self.call("stream_times", true, |b| b.stream_times())
    }

    pub fn signal_status(&self) -> PvrResult<SignalStatus> {
        self.call("signal_status", true, |b| b.signal_status())
    }

    pub fn descramble_info(&self) -> PvrResult<DescrambleInfo> {
        let implemented = self.capabilities().supports_descramble_info();
        self.call("descramble_info", implemented, |b| b.descramble_info())
    }

    pub fn stream_properties(&self) -> PvrResult<StreamProperties> {
        self.call("stream_properties", true, |b| b.stream_properties())
    }

    // --- Démultiplexeur ---

    pub fn demux_reset(&self) -> PvrResult<()> {
        let implemented = self.capabilities().handles_demuxing();
        self.call("demux_reset", implemented, |b| b.demux_reset())
    }

    pub fn demux_abort(&self) -> PvrResult<()> {
        let implemented = self.capabilities().handles_demuxing();
        self.call("demux_abort", implemented, |b| b.demux_abort())
    }

    pub fn demux_flush(&self) -> PvrResult<()> {
        let implemented = self.capabilities().handles_demuxing();
        self.call("demux_flush", implemented, |b| b.demux_flush())
    }

    pub fn demux_read(&self) -> PvrResult<Option<DemuxPacket>> {
        let implemented = self.capabilities().handles_demuxing();
        self.call("demux_read", implemented, |b| b.demux_read())
    }

    // --- Menus et énergie ---

    /// Runs `hook` on `data`. The hook is passed with the category of the
    /// item it runs on.
    pub fn call_menu_hook(&self, hook: &MenuHook, data: &MenuHookData) -> PvrResult<()> {
        let hook = MenuHook {
            category: data.category(),
            ..hook.clone()
        };
        self.call("call_menu_hook", true, |b| b.call_menu_hook(&hook, data))
    }

    pub fn on_system_sleep(&self) -> PvrResult<()> {
        self.call("on_system_sleep", true, |b| b.on_system_sleep())
    }

    pub fn on_system_wake(&self) -> PvrResult<()> {
        self.call("on_system_wake", true, |b| b.on_system_wake())
    }

    pub fn on_power_saving_activated(&self) -> PvrResult<()> {
        self.call("on_power_saving_activated", true, |b| {
            b.on_power_saving_activated()
        })
    }

    pub fn on_power_saving_deactivated(&self) -> PvrResult<()> {
        self.call("on_power_saving_deactivated", true, |b| {
            b.on_power_saving_deactivated()
        })
    }

    // ------------------------------------------------------------------
    // Lecture en cours sur ce client
    // ------------------------------------------------------------------

    fn playing_kind(&self) -> PlaybackKind {
        self.state
            .lock()
            .unwrap()
            .playing
            .as_ref()
            .map_or(PlaybackKind::None, PlayingItem::kind)
    }

    pub fn is_playing(&self) -> bool {
        self.playing_kind() != PlaybackKind::None
    }

    pub fn is_playing_live_tv(&self) -> bool {
        self.playing_channel().is_some_and(|c| !c.is_radio)
    }

    pub fn is_playing_live_radio(&self) -> bool {
        self.playing_channel().is_some_and(|c| c.is_radio)
    }

    pub fn is_playing_encrypted_channel(&self) -> bool {
        self.playing_channel().is_some_and(|c| c.is_encrypted())
    }

    pub fn is_playing_recording(&self) -> bool {
        self.playing_kind() == PlaybackKind::Recording
    }

    pub fn playing_channel(&self) -> Option<Channel> {
        match &self.state.lock().unwrap().playing {
            Some(PlayingItem::Channel(channel)) => Some(channel.clone()),
            _ => None,
        }
    }

    pub fn playing_recording(&self) -> Option<Recording> {
        match &self.state.lock().unwrap().playing {
            Some(PlayingItem::Recording(recording)) => Some(recording.clone()),
            _ => None,
        }
    }

    pub fn playing_epg_tag(&self) -> Option<EpgTag> {
        match &self.state.lock().unwrap().playing {
            Some(PlayingItem::EpgTag(tag)) => Some(tag.clone()),
            _ => None,
        }
    }
}

impl PlaybackTarget for ClientHandle {
    fn client_id(&self) -> ClientId {
        ClientHandle::client_id(self)
    }

    fn friendly_name(&self) -> String {
        ClientHandle::friendly_name(self)
    }

    fn set_playing(&self, item: &PlayingItem) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.state.lock().unwrap().playing = Some(item.clone());
        true
    }

    fn clear_playing(&self, kind: PlaybackKind) {
        let mut state = self.state.lock().unwrap();
        if state.playing.as_ref().is_some_and(|item| item.kind() == kind) {
            state.playing = None;
        }
    }
}

/// Timer types offered for backends that predate timer types: manual one
/// time, manual rule, and guide-based one time when the backend has an EPG.
pub fn default_timer_types(supports_epg: bool) -> Vec<TimerType> {
    use crate::model::TimerTypeAttributes as A;

    let common = A::SUPPORTS_ENABLE_DISABLE
        | A::SUPPORTS_CHANNELS
        | A::SUPPORTS_START_TIME
        | A::SUPPORTS_END_TIME
        | A::SUPPORTS_PRIORITY
        | A::SUPPORTS_LIFETIME
        | A::SUPPORTS_RECORDING_FOLDERS;

    let mut types = vec![
        TimerType::new(1, A::IS_MANUAL | common),
        TimerType::new(
            2,
            A::IS_MANUAL | A::IS_REPEATING | A::SUPPORTS_FIRST_DAY | A::SUPPORTS_WEEKDAYS | common,
        ),
    ];
    if supports_epg {
        types.push(TimerType::new(3, A::REQUIRES_EPG_TAG_ON_CREATE | common));
    }
    types
}

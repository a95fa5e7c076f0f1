//! Registry of PVR clients.
//!
//! The registry owns the id -> [`ClientHandle`] map, keeps it in line with
//! the installed and enabled add-ons, and routes every client operation
//! either to one client, to all usable clients, or to the client owning the
//! playing item.
//!
//! The map lock only protects lookups: handles are cloned out of the map and
//! the lock is released before any backend call, so a backend may call back
//! into the registry at any time.

use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use chrono::{DateTime, Utc};
use crossbeam_channel::Receiver;
use tracing::{debug, error, info, warn};

use crate::ClientId;
use crate::addons::{AddonEvent, AddonManager, InstalledAddon, PvrSubsystem};
use crate::backend::EpgSink;
use crate::client::{ClientHandle, ClientServices};
use crate::config::PvrConfig;
use crate::connection::ConnectionState;
use crate::edl::EdlEntry;
use crate::errors::{ClientsError, PvrError, PvrResult};
use crate::events::{EventSeverity, EventSink, PvrEvent};
use crate::ids::ClientIdTable;
use crate::menu_hooks::{MenuHook, MenuHookData, MenuHooks};
use crate::model::{
    BackendProperties, Channel, ChannelGroup, ChannelGroupMember, DemuxPacket, DescrambleInfo,
    EpgTag, Recording, SeekWhence, SignalStatus, StreamProperties, StreamTimes, Timer, TimerType,
};
use crate::notifier::ConnectionStateNotifier;
use crate::playback::{PlaybackKind, PlaybackStateTracker, PlaybackTarget, PlayingItem};
use crate::strings::{self, Localizer};

/// Tunables of the registry, usually read from [`PvrConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySettings {
    pub epg_max_days: u32,
    pub toast_duration_ms: u64,
    pub notify_connection_changes: bool,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            epg_max_days: 3,
            toast_duration_ms: 5000,
            notify_connection_changes: true,
        }
    }
}

impl RegistrySettings {
    pub fn from_config(config: &PvrConfig) -> anyhow::Result<Self> {
        Ok(Self {
            epg_max_days: config.get_epg_future_days()? as u32,
            toast_duration_ms: config.get_toast_duration_ms()? as u64,
            notify_connection_changes: config.get_notify_connection_changes()?,
        })
    }
}

/// External services the registry works with.
#[derive(Clone)]
pub struct RegistryServices {
    pub addons: Arc<dyn AddonManager>,
    pub subsystem: Arc<dyn PvrSubsystem>,
    pub events: Arc<dyn EventSink>,
    pub localizer: Arc<dyn Localizer>,
}

/// Outcome of an operation run on every usable client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOutReport {
    /// True when every invoked client succeeded (or had nothing to do).
    pub succeeded: bool,
    /// Clients whose data is missing: failed calls and clients known but
    /// not ready. Ascending order.
    pub failed: Vec<ClientId>,
}

impl FanOutReport {
    pub fn is_complete(&self) -> bool {
        self.succeeded && self.failed.is_empty()
    }
}

pub struct ClientRegistry {
    clients: Mutex<BTreeMap<ClientId, Arc<ClientHandle>>>,
    /// Serializes [`ClientRegistry::update_addons`] runs.
    update_lock: Mutex<()>,
    playback: PlaybackStateTracker,
    addons: Arc<dyn AddonManager>,
    subsystem: Arc<dyn PvrSubsystem>,
    events: Arc<dyn EventSink>,
    client_services: ClientServices,
    settings: RegistrySettings,
}

impl ClientRegistry {
    pub fn new(services: RegistryServices, ids: ClientIdTable, settings: RegistrySettings) -> Self {
        let notifier = ConnectionStateNotifier::new(
            services.events.clone(),
            services.localizer.clone(),
            services.subsystem.clone(),
        )
        .with_user_notifications(settings.notify_connection_changes)
        .with_display_ms(settings.toast_duration_ms);

        let client_services = ClientServices {
            notifier: Arc::new(notifier),
            ids: Arc::new(ids),
            localizer: services.localizer,
            epg_max_days: settings.epg_max_days,
        };

        Self {
            clients: Mutex::new(BTreeMap::new()),
            update_lock: Mutex::new(()),
            playback: PlaybackStateTracker::new(),
            addons: services.addons,
            subsystem: services.subsystem,
            events: services.events,
            client_services,
            settings,
        }
    }

    /// Builds a registry from the configuration: settings plus the
    /// persisted client id table.
    pub fn from_config(config: &PvrConfig, services: RegistryServices) -> anyhow::Result<Self> {
        let settings = RegistrySettings::from_config(config)?;
        let ids = ClientIdTable::open(config.get_client_id_table_path()?)?;
        Ok(Self::new(services, ids, settings))
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    pub fn client_ids(&self) -> &ClientIdTable {
        &self.client_services.ids
    }

    // ------------------------------------------------------------------
    // Cycle de vie des clients
    // ------------------------------------------------------------------

    /// Creates the clients of every enabled add-on.
    pub fn start(&self) {
        self.update_addons(None);
    }

    /// Blocks new calls on every client.
    pub fn stop(&self) {
        for client in self.known_clients() {
            client.stop();
        }
    }

    pub fn continue_calls(&self) {
        for client in self.known_clients() {
            client.continue_calls();
        }
    }

    /// Reconciles the clients with the installed add-ons.
    ///
    /// Enabled add-ons without a ready client are created, ready clients of
    /// disabled add-ons are destroyed, and the client of `changed` is
    /// recreated when it stays enabled. The batch runs between a stop and a
    /// start of the PVR subsystem. Concurrent runs wait for each other.
    pub fn update_addons(&self, changed: Option<&str>) {
        let _update = self.update_lock.lock().unwrap();
        let addons = self.addons.installed_addons();
        if addons.is_empty() {
            return;
        }

        if let Some(changed) = changed {
            if !addons.iter().any(|addon| addon.info.id == changed) {
                debug!(addon = changed, "Changed add-on is not a PVR client");
                return;
            }
        }

        // L'attribution d'un id peut écrire la table sur disque
        let with_status: Vec<(InstalledAddon, bool, Option<ClientId>)> = addons
            .into_iter()
            .map(|addon| {
                let enabled = !self.addons.is_addon_disabled(&addon.info.id);
                let client_id = if enabled {
                    Some(self.client_services.ids.id_for(&addon.info.id))
                } else {
                    self.client_services.ids.lookup(&addon.info.id)
                };
                (addon, enabled, client_id)
            })
            .collect();

        let mut to_create: Vec<(ClientId, Arc<ClientHandle>)> = Vec::new();
        let mut to_recreate: Vec<String> = Vec::new();
        let mut to_destroy: Vec<String> = Vec::new();

        {
            let clients = self.clients.lock().unwrap();
            for (addon, enabled, client_id) in with_status {
                let addon_id = addon.info.id.clone();
                let known = client_id.and_then(|id| clients.get(&id).cloned());
                let created = known.as_ref().is_some_and(|client| client.is_ready());

                if enabled && !created {
                    let Some(client_id) = client_id else {
                        continue;
                    };
                    let client = known.unwrap_or_else(|| {
                        ClientHandle::new(addon, self.client_services.clone())
                    });
                    to_create.push((client_id, client));
                } else if created {
                    if !enabled {
                        to_destroy.push(addon_id);
                    } else if changed == Some(addon_id.as_str()) {
                        to_recreate.push(addon_id);
                    }
                }
            }
        }

        if to_create.is_empty() && to_recreate.is_empty() && to_destroy.is_empty() {
            return;
        }

        info!(
            create = to_create.len(),
            recreate = to_recreate.len(),
            destroy = to_destroy.len(),
            "Updating PVR clients"
        );
        self.subsystem.stop();

        for (client_id, client) in &to_create {
            let status = client.create(*client_id);
            if status.is_ok() {
                continue;
            }

            error!(addon = %client.addon_id(), status = %status, "Failed to create add-on");
            if status.is_permanent_failure() {
                let addon = client.addon();
                self.addons.disable_addon(&addon.id);
                self.events.post(PvrEvent {
                    notify_user: true,
                    severity: EventSeverity::Error,
                    label: addon.name.clone(),
                    message: self
                        .client_services
                        .localizer
                        .localize(strings::MSG_ADDON_DISABLED),
                    icon: addon.icon.clone(),
                    display_ms: self.settings.toast_duration_ms,
                });
            }
        }

        for addon_id in &to_recreate {
            self.stop_client(addon_id, true);
        }

        for addon_id in &to_destroy {
            self.stop_client(addon_id, false);
        }

        if !to_create.is_empty() {
            let mut clients = self.clients.lock().unwrap();
            for (client_id, client) in to_create {
                clients.entry(client_id).or_insert(client);
            }
        }

        self.subsystem.start();
    }

    /// Stops the client of `addon_id`: recreated when `restart`, otherwise
    /// removed from the registry and destroyed. Any playback is stopped
    /// first. Returns false if no client belongs to the add-on.
    pub fn stop_client(&self, addon_id: &str, restart: bool) -> bool {
        let Some((client_id, client)) = self.client_entry_by_addon(addon_id) else {
            return false;
        };

        if self.playback.is_playing() {
            self.subsystem.stop_playback();
            if self.playback.playing_client_id() == Some(client_id) {
                self.playback.clear_all(|id| self.playback_target(id));
            }
        }

        if restart {
            info!(addon = addon_id, client_id = %client_id, "Restarting PVR client");
            client.recreate();
        } else {
            info!(addon = addon_id, client_id = %client_id, "Stopping PVR client");
            self.clients.lock().unwrap().remove(&client_id);
            client.destroy();
        }
        true
    }

    pub fn request_restart(&self, addon_id: &str) -> bool {
        self.stop_client(addon_id, true)
    }

    /// Entry point for backends reporting a connection state change.
    pub fn on_connection_state_changed(
        &self,
        client_id: ClientId,
        connection_string: &str,
        state: ConnectionState,
        message: Option<&str>,
    ) {
        match self.get_client(client_id) {
            Some(client) => client.set_connection_state(connection_string, state, message),
            None => error!(client_id = %client_id, "Connection state change for an unknown client"),
        }
    }

    /// Spawns the thread turning add-on enable/disable events into
    /// [`ClientRegistry::update_addons`] calls. The thread ends when the
    /// sending side of `events` is dropped.
    pub fn spawn_addon_event_worker(
        self: &Arc<Self>,
        events: Receiver<AddonEvent>,
    ) -> io::Result<JoinHandle<()>> {
        let registry = Arc::clone(self);
        thread::Builder::new()
            .name("pvr-addon-events".into())
            .spawn(move || {
                for event in events.iter() {
                    match event.enablement_change() {
                        Some(addon_id) => {
                            debug!(addon = addon_id, "Add-on enablement changed");
                            registry.update_addons(Some(addon_id));
                        }
                        None => debug!(event = ?event, "Ignoring add-on event"),
                    }
                }
                debug!("Add-on event channel closed");
            })
    }

    // ------------------------------------------------------------------
    // Recherche
    // ------------------------------------------------------------------

    fn client_entry_by_addon(&self, addon_id: &str) -> Option<(ClientId, Arc<ClientHandle>)> {
        let clients = self.clients.lock().unwrap();
        clients
            .iter()
            .find(|(_, client)| client.addon_id() == addon_id)
            .map(|(id, client)| (*id, client.clone()))
    }

    /// Any known client, ready or not.
    pub fn get_client(&self, client_id: ClientId) -> Option<Arc<ClientHandle>> {
        self.clients.lock().unwrap().get(&client_id).cloned()
    }

    pub fn get_client_by_addon(&self, addon_id: &str) -> Option<Arc<ClientHandle>> {
        self.client_entry_by_addon(addon_id).map(|(_, client)| client)
    }

    /// Id of the known client of `addon_id`, `None` for unknown add-ons.
    pub fn get_client_id(&self, addon_id: &str) -> Option<ClientId> {
        self.client_entry_by_addon(addon_id).map(|(id, _)| id)
    }

    pub fn is_known_client(&self, addon_id: &str) -> bool {
        self.client_entry_by_addon(addon_id).is_some()
    }

    /// Ready client with this id.
    pub fn get_created_client(&self, client_id: ClientId) -> Option<Arc<ClientHandle>> {
        self.get_client(client_id).filter(|client| client.is_ready())
    }

    pub fn is_created_client(&self, client_id: ClientId) -> bool {
        self.get_created_client(client_id).is_some()
    }

    fn usable_client(&self, client_id: ClientId) -> Option<Arc<ClientHandle>> {
        self.get_created_client(client_id)
            .filter(|client| !client.ignore_client())
    }

    pub fn known_clients(&self) -> Vec<Arc<ClientHandle>> {
        self.clients.lock().unwrap().values().cloned().collect()
    }

    /// Ready clients that are not ignored, by ascending id, and the ids of
    /// known clients that are not ready.
    fn created_clients_snapshot(&self) -> (Vec<(ClientId, Arc<ClientHandle>)>, Vec<ClientId>) {
        let clients = self.clients.lock().unwrap();
        let mut usable = Vec::new();
        let mut not_ready = Vec::new();
        for (id, client) in clients.iter() {
            if client.is_ready() {
                if !client.ignore_client() {
                    usable.push((*id, client.clone()));
                }
            } else {
                not_ready.push(*id);
            }
        }
        (usable, not_ready)
    }

    pub fn created_clients(&self) -> Vec<Arc<ClientHandle>> {
        self.created_clients_snapshot()
            .0
            .into_iter()
            .map(|(_, client)| client)
            .collect()
    }

    pub fn created_client_amount(&self) -> usize {
        let clients = self.clients.lock().unwrap();
        clients.values().filter(|client| client.is_ready()).count()
    }

    pub fn has_created_clients(&self) -> bool {
        let clients = self.clients.lock().unwrap();
        clients
            .values()
            .any(|client| client.is_ready() && !client.ignore_client())
    }

    pub fn first_created_client_id(&self) -> Option<ClientId> {
        let clients = self.clients.lock().unwrap();
        clients
            .iter()
            .find(|(_, client)| client.is_ready())
            .map(|(id, _)| *id)
    }

    /// Installed add-ons that are not disabled.
    pub fn enabled_client_amount(&self) -> usize {
        self.addons
            .installed_addons()
            .iter()
            .filter(|addon| !self.addons.is_addon_disabled(&addon.info.id))
            .count()
    }

    pub fn client_friendly_name(&self, client_id: ClientId) -> Option<String> {
        self.get_created_client(client_id)
            .map(|client| client.friendly_name())
    }

    pub fn client_addon_name(&self, client_id: ClientId) -> Option<String> {
        self.get_client(client_id)
            .map(|client| client.addon().name.clone())
    }

    pub fn client_addon_icon(&self, client_id: ClientId) -> Option<String> {
        self.get_client(client_id)
            .map(|client| client.addon().icon.clone())
    }

    pub fn client_addon_id(&self, client_id: ClientId) -> Option<String> {
        self.get_client(client_id)
            .map(|client| client.addon_id().to_string())
    }

    // ------------------------------------------------------------------
    // Répartition des appels
    // ------------------------------------------------------------------

    /// Runs `op` on the ready, non-ignored client `client_id`.
    pub fn for_created_client<T, F>(
        &self,
        function: &str,
        client_id: ClientId,
        op: F,
    ) -> Result<T, ClientsError>
    where
        F: FnOnce(&ClientHandle) -> PvrResult<T>,
    {
        let Some(client) = self.usable_client(client_id) else {
            error!(function = function, client_id = %client_id, "No created client with id");
            return Err(ClientsError::ClientNotFound(client_id));
        };

        op(&client).map_err(ClientsError::from)
    }

    /// Runs `op` on every ready, non-ignored client, in ascending id order.
    ///
    /// A failing client does not stop the others. "Not implemented" is not
    /// a failure.
    pub fn for_created_clients<F>(&self, function: &str, mut op: F) -> FanOutReport
    where
        F: FnMut(&ClientHandle) -> PvrResult<()>,
    {
        let (clients, mut failed) = self.created_clients_snapshot();
        let mut succeeded = true;

        for (client_id, client) in clients {
            match op(&client) {
                Ok(()) | Err(PvrError::NotImplemented) => {}
                Err(_) => {
                    succeeded = false;
                    failed.push(client_id);
                }
            }
        }

        failed.sort();
        if !failed.is_empty() {
            debug!(function = function, failed = ?failed, "Fan-out incomplete");
        }
        FanOutReport { succeeded, failed }
    }

    /// Runs `op` on the client owning the playing item.
    pub fn for_playing_client<T, F>(&self, function: &str, op: F) -> Result<T, ClientsError>
    where
        F: FnOnce(&ClientHandle) -> PvrResult<T>,
    {
        let Some(client_id) = self.playback.playing_client_id() else {
            return Err(ClientsError::NotPlaying);
        };
        self.for_created_client(function, client_id, op)
    }

    fn collect_from_clients<T, F>(&self, function: &str, mut fetch: F) -> (Vec<T>, FanOutReport)
    where
        F: FnMut(&ClientHandle) -> PvrResult<Vec<T>>,
    {
        let mut items = Vec::new();
        let report = self.for_created_clients(function, |client| {
            items.extend(fetch(client)?);
            Ok(())
        });
        (items, report)
    }

    // ------------------------------------------------------------------
    // Lecture en cours
    // ------------------------------------------------------------------

    fn playback_target(&self, client_id: ClientId) -> Option<Arc<dyn PlaybackTarget>> {
        self.get_created_client(client_id)
            .map(|client| client as Arc<dyn PlaybackTarget>)
    }

    pub fn playback(&self) -> &PlaybackStateTracker {
        &self.playback
    }

    pub fn set_playing_channel(&self, channel: Channel) -> bool {
        self.playback
            .set_playing(PlayingItem::Channel(channel), |id| self.playback_target(id))
    }

    pub fn set_playing_recording(&self, recording: Recording) -> bool {
        self.playback
            .set_playing(PlayingItem::Recording(recording), |id| self.playback_target(id))
    }

    pub fn set_playing_epg_tag(&self, tag: EpgTag) -> bool {
        self.playback
            .set_playing(PlayingItem::EpgTag(tag), |id| self.playback_target(id))
    }

    pub fn clear_playing_channel(&self) {
        self.playback
            .clear(PlaybackKind::LiveTv, |id| self.playback_target(id));
    }

    pub fn clear_playing_recording(&self) {
        self.playback
            .clear(PlaybackKind::Recording, |id| self.playback_target(id));
    }

    pub fn clear_playing_epg_tag(&self) {
        self.playback
            .clear(PlaybackKind::EpgTag, |id| self.playback_target(id));
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn is_playing_live_tv(&self) -> bool {
        self.playback.is_playing_live_tv()
    }

    pub fn is_playing_radio(&self) -> bool {
        self.playing_channel().is_some_and(|channel| channel.is_radio)
    }

    pub fn is_playing_recording(&self) -> bool {
        self.playback.is_playing_recording()
    }

    pub fn is_playing_epg_tag(&self) -> bool {
        self.playback.is_playing_epg_tag()
    }

    pub fn playing_client_id(&self) -> Option<ClientId> {
        self.playback.playing_client_id()
    }

    pub fn playing_client(&self) -> Option<Arc<ClientHandle>> {
        self.playing_client_id()
            .and_then(|id| self.get_created_client(id))
    }

    pub fn playing_client_name(&self) -> Option<String> {
        self.playback.playing_client_name()
    }

    pub fn playing_channel(&self) -> Option<Channel> {
        match self.playback.playing_item() {
            Some(PlayingItem::Channel(channel)) => Some(channel),
            _ => None,
        }
    }

    pub fn playing_recording(&self) -> Option<Recording> {
        match self.playback.playing_item() {
            Some(PlayingItem::Recording(recording)) => Some(recording),
            _ => None,
        }
    }

    pub fn playing_epg_tag(&self) -> Option<EpgTag> {
        match self.playback.playing_item() {
            Some(PlayingItem::EpgTag(tag)) => Some(tag),
            _ => None,
        }
    }

    /// True when a timer of the playing client is recording the playing
    /// channel.
    pub fn is_recording_on_playing_channel(&self) -> bool {
        let Some(channel) = self.playing_channel() else {
            return false;
        };
        self.for_playing_client("is_recording_on_playing_channel", |client| {
            client.timers()
        })
        .map(|timers| {
            timers.iter().any(|timer| {
                timer.is_recording() && timer.channel_unique_id == Some(channel.unique_id)
            })
        })
        .unwrap_or(false)
    }

    pub fn can_record_instantly(&self) -> bool {
        self.playing_channel().is_some()
            && self
                .playing_client()
                .is_some_and(|client| client.capabilities().supports_timers())
    }

    // ------------------------------------------------------------------
    // Flux
    // ------------------------------------------------------------------

    /// Opens the live stream of `channel` and marks it playing.
    pub fn open_channel_stream(&self, channel: &Channel) -> Result<(), ClientsError> {
        self.close_stream();
        self.for_created_client("open_channel_stream", channel.client_id, |client| {
            client.open_channel_stream(channel)
        })?;
        if !self.set_playing_channel(channel.clone()) {
            warn!(channel = %channel.name, "Opened channel could not be marked playing");
        }
        Ok(())
    }

    pub fn open_recording_stream(&self, recording: &Recording) -> Result<(), ClientsError> {
        self.close_stream();
        self.for_created_client("open_recording_stream", recording.client_id, |client| {
            client.open_recording_stream(recording)
        })?;
        if !self.set_playing_recording(recording.clone()) {
            warn!(recording = %recording.title, "Opened recording could not be marked playing");
        }
        Ok(())
    }

    /// Closes the playing stream, if any, and clears the playing item.
    pub fn close_stream(&self) {
        if !self.is_playing() {
            return;
        }
        if let Err(err) = self.for_playing_client("close_stream", |client| client.close_stream()) {
            debug!(error = %err, "Closing stream failed");
        }
        self.playback.clear_all(|id| self.playback_target(id));
    }

    pub fn read_stream(&self, buffer: &mut [u8]) -> Result<usize, ClientsError> {
        self.for_playing_client("read_stream", |client| client.read_stream(buffer))
    }

    pub fn seek_stream(&self, position: i64, whence: SeekWhence) -> Result<i64, ClientsError> {
        self.for_playing_client("seek_stream", |client| {
            client.seek_stream(position, whence)
        })
    }

    pub fn stream_position(&self) -> Result<i64, ClientsError> {
        self.for_playing_client("stream_position", |client| client.stream_position())
    }

    pub fn stream_length(&self) -> Result<i64, ClientsError> {
        self.for_playing_client("stream_length", |client| client.stream_length())
    }

    pub fn pause_stream(&self, paused: bool) -> Result<(), ClientsError> {
        self.for_playing_client("pause_stream", |client| client.pause_stream(paused))
    }

    pub fn set_speed(&self, speed: i32) -> Result<(), ClientsError> {
        self.for_playing_client("set_speed", |client| client.set_speed(speed))
    }

    /// Recordings can always be paused.
    pub fn can_pause_stream(&self) -> bool {
        if self.is_playing_recording() {
            return true;
        }
        self.for_playing_client("can_pause_stream", |client| client.can_pause_stream())
            .unwrap_or(false)
    }

    /// Recordings can always be seeked.
    pub fn can_seek_stream(&self) -> bool {
        if self.is_playing_recording() {
            return true;
        }
        self.for_playing_client("can_seek_stream", |client| client.can_seek_stream())
            .unwrap_or(false)
    }

    pub fn is_timeshifting(&self) -> bool {
        self.for_playing_client("is_timeshifting", |client| client.is_timeshifting())
            .unwrap_or(false)
    }

    pub fn is_real_time_stream(&self) -> bool {
        self.for_playing_client("is_real_time_stream", |client| {
            client.is_real_time_stream()
        })
        .unwrap_or(false)
    }

    pub fn stream_times(&self) -> Result<StreamTimes, ClientsError> {
        self.for_playing_client("stream_times", |client| client.stream_times())
    }

    pub fn signal_status(&self) -> Result<SignalStatus, ClientsError> {
        self.for_playing_client("signal_status", |client| client.signal_status())
    }

    pub fn descramble_info(&self) -> Result<DescrambleInfo, ClientsError> {
        self.for_playing_client("descramble_info", |client| client.descramble_info())
    }

    pub fn stream_properties(&self) -> Result<StreamProperties, ClientsError> {
        self.for_playing_client("stream_properties", |client| {
            client.stream_properties()
        })
    }

    pub fn demux_reset(&self) -> Result<(), ClientsError> {
        self.for_playing_client("demux_reset", |client| client.demux_reset())
    }

    pub fn demux_abort(&self) -> Result<(), ClientsError> {
        self.for_playing_client("demux_abort", |client| client.demux_abort())
    }

    pub fn demux_flush(&self) -> Result<(), ClientsError> {
        self.for_playing_client("demux_flush", |client| client.demux_flush())
    }

    pub fn demux_read(&self) -> Result<Option<DemuxPacket>, ClientsError> {
        self.for_playing_client("demux_read", |client| client.demux_read())
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    pub fn supports_timers(&self) -> bool {
        self.created_clients()
            .iter()
            .any(|client| client.capabilities().supports_timers())
    }

    pub fn get_timers(&self) -> (Vec<Timer>, FanOutReport) {
        self.collect_from_clients("get_timers", |client| client.timers())
    }

    /// Timer types of every usable client.
    pub fn timer_types(&self) -> Vec<TimerType> {
        self.created_clients()
            .iter()
            .flat_map(|client| client.timer_types())
            .collect()
    }

    pub fn client_timer_types(&self, client_id: ClientId) -> Result<Vec<TimerType>, ClientsError> {
        self.for_created_client("client_timer_types", client_id, |client| {
            Ok(client.timer_types())
        })
    }

    pub fn add_timer(&self, timer: &Timer) -> Result<(), ClientsError> {
        self.for_created_client("add_timer", timer.client_id, |client| {
            client.add_timer(timer)
        })
    }

    pub fn update_timer(&self, timer: &Timer) -> Result<(), ClientsError> {
        self.for_created_client("update_timer", timer.client_id, |client| {
            client.update_timer(timer)
        })
    }

    /// A timer that is recording is only deleted with `force`; otherwise
    /// the error is [`PvrError::RecordingRunning`].
    pub fn delete_timer(&self, timer: &Timer, force: bool) -> Result<(), ClientsError> {
        self.for_created_client("delete_timer", timer.client_id, |client| {
            client.delete_timer(timer, force)
        })
    }

    // ------------------------------------------------------------------
    // Enregistrements
    // ------------------------------------------------------------------

    pub fn get_recordings(&self, deleted: bool) -> (Vec<Recording>, FanOutReport) {
        self.collect_from_clients("get_recordings", |client| client.recordings(deleted))
    }

    pub fn rename_recording(&self, recording: &Recording) -> Result<(), ClientsError> {
        self.for_created_client("rename_recording", recording.client_id, |client| {
            client.rename_recording(recording)
        })
    }

    pub fn delete_recording(&self, recording: &Recording) -> Result<(), ClientsError> {
        self.for_created_client("delete_recording", recording.client_id, |client| {
            client.delete_recording(recording)
        })
    }

    /// Only recordings flagged deleted can be restored.
    pub fn undelete_recording(&self, recording: &Recording) -> Result<(), ClientsError> {
        if !recording.is_deleted {
            return Err(PvrError::InvalidParameters.into());
        }
        self.for_created_client("undelete_recording", recording.client_id, |client| {
            client.undelete_recording(recording)
        })
    }

    pub fn delete_all_recordings_from_trash(&self) -> FanOutReport {
        self.for_created_clients("delete_all_recordings_from_trash", |client| {
            client.delete_all_recordings_from_trash()
        })
    }

    pub fn set_recording_lifetime(&self, recording: &Recording) -> Result<(), ClientsError> {
        self.for_created_client("set_recording_lifetime", recording.client_id, |client| {
            client.set_recording_lifetime(recording)
        })
    }

    pub fn set_recording_play_count(
        &self,
        recording: &Recording,
        count: u32,
    ) -> Result<(), ClientsError> {
        self.for_created_client("set_recording_play_count", recording.client_id, |client| {
            client.set_recording_play_count(recording, count)
        })
    }

    pub fn set_recording_last_played_position(
        &self,
        recording: &Recording,
        position: i32,
    ) -> Result<(), ClientsError> {
        self.for_created_client(
            "set_recording_last_played_position",
            recording.client_id,
            |client| client.set_recording_last_played_position(recording, position),
        )
    }

    pub fn recording_last_played_position(&self, recording: &Recording) -> Result<i32, ClientsError> {
        self.for_created_client(
            "recording_last_played_position",
            recording.client_id,
            |client| client.recording_last_played_position(recording),
        )
    }

    pub fn recording_edl(&self, recording: &Recording) -> Result<Vec<EdlEntry>, ClientsError> {
        self.for_created_client("recording_edl", recording.client_id, |client| {
            client.recording_edl(recording)
        })
    }

    // ------------------------------------------------------------------
    // EPG
    // ------------------------------------------------------------------

    pub fn get_epg_for_channel(
        &self,
        channel: &Channel,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        sink: &mut dyn EpgSink,
    ) -> Result<(), ClientsError> {
        self.for_created_client("get_epg_for_channel", channel.client_id, |client| {
            client.epg_for_channel(channel, start, end, sink)
        })
    }

    pub fn set_epg_time_frame(&self, days: u32) -> FanOutReport {
        self.for_created_clients("set_epg_time_frame", |client| {
            client.set_epg_time_frame(days)
        })
    }

    pub fn is_recordable(&self, tag: &EpgTag) -> Result<bool, ClientsError> {
        self.for_created_client("is_recordable", tag.client_id, |client| {
            client.is_recordable(tag)
        })
    }

    pub fn is_playable(&self, tag: &EpgTag) -> Result<bool, ClientsError> {
        self.for_created_client("is_playable", tag.client_id, |client| {
            client.is_playable(tag)
        })
    }

    // ------------------------------------------------------------------
    // Chaînes
    // ------------------------------------------------------------------

    pub fn get_channels(&self, radio: bool) -> (Vec<Channel>, FanOutReport) {
        self.collect_from_clients("get_channels", |client| client.channels(radio))
    }

    pub fn get_channel_groups(&self, radio: bool) -> (Vec<ChannelGroup>, FanOutReport) {
        self.collect_from_clients("get_channel_groups", |client| {
            client.channel_groups(radio)
        })
    }

    pub fn get_channel_group_members(
        &self,
        group: &ChannelGroup,
    ) -> Result<Vec<ChannelGroupMember>, ClientsError> {
        self.for_created_client("get_channel_group_members", group.client_id, |client| {
            client.channel_group_members(group)
        })
    }

    pub fn delete_channel(&self, channel: &Channel) -> Result<(), ClientsError> {
        self.for_created_client("delete_channel", channel.client_id, |client| {
            client.delete_channel(channel)
        })
    }

    pub fn rename_channel(&self, channel: &Channel) -> Result<(), ClientsError> {
        self.for_created_client("rename_channel", channel.client_id, |client| {
            client.rename_channel(channel)
        })
    }

    pub fn open_dialog_channel_scan(&self, client_id: ClientId) -> Result<(), ClientsError> {
        self.for_created_client("open_dialog_channel_scan", client_id, |client| {
            client.open_dialog_channel_scan()
        })
    }

    pub fn open_dialog_channel_add(&self, channel: &Channel) -> Result<(), ClientsError> {
        self.for_created_client("open_dialog_channel_add", channel.client_id, |client| {
            client.open_dialog_channel_add(channel)
        })
    }

    pub fn open_dialog_channel_settings(&self, channel: &Channel) -> Result<(), ClientsError> {
        self.for_created_client("open_dialog_channel_settings", channel.client_id, |client| {
            client.open_dialog_channel_settings(channel)
        })
    }

    pub fn clients_supporting_channel_scan(&self) -> Vec<Arc<ClientHandle>> {
        self.created_clients()
            .into_iter()
            .filter(|client| client.capabilities().supports_channel_scan())
            .collect()
    }

    pub fn clients_supporting_channel_settings(&self, radio: bool) -> Vec<Arc<ClientHandle>> {
        self.created_clients()
            .into_iter()
            .filter(|client| {
                let caps = client.capabilities();
                caps.supports_channel_settings()
                    && if radio {
                        caps.supports_radio()
                    } else {
                        caps.supports_tv()
                    }
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Menus, énergie, priorités, propriétés
    // ------------------------------------------------------------------

    pub fn menu_hooks(&self, client_id: ClientId) -> Option<Arc<MenuHooks>> {
        self.get_created_client(client_id)
            .map(|client| client.menu_hooks())
    }

    pub fn call_menu_hook(
        &self,
        client_id: ClientId,
        hook: &MenuHook,
        data: &MenuHookData,
    ) -> Result<(), ClientsError> {
        self.for_created_client("call_menu_hook", client_id, |client| {
            client.call_menu_hook(hook, data)
        })
    }

    pub fn on_system_sleep(&self) -> FanOutReport {
        self.for_created_clients("on_system_sleep", |client| client.on_system_sleep())
    }

    pub fn on_system_wake(&self) -> FanOutReport {
        self.for_created_clients("on_system_wake", |client| client.on_system_wake())
    }

    pub fn on_power_saving_activated(&self) -> FanOutReport {
        self.for_created_clients("on_power_saving_activated", |client| {
            client.on_power_saving_activated()
        })
    }

    pub fn on_power_saving_deactivated(&self) -> FanOutReport {
        self.for_created_clients("on_power_saving_deactivated", |client| {
            client.on_power_saving_deactivated()
        })
    }

    /// Priority of a created client, `None` when there is none with this id.
    pub fn priority(&self, client_id: ClientId) -> Option<i32> {
        self.get_created_client(client_id)
            .map(|client| client.priority())
    }

    pub fn set_priority(&self, client_id: ClientId, priority: i32) -> bool {
        match self.get_created_client(client_id) {
            Some(client) => {
                client.set_priority(priority);
                true
            }
            None => false,
        }
    }

    /// Backend summary of every usable client.
    pub fn backend_properties(&self) -> Vec<BackendProperties> {
        let mut properties = Vec::new();
        self.for_created_clients("backend_properties", |client| {
            properties.push(client.backend_properties());
            Ok(())
        });
        properties
    }
}

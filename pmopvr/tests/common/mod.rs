//! In-process doubles for the registry collaborators.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use crossbeam_channel::Receiver;
use pmopvr::capabilities::BackendCapabilities;
use pmopvr::menu_hooks::{MenuHook, MenuHookData};
use pmopvr::model::{Channel, Recording, Timer, TimerState};
use pmopvr::{
    AddonInfo, AddonManager, AddonStatus, BackendConnection, ClientContext, ClientId,
    ClientIdTable, ClientRegistry, ConnectionState, DefaultStrings, InstalledAddon, PvrError,
    PvrEvent, PvrEventBus, PvrResult, PvrSubsystem, RegistryServices, RegistrySettings,
};

/// Backend double: answers from canned data and records the calls it gets.
pub struct FakeBackend {
    pub name: String,
    pub connection: String,
    pub create_status: Mutex<AddonStatus>,
    pub capabilities: Mutex<BackendCapabilities>,
    /// Etats signalés pendant `create`
    pub report_on_create: Mutex<Vec<ConnectionState>>,
    pub fail: AtomicBool,
    pub timers: Mutex<Vec<Timer>>,
    pub created: AtomicUsize,
    pub destroyed: AtomicUsize,
    /// Temps passé dans `create`
    pub create_delay: Mutex<StdDuration>,
    /// Appelé depuis `open_live_stream`, avant de répondre
    pub on_open_live: Mutex<Option<Box<dyn Fn() + Send + Sync>>>,
    context: Mutex<Option<ClientContext>>,
    log: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new(name: &str, connection: &str) -> Arc<Self> {
        let capabilities = BackendCapabilities {
            supports_tv: true,
            supports_radio: true,
            supports_epg: true,
            supports_timers: true,
            supports_recordings: true,
            handles_input_stream: true,
            ..Default::default()
        };
        Arc::new(Self {
            name: name.to_string(),
            connection: connection.to_string(),
            create_status: Mutex::new(AddonStatus::Ok),
            capabilities: Mutex::new(capabilities),
            report_on_create: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
            timers: Mutex::new(Vec::new()),
            created: AtomicUsize::new(0),
            destroyed: AtomicUsize::new(0),
            create_delay: Mutex::new(StdDuration::ZERO),
            on_open_live: Mutex::new(None),
            context: Mutex::new(None),
            log: Mutex::new(Vec::new()),
        })
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn client_id(&self) -> ClientId {
        self.context
            .lock()
            .unwrap()
            .as_ref()
            .map_or(ClientId::INVALID, |context| context.client_id)
    }

    pub fn context(&self) -> Option<ClientContext> {
        self.context.lock().unwrap().clone()
    }

    /// Reports a connection state the way a real backend thread would.
    pub fn report(&self, state: ConnectionState, message: Option<&str>) {
        if let Some(context) = self.context() {
            context.reporter.report(&self.connection, state, message);
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.log.lock().unwrap().push(call.into());
    }

    fn check(&self) -> PvrResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(PvrError::ServerError)
        } else {
            Ok(())
        }
    }
}

impl BackendConnection for FakeBackend {
    fn create(&self, context: &ClientContext) -> AddonStatus {
        self.created.fetch_add(1, Ordering::SeqCst);
        let delay = *self.create_delay.lock().unwrap();
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        *self.context.lock().unwrap() = Some(context.clone());

        let states = self.report_on_create.lock().unwrap().clone();
        for state in states {
            context.reporter.report(&self.connection, state, None);
        }
        *self.create_status.lock().unwrap()
    }

    fn destroy(&self) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
    }

    fn capabilities(&self) -> PvrResult<BackendCapabilities> {
        Ok(self.capabilities.lock().unwrap().clone())
    }

    fn backend_name(&self) -> PvrResult<String> {
        Ok(self.name.clone())
    }

    fn backend_version(&self) -> PvrResult<String> {
        Ok("1.0".to_string())
    }

    fn backend_hostname(&self) -> PvrResult<String> {
        Ok(self.connection.clone())
    }

    fn connection_string(&self) -> PvrResult<String> {
        Ok(self.connection.clone())
    }

    fn channels(&self, radio: bool) -> PvrResult<Vec<Channel>> {
        self.record("channels");
        self.check()?;
        let client_id = self.client_id();
        Ok([(1, "One"), (2, "Two")]
            .into_iter()
            .map(|(uid, name)| {
                let mut channel = Channel::new(client_id, uid, name);
                channel.is_radio = radio;
                channel
            })
            .collect())
    }

    fn set_epg_time_frame(&self, days: u32) -> PvrResult<()> {
        self.record(format!("set_epg_time_frame:{days}"));
        self.check()
    }

    fn recordings(&self, _deleted: bool) -> PvrResult<Vec<Recording>> {
        self.check()?;
        Ok(vec![Recording::new(self.client_id(), "rec-1", "Film")])
    }

    fn undelete_recording(&self, _recording: &Recording) -> PvrResult<()> {
        self.record("undelete_recording");
        self.check()
    }

    fn timers(&self) -> PvrResult<Vec<Timer>> {
        self.check()?;
        Ok(self.timers.lock().unwrap().clone())
    }

    fn add_timer(&self, timer: &Timer) -> PvrResult<()> {
        self.record(format!("add_timer:{}", timer.title));
        self.check()
    }

    fn open_live_stream(&self, channel: &Channel) -> PvrResult<()> {
        self.record(format!("open_live_stream:{}", channel.unique_id));
        if let Some(callback) = self.on_open_live.lock().unwrap().as_ref() {
            callback();
        }
        self.check()
    }

    fn close_live_stream(&self) {
        self.record("close_live_stream");
    }

    fn open_recorded_stream(&self, recording: &Recording) -> PvrResult<()> {
        self.record(format!("open_recorded_stream:{}", recording.recording_id));
        self.check()
    }

    fn close_recorded_stream(&self) {
        self.record("close_recorded_stream");
    }

    fn read_stream(&self, buffer: &mut [u8]) -> PvrResult<usize> {
        buffer.fill(0xAB);
        Ok(buffer.len())
    }

    fn stream_length(&self) -> PvrResult<i64> {
        Ok(1000)
    }

    fn can_seek_stream(&self) -> PvrResult<bool> {
        Ok(false)
    }

    fn can_pause_stream(&self) -> PvrResult<bool> {
        Ok(false)
    }

    fn call_menu_hook(&self, hook: &MenuHook, _data: &MenuHookData) -> PvrResult<()> {
        self.record(format!("menu_hook:{}:{:?}", hook.hook_id, hook.category));
        self.check()
    }

    fn on_system_sleep(&self) -> PvrResult<()> {
        self.record("sleep");
        self.check()
    }
}

#[derive(Default)]
pub struct FakeAddons {
    addons: Mutex<Vec<InstalledAddon>>,
    disabled: Mutex<HashSet<String>>,
    pub disable_calls: Mutex<Vec<String>>,
}

impl FakeAddons {
    pub fn install(&self, id: &str, name: &str, backend: Arc<FakeBackend>) {
        let info = AddonInfo::new(id, name);
        self.addons
            .lock()
            .unwrap()
            .push(InstalledAddon::new(info, backend));
    }

    pub fn set_disabled(&self, id: &str, disabled: bool) {
        let mut set = self.disabled.lock().unwrap();
        if disabled {
            set.insert(id.to_string());
        } else {
            set.remove(id);
        }
    }
}

impl AddonManager for FakeAddons {
    fn installed_addons(&self) -> Vec<InstalledAddon> {
        self.addons.lock().unwrap().clone()
    }

    fn is_addon_disabled(&self, addon_id: &str) -> bool {
        self.disabled.lock().unwrap().contains(addon_id)
    }

    fn disable_addon(&self, addon_id: &str) -> bool {
        self.disable_calls.lock().unwrap().push(addon_id.to_string());
        self.set_disabled(addon_id, true);
        true
    }

    fn enable_addon(&self, addon_id: &str) -> bool {
        self.set_disabled(addon_id, false);
        true
    }
}

#[derive(Default)]
pub struct FakeSubsystem {
    log: Mutex<Vec<&'static str>>,
}

impl FakeSubsystem {
    pub fn calls(&self) -> Vec<&'static str> {
        self.log.lock().unwrap().clone()
    }
}

impl PvrSubsystem for FakeSubsystem {
    fn stop(&self) {
        self.log.lock().unwrap().push("stop");
    }

    fn start(&self) {
        self.log.lock().unwrap().push("start");
    }

    fn stop_playback(&self) {
        self.log.lock().unwrap().push("stop_playback");
    }
}

pub struct Harness {
    pub registry: Arc<ClientRegistry>,
    pub addons: Arc<FakeAddons>,
    pub subsystem: Arc<FakeSubsystem>,
    pub events: Receiver<PvrEvent>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_ids(ClientIdTable::in_memory())
    }

    pub fn with_ids(ids: ClientIdTable) -> Self {
        let addons = Arc::new(FakeAddons::default());
        let subsystem = Arc::new(FakeSubsystem::default());
        let bus = PvrEventBus::new();
        let events = bus.subscribe();

        let services = RegistryServices {
            addons: addons.clone(),
            subsystem: subsystem.clone(),
            events: Arc::new(bus),
            localizer: Arc::new(DefaultStrings),
        };
        let registry = Arc::new(ClientRegistry::new(
            services,
            ids,
            RegistrySettings::default(),
        ));

        Self {
            registry,
            addons,
            subsystem,
            events,
        }
    }

    /// Installs an enabled add-on `pvr.<key>` named `<name>`.
    pub fn install(&self, key: &str, name: &str) -> Arc<FakeBackend> {
        let backend = FakeBackend::new(name, &format!("host-{key}"));
        self.addons
            .install(&format!("pvr.{key}"), name, backend.clone());
        backend
    }

    pub fn drain_events(&self) -> Vec<PvrEvent> {
        self.events.try_iter().collect()
    }
}

pub fn timer(client_id: ClientId, title: &str, channel_uid: u32, state: TimerState) -> Timer {
    let start = Utc::now();
    Timer {
        client_id,
        client_index: 1,
        timer_type: 1,
        state,
        title: title.to_string(),
        channel_unique_id: Some(channel_uid),
        start,
        end: start + Duration::hours(1),
        epg_unique_id: None,
        priority: 0,
        lifetime: 0,
        directory: String::new(),
        summary: String::new(),
    }
}

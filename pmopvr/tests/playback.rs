mod common;

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use common::{Harness, timer};
use pmopvr::model::{Channel, EpgTag, Recording, TimerState};
use pmopvr::{ClientId, ClientsError, ConnectionState, PlaybackKind, PvrError};

fn epg_tag(client_id: ClientId, broadcast_id: u32) -> EpgTag {
    let start = Utc::now();
    EpgTag {
        client_id,
        unique_broadcast_id: broadcast_id,
        channel_unique_id: 1,
        title: "Journal".to_string(),
        start,
        end: start + Duration::minutes(30),
        plot: String::new(),
        genre_type: 0,
    }
}

#[test]
fn test_switching_channel_closes_previous_client() {
    let h = Harness::new();
    let a = h.install("a", "Fake A");
    let b = h.install("b", "Fake B");
    h.registry.start();

    let one = Channel::new(ClientId(1), 1, "One");
    h.registry.open_channel_stream(&one).unwrap();
    assert!(h.registry.is_playing_live_tv());
    assert!(!h.registry.is_playing_radio());
    assert_eq!(h.registry.playing_client_id(), Some(ClientId(1)));
    assert_eq!(
        h.registry.playing_client_name().as_deref(),
        Some("Fake A:host-a")
    );

    let mut buffer = [0u8; 16];
    assert_eq!(h.registry.read_stream(&mut buffer), Ok(16));
    assert_eq!(buffer[0], 0xAB);
    assert_eq!(h.registry.stream_length(), Ok(1000));

    let two = Channel::new(ClientId(2), 2, "Two");
    h.registry.open_channel_stream(&two).unwrap();

    assert_eq!(a.calls(), vec!["open_live_stream:1", "close_live_stream"]);
    assert_eq!(b.calls(), vec!["open_live_stream:2"]);
    assert_eq!(h.registry.playing_client_id(), Some(ClientId(2)));
    assert_eq!(h.registry.playing_channel(), Some(two));
    assert!(!h.registry.get_client(ClientId(1)).unwrap().is_playing());
}

#[test]
fn test_stream_queries_without_playback() {
    let h = Harness::new();
    h.install("a", "Fake A");
    h.registry.start();

    let mut buffer = [0u8; 8];
    assert_eq!(h.registry.read_stream(&mut buffer), Err(ClientsError::NotPlaying));
    assert!(!h.registry.can_pause_stream());
    assert!(!h.registry.can_seek_stream());
    assert_eq!(h.registry.playing_client_name(), None);
    h.registry.close_stream();
}

#[test]
fn test_recordings_can_always_seek_and_pause() {
    let h = Harness::new();
    let a = h.install("a", "Fake A");
    h.registry.start();

    let recording = Recording::new(ClientId(1), "rec-1", "Film");
    h.registry.open_recording_stream(&recording).unwrap();
    assert!(h.registry.is_playing_recording());
    // Le backend répond non, mais un enregistrement est toujours navigable
    assert!(h.registry.can_seek_stream());
    assert!(h.registry.can_pause_stream());
    assert_eq!(h.registry.playing_recording().unwrap().title, "Film");

    h.registry.close_stream();
    assert!(!h.registry.is_playing());
    assert_eq!(
        a.calls(),
        vec!["open_recorded_stream:rec-1", "close_recorded_stream"]
    );
}

#[test]
fn test_live_tv_follows_backend_answers() {
    let h = Harness::new();
    h.install("a", "Fake A");
    h.registry.start();

    h.registry
        .open_channel_stream(&Channel::new(ClientId(1), 1, "One"))
        .unwrap();
    assert!(!h.registry.can_seek_stream());
    assert!(!h.registry.can_pause_stream());
}

#[test]
fn test_failed_open_leaves_nothing_playing() {
    let h = Harness::new();
    let a = h.install("a", "Fake A");
    h.registry.start();

    assert_eq!(
        h.registry
            .open_channel_stream(&Channel::new(ClientId(5), 1, "Nowhere")),
        Err(ClientsError::ClientNotFound(ClientId(5)))
    );

    a.set_failing(true);
    assert_eq!(
        h.registry
            .open_channel_stream(&Channel::new(ClientId(1), 1, "One")),
        Err(ClientsError::Backend(PvrError::ServerError))
    );
    assert!(!h.registry.is_playing());
}

#[test]
fn test_radio_needs_radio_support() {
    let h = Harness::new();
    let a = h.install("a", "Fake A");
    a.capabilities.lock().unwrap().supports_radio = false;
    h.registry.start();

    let mut radio = Channel::new(ClientId(1), 3, "Radio");
    radio.is_radio = true;
    assert_eq!(
        h.registry.open_channel_stream(&radio),
        Err(ClientsError::Backend(PvrError::ServerError))
    );
    assert!(a.calls().is_empty());
}

#[test]
fn test_stopping_playing_client_stops_playback() {
    let h = Harness::new();
    h.install("a", "Fake A");
    h.registry.start();
    h.registry
        .open_channel_stream(&Channel::new(ClientId(1), 1, "One"))
        .unwrap();

    assert!(h.registry.stop_client("pvr.a", false));

    assert!(h.subsystem.calls().contains(&"stop_playback"));
    assert!(!h.registry.is_playing());
    assert_eq!(h.registry.get_client_id("pvr.a"), None);
    assert!(!h.registry.stop_client("pvr.a", false));
}

#[test]
fn test_recording_on_playing_channel() {
    let h = Harness::new();
    let a = h.install("a", "Fake A");
    a.timers
        .lock()
        .unwrap()
        .push(timer(ClientId(1), "Match", 1, TimerState::Recording));
    h.registry.start();

    assert!(!h.registry.is_recording_on_playing_channel());

    h.registry
        .open_channel_stream(&Channel::new(ClientId(1), 1, "One"))
        .unwrap();
    assert!(h.registry.is_recording_on_playing_channel());
    assert!(h.registry.can_record_instantly());

    h.registry
        .open_channel_stream(&Channel::new(ClientId(1), 2, "Two"))
        .unwrap();
    assert!(!h.registry.is_recording_on_playing_channel());
}

#[test]
fn test_epg_tag_playback_is_cleared_by_kind() {
    let h = Harness::new();
    h.install("a", "Fake A");
    h.registry.start();

    assert!(h.registry.set_playing_epg_tag(epg_tag(ClientId(1), 77)));
    assert!(h.registry.is_playing_epg_tag());
    assert_eq!(h.registry.playback().kind(), PlaybackKind::EpgTag);

    h.registry.clear_playing_channel();
    assert!(h.registry.is_playing_epg_tag());

    h.registry.clear_playing_epg_tag();
    assert!(!h.registry.is_playing());
    assert_eq!(h.registry.playing_epg_tag(), None);
}

#[test]
fn test_unknown_client_cannot_take_playback() {
    let h = Harness::new();
    h.install("a", "Fake A");
    h.registry.start();

    assert!(!h.registry.set_playing_channel(Channel::new(ClientId(3), 1, "Ghost")));
    assert!(!h.registry.is_playing());
}

#[test]
fn test_backend_calls_back_while_opening_stream() {
    let h = Harness::new();
    let a = h.install("a", "Fake A");
    h.registry.start();
    h.drain_events();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let observed = seen.clone();
    let registry = Arc::downgrade(&h.registry);
    *a.on_open_live.lock().unwrap() = Some(Box::new(move || {
        if let Some(registry) = registry.upgrade() {
            observed
                .lock()
                .unwrap()
                .push((registry.created_client_amount(), registry.is_playing()));
            registry.on_connection_state_changed(
                ClientId(1),
                "host-a",
                ConnectionState::ServerUnreachable,
                None,
            );
        }
    }));

    h.registry
        .open_channel_stream(&Channel::new(ClientId(1), 1, "One"))
        .unwrap();

    // Rien n'est marqué en lecture tant que le backend n'a pas répondu
    assert_eq!(*seen.lock().unwrap(), vec![(1, false)]);
    assert!(h.registry.is_playing_live_tv());

    let events = h.drain_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].message, "Server is unreachable");
    assert_eq!(
        h.registry.get_client(ClientId(1)).unwrap().connection_state(),
        ConnectionState::ServerUnreachable
    );
}

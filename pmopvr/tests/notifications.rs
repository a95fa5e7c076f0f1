mod common;

use common::Harness;
use pmopvr::{ClientId, ClientsError, ConnectionState, EventSeverity};

#[test]
fn test_first_connection_is_silent() {
    let h = Harness::new();
    let a = h.install("a", "Fake A");
    *a.report_on_create.lock().unwrap() = vec![ConnectionState::Connecting, ConnectionState::Connected];
    h.registry.start();

    let events = h.drain_events();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| !e.notify_user));
    assert_eq!(events[0].message, "Connecting");
    assert_eq!(events[1].message, "Connection established");
    assert_eq!(events[1].severity, EventSeverity::Info);

    // Connected relance le sous-système, en plus du cycle normal
    assert_eq!(h.subsystem.calls(), vec!["stop", "start", "start"]);

    let client = h.registry.get_created_client(ClientId(1)).unwrap();
    assert!(!client.ignore_client());
    assert_eq!(client.connection_state(), ConnectionState::Connected);
}

#[test]
fn test_reconnection_notifies_user() {
    let h = Harness::new();
    let a = h.install("a", "Fake A");
    *a.report_on_create.lock().unwrap() = vec![ConnectionState::Connected];
    h.registry.start();
    h.drain_events();

    a.report(ConnectionState::Disconnected, None);
    a.report(ConnectionState::Connected, None);

    let events = h.drain_events();
    assert_eq!(events.len(), 2);
    assert!(events[0].notify_user);
    assert_eq!(events[0].severity, EventSeverity::Error);
    assert_eq!(events[0].message, "Connection lost");
    assert_eq!(events[0].label, "Fake A");
    assert!(events[1].notify_user);
    assert_eq!(events[1].message, "Connection established");

    let client = h.registry.get_client(ClientId(1)).unwrap();
    assert_eq!(client.previous_connection_state(), ConnectionState::Disconnected);
}

#[test]
fn test_repeated_state_is_dropped() {
    let h = Harness::new();
    let a = h.install("a", "Fake A");
    h.registry.start();

    a.report(ConnectionState::Disconnected, None);
    a.report(ConnectionState::Disconnected, None);
    assert_eq!(h.drain_events().len(), 1);
}

#[test]
fn test_backend_message_overrides_default_text() {
    let h = Harness::new();
    let a = h.install("a", "Fake A");
    h.registry.start();

    a.report(ConnectionState::ServerUnreachable, Some("Tuner offline"));
    let events = h.drain_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].message, "Tuner offline");
    assert!(events[0].notify_user);
}

#[test]
fn test_never_reachable_client_is_ignored() {
    let h = Harness::new();
    let a = h.install("a", "Fake A");
    *a.report_on_create.lock().unwrap() = vec![ConnectionState::Connecting];
    h.registry.start();

    assert_eq!(h.registry.created_client_amount(), 1);
    assert!(!h.registry.has_created_clients());
    let (channels, report) = h.registry.get_channels(false);
    assert!(channels.is_empty());
    assert!(report.is_complete());
    assert_eq!(
        h.registry.rename_channel(&pmopvr::model::Channel::new(ClientId(1), 1, "One")),
        Err(ClientsError::ClientNotFound(ClientId(1)))
    );

    a.report(ConnectionState::Connected, None);
    assert!(h.registry.has_created_clients());
    let (channels, _) = h.registry.get_channels(false);
    assert_eq!(channels.len(), 2);
}

#[test]
fn test_registry_entry_point() {
    let h = Harness::new();
    h.install("a", "Fake A");
    h.registry.start();

    h.registry
        .on_connection_state_changed(ClientId(1), "host-a", ConnectionState::AccessDenied, None);
    let events = h.drain_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].message, "Access denied");

    // Client inconnu: rien ne se passe
    h.registry
        .on_connection_state_changed(ClientId(8), "host-x", ConnectionState::Disconnected, None);
    assert!(h.drain_events().is_empty());
}

#[test]
fn test_missing_connection_string_is_not_notified() {
    let h = Harness::new();
    h.install("a", "Fake A");
    h.registry.start();

    h.registry
        .on_connection_state_changed(ClientId(1), "", ConnectionState::Disconnected, None);
    assert!(h.drain_events().is_empty());
}

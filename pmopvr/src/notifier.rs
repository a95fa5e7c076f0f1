//! Reaction to backend connection state changes.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::addons::PvrSubsystem;
use crate::client::ClientHandle;
use crate::connection::ConnectionState;
use crate::events::{EventSeverity, EventSink, PvrEvent};
use crate::strings::{self, Localizer};

/// What a given state transition shows to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateNotification {
    pub message_id: u32,
    pub severity: EventSeverity,
    pub notify_user: bool,
}

impl StateNotification {
    /// Notification for entering `new` from `previous`. `None` for states
    /// that produce no event at all.
    pub fn for_transition(previous: ConnectionState, new: ConnectionState) -> Option<Self> {
        let (message_id, severity, notify_user) = match new {
            ConnectionState::ServerUnreachable => {
                (strings::MSG_SERVER_UNREACHABLE, EventSeverity::Error, true)
            }
            ConnectionState::ServerMismatch => {
                (strings::MSG_SERVER_MISMATCH, EventSeverity::Error, true)
            }
            ConnectionState::VersionMismatch => {
                (strings::MSG_VERSION_MISMATCH, EventSeverity::Error, true)
            }
            ConnectionState::AccessDenied => {
                (strings::MSG_ACCESS_DENIED, EventSeverity::Error, true)
            }
            ConnectionState::Connected => {
                // Première connexion: pas de toast
                let first_connection = matches!(
                    previous,
                    ConnectionState::Unknown | ConnectionState::Connecting
                );
                (
                    strings::MSG_CONNECTION_ESTABLISHED,
                    EventSeverity::Info,
                    !first_connection,
                )
            }
            ConnectionState::Disconnected => {
                (strings::MSG_CONNECTION_LOST, EventSeverity::Error, true)
            }
            ConnectionState::Connecting => (strings::MSG_CONNECTING, EventSeverity::Info, false),
            ConnectionState::Unknown => return None,
        };
        Some(Self {
            message_id,
            severity,
            notify_user,
        })
    }
}

pub struct ConnectionStateNotifier {
    events: Arc<dyn EventSink>,
    localizer: Arc<dyn Localizer>,
    subsystem: Arc<dyn PvrSubsystem>,
    notify_user: bool,
    display_ms: u64,
}

impl ConnectionStateNotifier {
    pub fn new(
        events: Arc<dyn EventSink>,
        localizer: Arc<dyn Localizer>,
        subsystem: Arc<dyn PvrSubsystem>,
    ) -> Self {
        Self {
            events,
            localizer,
            subsystem,
            notify_user: true,
            display_ms: 5000,
        }
    }

    /// When disabled, state changes still reach the event log but never
    /// raise a toast.
    pub fn with_user_notifications(mut self, enabled: bool) -> Self {
        self.notify_user = enabled;
        self
    }

    pub fn with_display_ms(mut self, display_ms: u64) -> Self {
        self.display_ms = display_ms;
        self
    }

    /// Called by a client once it recorded the transition `previous -> new`.
    ///
    /// `message` is the text supplied by the backend, which replaces the
    /// localized default.
    pub fn on_state_changed(
        &self,
        client: &ClientHandle,
        connection_string: &str,
        previous: ConnectionState,
        new: ConnectionState,
        message: Option<&str>,
    ) {
        if connection_string.is_empty() {
            error!(
                client = %client.addon_id(),
                state = %new,
                "Connection state change without connection string"
            );
            return;
        }

        match StateNotification::for_transition(previous, new) {
            Some(notification) => {
                let text = match message {
                    Some(text) if !text.is_empty() => text.to_string(),
                    _ => self.localizer.localize(notification.message_id),
                };
                let addon = client.addon();
                info!(
                    client = %addon.id,
                    connection = connection_string,
                    previous = %previous,
                    state = %new,
                    "{}",
                    text
                );
                self.events.post(PvrEvent {
                    notify_user: notification.notify_user && self.notify_user,
                    severity: notification.severity,
                    label: addon.name.clone(),
                    message: text,
                    icon: addon.icon.clone(),
                    display_ms: self.display_ms,
                });
            }
            None => {
                debug!(client = %client.addon_id(), state = %new, "No notification for state");
            }
        }

        if new == ConnectionState::Connected {
            // Rafraîchir les propriétés du backend puis relancer le sous-système
            if !client.refresh_properties() {
                error!(client = %client.addon_id(), "Error reading add-on properties");
            }
            self.subsystem.start();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionState::*;

    fn notifies(previous: ConnectionState, new: ConnectionState) -> bool {
        StateNotification::for_transition(previous, new)
            .map(|n| n.notify_user)
            .unwrap_or(false)
    }

    #[test]
    fn test_connected_suppression() {
        assert!(!notifies(Connecting, Connected));
        assert!(!notifies(Unknown, Connected));
        assert!(notifies(Disconnected, Connected));
        assert!(notifies(ServerUnreachable, Connected));
    }

    #[test]
    fn test_error_states_always_notify() {
        for previous in [Unknown, Connecting, Connected, Disconnected] {
            for new in [ServerUnreachable, ServerMismatch, VersionMismatch, AccessDenied, Disconnected] {
                let notification = StateNotification::for_transition(previous, new).unwrap();
                assert!(notification.notify_user);
                assert_eq!(notification.severity, EventSeverity::Error);
            }
        }
    }

    #[test]
    fn test_connecting_is_silent() {
        let notification = StateNotification::for_transition(Disconnected, Connecting).unwrap();
        assert!(!notification.notify_user);
        assert_eq!(notification.severity, EventSeverity::Info);
        assert_eq!(notification.message_id, strings::MSG_CONNECTING);
        assert!(StateNotification::for_transition(Connected, Unknown).is_none());
    }
}

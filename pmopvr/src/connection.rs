use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::PvrError;

/// Connection state of a backend, as reported by the backend itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(i32)]
pub enum ConnectionState {
    #[default]
    Unknown = 0,
    ServerUnreachable = 1,
    ServerMismatch = 2,
    VersionMismatch = 3,
    AccessDenied = 4,
    Connected = 5,
    Disconnected = 6,
    Connecting = 7,
}

impl ConnectionState {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }
}

impl TryFrom<i32> for ConnectionState {
    type Error = PvrError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        let state = match value {
            0 => ConnectionState::Unknown,
            1 => ConnectionState::ServerUnreachable,
            2 => ConnectionState::ServerMismatch,
            3 => ConnectionState::VersionMismatch,
            4 => ConnectionState::AccessDenied,
            5 => ConnectionState::Connected,
            6 => ConnectionState::Disconnected,
            7 => ConnectionState::Connecting,
            _ => return Err(PvrError::InvalidParameters),
        };
        Ok(state)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Unknown => "unknown",
            ConnectionState::ServerUnreachable => "server unreachable",
            ConnectionState::ServerMismatch => "server mismatch",
            ConnectionState::VersionMismatch => "version mismatch",
            ConnectionState::AccessDenied => "access denied",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
        };
        f.write_str(label)
    }
}

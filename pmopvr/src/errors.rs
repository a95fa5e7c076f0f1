//! Error types: backend error codes, add-on creation status and the
//! errors of registry-level routing.

use thiserror::Error;

use crate::ClientId;

/// Error codes a backend may report for any call.
///
/// The discriminants are the values exchanged with backends and must not
/// change. `NoError` (0) has no variant: success is `Ok(..)`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum PvrError {
    #[error("unknown error")]
    Unknown = -1,
    #[error("not implemented")]
    NotImplemented = -2,
    #[error("server error")]
    ServerError = -3,
    #[error("server timeout")]
    ServerTimeout = -4,
    #[error("rejected by the backend")]
    Rejected = -5,
    #[error("already present")]
    AlreadyPresent = -6,
    #[error("invalid parameters")]
    InvalidParameters = -7,
    #[error("recording running")]
    RecordingRunning = -8,
    #[error("the command failed")]
    Failed = -9,
}

pub type PvrResult<T> = Result<T, PvrError>;

/// Code renvoyé quand l'appel a réussi
pub const NO_ERROR: i32 = 0;

impl PvrError {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Decodes a raw backend return value. Codes outside the known range
    /// are reported as [`PvrError::Unknown`].
    pub fn from_code(code: i32) -> PvrResult<()> {
        match code {
            NO_ERROR => Ok(()),
            -2 => Err(PvrError::NotImplemented),
            -3 => Err(PvrError::ServerError),
            -4 => Err(PvrError::ServerTimeout),
            -5 => Err(PvrError::Rejected),
            -6 => Err(PvrError::AlreadyPresent),
            -7 => Err(PvrError::InvalidParameters),
            -8 => Err(PvrError::RecordingRunning),
            -9 => Err(PvrError::Failed),
            _ => Err(PvrError::Unknown),
        }
    }

    /// Backend-reported failures are everything except "not implemented".
    pub fn is_backend_failure(self) -> bool {
        self != PvrError::NotImplemented
    }
}

/// Maps a call result back to its raw code.
pub fn result_code<T>(result: &PvrResult<T>) -> i32 {
    match result {
        Ok(_) => NO_ERROR,
        Err(err) => err.code(),
    }
}

/// Status returned by a backend when it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddonStatus {
    Ok,
    LostConnection,
    NeedRestart,
    NeedSettings,
    Unknown,
    /// The add-on can never work in this installation and gets disabled.
    PermanentFailure,
    NotImplemented,
}

impl AddonStatus {
    pub fn is_ok(self) -> bool {
        self == AddonStatus::Ok
    }

    pub fn is_permanent_failure(self) -> bool {
        self == AddonStatus::PermanentFailure
    }
}

impl std::fmt::Display for AddonStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AddonStatus::Ok => "ok",
            AddonStatus::LostConnection => "lost connection",
            AddonStatus::NeedRestart => "need restart",
            AddonStatus::NeedSettings => "need settings",
            AddonStatus::Unknown => "unknown",
            AddonStatus::PermanentFailure => "permanent failure",
            AddonStatus::NotImplemented => "not implemented",
        };
        f.write_str(label)
    }
}

/// Errors returned by registry operations targeting a single client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientsError {
    #[error("no created client with id {0}")]
    ClientNotFound(ClientId),
    #[error("no client is currently playing")]
    NotPlaying,
    #[error(transparent)]
    Backend(#[from] PvrError),
}

impl ClientsError {
    /// The backend error carried by this failure, if any.
    pub fn backend_error(&self) -> Option<PvrError> {
        match self {
            ClientsError::Backend(err) => Some(*err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_codes_are_stable() {
        assert_eq!(PvrError::Unknown.code(), -1);
        assert_eq!(PvrError::NotImplemented.code(), -2);
        assert_eq!(PvrError::ServerError.code(), -3);
        assert_eq!(PvrError::ServerTimeout.code(), -4);
        assert_eq!(PvrError::Rejected.code(), -5);
        assert_eq!(PvrError::AlreadyPresent.code(), -6);
        assert_eq!(PvrError::InvalidParameters.code(), -7);
        assert_eq!(PvrError::RecordingRunning.code(), -8);
        assert_eq!(PvrError::Failed.code(), -9);
    }

    #[test]
    fn test_from_code() {
        assert_eq!(PvrError::from_code(0), Ok(()));
        assert_eq!(PvrError::from_code(-8), Err(PvrError::RecordingRunning));
        // Les codes inconnus deviennent Unknown
        assert_eq!(PvrError::from_code(-42), Err(PvrError::Unknown));
        assert_eq!(PvrError::from_code(7), Err(PvrError::Unknown));
    }

    #[test]
    fn test_clients_error_keeps_backend_error() {
        let err: ClientsError = PvrError::Rejected.into();
        assert_eq!(err.backend_error(), Some(PvrError::Rejected));
        assert_eq!(err.to_string(), "rejected by the backend");
        assert_eq!(ClientsError::NotPlaying.backend_error(), None);
    }
}

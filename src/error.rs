//! Error types for the ftdi-fifo crate.

use crate::transport::TransportError;

/// The error type for session operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No enumerated device matches the requested descriptor and index.
    #[error("device not found")]
    DeviceNotFound,

    /// The session already holds an open device.
    #[error("session already has an open device")]
    AlreadyOpen,

    /// The transport could not open or initialise the device.
    #[error("failed to open device: {0}")]
    OpenFailed(#[source] TransportError),

    /// The chip rejected the mode-switch sequence, or the session is closed.
    #[error("mode switch failed: {0}")]
    ModeSwitchFailed(String),

    /// A transfer was attempted while the session is not in synchronous FIFO mode.
    #[error("session is not in synchronous FIFO mode")]
    NotInSyncMode,

    /// The device accepted fewer bytes than were sent.
    #[error("short write: {written} of {requested} bytes accepted")]
    ShortWrite {
        /// Bytes accepted before the short chunk, including its partial count.
        written: usize,
        /// Bytes the caller asked to send.
        requested: usize,
    },

    /// No payload arrived within the read timeout.
    #[error("read timed out")]
    Timeout,

    /// An error from the USB transport.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The session is closed.
    #[error("USB device unavailable")]
    DeviceUnavailable,

    /// Invalid argument(s) were provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

/// Payload-free tag for an [`Error`], kept as a session's last status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DeviceNotFound,
    AlreadyOpen,
    OpenFailed,
    ModeSwitchFailed,
    NotInSyncMode,
    ShortWrite,
    Timeout,
    TransportError,
    DeviceUnavailable,
    InvalidArgument,
}

impl Error {
    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DeviceNotFound => ErrorKind::DeviceNotFound,
            Self::AlreadyOpen => ErrorKind::AlreadyOpen,
            Self::OpenFailed(_) => ErrorKind::OpenFailed,
            Self::ModeSwitchFailed(_) => ErrorKind::ModeSwitchFailed,
            Self::NotInSyncMode => ErrorKind::NotInSyncMode,
            Self::ShortWrite { .. } => ErrorKind::ShortWrite,
            Self::Timeout => ErrorKind::Timeout,
            Self::Transport(_) => ErrorKind::TransportError,
            Self::DeviceUnavailable => ErrorKind::DeviceUnavailable,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }

    /// Whether the same operation may succeed if issued again.
    ///
    /// Timeouts and short writes are transient. Everything else needs a
    /// different call or a reopened session.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::ShortWrite { .. })
    }
}

/// A specialized `Result` type for session operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_kinds() {
        assert!(Error::Timeout.is_retryable());
        assert!(Error::ShortWrite {
            written: 3,
            requested: 5
        }
        .is_retryable());
        assert!(!Error::DeviceNotFound.is_retryable());
        assert!(!Error::Transport(TransportError::Disconnected).is_retryable());
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(
            Error::OpenFailed(TransportError::NotFound).kind(),
            ErrorKind::OpenFailed
        );
        assert_eq!(
            Error::from(TransportError::Stall).kind(),
            ErrorKind::TransportError
        );
        assert_eq!(Error::NotInSyncMode.kind(), ErrorKind::NotInSyncMode);
    }

    #[test]
    fn short_write_message() {
        let err = Error::ShortWrite {
            written: 4096,
            requested: 10000,
        };
        assert_eq!(err.to_string(), "short write: 4096 of 10000 bytes accepted");
    }
}

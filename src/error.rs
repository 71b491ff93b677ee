//! Error taxonomy shared by the driver, the daemon and the client.
//!
//! Every failure that can reach a client maps onto one [`ErrorKind`] with a
//! stable numeric code, so the wire protocol never carries a generic failure.

use display_interface::DisplayError;
use serde::{Deserialize, Serialize};

use crate::ssd1306::pins::PinRole;

/// Stable error kinds, the codes are part of the control protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidPins,
    PinUnavailable,
    Busy,
    NotConfigured,
    OutOfBounds,
    SizeMismatch,
    AlreadyMapped,
    Io,
    Protocol,
    Transport,
}

impl ErrorKind {
    pub fn code(self) -> u8 {
        match self {
            Self::InvalidPins => 1,
            Self::PinUnavailable => 2,
            Self::Busy => 3,
            Self::NotConfigured => 4,
            Self::OutOfBounds => 5,
            Self::SizeMismatch => 6,
            Self::AlreadyMapped => 7,
            Self::Io => 8,
            Self::Protocol => 9,
            Self::Transport => 10,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidPins => "INVALID_PINS",
            Self::PinUnavailable => "PIN_UNAVAILABLE",
            Self::Busy => "BUSY",
            Self::NotConfigured => "NOT_CONFIGURED",
            Self::OutOfBounds => "OUT_OF_BOUNDS",
            Self::SizeMismatch => "SIZE_MISMATCH",
            Self::AlreadyMapped => "ALREADY_MAPPED",
            Self::Io => "IO",
            Self::Protocol => "PROTOCOL",
            Self::Transport => "TRANSPORT",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.code())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OledError {
    #[error("invalid pin group: {0}")]
    InvalidPins(String),

    #[error("failed to acquire {role} pin {line}: {reason}")]
    PinUnavailable {
        role: PinRole,
        line: u32,
        reason: String,
    },

    #[error("device is in use by another session")]
    Busy,

    #[error("pins are not configured, configure the device first")]
    NotConfigured,

    #[error("write of {len} bytes at offset {offset} exceeds buffer size {size}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        size: usize,
    },

    #[error("mapping size {requested} does not fit framebuffer region of {available} bytes")]
    SizeMismatch { requested: usize, available: usize },

    #[error("framebuffer is already mapped by this session")]
    AlreadyMapped,

    #[error("pin level write failed on {role}: {error:?}")]
    Io { role: PinRole, error: DisplayError },

    #[error("malformed control message: {0}")]
    Protocol(String),

    #[error("control transport failed: {0}")]
    Transport(#[from] std::io::Error),

    /// Error reported by the daemon, carried back to the client.
    #[error("{kind}: {message}")]
    Remote { kind: ErrorKind, message: String },
}

impl OledError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPins(_) => ErrorKind::InvalidPins,
            Self::PinUnavailable { .. } => ErrorKind::PinUnavailable,
            Self::Busy => ErrorKind::Busy,
            Self::NotConfigured => ErrorKind::NotConfigured,
            Self::OutOfBounds { .. } => ErrorKind::OutOfBounds,
            Self::SizeMismatch { .. } => ErrorKind::SizeMismatch,
            Self::AlreadyMapped => ErrorKind::AlreadyMapped,
            Self::Io { .. } => ErrorKind::Io,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Remote { kind, .. } => *kind,
        }
    }
}

pub type Result<T, E = OledError> = std::result::Result<T, E>;

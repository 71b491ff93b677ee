//! Control messages and their framing on the socket
//!
//! A frame is a little-endian `u32` payload length followed by the
//! `bincode` encoding of one [`Request`] or [`Response`].

use std::io::{self, Read, Write};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{ErrorKind, OledError, Result};
use crate::ssd1306::pins::PinGroup;

/// Largest payload accepted in either direction
pub const MAX_FRAME: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    /// Bind the four lines and bring the panel up
    Configure(PinGroup),
    DisplayOn,
    DisplayOff,
    Refresh,
    Clear,
    /// Ask for the shared framebuffer, `len` bytes long
    Map { len: usize },
    /// Copy into the framebuffer at `offset`, then refresh
    Write { offset: usize, data: Vec<u8> },
    Info,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    /// Session accepted, sent once right after connect
    Ready,
    Ok,
    Mapped { path: String, len: usize },
    Info(String),
    Error { kind: ErrorKind, message: String },
}

impl Response {
    pub fn from_error(err: &OledError) -> Self {
        Self::Error {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// Turn an `Error` response back into an [`OledError`]
    pub fn into_result(self) -> Result<Self> {
        match self {
            Self::Error { kind, message } => Err(match kind {
                ErrorKind::Busy => OledError::Busy,
                ErrorKind::NotConfigured => OledError::NotConfigured,
                ErrorKind::AlreadyMapped => OledError::AlreadyMapped,
                kind => OledError::Remote { kind, message },
            }),
            other => Ok(other),
        }
    }
}

/// Encode `msg` and write it as one frame
pub fn write_frame<W: Write, T: Serialize>(writer: &mut W, msg: &T) -> Result<()> {
    let payload =
        bincode::serialize(msg).map_err(|e| OledError::Protocol(e.to_string()))?;
    if payload.len() > MAX_FRAME {
        return Err(OledError::Protocol(format!(
            "frame of {} bytes exceeds {}",
            payload.len(),
            MAX_FRAME
        )));
    }
    writer.write_all(&(payload.len() as u32).to_le_bytes())?;
    writer.write_all(&payload)?;
    writer.flush()?;
    Ok(())
}

/// Read one frame. `Ok(None)` means the peer closed before a new frame began.
pub fn read_frame<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<Option<T>> {
    let mut header = [0u8; 4];
    match reader.read_exact(&mut header) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(header) as usize;
    if len > MAX_FRAME {
        return Err(OledError::Protocol(format!(
            "announced frame of {} bytes exceeds {}",
            len, MAX_FRAME
        )));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    bincode::deserialize(&payload)
        .map(Some)
        .map_err(|e| OledError::Protocol(e.to_string()))
}

//! Client side of the control socket

use std::os::unix::net::UnixStream;
use std::path::Path;

use crate::control::protocol::{read_frame, write_frame, Request, Response};
use crate::error::{OledError, Result};
use crate::shm::SharedFramebuffer;
use crate::ssd1306::pins::PinGroup;
use crate::ssd1306::BUFFER_SIZE;

/// One session with the daemon. Dropping it closes the session.
pub struct Session {
    stream: UnixStream,
    closed: bool,
}

impl Session {
    /// Connect and wait for the daemon to admit the session.
    /// Fails with [`OledError::Busy`] if another session is active.
    pub fn open(socket: impl AsRef<Path>) -> Result<Self> {
        let mut stream = UnixStream::connect(socket.as_ref())?;
        match read_frame::<_, Response>(&mut stream)? {
            Some(response) => match response.into_result()? {
                Response::Ready => Ok(Self {
                    stream,
                    closed: false,
                }),
                other => Err(unexpected(&other)),
            },
            None => Err(OledError::Protocol("daemon closed the connection".into())),
        }
    }

    fn call(&mut self, request: &Request) -> Result<Response> {
        write_frame(&mut self.stream, request)?;
        match read_frame::<_, Response>(&mut self.stream)? {
            Some(response) => response.into_result(),
            None => Err(OledError::Protocol("daemon closed the connection".into())),
        }
    }

    fn call_ok(&mut self, request: &Request) -> Result<()> {
        match self.call(request)? {
            Response::Ok => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    pub fn configure(&mut self, group: &PinGroup) -> Result<()> {
        self.call_ok(&Request::Configure(*group))
    }

    pub fn refresh(&mut self) -> Result<()> {
        self.call_ok(&Request::Refresh)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.call_ok(&Request::Clear)
    }

    pub fn display_on(&mut self) -> Result<()> {
        self.call_ok(&Request::DisplayOn)
    }

    pub fn display_off(&mut self) -> Result<()> {
        self.call_ok(&Request::DisplayOff)
    }

    pub fn write(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        self.call_ok(&Request::Write {
            offset,
            data: data.to_vec(),
        })
    }

    pub fn info(&mut self) -> Result<String> {
        match self.call(&Request::Info)? {
            Response::Info(text) => Ok(text),
            other => Err(unexpected(&other)),
        }
    }

    /// Map the daemon's framebuffer into this process
    pub fn map(&mut self) -> Result<SharedFramebuffer> {
        self.map_len(BUFFER_SIZE)
    }

    /// Map with an explicit length; must be at least [`BUFFER_SIZE`]
    pub fn map_len(&mut self, len: usize) -> Result<SharedFramebuffer> {
        match self.call(&Request::Map { len })? {
            Response::Mapped { path, len } => SharedFramebuffer::open(path, len),
            other => Err(unexpected(&other)),
        }
    }

    /// Close explicitly and see the daemon's answer
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.call_ok(&Request::Close)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.call_ok(&Request::Close) {
                log::debug!("Close on drop failed: {}", e);
            }
        }
    }
}

fn unexpected(response: &Response) -> OledError {
    OledError::Protocol(format!("unexpected response {:?}", response))
}

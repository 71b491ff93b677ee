//! The driver daemon
//!
//! Owns the one [`Ssd1306`] session of the process behind a mutex and serves
//! control requests on a Unix socket, one thread per connection. Only one
//! client session is admitted at a time; the others get `Busy` right away.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use embedded_hal::delay::DelayNs;
use fs2::FileExt;

use crate::control::protocol::{read_frame, write_frame, Request, Response};
use crate::error::{OledError, Result};
use crate::shm::{round_to_page, SharedRegion};
use crate::ssd1306::driver::Ssd1306;
use crate::ssd1306::pins::PinBank;
use crate::ssd1306::{BUFFER_SIZE, HEIGHT, WIDTH};

/// Device session as held by the daemon
pub type SharedDevice<B, D> = Arc<Mutex<Ssd1306<B, D, SharedRegion>>>;

fn lock_device<B: PinBank, D>(
    device: &Mutex<Ssd1306<B, D, SharedRegion>>,
) -> MutexGuard<'_, Ssd1306<B, D, SharedRegion>> {
    // a panicked handler leaves the session usable, pins included
    device.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Text returned by the `Info` request
pub fn info_text(buffer_len: usize) -> String {
    format!(
        "Device Information:\n  Resolution: {} * {}\n  Buffer size: {} Byte\n",
        WIDTH, HEIGHT, buffer_len
    )
}

/// Exclusive, non-blocking claim on the device for one client session.
/// Dropping it unlocks.
pub struct SessionLock {
    file: File,
}

impl SessionLock {
    pub fn try_acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self { file }),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Err(OledError::Busy),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            log::warn!("Session unlock failed: {}", e);
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub socket: PathBuf,
    pub lock: PathBuf,
}

pub struct Daemon<B: PinBank, D> {
    device: SharedDevice<B, D>,
    listener: UnixListener,
    config: ServerConfig,
}

impl<B, D> Daemon<B, D>
where
    B: PinBank + Send + 'static,
    B::Pin: Send + 'static,
    D: DelayNs + Send + 'static,
{
    /// Take over the socket path, replacing a stale socket file
    pub fn bind(config: ServerConfig, device: Ssd1306<B, D, SharedRegion>) -> Result<Self> {
        match fs::remove_file(&config.socket) {
            Ok(()) => log::warn!("Removed stale socket {}", config.socket.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        let listener = UnixListener::bind(&config.socket)?;
        log::info!("Listening on {}", config.socket.display());
        Ok(Self {
            device: Arc::new(Mutex::new(device)),
            listener,
            config,
        })
    }

    pub fn device(&self) -> SharedDevice<B, D> {
        Arc::clone(&self.device)
    }

    /// Cleanup that can run from a signal handler thread
    pub fn teardown_handle(&self) -> Teardown<B, D> {
        Teardown {
            device: self.device(),
            socket: self.config.socket.clone(),
        }
    }

    /// Accept connections until the listener fails
    pub fn serve(&self) -> Result<()> {
        for stream in self.listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    log::error!("Accept failed: {}", e);
                    continue;
                }
            };
            let device = self.device();
            let lock = self.config.lock.clone();
            thread::Builder::new()
                .name("oled-session".into())
                .spawn(move || {
                    if let Err(e) = handle_connection(stream, &device, &lock) {
                        log::warn!("Session ended with error: {}", e);
                    }
                })?;
        }
        Ok(())
    }
}

/// Power the panel down, release the pins, remove socket and shared file
pub struct Teardown<B: PinBank, D> {
    device: SharedDevice<B, D>,
    socket: PathBuf,
}

impl<B, D> Teardown<B, D>
where
    B: PinBank,
    D: DelayNs,
{
    pub fn run(&self) {
        log::info!("Shutting down");
        let mut device = lock_device(&self.device);
        device.shutdown();
        device.storage().remove_file();
        if let Err(e) = fs::remove_file(&self.socket) {
            if e.kind() != io::ErrorKind::NotFound {
                log::warn!("Could not remove {}: {}", self.socket.display(), e);
            }
        }
    }
}

/// Per-connection state
struct Connection<'a, B: PinBank, D> {
    device: &'a Mutex<Ssd1306<B, D, SharedRegion>>,
    mapped: bool,
}

impl<B, D> Connection<'_, B, D>
where
    B: PinBank,
    D: DelayNs,
{
    fn dispatch(&mut self, request: Request) -> Result<Response> {
        let mut device = lock_device(self.device);
        match request {
            Request::Configure(group) => device.configure(&group).map(|_| Response::Ok),
            Request::DisplayOn => device.open().map(|_| Response::Ok),
            Request::DisplayOff => device.close().map(|_| Response::Ok),
            Request::Refresh => device.refresh().map(|_| Response::Ok),
            Request::Clear => device.clear().map(|_| Response::Ok),
            Request::Write { offset, data } => device.write(offset, &data).map(|_| Response::Ok),
            Request::Info => Ok(Response::Info(info_text(device.buffer_len()))),
            Request::Map { len } => {
                if self.mapped {
                    return Err(OledError::AlreadyMapped);
                }
                let available = device.buffer_len();
                let rounded = round_to_page(len);
                if len < BUFFER_SIZE || rounded > available {
                    log::error!("Map of {} bytes rejected, region is {}", len, available);
                    return Err(OledError::SizeMismatch {
                        requested: len,
                        available,
                    });
                }
                self.mapped = true;
                Ok(Response::Mapped {
                    path: device.storage().path().display().to_string(),
                    len: rounded,
                })
            }
            Request::Close => Ok(Response::Ok),
        }
    }

    fn close(&mut self) {
        lock_device(self.device).shutdown();
        self.mapped = false;
    }
}

fn handle_connection<B, D>(
    mut stream: UnixStream,
    device: &Mutex<Ssd1306<B, D, SharedRegion>>,
    lock_path: &Path,
) -> Result<()>
where
    B: PinBank,
    D: DelayNs,
{
    let _lock = match SessionLock::try_acquire(lock_path) {
        Ok(lock) => lock,
        Err(e) => {
            log::warn!("Session refused: {}", e);
            write_frame(&mut stream, &Response::from_error(&e))?;
            return Ok(());
        }
    };
    write_frame(&mut stream, &Response::Ready)?;
    log::info!("Session opened");

    let mut conn = Connection {
        device,
        mapped: false,
    };
    let result = serve_session(&mut stream, &mut conn);
    conn.close();
    log::info!("Session closed");
    result
}

fn serve_session<B, D>(stream: &mut UnixStream, conn: &mut Connection<'_, B, D>) -> Result<()>
where
    B: PinBank,
    D: DelayNs,
{
    while let Some(request) = read_frame::<_, Request>(stream)? {
        log::debug!("Request {:?}", RequestName(&request));
        let closing = request == Request::Close;
        let response = conn
            .dispatch(request)
            .unwrap_or_else(|e| Response::from_error(&e));
        write_frame(stream, &response)?;
        if closing {
            break;
        }
    }
    Ok(())
}

/// Log helper that keeps write payloads out of the log
struct RequestName<'a>(&'a Request);

impl std::fmt::Debug for RequestName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Request::Write { offset, data } => {
                write!(f, "Write {{ offset: {}, len: {} }}", offset, data.len())
            }
            other => write!(f, "{:?}", other),
        }
    }
}

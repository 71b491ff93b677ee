//! Daemon and client talking over a real Unix socket, simulated pins.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use spi_oled::control::{Daemon, ServerConfig, Session};
use spi_oled::mock::{BusTrace, MockPinBank};
use spi_oled::shm::{round_to_page, SharedRegion};
use spi_oled::ssd1306::interface::DataMode;
use spi_oled::ssd1306::BUFFER_SIZE;
use spi_oled::{ErrorKind, FontSize, MonoFontTable, OledError, PinGroup, Ssd1306};
use tempfile::TempDir;

const PINS: PinGroup = PinGroup::new(17, 27, 4, 24);

struct Harness {
    dir: TempDir,
    trace: BusTrace,
}

impl Harness {
    fn socket(&self) -> std::path::PathBuf {
        self.dir.path().join("oled.sock")
    }
}

fn start() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let bank = MockPinBank::new();
    let trace = bank.trace();
    let region = SharedRegion::create(dir.path().join("oled.fb"), BUFFER_SIZE).unwrap();
    let device = Ssd1306::new(bank.clone(), bank.delay(), region, 0).unwrap();
    let config = ServerConfig {
        socket: dir.path().join("oled.sock"),
        lock: dir.path().join("oled.lock"),
    };
    let daemon = Daemon::bind(config, device).unwrap();
    thread::spawn(move || daemon.serve());
    Harness { dir, trace }
}

fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

fn open_when_free(socket: &Path) -> Session {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        match Session::open(socket) {
            Ok(session) => return session,
            Err(OledError::Busy) if Instant::now() < deadline => {
                thread::sleep(Duration::from_millis(10))
            }
            Err(e) => panic!("session did not open: {}", e),
        }
    }
}

#[test]
fn info_reports_the_region() {
    let h = start();
    let mut session = Session::open(h.socket()).unwrap();
    let text = session.info().unwrap();
    assert_eq!(
        text,
        format!(
            "Device Information:\n  Resolution: 128 * 64\n  Buffer size: {} Byte\n",
            round_to_page(BUFFER_SIZE)
        )
    );
    session.close().unwrap();
}

#[test]
fn drawing_through_the_mapping_reaches_the_bus() {
    let h = start();
    let mut session = Session::open(h.socket()).unwrap();
    session.configure(&PINS).unwrap();
    let mut shared = session.map().unwrap();
    assert_eq!(shared.len(), round_to_page(BUFFER_SIZE));

    let fonts = MonoFontTable::new();
    {
        let mut fb = shared.framebuffer().unwrap();
        fb.clear();
        fb.draw_string(&fonts, 0, 0, "HI", FontSize::S16);
    }
    let top_page = shared.as_bytes()[..128].to_vec();
    assert!(top_page.iter().any(|&b| b != 0));

    h.trace.clear();
    session.refresh().unwrap();

    let decoded = h.trace.decode();
    assert_eq!(decoded.len(), 8 * (3 + 128));
    // framebuffer page 0 is sent last, to hardware page 7
    let last = &decoded[7 * 131..];
    assert_eq!(last[0], (0xB7, DataMode::Command));
    let sent: Vec<u8> = last[3..].iter().map(|(b, _)| *b).collect();
    assert_eq!(sent, top_page);

    drop(shared);
    session.close().unwrap();
}

#[test]
fn second_session_is_busy_until_the_first_closes() {
    let h = start();
    let first = Session::open(h.socket()).unwrap();

    let err = Session::open(h.socket()).err().unwrap();
    assert!(matches!(err, OledError::Busy));
    assert_eq!(err.kind(), ErrorKind::Busy);

    first.close().unwrap();
    let second = open_when_free(&h.socket());
    second.close().unwrap();
}

#[test]
fn map_rejects_short_lengths_and_repeats() {
    let h = start();
    let mut session = Session::open(h.socket()).unwrap();

    let err = session.map_len(512).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::SizeMismatch);
    let err = session.map_len(round_to_page(BUFFER_SIZE) + 1).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::SizeMismatch);

    let _shared = session.map().unwrap();
    let err = session.map().err().unwrap();
    assert!(matches!(err, OledError::AlreadyMapped));
}

#[test]
fn bus_requests_need_configure() {
    let h = start();
    let mut session = Session::open(h.socket()).unwrap();
    assert!(matches!(session.refresh(), Err(OledError::NotConfigured)));
    assert!(matches!(session.clear(), Err(OledError::NotConfigured)));
    assert!(matches!(session.display_on(), Err(OledError::NotConfigured)));
    assert!(matches!(
        session.write(0, &[1, 2, 3]),
        Err(OledError::NotConfigured)
    ));
    assert!(h.trace.decode().is_empty());
}

#[test]
fn bulk_write_is_bounds_checked() {
    let h = start();
    let mut session = Session::open(h.socket()).unwrap();
    session.configure(&PINS).unwrap();
    let size = round_to_page(BUFFER_SIZE);

    let err = session.write(size - 2, &[0xFF; 4]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfBounds);

    session.write(128 * 7, &[0xFF; 128]).unwrap();
    let shared = session.map().unwrap();
    assert!(shared.as_bytes()[128 * 7..128 * 8].iter().all(|&b| b == 0xFF));
    assert_eq!(shared.as_bytes()[size - 2], 0);
}

#[test]
fn invalid_pins_are_reported_by_kind() {
    let h = start();
    let mut session = Session::open(h.socket()).unwrap();
    let err = session
        .configure(&PinGroup::new(1, 1, 2, 3))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidPins);
}

#[test]
fn closing_the_session_powers_down_and_frees_pins() {
    let h = start();
    let mut session = Session::open(h.socket()).unwrap();
    session.configure(&PINS).unwrap();
    assert_eq!(h.trace.held_lines().len(), 4);
    h.trace.clear();

    session.close().unwrap();
    assert!(wait_until(|| h.trace.held_lines().is_empty()));
    let sent: Vec<u8> = h.trace.decode().into_iter().map(|(b, _)| b).collect();
    assert_eq!(sent, [0x8D, 0x10, 0xAE]);
}

#[test]
fn dropped_client_is_cleaned_up() {
    let h = start();
    {
        let mut session = Session::open(h.socket()).unwrap();
        session.configure(&PINS).unwrap();
    }
    assert!(wait_until(|| h.trace.held_lines().is_empty()));
    open_when_free(&h.socket()).close().unwrap();
}

#[test]
fn teardown_removes_socket_and_region() {
    let dir = tempfile::tempdir().unwrap();
    let bank = MockPinBank::new();
    let shm = dir.path().join("oled.fb");
    let region = SharedRegion::create(&shm, BUFFER_SIZE).unwrap();
    let mut device = Ssd1306::new(bank.clone(), bank.delay(), region, 0).unwrap();
    device.configure(&PINS).unwrap();
    let config = ServerConfig {
        socket: dir.path().join("oled.sock"),
        lock: dir.path().join("oled.lock"),
    };
    let daemon = Daemon::bind(config.clone(), device).unwrap();
    assert!(config.socket.exists());

    daemon.teardown_handle().run();
    assert!(!config.socket.exists());
    assert!(!shm.exists());
    assert!(bank.trace().held_lines().is_empty());
}

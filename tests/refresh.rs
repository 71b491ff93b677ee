use embedded_hal::digital::PinState;
use spi_oled::mock::{MockDelay, MockPinBank, PinEvent};
use spi_oled::ssd1306::driver::POWER_ON_SEQUENCE;
use spi_oled::ssd1306::interface::{DataMode, DisplayInterface};
use spi_oled::ssd1306::pins::{PinRole, PinSlots};
use spi_oled::ssd1306::{BUFFER_SIZE, PAGES, WIDTH};
use spi_oled::{FontSize, FontTable, MonoFontTable, PinGroup, Ssd1306};

type Device = Ssd1306<MockPinBank, MockDelay, Vec<u8>>;

fn configured() -> (Device, MockPinBank) {
    let bank = MockPinBank::new();
    let mut oled = Ssd1306::new(bank.clone(), bank.delay(), vec![0; BUFFER_SIZE], 0).unwrap();
    oled.configure(&PinGroup::new(17, 27, 4, 24)).unwrap();
    bank.trace().clear();
    (oled, bank)
}

/// Split a decoded refresh into (page command, data) chunks
fn pages(bytes: &[(u8, DataMode)]) -> Vec<(Vec<u8>, Vec<u8>)> {
    bytes
        .chunks(3 + WIDTH as usize)
        .map(|chunk| {
            let (cmds, data) = chunk.split_at(3);
            assert!(cmds.iter().all(|(_, m)| *m == DataMode::Command));
            assert!(data.iter().all(|(_, m)| *m == DataMode::Data));
            (
                cmds.iter().map(|(b, _)| *b).collect(),
                data.iter().map(|(b, _)| *b).collect(),
            )
        })
        .collect()
}

#[test]
fn send_byte_clocks_msb_first() {
    let mut bank = MockPinBank::new();
    let slots = PinSlots::acquire(&mut bank, &PinGroup::new(1, 2, 3, 4)).unwrap();
    let mut bus = DisplayInterface::new(bank.delay(), 0);
    bus.attach(slots);
    bank.trace().clear();

    bus.cmd(0xA5).unwrap();
    assert_eq!(bank.trace().decode(), vec![(0xA5, DataMode::Command)]);

    let events = bank.trace().events();
    let data_levels: Vec<PinState> = events
        .iter()
        .filter_map(|e| match e {
            PinEvent::Level {
                role: PinRole::Data,
                level,
            } => Some(*level),
            _ => None,
        })
        .collect();
    use PinState::{High, Low};
    assert_eq!(data_levels, [High, Low, High, Low, Low, High, Low, High]);

    // select back at the data level, clock idle high
    assert_eq!(
        events.last(),
        Some(&PinEvent::Level {
            role: PinRole::Select,
            level: High
        })
    );
    let last_clock = events.iter().rev().find_map(|e| match e {
        PinEvent::Level {
            role: PinRole::Clock,
            level,
        } => Some(*level),
        _ => None,
    });
    assert_eq!(last_clock, Some(High));
}

#[test]
fn data_bytes_use_the_data_level() {
    let mut bank = MockPinBank::new();
    let slots = PinSlots::acquire(&mut bank, &PinGroup::new(1, 2, 3, 4)).unwrap();
    let mut bus = DisplayInterface::new(bank.delay(), 50);
    bus.attach(slots);
    bank.trace().clear();

    bus.data(&[0x00, 0xFF]).unwrap();
    assert_eq!(
        bank.trace().decode(),
        vec![(0x00, DataMode::Data), (0xFF, DataMode::Data)]
    );
    // three pauses per bit
    assert_eq!(bank.trace().slept_ns(), 2 * 8 * 3 * 50);
}

#[test]
fn power_on_sends_reset_then_init_sequence() {
    let bank = MockPinBank::new();
    let mut oled: Device =
        Ssd1306::new(bank.clone(), bank.delay(), vec![0; BUFFER_SIZE], 0).unwrap();
    oled.acquire_pins(&PinGroup::new(17, 27, 4, 24)).unwrap();
    bank.trace().clear();
    oled.power_on().unwrap();

    let events = bank.trace().events();
    assert_eq!(
        &events[..3],
        &[
            PinEvent::Level {
                role: PinRole::Reset,
                level: PinState::Low
            },
            PinEvent::Sleep { ns: 100_000_000 },
            PinEvent::Level {
                role: PinRole::Reset,
                level: PinState::High
            },
        ]
    );
    let sent: Vec<u8> = bank.trace().decode().into_iter().map(|(b, _)| b).collect();
    assert_eq!(
        sent,
        [
            0xAE, 0xD5, 0x50, 0xA8, 0x3F, 0xD3, 0x00, 0x40, 0x8D, 0x14, 0x20, 0x02, 0xA1, 0xC0,
            0xDA, 0x12, 0x81, 0xEF, 0xD9, 0xF1, 0xDB, 0x30, 0xA4, 0xA6, 0xAF
        ]
    );
    assert_eq!(sent, POWER_ON_SEQUENCE);
}

#[test]
fn refresh_walks_framebuffer_pages_bottom_up() {
    let (mut oled, bank) = configured();
    {
        let mut fb = oled.framebuffer().unwrap();
        for page in 0..PAGES {
            // tag every page with its own number
            fb.fill_region(0, page * 8, WIDTH - 1, page * 8, page % 2 == 0);
        }
    }
    let snapshot = oled.buffer().to_vec();
    oled.refresh().unwrap();

    let decoded = bank.trace().decode();
    assert_eq!(decoded.len(), PAGES as usize * (3 + WIDTH as usize));
    for (hw_page, (cmds, data)) in pages(&decoded).into_iter().enumerate() {
        assert_eq!(cmds, [0xB0 + hw_page as u8, 0x00, 0x10]);
        let fb_page = PAGES as usize - 1 - hw_page;
        let start = fb_page * WIDTH as usize;
        assert_eq!(data, &snapshot[start..start + WIDTH as usize]);
    }
}

#[test]
fn hi_in_size_16_produces_the_exact_page_stream() {
    let (mut oled, bank) = configured();
    let fonts = MonoFontTable::new();
    {
        let mut fb = oled.framebuffer().unwrap();
        fb.clear();
        fb.draw_string(&fonts, 0, 0, "HI", FontSize::S16);
    }
    oled.refresh().unwrap();

    // glyph columns are two bytes, top half first: framebuffer pages 0 and 1
    let mut expected = vec![0u8; BUFFER_SIZE];
    for (cell, ch) in [b'H', b'I'].into_iter().enumerate() {
        let glyph = fonts.glyph(FontSize::S16, usize::from(ch - b' ')).unwrap();
        assert!(glyph.iter().any(|&b| b != 0));
        for (column, bytes) in glyph.chunks(2).enumerate() {
            let x = cell * 8 + column;
            expected[x] = bytes[0];
            expected[WIDTH as usize + x] = bytes[1];
        }
    }

    let mut stream = Vec::new();
    for hw_page in 0..PAGES as usize {
        let (cmd, data) = (DataMode::Command, DataMode::Data);
        stream.extend([(0xB0 + hw_page as u8, cmd), (0x00, cmd), (0x10, cmd)]);
        let start = (PAGES as usize - 1 - hw_page) * WIDTH as usize;
        stream.extend(expected[start..start + WIDTH as usize].iter().map(|&b| (b, data)));
    }
    assert_eq!(bank.trace().decode(), stream);
}

#[test]
fn write_then_refresh_shows_the_written_bytes() {
    let (mut oled, bank) = configured();
    oled.write(0, &[0xFF; 128]).unwrap();

    let pages = pages(&bank.trace().decode());
    assert!(pages[7].1.iter().all(|&b| b == 0xFF));
    assert!(pages[0].1.iter().all(|&b| b == 0x00));
}

#[test]
fn page_rounded_buffer_only_sends_pixels() {
    let bank = MockPinBank::new();
    let mut oled = Ssd1306::new(bank.clone(), bank.delay(), vec![0xEE; 4096], 0).unwrap();
    oled.configure(&PinGroup::new(17, 27, 4, 24)).unwrap();
    bank.trace().clear();
    oled.refresh().unwrap();
    assert_eq!(bank.trace().decode().len(), 8 * (3 + 128));
}

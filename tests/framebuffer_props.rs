//! Properties of the page-major pixel model.

use spi_oled::ssd1306::graphics::{byte_index, pixel_address};
use spi_oled::ssd1306::{BUFFER_SIZE, HEIGHT, WIDTH};
use spi_oled::{FontSize, Framebuffer, MonoFontTable};

proptest::proptest! {
    /// A set pixel reads back set, clearing it reads back clear, and no
    /// other pixel changes.
    #[test]
    fn draw_point_reads_back(x in 0u32..WIDTH, y in 0u32..HEIGHT, fill in proptest::bool::ANY) {
        let mut buf = vec![if fill { 0xFF } else { 0x00 }; BUFFER_SIZE];
        let before = buf.clone();
        let mut fb = Framebuffer::bind(&mut buf).unwrap();

        fb.draw_point(x, y, true);
        assert_eq!(fb.pixel(x, y), Some(true));
        fb.draw_point(x, y, false);
        assert_eq!(fb.pixel(x, y), Some(false));
        fb.draw_point(x, y, fill);
        assert_eq!(fb.as_bytes(), &before[..]);
    }

    /// The byte for (x, y) is page * 128 + x, with bit 7 the top row.
    #[test]
    fn pixel_address_is_page_major(x in 0u32..WIDTH, y in 0u32..HEIGHT) {
        let (index, mask) = pixel_address(x, y).unwrap();
        assert_eq!(index, ((y / 8) * WIDTH + x) as usize);
        assert_eq!(mask, 0x80 >> (y % 8));
        assert_eq!(byte_index(y / 8, x), Some(index));
    }

    /// Drawing outside the panel changes nothing.
    #[test]
    fn out_of_range_points_are_ignored(x in WIDTH..1000u32, y in HEIGHT..1000u32) {
        let mut buf = vec![0u8; BUFFER_SIZE];
        let mut fb = Framebuffer::bind(&mut buf).unwrap();
        fb.draw_point(x, 0, true);
        fb.draw_point(0, y, true);
        assert_eq!(fb.pixel(x, y), None);
        assert!(fb.as_bytes().iter().all(|&b| b == 0));
    }

    /// fill_region sets exactly the inclusive rectangle.
    #[test]
    fn fill_region_is_inclusive(x1 in 0u32..WIDTH, y1 in 0u32..HEIGHT, w in 0u32..20, h in 0u32..20) {
        let (x2, y2) = ((x1 + w).min(WIDTH - 1), (y1 + h).min(HEIGHT - 1));
        let mut buf = vec![0u8; BUFFER_SIZE];
        let mut fb = Framebuffer::bind(&mut buf).unwrap();
        fb.fill_region(x1, y1, x2, y2, true);
        for x in 0..WIDTH {
            for y in 0..HEIGHT {
                let inside = (x1..=x2).contains(&x) && (y1..=y2).contains(&y);
                assert_eq!(fb.pixel(x, y), Some(inside));
            }
        }
    }
}

#[test]
fn clear_and_fill_white_cover_every_byte() {
    let mut buf = vec![0x5Au8; BUFFER_SIZE];
    let mut fb = Framebuffer::bind(&mut buf).unwrap();
    fb.fill_white();
    fb.fill_white();
    assert!(fb.as_bytes().iter().all(|&b| b == 0xFF));
    fb.clear();
    assert_eq!(fb.as_bytes().len(), 1024);
    assert!(fb.as_bytes().iter().all(|&b| b == 0x00));
}

#[test]
fn fill_white_after_clear_matches_a_single_fill() {
    let mut once = vec![0x3Cu8; BUFFER_SIZE];
    Framebuffer::bind(&mut once).unwrap().fill_white();

    let mut cycled = vec![0xC3u8; BUFFER_SIZE];
    let mut fb = Framebuffer::bind(&mut cycled).unwrap();
    fb.fill_white();
    fb.clear();
    fb.fill_white();
    assert_eq!(fb.as_bytes(), &once[..]);
}

#[test]
fn short_buffers_cannot_be_bound() {
    let mut buf = vec![0u8; BUFFER_SIZE - 1];
    assert!(Framebuffer::bind(&mut buf).is_err());
}

#[test]
fn string_past_the_bottom_clears_and_restarts_at_origin() {
    let fonts = MonoFontTable::new();
    let mut buf = vec![0u8; BUFFER_SIZE];
    let mut fb = Framebuffer::bind(&mut buf).unwrap();
    // junk that must disappear
    fb.fill_region(100, 0, 127, 63, true);

    // y = 60 leaves no room for a 24 pixel glyph
    fb.draw_string(&fonts, 0, 60, "A", FontSize::S24);

    let lit_outside_first_cell = (0..WIDTH)
        .flat_map(|x| (0..HEIGHT).map(move |y| (x, y)))
        .filter(|&(x, y)| x >= 12 || y >= 24)
        .any(|(x, y)| fb.pixel(x, y) == Some(true));
    assert!(!lit_outside_first_cell);
    assert!((0..12).any(|x| (0..24).any(|y| fb.pixel(x, y) == Some(true))));
}

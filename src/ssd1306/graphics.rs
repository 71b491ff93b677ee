//! Framebuffer and drawing primitives
//!
//! A [`Framebuffer`] is bound over a byte slice that is at least
//! [`BUFFER_SIZE`] long, usually the shared mapping of the daemon's buffer.
//! Out of range coordinates are ignored rather than reported, so callers can
//! draw partially visible shapes without clipping first.

use std::convert::Infallible;

use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};

use crate::error::{OledError, Result};
use crate::ssd1306::font::{BitmapTable, FontSize, FontTable, FIRST_CHAR, LAST_CHAR};
use crate::ssd1306::{BUFFER_SIZE, HEIGHT, PAGES, WIDTH};

/// Offset of the byte holding `column` of `page`, page-major
pub fn byte_index(page: u32, column: u32) -> Option<usize> {
    if page >= PAGES || column >= WIDTH {
        return None;
    }
    Some((page * WIDTH + column) as usize)
}

/// Byte offset and bit mask of pixel `(x, y)`; bit 7 is the top row of a page
pub fn pixel_address(x: u32, y: u32) -> Option<(usize, u8)> {
    if y >= HEIGHT {
        return None;
    }
    let index = byte_index(y / 8, x)?;
    Some((index, 1 << (7 - y % 8)))
}

/// Monochrome 128x64 drawing surface over a borrowed buffer
pub struct Framebuffer<'a> {
    buf: &'a mut [u8],
}

impl<'a> Framebuffer<'a> {
    /// Bind to `buf`. Bytes past [`BUFFER_SIZE`] are padding and only touched
    /// by [`Self::clear`] and [`Self::fill_white`].
    pub fn bind(buf: &'a mut [u8]) -> Result<Self> {
        if buf.len() < BUFFER_SIZE {
            return Err(OledError::SizeMismatch {
                requested: BUFFER_SIZE,
                available: buf.len(),
            });
        }
        Ok(Self { buf })
    }

    /// The pixel bytes, [`BUFFER_SIZE`] long
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..BUFFER_SIZE]
    }

    /// Read back one pixel, `None` when out of range
    pub fn pixel(&self, x: u32, y: u32) -> Option<bool> {
        let (index, mask) = pixel_address(x, y)?;
        Some(self.buf[index] & mask != 0)
    }

    pub fn draw_point(&mut self, x: u32, y: u32, set: bool) {
        let Some((index, mask)) = pixel_address(x, y) else {
            return;
        };
        if set {
            self.buf[index] |= mask;
        } else {
            self.buf[index] &= !mask;
        }
    }

    pub fn clear(&mut self) {
        self.buf.fill(0x00);
    }

    pub fn fill_white(&mut self) {
        self.buf.fill(0xFF);
    }

    /// Set or clear every pixel of the inclusive rectangle `(x1,y1)..=(x2,y2)`
    pub fn fill_region(&mut self, x1: u32, y1: u32, x2: u32, y2: u32, set: bool) {
        for x in x1..=x2.min(WIDTH - 1) {
            for y in y1..=y2.min(HEIGHT - 1) {
                self.draw_point(x, y, set);
            }
        }
    }

    /// Stream column-major bitmap bytes MSB first, wrapping to the next
    /// column after `height` rows. Unused low bits of a column's last byte
    /// are skipped. Stops at the right edge.
    fn blit_columns(&mut self, bytes: &[u8], x: u32, y: u32, height: u32, fg: bool, bg: bool) {
        if height == 0 || x >= WIDTH || y >= HEIGHT {
            return;
        }
        let (mut cx, mut row) = (x, 0u32);
        for &byte in bytes {
            let mut bits = byte;
            for _ in 0..8 {
                let set = if bits & 0x80 != 0 { fg } else { bg };
                self.draw_point(cx, y.saturating_add(row), set);
                bits <<= 1;
                row += 1;
                if row == height {
                    row = 0;
                    cx += 1;
                    if cx >= WIDTH {
                        return;
                    }
                    break;
                }
            }
        }
    }

    /// Draw one printable ASCII character. Glyph bits draw `set`, the rest of
    /// the cell draws `!set`. Characters outside `' '..='~'` and glyphs
    /// missing from `fonts` are ignored.
    pub fn draw_char<F>(&mut self, fonts: &F, x: u32, y: u32, ch: u8, size: FontSize, set: bool)
    where
        F: FontTable + ?Sized,
    {
        if !(FIRST_CHAR..=LAST_CHAR).contains(&ch) {
            return;
        }
        let Some(glyph) = fonts.glyph(size, usize::from(ch - FIRST_CHAR)) else {
            return;
        };
        let len = glyph.len().min(size.glyph_bytes());
        self.blit_columns(&glyph[..len], x, y, size.px(), set, !set);
    }

    /// Draw a full-width glyph, `size` pixels wide, from the wide table
    pub fn draw_wide_char<F>(
        &mut self,
        fonts: &F,
        x: u32,
        y: u32,
        index: usize,
        size: FontSize,
        set: bool,
    ) where
        F: FontTable + ?Sized,
    {
        let Some(glyph) = fonts.wide_glyph(size, index) else {
            return;
        };
        let len = glyph.len().min(size.wide_glyph_bytes());
        self.blit_columns(&glyph[..len], x, y, size.px(), set, !set);
    }

    /// Draw text left to right, stopping at the first non-printable byte.
    ///
    /// Wraps to a new line when the next glyph would cross the right edge.
    /// When a line would cross the bottom edge the whole buffer is cleared
    /// and drawing restarts at the top-left corner.
    pub fn draw_string<F>(&mut self, fonts: &F, x: u32, y: u32, text: &str, size: FontSize)
    where
        F: FontTable + ?Sized,
    {
        let (mut x, mut y) = (x, y);
        for ch in text.bytes() {
            if !(FIRST_CHAR..=LAST_CHAR).contains(&ch) {
                break;
            }
            if x > WIDTH - size.advance() {
                x = 0;
                y = y.saturating_add(size.px());
            }
            if y > HEIGHT - size.px() {
                x = 0;
                y = 0;
                self.clear();
            }
            self.draw_char(fonts, x, y, ch, size, true);
            x += size.advance();
        }
    }

    /// Draw `num` as `len` decimal digits, leading zeros shown as blanks
    pub fn draw_number<F>(&mut self, fonts: &F, x: u32, y: u32, num: u32, len: u32, size: FontSize)
    where
        F: FontTable + ?Sized,
    {
        let mut leading = true;
        for t in 0..len {
            let weight = 10u64.checked_pow(len - 1 - t).unwrap_or(u64::MAX);
            let digit = (u64::from(num) / weight % 10) as u8;
            let Some(cx) = size
                .advance()
                .checked_mul(t)
                .and_then(|dx| x.checked_add(dx))
                .filter(|&cx| cx < WIDTH)
            else {
                break;
            };

            if leading && t < len - 1 {
                if digit == 0 {
                    self.draw_char(fonts, cx, y, b' ', size, true);
                    continue;
                }
                leading = false;
            }
            self.draw_char(fonts, cx, y, b'0' + digit, size, true);
        }
    }

    /// Draw frame `frame` of `frames`, a `w` x `h` column-major bitmap.
    /// Missing frames are ignored.
    pub fn draw_bitmap_frame<B>(&mut self, frames: &B, x: u32, y: u32, frame: usize, w: u32, h: u32)
    where
        B: BitmapTable + ?Sized,
    {
        let Some(bytes) = frames.frame(frame) else {
            return;
        };
        let expected = u64::from(h.div_ceil(8)) * u64::from(w);
        let len = usize::try_from(expected).map_or(bytes.len(), |n| bytes.len().min(n));
        self.blit_columns(&bytes[..len], x, y, h, true, false);
    }
}

impl OriginDimensions for Framebuffer<'_> {
    fn size(&self) -> Size {
        Size::new(WIDTH, HEIGHT)
    }
}

impl DrawTarget for Framebuffer<'_> {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(Point { x, y }, color) in pixels {
            if x < 0 || y < 0 {
                continue;
            }
            self.draw_point(x as u32, y as u32, color.is_on());
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        if color.is_on() {
            self.fill_white();
        } else {
            Framebuffer::clear(self);
        }
        Ok(())
    }
}

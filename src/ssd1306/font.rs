//! Glyph and bitmap lookup tables
//!
//! The drawing code only sees column-major bitmaps: each column is
//! `ceil(height / 8)` bytes, MSB first from the top, and columns follow each
//! other left to right. Where those bytes come from is behind [`FontTable`]
//! and [`BitmapTable`].

use std::convert::Infallible;

use embedded_graphics::{
    mono_font::{
        ascii::{FONT_10X20, FONT_6X12, FONT_8X13},
        MonoFont, MonoTextStyle,
    },
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};

/// First printable character, glyph index 0
pub const FIRST_CHAR: u8 = b' ';
/// Last printable character
pub const LAST_CHAR: u8 = b'~';
/// Glyphs per table, `' '..='~'`
pub const GLYPH_COUNT: usize = (LAST_CHAR - FIRST_CHAR + 1) as usize;

/// Supported glyph heights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontSize {
    S12,
    S16,
    S24,
}

impl FontSize {
    pub const ALL: [FontSize; 3] = [Self::S12, Self::S16, Self::S24];

    /// Glyph height in pixels
    pub const fn px(self) -> u32 {
        match self {
            Self::S12 => 12,
            Self::S16 => 16,
            Self::S24 => 24,
        }
    }

    /// Width of a half-width (Latin) glyph, also the cursor advance
    pub const fn advance(self) -> u32 {
        self.px() / 2
    }

    /// Bytes in one glyph column
    pub const fn column_bytes(self) -> usize {
        self.px().div_ceil(8) as usize
    }

    /// Bytes per half-width glyph
    pub const fn glyph_bytes(self) -> usize {
        self.column_bytes() * self.advance() as usize
    }

    /// Bytes per double-byte (full-width) glyph
    pub const fn wide_glyph_bytes(self) -> usize {
        self.column_bytes() * self.px() as usize
    }
}

impl TryFrom<u32> for FontSize {
    type Error = u32;

    fn try_from(px: u32) -> Result<Self, u32> {
        match px {
            12 => Ok(Self::S12),
            16 => Ok(Self::S16),
            24 => Ok(Self::S24),
            other => Err(other),
        }
    }
}

/// Fixed-width glyph bitmaps keyed by size
pub trait FontTable {
    /// Half-width glyph number `index` (`ch - ' '`), [`FontSize::glyph_bytes`] long
    fn glyph(&self, size: FontSize, index: usize) -> Option<&[u8]>;

    /// Full-width glyph number `index`, [`FontSize::wide_glyph_bytes`] long
    fn wide_glyph(&self, _size: FontSize, _index: usize) -> Option<&[u8]> {
        None
    }
}

/// Indexed image frames, e.g. the steps of an animation
pub trait BitmapTable {
    fn frame(&self, index: usize) -> Option<&[u8]>;

    fn frame_count(&self) -> usize;
}

impl<'a> BitmapTable for [&'a [u8]] {
    fn frame(&self, index: usize) -> Option<&[u8]> {
        self.get(index).copied()
    }

    fn frame_count(&self) -> usize {
        self.len()
    }
}

/// A small canvas one glyph cell large, used to rasterise mono fonts
struct GlyphCell {
    size: Size,
    pixels: Vec<bool>,
}

impl GlyphCell {
    fn new(width: u32, height: u32) -> Self {
        Self {
            size: Size::new(width, height),
            pixels: vec![false; (width * height) as usize],
        }
    }

    /// Pack into columns, MSB first from the top
    fn to_columns(&self) -> Vec<u8> {
        let column_bytes = self.size.height.div_ceil(8) as usize;
        let mut out = vec![0u8; column_bytes * self.size.width as usize];
        for x in 0..self.size.width {
            for y in 0..self.size.height {
                if self.pixels[(y * self.size.width + x) as usize] {
                    let index = x as usize * column_bytes + (y / 8) as usize;
                    out[index] |= 0x80 >> (y % 8);
                }
            }
        }
        out
    }
}

impl OriginDimensions for GlyphCell {
    fn size(&self) -> Size {
        self.size
    }
}

impl DrawTarget for GlyphCell {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(Point { x, y }, color) in pixels {
            if x < 0 || y < 0 || x as u32 >= self.size.width || y as u32 >= self.size.height {
                continue;
            }
            self.pixels[(y as u32 * self.size.width + x as u32) as usize] = color.is_on();
        }
        Ok(())
    }
}

/// Glyph tables rasterised from the embedded-graphics mono fonts
pub struct MonoFontTable {
    tables: [Vec<u8>; 3],
}

impl MonoFontTable {
    pub fn new() -> Self {
        Self {
            tables: [
                Self::rasterize(&FONT_6X12, FontSize::S12),
                Self::rasterize(&FONT_8X13, FontSize::S16),
                Self::rasterize(&FONT_10X20, FontSize::S24),
            ],
        }
    }

    fn rasterize(font: &MonoFont<'_>, size: FontSize) -> Vec<u8> {
        let cell_w = size.advance();
        let cell_h = size.px();
        // centre the font inside the cell
        let dx = cell_w.saturating_sub(font.character_size.width) / 2;
        let dy = cell_h.saturating_sub(font.character_size.height) / 2;
        let style = MonoTextStyle::new(font, BinaryColor::On);

        let mut table = Vec::with_capacity(GLYPH_COUNT * size.glyph_bytes());
        for ch in FIRST_CHAR..=LAST_CHAR {
            let mut cell = GlyphCell::new(cell_w, cell_h);
            let mut utf8 = [0u8; 4];
            let text = char::from(ch).encode_utf8(&mut utf8);
            // Infallible target
            let _ = Text::with_baseline(
                text,
                Point::new(dx as i32, dy as i32),
                style,
                Baseline::Top,
            )
            .draw(&mut cell);
            table.extend_from_slice(&cell.to_columns());
        }
        table
    }

    fn table(&self, size: FontSize) -> &[u8] {
        match size {
            FontSize::S12 => &self.tables[0],
            FontSize::S16 => &self.tables[1],
            FontSize::S24 => &self.tables[2],
        }
    }
}

impl Default for MonoFontTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FontTable for MonoFontTable {
    fn glyph(&self, size: FontSize, index: usize) -> Option<&[u8]> {
        let len = size.glyph_bytes();
        let start = index.checked_mul(len)?;
        self.table(size).get(start..start + len)
    }
}

/// Frames packed by `build.rs`: `count:u16le width:u8 height:u8`, then frames
pub struct FrameTable<'a> {
    width: u32,
    height: u32,
    frames: Vec<&'a [u8]>,
}

impl<'a> FrameTable<'a> {
    pub fn parse(bytes: &'a [u8]) -> Self {
        let empty = Self {
            width: 0,
            height: 0,
            frames: Vec::new(),
        };
        let [c0, c1, w, h, rest @ ..] = bytes else {
            return empty;
        };
        let count = usize::from(u16::from_le_bytes([*c0, *c1]));
        let (width, height) = (u32::from(*w), u32::from(*h));
        let frame_len = (height.div_ceil(8) * width) as usize;
        if frame_len == 0 || rest.len() < count * frame_len {
            log::warn!(
                "Frame table truncated: {} frames of {} bytes announced, {} bytes present",
                count,
                frame_len,
                rest.len()
            );
            return empty;
        }
        Self {
            width,
            height,
            frames: rest.chunks_exact(frame_len).take(count).collect(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl FrameTable<'static> {
    /// Frames converted from `assets/frames/*.png` at build time
    pub fn builtin() -> Self {
        Self::parse(include_bytes!(concat!(env!("OUT_DIR"), "/frames.bin")))
    }
}

impl BitmapTable for FrameTable<'_> {
    fn frame(&self, index: usize) -> Option<&[u8]> {
        self.frames.get(index).copied()
    }

    fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

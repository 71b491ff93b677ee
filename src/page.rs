//! Screens drawn by the `show` client, one per `--page`

use chrono::NaiveDateTime;

use crate::ssd1306::font::{BitmapTable, FontSize, FontTable, FrameTable};
use crate::ssd1306::graphics::Framebuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    /// Date and time
    Clock,
    /// A fixed line of text
    Text,
    /// Built-in frames, one per tick
    Animation,
}

impl TryFrom<u8> for Page {
    type Error = u8;

    fn try_from(n: u8) -> Result<Self, u8> {
        match n {
            1 => Ok(Self::Clock),
            2 => Ok(Self::Text),
            3 => Ok(Self::Animation),
            other => Err(other),
        }
    }
}

/// Draws one page per tick into a bound framebuffer
pub struct PageRenderer<'a, F: ?Sized> {
    page: Page,
    text: String,
    fonts: &'a F,
    frames: &'a FrameTable<'a>,
    tick: usize,
}

impl<'a, F: FontTable + ?Sized> PageRenderer<'a, F> {
    pub fn new(page: Page, text: impl Into<String>, fonts: &'a F, frames: &'a FrameTable<'a>) -> Self {
        Self {
            page,
            text: text.into(),
            fonts,
            frames,
            tick: 0,
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    /// Clear the buffer and draw the page for time `now`
    pub fn render(&mut self, fb: &mut Framebuffer<'_>, now: NaiveDateTime) {
        fb.clear();
        match self.page {
            Page::Clock => {
                let date = now.format("%Y-%m-%d").to_string();
                let time = now.format("%H:%M:%S").to_string();
                fb.draw_string(self.fonts, 0, 30, &date, FontSize::S12);
                fb.draw_string(self.fonts, 0, 40, &time, FontSize::S24);
            }
            Page::Text => {
                fb.draw_string(self.fonts, 0, 0, &self.text, FontSize::S16);
            }
            Page::Animation => {
                let count = self.frames.frame_count();
                if count > 0 {
                    let frame = self.tick % count;
                    fb.draw_bitmap_frame(
                        self.frames,
                        0,
                        0,
                        frame,
                        self.frames.width(),
                        self.frames.height(),
                    );
                }
            }
        }
        self.tick = self.tick.wrapping_add(1);
    }
}

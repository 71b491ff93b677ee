//! SSD1306 OLED Display Driver
//!
//! Used with the common 0.96" 128x64 monochrome OLED modules wired to four
//! plain GPIO lines (SCL, MOSI, RES, DC) instead of a hardware SPI block.
//!
//! ### Usage
//! This driver does not hide that you're working with one page-major buffer.
//! To display something you:
//!
//! 1. configure the pins with [`driver::Ssd1306::configure`], which runs the
//!    power-on sequence and clears the panel
//! 1. draw into a [`graphics::Framebuffer`] bound over the shared buffer
//! 1. push it out with [`driver::Ssd1306::refresh`]
//!
//! ### Buffer layout
//!
//! ```text
//! [0] 0 1 2 3 ... 127   page 0, rows 0..7
//! [1] 0 1 2 3 ... 127   page 1, rows 8..15
//! ...
//! [7] 0 1 2 3 ... 127   page 7, rows 56..63
//! ```
//!
//! Inside a byte, bit 7 is the topmost of the eight rows it covers.

pub mod cmd;
pub mod driver;
pub mod flag;
pub mod font;
pub mod graphics;
pub mod interface;
pub mod pins;

/// Display width, pixels horizontally
pub const WIDTH: u32 = 128;

/// Display height, pixels vertically
pub const HEIGHT: u32 = 64;

/// Number of 8-row pages
pub const PAGES: u32 = HEIGHT / 8;

/// Bytes needed for one full frame
pub const BUFFER_SIZE: usize = (WIDTH * HEIGHT / 8) as usize;

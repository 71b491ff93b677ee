//! Bit-banged SSD1306 OLED driver with a shared-memory framebuffer
//!
//! The daemon half owns one [`Ssd1306`] session: four GPIO lines, the
//! controller's power-on sequence and a page-major framebuffer that it
//! streams to the panel on request. Rendering processes talk to it through
//! [`control::Session`], map the framebuffer into their own address space,
//! draw into it and ask for a refresh.

pub mod config;
pub mod control;
pub mod error;
#[cfg(target_os = "linux")]
pub mod gpio;
pub mod mock;
pub mod page;
pub mod shm;
pub mod ssd1306;

pub use crate::error::{ErrorKind, OledError, Result};
pub use crate::ssd1306::cmd::Cmd;
pub use crate::ssd1306::driver::{DeviceState, Ssd1306};
pub use crate::ssd1306::flag::Flag;
pub use crate::ssd1306::font::{FontSize, FontTable, FrameTable, MonoFontTable};
pub use crate::ssd1306::graphics::Framebuffer;
pub use crate::ssd1306::pins::{PinBank, PinGroup, PinRole};

//! SSD1306 Display Driver Implementation
//!
//! This module contains the device session for one SSD1306 panel: the pins it
//! owns, the framebuffer it refreshes from, and the lifecycle between them.
//!
//! ## Lifecycle
//!
//! ```text
//! Unbound -> PinsAcquired -> Initialized -> Open <-> Closed
//!                                              \        /
//!                                               Released
//! ```
//!
//! - `configure()` - acquire pins, run the power-on sequence, clear the panel
//! - `open()` / `close()` - charge pump and display on/off
//! - `refresh()` - stream the framebuffer to the panel
//! - `release()` - give all pins back, valid from any state
//!
//! Every bus operation except `configure()` fails with
//! [`OledError::NotConfigured`] unless all four pins are held.
//!
//! ## Page order
//!
//! The panel is mounted so that its page 0 is the bottom strip of the image.
//! `refresh()` therefore feeds hardware page `i` from framebuffer page
//! `7 - i`, which keeps `(0, 0)` at the top-left corner.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::error::{OledError, Result};
use crate::ssd1306::graphics::{byte_index, Framebuffer};
use crate::ssd1306::interface::DisplayInterface;
use crate::ssd1306::pins::{PinBank, PinGroup, PinRequestState, PinSlots};
use crate::ssd1306::{cmd::Cmd, flag::Flag, BUFFER_SIZE, PAGES, WIDTH};

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Unbound,
    PinsAcquired,
    Initialized,
    Open,
    Closed,
    Released,
}

/// Controller bring-up, sent as commands right after the reset pulse
pub const POWER_ON_SEQUENCE: [u8; 25] = [
    Cmd::DISPLAY_OFF,
    Cmd::SET_CLOCK_DIV,
    Flag::CLOCK_DIV_DEFAULT,
    Cmd::SET_MUX_RATIO,
    Flag::MUX_RATIO_64,
    Cmd::SET_DISPLAY_OFFSET,
    Flag::DISPLAY_OFFSET_NONE,
    Cmd::SET_START_LINE,
    Cmd::CHARGE_PUMP,
    Flag::CHARGE_PUMP_ENABLE,
    Cmd::MEMORY_MODE,
    Flag::ADDRESSING_PAGE,
    Cmd::SEGMENT_REMAP,
    Cmd::COM_SCAN_NORMAL,
    Cmd::SET_COM_PINS,
    Flag::COM_PINS_ALTERNATIVE,
    Cmd::SET_CONTRAST,
    Flag::CONTRAST_BRIGHT,
    Cmd::SET_PRECHARGE,
    Flag::PRECHARGE_DEFAULT,
    Cmd::SET_VCOMH,
    Flag::VCOMH_083,
    Cmd::ENTIRE_DISPLAY_RESUME,
    Cmd::NORMAL_DISPLAY,
    Cmd::DISPLAY_ON,
];

/// Charge pump on, display on
pub const DISPLAY_ON_SEQUENCE: [u8; 3] = [
    Cmd::CHARGE_PUMP,
    Flag::CHARGE_PUMP_ENABLE,
    Cmd::DISPLAY_ON,
];

/// Charge pump off, display off
pub const DISPLAY_OFF_SEQUENCE: [u8; 3] = [
    Cmd::CHARGE_PUMP,
    Flag::CHARGE_PUMP_DISABLE,
    Cmd::DISPLAY_OFF,
];

/// SSD1306 device session
///
/// ## Type Parameters
///
/// - `B` - Source of the four output lines
/// - `D` - Delay provider for the reset pulse and edge timing
/// - `S` - Framebuffer storage, at least [`BUFFER_SIZE`] bytes
pub struct Ssd1306<B: PinBank, D, S> {
    bank: B,
    interface: DisplayInterface<B::Pin, D>,
    buffer: S,
    group: Option<PinGroup>,
    state: DeviceState,
}

impl<B, D, S> Ssd1306<B, D, S>
where
    B: PinBank,
    B::Pin: OutputPin,
    D: DelayNs,
    S: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Create an unconfigured session. Nothing touches the hardware yet.
    pub fn new(bank: B, delay: D, buffer: S, edge_delay_ns: u32) -> Result<Self> {
        let available = buffer.as_ref().len();
        if available < BUFFER_SIZE {
            return Err(OledError::SizeMismatch {
                requested: BUFFER_SIZE,
                available,
            });
        }
        Ok(Self {
            bank,
            interface: DisplayInterface::new(delay, edge_delay_ns),
            buffer,
            group: None,
            state: DeviceState::Unbound,
        })
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn pin_state(&self) -> PinRequestState {
        self.interface.pins().state()
    }

    /// Pins bound by the last successful acquisition
    pub fn pin_group(&self) -> Option<PinGroup> {
        self.group
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn is_configured(&self) -> bool {
        self.pin_state().is_full()
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.is_configured() {
            Ok(())
        } else {
            log::warn!(
                "Rejected bus operation, pins not set (request state {:04b})",
                self.pin_state().bits()
            );
            Err(OledError::NotConfigured)
        }
    }

    /// Full length of the backing region, padding included
    pub fn buffer_len(&self) -> usize {
        self.buffer.as_ref().len()
    }

    pub fn buffer(&self) -> &[u8] {
        self.buffer.as_ref()
    }

    /// The backing storage itself, e.g. the shared region
    pub fn storage(&self) -> &S {
        &self.buffer
    }

    /// Bind a drawing surface over the session's buffer
    pub fn framebuffer(&mut self) -> Result<Framebuffer<'_>> {
        Framebuffer::bind(self.buffer.as_mut())
    }

    /// Acquire all four pins as a unit and drive them to their idle levels
    pub fn acquire_pins(&mut self, group: &PinGroup) -> Result<()> {
        log::info!("Trying to init GPIO {}", group);
        let pins = PinSlots::acquire(&mut self.bank, group)?;
        self.interface.attach(pins);
        self.group = Some(*group);
        self.state = DeviceState::PinsAcquired;
        Ok(())
    }

    /// Reset pulse followed by [`POWER_ON_SEQUENCE`]
    pub fn power_on(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.interface.reset()?;
        self.interface.cmds(&POWER_ON_SEQUENCE)?;
        self.state = DeviceState::Initialized;
        Ok(())
    }

    /// Acquire pins, bring up the controller and clear the panel.
    ///
    /// Does nothing when the session is already configured. A failure after
    /// the pins were taken gives them back before returning.
    pub fn configure(&mut self, group: &PinGroup) -> Result<()> {
        if self.is_configured() {
            log::info!("GPIO has been configured. Nothing to do.");
            return Ok(());
        }

        self.acquire_pins(group)?;
        if let Err(e) = self.power_on().and_then(|_| self.clear()) {
            log::error!("OLED init failed, releasing GPIO: {}", e);
            self.release();
            return Err(e);
        }

        self.state = DeviceState::Open;
        log::info!("The OLED init success!");
        Ok(())
    }

    /// Stream the framebuffer to the panel, one page at a time
    pub fn refresh(&mut self) -> Result<()> {
        self.ensure_ready()?;
        let buffer = self.buffer.as_ref();

        for hw_page in 0..PAGES {
            let page = PAGES - 1 - hw_page;
            let Some(start) = byte_index(page, 0) else {
                continue;
            };
            let end = start + WIDTH as usize;
            if end > buffer.len() {
                log::warn!("Page {} exceeds buffer of {} bytes, skipped", page, buffer.len());
                continue;
            }

            self.interface.cmds(&[
                Cmd::SET_PAGE_START + hw_page as u8,
                Cmd::SET_LOW_COLUMN,
                Cmd::SET_HIGH_COLUMN,
            ])?;
            self.interface.data(&buffer[start..end])?;
        }

        log::debug!("OLED refreshed");
        Ok(())
    }

    /// Zero the framebuffer and refresh
    pub fn clear(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.buffer.as_mut().fill(0);
        self.refresh()
    }

    /// Charge pump and display on
    pub fn open(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.interface.cmds(&DISPLAY_ON_SEQUENCE)?;
        self.state = DeviceState::Open;
        log::info!("OLED turned on");
        Ok(())
    }

    /// Display and charge pump off
    pub fn close(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.interface.cmds(&DISPLAY_OFF_SEQUENCE)?;
        self.state = DeviceState::Closed;
        log::info!("OLED turned off");
        Ok(())
    }

    /// Copy `data` into the framebuffer at `offset`, then refresh.
    /// Nothing is copied when the range does not fit.
    pub fn write(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        self.ensure_ready()?;
        let size = self.buffer_len();
        let end = offset.checked_add(data.len()).filter(|&end| end <= size);
        let Some(end) = end else {
            log::error!(
                "Write size {} at offset {} exceeds buffer size {}",
                data.len(),
                offset,
                size
            );
            return Err(OledError::OutOfBounds {
                offset,
                len: data.len(),
                size,
            });
        };
        self.buffer.as_mut()[offset..end].copy_from_slice(data);
        self.refresh()
    }

    /// Give every pin back. Safe to call in any state, any number of times.
    pub fn release(&mut self) {
        let had_pins = !self.pin_state().is_empty();
        self.interface.pins_mut().release_all();
        if had_pins || self.state != DeviceState::Unbound {
            self.state = DeviceState::Released;
            log::info!("Free GPIO");
        }
    }

    /// End of a client session: power the panel down if we can, then release
    pub fn shutdown(&mut self) {
        if self.is_configured() {
            if let Err(e) = self.close() {
                log::warn!("Display off during shutdown failed: {}", e);
            }
        }
        self.release();
    }
}

impl<B: PinBank, D, S> Drop for Ssd1306<B, D, S> {
    fn drop(&mut self) {
        self.interface.pins_mut().release_all();
    }
}

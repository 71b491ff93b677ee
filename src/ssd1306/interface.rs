//! Display interface using bit-banged GPIO
//!
//! Clocks bytes out MSB first on SCL/MOSI, with DC selecting command or data.
//! The controller samples MOSI on the rising SCL edge.
use embedded_hal::{
    delay::DelayNs,
    digital::{OutputPin, PinState},
};

use crate::error::{OledError, Result};
use crate::ssd1306::pins::{PinRole, PinSlots};
use display_interface::DisplayError;

/// Reset pulse width in milliseconds
pub const RESET_PULSE_MS: u32 = 100;

/// Whether a byte on the bus is a command or pixel data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataMode {
    Command,
    Data,
}

impl DataMode {
    /// DC level for this mode
    pub const fn level(self) -> PinState {
        match self {
            Self::Command => PinState::Low,
            Self::Data => PinState::High,
        }
    }
}

fn drive<P: OutputPin>(pin: &mut P, role: PinRole, level: PinState) -> Result<()> {
    pin.set_state(level).map_err(|_| OledError::Io {
        role,
        error: match role {
            PinRole::Select => DisplayError::DCError,
            PinRole::Reset => DisplayError::RSError,
            PinRole::Clock | PinRole::Data => DisplayError::BusWriteError,
        },
    })
}

/// The connection to the panel: the four owned lines plus a delay source
pub struct DisplayInterface<P, D> {
    pins: PinSlots<P>,
    delay: D,
    /// Pause after every pin level change, 0 disables it
    edge_delay_ns: u32,
}

impl<P, D> DisplayInterface<P, D> {
    /// Create an interface that holds no pins yet
    pub fn new(delay: D, edge_delay_ns: u32) -> Self {
        DisplayInterface {
            pins: PinSlots::default(),
            delay,
            edge_delay_ns,
        }
    }

    pub fn pins(&self) -> &PinSlots<P> {
        &self.pins
    }

    pub fn pins_mut(&mut self) -> &mut PinSlots<P> {
        &mut self.pins
    }

    /// Take ownership of a freshly acquired pin set, dropping any previous one
    pub fn attach(&mut self, pins: PinSlots<P>) {
        self.pins = pins;
    }
}

impl<P, D> DisplayInterface<P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    fn edge_delay(&mut self) {
        if self.edge_delay_ns > 0 {
            self.delay.delay_ns(self.edge_delay_ns);
        }
    }

    /// Send one byte. DC is left at the data level and SCL at idle-high.
    pub fn send_byte(&mut self, byte: u8, mode: DataMode) -> Result<()> {
        let edge_delay_ns = self.edge_delay_ns;
        let PinSlots {
            clock,
            data,
            select,
            ..
        } = &mut self.pins;
        let (Some(clock), Some(data), Some(select)) =
            (clock.as_mut(), data.as_mut(), select.as_mut())
        else {
            return Err(OledError::NotConfigured);
        };
        let delay = &mut self.delay;
        let mut pause = || {
            if edge_delay_ns > 0 {
                delay.delay_ns(edge_delay_ns);
            }
        };

        drive(select, PinRole::Select, mode.level())?;

        let mut bits = byte;
        for _ in 0..8 {
            drive(clock, PinRole::Clock, PinState::Low)?;
            pause();

            drive(data, PinRole::Data, PinState::from(bits & 0x80 != 0))?;
            pause();

            drive(clock, PinRole::Clock, PinState::High)?;
            pause();

            bits <<= 1;
        }

        // high for data when idle
        drive(select, PinRole::Select, PinState::High)
    }

    /// Basic function for sending commands
    pub fn cmd(&mut self, command: u8) -> Result<()> {
        self.send_byte(command, DataMode::Command)
    }

    /// Send a run of command bytes in order
    pub fn cmds(&mut self, commands: &[u8]) -> Result<()> {
        commands.iter().try_for_each(|&c| self.cmd(c))
    }

    /// Basic function for sending an array of u8-values of data
    pub fn data(&mut self, data: &[u8]) -> Result<()> {
        data.iter()
            .try_for_each(|&b| self.send_byte(b, DataMode::Data))
    }

    /// Pulse RES low for [`RESET_PULSE_MS`], then release it
    pub fn reset(&mut self) -> Result<()> {
        let reset = self.pins.reset.as_mut().ok_or(OledError::NotConfigured)?;
        drive(reset, PinRole::Reset, PinState::Low)?;
        self.delay.delay_ms(RESET_PULSE_MS);
        let reset = self.pins.reset.as_mut().ok_or(OledError::NotConfigured)?;
        drive(reset, PinRole::Reset, PinState::High)?;
        self.edge_delay();
        Ok(())
    }
}

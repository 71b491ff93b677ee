//! Pin roles, pin groups and pin ownership for the SSD1306 bit-banged bus
//!
//! The panel needs four output lines. They are requested from a [`PinBank`]
//! as a unit: either all four are owned by the driver, or none are.

use std::fmt;
use std::str::FromStr;

use embedded_hal::digital::{OutputPin, PinState};
use serde::{Deserialize, Serialize};

use crate::error::{OledError, Result};

/// Logical role of a line on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinRole {
    /// Serial clock, idle high
    Clock,
    /// Serial data out (MOSI)
    Data,
    /// Active-low controller reset
    Reset,
    /// Data/Command select (high for data, low for command)
    Select,
}

impl PinRole {
    pub const ALL: [PinRole; 4] = [Self::Clock, Self::Data, Self::Reset, Self::Select];

    /// Bit of this role in [`PinRequestState`]
    pub const fn bit(self) -> u8 {
        match self {
            Self::Clock => 1 << 0,
            Self::Data => 1 << 1,
            Self::Reset => 1 << 2,
            Self::Select => 1 << 3,
        }
    }

    /// Label handed to the pin bank as the consumer name
    pub const fn label(self) -> &'static str {
        match self {
            Self::Clock => "scl",
            Self::Data => "mosi",
            Self::Reset => "res",
            Self::Select => "dc",
        }
    }

    /// Level the line is driven to right after acquisition
    pub const fn idle_level(self) -> PinState {
        // Select idles at the data level, everything else high
        PinState::High
    }
}

impl fmt::Display for PinRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Clock => "SCL",
            Self::Data => "MOSI",
            Self::Reset => "RES",
            Self::Select => "DC",
        })
    }
}

/// Hardware line numbers bound to the four roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinGroup {
    pub clock: u32,
    pub data: u32,
    pub reset: u32,
    pub select: u32,
}

impl PinGroup {
    pub const fn new(clock: u32, data: u32, reset: u32, select: u32) -> Self {
        Self {
            clock,
            data,
            reset,
            select,
        }
    }

    pub const fn line(&self, role: PinRole) -> u32 {
        match role {
            PinRole::Clock => self.clock,
            PinRole::Data => self.data,
            PinRole::Reset => self.reset,
            PinRole::Select => self.select,
        }
    }

    /// Reject groups that bind one line to two roles
    pub fn validate(&self) -> Result<()> {
        for (i, a) in PinRole::ALL.iter().enumerate() {
            for b in &PinRole::ALL[i + 1..] {
                if self.line(*a) == self.line(*b) {
                    return Err(OledError::InvalidPins(format!(
                        "{} and {} both use line {}",
                        a,
                        b,
                        self.line(*a)
                    )));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for PinGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.clock, self.data, self.reset, self.select
        )
    }
}

/// Parses `"scl,mosi,res,dc"`, e.g. `"17,27,4,24"`
impl FromStr for PinGroup {
    type Err = OledError;

    fn from_str(s: &str) -> Result<Self> {
        let lines = s
            .split(',')
            .map(|token| {
                token
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| OledError::InvalidPins(format!("'{}' is not a line number", token)))
            })
            .collect::<Result<Vec<u32>>>()?;

        match lines.as_slice() {
            [clock, data, reset, select] => {
                let group = PinGroup::new(*clock, *data, *reset, *select);
                group.validate()?;
                Ok(group)
            }
            _ => Err(OledError::InvalidPins(format!(
                "expected 4 pins (scl,mosi,res,dc), got {}",
                lines.len()
            ))),
        }
    }
}

/// Which roles currently hold an acquired line, one bit per [`PinRole`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PinRequestState(u8);

impl PinRequestState {
    const FULL: u8 = 0b1111;

    pub fn set(&mut self, role: PinRole) {
        self.0 |= role.bit();
    }

    pub fn clear(&mut self, role: PinRole) {
        self.0 &= !role.bit();
    }

    pub fn contains(&self, role: PinRole) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn is_full(&self) -> bool {
        self.0 == Self::FULL
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn bits(&self) -> u8 {
        self.0
    }
}

/// Source of output lines, e.g. a GPIO character device
pub trait PinBank {
    type Pin: OutputPin;
    type Error: fmt::Display;

    /// Take exclusive ownership of `line` as an output driven to `level`.
    /// Dropping the returned pin gives the line back.
    fn request_output(
        &mut self,
        line: u32,
        role: PinRole,
        level: PinState,
    ) -> Result<Self::Pin, Self::Error>;
}

/// The four acquired lines, with per-role idempotent release
pub struct PinSlots<P> {
    pub(crate) clock: Option<P>,
    pub(crate) data: Option<P>,
    pub(crate) reset: Option<P>,
    pub(crate) select: Option<P>,
    state: PinRequestState,
}

impl<P> Default for PinSlots<P> {
    fn default() -> Self {
        Self {
            clock: None,
            data: None,
            reset: None,
            select: None,
            state: PinRequestState::default(),
        }
    }
}

impl<P> PinSlots<P> {
    /// Acquire the whole group. Lines taken before a failing request are
    /// dropped on the way out, so a failed call leaves nothing owned.
    pub fn acquire<B>(bank: &mut B, group: &PinGroup) -> Result<Self>
    where
        B: PinBank<Pin = P>,
    {
        group.validate()?;

        let mut slots = PinSlots::default();
        for role in PinRole::ALL {
            let line = group.line(role);
            let pin = bank
                .request_output(line, role, role.idle_level())
                .map_err(|e| {
                    log::error!("Failed to request {} GPIO {}: {}", role, line, e);
                    OledError::PinUnavailable {
                        role,
                        line,
                        reason: e.to_string(),
                    }
                })?;
            *slots.slot_mut(role) = Some(pin);
            slots.state.set(role);
        }
        Ok(slots)
    }

    fn slot_mut(&mut self, role: PinRole) -> &mut Option<P> {
        match role {
            PinRole::Clock => &mut self.clock,
            PinRole::Data => &mut self.data,
            PinRole::Reset => &mut self.reset,
            PinRole::Select => &mut self.select,
        }
    }

    /// Give one line back; releasing a line that is not held does nothing
    pub fn release(&mut self, role: PinRole) {
        if self.slot_mut(role).take().is_some() {
            log::debug!("Released {} GPIO", role);
        }
        self.state.clear(role);
    }

    pub fn release_all(&mut self) {
        for role in PinRole::ALL {
            self.release(role);
        }
    }

    pub fn state(&self) -> PinRequestState {
        self.state
    }
}

//! Simulated pin backend
//!
//! Used by the daemon's `--simulate` mode and by the tests. Every level
//! change is appended to a shared [`BusTrace`], and [`BusDecoder`] turns
//! that trace back into the bytes a real SSD1306 would have clocked in.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorType, OutputPin, PinState};

use crate::ssd1306::interface::DataMode;
use crate::ssd1306::pins::{PinBank, PinRole};

/// One observable thing that happened on the simulated lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinEvent {
    Acquired { line: u32, role: PinRole },
    Level { role: PinRole, level: PinState },
    Released { line: u32, role: PinRole },
    Sleep { ns: u64 },
}

#[derive(Default)]
struct Shared {
    recording: bool,
    events: Vec<PinEvent>,
    held: HashSet<u32>,
    busy_lines: HashSet<u32>,
    failing_lines: HashSet<u32>,
    acquisitions: usize,
}

/// Handle to the event log shared by a bank, its pins and its delay
#[derive(Clone, Default)]
pub struct BusTrace(Arc<Mutex<Shared>>);

impl BusTrace {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        // A panicking test thread must not hide the trace from the others
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, event: PinEvent) {
        let mut shared = self.lock();
        if shared.recording {
            shared.events.push(event);
        }
    }

    pub fn events(&self) -> Vec<PinEvent> {
        self.lock().events.clone()
    }

    pub fn clear(&self) {
        self.lock().events.clear();
    }

    /// Lines currently owned through this bank
    pub fn held_lines(&self) -> HashSet<u32> {
        self.lock().held.clone()
    }

    /// Successful line requests since creation
    pub fn acquisitions(&self) -> usize {
        self.lock().acquisitions
    }

    /// Decode the recorded level changes into bus bytes
    pub fn decode(&self) -> Vec<(u8, DataMode)> {
        BusDecoder::decode(&self.events())
    }

    /// Total time spent in the delay source
    pub fn slept_ns(&self) -> u64 {
        self.lock()
            .events
            .iter()
            .map(|e| match e {
                PinEvent::Sleep { ns } => *ns,
                _ => 0,
            })
            .sum()
    }
}

/// In-memory stand-in for a GPIO chip
#[derive(Clone)]
pub struct MockPinBank {
    trace: BusTrace,
}

impl Default for MockPinBank {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPinBank {
    /// A bank that records every event
    pub fn new() -> Self {
        let trace = BusTrace::default();
        trace.lock().recording = true;
        Self { trace }
    }

    /// A bank that only tracks ownership, for long running simulation
    pub fn quiet() -> Self {
        Self {
            trace: BusTrace::default(),
        }
    }

    pub fn trace(&self) -> BusTrace {
        self.trace.clone()
    }

    /// Make requests for `line` fail as if another consumer held it
    pub fn mark_busy(&self, line: u32) {
        self.trace.lock().busy_lines.insert(line);
    }

    /// Make level writes on `line` fail
    pub fn fail_writes(&self, line: u32) {
        self.trace.lock().failing_lines.insert(line);
    }

    /// A delay source that logs into the same trace
    pub fn delay(&self) -> MockDelay {
        MockDelay {
            trace: self.trace.clone(),
        }
    }
}

#[derive(Debug)]
pub struct MockPinError(pub String);

impl std::fmt::Display for MockPinError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl digital::Error for MockPinError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

impl PinBank for MockPinBank {
    type Pin = MockPin;
    type Error = MockPinError;

    fn request_output(
        &mut self,
        line: u32,
        role: PinRole,
        level: PinState,
    ) -> Result<MockPin, MockPinError> {
        {
            let mut shared = self.trace.lock();
            if shared.busy_lines.contains(&line) || shared.held.contains(&line) {
                return Err(MockPinError(format!("line {} is busy", line)));
            }
            shared.held.insert(line);
            shared.acquisitions += 1;
        }
        self.trace.push(PinEvent::Acquired { line, role });
        self.trace.push(PinEvent::Level { role, level });
        Ok(MockPin {
            line,
            role,
            trace: self.trace.clone(),
        })
    }
}

/// Output line handed out by [`MockPinBank`]; dropping it releases the line
pub struct MockPin {
    line: u32,
    role: PinRole,
    trace: BusTrace,
}

impl ErrorType for MockPin {
    type Error = MockPinError;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_state(PinState::Low)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_state(PinState::High)
    }

    fn set_state(&mut self, level: PinState) -> Result<(), Self::Error> {
        if self.trace.lock().failing_lines.contains(&self.line) {
            return Err(MockPinError(format!("line {} write failed", self.line)));
        }
        self.trace.push(PinEvent::Level {
            role: self.role,
            level,
        });
        Ok(())
    }
}

impl Drop for MockPin {
    fn drop(&mut self) {
        self.trace.lock().held.remove(&self.line);
        self.trace.push(PinEvent::Released {
            line: self.line,
            role: self.role,
        });
    }
}

/// Delay source that records instead of sleeping
#[derive(Clone)]
pub struct MockDelay {
    trace: BusTrace,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.trace.push(PinEvent::Sleep { ns: u64::from(ns) });
    }

    fn delay_us(&mut self, us: u32) {
        self.trace.push(PinEvent::Sleep {
            ns: u64::from(us) * 1_000,
        });
    }

    fn delay_ms(&mut self, ms: u32) {
        self.trace.push(PinEvent::Sleep {
            ns: u64::from(ms) * 1_000_000,
        });
    }
}

/// Rebuilds bus bytes from pin level changes the way the controller sees
/// them: MOSI and DC are sampled on every rising SCL edge.
pub struct BusDecoder;

impl BusDecoder {
    pub fn decode(events: &[PinEvent]) -> Vec<(u8, DataMode)> {
        let mut out = Vec::new();
        let mut clock = PinState::High;
        let mut data = PinState::High;
        let mut select = PinState::High;
        let mut shift = 0u8;
        let mut count = 0;

        for event in events {
            let PinEvent::Level { role, level } = *event else {
                continue;
            };
            match role {
                PinRole::Data => data = level,
                PinRole::Select => select = level,
                PinRole::Reset => {}
                PinRole::Clock => {
                    if clock == PinState::Low && level == PinState::High {
                        shift = (shift << 1) | u8::from(data == PinState::High);
                        count += 1;
                        if count == 8 {
                            let mode = match select {
                                PinState::Low => DataMode::Command,
                                PinState::High => DataMode::Data,
                            };
                            out.push((shift, mode));
                            shift = 0;
                            count = 0;
                        }
                    }
                    clock = level;
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropping_a_pin_releases_its_line() {
        let mut bank = MockPinBank::new();
        let pin = bank
            .request_output(5, PinRole::Clock, PinState::High)
            .unwrap();
        assert!(bank.trace().held_lines().contains(&5));
        assert!(bank
            .request_output(5, PinRole::Data, PinState::High)
            .is_err());
        drop(pin);
        assert!(bank.trace().held_lines().is_empty());
    }

    #[test]
    fn quiet_bank_keeps_no_events() {
        let mut bank = MockPinBank::quiet();
        let mut pin = bank
            .request_output(1, PinRole::Data, PinState::High)
            .unwrap();
        pin.set_low().unwrap();
        assert!(bank.trace().events().is_empty());
        assert_eq!(bank.trace().acquisitions(), 1);
    }
}

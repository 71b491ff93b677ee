//! GPIO character device backend (`/dev/gpiochipN`)

use std::path::Path;

use embedded_hal::digital::PinState;
use linux_embedded_hal::{
    gpio_cdev::{errors::Error as GpioError, Chip, LineRequestFlags},
    CdevPin,
};

use crate::ssd1306::pins::{PinBank, PinRole};

/// Consumer name prefix shown by `gpioinfo`
const CONSUMER: &str = "spi-oled";

/// Output lines requested from one GPIO chip
pub struct CdevPinBank {
    chip: Chip,
}

impl CdevPinBank {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GpioError> {
        let chip = Chip::new(path.as_ref())?;
        log::info!(
            "Opened GPIO chip {} ({} lines)",
            chip.name(),
            chip.num_lines()
        );
        Ok(Self { chip })
    }
}

impl PinBank for CdevPinBank {
    type Pin = CdevPin;
    type Error = GpioError;

    fn request_output(
        &mut self,
        line: u32,
        role: PinRole,
        level: PinState,
    ) -> Result<CdevPin, GpioError> {
        let consumer = format!("{}-{}", CONSUMER, role.label());
        let handle = self.chip.get_line(line)?.request(
            LineRequestFlags::OUTPUT,
            u8::from(level == PinState::High),
            &consumer,
        )?;
        CdevPin::new(handle)
    }
}

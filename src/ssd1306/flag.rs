/// Various flags and constants used in the SSD1306 OLED driver.
///
/// These are the parameter bytes that follow the opcodes in [`super::cmd::Cmd`].
/// The power-on values are a contract with the panel: changing them changes
/// brightness or orientation of the picture.
pub struct Flag;
impl Flag {
    // Clock divide (0xD5): [3:0] divide ratio, [7:4] oscillator frequency
    pub const CLOCK_DIV_DEFAULT: u8 = 0x50;

    // Multiplex ratio (0xA8): 0x3F = 1/64 duty
    pub const MUX_RATIO_64: u8 = 0x3F;

    // Display offset (0xD3)
    pub const DISPLAY_OFFSET_NONE: u8 = 0x00;

    // Charge pump (0x8D)
    pub const CHARGE_PUMP_ENABLE: u8 = 0x14;
    pub const CHARGE_PUMP_DISABLE: u8 = 0x10;

    // Memory addressing mode (0x20)
    pub const ADDRESSING_PAGE: u8 = 0x02;

    // COM pins hardware configuration (0xDA): alternative, no left/right remap
    pub const COM_PINS_ALTERNATIVE: u8 = 0x12;

    // Contrast (0x81): 1..=255, reset value 0x7F
    pub const CONTRAST_BRIGHT: u8 = 0xEF;

    // Pre-charge period (0xD9): [3:0] phase 1, [7:4] phase 2
    pub const PRECHARGE_DEFAULT: u8 = 0xF1;

    // VCOMH deselect level (0xDB): ~0.83 * Vcc
    pub const VCOMH_083: u8 = 0x30;
}

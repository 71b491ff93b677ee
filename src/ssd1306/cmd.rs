pub struct Cmd;
impl Cmd {
    // Init
    pub const DISPLAY_OFF: u8 = 0xAE;
    pub const DISPLAY_ON: u8 = 0xAF;
    pub const SET_CLOCK_DIV: u8 = 0xD5;
    pub const SET_MUX_RATIO: u8 = 0xA8;
    pub const SET_DISPLAY_OFFSET: u8 = 0xD3;
    pub const SET_START_LINE: u8 = 0x40;
    pub const CHARGE_PUMP: u8 = 0x8D;
    pub const MEMORY_MODE: u8 = 0x20;
    pub const SEGMENT_REMAP: u8 = 0xA1;
    pub const COM_SCAN_NORMAL: u8 = 0xC0;
    pub const SET_COM_PINS: u8 = 0xDA;
    pub const SET_CONTRAST: u8 = 0x81;
    pub const SET_PRECHARGE: u8 = 0xD9;
    pub const SET_VCOMH: u8 = 0xDB;
    pub const ENTIRE_DISPLAY_RESUME: u8 = 0xA4;
    pub const NORMAL_DISPLAY: u8 = 0xA6;

    // Update
    pub const SET_PAGE_START: u8 = 0xB0;
    pub const SET_LOW_COLUMN: u8 = 0x00;
    pub const SET_HIGH_COLUMN: u8 = 0x10;
}

/*
Vendor example code had these:
0xAE - Display OFF
0xD5 - Clock divide ratio / oscillator frequency
0xA8 - Multiplex ratio
0xD3 - Display offset
0x40 - Display start line
0x8D - Charge pump setting
0x20 - Memory addressing mode
0xA1 - Segment re-map
0xC0 - COM output scan direction
0xDA - COM pins hardware configuration
0x81 - Contrast control
0xD9 - Pre-charge period
0xDB - VCOMH deselect level
0xA4 - Entire display ON (resume to RAM)
0xA6 - Normal display
0xAF - Display ON
0xB0 - Page start address (page mode)
*/

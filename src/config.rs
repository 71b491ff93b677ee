//! Command line and environment configuration

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::ssd1306::pins::PinGroup;

pub const DEFAULT_SOCKET: &str = "/tmp/spi_oled.sock";
pub const DEFAULT_SHM: &str = "/dev/shm/spi_oled.fb";
pub const DEFAULT_LOCK: &str = "/tmp/spi_oled.lock";
pub const DEFAULT_CHIP: &str = "/dev/gpiochip0";
pub const DEFAULT_TEXT: &str = "SPI OLED";

#[derive(Debug, Parser)]
#[command(name = "spi-oled")]
#[command(about = "Bit-banged SSD1306 OLED driver daemon and client", version)]
pub struct Cli {
    /// Control socket of the daemon
    #[arg(long, global = true, env = "SPI_OLED_SOCKET", default_value = DEFAULT_SOCKET)]
    pub socket: PathBuf,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the driver daemon
    Serve(ServeArgs),
    /// Render a page periodically until interrupted
    Show(ShowArgs),
    /// Configure the panel and blank it
    Clear(PinArgs),
    /// Print resolution and buffer size
    Info,
    /// Copy a file into the framebuffer and refresh
    Write(WriteArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// File backing the shared framebuffer
    #[arg(long, env = "SPI_OLED_SHM", default_value = DEFAULT_SHM)]
    pub shm: PathBuf,

    /// Lock file admitting one client session at a time
    #[arg(long, env = "SPI_OLED_LOCK", default_value = DEFAULT_LOCK)]
    pub lock: PathBuf,

    /// GPIO character device
    #[arg(long, env = "SPI_OLED_GPIOCHIP", default_value = DEFAULT_CHIP)]
    pub chip: PathBuf,

    /// Pause after every pin level change, in nanoseconds
    #[arg(long, default_value_t = 0)]
    pub edge_delay_ns: u32,

    /// Drive simulated pins instead of a GPIO chip
    #[arg(long)]
    pub simulate: bool,
}

#[derive(Debug, Args)]
pub struct PinArgs {
    /// Lines as scl,mosi,res,dc, e.g. 17,27,4,24
    #[arg(short = 'o', long = "oled-pins")]
    pub oled_pins: PinGroup,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub pins: PinArgs,

    /// 1 = clock, 2 = text, 3 = animation (frames built from assets/frames)
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=3))]
    pub page: u8,

    /// Refresh interval in milliseconds
    #[arg(short, long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Text shown on page 2
    #[arg(short, long, default_value = DEFAULT_TEXT)]
    pub text: String,
}

impl ShowArgs {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval)
    }
}

#[derive(Debug, Args)]
pub struct WriteArgs {
    #[command(flatten)]
    pub pins: PinArgs,

    /// Byte offset into the framebuffer
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Raw page-format bytes to copy
    pub file: PathBuf,
}

use std::fs;
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};

use anyhow::{anyhow, Context};
use chrono::Local;
use clap::Parser;
use embedded_hal::delay::DelayNs;

use spi_oled::config::{Cli, Command, PinArgs, ServeArgs, ShowArgs, WriteArgs};
use spi_oled::control::{Daemon, ServerConfig, Session};
use spi_oled::mock::MockPinBank;
use spi_oled::page::{Page, PageRenderer};
use spi_oled::shm::SharedRegion;
use spi_oled::ssd1306::BUFFER_SIZE;
use spi_oled::{FrameTable, MonoFontTable, PinBank, Ssd1306};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match &cli.command {
        Command::Serve(args) => serve(&cli.socket, args),
        Command::Show(args) => show(&cli.socket, args),
        Command::Clear(args) => clear(&cli.socket, args),
        Command::Info => info(&cli.socket),
        Command::Write(args) => write(&cli.socket, args),
    }
}

fn serve(socket: &Path, args: &ServeArgs) -> anyhow::Result<()> {
    let region = SharedRegion::create(&args.shm, BUFFER_SIZE)
        .with_context(|| format!("creating framebuffer region {}", args.shm.display()))?;
    let config = ServerConfig {
        socket: socket.to_path_buf(),
        lock: args.lock.clone(),
    };

    if args.simulate {
        log::info!("Simulated pins, nothing is driven");
        let bank = MockPinBank::quiet();
        let delay = bank.delay();
        return run_daemon(config, Ssd1306::new(bank, delay, region, args.edge_delay_ns)?);
    }

    #[cfg(target_os = "linux")]
    {
        let bank = spi_oled::gpio::CdevPinBank::open(&args.chip)
            .with_context(|| format!("opening GPIO chip {}", args.chip.display()))?;
        let delay = linux_embedded_hal::Delay;
        run_daemon(config, Ssd1306::new(bank, delay, region, args.edge_delay_ns)?)
    }

    #[cfg(not(target_os = "linux"))]
    {
        region.remove_file();
        Err(anyhow!("GPIO chips need Linux, run with --simulate"))
    }
}

fn run_daemon<B, D>(config: ServerConfig, device: Ssd1306<B, D, SharedRegion>) -> anyhow::Result<()>
where
    B: PinBank + Send + 'static,
    B::Pin: Send + 'static,
    D: DelayNs + Send + 'static,
{
    let daemon = Daemon::bind(config, device).context("binding control socket")?;

    let teardown = daemon.teardown_handle();
    ctrlc::set_handler(move || {
        teardown.run();
        std::process::exit(0);
    })
    .context("installing signal handler")?;

    daemon.serve()?;
    Ok(())
}

fn show(socket: &Path, args: &ShowArgs) -> anyhow::Result<()> {
    let page = Page::try_from(args.page).map_err(|p| anyhow!("invalid page number {}", p))?;

    let (stop_tx, stop_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })
    .context("installing signal handler")?;

    let mut session = Session::open(socket).context("opening OLED session")?;
    session
        .configure(&args.pins.oled_pins)
        .context("configuring OLED pins")?;
    let mut shared = session.map().context("mapping framebuffer")?;
    log::info!("Framebuffer mapped, {} bytes", shared.len());

    let fonts = MonoFontTable::new();
    let frames = FrameTable::builtin();
    let mut renderer = PageRenderer::new(page, args.text.as_str(), &fonts, &frames);

    loop {
        {
            let mut fb = shared.framebuffer()?;
            renderer.render(&mut fb, Local::now().naive_local());
        }
        session.refresh().context("refreshing OLED")?;

        match stop_rx.recv_timeout(args.interval()) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    log::info!("Stopping, closing session");
    drop(shared);
    session.close()?;
    Ok(())
}

fn clear(socket: &Path, args: &PinArgs) -> anyhow::Result<()> {
    let mut session = Session::open(socket).context("opening OLED session")?;
    session.configure(&args.oled_pins)?;
    session.clear()?;
    session.close()?;
    Ok(())
}

fn info(socket: &Path) -> anyhow::Result<()> {
    let mut session = Session::open(socket).context("opening OLED session")?;
    print!("{}", session.info()?);
    session.close()?;
    Ok(())
}

fn write(socket: &Path, args: &WriteArgs) -> anyhow::Result<()> {
    let data = fs::read(&args.file).with_context(|| format!("reading {}", args.file.display()))?;
    let mut session = Session::open(socket).context("opening OLED session")?;
    session.configure(&args.pins.oled_pins)?;
    session.write(args.offset, &data)?;
    log::info!("Wrote {} bytes at offset {}", data.len(), args.offset);
    session.close()?;
    Ok(())
}

use std::io::{self, BufRead};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use antscan::{cancellation, config, Ant, AntError, Config};
use clap::{Parser, ValueEnum};
use crossbeam_channel::{bounded, select};
use log::{error, info};
use tracing_subscriber::filter::LevelFilter;

/// Listen for ANT+ heart rate straps with an ANT USB stick.
#[derive(Debug, Parser)]
#[command(name = "hrscan", version)]
struct Cli {
    /// Vendor id of the ANT+ USB stick.
    #[arg(long, env = "ANTSCAN_VID", default_value = "0x0fcf", value_parser = config::parse_id)]
    vid: u16,

    /// Product id of the ANT+ USB stick.
    #[arg(long, env = "ANTSCAN_PID", default_value = "0x1009", value_parser = config::parse_id)]
    pid: u16,

    /// Channel to configure for scanning.
    #[arg(long, env = "ANTSCAN_CHANNEL", default_value_t = 0)]
    channel: u8,

    /// RF frequency in MHz (2400-2655).
    #[arg(long, env = "ANTSCAN_FREQUENCY", default_value_t = config::DEFAULT_FREQUENCY_MHZ)]
    frequency: u16,

    /// Bulk read timeout; bounds how long a stop request may take.
    #[arg(long, env = "ANTSCAN_READ_TIMEOUT_MS", default_value_t = 100)]
    read_timeout_ms: u64,

    #[arg(long, env = "ANTSCAN_LOG_LEVEL", value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

fn init_logging(level: LogLevel) {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level.as_filter())
        .with_ansi(false)
        .try_init();
}

fn run(cli: Cli) -> antscan::Result<()> {
    let config = Config::new()
        .vendor_id(cli.vid)
        .product_id(cli.pid)
        .channel(cli.channel)
        .frequency_mhz(cli.frequency)
        .read_timeout(Duration::from_millis(cli.read_timeout_ms));
    let ant = Ant::open_usb(config)?;

    let (canceller, token) = cancellation();
    let (receiver, readings) = ant.spawn_receiver(token);

    // Start listening before the bring-up so the startup message and the
    // first broadcasts are not missed.
    if let Err(e) = ant.start_rx_scan() {
        canceller.cancel();
        let _ = receiver.join();
        return Err(e);
    }

    let (stop_tx, stop) = bounded(1);
    thread::spawn(move || {
        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
        let _ = stop_tx.send(());
    });

    info!("Listening, press Enter to stop");
    loop {
        select! {
            recv(readings) -> reading => match reading {
                Ok(reading) => info!("{}", reading),
                // The receive loop has stopped on its own.
                Err(_) => break,
            },
            recv(stop) -> _ => break,
        }
    }
    canceller.cancel();

    match receiver.join() {
        Ok(result) => result,
        Err(_) => Err(AntError::Io(io::Error::other("receive thread panicked"))),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

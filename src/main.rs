use clap::{Parser, Subcommand};
use stage_programmer::config::{ConfigLoader, LogFormat, LoggingConfig};
use stage_programmer::{Driver, Monitor, MonitorEvent, MonitorSettings, TimedReading};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Drive a heating/cooling stage temperature programmer over RS232.",
    long_about = "Sends ramp, start, stop and hold commands to a stage programmer and reads back its temperature, status and error flags, once or continuously."
)]
struct Args {
    /// Configuration file. Skips the standard search path.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Serial port of the programmer, e.g. /dev/ttyUSB0 or COM3.
    #[arg(short, long, global = true)]
    port: Option<String>,

    /// Print readings as JSON lines.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Query and print one reading.
    Read,
    /// Start ramping toward the limit at the programmed rate.
    Start,
    /// Stop heating or cooling.
    Stop,
    /// Hold the current temperature.
    Hold,
    /// Set the ramp rate (°C/min, below 15).
    Rate {
        #[arg(allow_negative_numbers = true)]
        celsius_per_min: f64,
    },
    /// Set the ramp limit (°C, below 1400).
    Limit {
        #[arg(allow_negative_numbers = true)]
        celsius: f64,
    },
    /// Set rate and limit, then start.
    Ramp {
        #[arg(long, allow_negative_numbers = true)]
        rate: f64,
        #[arg(long, allow_negative_numbers = true)]
        limit: f64,
    },
    /// Poll continuously and print every reading until Ctrl+C.
    Monitor {
        /// Poll interval in milliseconds. Defaults to monitor.poll_interval_ms.
        #[arg(long)]
        interval_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let mut config = loader.into_config();
    init_tracing(&config.logging);

    if let Some(port) = args.port.clone() {
        config.serial.port = Some(port);
    }
    let port = config
        .serial
        .port
        .clone()
        .ok_or("no serial port given: pass --port or set serial.port")?;

    let driver = Arc::new(Driver::open_with(&port, config.serial.transport_settings())?);

    match args.command {
        Commands::Read => {
            let reading = driver.query_reading()?;
            print_reading(&TimedReading::now(&reading), args.json)?;
        }
        Commands::Start => driver.start()?,
        Commands::Stop => driver.stop()?,
        Commands::Hold => driver.hold()?,
        Commands::Rate { celsius_per_min } => driver.set_rate(celsius_per_min)?,
        Commands::Limit { celsius } => driver.set_limit(celsius)?,
        Commands::Ramp { rate, limit } => driver.ramp(rate, limit)?,
        Commands::Monitor { interval_ms } => {
            let mut settings = config.monitor.monitor_settings();
            if let Some(ms) = interval_ms {
                settings.poll_interval = Duration::from_millis(ms.max(1));
            }
            run_monitor(Arc::clone(&driver), settings, args.json).await?;
        }
    }

    driver.close();
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries readings; logs go to stderr
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

async fn run_monitor(
    driver: Arc<Driver>,
    settings: MonitorSettings,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut monitor = Monitor::spawn(driver, settings);
    let mut events = monitor.events();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            event = events.recv() => match event {
                Ok(MonitorEvent::Reading(reading)) => print_reading(&reading, json)?,
                Ok(MonitorEvent::ReadFailed(reason)) => print_failure(&reason, json),
                Ok(MonitorEvent::Stopped) | Err(RecvError::Closed) => break,
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "display fell behind the monitor"),
            },
        }
    }

    monitor.stop().await?;
    Ok(())
}

fn print_reading(reading: &TimedReading, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string(reading)?);
    } else {
        println!(
            "{}  {:>7.1} °C  {}  [{}]",
            reading.taken_at.format("%H:%M:%S"),
            reading.temperature_celsius,
            reading.status,
            reading.errors
        );
    }
    Ok(())
}

fn print_failure(reason: &str, json: bool) {
    if json {
        println!("{}", serde_json::json!({ "error": reason }));
    } else {
        println!("reading unavailable: {reason}");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("signal received, stopping monitor");
}

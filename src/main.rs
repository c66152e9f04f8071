// src/main.rs
//! GPS Tracker - serial GPS ingestion with a live web map

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gps_tracker::{
    config::GpsConfig,
    display::TerminalDisplay,
    monitor,
    simulator::{self, Simulator, SimulatorConfig},
    web, GpsMonitor, GpsSource,
};
use log::info;
use std::{path::PathBuf, time::Duration};

#[derive(Parser)]
#[command(name = "gps-tracker", version, about = "Track a serial GPS receiver on a live map")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read the receiver and serve the current fix over HTTP
    Serve {
        #[command(flatten)]
        serial: SerialArgs,

        /// Address the web server binds to
        #[arg(long)]
        host: Option<String>,

        /// Port the web server listens on
        #[arg(long)]
        http_port: Option<u16>,

        /// Play back a track file instead of reading the serial port
        #[arg(long, value_name = "FILE")]
        replay: Option<PathBuf>,

        /// Seconds between replayed fixes
        #[arg(long, default_value_t = 1)]
        replay_interval: u64,
    },
    /// Read the receiver and show the current fix in the terminal
    Watch {
        #[command(flatten)]
        serial: SerialArgs,
    },
    /// Write a simulated track to a JSON file
    Simulate {
        /// Output file
        #[arg(short, long, default_value = "simulated_gps_data.json")]
        output: PathBuf,

        /// Simulated seconds
        #[arg(long, default_value_t = 300)]
        duration: u64,

        /// Seconds between samples
        #[arg(long, default_value_t = 1)]
        interval: u64,

        /// Seed for a reproducible track
        #[arg(long)]
        seed: Option<u64>,

        /// Emit one sample per interval, rewriting the file each time
        #[arg(long)]
        realtime: bool,
    },
    /// List available serial ports
    Ports,
}

#[derive(Args)]
struct SerialArgs {
    /// Serial device of the receiver
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    baud: Option<u32>,

    /// Store the effective settings as the new defaults
    #[arg(long)]
    save: bool,
}

impl SerialArgs {
    fn apply(&self, config: &mut GpsConfig) {
        let port = self.port.clone().unwrap_or_else(|| config.serial_port.clone());
        let baud = self.baud.unwrap_or(config.serial_baudrate);
        config.update_serial(port, baud);
    }
}

fn init_logging(default_filter: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn serial_source(config: &GpsConfig) -> GpsSource {
    GpsSource::Serial {
        port: config.serial_port.clone(),
        baudrate: config.serial_baudrate,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            serial,
            host,
            http_port,
            replay,
            replay_interval,
        } => {
            init_logging("info");
            let mut config = GpsConfig::load().context("Failed to load configuration")?;
            serial.apply(&mut config);
            let host = host.unwrap_or_else(|| config.http_host.clone());
            let http_port = http_port.unwrap_or(config.http_port);
            config.update_http(host, http_port);
            if serial.save {
                config.save().context("Failed to save configuration")?;
            }

            let source = match replay {
                Some(path) => GpsSource::Replay {
                    path,
                    interval: Duration::from_secs(replay_interval),
                },
                None => serial_source(&config),
            };

            let monitor = GpsMonitor::new(config.ingest_settings());
            // Runs for the lifetime of the process; kept, never joined
            let _ingest = monitor.start(source).context("Failed to start GPS source")?;

            info!("Open a browser at http://{}", config.http_addr());
            web::serve(monitor.publisher(), &config.http_addr())
                .await
                .with_context(|| format!("Web server on {} failed", config.http_addr()))?;
        }
        Command::Watch { serial } => {
            // Keep logs from scribbling over the display
            init_logging("warn");
            let mut config = GpsConfig::load().context("Failed to load configuration")?;
            serial.apply(&mut config);
            if serial.save {
                config.save().context("Failed to save configuration")?;
            }

            let monitor = GpsMonitor::new(config.ingest_settings());
            let ingest = monitor
                .start(serial_source(&config))
                .context("Failed to start GPS source")?;

            TerminalDisplay::new()
                .run(&monitor.publisher(), ingest.subscribe())
                .await
                .context("Terminal display failed")?;
        }
        Command::Simulate {
            output,
            duration,
            interval,
            seed,
            realtime,
        } => {
            init_logging("info");
            let mut sim = Simulator::new(SimulatorConfig {
                duration_secs: duration,
                step_secs: interval,
                seed,
                ..SimulatorConfig::default()
            });

            println!("Starting GPS data simulation for {} seconds...", duration);
            println!("Data will be saved to {}", output.display());

            let track = if realtime {
                sim.stream_to_file(&output, Duration::from_secs(interval))
                    .await
                    .context("Simulation failed")?
            } else {
                let track = sim.generate();
                simulator::write_track(&output, &track)
                    .with_context(|| format!("Failed to write {}", output.display()))?;
                track
            };

            println!("Simulation complete. {} data points generated.", track.len());
            println!(
                "Replay it with: gps-tracker serve --replay {}",
                output.display()
            );
        }
        Command::Ports => {
            init_logging("info");
            monitor::list_serial_ports().context("Failed to list serial ports")?;
        }
    }

    Ok(())
}

// src/monitor.rs
//! Serial ingestion loop and source coordination
//!
//! The ingestion task owns the receiver connection for the lifetime of the
//! process. It reconnects on any failure and never reports errors upward;
//! consumers only ever see the last fix that made it into the store.

use crate::{
    error::{GpsError, Result},
    gps::{nmea, FixStore},
    publisher::Publisher,
    simulator,
};
use log::{debug, info, warn};
use std::{path::PathBuf, time::Duration};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader},
    sync::watch,
    task::JoinHandle,
    time::{sleep, timeout},
};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

/// Whether the ingestion task currently holds an open connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connected,
}

/// Timing policy of the ingestion loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSettings {
    /// Longest wait for one line before the link is considered dead
    pub read_timeout: Duration,
    /// Pause after a failed open attempt
    pub reconnect_delay: Duration,
    /// Pause after a read failure, before the next open attempt
    pub error_delay: Duration,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(2),
            reconnect_delay: Duration::from_secs(5),
            error_delay: Duration::from_secs(1),
        }
    }
}

/// Opens the byte stream the receiver talks on
pub trait Connector: Send + 'static {
    type Port: AsyncRead + Unpin + Send + 'static;

    fn connect(&mut self) -> Result<Self::Port>;

    /// Human readable endpoint, for logs
    fn describe(&self) -> String;
}

/// Serial device connector
#[derive(Debug, Clone)]
pub struct SerialConnector {
    port: String,
    baudrate: u32,
}

impl SerialConnector {
    pub fn new(port: impl Into<String>, baudrate: u32) -> Self {
        Self {
            port: port.into(),
            baudrate,
        }
    }
}

impl Connector for SerialConnector {
    type Port = SerialStream;

    fn connect(&mut self) -> Result<SerialStream> {
        tokio_serial::new(self.port.as_str(), self.baudrate)
            .timeout(Duration::from_millis(1000))
            .open_native_async()
            .map_err(|e| {
                GpsError::Connection(format!("Failed to open serial port {}: {}", self.port, e))
            })
    }

    fn describe(&self) -> String {
        format!("{} at {} baud", self.port, self.baudrate)
    }
}

/// Handle to a spawned ingestion (or replay) task.
///
/// The task runs until the process exits; the handle is kept so the task is
/// owned by someone, not so it can be joined.
#[derive(Debug)]
pub struct IngestHandle {
    task: JoinHandle<()>,
    state: watch::Receiver<LinkState>,
}

impl IngestHandle {
    pub(crate) fn new(task: JoinHandle<()>, state: watch::Receiver<LinkState>) -> Self {
        Self { task, state }
    }

    pub fn link_state(&self) -> LinkState {
        *self.state.borrow()
    }

    /// Receiver that is notified on every connect and disconnect
    pub fn subscribe(&self) -> watch::Receiver<LinkState> {
        self.state.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Reads lines from a connector and folds them into the fix store
pub struct IngestionLoop<C: Connector> {
    connector: C,
    store: FixStore,
    settings: IngestSettings,
    link: watch::Sender<LinkState>,
}

impl<C: Connector> IngestionLoop<C> {
    pub fn new(
        connector: C,
        store: FixStore,
        settings: IngestSettings,
    ) -> (Self, watch::Receiver<LinkState>) {
        let (link, state) = watch::channel(LinkState::Disconnected);
        let ingest = Self {
            connector,
            store,
            settings,
            link,
        };
        (ingest, state)
    }

    /// Start the loop on its own task
    pub fn spawn(connector: C, store: FixStore, settings: IngestSettings) -> IngestHandle {
        let (ingest, state) = Self::new(connector, store, settings);
        IngestHandle::new(tokio::spawn(ingest.run()), state)
    }

    /// Run forever: connect, read lines, reconnect on failure
    pub async fn run(mut self) {
        let mut port: Option<BufReader<C::Port>> = None;
        let mut line = Vec::with_capacity(128);

        loop {
            if port.is_none() {
                match self.connector.connect() {
                    Ok(stream) => {
                        info!("Connected to GPS on {}", self.connector.describe());
                        port = Some(BufReader::new(stream));
                        self.link.send_replace(LinkState::Connected);
                    }
                    Err(e) => {
                        warn!(
                            "GPS not available ({}), retrying in {:?}",
                            e, self.settings.reconnect_delay
                        );
                        sleep(self.settings.reconnect_delay).await;
                        continue;
                    }
                }
            }

            let Some(reader) = port.as_mut() else {
                continue;
            };

            line.clear();
            match read_line(reader, &mut line, self.settings.read_timeout).await {
                Ok(()) => self.dispatch(&String::from_utf8_lossy(&line)),
                Err(e) => {
                    warn!("Error reading GPS data: {}", e);
                    port = None;
                    self.link.send_replace(LinkState::Disconnected);
                    sleep(self.settings.error_delay).await;
                }
            }
        }
    }

    fn dispatch(&self, line: &str) {
        let line = line.trim();
        if !line.starts_with('$') {
            if !line.is_empty() {
                debug!("Skipping non-NMEA line {:?}", line);
            }
            return;
        }

        match nmea::parse_sentence(line) {
            Ok(sentence) => {
                debug!("Applying {} sentence", sentence.kind());
                self.store.update(&sentence);
            }
            Err(e) => debug!("Discarding {:?}: {}", line, e),
        }
    }
}

/// One `\n`-terminated line, bounded by `limit`. EOF counts as a lost device.
async fn read_line<R>(reader: &mut R, line: &mut Vec<u8>, limit: Duration) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    match timeout(limit, reader.read_until(b'\n', line)).await {
        Ok(Ok(0)) => Err(GpsError::Connection("stream closed".to_string())),
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(GpsError::Connection(format!("no data for {:?}", limit))),
    }
}

/// GPS data source configuration
#[derive(Debug, Clone)]
pub enum GpsSource {
    Serial { port: String, baudrate: u32 },
    /// Recorded or simulated track played back at a fixed interval
    Replay { path: PathBuf, interval: Duration },
}

/// Owns the fix store and starts the task feeding it
pub struct GpsMonitor {
    store: FixStore,
    settings: IngestSettings,
}

impl GpsMonitor {
    pub fn new(settings: IngestSettings) -> Self {
        Self {
            store: FixStore::new(),
            settings,
        }
    }

    /// Start feeding the store from the given source
    pub fn start(&self, source: GpsSource) -> Result<IngestHandle> {
        match source {
            GpsSource::Serial { port, baudrate } => {
                info!("Starting GPS ingestion on {} at {} baud", port, baudrate);
                let connector = SerialConnector::new(port, baudrate);
                Ok(IngestionLoop::spawn(connector, self.store.clone(), self.settings))
            }
            GpsSource::Replay { path, interval } => {
                let track = simulator::load_track(&path)?;
                info!("Replaying {} fixes from {}", track.len(), path.display());
                Ok(simulator::spawn_replay(track, self.store.clone(), interval))
            }
        }
    }

    /// Read-only view for the web layer and viewers
    pub fn publisher(&self) -> Publisher {
        Publisher::new(self.store.clone())
    }
}

impl Default for GpsMonitor {
    fn default() -> Self {
        Self::new(IngestSettings::default())
    }
}

/// List available serial ports
pub fn list_serial_ports() -> Result<()> {
    let ports = tokio_serial::available_ports()?;

    if ports.is_empty() {
        println!("No serial ports found.");
    } else {
        println!("Available serial ports:");
        for port in ports {
            println!("  {} - {:?}", port.port_name, port.port_type);
        }
    }

    Ok(())
}

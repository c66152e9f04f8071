// src/simulator.rs
//! Synthetic tracks for running without a receiver
//!
//! Tracks are JSON arrays of fix records using the same field names the
//! HTTP endpoint serves, so a file written here can be replayed into the
//! store in place of the serial source.

use crate::{
    error::Result,
    gps::{Fix, FixStore},
    monitor::{IngestHandle, LinkState},
};
use chrono::{Duration as ChronoDuration, Local, NaiveDateTime};
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{path::Path, time::Duration};
use tokio::{sync::watch, time::sleep};

/// Largest per-second drift of either coordinate, in degrees
const MAX_DRIFT_DEG: f64 = 0.0001;

#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub origin_lat: f64,
    pub origin_lon: f64,
    /// Total simulated time in seconds
    pub duration_secs: u64,
    /// Seconds between samples
    pub step_secs: u64,
    /// RNG seed for reproducible tracks. None = random.
    pub seed: Option<u64>,
    /// Timestamp of the first sample
    pub start: NaiveDateTime,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            // Central Park, New York
            origin_lat: 40.785091,
            origin_lon: -73.968285,
            duration_secs: 300,
            step_secs: 1,
            seed: None,
            start: Local::now().naive_local(),
        }
    }
}

/// Random-walk track generator
pub struct Simulator {
    config: SimulatorConfig,
    rng: StdRng,
    latitude: f64,
    longitude: f64,
}

impl Simulator {
    pub fn new(config: SimulatorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            latitude: config.origin_lat,
            longitude: config.origin_lon,
            config,
            rng,
        }
    }

    /// Number of samples a full run produces
    pub fn len(&self) -> usize {
        self.elapsed_steps().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Next sample, `elapsed_secs` after the start of the track
    fn sample(&mut self, elapsed_secs: u64) -> Fix {
        let step = self.config.step_secs as f64;
        self.latitude += self.rng.gen_range(-MAX_DRIFT_DEG..MAX_DRIFT_DEG) * step;
        self.longitude += self.rng.gen_range(-MAX_DRIFT_DEG..MAX_DRIFT_DEG) * step;

        let at = self.config.start + ChronoDuration::seconds(elapsed_secs as i64);

        Fix {
            latitude: self.latitude,
            longitude: self.longitude,
            speed: self.rng.gen_range(0.0..10.0),
            timestamp: at.format("%Y-%m-%d %H:%M:%S").to_string(),
            satellites: self.rng.gen_range(4..=12),
            altitude: 50.0 + self.rng.gen_range(-5.0..=5.0),
            fix_quality: self.rng.gen_range(1..=2),
        }
    }

    /// Seconds since start of every sample in the track
    fn elapsed_steps(&self) -> Vec<u64> {
        match self.config.step_secs {
            0 => Vec::new(),
            step => (0..self.config.duration_secs)
                .step_by(step as usize)
                .collect(),
        }
    }

    /// Produce the whole track at once
    pub fn generate(&mut self) -> Vec<Fix> {
        self.elapsed_steps()
            .into_iter()
            .map(|t| self.sample(t))
            .collect()
    }

    /// Realtime mode: one sample per `interval`, rewriting `path` after each
    /// so a reader always finds a complete JSON array
    pub async fn stream_to_file(&mut self, path: &Path, interval: Duration) -> Result<Vec<Fix>> {
        let elapsed = self.elapsed_steps();
        let mut track = Vec::with_capacity(elapsed.len());

        for t in elapsed {
            let fix = self.sample(t);
            info!(
                "Time: {}s, Lat: {:.6}, Lon: {:.6}, Speed: {:.2} km/h",
                t, fix.latitude, fix.longitude, fix.speed
            );
            track.push(fix);
            write_track(path, &track)?;
            sleep(interval).await;
        }

        Ok(track)
    }
}

/// Write a track as a pretty-printed JSON array
pub fn write_track(path: &Path, track: &[Fix]) -> Result<()> {
    let contents = serde_json::to_string_pretty(track)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn load_track(path: &Path) -> Result<Vec<Fix>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Feed a track into the store, one record per `interval`, in place of the
/// serial ingestion task. The link reads Connected while records remain.
pub fn spawn_replay(track: Vec<Fix>, store: FixStore, interval: Duration) -> IngestHandle {
    let (link, state) = watch::channel(LinkState::Connected);

    let task = tokio::spawn(async move {
        let total = track.len();
        for fix in track {
            store.replace(fix);
            sleep(interval).await;
        }
        info!("Replay finished after {} fixes", total);
        link.send_replace(LinkState::Disconnected);
    });

    IngestHandle::new(task, state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    /// JSON floats are compared loosely; text fields must match exactly
    fn assert_same_track(a: &[Fix], b: &[Fix]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x.latitude - y.latitude).abs() < 1e-9);
            assert!((x.longitude - y.longitude).abs() < 1e-9);
            assert!((x.speed - y.speed).abs() < 1e-9);
            assert!((x.altitude - y.altitude).abs() < 1e-9);
            assert_eq!(x.timestamp, y.timestamp);
            assert_eq!(x.satellites, y.satellites);
            assert_eq!(x.fix_quality, y.fix_quality);
        }
    }

    fn config(seed: u64) -> SimulatorConfig {
        SimulatorConfig {
            duration_secs: 60,
            seed: Some(seed),
            start: NaiveDate::from_ymd_opt(2024, 5, 1)
                .and_then(|d| d.and_hms_opt(10, 0, 0))
                .unwrap(),
            ..SimulatorConfig::default()
        }
    }

    #[test]
    fn test_track_length_and_ranges() {
        let mut sim = Simulator::new(config(7));
        let track = sim.generate();
        assert_eq!(track.len(), 60);
        assert_eq!(sim.len(), 60);

        for (i, fix) in track.iter().enumerate() {
            let steps = (i + 1) as f64;
            assert!((fix.latitude - 40.785091).abs() <= MAX_DRIFT_DEG * steps + 1e-12);
            assert!((fix.longitude + 73.968285).abs() <= MAX_DRIFT_DEG * steps + 1e-12);
            assert!((0.0..10.0).contains(&fix.speed));
            assert!((45.0..=55.0).contains(&fix.altitude));
            assert!((4..=12).contains(&fix.satellites));
            assert!((1..=2).contains(&fix.fix_quality));
            assert!(fix.has_position());
        }
    }

    #[test]
    fn test_timestamps_advance_by_step() {
        let mut sim = Simulator::new(SimulatorConfig {
            step_secs: 5,
            ..config(1)
        });
        let track = sim.generate();

        assert_eq!(track.len(), 12);
        assert_eq!(track[0].timestamp, "2024-05-01 10:00:00");
        assert_eq!(track[1].timestamp, "2024-05-01 10:00:05");
        assert_eq!(track[11].timestamp, "2024-05-01 10:00:55");
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a = Simulator::new(config(42)).generate();
        let b = Simulator::new(config(42)).generate();
        let c = Simulator::new(config(43)).generate();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_zero_step_yields_nothing() {
        let mut sim = Simulator::new(SimulatorConfig {
            step_secs: 0,
            ..config(3)
        });
        assert!(sim.is_empty());
        assert!(sim.generate().is_empty());
    }

    #[test]
    fn test_file_uses_query_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("simulated_gps_data.json");

        let track = Simulator::new(config(5)).generate();
        write_track(&path, &track).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let first = raw.as_array().unwrap()[0].as_object().unwrap();
        for key in [
            "latitude",
            "longitude",
            "speed",
            "timestamp",
            "satellites",
            "altitude",
            "fix_quality",
        ] {
            assert!(first.contains_key(key), "missing {}", key);
        }

        assert_same_track(&load_track(&path).unwrap(), &track);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not a track").unwrap();
        assert!(load_track(&path).is_err());
    }

    #[tokio::test]
    async fn test_stream_to_file_writes_every_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.json");

        let mut sim = Simulator::new(SimulatorConfig {
            duration_secs: 3,
            ..config(9)
        });
        let track = sim
            .stream_to_file(&path, Duration::from_millis(1))
            .await
            .unwrap();

        assert_eq!(track.len(), 3);
        assert_same_track(&load_track(&path).unwrap(), &track);
    }

    #[tokio::test]
    async fn test_replay_ends_on_last_fix() {
        let track = Simulator::new(SimulatorConfig {
            duration_secs: 4,
            ..config(11)
        })
        .generate();
        let last = track.last().cloned().unwrap();

        let store = FixStore::new();
        let handle = spawn_replay(track, store.clone(), Duration::from_millis(1));
        let mut state = handle.subscribe();

        state
            .wait_for(|s| *s == LinkState::Disconnected)
            .await
            .unwrap();
        assert_eq!(store.snapshot(), last);
    }
}

// src/lib.rs
//! GPS Tracker Library
//!
//! Reads NMEA sentences from a serial receiver into one shared fix record and
//! serves that record to a web map and a terminal viewer.

pub mod config;
pub mod display;
pub mod error;
pub mod gps;
pub mod monitor;
pub mod publisher;
pub mod simulator;
pub mod web;

// Re-export main types for convenience
pub use error::{GpsError, Result};
pub use gps::{Fix, FixStore};
pub use monitor::{GpsMonitor, GpsSource, IngestHandle, IngestSettings, LinkState};
pub use publisher::Publisher;

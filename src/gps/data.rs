// src/gps/data.rs
//! The fused fix record and how decoded sentences fold into it

use super::nmea::{FixData, Navigation, SatellitesInView, Sentence};
use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Knots to km/h
pub const KNOTS_TO_KMH: f64 = 1.852;

/// Latest known position solution.
///
/// Every field is always present. Fields that were never reported hold a
/// zero or empty sentinel, so a fresh record means "nothing received yet".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    pub speed: f64, // km/h
    pub timestamp: String,
    pub satellites: u32,
    pub altitude: f64, // meters
    pub fix_quality: u8,
}

impl Fix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Viewers treat zero coordinates as "no fix yet"
    pub fn has_position(&self) -> bool {
        self.latitude != 0.0 && self.longitude != 0.0
    }

    /// Fold one decoded sentence into the record, touching only the fields
    /// that sentence category carries.
    pub fn apply(&mut self, sentence: &Sentence) {
        match sentence {
            Sentence::FixData(gga) => self.apply_fix_data(gga),
            Sentence::Navigation(rmc) => self.apply_navigation(rmc),
            Sentence::SatellitesInView(gsv) => self.apply_satellites(gsv),
        }
    }

    fn apply_fix_data(&mut self, gga: &FixData) {
        self.latitude = gga.latitude;
        self.longitude = gga.longitude;
        self.altitude = gga.altitude;
        self.fix_quality = gga.fix_quality;
        self.satellites = gga.satellites;
        self.timestamp = format_time(gga.time);
    }

    fn apply_navigation(&mut self, rmc: &Navigation) {
        self.latitude = rmc.latitude;
        self.longitude = rmc.longitude;
        self.speed = rmc.speed_knots * KNOTS_TO_KMH;
        self.timestamp = format_datetime(rmc.datetime);
    }

    fn apply_satellites(&mut self, gsv: &SatellitesInView) {
        // Last writer wins against the GGA count
        self.satellites = gsv.satellites;
    }

    /// Get fix type description
    pub fn fix_description(&self) -> String {
        match self.fix_quality {
            0 => "No fix".to_string(),
            1 => "GPS".to_string(),
            2 => "DGPS".to_string(),
            3 => "PPS".to_string(),
            4 => "RTK".to_string(),
            5 => "Float RTK".to_string(),
            6 => "Estimated".to_string(),
            7 => "Manual".to_string(),
            8 => "Simulation".to_string(),
            quality => format!("Unknown ({})", quality),
        }
    }

    /// Format coordinate for display
    pub fn format_coordinate(coord: f64) -> String {
        if coord == 0.0 {
            "No fix".to_string()
        } else {
            format!("{:>12.6}°", coord)
        }
    }
}

fn format_time(time: Option<NaiveTime>) -> String {
    time.map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_default()
}

fn format_datetime(datetime: Option<NaiveDateTime>) -> String {
    datetime
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

// src/gps/nmea.rs
//! NMEA sentence parsing
//!
//! Only the three sentence types that feed the fix record are decoded:
//! GGA (fix data), RMC (recommended minimum navigation) and GSV (satellites
//! in view). Any talker id is accepted. Everything else, including lines that
//! fail checksum or field validation, is reported as a parse error.

use crate::error::{GpsError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::str::FromStr;

/// GGA: Global Positioning System Fix Data
#[derive(Debug, Clone, PartialEq)]
pub struct FixData {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub fix_quality: u8,
    pub satellites: u32,
    pub time: Option<NaiveTime>,
}

/// RMC: Recommended Minimum Navigation Information
#[derive(Debug, Clone, PartialEq)]
pub struct Navigation {
    pub latitude: f64,
    pub longitude: f64,
    pub speed_knots: f64,
    pub datetime: Option<NaiveDateTime>,
}

/// GSV: Satellites in View
#[derive(Debug, Clone, PartialEq)]
pub struct SatellitesInView {
    pub satellites: u32,
}

/// A decoded sentence, one variant per category that updates the fix
#[derive(Debug, Clone, PartialEq)]
pub enum Sentence {
    FixData(FixData),
    Navigation(Navigation),
    SatellitesInView(SatellitesInView),
}

impl Sentence {
    /// Three-letter NMEA type of the sentence
    pub fn kind(&self) -> &'static str {
        match self {
            Sentence::FixData(_) => "GGA",
            Sentence::Navigation(_) => "RMC",
            Sentence::SatellitesInView(_) => "GSV",
        }
    }
}

/// Decode a single NMEA line
pub fn parse_sentence(line: &str) -> Result<Sentence> {
    let body = line
        .trim()
        .strip_prefix('$')
        .ok_or_else(|| GpsError::parse("missing '$' start marker"))?;
    let body = verify_checksum(body)?;
    let parts: Vec<&str> = body.split(',').collect();

    let header = parts[0];
    if header.len() != 5 || !header.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(GpsError::parse(format!("malformed header {:?}", header)));
    }
    // Proprietary sentences ($P...) reuse standard type codes with other layouts
    let talker = &header[..2];
    if talker.starts_with('P') || !talker.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(GpsError::parse(format!("unsupported talker {:?}", talker)));
    }

    match &header[2..] {
        "GGA" => parse_gga(&parts).map(Sentence::FixData),
        "RMC" => parse_rmc(&parts).map(Sentence::Navigation),
        "GSV" => parse_gsv(&parts).map(Sentence::SatellitesInView),
        _ => Err(GpsError::parse(format!("unsupported sentence {}", header))),
    }
}

/// Strip and check the `*hh` suffix. Sentences without one are accepted as is.
fn verify_checksum(body: &str) -> Result<&str> {
    let Some((data, checksum)) = body.split_once('*') else {
        return Ok(body);
    };

    if checksum.len() != 2 || !checksum.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(GpsError::parse(format!("malformed checksum {:?}", checksum)));
    }
    let expected = u8::from_str_radix(checksum, 16)
        .map_err(|_| GpsError::parse(format!("malformed checksum {:?}", checksum)))?;
    let actual = data.bytes().fold(0u8, |acc, b| acc ^ b);

    if expected != actual {
        return Err(GpsError::parse(format!(
            "checksum mismatch: sentence says {:02X}, computed {:02X}",
            expected, actual
        )));
    }
    Ok(data)
}

fn require_fields(parts: &[&str], min: usize) -> Result<()> {
    if parts.len() < min {
        return Err(GpsError::parse(format!(
            "{} has {} fields, expected at least {}",
            parts[0],
            parts.len(),
            min
        )));
    }
    Ok(())
}

/// Parse GGA (Global Positioning System Fix Data) sentence
fn parse_gga(parts: &[&str]) -> Result<FixData> {
    require_fields(parts, 15)?;

    let time = parse_time(parts[1])?;
    let latitude = parse_coordinate(parts[2], parts[3], ('N', 'S'), 90.0)?;
    let longitude = parse_coordinate(parts[4], parts[5], ('E', 'W'), 180.0)?;
    let fix_quality = parse_number(parts[6], "fix quality")?.unwrap_or(0);
    let satellites = parse_number(parts[7], "satellite count")?.unwrap_or(0);
    // HDOP is checked but not kept
    parse_float(parts[8], "hdop")?;
    let altitude = parse_float(parts[9], "altitude")?.unwrap_or(0.0);

    Ok(FixData {
        latitude,
        longitude,
        altitude,
        fix_quality,
        satellites,
        time,
    })
}

/// Parse RMC (Recommended Minimum Course) sentence
fn parse_rmc(parts: &[&str]) -> Result<Navigation> {
    require_fields(parts, 10)?;

    let time = parse_time(parts[1])?;
    let latitude = parse_coordinate(parts[3], parts[4], ('N', 'S'), 90.0)?;
    let longitude = parse_coordinate(parts[5], parts[6], ('E', 'W'), 180.0)?;

    let speed_knots = parse_float(parts[7], "speed")?.unwrap_or(0.0);
    if speed_knots < 0.0 {
        return Err(GpsError::parse(format!("negative speed {}", speed_knots)));
    }

    let datetime = match (parse_date(parts[9])?, time) {
        (Some(date), Some(time)) => Some(date.and_time(time)),
        _ => None,
    };

    Ok(Navigation {
        latitude,
        longitude,
        speed_knots,
        datetime,
    })
}

/// Parse GSV (Satellites in View) sentence
fn parse_gsv(parts: &[&str]) -> Result<SatellitesInView> {
    require_fields(parts, 4)?;

    // Message counters must be numeric even though only the total is kept
    parse_number::<u8>(parts[1], "message count")?;
    parse_number::<u8>(parts[2], "message number")?;

    Ok(SatellitesInView {
        satellites: parse_number(parts[3], "satellites in view")?.unwrap_or(0),
    })
}

fn parse_number<T: FromStr>(field: &str, name: &str) -> Result<Option<T>> {
    if field.is_empty() {
        return Ok(None);
    }
    field
        .parse::<T>()
        .map(Some)
        .map_err(|_| GpsError::parse(format!("invalid {}: {:?}", name, field)))
}

fn parse_float(field: &str, name: &str) -> Result<Option<f64>> {
    match parse_number::<f64>(field, name)? {
        Some(value) if !value.is_finite() => {
            Err(GpsError::parse(format!("invalid {}: {:?}", name, field)))
        }
        value => Ok(value),
    }
}

/// Convert `ddmm.mmmm` plus hemisphere into signed decimal degrees.
/// Both fields empty means the receiver has no position yet.
fn parse_coordinate(
    value: &str,
    hemisphere: &str,
    (positive, negative): (char, char),
    max: f64,
) -> Result<f64> {
    if value.is_empty() && hemisphere.is_empty() {
        return Ok(0.0);
    }

    let raw = parse_float(value, "coordinate")?.ok_or_else(|| {
        GpsError::parse(format!("hemisphere {:?} without coordinate", hemisphere))
    })?;

    let degrees = (raw / 100.0).trunc();
    let minutes = raw - degrees * 100.0;
    let decimal = degrees + minutes / 60.0;
    if raw < 0.0 || minutes >= 60.0 || decimal > max {
        return Err(GpsError::parse(format!("coordinate out of range: {}", value)));
    }

    let mut chars = hemisphere.chars();
    match (chars.next(), chars.next()) {
        (Some(h), None) if h == positive => Ok(decimal),
        (Some(h), None) if h == negative => Ok(-decimal),
        _ => Err(GpsError::parse(format!("invalid hemisphere {:?}", hemisphere))),
    }
}

fn two_digits(bytes: &[u8]) -> u32 {
    u32::from(bytes[0] - b'0') * 10 + u32::from(bytes[1] - b'0')
}

/// `hhmmss` with optional fractional seconds
fn parse_time(field: &str) -> Result<Option<NaiveTime>> {
    if field.is_empty() {
        return Ok(None);
    }

    let (hms, fraction) = field.split_once('.').unwrap_or((field, ""));
    let hms = hms.as_bytes();
    if hms.len() != 6
        || !hms.iter().all(u8::is_ascii_digit)
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(GpsError::parse(format!("invalid time {:?}", field)));
    }

    let (hour, minute, second) = (
        two_digits(&hms[0..2]),
        two_digits(&hms[2..4]),
        two_digits(&hms[4..6]),
    );
    NaiveTime::from_hms_opt(hour, minute, second)
        .map(Some)
        .ok_or_else(|| GpsError::parse(format!("invalid time {:?}", field)))
}

/// `ddmmyy`, two-digit years pivot at 70
fn parse_date(field: &str) -> Result<Option<NaiveDate>> {
    if field.is_empty() {
        return Ok(None);
    }

    let bytes = field.as_bytes();
    if bytes.len() != 6 || !bytes.iter().all(u8::is_ascii_digit) {
        return Err(GpsError::parse(format!("invalid date {:?}", field)));
    }

    let year = match two_digits(&bytes[4..6]) {
        yy if yy < 70 => 2000 + yy,
        yy => 1900 + yy,
    };
    NaiveDate::from_ymd_opt(year as i32, two_digits(&bytes[2..4]), two_digits(&bytes[0..2]))
        .map(Some)
        .ok_or_else(|| GpsError::parse(format!("invalid date {:?}", field)))
}

// SBS/BaseStation input adapter
//
// Decodes the "port 30003" CSV text format emitted by dump1090-style
// receivers. Only MSG,3 (airborne position) rows carry the full position the
// coverage engine needs; everything else, and anything malformed, decodes to
// None and is skipped.

use chrono::NaiveDateTime;

use crate::constants::FT_TO_M;

/// A decoded position report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionReport {
    /// 24-bit ICAO address
    pub icao: u32,
    /// Unix seconds, from the logged date/time fields (taken as UTC)
    pub timestamp: f64,
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
    /// Altitude in meters
    pub alt: f64,
}

/// Parse one SBS line. Returns None for non-position messages and for
/// malformed input; a bad report is never an error, it is just skipped.
pub fn parse_line(line: &str) -> Option<PositionReport> {
    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() < 16 || fields[0] != "MSG" || fields[1] != "3" {
        return None;
    }

    let icao = u32::from_str_radix(fields[4], 16).ok()?;
    let timestamp = parse_timestamp(fields[8], fields[9])?;
    let alt_ft: f64 = fields[11].parse().ok()?;
    let lat: f64 = fields[14].parse().ok()?;
    let lon: f64 = fields[15].parse().ok()?;

    Some(PositionReport {
        icao,
        timestamp,
        lat,
        lon,
        alt: alt_ft * FT_TO_M,
    })
}

/// "2020/01/01" + "00:00:01.500" -> Unix seconds with fraction
fn parse_timestamp(date: &str, time: &str) -> Option<f64> {
    let dt = NaiveDateTime::parse_from_str(
        &format!("{} {}", date, time),
        "%Y/%m/%d %H:%M:%S%.f",
    )
    .ok()?;
    Some(dt.and_utc().timestamp_micros() as f64 / 1e6)
}

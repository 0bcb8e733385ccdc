// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Time conversions: Modified Julian Date, ISO-8601 timestamps and
Greenwich Mean Sidereal Time.
*/

use chrono::{DateTime, NaiveDateTime, Utc};

/// MJD of the UNIX epoch (1970-01-01T00:00:00 UTC)
const UNIX_EPOCH_MJD: f64 = 40587.0;

/// Timestamp format used in spectrum headers and reports
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Reduce `x` modulo `y` into `[0, y)`.
pub fn modulo(x: f64, y: f64) -> f64 {
    x.rem_euclid(y)
}

/// Convert a Modified Julian Date to a UTC timestamp.
///
/// Returns None for dates outside the representable chrono range.
pub fn mjd_to_datetime(mjd: f64) -> Option<DateTime<Utc>> {
    let seconds = (mjd - UNIX_EPOCH_MJD) * 86400.0;
    let whole = seconds.floor();
    let mut nanos = ((seconds - whole) * 1e9).round() as u32;
    let mut secs = whole as i64;
    if nanos >= 1_000_000_000 {
        nanos -= 1_000_000_000;
        secs += 1;
    }
    DateTime::from_timestamp(secs, nanos)
}

/// Convert a UTC timestamp to a Modified Julian Date.
pub fn datetime_to_mjd(datetime: &DateTime<Utc>) -> f64 {
    let seconds =
        datetime.timestamp() as f64 + f64::from(datetime.timestamp_subsec_nanos()) * 1e-9;
    UNIX_EPOCH_MJD + seconds / 86400.0
}

/// Format a UTC timestamp as `YYYY-MM-DDTHH:MM:SS.mmm`.
pub fn format_timestamp(datetime: &DateTime<Utc>) -> String {
    datetime.format(TIMESTAMP_FORMAT).to_string()
}

/// Format a Modified Julian Date as `YYYY-MM-DDTHH:MM:SS.mmm`, or the
/// all-zero placeholder when the date cannot be represented.
pub fn format_mjd(mjd: f64) -> String {
    match mjd_to_datetime(mjd) {
        Some(datetime) => format_timestamp(&datetime),
        None => String::from("0000-00-00T00:00:00.000"),
    }
}

/// Parse a `YYYY-MM-DDTHH:MM:SS[.sss]` timestamp as UTC. The fractional
/// seconds are optional.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .map(|naive| naive.and_utc())
}

/// Greenwich Mean Sidereal Time at `mjd`, in degrees within `[0, 360)`.
pub fn gmst(mjd: f64) -> f64 {
    let t = (mjd - 51544.5) / 36525.0;
    modulo(
        280.46061837 + 360.98564736629 * (mjd - 51544.5) + t * t * (0.000387933 - t / 38710000.0),
        360.0,
    )
}

/// Time derivative of GMST at `mjd`, in degrees per day.
pub fn dgmst(mjd: f64) -> f64 {
    let t = (mjd - 51544.5) / 36525.0;
    360.98564736629 + t * (0.000387933 - t / 38710000.0)
}

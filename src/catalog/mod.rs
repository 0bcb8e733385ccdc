// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Access to the observation catalogs: the site table, the per-satellite
frequency list and NORAD two-line element files.
*/
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use regex::Regex;

pub mod error;
pub mod tle;

#[cfg(test)]
mod test;

use crate::time::format_timestamp;
pub use error::CatalogError;

lazy_static::lazy_static! {
    // id(4) abbrev(2) lat lon alt_m, observer name from byte column 38.
    static ref RE_SITE: Regex =
        Regex::new(r"^\s*(\d{1,4})\s+(\S{2})\s+([+-]?[\d.]+)\s+([+-]?[\d.]+)\s+([+-]?[\d.]+)")
            .unwrap();
    static ref RE_FREQUENCY: Regex = Regex::new(r"^\s*(\d{1,5})\s+([\d.]+)").unwrap();
}

/// The data directory holding `data/sites.txt` and `data/frequencies.txt`.
///
/// Constructed once (from `ST_DATADIR` or an explicit path) and threaded
/// into every catalog access.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Use an explicit directory.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        DataDir { root: root.into() }
    }

    /// Read the directory from the `ST_DATADIR` environment variable.
    pub fn from_env() -> Result<Self, CatalogError> {
        match std::env::var_os("ST_DATADIR") {
            Some(root) => Ok(DataDir { root: root.into() }),
            None => Err(CatalogError::DataDirNotSet),
        }
    }

    /// Path of the site table.
    pub fn sites_path(&self) -> PathBuf {
        self.root.join("data").join("sites.txt")
    }

    /// Path of the frequency list.
    pub fn frequencies_path(&self) -> PathBuf {
        self.root.join("data").join("frequencies.txt")
    }
}

/// One ground station from the site table. Read-only once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub id: u32,
    /// Geodetic longitude, degrees east
    pub longitude_deg: f64,
    /// Geodetic latitude, degrees north
    pub latitude_deg: f64,
    /// Height above the ellipsoid, km (the table stores meters)
    pub altitude_km: f64,
    pub observer: String,
}

/// One entry of the frequency list: a catalog number and its rest-frame
/// emission frequency in MHz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyEntry {
    pub satno: u32,
    pub freq_mhz: f64,
}

fn open_buffered(path: &Path) -> Result<BufReader<File>, CatalogError> {
    let file = File::open(path).map_err(|source| CatalogError::Open {
        path: path.display().to_string(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Look up a site by id in `$ST_DATADIR/data/sites.txt`.
///
/// Comment lines start with `#`. When the same id appears more than once the
/// last entry wins. A missing file or an unknown id is an error.
pub fn load_site(data_dir: &DataDir, site_id: u32) -> Result<Site, CatalogError> {
    let path = data_dir.sites_path();
    let reader = open_buffered(&path)?;

    let mut found = None;
    for line in reader.lines() {
        let line = line.map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        if line.trim_start().starts_with('#') {
            continue;
        }
        let captures = match RE_SITE.captures(&line) {
            Some(captures) => captures,
            None => continue,
        };
        let id: u32 = match captures[1].parse() {
            Ok(id) => id,
            Err(_) => continue,
        };
        if id != site_id {
            continue;
        }

        let latitude_deg: f64 = captures[3].parse().unwrap_or(0.0);
        let longitude_deg: f64 = captures[4].parse().unwrap_or(0.0);
        let altitude_m: f64 = captures[5].parse().unwrap_or(0.0);
        // The observer name occupies a fixed column; short lines have none.
        let observer = line
            .get(38..)
            .map(|name| name.trim().to_string())
            .unwrap_or_default();

        found = Some(Site {
            id,
            longitude_deg,
            latitude_deg,
            altitude_km: altitude_m / 1000.0,
            observer,
        });
    }

    found.ok_or(CatalogError::SiteNotFound(site_id))
}

/// Read the frequency list. Lines that do not parse are skipped.
pub fn read_frequencies(data_dir: &DataDir) -> Result<Vec<FrequencyEntry>, CatalogError> {
    let path = data_dir.frequencies_path();
    let reader = open_buffered(&path)?;

    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        if line.trim_start().starts_with('#') {
            continue;
        }
        if let Some(captures) = RE_FREQUENCY.captures(&line) {
            let satno = captures[1].parse::<u32>();
            let freq_mhz = captures[2].parse::<f64>();
            if let (Ok(satno), Ok(freq_mhz)) = (satno, freq_mhz) {
                entries.push(FrequencyEntry { satno, freq_mhz });
            }
        }
    }

    Ok(entries)
}

/// Append a confirmed identification to the frequency list:
/// `SSSSS FFFF.FFF YYYY-MM-DDTHH:MM:SS SSSS`.
pub fn append_frequency(
    data_dir: &DataDir,
    satno: u32,
    freq_mhz: f64,
    timestamp: &DateTime<Utc>,
    site_id: u32,
) -> Result<(), CatalogError> {
    let path = data_dir.frequencies_path();
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| CatalogError::Append {
            path: path.display().to_string(),
            source,
        })?;

    let stamp = format_timestamp(timestamp);
    let stamp = &stamp[..stamp.len().min(19)];
    writeln!(file, "{:05} {:8.3} {} {:04}", satno, freq_mhz, stamp, site_id).map_err(|source| {
        CatalogError::Append {
            path: path.display().to_string(),
            source,
        }
    })
}

/// Append the matching record to the identification log:
/// `SSSSS FFFF.FFF RMS_KHZ TCA`.
pub fn append_log(
    log_path: &Path,
    satno: u32,
    freq_mhz: f64,
    rms_khz: f64,
    tca: &str,
) -> Result<(), CatalogError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|source| CatalogError::Append {
            path: log_path.display().to_string(),
            source,
        })?;

    let tca = &tca[..tca.len().min(19)];
    writeln!(file, "{:05} {:8.3} {:.3} {}", satno, freq_mhz, rms_khz, tca).map_err(|source| {
        CatalogError::Append {
            path: log_path.display().to_string(),
            source,
        }
    })
}

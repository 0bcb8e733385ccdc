// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Doppler trace synthesis: given a TLE catalog, a time grid and an observing
site, predict the received frequency track of every catalogued emitter in a
band, in either a direct or a bistatic (illuminator + receiver) geometry.
*/
use std::path::Path;

use log::{error, warn};
use sgp4::{Constants, Elements};

pub mod error;
pub mod identify;


use crate::catalog::tle::TleReader;
use crate::catalog::{load_site, read_frequencies, DataDir, Site};
use crate::constants::{
    EARTH_RADIUS_KM, GRAVES_SITE_ID, ILLUMINATOR_HIDDEN_ZA_DEG, SPEED_OF_LIGHT_KM_S,
};
use crate::geometry::{
    equatorial_direction, equatorial_to_horizontal, observer_eci, StateVector,
};
use crate::time::mjd_to_datetime;
pub use error::TraceError;

/// Per-epoch geometric context: the observer state and, in bistatic mode,
/// the illuminator state at the same instant.
#[derive(Debug, Clone, Copy)]
pub struct Point {
    pub observer: StateVector,
    pub illuminator: Option<StateVector>,
}

/// The predicted track of one catalog entry over a time grid.
///
/// The three arrays always have equal length. In bistatic mode a zenith
/// angle of 100 degrees marks samples outside the illuminator beam.
#[derive(Debug, Clone)]
pub struct Trace {
    pub satno: u32,
    pub site_id: u32,
    /// Rest-frame emission frequency from the catalog (Hz)
    pub freq0_hz: f64,
    pub mjd: Vec<f64>,
    pub freq: Vec<f64>,
    pub za: Vec<f64>,
}

impl Trace {
    pub fn len(&self) -> usize {
        self.mjd.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mjd.is_empty()
    }
}

/// Range (km) and range-rate (km/s, positive receding) between a satellite
/// state and a ground state, along with the separation vector.
pub(crate) fn line_of_sight(
    satellite: &StateVector,
    ground: &StateVector,
) -> (crate::geometry::Vec3, f64, f64) {
    let delta = satellite.position - ground.position;
    let delta_v = satellite.velocity - ground.velocity;
    let range = delta.norm();
    let range_rate = delta_v.dot(&delta) / range;
    (delta, range, range_rate)
}

/// Zenith angle (deg) of a direction `delta` above the observer at
/// `observer_pos`, treating the observer as sitting on a sphere of Earth
/// radius.
pub(crate) fn zenith_angle(observer_pos: &crate::geometry::Vec3, delta: &crate::geometry::Vec3, range: f64) -> f64 {
    (observer_pos.dot(delta) / (range * EARTH_RADIUS_KM))
        .clamp(-1.0, 1.0)
        .acos()
        .to_degrees()
}

/// Propagate an element set to `mjd`. Failures are reported as strings so
/// callers can log and skip the offending candidate.
pub(crate) fn propagate(
    constants: &Constants,
    elements: &Elements,
    mjd: f64,
) -> Result<StateVector, String> {
    let datetime = mjd_to_datetime(mjd).ok_or_else(|| format!("MJD {} out of range", mjd))?;
    let minutes = elements
        .datetime_to_minutes_since_epoch(&datetime.naive_utc())
        .map_err(|e| e.to_string())?;
    let prediction = constants.propagate(minutes).map_err(|e| e.to_string())?;

    Ok(StateVector {
        position: crate::geometry::Vec3::new(
            prediction.position[0],
            prediction.position[1],
            prediction.position[2],
        ),
        velocity: crate::geometry::Vec3::new(
            prediction.velocity[0],
            prediction.velocity[1],
            prediction.velocity[2],
        ),
    })
}

/// Observer (and illuminator) states on a time grid.
pub(crate) fn observer_points(
    data_dir: &DataDir,
    site_id: u32,
    mjds: &[f64],
    bistatic: bool,
) -> Result<(Site, Option<Site>, Vec<Point>), TraceError> {
    let site = load_site(data_dir, site_id)?;
    let illuminator_site = if bistatic {
        Some(load_site(data_dir, GRAVES_SITE_ID)?)
    } else {
        None
    };

    let points = mjds
        .iter()
        .map(|&mjd| Point {
            observer: observer_eci(mjd, site.longitude_deg, site.latitude_deg, site.altitude_km),
            illuminator: illuminator_site.as_ref().map(|s| {
                observer_eci(mjd, s.longitude_deg, s.latitude_deg, s.altitude_km)
            }),
        })
        .collect();

    Ok((site, illuminator_site, points))
}

/// Predict the frequency track of every catalog entry inside the band
/// `center_freq_mhz ± bandwidth_mhz / 2`.
///
/// The valid part of `mjds` is its leading run of nonzero entries. When
/// several element sets carry the same catalog number the one read last
/// overwrites the earlier predictions.
///
/// An unreadable TLE file yields an empty result (logged); an unreadable
/// frequency list or site table is an error.
pub fn synthesize<P: AsRef<Path>>(
    data_dir: &DataDir,
    tle_path: P,
    mjds: &[f64],
    site_id: u32,
    center_freq_mhz: f64,
    bandwidth_mhz: f64,
    bistatic: bool,
) -> Result<Vec<Trace>, TraceError> {
    let fmin = center_freq_mhz - 0.5 * bandwidth_mhz;
    let fmax = center_freq_mhz + 0.5 * bandwidth_mhz;

    let candidates: Vec<_> = read_frequencies(data_dir)?
        .into_iter()
        .filter(|entry| entry.freq_mhz >= fmin && entry.freq_mhz <= fmax)
        .collect();
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    // Zeros terminate the valid prefix of the time grid.
    let valid = mjds.iter().position(|&mjd| mjd == 0.0).unwrap_or(mjds.len());
    let mjds = &mjds[..valid];
    if mjds.is_empty() {
        return Ok(Vec::new());
    }

    if let Err(e) = TleReader::open(tle_path.as_ref(), None) {
        error!("{}", e);
        return Ok(Vec::new());
    }

    let (_, illuminator_site, points) = observer_points(data_dir, site_id, mjds, bistatic)?;

    let mut traces = Vec::with_capacity(candidates.len());
    for entry in candidates {
        let freq0_hz = entry.freq_mhz * 1e6;
        let mut trace = Trace {
            satno: entry.satno,
            site_id,
            freq0_hz,
            mjd: vec![0.0; mjds.len()],
            freq: vec![0.0; mjds.len()],
            za: vec![0.0; mjds.len()],
        };

        let reader = match TleReader::open(tle_path.as_ref(), Some(entry.satno)) {
            Ok(reader) => reader,
            Err(e) => {
                error!("{}", e);
                continue;
            }
        };
        for elements in reader {
            let elements = match elements {
                Ok(elements) => elements,
                Err(e) => {
                    warn!("skipping element set: {}", e);
                    continue;
                }
            };
            let constants = match Constants::from_elements(&elements) {
                Ok(constants) => constants,
                Err(e) => {
                    warn!("satellite {}: {}", entry.satno, e);
                    continue;
                }
            };

            for (i, (&mjd, point)) in mjds.iter().zip(&points).enumerate() {
                let satellite = match propagate(&constants, &elements, mjd) {
                    Ok(satellite) => satellite,
                    Err(message) => {
                        warn!("satellite {} at MJD {}: {}", entry.satno, mjd, message);
                        break;
                    }
                };

                let (delta, range, range_rate) = line_of_sight(&satellite, &point.observer);
                trace.mjd[i] = mjd;
                trace.freq[i] = (1.0 - range_rate / SPEED_OF_LIGHT_KM_S) * freq0_hz;
                trace.za[i] = zenith_angle(&point.observer.position, &delta, range);

                if let (Some(illuminator), Some(illuminator_site)) =
                    (&point.illuminator, &illuminator_site)
                {
                    let (delta_g, _, illuminator_rate) = line_of_sight(&satellite, illuminator);
                    trace.freq[i] = (1.0 - range_rate / SPEED_OF_LIGHT_KM_S)
                        * (1.0 - illuminator_rate / SPEED_OF_LIGHT_KM_S)
                        * freq0_hz;

                    // Only traces through the illuminator's fan beam are real.
                    let (ra, de) = equatorial_direction(&delta_g);
                    let (azimuth, altitude) = equatorial_to_horizontal(
                        mjd,
                        ra,
                        de,
                        illuminator_site.longitude_deg,
                        illuminator_site.latitude_deg,
                    );
                    let in_beam = (azimuth < 90.0 || azimuth > 270.0)
                        && altitude > 15.0
                        && altitude < 40.0;
                    if !in_beam {
                        trace.za[i] = ILLUMINATOR_HIDDEN_ZA_DEG;
                    }
                }
            }
        }

        traces.push(trace);
    }

    Ok(traces)
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Fit an observed frequency-versus-time curve against candidate element sets
and rank them by residual RMS.
*/
use std::path::Path;

use log::warn;
use sgp4::Constants;

use super::error::TraceError;
use super::{line_of_sight, observer_points, propagate};
use crate::catalog::tle::TleReader;
use crate::catalog::DataDir;
use crate::constants::{DIRECT_RMS_LIMIT_HZ, GRAVES_CARRIER_HZ, SPEED_OF_LIGHT_KM_S};
use crate::geometry::{equatorial_direction, equatorial_to_horizontal};

/// A measured frequency track: the input to identification.
#[derive(Debug, Clone)]
pub struct ObservedTrace {
    pub site_id: u32,
    pub mjd: Vec<f64>,
    pub freq: Vec<f64>,
}

impl ObservedTrace {
    fn validate(&self) -> Result<(), TraceError> {
        if self.mjd.len() != self.freq.len() {
            return Err(TraceError::MismatchedArrays {
                mjd: self.mjd.len(),
                freq: self.freq.len(),
            });
        }
        if self.mjd.len() < 2 {
            return Err(TraceError::TooFewSamples(self.mjd.len()));
        }
        Ok(())
    }
}

/// One element set's fit against the observed trace.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub satno: u32,
    /// Fitted emission frequency (direct) or the fixed illuminator carrier
    /// (bistatic), Hz
    pub freq0_hz: f64,
    /// Residual RMS of the fit (Hz)
    pub rms_hz: f64,
    /// Time of closest approach, when the range-rate changes sign inside
    /// the observation window
    pub tca_mjd: Option<f64>,
    /// Pointing at the trace midpoint, from the observer
    pub azimuth_deg: f64,
    pub altitude_deg: f64,
}

/// Ranked identification result.
#[derive(Debug, Clone, Default)]
pub struct Identification {
    /// Candidates below the acceptance threshold, in catalog order
    pub candidates: Vec<Candidate>,
    /// The minimum-RMS candidate
    pub best: Option<Candidate>,
}

/// Latest interior sign change of the range-rate; the scan starts at the
/// second sample so the first one never pairs with an undefined neighbour.
pub(crate) fn find_tca(range_rates: &[f64], mjds: &[f64]) -> Option<f64> {
    let mut tca = None;
    for i in 1..range_rates.len() {
        if range_rates[i] * range_rates[i - 1] < 0.0 {
            tca = Some(mjds[i]);
        }
    }
    tca
}

/// Fit every element set in `tle_path` (optionally restricted to one
/// catalog number) against the observed trace.
///
/// Direct mode estimates the emission frequency per candidate with a single
/// weighted least-squares step; bistatic mode scores against the fixed
/// illuminator carrier. Candidates with an RMS under 1 kHz are returned,
/// minimum first in `best`.
pub fn identify<P: AsRef<Path>>(
    data_dir: &DataDir,
    tle_path: P,
    observed: &ObservedTrace,
    satno: Option<u32>,
    bistatic: bool,
) -> Result<Identification, TraceError> {
    observed.validate()?;
    let n = observed.mjd.len();
    let midpoint = n / 2;

    let (site, _, points) = observer_points(data_dir, observed.site_id, &observed.mjd, bistatic)?;

    let mut identification = Identification::default();
    let mut range_rates = vec![0.0f64; n];
    let mut illuminator_rates = vec![0.0f64; n];

    for elements in TleReader::open(tle_path.as_ref(), satno)? {
        let elements = match elements {
            Ok(elements) => elements,
            Err(e) => {
                warn!("skipping element set: {}", e);
                continue;
            }
        };
        let candidate_satno = elements.norad_id as u32;
        let constants = match Constants::from_elements(&elements) {
            Ok(constants) => constants,
            Err(e) => {
                warn!("satellite {}: {}", candidate_satno, e);
                continue;
            }
        };

        let mut azimuth = 0.0;
        let mut altitude = 0.0;
        let mut failed = false;
        for (i, (&mjd, point)) in observed.mjd.iter().zip(&points).enumerate() {
            let satellite = match propagate(&constants, &elements, mjd) {
                Ok(satellite) => satellite,
                Err(message) => {
                    warn!("satellite {} at MJD {}: {}", candidate_satno, mjd, message);
                    failed = true;
                    break;
                }
            };

            let (delta, _, range_rate) = line_of_sight(&satellite, &point.observer);
            range_rates[i] = range_rate;
            if let Some(illuminator) = &point.illuminator {
                let (_, _, illuminator_rate) = line_of_sight(&satellite, illuminator);
                illuminator_rates[i] = illuminator_rate;
            }

            if i == midpoint {
                let (ra, de) = equatorial_direction(&delta);
                (azimuth, altitude) = equatorial_to_horizontal(
                    mjd,
                    ra,
                    de,
                    site.longitude_deg,
                    site.latitude_deg,
                );
            }
        }
        if failed {
            continue;
        }

        let (freq0_hz, rms_hz) = if bistatic {
            // The illuminator carrier is taken as-is; catalog entries are
            // ignored on this path.
            let freq0 = GRAVES_CARRIER_HZ;
            let rms = (observed
                .freq
                .iter()
                .enumerate()
                .map(|(i, &f)| {
                    let predicted = (1.0 - range_rates[i] / SPEED_OF_LIGHT_KM_S)
                        * (1.0 - illuminator_rates[i] / SPEED_OF_LIGHT_KM_S)
                        * freq0;
                    (f - predicted) * (f - predicted)
                })
                .sum::<f64>()
                / n as f64)
                .sqrt();
            (freq0, rms)
        } else {
            // One weighted least-squares step for the emission frequency.
            let mut sum1 = 0.0;
            let mut sum2 = 0.0;
            for (i, &f) in observed.freq.iter().enumerate() {
                let beta = 1.0 - range_rates[i] / SPEED_OF_LIGHT_KM_S;
                sum1 += beta * f;
                sum2 += beta * beta;
            }
            let freq0 = sum1 / sum2;
            let rms = (observed
                .freq
                .iter()
                .enumerate()
                .map(|(i, &f)| {
                    let predicted = (1.0 - range_rates[i] / SPEED_OF_LIGHT_KM_S) * freq0;
                    (f - predicted) * (f - predicted)
                })
                .sum::<f64>()
                / n as f64)
                .sqrt();
            (freq0, rms)
        };

        if rms_hz < DIRECT_RMS_LIMIT_HZ {
            let candidate = Candidate {
                satno: candidate_satno,
                freq0_hz,
                rms_hz,
                tca_mjd: find_tca(&range_rates, &observed.mjd),
                azimuth_deg: azimuth,
                altitude_deg: altitude,
            };
            let better = identification
                .best
                .as_ref()
                .map(|best| rms_hz < best.rms_hz)
                .unwrap_or(true);
            if better {
                identification.best = Some(candidate.clone());
            }
            identification.candidates.push(candidate);
        }
    }

    Ok(identification)
}

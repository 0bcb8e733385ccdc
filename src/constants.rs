// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Physical constants and fixed parameters shared across the crate.
*/

/// Earth equatorial radius (km)
pub const EARTH_RADIUS_KM: f64 = 6378.135;

/// Earth flattening (WGS/IAU oblate-Earth model)
pub const FLATTENING: f64 = 1.0 / 298.257;

/// Speed of light (km/s)
pub const SPEED_OF_LIGHT_KM_S: f64 = 299_792.458;

/// Astronomical unit (km)
pub const ASTRONOMICAL_UNIT_KM: f64 = 149_597_879.691;

/// Offset between Julian Date and Modified Julian Date
pub const MJD_TO_JD_OFFSET: f64 = 2_400_000.5;

/// Site id reserved for the bistatic illuminator (the Graves radar)
pub const GRAVES_SITE_ID: u32 = 9999;

/// Published carrier frequency of the Graves radar (Hz)
pub const GRAVES_CARRIER_HZ: f64 = 143_050_000.0;

/// Zenith-angle sentinel marking a sample outside the illuminator beam (deg)
pub const ILLUMINATOR_HIDDEN_ZA_DEG: f64 = 100.0;

/// Residual RMS above which a direct-mode candidate is rejected (Hz)
pub const DIRECT_RMS_LIMIT_HZ: f64 = 1000.0;

/// Residual RMS below which a bistatic candidate is reported with pointing (Hz)
pub const BISTATIC_POINTING_RMS_HZ: f64 = 50.0;

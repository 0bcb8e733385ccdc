// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Earth-centered inertial geometry: ground-station state vectors and
coordinate transforms.
*/

use std::ops::{Add, Mul, Sub};

use crate::constants::{EARTH_RADIUS_KM, FLATTENING};
use crate::time::{dgmst, gmst, modulo};

/// A 3-component Cartesian vector in the Earth-centered inertial frame.
/// Kilometers for positions, km/s for velocities.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Vec3 { x, y, z }
    }

    /// Dot product.
    pub fn dot(&self, other: &Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Position and velocity of a body at one epoch.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct StateVector {
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Compute the ECI state of a ground observer at `mjd`.
///
/// Uses the oblate-Earth correction: geodetic latitude is mapped onto the
/// ellipsoid before rotating by local sidereal time, so the returned
/// position lies on the WGS ellipsoid when `altitude_km` is zero.
///
/// # Arguments
///
/// * `mjd` - epoch as a Modified Julian Date
///
/// * `longitude_deg` - geodetic longitude, degrees east
///
/// * `latitude_deg` - geodetic latitude, degrees north
///
/// * `altitude_km` - height above the ellipsoid, km
///
pub fn observer_eci(mjd: f64, longitude_deg: f64, latitude_deg: f64, altitude_km: f64) -> StateVector {
    let lat = latitude_deg.to_radians();
    let s = lat.sin();
    let ff = (1.0 - FLATTENING * (2.0 - FLATTENING) * s * s).sqrt();
    let gc = 1.0 / ff + altitude_km / EARTH_RADIUS_KM;
    let gs = (1.0 - FLATTENING) * (1.0 - FLATTENING) / ff + altitude_km / EARTH_RADIUS_KM;

    let theta = (gmst(mjd) + longitude_deg).to_radians();
    let dtheta = dgmst(mjd).to_radians() / 86400.0;

    let position = Vec3::new(
        gc * lat.cos() * theta.cos() * EARTH_RADIUS_KM,
        gc * lat.cos() * theta.sin() * EARTH_RADIUS_KM,
        gs * s * EARTH_RADIUS_KM,
    );
    let velocity = Vec3::new(
        -gc * lat.cos() * theta.sin() * EARTH_RADIUS_KM * dtheta,
        gc * lat.cos() * theta.cos() * EARTH_RADIUS_KM * dtheta,
        0.0,
    );

    StateVector { position, velocity }
}

/// Right ascension and declination (degrees) of the direction `delta`,
/// with right ascension reduced into `[0, 360)`.
pub fn equatorial_direction(delta: &Vec3) -> (f64, f64) {
    let r = delta.norm();
    let ra = modulo(delta.y.atan2(delta.x).to_degrees(), 360.0);
    let de = (delta.z / r).clamp(-1.0, 1.0).asin().to_degrees();
    (ra, de)
}

/// Convert equatorial `(ra, de)` to horizontal `(azimuth, altitude)` for an
/// observer at `(longitude_deg, latitude_deg)`, all in degrees. Azimuth is
/// measured from south through west and reduced into `[0, 360)`.
pub fn equatorial_to_horizontal(
    mjd: f64,
    ra_deg: f64,
    de_deg: f64,
    longitude_deg: f64,
    latitude_deg: f64,
) -> (f64, f64) {
    let h = (gmst(mjd) + longitude_deg - ra_deg).to_radians();
    let de = de_deg.to_radians();
    let lat = latitude_deg.to_radians();

    let azimuth = modulo(
        h.sin()
            .atan2(h.cos() * lat.sin() - de.tan() * lat.cos())
            .to_degrees(),
        360.0,
    );
    let altitude = (lat.sin() * de.sin() + lat.cos() * de.cos() * h.cos())
        .clamp(-1.0, 1.0)
        .asin()
        .to_degrees();

    (azimuth, altitude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::gmst;

    #[test]
    fn test_vec3_ops() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, -5.0, 6.0);
        assert_eq!(a + b, Vec3::new(5.0, -3.0, 9.0));
        assert_eq!(a - b, Vec3::new(-3.0, 7.0, -3.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(a.dot(&b), 12.0);
        assert_eq!(Vec3::new(3.0, 4.0, 0.0).norm(), 5.0);
    }

    #[test]
    fn test_observer_on_ellipsoid_at_zero_altitude() {
        // (x² + y²)/a² + z²/b² == 1 on the ellipsoid; a 1 cm radial error
        // perturbs the left side by roughly 3e-9.
        let a = EARTH_RADIUS_KM;
        let b = EARTH_RADIUS_KM * (1.0 - FLATTENING);
        for &(lon, lat) in &[(0.0, 0.0), (6.0, 52.0), (-71.0, -33.5), (120.0, 80.0)] {
            let state = observer_eci(59000.0, lon, lat, 0.0);
            let p = state.position;
            let lhs = (p.x * p.x + p.y * p.y) / (a * a) + p.z * p.z / (b * b);
            assert!((lhs - 1.0).abs() < 3e-9, "off ellipsoid at lat {}: {}", lat, lhs);
        }
    }

    #[test]
    fn test_observer_velocity_matches_numerical_derivative() {
        let mjd = 59123.25;
        let eps = 1e-5;
        let before = observer_eci(mjd - eps, 6.7, 52.8, 0.025);
        let after = observer_eci(mjd + eps, 6.7, 52.8, 0.025);
        let state = observer_eci(mjd, 6.7, 52.8, 0.025);

        let dt = 2.0 * eps * 86400.0;
        let numeric = (after.position - before.position) * (1.0 / dt);
        assert!((numeric - state.velocity).norm() < 1e-6);
    }

    #[test]
    fn test_equatorial_to_horizontal_zenith() {
        // An object at hour angle zero and declination equal to the latitude
        // sits at the zenith.
        let mjd = 58849.0;
        let (lon, lat) = (4.5, 52.1);
        let ra = gmst(mjd) + lon;
        let (_, altitude) = equatorial_to_horizontal(mjd, ra, lat, lon, lat);
        assert!((altitude - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_equatorial_to_horizontal_pole() {
        // The celestial pole sits at altitude == latitude; in this
        // south-referenced convention due north is azimuth 180.
        let (azimuth, altitude) = equatorial_to_horizontal(60000.0, 123.0, 90.0, 6.0, 51.0);
        assert!((altitude - 51.0).abs() < 1e-6);
        assert!((azimuth - 180.0).abs() < 1e-6);
    }

    #[test]
    fn test_equatorial_direction() {
        let (ra, de) = equatorial_direction(&Vec3::new(0.0, 1.0, 0.0));
        assert!((ra - 90.0).abs() < 1e-9);
        assert!(de.abs() < 1e-9);

        let (ra, de) = equatorial_direction(&Vec3::new(-1.0, 0.0, 1.0));
        assert!((ra - 180.0).abs() < 1e-9);
        assert!((de - 45.0).abs() < 1e-9);
    }
}

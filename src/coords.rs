//! Coordinate frames and observer geometry.
//!
//! Positions come out of the propagator in the Earth-centered inertial
//! (ECI) frame of the TLE epoch. This module converts them to geodetic
//! latitude/longitude/altitude, to Earth-centered Earth-fixed (ECEF), and
//! to azimuth/elevation/range as seen from a ground station.
//!
//! References: Celestrak columns v02n02 and v02n03, and the 1992
//! Astronomical Almanac page K11 for the observer position on the
//! oblate ellipsoid.

use crate::constants::{EQUATOR_RADIUS, GRAVITY_EARTH, POLAR_RADIUS, RAD2DEG, TWOPI};
use crate::gravity::GravityConstants;
use crate::time::theta_g_jd;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::ops::{Add, Mul, Neg, Sub};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordError {
    #[error("latitude not within bounds -pi/2 to +pi/2")]
    InvalidLatitude,
}

/// A Cartesian vector in kilometers (or km/min for velocities).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Vector3 { x, y, z }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn dot(&self, other: &Vector3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }
}

impl Add for Vector3 {
    type Output = Vector3;

    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3 {
    type Output = Vector3;

    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Vector3;

    fn mul(self, s: f64) -> Vector3 {
        Vector3::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Neg for Vector3 {
    type Output = Vector3;

    fn neg(self) -> Vector3 {
        Vector3::new(-self.x, -self.y, -self.z)
    }
}

/// A geodetic position in radians and kilometers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Geodetic {
    /// Geodetic latitude (rad), positive north
    pub latitude: f64,
    /// Longitude (rad), positive east
    pub longitude: f64,
    /// Height above the ellipsoid (km)
    pub altitude: f64,
}

/// A geodetic position in degrees and kilometers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeodeticDegrees {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl Geodetic {
    pub const fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Geodetic {
            latitude,
            longitude,
            altitude,
        }
    }

    /// Convert to degrees, normalizing longitude into (-180, 180].
    ///
    /// Fails if the latitude lies outside [-π/2, π/2]; latitudes from
    /// [`eci_to_geodetic`] are always in range, so this only trips on
    /// hand-built values.
    pub fn to_degrees(&self) -> Result<GeodeticDegrees, CoordError> {
        if self.latitude < -PI / 2.0 || self.latitude > PI / 2.0 {
            return Err(CoordError::InvalidLatitude);
        }
        let mut longitude = (self.longitude * RAD2DEG) % 360.0;
        if longitude > 180.0 {
            longitude = 360.0 - longitude;
        } else if longitude < -180.0 {
            longitude += 360.0;
        }
        Ok(GeodeticDegrees {
            latitude: self.latitude * RAD2DEG,
            longitude,
            altitude: self.altitude,
        })
    }
}

impl GeodeticDegrees {
    pub fn to_radians(&self) -> Geodetic {
        Geodetic {
            latitude: self.latitude.to_radians(),
            longitude: self.longitude.to_radians(),
            altitude: self.altitude,
        }
    }
}

/// Topocentric look angles from an observer to a satellite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LookAngles {
    /// Azimuth (rad), clockwise from north in [0, 2π)
    pub azimuth: f64,
    /// Elevation above the horizon (rad)
    pub elevation: f64,
    /// Slant range (km)
    pub range: f64,
}

/// Convert an ECI position to geodetic coordinates, given the Greenwich
/// sidereal angle at the same instant.
///
/// Starts from the spherical-Earth solution and refines the latitude with
/// a fixed 20 iterations of the oblate-Earth fix; the WGS84 ellipsoid is
/// used regardless of the gravity model the satellite was initialized
/// with. Also returns a circular-orbit speed estimate sqrt(μ/r) in km/s
/// for the resulting altitude.
///
/// Reference: Celestrak column v02n03.
pub fn eci_to_geodetic(position: &Vector3, gmst: f64) -> (f64, Geodetic) {
    let a = EQUATOR_RADIUS;
    let b = POLAR_RADIUS;
    let f = (a - b) / a;
    let e2 = 2.0 * f - f * f;

    let sqx2y2 = (position.x * position.x + position.y * position.y).sqrt();

    // spherical Earth first guess
    let longitude = position.y.atan2(position.x) - gmst;
    let mut latitude = position.z.atan2(sqx2y2);

    // oblate Earth fix
    let mut c = 0.0;
    for _ in 0..20 {
        let sinlat = latitude.sin();
        c = 1.0 / (1.0 - e2 * sinlat * sinlat).sqrt();
        latitude = (position.z + a * c * e2 * sinlat).atan2(sqx2y2);
    }

    let altitude = sqx2y2 / latitude.cos() - a * c;
    let velocity = (GRAVITY_EARTH / (altitude + EQUATOR_RADIUS)).sqrt();

    (
        velocity,
        Geodetic {
            latitude,
            longitude,
            altitude,
        },
    )
}

/// Convert a geodetic observer position to ECI at the given Julian date.
///
/// Reference: The 1992 Astronomical Almanac, page K11.
pub fn geodetic_to_eci(observer: &Geodetic, jday: f64, grav: &GravityConstants) -> Vector3 {
    let theta = (theta_g_jd(jday) + observer.longitude) % TWOPI;
    let sinlat = observer.latitude.sin();
    let coslat = observer.latitude.cos();
    let f = grav.flattening;
    let c = 1.0 / (1.0 + f * (f - 2.0) * sinlat * sinlat).sqrt();
    let sq = c * (1.0 - f) * (1.0 - f);
    let achcp = (grav.radius_earth_km * c + observer.altitude) * coslat;

    Vector3 {
        x: achcp * theta.cos(),
        y: achcp * theta.sin(),
        z: (grav.radius_earth_km * sq + observer.altitude) * sinlat,
    }
}

/// Rotate an ECI vector into the Earth-fixed (ECEF) frame.
///
/// Reference: http://ccar.colorado.edu/ASEN5070/handouts/coordsys.doc
pub fn eci_to_ecef(eci: &Vector3, gmst: f64) -> Vector3 {
    Vector3 {
        x: eci.x * gmst.cos() + eci.y * gmst.sin(),
        y: -eci.x * gmst.sin() + eci.y * gmst.cos(),
        z: eci.z,
    }
}

/// Compute azimuth, elevation and slant range from a ground observer to a
/// satellite at an ECI position, at the given Julian date.
///
/// Reference: Celestrak column v02n02.
pub fn eci_to_look_angles(
    sat_eci: &Vector3,
    observer: &Geodetic,
    jday: f64,
    grav: &GravityConstants,
) -> LookAngles {
    let theta = (theta_g_jd(jday) + observer.longitude) % TWOPI;
    let obs_eci = geodetic_to_eci(observer, jday, grav);

    let range_vec = *sat_eci - obs_eci;

    let sinlat = observer.latitude.sin();
    let coslat = observer.latitude.cos();
    let sintheta = theta.sin();
    let costheta = theta.cos();

    // rotate the range vector into the topocentric south/east/zenith frame
    let top_s =
        sinlat * costheta * range_vec.x + sinlat * sintheta * range_vec.y - coslat * range_vec.z;
    let top_e = -sintheta * range_vec.x + costheta * range_vec.y;
    let top_z =
        coslat * costheta * range_vec.x + coslat * sintheta * range_vec.y + sinlat * range_vec.z;

    let mut azimuth = (-top_e / top_s).atan();
    if top_s > 0.0 {
        azimuth += PI;
    }
    if azimuth < 0.0 {
        azimuth += TWOPI;
    }

    let range = range_vec.magnitude();
    let elevation = (top_z / range).asin();

    LookAngles {
        azimuth,
        elevation,
        range,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gravity::GravityModel;
    use crate::time::julian_date;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_vector_ops() {
        let a = Vector3::new(1.0, 2.0, 2.0);
        let b = Vector3::new(-1.0, 0.0, 1.0);
        assert_relative_eq!(a.magnitude(), 3.0, epsilon = 1e-12);
        assert_eq!(a + b, Vector3::new(0.0, 2.0, 3.0));
        assert_eq!(a - b, Vector3::new(2.0, 2.0, 1.0));
        assert_eq!(a * 2.0, Vector3::new(2.0, 4.0, 4.0));
        assert_eq!(-b, Vector3::new(1.0, 0.0, -1.0));
        assert_relative_eq!(a.dot(&b), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_to_degrees_rejects_bad_latitude() {
        let g = Geodetic::new(1.7, 0.0, 400.0);
        assert_eq!(g.to_degrees(), Err(CoordError::InvalidLatitude));
        let g = Geodetic::new(-1.6, 0.0, 400.0);
        assert_eq!(g.to_degrees(), Err(CoordError::InvalidLatitude));
    }

    #[test]
    fn test_to_degrees_longitude_wrap() {
        let g = Geodetic::new(0.5, 200.0_f64.to_radians(), 0.0);
        let deg = g.to_degrees().unwrap();
        assert_relative_eq!(deg.longitude, 160.0, epsilon = 1e-9);

        let g = Geodetic::new(0.5, (-200.0_f64).to_radians(), 0.0);
        let deg = g.to_degrees().unwrap();
        assert_relative_eq!(deg.longitude, 160.0, epsilon = 1e-9);
    }

    #[test]
    fn test_eci_to_geodetic_equator() {
        // A point on the x axis at gmst 0 sits over the prime meridian at
        // latitude 0; the altitude is measured against the equatorial radius.
        let pos = Vector3::new(EQUATOR_RADIUS + 400.0, 0.0, 0.0);
        let (velocity, geo) = eci_to_geodetic(&pos, 0.0);
        assert_abs_diff_eq!(geo.latitude, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(geo.longitude, 0.0, epsilon = 1e-12);
        assert_relative_eq!(geo.altitude, 400.0, epsilon = 1e-6);
        assert_relative_eq!(
            velocity,
            (GRAVITY_EARTH / (EQUATOR_RADIUS + 400.0)).sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_geodetic_round_trip() {
        let grav = GravityModel::Wgs84.constants();
        let jday = julian_date(2020, 5, 23, 20, 23, 37.0);
        let obs = GeodeticDegrees {
            latitude: 55.6167,
            longitude: 12.65,
            altitude: 0.005,
        }
        .to_radians();

        let eci = geodetic_to_eci(&obs, jday, &grav);
        let (_, geo) = eci_to_geodetic(&eci, theta_g_jd(jday));

        assert_abs_diff_eq!(geo.latitude, obs.latitude, epsilon = 1e-6);
        // longitude comes back un-normalized; compare modulo 2π
        let dlon = (geo.longitude - obs.longitude).rem_euclid(TWOPI);
        assert!(dlon < 1e-6 || TWOPI - dlon < 1e-6, "dlon = {dlon}");
        assert_abs_diff_eq!(geo.altitude, obs.altitude, epsilon = 1e-3);
    }

    #[test]
    fn test_eci_to_ecef_rotation() {
        let eci = Vector3::new(7000.0, 0.0, 1000.0);
        let ecef = eci_to_ecef(&eci, PI / 2.0);
        assert_abs_diff_eq!(ecef.x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ecef.y, -7000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ecef.z, 1000.0, epsilon = 1e-9);
        // rotation preserves length
        assert_relative_eq!(ecef.magnitude(), eci.magnitude(), epsilon = 1e-9);
    }

    #[test]
    fn test_look_angles_nearly_overhead() {
        // A satellite slightly north of the observer at 500 km: high
        // elevation, azimuth near due north, slant range a bit over 500 km.
        let grav = GravityModel::Wgs84.constants();
        let jday = julian_date(2021, 1, 1, 0, 0, 0.0);
        let obs = Geodetic::new(0.5, 1.0, 0.0);
        let high = Geodetic::new(0.51, 1.0, 500.0);

        let sat = geodetic_to_eci(&high, jday, &grav);
        let look = eci_to_look_angles(&sat, &obs, jday, &grav);

        assert!(look.elevation > 80.0_f64.to_radians(), "{}", look.elevation);
        let north_offset = look.azimuth.min(TWOPI - look.azimuth);
        assert!(north_offset < 0.2, "azimuth {}", look.azimuth);
        assert!((500.0..525.0).contains(&look.range), "range {}", look.range);
    }

    #[test]
    fn test_look_angles_below_horizon() {
        // A satellite on the far side of the Earth has negative elevation.
        let grav = GravityModel::Wgs84.constants();
        let jday = julian_date(2021, 1, 1, 0, 0, 0.0);
        let obs = Geodetic::new(0.5, 1.0, 0.0);
        let far = Geodetic::new(-0.5, 1.0 + PI, 500.0);

        let sat = geodetic_to_eci(&far, jday, &grav);
        let look = eci_to_look_angles(&sat, &obs, jday, &grav);
        assert!(look.elevation < 0.0, "{}", look.elevation);
    }

    #[test]
    fn test_look_angles_range_invariants() {
        let grav = GravityModel::Wgs72.constants();
        let jday = julian_date(2020, 5, 23, 20, 23, 37.0);
        let obs = Geodetic::new(0.9707, 0.2208, 0.005);
        let sat = Vector3::new(2328.97, -5995.22, 1719.97);

        let look = eci_to_look_angles(&sat, &obs, jday, &grav);
        assert!((0.0..TWOPI).contains(&look.azimuth));
        assert!((-PI / 2.0..=PI / 2.0).contains(&look.elevation));
        assert!(look.range > 0.0);
    }
}

//! Physical and astronomical constants shared across the crate.

/// Two pi
pub const TWOPI: f64 = std::f64::consts::TAU;

/// Degrees to radians
pub const DEG2RAD: f64 = std::f64::consts::PI / 180.0;

/// Radians to degrees
pub const RAD2DEG: f64 = 180.0 / std::f64::consts::PI;

/// Revolutions/day to radians/minute divisor: 1440 min/day over 2π rad/rev
pub const XPDOTP: f64 = 1440.0 / TWOPI;

/// Julian date of the J2000 epoch (2000-01-01 12:00 UT)
pub const JULIAN_DAY_JAN_1_2000: f64 = 2_451_545.0;

/// Days per Julian century
pub const JULIAN_CENTURY: f64 = 36_525.0;

/// Seconds per solar day
pub const SECONDS_IN_DAY: f64 = 86_400.0;

/// Minutes per solar day
pub const MINUTES_PER_DAY: f64 = 1440.0;

/// Earth gravitational parameter (km³/s²), WGS84. Used by the
/// circular-orbit speed estimate in the geodetic conversion.
pub const GRAVITY_EARTH: f64 = 398_600.4418;

/// Earth equatorial radius (km), WGS84
pub const EQUATOR_RADIUS: f64 = 6378.137;

/// Earth polar radius (km), WGS84
pub const POLAR_RADIUS: f64 = 6356.752_314_2;

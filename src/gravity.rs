//! Earth gravity model registry.
//!
//! Three published standards are supported; each resolves to a fixed bundle
//! of physical constants consumed by the propagator and the coordinate
//! transforms. The model is chosen once per satellite at initialization.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GravityError {
    #[error("'{0}' is not a valid gravity model (use wgs72old, wgs72 or wgs84)")]
    UnknownModel(String),
}

/// The supported Earth gravity models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GravityModel {
    /// WGS72 with the historical hard-coded xke value.
    Wgs72Old,
    /// WGS72 (the conventional choice for TLE propagation).
    Wgs72,
    Wgs84,
}

/// Constants dependent on the selected gravity model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GravityConstants {
    /// Gravitational parameter (km³/s²)
    pub mu: f64,
    /// Earth equatorial radius (km)
    pub radius_earth_km: f64,
    /// Reciprocal of tumin: radians per minute for a satellite at one
    /// Earth radius
    pub xke: f64,
    /// Minutes per canonical time unit
    pub tumin: f64,
    /// Second zonal harmonic
    pub j2: f64,
    /// Third zonal harmonic
    pub j3: f64,
    /// Fourth zonal harmonic
    pub j4: f64,
    /// Ratio j3/j2
    pub j3oj2: f64,
    /// Ellipsoid flattening
    pub flattening: f64,
}

impl GravityModel {
    /// Canonical name string, as accepted by [`GravityModel::from_str`].
    pub fn name(self) -> &'static str {
        match self {
            GravityModel::Wgs72Old => "wgs72old",
            GravityModel::Wgs72 => "wgs72",
            GravityModel::Wgs84 => "wgs84",
        }
    }

    /// Resolve the model to its constant bundle.
    pub fn constants(self) -> GravityConstants {
        match self {
            GravityModel::Wgs72Old => {
                let mu = 398600.79964;
                let radius_earth_km = 6378.135;
                let xke = 0.0743669161;
                let j2 = 0.001082616;
                let j3 = -0.00000253881;
                let j4 = -0.00000165597;
                GravityConstants {
                    mu,
                    radius_earth_km,
                    xke,
                    tumin: 1.0 / xke,
                    j2,
                    j3,
                    j4,
                    j3oj2: j3 / j2,
                    flattening: 1.0 / 298.26,
                }
            }
            GravityModel::Wgs72 => {
                let mu = 398600.8;
                let radius_earth_km = 6378.135_f64;
                let xke = 60.0 / (radius_earth_km.powi(3) / mu).sqrt();
                let j2 = 0.001082616;
                let j3 = -0.00000253881;
                let j4 = -0.00000165597;
                GravityConstants {
                    mu,
                    radius_earth_km,
                    xke,
                    tumin: 1.0 / xke,
                    j2,
                    j3,
                    j4,
                    j3oj2: j3 / j2,
                    flattening: 1.0 / 298.26,
                }
            }
            GravityModel::Wgs84 => {
                let mu = 398600.5;
                let radius_earth_km = crate::constants::EQUATOR_RADIUS;
                let xke = 60.0 / (radius_earth_km.powi(3) / mu).sqrt();
                let j2 = 0.00108262998905;
                let j3 = -0.00000253215306;
                let j4 = -0.00000161098761;
                GravityConstants {
                    mu,
                    radius_earth_km,
                    xke,
                    tumin: 1.0 / xke,
                    j2,
                    j3,
                    j4,
                    j3oj2: j3 / j2,
                    flattening: 1.0 / 298.257223563,
                }
            }
        }
    }
}

impl FromStr for GravityModel {
    type Err = GravityError;

    fn from_str(name: &str) -> Result<Self, GravityError> {
        match name {
            "wgs72old" => Ok(GravityModel::Wgs72Old),
            "wgs72" => Ok(GravityModel::Wgs72),
            "wgs84" => Ok(GravityModel::Wgs84),
            other => Err(GravityError::UnknownModel(other.to_string())),
        }
    }
}

//! # sattrack
//!
//! SGP4/SDP4 orbit prediction from two-line element sets (TLEs), with the
//! coordinate transforms needed to turn a predicted position into
//! ground-station look angles.
//!
//! The crate is a stateless computation engine: decode a TLE, initialize a
//! [`propagator::SatelliteState`] against one of the three supported Earth
//! gravity models, then propagate to any offset from the element epoch.
//! A state is immutable once built, so it can be shared across threads and
//! propagated concurrently without synchronization.
//!
//! ```
//! use sattrack::gravity::GravityModel;
//! use sattrack::propagator::SatelliteState;
//!
//! let line1 = "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
//! let line2 = "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";
//!
//! let sat = SatelliteState::from_tle(line1, line2, GravityModel::Wgs72).unwrap();
//! let (position, _velocity) = sat.propagate(0.0).unwrap();
//! assert!(position.magnitude() > 6378.0);
//! ```

pub mod constants;
pub mod coords;
pub mod deepspace;
pub mod gravity;
pub mod propagator;
pub mod time;
pub mod tle;

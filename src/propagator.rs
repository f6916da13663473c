//! SGP4/SDP4 orbit propagation.
//!
//! [`initialize`] canonicalizes decoded TLE elements against a gravity
//! model and derives every time-independent coefficient once; the
//! resulting [`SatelliteState`] is immutable and [`propagate`] is a pure
//! function of it, so one state can serve many times (or threads)
//! concurrently. Orbits with a period of 225 minutes or more take the
//! deep-space branch and additionally carry the [`crate::deepspace`]
//! coefficient set.
//!
//! Positions come back in kilometers in the true-equator mean-equinox
//! (TEME) inertial frame of the epoch; velocities in kilometers per
//! minute.
//!
//! The algorithm follows Vallado's SGP4 ("Revisiting Spacetrack Report
//! #3", AIAA 2006-6753).
//!
//! [`propagate`]: SatelliteState::propagate

use crate::constants::{MINUTES_PER_DAY, TWOPI, XPDOTP};
use crate::coords::Vector3;
use crate::deepspace::{self, DeepSpace, ResonanceInputs};
use crate::gravity::{GravityConstants, GravityModel};
use crate::time::{days_to_mdhms, gstime, julian_date, julian_date_from_datetime};
use crate::tle::{self, OrbitalElements, TleError};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Julian date of the 1950 reference epoch used by the deep-space theory.
const JULIAN_DAY_JAN_0_1950: f64 = 2_433_281.5;

/// Orbital periods at or above this take the deep-space branch (minutes).
const DEEP_SPACE_PERIOD_MIN: f64 = 225.0;

/// Divisor guard for the low-inclination xlcof singularity.
const TEMP4: f64 = 1.5e-12;

const X2O3: f64 = 2.0 / 3.0;

/// Propagation failures. All indicate the mean elements have drifted
/// outside the theory's domain at the requested time; earlier or later
/// times may still propagate cleanly.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropagationError {
    #[error("mean motion {nm} is less than zero")]
    NegativeMeanMotion { nm: f64 },

    #[error("mean eccentricity {em} not within range 0.0 <= e < 1.0")]
    EccentricityOutOfRange { em: f64 },

    #[error("perturbed eccentricity {ep} not within range 0.0 <= e <= 1.0")]
    PerturbedEccentricityOutOfRange { ep: f64 },

    #[error("semilatus rectum {pl} is less than zero")]
    NegativeSemilatusRectum { pl: f64 },

    #[error("kepler's equation did not converge (last correction {correction})")]
    KeplerNotConverged { correction: f64 },

    #[error("satellite has decayed (radius {mrt} earth radii)")]
    Decayed { mrt: f64 },
}

/// Near-earth secular and periodic coefficients, all fixed at epoch.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NearEarthCoefficients {
    pub aycof: f64,
    pub con41: f64,
    pub cc1: f64,
    pub cc4: f64,
    pub cc5: f64,
    pub d2: f64,
    pub d3: f64,
    pub d4: f64,
    pub delmo: f64,
    pub eta: f64,
    pub argpdot: f64,
    pub omgcof: f64,
    pub sinmao: f64,
    pub t2cof: f64,
    pub t3cof: f64,
    pub t4cof: f64,
    pub t5cof: f64,
    pub x1mth2: f64,
    pub x7thm1: f64,
    pub mdot: f64,
    pub nodedot: f64,
    pub xlcof: f64,
    pub xmcof: f64,
    pub nodecf: f64,
}

/// An initialized satellite, ready to propagate.
///
/// Everything here is derived once from the TLE and the gravity model;
/// propagation never writes back, so a state is freely shareable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatelliteState {
    /// The decoded elements this state was built from.
    pub elements: OrbitalElements,
    /// Gravity model selected at initialization.
    pub model: GravityModel,
    /// Resolved constants for [`Self::model`].
    pub gravity: GravityConstants,

    /// Element epoch as a Julian date.
    pub jdsatepoch: f64,
    /// Greenwich sidereal time at epoch (rad).
    pub gsto: f64,

    /// B* drag term (1/Earth radii).
    pub bstar: f64,
    /// First derivative of mean motion (rad/min²).
    pub ndot: f64,
    /// Second derivative of mean motion (rad/min³).
    pub nddot: f64,
    /// Eccentricity at epoch.
    pub ecco: f64,
    /// Argument of perigee at epoch (rad).
    pub argpo: f64,
    /// Inclination at epoch (rad).
    pub inclo: f64,
    /// Mean anomaly at epoch (rad).
    pub mo: f64,
    /// Right ascension of the ascending node at epoch (rad).
    pub nodeo: f64,
    /// Mean motion as transmitted, Kozai convention (rad/min).
    pub no_kozai: f64,
    /// Mean motion recovered in the Brouwer convention (rad/min).
    pub no_unkozai: f64,

    /// Drop the higher-order drag terms (perigee below 220 km, or deep space).
    pub simple_drag: bool,
    pub near: NearEarthCoefficients,
    /// Present only on the deep-space branch.
    pub deep: Option<DeepSpace>,
}

/// Output of the un-Kozai step: geometry shared by the rest of init.
struct InitGeometry {
    no_unkozai: f64,
    ao: f64,
    con41: f64,
    con42: f64,
    cosio: f64,
    cosio2: f64,
    eccsq: f64,
    omeosq: f64,
    posq: f64,
    rp: f64,
    rteosq: f64,
    sinio: f64,
    gsto: f64,
}

/// Recover the Brouwer mean motion from the transmitted Kozai value and
/// derive the orbit geometry every later coefficient needs.
fn init_geometry(grav: &GravityConstants, ecco: f64, inclo: f64, no_kozai: f64, epoch: f64) -> InitGeometry {
    let eccsq = ecco * ecco;
    let omeosq = 1.0 - eccsq;
    let rteosq = omeosq.sqrt();
    let cosio = inclo.cos();
    let cosio2 = cosio * cosio;

    let ak = (grav.xke / no_kozai).powf(X2O3);
    let d1 = 0.75 * grav.j2 * (3.0 * cosio2 - 1.0) / (rteosq * omeosq);
    let mut del = d1 / (ak * ak);
    let adel = ak * (1.0 - del * del - del * (1.0 / 3.0 + 134.0 * del * del / 81.0));
    del = d1 / (adel * adel);
    let no_unkozai = no_kozai / (1.0 + del);

    let ao = (grav.xke / no_unkozai).powf(X2O3);
    let sinio = inclo.sin();
    let po = ao * omeosq;
    let con42 = 1.0 - 5.0 * cosio2;

    InitGeometry {
        no_unkozai,
        ao,
        con41: -con42 - cosio2 - cosio2,
        con42,
        cosio,
        cosio2,
        eccsq,
        omeosq,
        posq: po * po,
        rp: ao * (1.0 - ecco),
        rteosq,
        sinio,
        gsto: gstime(epoch + JULIAN_DAY_JAN_0_1950),
    }
}

/// Canonicalize decoded elements against a gravity model and derive all
/// propagation coefficients.
pub fn initialize(elements: OrbitalElements, model: GravityModel) -> SatelliteState {
    let grav = model.constants();

    // Units: rev/day family to rad/min family, degrees to radians.
    let no_kozai = elements.mean_motion_rev_day / XPDOTP;
    let ndot = elements.mean_motion_dot / (XPDOTP * MINUTES_PER_DAY);
    let nddot = elements.mean_motion_ddot / (XPDOTP * MINUTES_PER_DAY * MINUTES_PER_DAY);
    let bstar = elements.bstar;
    let inclo = elements.inclination_deg.to_radians();
    let nodeo = elements.raan_deg.to_radians();
    let argpo = elements.arg_perigee_deg.to_radians();
    let mo = elements.mean_anomaly_deg.to_radians();
    let ecco = elements.eccentricity;

    let year = elements.epoch_year_full();
    let (month, day, hour, minute, second) = days_to_mdhms(year, elements.epoch_day);
    let jdsatepoch = julian_date(year, month, day, hour, minute, second);
    // the deep-space theory dates everything from 1950
    let epoch = jdsatepoch - JULIAN_DAY_JAN_0_1950;

    let geo = init_geometry(&grav, ecco, inclo, no_kozai, epoch);
    let no_unkozai = geo.no_unkozai;

    let mut simple_drag = geo.rp < 220.0 / grav.radius_earth_km + 1.0;

    // atmospheric density profile anchor, lowered for low perigees
    let ss = 78.0 / grav.radius_earth_km + 1.0;
    let qzms2t = ((120.0 - 78.0) / grav.radius_earth_km).powi(4);
    let mut sfour = ss;
    let mut qzms24 = qzms2t;
    let perige = (geo.rp - 1.0) * grav.radius_earth_km;
    if perige < 156.0 {
        sfour = perige - 78.0;
        if perige < 98.0 {
            sfour = 20.0;
        }
        qzms24 = ((120.0 - sfour) / grav.radius_earth_km).powi(4);
        sfour = sfour / grav.radius_earth_km + 1.0;
    }

    let pinvsq = 1.0 / geo.posq;
    let tsi = 1.0 / (geo.ao - sfour);
    let eta = geo.ao * ecco * tsi;
    let etasq = eta * eta;
    let eeta = ecco * eta;
    let psisq = (1.0 - etasq).abs();
    let coef = qzms24 * tsi.powi(4);
    let coef1 = coef / psisq.powf(3.5);
    let cc2 = coef1
        * no_unkozai
        * (geo.ao * (1.0 + 1.5 * etasq + eeta * (4.0 + etasq))
            + 0.375 * grav.j2 * tsi / psisq * geo.con41 * (8.0 + 3.0 * etasq * (8.0 + etasq)));
    let cc1 = bstar * cc2;
    let mut cc3 = 0.0;
    if ecco > 1.0e-4 {
        cc3 = -2.0 * coef * tsi * grav.j3oj2 * no_unkozai * geo.sinio / ecco;
    }
    let x1mth2 = 1.0 - geo.cosio2;
    let cc4 = 2.0
        * no_unkozai
        * coef1
        * geo.ao
        * geo.omeosq
        * (eta * (2.0 + 0.5 * etasq) + ecco * (0.5 + 2.0 * etasq)
            - grav.j2 * tsi / (geo.ao * psisq)
                * (-3.0 * geo.con41 * (1.0 - 2.0 * eeta + etasq * (1.5 - 0.5 * eeta))
                    + 0.75 * x1mth2 * (2.0 * etasq - eeta * (1.0 + etasq)) * (2.0 * argpo).cos()));
    let cc5 = 2.0 * coef1 * geo.ao * geo.omeosq * (1.0 + 2.75 * (etasq + eeta) + eeta * etasq);

    let cosio4 = geo.cosio2 * geo.cosio2;
    let temp1 = 1.5 * grav.j2 * pinvsq * no_unkozai;
    let temp2 = 0.5 * temp1 * grav.j2 * pinvsq;
    let temp3 = -0.46875 * grav.j4 * pinvsq * pinvsq * no_unkozai;
    let mdot = no_unkozai
        + 0.5 * temp1 * geo.rteosq * geo.con41
        + 0.0625 * temp2 * geo.rteosq * (13.0 - 78.0 * geo.cosio2 + 137.0 * cosio4);
    let argpdot = -0.5 * temp1 * geo.con42
        + 0.0625 * temp2 * (7.0 - 114.0 * geo.cosio2 + 395.0 * cosio4)
        + temp3 * (3.0 - 36.0 * geo.cosio2 + 49.0 * cosio4);
    let xhdot1 = -temp1 * geo.cosio;
    let nodedot = xhdot1
        + (0.5 * temp2 * (4.0 - 19.0 * geo.cosio2) + 2.0 * temp3 * (3.0 - 7.0 * geo.cosio2))
            * geo.cosio;
    let xpidot = argpdot + nodedot;
    let omgcof = bstar * cc3 * argpo.cos();
    let xmcof = if ecco > 1.0e-4 {
        -X2O3 * coef * bstar / eeta
    } else {
        0.0
    };
    let nodecf = 3.5 * geo.omeosq * xhdot1 * cc1;
    let t2cof = 1.5 * cc1;
    let xlcof = if (geo.cosio + 1.0).abs() > TEMP4 {
        -0.25 * grav.j3oj2 * geo.sinio * (3.0 + 5.0 * geo.cosio) / (1.0 + geo.cosio)
    } else {
        -0.25 * grav.j3oj2 * geo.sinio * (3.0 + 5.0 * geo.cosio) / TEMP4
    };
    let aycof = -0.5 * grav.j3oj2 * geo.sinio;
    let delmotemp = 1.0 + eta * mo.cos();
    let delmo = delmotemp * delmotemp * delmotemp;
    let sinmao = mo.sin();
    let x7thm1 = 7.0 * geo.cosio2 - 1.0;

    let deep = if TWOPI / no_unkozai >= DEEP_SPACE_PERIOD_MIN {
        simple_drag = true;
        let (context, lunar_solar) = deepspace::common_terms(epoch, ecco, argpo, 0.0, inclo, nodeo, no_unkozai);
        let rates = deepspace::secular_init(
            &context,
            &ResonanceInputs {
                xke: grav.xke,
                argpo,
                gsto: geo.gsto,
                mo,
                mdot,
                no_unkozai,
                nodeo,
                nodedot,
                xpidot,
                ecco,
                eccsq: geo.eccsq,
                inclm: inclo,
            },
        );
        Some(DeepSpace {
            lunar_solar,
            dedt: rates.dedt,
            didt: rates.didt,
            dmdt: rates.dmdt,
            dnodt: rates.dnodt,
            domdt: rates.domdt,
            resonance: rates.resonance,
        })
    } else {
        None
    };

    let (mut d2, mut d3, mut d4) = (0.0, 0.0, 0.0);
    let (mut t3cof, mut t4cof, mut t5cof) = (0.0, 0.0, 0.0);
    if !simple_drag {
        let cc1sq = cc1 * cc1;
        d2 = 4.0 * geo.ao * tsi * cc1sq;
        let temp = d2 * tsi * cc1 / 3.0;
        d3 = (17.0 * geo.ao + sfour) * temp;
        d4 = 0.5 * temp * geo.ao * tsi * (221.0 * geo.ao + 31.0 * sfour) * cc1;
        t3cof = d2 + 2.0 * cc1sq;
        t4cof = 0.25 * (3.0 * d3 + cc1 * (12.0 * d2 + 10.0 * cc1sq));
        t5cof = 0.2 * (3.0 * d4 + 12.0 * cc1 * d3 + 6.0 * d2 * d2 + 15.0 * cc1sq * (2.0 * d2 + cc1sq));
    }

    SatelliteState {
        elements,
        model,
        gravity: grav,
        jdsatepoch,
        gsto: geo.gsto,
        bstar,
        ndot,
        nddot,
        ecco,
        argpo,
        inclo,
        mo,
        nodeo,
        no_kozai,
        no_unkozai,
        simple_drag,
        near: NearEarthCoefficients {
            aycof,
            con41: geo.con41,
            cc1,
            cc4,
            cc5,
            d2,
            d3,
            d4,
            delmo,
            eta,
            argpdot,
            omgcof,
            sinmao,
            t2cof,
            t3cof,
            t4cof,
            t5cof,
            x1mth2,
            x7thm1,
            mdot,
            nodedot,
            xlcof,
            xmcof,
            nodecf,
        },
        deep,
    }
}

impl SatelliteState {
    /// Decode a TLE and initialize it against a gravity model.
    pub fn from_tle(line1: &str, line2: &str, model: GravityModel) -> Result<Self, TleError> {
        let elements = tle::decode(line1, line2)?;
        Ok(initialize(elements, model))
    }

    /// True when the satellite takes the deep-space (SDP4) branch.
    pub fn is_deep_space(&self) -> bool {
        self.deep.is_some()
    }

    /// Propagate to `tsince` minutes past the element epoch.
    ///
    /// Returns the TEME position (km) and velocity (km/min).
    pub fn propagate(&self, tsince: f64) -> Result<(Vector3, Vector3), PropagationError> {
        let grav = &self.gravity;
        let near = &self.near;
        let vkmpermin = grav.radius_earth_km * grav.xke;
        let t = tsince;

        // secular gravity and atmospheric drag
        let xmdf = self.mo + near.mdot * t;
        let argpdf = self.argpo + near.argpdot * t;
        let nodedf = self.nodeo + near.nodedot * t;
        let mut argpm = argpdf;
        let mut mm = xmdf;
        let t2 = t * t;
        let mut nodem = nodedf + near.nodecf * t2;
        let mut tempa = 1.0 - near.cc1 * t;
        let mut tempe = self.bstar * near.cc4 * t;
        let mut templ = near.t2cof * t2;

        if !self.simple_drag {
            let delomg = near.omgcof * t;
            let delmtemp = 1.0 + near.eta * xmdf.cos();
            let delm = near.xmcof * (delmtemp * delmtemp * delmtemp - near.delmo);
            let temp = delomg + delm;
            mm = xmdf + temp;
            argpm = argpdf - temp;
            let t3 = t2 * t;
            let t4 = t3 * t;
            tempa -= near.d2 * t2 + near.d3 * t3 + near.d4 * t4;
            tempe += self.bstar * near.cc5 * (mm.sin() - near.sinmao);
            templ += near.t3cof * t3 + t4 * (near.t4cof + t * near.t5cof);
        }

        let mut nm = self.no_unkozai;
        let mut em = self.ecco;
        let mut inclm = self.inclo;

        if let Some(deep) = &self.deep {
            let update = deepspace::secular_update(
                deep,
                self.argpo,
                near.argpdot,
                self.no_unkozai,
                self.gsto,
                t,
                em,
                argpm,
                inclm,
                mm,
                nodem,
            );
            em = update.em;
            argpm = update.argpm;
            inclm = update.inclm;
            mm = update.mm;
            nodem = update.nodem;
            nm = update.nm;
        }

        if nm <= 0.0 {
            return Err(PropagationError::NegativeMeanMotion { nm });
        }

        let am = (grav.xke / nm).powf(X2O3) * tempa * tempa;
        nm = grav.xke / am.powf(1.5);
        em -= tempe;

        if em >= 1.0 || em < -0.001 {
            return Err(PropagationError::EccentricityOutOfRange { em });
        }
        if em < 1.0e-6 {
            em = 1.0e-6;
        }

        mm += self.no_unkozai * templ;
        let mut xlm = mm + argpm + nodem;

        nodem = if nodem >= 0.0 {
            nodem % TWOPI
        } else {
            -((-nodem) % TWOPI)
        };
        argpm %= TWOPI;
        xlm %= TWOPI;
        mm = (xlm - argpm - nodem) % TWOPI;

        let sinim = inclm.sin();
        let cosim = inclm.cos();

        // lunar-solar periodics (deep space only)
        let mut ep = em;
        let mut xincp = inclm;
        let mut argpp = argpm;
        let mut nodep = nodem;
        let mut mp = mm;
        let mut sinip = sinim;
        let mut cosip = cosim;
        let mut aycof = near.aycof;
        let mut xlcof = near.xlcof;
        let mut con41 = near.con41;
        let mut x1mth2 = near.x1mth2;
        let mut x7thm1 = near.x7thm1;

        if let Some(deep) = &self.deep {
            let (ep_out, xincp_out, nodep_out, argpp_out, mp_out) =
                deepspace::periodic_corrections(&deep.lunar_solar, t, ep, xincp, nodep, argpp, mp);
            ep = ep_out;
            xincp = xincp_out;
            nodep = nodep_out;
            argpp = argpp_out;
            mp = mp_out;

            if xincp < 0.0 {
                xincp = -xincp;
                nodep += std::f64::consts::PI;
                argpp -= std::f64::consts::PI;
            }
            if !(0.0..=1.0).contains(&ep) {
                return Err(PropagationError::PerturbedEccentricityOutOfRange { ep });
            }

            sinip = xincp.sin();
            cosip = xincp.cos();
            aycof = -0.5 * grav.j3oj2 * sinip;
            xlcof = if (cosip + 1.0).abs() > TEMP4 {
                -0.25 * grav.j3oj2 * sinip * (3.0 + 5.0 * cosip) / (1.0 + cosip)
            } else {
                -0.25 * grav.j3oj2 * sinip * (3.0 + 5.0 * cosip) / TEMP4
            };
            let cosisq = cosip * cosip;
            con41 = 3.0 * cosisq - 1.0;
            x1mth2 = 1.0 - cosisq;
            x7thm1 = 7.0 * cosisq - 1.0;
        }

        // long-period periodics
        let axnl = ep * argpp.cos();
        let temp = 1.0 / (am * (1.0 - ep * ep));
        let aynl = ep * argpp.sin() + temp * aycof;
        let xl = mp + argpp + nodep + temp * xlcof * axnl;

        // Kepler's equation by Newton-Raphson on the eccentric longitude,
        // corrections clamped to 0.95 rad
        let u = (xl - nodep) % TWOPI;
        let mut eo1 = u;
        let mut tem5 = 9999.9_f64;
        let mut ktr = 1;
        while tem5.abs() >= 1.0e-12 && ktr <= 10 {
            let sineo1 = eo1.sin();
            let coseo1 = eo1.cos();
            tem5 = 1.0 - coseo1 * axnl - sineo1 * aynl;
            tem5 = (u - aynl * coseo1 + axnl * sineo1 - eo1) / tem5;
            if tem5.abs() >= 0.95 {
                tem5 = if tem5 > 0.0 { 0.95 } else { -0.95 };
            }
            eo1 += tem5;
            ktr += 1;
        }
        if tem5.abs() >= 1.0e-12 {
            return Err(PropagationError::KeplerNotConverged { correction: tem5 });
        }

        // short-period periodics
        let sineo1 = eo1.sin();
        let coseo1 = eo1.cos();
        let ecose = axnl * coseo1 + aynl * sineo1;
        let esine = axnl * sineo1 - aynl * coseo1;
        let el2 = axnl * axnl + aynl * aynl;
        let pl = am * (1.0 - el2);
        if pl < 0.0 {
            return Err(PropagationError::NegativeSemilatusRectum { pl });
        }

        let rl = am * (1.0 - ecose);
        let rdotl = am.sqrt() * esine / rl;
        let rvdotl = pl.sqrt() / rl;
        let betal = (1.0 - el2).sqrt();
        let temp = esine / (1.0 + betal);
        let sinu = am / rl * (sineo1 - aynl - axnl * temp);
        let cosu = am / rl * (coseo1 - axnl + aynl * temp);
        let mut su = sinu.atan2(cosu);
        let sin2u = (cosu + cosu) * sinu;
        let cos2u = 1.0 - 2.0 * sinu * sinu;
        let temp = 1.0 / pl;
        let temp1 = 0.5 * grav.j2 * temp;
        let temp2 = temp1 * temp;

        let mrt = rl * (1.0 - 1.5 * temp2 * betal * con41) + 0.5 * temp1 * x1mth2 * cos2u;
        su -= 0.25 * temp2 * x7thm1 * sin2u;
        let xnode = nodep + 1.5 * temp2 * cosip * sin2u;
        let xinc = xincp + 1.5 * temp2 * cosip * sinip * cos2u;
        let mvt = rdotl - nm * temp1 * x1mth2 * sin2u / grav.xke;
        let rvdot = rvdotl + nm * temp1 * (x1mth2 * cos2u + 1.5 * con41) / grav.xke;

        // orientation vectors and the perifocal-to-inertial rotation
        let sinsu = su.sin();
        let cossu = su.cos();
        let snod = xnode.sin();
        let cnod = xnode.cos();
        let sini = xinc.sin();
        let cosi = xinc.cos();
        let xmx = -snod * cosi;
        let xmy = cnod * cosi;
        let ux = xmx * sinsu + cnod * cossu;
        let uy = xmy * sinsu + snod * cossu;
        let uz = sini * sinsu;
        let vx = xmx * cossu - cnod * sinsu;
        let vy = xmy * cossu - snod * sinsu;
        let vz = sini * cossu;

        if mrt < 1.0 {
            return Err(PropagationError::Decayed { mrt });
        }

        let mr = mrt * grav.radius_earth_km;
        let position = Vector3::new(mr * ux, mr * uy, mr * uz);
        let velocity = Vector3::new(
            (mvt * ux + rvdot * vx) * vkmpermin,
            (mvt * uy + rvdot * vy) * vkmpermin,
            (mvt * uz + rvdot * vz) * vkmpermin,
        );

        Ok((position, velocity))
    }

    /// Propagate to an absolute UTC timestamp.
    pub fn propagate_at(&self, at: &DateTime<Utc>) -> Result<(Vector3, Vector3), PropagationError> {
        let tsince = (julian_date_from_datetime(at) - self.jdsatepoch) * MINUTES_PER_DAY;
        self.propagate(tsince)
    }

    /// Sample an ephemeris at many offsets (minutes past epoch) in parallel.
    ///
    /// Results come back in input order; each entry fails independently.
    pub fn ephemeris(&self, minutes: &[f64]) -> Vec<Result<(Vector3, Vector3), PropagationError>> {
        minutes.par_iter().map(|&t| self.propagate(t)).collect()
    }
}

/// Propagate a whole set of satellites to the same offset in parallel.
///
/// Results come back in input order; each satellite fails independently.
pub fn propagate_all(
    satellites: &[SatelliteState],
    tsince: f64,
) -> Vec<Result<(Vector3, Vector3), PropagationError>> {
    satellites.par_iter().map(|sat| sat.propagate(tsince)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{eci_to_look_angles, Geodetic};
    use crate::time::theta_g_jd;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use chrono::TimeZone;

    const ISS_LINE1: &str = "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
    const ISS_LINE2: &str = "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

    const TITAN3C_LINE1: &str =
        "1 04632U 70093B   04031.91070959 -.00000084  00000-0  10000-3 0  9955";
    const TITAN3C_LINE2: &str =
        "2 04632  11.4628 273.1101 1450506 207.6000 143.9350  1.20231981 44145";

    // Molniya-class orbit, half-day resonance with e > 0.5
    const MOLNIYA_LINE1: &str =
        "1 08195U 75081A   06176.33215444  .00000099  00000-0  11873-3 0   813";
    const MOLNIYA_LINE2: &str =
        "2 08195  64.1586 279.0717 6877146 264.7651  20.2257  2.00491383225656";

    #[test]
    fn test_initialize_iss_wgs72() {
        let sat = SatelliteState::from_tle(ISS_LINE1, ISS_LINE2, GravityModel::Wgs72).unwrap();
        assert!(!sat.is_deep_space());
        assert!(!sat.simple_drag);
        // epoch 2008 day 264.51782528
        assert_relative_eq!(sat.jdsatepoch, 2_454_730.017_825_28, epsilon = 1e-6);
        // Kozai to Brouwer recovery changes the mean motion only slightly
        assert_relative_eq!(sat.no_kozai, 15.72125391 / XPDOTP, epsilon = 1e-12);
        assert_relative_eq!(sat.no_unkozai, sat.no_kozai, epsilon = 1e-4);
        assert!(sat.no_unkozai != sat.no_kozai);
    }

    #[test]
    fn test_propagate_iss_at_epoch() {
        let sat = SatelliteState::from_tle(ISS_LINE1, ISS_LINE2, GravityModel::Wgs72).unwrap();
        let (r, v) = sat.propagate(0.0).unwrap();

        // WGS72 epoch vector for this element set
        assert_abs_diff_eq!(r.x, 4083.910, epsilon = 0.1);
        assert_abs_diff_eq!(r.y, -993.637, epsilon = 0.1);
        assert_abs_diff_eq!(r.z, 5243.615, epsilon = 0.1);

        // velocity in km/min
        assert_abs_diff_eq!(v.x, 2.5128 * 60.0, epsilon = 0.1);
        assert_abs_diff_eq!(v.y, 7.2599 * 60.0, epsilon = 0.1);
        assert_abs_diff_eq!(v.z, -0.5838 * 60.0, epsilon = 0.1);
    }

    #[test]
    fn test_propagate_iss_over_one_orbit() {
        let sat = SatelliteState::from_tle(ISS_LINE1, ISS_LINE2, GravityModel::Wgs72).unwrap();
        let period = sat.elements.period_minutes();
        let (r0, _) = sat.propagate(0.0).unwrap();
        let (r1, _) = sat.propagate(period).unwrap();
        // one revolution later the satellite is near where it started;
        // node precession and drag leave a small offset
        assert!((r1 - r0).magnitude() < 150.0, "drift {}", (r1 - r0).magnitude());
        // and always above the surface by at least perigee height
        for t in [10.0, 37.5, 61.0, 90.0] {
            let (r, _) = sat.propagate(t).unwrap();
            assert!(r.magnitude() > 6650.0);
        }
    }

    #[test]
    fn test_propagation_is_pure() {
        let sat = SatelliteState::from_tle(ISS_LINE1, ISS_LINE2, GravityModel::Wgs72).unwrap();
        let first = sat.propagate(47.0).unwrap();
        sat.propagate(1440.0).unwrap();
        sat.propagate(-30.0).unwrap();
        let again = sat.propagate(47.0).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn test_deep_space_titan3c() {
        let sat =
            SatelliteState::from_tle(TITAN3C_LINE1, TITAN3C_LINE2, GravityModel::Wgs72).unwrap();
        assert!(sat.is_deep_space());
        assert!(sat.simple_drag);

        for t in [0.0, 360.0, 1440.0, 2880.0] {
            let (r, v) = sat.propagate(t).unwrap();
            assert!(r.magnitude() > sat.gravity.radius_earth_km, "t={t}");
            assert!(r.magnitude() < 60_000.0, "t={t}");
            assert!(v.magnitude().is_finite());
        }
    }

    #[test]
    fn test_deep_space_molniya_resonance() {
        let sat =
            SatelliteState::from_tle(MOLNIYA_LINE1, MOLNIYA_LINE2, GravityModel::Wgs72).unwrap();
        assert!(sat.is_deep_space());
        assert!(matches!(
            sat.deep.as_ref().unwrap().resonance,
            crate::deepspace::Resonance::HalfDay { .. }
        ));

        // past the first resonance integration step in both directions
        for t in [0.0, 120.0, 800.0, -800.0] {
            let (r, _) = sat.propagate(t).unwrap();
            assert!(r.magnitude() > sat.gravity.radius_earth_km, "t={t}");
        }
    }

    #[test]
    fn test_look_angles_golden() {
        let sat = SatelliteState::from_tle(
            "1 25544U 98067A   20140.34419374 -.00000374  00000-0  13653-5 0  9990",
            "2 25544  51.6433 131.2277 0001338 330.3524 173.1622 15.49372617227549",
            GravityModel::Wgs72,
        )
        .unwrap();

        let at = Utc.with_ymd_and_hms(2020, 5, 23, 20, 23, 37).unwrap();
        let (position, _) = sat.propagate_at(&at).unwrap();

        let observer = Geodetic::new(
            55.6167_f64.to_radians(),
            12.6500_f64.to_radians(),
            0.005,
        );
        let jday = julian_date_from_datetime(&at);
        let look = eci_to_look_angles(&position, &observer, jday, &sat.gravity);

        assert_abs_diff_eq!(look.azimuth.to_degrees(), 181.2902281625632, epsilon = 1e-4);
        assert_abs_diff_eq!(look.elevation.to_degrees(), 42.06164214709452, epsilon = 1e-4);
    }

    #[test]
    fn test_ground_track_over_denmark() {
        // Cross-check the golden pass geometrically: at peak elevation the
        // subsatellite point is close to the observer.
        let sat = SatelliteState::from_tle(
            "1 25544U 98067A   20140.34419374 -.00000374  00000-0  13653-5 0  9990",
            "2 25544  51.6433 131.2277 0001338 330.3524 173.1622 15.49372617227549",
            GravityModel::Wgs72,
        )
        .unwrap();
        let at = Utc.with_ymd_and_hms(2020, 5, 23, 20, 23, 37).unwrap();
        let (position, _) = sat.propagate_at(&at).unwrap();
        let jday = julian_date_from_datetime(&at);
        let (_, geo) = crate::coords::eci_to_geodetic(&position, theta_g_jd(jday));
        let deg = geo.to_degrees().unwrap();

        assert_abs_diff_eq!(deg.latitude, 55.6167, epsilon = 10.0);
        assert!(geo.altitude > 300.0 && geo.altitude < 500.0);
    }

    #[test]
    fn test_ephemeris_matches_serial() {
        let sat = SatelliteState::from_tle(ISS_LINE1, ISS_LINE2, GravityModel::Wgs72).unwrap();
        let minutes: Vec<f64> = (0..32).map(|i| f64::from(i) * 45.0).collect();
        let batch = sat.ephemeris(&minutes);
        assert_eq!(batch.len(), minutes.len());
        for (t, result) in minutes.iter().zip(&batch) {
            assert_eq!(result.clone().unwrap(), sat.propagate(*t).unwrap());
        }
    }

    #[test]
    fn test_propagate_all_fails_independently() {
        let good = SatelliteState::from_tle(ISS_LINE1, ISS_LINE2, GravityModel::Wgs72).unwrap();
        let deep =
            SatelliteState::from_tle(TITAN3C_LINE1, TITAN3C_LINE2, GravityModel::Wgs72).unwrap();
        let results = propagate_all(&[good.clone(), deep], 30.0);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].clone().unwrap(), good.propagate(30.0).unwrap());
        assert!(results[1].is_ok());
    }

    #[test]
    fn test_from_tle_rejects_bad_line() {
        let err = SatelliteState::from_tle("1 25544U", ISS_LINE2, GravityModel::Wgs72);
        assert!(err.is_err());
    }

    #[test]
    fn test_gravity_model_changes_output() {
        let a = SatelliteState::from_tle(ISS_LINE1, ISS_LINE2, GravityModel::Wgs72).unwrap();
        let b = SatelliteState::from_tle(ISS_LINE1, ISS_LINE2, GravityModel::Wgs84).unwrap();
        let (ra, _) = a.propagate(60.0).unwrap();
        let (rb, _) = b.propagate(60.0).unwrap();
        let diff = (ra - rb).magnitude();
        assert!(diff > 0.0 && diff < 50.0, "diff {diff}");
    }

    #[test]
    fn test_error_display() {
        let err = PropagationError::Decayed { mrt: 0.9 };
        assert_eq!(err.to_string(), "satellite has decayed (radius 0.9 earth radii)");
        let err = PropagationError::EccentricityOutOfRange { em: 1.5 };
        assert!(err.to_string().contains("1.5"));
    }
}

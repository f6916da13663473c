//! Deep-space perturbation terms for long-period orbits.
//!
//! Orbits with a period of 225 minutes or more pick up lunar and solar
//! gravitational effects that the near-earth theory ignores. The
//! initializer derives three groups of coefficients here:
//!
//! - [`LunarSolar`]: long-period periodic terms applied to the mean
//!   elements on every propagation call,
//! - secular drift rates (de/dt, di/dt, dm/dt, dΩ/dt, dω/dt) from the
//!   third-body averaged potential,
//! - [`Resonance`]: geopotential resonance terms for 1-day (geosynchronous)
//!   and half-day (Molniya-class) orbits, integrated numerically in fixed
//!   720-minute steps at propagation time.
//!
//! The math follows the standard Vallado SDP4 formulation; constants and
//! branch thresholds are reproduced exactly.

use crate::constants::TWOPI;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

// Solar and lunar mean-motion and eccentricity parameters.
const ZNS: f64 = 1.19459e-5;
const ZES: f64 = 0.01675;
const ZNL: f64 = 1.5835218e-4;
const ZEL: f64 = 0.05490;

/// Earth rotation rate (rad/min) used by the resonance geometry.
const RPTIM: f64 = 4.375_269_088_011_299_66e-3;

/// Long-period lunar/solar periodic coefficients, fixed at initialization.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LunarSolar {
    pub e3: f64,
    pub ee2: f64,
    pub peo: f64,
    pub pgho: f64,
    pub pho: f64,
    pub pinco: f64,
    pub plo: f64,
    pub se2: f64,
    pub se3: f64,
    pub sgh2: f64,
    pub sgh3: f64,
    pub sgh4: f64,
    pub sh2: f64,
    pub sh3: f64,
    pub si2: f64,
    pub si3: f64,
    pub sl2: f64,
    pub sl3: f64,
    pub sl4: f64,
    pub xgh2: f64,
    pub xgh3: f64,
    pub xgh4: f64,
    pub xh2: f64,
    pub xh3: f64,
    pub xi2: f64,
    pub xi3: f64,
    pub xl2: f64,
    pub xl3: f64,
    pub xl4: f64,
    pub zmol: f64,
    pub zmos: f64,
}

/// Geopotential resonance regime, selected once from the mean motion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Resonance {
    /// No commensurability with Earth rotation.
    None,
    /// One-day period resonance (geosynchronous band).
    OneDay {
        del1: f64,
        del2: f64,
        del3: f64,
        xlamo: f64,
        xfact: f64,
    },
    /// Half-day period resonance (12-hour eccentric band).
    HalfDay {
        d2201: f64,
        d2211: f64,
        d3210: f64,
        d3222: f64,
        d4410: f64,
        d4422: f64,
        d5220: f64,
        d5232: f64,
        d5421: f64,
        d5433: f64,
        xlamo: f64,
        xfact: f64,
    },
}

/// All deep-space coefficients carried by an initialized satellite state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeepSpace {
    pub lunar_solar: LunarSolar,
    /// Secular third-body rates (per minute).
    pub dedt: f64,
    pub didt: f64,
    pub dmdt: f64,
    pub dnodt: f64,
    pub domdt: f64,
    pub resonance: Resonance,
}

/// Intermediate geometry shared between the common-term derivation and
/// the resonance initializer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DeepSpaceContext {
    pub sinim: f64,
    pub cosim: f64,
    pub emsq: f64,
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
    pub s4: f64,
    pub s5: f64,
    pub ss1: f64,
    pub ss2: f64,
    pub ss3: f64,
    pub ss4: f64,
    pub ss5: f64,
    pub sz1: f64,
    pub sz3: f64,
    pub sz11: f64,
    pub sz13: f64,
    pub sz21: f64,
    pub sz23: f64,
    pub sz31: f64,
    pub sz33: f64,
    pub z1: f64,
    pub z3: f64,
    pub z11: f64,
    pub z13: f64,
    pub z21: f64,
    pub z23: f64,
    pub z31: f64,
    pub z33: f64,
    pub nm: f64,
    pub em: f64,
}

/// Common lunar/solar geometry at epoch (Vallado's `dscom`).
///
/// `epoch` is days since 1950-01-00, `tc` minutes past it (zero at init).
pub(crate) fn common_terms(
    epoch: f64,
    ep: f64,
    argpp: f64,
    tc: f64,
    inclp: f64,
    nodep: f64,
    np: f64,
) -> (DeepSpaceContext, LunarSolar) {
    const C1SS: f64 = 2.9864797e-6;
    const C1L: f64 = 4.7968065e-7;
    const ZSINIS: f64 = 0.39785416;
    const ZCOSIS: f64 = 0.91744867;
    const ZCOSGS: f64 = 0.1945905;
    const ZSINGS: f64 = -0.98088458;

    let nm = np;
    let em = ep;
    let snodm = nodep.sin();
    let cnodm = nodep.cos();
    let sinomm = argpp.sin();
    let cosomm = argpp.cos();
    let sinim = inclp.sin();
    let cosim = inclp.cos();
    let emsq = em * em;
    let betasq = 1.0 - emsq;
    let rtemsq = betasq.sqrt();

    let day = epoch + 18_261.5 + tc / 1440.0;
    let xnodce = (4.5236020 - 9.2422029e-4 * day) % TWOPI;
    let stem = xnodce.sin();
    let ctem = xnodce.cos();
    let zcosil = 0.91375164 - 0.03568096 * ctem;
    let zsinil = (1.0 - zcosil * zcosil).sqrt();
    let zsinhl = 0.089683511 * stem / zsinil;
    let zcoshl = (1.0 - zsinhl * zsinhl).sqrt();
    let gam = 5.8351514 + 0.0019443680 * day;
    let mut zx = 0.39785416 * stem / zsinil;
    let zy = zcoshl * ctem + 0.91744867 * zsinhl * stem;
    zx = zx.atan2(zy);
    zx = gam + zx - xnodce;
    let zcosgl = zx.cos();
    let zsingl = zx.sin();

    let mut zcosg = ZCOSGS;
    let mut zsing = ZSINGS;
    let mut zcosi = ZCOSIS;
    let mut zsini = ZSINIS;
    let mut zcosh = cnodm;
    let mut zsinh = snodm;
    let mut cc = C1SS;
    let xnoi = 1.0 / nm;

    let (mut s1, mut s2, mut s3, mut s4, mut s5, mut s6, mut s7) =
        (0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    let (mut ss1, mut ss2, mut ss3, mut ss4, mut ss5, mut ss6, mut ss7) =
        (0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    let (mut sz1, mut sz2, mut sz3) = (0.0, 0.0, 0.0);
    let (mut sz11, mut sz12, mut sz13) = (0.0, 0.0, 0.0);
    let (mut sz21, mut sz22, mut sz23) = (0.0, 0.0, 0.0);
    let (mut sz31, mut sz32, mut sz33) = (0.0, 0.0, 0.0);
    let (mut z1, mut z2, mut z3) = (0.0, 0.0, 0.0);
    let (mut z11, mut z12, mut z13) = (0.0, 0.0, 0.0);
    let (mut z21, mut z22, mut z23) = (0.0, 0.0, 0.0);
    let (mut z31, mut z32, mut z33) = (0.0, 0.0, 0.0);

    // First pass accumulates the solar terms, second pass the lunar ones.
    for pass in 1..=2 {
        let a1 = zcosg * zcosh + zsing * zcosi * zsinh;
        let a3 = -zsing * zcosh + zcosg * zcosi * zsinh;
        let a7 = -zcosg * zsinh + zsing * zcosi * zcosh;
        let a8 = zsing * zsini;
        let a9 = zsing * zsinh + zcosg * zcosi * zcosh;
        let a10 = zcosg * zsini;
        let a2 = cosim * a7 + sinim * a8;
        let a4 = cosim * a9 + sinim * a10;
        let a5 = -sinim * a7 + cosim * a8;
        let a6 = -sinim * a9 + cosim * a10;

        let x1 = a1 * cosomm + a2 * sinomm;
        let x2 = a3 * cosomm + a4 * sinomm;
        let x3 = -a1 * sinomm + a2 * cosomm;
        let x4 = -a3 * sinomm + a4 * cosomm;
        let x5 = a5 * sinomm;
        let x6 = a6 * sinomm;
        let x7 = a5 * cosomm;
        let x8 = a6 * cosomm;

        z31 = 12.0 * x1 * x1 - 3.0 * x3 * x3;
        z32 = 24.0 * x1 * x2 - 6.0 * x3 * x4;
        z33 = 12.0 * x2 * x2 - 3.0 * x4 * x4;
        z1 = 3.0 * (a1 * a1 + a2 * a2) + z31 * emsq;
        z2 = 6.0 * (a1 * a3 + a2 * a4) + z32 * emsq;
        z3 = 3.0 * (a3 * a3 + a4 * a4) + z33 * emsq;
        z11 = -6.0 * a1 * a5 + emsq * (-24.0 * x1 * x7 - 6.0 * x3 * x5);
        z12 = -6.0 * (a1 * a6 + a3 * a5)
            + emsq * (-24.0 * (x2 * x7 + x1 * x8) - 6.0 * (x3 * x6 + x4 * x5));
        z13 = -6.0 * a3 * a6 + emsq * (-24.0 * x2 * x8 - 6.0 * x4 * x6);
        z21 = 6.0 * a2 * a5 + emsq * (24.0 * x1 * x5 - 6.0 * x3 * x7);
        z22 = 6.0 * (a4 * a5 + a2 * a6)
            + emsq * (24.0 * (x2 * x5 + x1 * x6) - 6.0 * (x4 * x7 + x3 * x8));
        z23 = 6.0 * a4 * a6 + emsq * (24.0 * x2 * x6 - 6.0 * x4 * x8);
        z1 = z1 + z1 + betasq * z31;
        z2 = z2 + z2 + betasq * z32;
        z3 = z3 + z3 + betasq * z33;
        s3 = cc * xnoi;
        s2 = -0.5 * s3 / rtemsq;
        s4 = s3 * rtemsq;
        s1 = -15.0 * em * s4;
        s5 = x1 * x3 + x2 * x4;
        s6 = x2 * x3 + x1 * x4;
        s7 = x2 * x4 - x1 * x3;

        if pass == 1 {
            ss1 = s1;
            ss2 = s2;
            ss3 = s3;
            ss4 = s4;
            ss5 = s5;
            ss6 = s6;
            ss7 = s7;
            sz1 = z1;
            sz2 = z2;
            sz3 = z3;
            sz11 = z11;
            sz12 = z12;
            sz13 = z13;
            sz21 = z21;
            sz22 = z22;
            sz23 = z23;
            sz31 = z31;
            sz32 = z32;
            sz33 = z33;
            zcosg = zcosgl;
            zsing = zsingl;
            zcosi = zcosil;
            zsini = zsinil;
            zcosh = zcoshl * cnodm + zsinhl * snodm;
            zsinh = snodm * zcoshl - cnodm * zsinhl;
            cc = C1L;
        }
    }

    let lunar_solar = LunarSolar {
        zmol: (4.7199672 + 0.22997150 * day - gam) % TWOPI,
        zmos: (6.2565837 + 0.017201977 * day) % TWOPI,
        // solar periodics
        se2: 2.0 * ss1 * ss6,
        se3: 2.0 * ss1 * ss7,
        si2: 2.0 * ss2 * sz12,
        si3: 2.0 * ss2 * (sz13 - sz11),
        sl2: -2.0 * ss3 * sz2,
        sl3: -2.0 * ss3 * (sz3 - sz1),
        sl4: -2.0 * ss3 * (-21.0 - 9.0 * emsq) * ZES,
        sgh2: 2.0 * ss4 * sz32,
        sgh3: 2.0 * ss4 * (sz33 - sz31),
        sgh4: -18.0 * ss4 * ZES,
        sh2: -2.0 * ss2 * sz22,
        sh3: -2.0 * ss2 * (sz23 - sz21),
        // lunar periodics
        ee2: 2.0 * s1 * s6,
        e3: 2.0 * s1 * s7,
        xi2: 2.0 * s2 * z12,
        xi3: 2.0 * s2 * (z13 - z11),
        xl2: -2.0 * s3 * z2,
        xl3: -2.0 * s3 * (z3 - z1),
        xl4: -2.0 * s3 * (-21.0 - 9.0 * emsq) * ZEL,
        xgh2: 2.0 * s4 * z32,
        xgh3: 2.0 * s4 * (z33 - z31),
        xgh4: -18.0 * s4 * ZEL,
        xh2: -2.0 * s2 * z22,
        xh3: -2.0 * s2 * (z23 - z21),
        peo: 0.0,
        pinco: 0.0,
        plo: 0.0,
        pgho: 0.0,
        pho: 0.0,
    };

    let context = DeepSpaceContext {
        sinim,
        cosim,
        emsq,
        s1,
        s2,
        s3,
        s4,
        s5,
        ss1,
        ss2,
        ss3,
        ss4,
        ss5,
        sz1,
        sz3,
        sz11,
        sz13,
        sz21,
        sz23,
        sz31,
        sz33,
        z1,
        z3,
        z11,
        z13,
        z21,
        z23,
        z31,
        z33,
        nm,
        em,
    };

    (context, lunar_solar)
}

/// Inputs the resonance initializer needs from the near-earth secular
/// derivation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResonanceInputs {
    pub xke: f64,
    pub argpo: f64,
    pub gsto: f64,
    pub mo: f64,
    pub mdot: f64,
    pub no_unkozai: f64,
    pub nodeo: f64,
    pub nodedot: f64,
    pub xpidot: f64,
    pub ecco: f64,
    pub eccsq: f64,
    pub inclm: f64,
}

/// Derive the secular third-body rates and resonance coefficients
/// (Vallado's `dsinit`, evaluated at epoch).
pub(crate) fn secular_init(ctx: &DeepSpaceContext, inp: &ResonanceInputs) -> DeepSpaceRates {
    const Q22: f64 = 1.7891679e-6;
    const Q31: f64 = 2.1460748e-6;
    const Q33: f64 = 2.2123015e-7;
    const ROOT22: f64 = 1.7891679e-6;
    const ROOT44: f64 = 7.3636953e-9;
    const ROOT54: f64 = 2.1765803e-9;
    const ROOT32: f64 = 3.7393792e-7;
    const ROOT52: f64 = 1.1428639e-7;
    const X2O3: f64 = 2.0 / 3.0;

    let nm = ctx.nm;
    let em = ctx.em;
    let (sinim, cosim, emsq) = (ctx.sinim, ctx.cosim, ctx.emsq);
    let inclm = inp.inclm;

    // 1-day resonance: mean motion between 0.0034906585 and 0.0052359877
    // rad/min; half-day: 8.26e-3..9.24e-3 rad/min with e >= 0.5.
    let one_day = nm > 0.0034906585 && nm < 0.0052359877;
    let half_day = (8.26e-3..=9.24e-3).contains(&nm) && em >= 0.5;

    let ses = ctx.ss1 * ZNS * ctx.ss5;
    let sis = ctx.ss2 * ZNS * (ctx.sz11 + ctx.sz13);
    let sls = -ZNS * ctx.ss3 * (ctx.sz1 + ctx.sz3 - 14.0 - 6.0 * emsq);
    let sghs = ctx.ss4 * ZNS * (ctx.sz31 + ctx.sz33 - 6.0);
    let mut shs = -ZNS * ctx.ss2 * (ctx.sz21 + ctx.sz23);
    // near-equatorial and near-retrograde-equatorial inclinations have no
    // well-defined node; zero the node rate there
    if inclm < 5.2359877e-2 || inclm > PI - 5.2359877e-2 {
        shs = 0.0;
    }
    if sinim != 0.0 {
        shs /= sinim;
    }
    let sgs = sghs - cosim * shs;

    let dedt = ses + ctx.s1 * ZNL * ctx.s5;
    let didt = sis + ctx.s2 * ZNL * (ctx.z11 + ctx.z13);
    let dmdt = sls - ZNL * ctx.s3 * (ctx.z1 + ctx.z3 - 14.0 - 6.0 * emsq);
    let sghl = ctx.s4 * ZNL * (ctx.z31 + ctx.z33 - 6.0);
    let mut shll = -ZNL * ctx.s2 * (ctx.z21 + ctx.z23);
    if inclm < 5.2359877e-2 || inclm > PI - 5.2359877e-2 {
        shll = 0.0;
    }
    let mut domdt = sgs + sghl;
    let mut dnodt = shs;
    if sinim != 0.0 {
        domdt -= cosim / sinim * shll;
        dnodt += shll / sinim;
    }

    let theta = inp.gsto % TWOPI;

    let resonance = if half_day {
        let aonv = (nm / inp.xke).powf(X2O3);
        let cosisq = cosim * cosim;
        // resonance coefficients are evaluated at the unperturbed TLE
        // eccentricity, not the lunar-solar adjusted one
        let em_r = inp.ecco;
        let emsq_r = inp.eccsq;
        let eoc = em_r * emsq_r;
        let g201 = -0.306 - (em_r - 0.64) * 0.440;

        let (g211, g310, g322, g410, g422, g520);
        if em_r <= 0.65 {
            g211 = 3.616 - 13.2470 * em_r + 16.2900 * emsq_r;
            g310 = -19.302 + 117.3900 * em_r - 228.4190 * emsq_r + 156.5910 * eoc;
            g322 = -18.9068 + 109.7927 * em_r - 214.6334 * emsq_r + 146.5816 * eoc;
            g410 = -41.122 + 242.6940 * em_r - 471.0940 * emsq_r + 313.9530 * eoc;
            g422 = -146.407 + 841.8800 * em_r - 1629.014 * emsq_r + 1083.4350 * eoc;
            g520 = -532.114 + 3017.977 * em_r - 5740.032 * emsq_r + 3708.2760 * eoc;
        } else {
            g211 = -72.099 + 331.819 * em_r - 508.738 * emsq_r + 266.724 * eoc;
            g310 = -346.844 + 1582.851 * em_r - 2415.925 * emsq_r + 1246.113 * eoc;
            g322 = -342.585 + 1554.908 * em_r - 2366.899 * emsq_r + 1215.972 * eoc;
            g410 = -1052.797 + 4758.686 * em_r - 7193.992 * emsq_r + 3651.957 * eoc;
            g422 = -3581.690 + 16178.110 * em_r - 24462.770 * emsq_r + 12422.520 * eoc;
            g520 = if em_r > 0.715 {
                -5149.66 + 29936.92 * em_r - 54087.36 * emsq_r + 31324.56 * eoc
            } else {
                1464.74 - 4664.75 * em_r + 3763.64 * emsq_r
            };
        }

        let (g533, g521, g532);
        if em_r < 0.7 {
            g533 = -919.22770 + 4988.61 * em_r - 9064.77 * emsq_r + 5542.21 * eoc;
            g521 = -822.71072 + 4568.6173 * em_r - 8491.4146 * emsq_r + 5337.524 * eoc;
            g532 = -853.66600 + 4690.25 * em_r - 8624.77 * emsq_r + 5341.4 * eoc;
        } else {
            g533 = -37995.78 + 161616.52 * em_r - 229838.2 * emsq_r + 109377.94 * eoc;
            g521 = -51752.104 + 218913.95 * em_r - 309468.16 * emsq_r + 146349.42 * eoc;
            g532 = -40023.88 + 170470.89 * em_r - 242699.48 * emsq_r + 115605.82 * eoc;
        }

        let sini2 = sinim * sinim;
        let f220 = 0.75 * (1.0 + 2.0 * cosim + cosisq);
        let f221 = 1.5 * sini2;
        let f321 = 1.875 * sinim * (1.0 - 2.0 * cosim - 3.0 * cosisq);
        let f322 = -1.875 * sinim * (1.0 + 2.0 * cosim - 3.0 * cosisq);
        let f441 = 35.0 * sini2 * f220;
        let f442 = 39.375 * sini2 * sini2;
        let f522 = 9.84375
            * sinim
            * (sini2 * (1.0 - 2.0 * cosim - 5.0 * cosisq)
                + 1.0 / 3.0 * (-2.0 + 4.0 * cosim + 6.0 * cosisq));
        let f523 = sinim
            * (4.92187512 * sini2 * (-2.0 - 4.0 * cosim + 10.0 * cosisq)
                + 6.56250012 * (1.0 + 2.0 * cosim - 3.0 * cosisq));
        let f542 = 29.53125
            * sinim
            * (2.0 - 8.0 * cosim + cosisq * (-12.0 + 8.0 * cosim + 10.0 * cosisq));
        let f543 = 29.53125
            * sinim
            * (-2.0 - 8.0 * cosim + cosisq * (12.0 + 8.0 * cosim - 10.0 * cosisq));

        let xno2 = nm * nm;
        let ainv2 = aonv * aonv;
        let mut temp1 = 3.0 * xno2 * ainv2;
        let mut temp = temp1 * ROOT22;
        let d2201 = temp * f220 * g201;
        let d2211 = temp * f221 * g211;
        temp1 *= aonv;
        temp = temp1 * ROOT32;
        let d3210 = temp * f321 * g310;
        let d3222 = temp * f322 * g322;
        temp1 *= aonv;
        temp = 2.0 * temp1 * ROOT44;
        let d4410 = temp * f441 * g410;
        let d4422 = temp * f442 * g422;
        temp1 *= aonv;
        temp = temp1 * ROOT52;
        let d5220 = temp * f522 * g520;
        let d5232 = temp * f523 * g532;
        temp = 2.0 * temp1 * ROOT54;
        let d5421 = temp * f542 * g521;
        let d5433 = temp * f543 * g533;

        Resonance::HalfDay {
            d2201,
            d2211,
            d3210,
            d3222,
            d4410,
            d4422,
            d5220,
            d5232,
            d5421,
            d5433,
            xlamo: (inp.mo + inp.nodeo + inp.nodeo - theta - theta) % TWOPI,
            xfact: inp.mdot + dmdt + 2.0 * (inp.nodedot + dnodt - RPTIM) - inp.no_unkozai,
        }
    } else if one_day {
        let aonv = (nm / inp.xke).powf(X2O3);
        let g200 = 1.0 + emsq * (-2.5 + 0.8125 * emsq);
        let g310 = 1.0 + 2.0 * emsq;
        let g300 = 1.0 + emsq * (-6.0 + 6.60937 * emsq);
        let f220 = 0.75 * (1.0 + cosim) * (1.0 + cosim);
        let f311 = 0.9375 * sinim * sinim * (1.0 + 3.0 * cosim) - 0.75 * (1.0 + cosim);
        let mut f330 = 1.0 + cosim;
        f330 = 1.875 * f330 * f330 * f330;
        let del1_base = 3.0 * nm * nm * aonv * aonv;
        let del2 = 2.0 * del1_base * f220 * g200 * Q22;
        let del3 = 3.0 * del1_base * f330 * g300 * Q33 * aonv;
        let del1 = del1_base * f311 * g310 * Q31 * aonv;

        Resonance::OneDay {
            del1,
            del2,
            del3,
            xlamo: (inp.mo + inp.nodeo + inp.argpo - theta) % TWOPI,
            xfact: inp.mdot + inp.xpidot - RPTIM + dmdt + domdt + dnodt - inp.no_unkozai,
        }
    } else {
        Resonance::None
    };

    DeepSpaceRates {
        dedt,
        didt,
        dmdt,
        dnodt,
        domdt,
        resonance,
    }
}

/// Output of [`secular_init`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct DeepSpaceRates {
    pub dedt: f64,
    pub didt: f64,
    pub dmdt: f64,
    pub dnodt: f64,
    pub domdt: f64,
    pub resonance: Resonance,
}

/// Mean elements after deep-space secular drift and resonance effects
/// over `t` minutes (Vallado's `dspace`).
#[derive(Debug, Clone, Copy)]
pub(crate) struct SecularUpdate {
    pub em: f64,
    pub argpm: f64,
    pub inclm: f64,
    pub mm: f64,
    pub nodem: f64,
    pub nm: f64,
}

/// Apply the deep-space secular rates and, in a resonance regime,
/// numerically integrate the resonance equations from epoch to `t`.
///
/// The integration uses fixed 720-minute Euler-Maclaurin steps, restarted
/// from epoch on every call so the satellite state stays immutable; the
/// step size and restart behavior are part of the reproducibility contract.
#[allow(clippy::too_many_arguments)]
pub(crate) fn secular_update(
    deep: &DeepSpace,
    argpo: f64,
    argpdot: f64,
    no_unkozai: f64,
    gsto: f64,
    t: f64,
    em0: f64,
    argpm0: f64,
    inclm0: f64,
    mm0: f64,
    nodem0: f64,
) -> SecularUpdate {
    const FASX2: f64 = 0.13130908;
    const FASX4: f64 = 2.8843198;
    const FASX6: f64 = 0.37448087;
    const G22: f64 = 5.7686396;
    const G32: f64 = 0.95240898;
    const G44: f64 = 1.8014998;
    const G52: f64 = 1.0508330;
    const G54: f64 = 4.4108898;
    const STEP: f64 = 720.0;
    const STEP2: f64 = 259_200.0;

    let theta = (gsto + t * RPTIM) % TWOPI;
    let em = em0 + deep.dedt * t;
    let inclm = inclm0 + deep.didt * t;
    let argpm = argpm0 + deep.domdt * t;
    let nodem = nodem0 + deep.dnodt * t;
    let mut mm = mm0 + deep.dmdt * t;

    let mut nm = no_unkozai;

    if let Resonance::None = deep.resonance {
        return SecularUpdate {
            em,
            argpm,
            inclm,
            mm,
            nodem,
            nm,
        };
    }

    // Fresh integration from epoch every call.
    let xlamo = match deep.resonance {
        Resonance::OneDay { xlamo, .. } | Resonance::HalfDay { xlamo, .. } => xlamo,
        Resonance::None => unreachable!(),
    };
    let xfact = match deep.resonance {
        Resonance::OneDay { xfact, .. } | Resonance::HalfDay { xfact, .. } => xfact,
        Resonance::None => unreachable!(),
    };

    let mut atime = 0.0;
    let mut xli = xlamo;
    let mut xni = no_unkozai;
    let delt = if t > 0.0 { STEP } else { -STEP };

    let (ft, xndt, xldot, xnddt) = loop {
        let (xndt, xldot, xnddt) = match deep.resonance {
            Resonance::OneDay {
                del1, del2, del3, ..
            } => {
                let xndt = del1 * (xli - FASX2).sin()
                    + del2 * (2.0 * (xli - FASX4)).sin()
                    + del3 * (3.0 * (xli - FASX6)).sin();
                let xldot = xni + xfact;
                let xnddt = (del1 * (xli - FASX2).cos()
                    + 2.0 * del2 * (2.0 * (xli - FASX4)).cos()
                    + 3.0 * del3 * (3.0 * (xli - FASX6)).cos())
                    * xldot;
                (xndt, xldot, xnddt)
            }
            Resonance::HalfDay {
                d2201,
                d2211,
                d3210,
                d3222,
                d4410,
                d4422,
                d5220,
                d5232,
                d5421,
                d5433,
                ..
            } => {
                let xomi = argpo + argpdot * atime;
                let x2omi = xomi + xomi;
                let x2li = xli + xli;
                let xndt = d2201 * (x2omi + xli - G22).sin()
                    + d2211 * (xli - G22).sin()
                    + d3210 * (xomi + xli - G32).sin()
                    + d3222 * (-xomi + xli - G32).sin()
                    + d4410 * (x2omi + x2li - G44).sin()
                    + d4422 * (x2li - G44).sin()
                    + d5220 * (xomi + xli - G52).sin()
                    + d5232 * (-xomi + xli - G52).sin()
                    + d5421 * (xomi + x2li - G54).sin()
                    + d5433 * (-xomi + x2li - G54).sin();
                let xldot = xni + xfact;
                let xnddt = (d2201 * (x2omi + xli - G22).cos()
                    + d2211 * (xli - G22).cos()
                    + d3210 * (xomi + xli - G32).cos()
                    + d3222 * (-xomi + xli - G32).cos()
                    + d5220 * (xomi + xli - G52).cos()
                    + d5232 * (-xomi + xli - G52).cos()
                    + 2.0
                        * (d4410 * (x2omi + x2li - G44).cos()
                            + d4422 * (x2li - G44).cos()
                            + d5421 * (xomi + x2li - G54).cos()
                            + d5433 * (-xomi + x2li - G54).cos()))
                    * xldot;
                (xndt, xldot, xnddt)
            }
            Resonance::None => unreachable!(),
        };

        if (t - atime).abs() < STEP {
            break (t - atime, xndt, xldot, xnddt);
        }

        xli += xldot * delt + xndt * STEP2;
        xni += xndt * delt + xnddt * STEP2;
        atime += delt;
    };

    nm = xni + xndt * ft + xnddt * ft * ft * 0.5;
    let xl = xli + xldot * ft + xndt * ft * ft * 0.5;
    match deep.resonance {
        Resonance::OneDay { .. } => {
            mm = xl - nodem - argpm + theta;
        }
        _ => {
            mm = xl - 2.0 * nodem + 2.0 * theta;
        }
    }

    SecularUpdate {
        em,
        argpm,
        inclm,
        mm,
        nodem,
        nm,
    }
}

/// Long-period lunar/solar periodic corrections at `t` minutes from epoch
/// (Vallado's `dpper`, propagation branch).
///
/// Returns the adjusted (eccentricity, inclination, node, argument of
/// perigee, mean anomaly).
pub(crate) fn periodic_corrections(
    ls: &LunarSolar,
    t: f64,
    mut ep: f64,
    mut inclp: f64,
    mut nodep: f64,
    mut argpp: f64,
    mut mp: f64,
) -> (f64, f64, f64, f64, f64) {
    // solar terms
    let zm = ls.zmos + ZNS * t;
    let zf = zm + 2.0 * ZES * zm.sin();
    let sinzf = zf.sin();
    let f2 = 0.5 * sinzf * sinzf - 0.25;
    let f3 = -0.5 * sinzf * zf.cos();
    let ses = ls.se2 * f2 + ls.se3 * f3;
    let sis = ls.si2 * f2 + ls.si3 * f3;
    let sls = ls.sl2 * f2 + ls.sl3 * f3 + ls.sl4 * sinzf;
    let sghs = ls.sgh2 * f2 + ls.sgh3 * f3 + ls.sgh4 * sinzf;
    let shs = ls.sh2 * f2 + ls.sh3 * f3;

    // lunar terms
    let zm = ls.zmol + ZNL * t;
    let zf = zm + 2.0 * ZEL * zm.sin();
    let sinzf = zf.sin();
    let f2 = 0.5 * sinzf * sinzf - 0.25;
    let f3 = -0.5 * sinzf * zf.cos();
    let sel = ls.ee2 * f2 + ls.e3 * f3;
    let sil = ls.xi2 * f2 + ls.xi3 * f3;
    let sll = ls.xl2 * f2 + ls.xl3 * f3 + ls.xl4 * sinzf;
    let sghl = ls.xgh2 * f2 + ls.xgh3 * f3 + ls.xgh4 * sinzf;
    let shll = ls.xh2 * f2 + ls.xh3 * f3;

    let pe = ses + sel - ls.peo;
    let pinc = sis + sil - ls.pinco;
    let pl = sls + sll - ls.plo;
    let pgh = sghs + sghl - ls.pgho;
    let ph = shs + shll - ls.pho;

    inclp += pinc;
    ep += pe;
    let sinip = inclp.sin();
    let cosip = inclp.cos();

    if inclp >= 0.2 {
        let ph_over_sin = ph / sinip;
        argpp += pgh - cosip * ph_over_sin;
        nodep += ph_over_sin;
        mp += pl;
    } else {
        // Lyddane modification for low inclination: apply the corrections
        // through the node/inclination vector to avoid the sin(i) singularity
        let sinop = nodep.sin();
        let cosop = nodep.cos();
        let mut alfdp = sinip * sinop;
        let mut betdp = sinip * cosop;
        alfdp += ph * cosop + pinc * cosip * sinop;
        betdp += -ph * sinop + pinc * cosip * cosop;

        nodep = if nodep >= 0.0 {
            nodep % TWOPI
        } else {
            -((-nodep) % TWOPI)
        };

        let xls = mp + argpp + pl + pgh + (cosip - pinc * sinip) * nodep;
        let xnoh = nodep;
        nodep = alfdp.atan2(betdp);
        if (xnoh - nodep).abs() > PI {
            if nodep < xnoh {
                nodep += TWOPI;
            } else {
                nodep -= TWOPI;
            }
        }

        mp += pl;
        argpp = xls - mp - cosip * nodep;
    }

    (ep, inclp, nodep, argpp, mp)
}

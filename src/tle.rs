//! Two-line element (TLE) set decoder.
//!
//! A TLE packs orbital elements into two 69-column fixed-width lines.
//! Several numeric fields use compressed notations that are not valid
//! floating-point literals on their own:
//!
//! - eccentricity carries an implied leading `0.` (seven bare digits),
//! - the second derivative of mean motion and the B* drag term use a
//!   packed exponential form (`-11606-4` means `-0.11606e-4`),
//! - the first derivative omits the leading zero before its decimal point.
//!
//! Each field is described by a [`FieldSpec`] naming its exact column range
//! and reconstruction rule; one generic extraction routine applies the rule
//! and parses the result. The first field that fails to parse aborts the
//! decode with an error naming that field. Checksums and the
//! ephemeris-type/element-set fields are deliberately ignored.
//!
//! Column offsets follow the public NORAD format (0-indexed here).

use crate::constants::MINUTES_PER_DAY;
use crate::time::{days_to_mdhms, Clock};
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use thiserror::Error;

/// TLE decoding errors. Fatal to the record at hand; batch callers move on
/// to the next record.
#[derive(Error, Debug)]
pub enum TleError {
    #[error("field '{field}' needs columns {start}..{end}, line is {len} characters")]
    LineTooShort {
        field: &'static str,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("failed to parse field '{field}' from '{text}': {source}")]
    ParseField {
        field: &'static str,
        text: String,
        source: std::num::ParseFloatError,
    },

    #[error("failed to parse integer field '{field}' from '{text}': {source}")]
    ParseIntField {
        field: &'static str,
        text: String,
        source: std::num::ParseIntError,
    },
}

/// Raw orbital elements as decoded from a TLE.
///
/// Values keep the units the TLE stores them in: angles in degrees, mean
/// motion in revolutions/day, epoch year as the original two digits.
/// Unit canonicalization happens in [`crate::propagator::initialize`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrbitalElements {
    /// NORAD catalog number, trimmed but kept textual.
    pub catalog_number: String,
    /// Two-digit epoch year as stored.
    pub epoch_year: i64,
    /// Fractional day of year, 1-based.
    pub epoch_day: f64,
    /// First time derivative of mean motion (rev/day²), aka ndot.
    pub mean_motion_dot: f64,
    /// Second time derivative of mean motion (rev/day³), aka nddot.
    pub mean_motion_ddot: f64,
    /// B* drag term (1/Earth radii).
    pub bstar: f64,
    /// Inclination (degrees).
    pub inclination_deg: f64,
    /// Right ascension of the ascending node (degrees).
    pub raan_deg: f64,
    /// Eccentricity (dimensionless).
    pub eccentricity: f64,
    /// Argument of perigee (degrees).
    pub arg_perigee_deg: f64,
    /// Mean anomaly (degrees).
    pub mean_anomaly_deg: f64,
    /// Mean motion (revolutions/day).
    pub mean_motion_rev_day: f64,
    /// Orbit number at epoch.
    pub orbit_number: i64,
}

/// How a field's column slice is rebuilt into a parseable literal.
#[derive(Debug, Clone, Copy)]
enum Rule {
    /// Space-padded plain decimal; spaces removed before parsing.
    Plain,
    /// Bare digits with an implied leading `0.`.
    ImpliedPoint,
    /// Sign column, five mantissa digits with assumed decimal point,
    /// then a signed power-of-ten exponent with no `e` marker.
    PackedExponential,
}

/// One fixed-column field of a TLE line.
#[derive(Debug, Clone)]
struct FieldSpec {
    name: &'static str,
    range: Range<usize>,
    rule: Rule,
}

// Line 1 layout.
const CATALOG_NUMBER: FieldSpec = FieldSpec { name: "catalog number", range: 2..7, rule: Rule::Plain };
const EPOCH_YEAR: FieldSpec = FieldSpec { name: "epoch year", range: 18..20, rule: Rule::Plain };
const EPOCH_DAY: FieldSpec = FieldSpec { name: "epoch day", range: 20..32, rule: Rule::Plain };
const MEAN_MOTION_DOT: FieldSpec =
    FieldSpec { name: "first time derivative of mean motion", range: 33..43, rule: Rule::Plain };
const MEAN_MOTION_DDOT: FieldSpec = FieldSpec {
    name: "second time derivative of mean motion",
    range: 44..52,
    rule: Rule::PackedExponential,
};
const BSTAR: FieldSpec = FieldSpec { name: "b star", range: 53..61, rule: Rule::PackedExponential };

// Line 2 layout.
const INCLINATION: FieldSpec = FieldSpec { name: "inclination", range: 8..16, rule: Rule::Plain };
const RAAN: FieldSpec =
    FieldSpec { name: "right ascension of ascending node", range: 17..25, rule: Rule::Plain };
const ECCENTRICITY: FieldSpec =
    FieldSpec { name: "eccentricity", range: 26..33, rule: Rule::ImpliedPoint };
const ARG_PERIGEE: FieldSpec =
    FieldSpec { name: "argument of perigee", range: 34..42, rule: Rule::Plain };
const MEAN_ANOMALY: FieldSpec = FieldSpec { name: "mean anomaly", range: 43..51, rule: Rule::Plain };
const MEAN_MOTION: FieldSpec = FieldSpec { name: "mean motion", range: 52..63, rule: Rule::Plain };
const ORBIT_NUMBER: FieldSpec =
    FieldSpec { name: "orbit number at epoch", range: 63..68, rule: Rule::Plain };

/// Slice a field's columns out of a line, or report the line as too short.
fn columns<'a>(line: &'a str, spec: &FieldSpec) -> Result<&'a str, TleError> {
    line.get(spec.range.clone()).ok_or(TleError::LineTooShort {
        field: spec.name,
        start: spec.range.start,
        end: spec.range.end,
        len: line.len(),
    })
}

/// Rebuild a field's text into a standard literal per its rule.
fn reconstruct(raw: &str, rule: Rule) -> String {
    match rule {
        Rule::Plain => raw.replace(' ', ""),
        Rule::ImpliedPoint => format!("0.{}", raw),
        Rule::PackedExponential => {
            // sign digit, 5-digit mantissa, 2-character exponent
            let (sign, rest) = raw.split_at(1);
            let (mantissa, exponent) = rest.split_at(5);
            format!("{}.{}e{}", sign, mantissa, exponent).replace(' ', "")
        }
    }
}

/// Extract one floating-point field.
fn extract_f64(line: &str, spec: &FieldSpec) -> Result<f64, TleError> {
    let raw = columns(line, spec)?;
    let literal = reconstruct(raw, spec.rule);
    literal.parse::<f64>().map_err(|source| TleError::ParseField {
        field: spec.name,
        text: raw.to_string(),
        source,
    })
}

/// Extract one integer field.
fn extract_i64(line: &str, spec: &FieldSpec) -> Result<i64, TleError> {
    let raw = columns(line, spec)?;
    raw.trim().parse::<i64>().map_err(|source| TleError::ParseIntField {
        field: spec.name,
        text: raw.to_string(),
        source,
    })
}

/// Decode a TLE from its two lines.
pub fn decode(line1: &str, line2: &str) -> Result<OrbitalElements, TleError> {
    Ok(OrbitalElements {
        catalog_number: columns(line1, &CATALOG_NUMBER)?.trim().to_string(),
        epoch_year: extract_i64(line1, &EPOCH_YEAR)?,
        epoch_day: extract_f64(line1, &EPOCH_DAY)?,
        mean_motion_dot: extract_f64(line1, &MEAN_MOTION_DOT)?,
        mean_motion_ddot: extract_f64(line1, &MEAN_MOTION_DDOT)?,
        bstar: extract_f64(line1, &BSTAR)?,
        inclination_deg: extract_f64(line2, &INCLINATION)?,
        raan_deg: extract_f64(line2, &RAAN)?,
        eccentricity: extract_f64(line2, &ECCENTRICITY)?,
        arg_perigee_deg: extract_f64(line2, &ARG_PERIGEE)?,
        mean_anomaly_deg: extract_f64(line2, &MEAN_ANOMALY)?,
        mean_motion_rev_day: extract_f64(line2, &MEAN_MOTION)?,
        orbit_number: extract_i64(line2, &ORBIT_NUMBER)?,
    })
}

impl OrbitalElements {
    /// Four-digit epoch year under the classical SGP4 pivot: two-digit
    /// years below 57 belong to the 2000s, the rest to the 1900s.
    /// Independent of wall-clock time; this is what the propagation epoch
    /// uses.
    pub fn epoch_year_full(&self) -> i32 {
        if self.epoch_year < 57 {
            (self.epoch_year + 2000) as i32
        } else {
            (self.epoch_year + 1900) as i32
        }
    }

    /// Element epoch as a UTC timestamp, disambiguating the two-digit year
    /// against the injected clock.
    ///
    /// Years up to four beyond the clock's current year are read as future
    /// epochs; anything further ahead is pushed back a century. The window
    /// trades how far into the future a TLE may be dated against how old a
    /// TLE can still be read.
    pub fn epoch_datetime(&self, clock: &impl Clock) -> DateTime<Utc> {
        let current_full_year = clock.now().year();
        let current_two_digit = current_full_year % 100;
        let year = if self.epoch_year as i32 <= current_two_digit + 4 {
            current_full_year - current_two_digit + self.epoch_year as i32
        } else {
            current_full_year - current_two_digit - 100 + self.epoch_year as i32
        };

        let (month, day, hour, minute, second) = days_to_mdhms(year, self.epoch_day);
        let whole_seconds = second.floor();
        let millis = ((second - whole_seconds) * 1000.0).round() as i64;
        Utc.with_ymd_and_hms(year, month, day, hour, minute, whole_seconds as u32)
            .single()
            .unwrap_or_else(|| Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap())
            + Duration::milliseconds(millis)
    }

    /// Orbital period in minutes, straight from the mean motion.
    pub fn period_minutes(&self) -> f64 {
        MINUTES_PER_DAY / self.mean_motion_rev_day
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    pub(crate) const ISS_LINE1: &str =
        "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
    pub(crate) const ISS_LINE2: &str =
        "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[test]
    fn test_decode_iss() {
        let tle = decode(ISS_LINE1, ISS_LINE2).unwrap();
        assert_eq!(tle.catalog_number, "25544");
        assert_eq!(tle.epoch_year, 8);
        assert_relative_eq!(tle.epoch_day, 264.51782528, epsilon = 1e-12);
        assert_relative_eq!(tle.mean_motion_dot, -2.182e-5, epsilon = 1e-15);
        assert_relative_eq!(tle.mean_motion_ddot, 0.0, epsilon = 1e-15);
        assert_relative_eq!(tle.bstar, -1.1606e-5, epsilon = 1e-15);
        assert_relative_eq!(tle.inclination_deg, 51.6416, epsilon = 1e-12);
        assert_relative_eq!(tle.raan_deg, 247.4627, epsilon = 1e-12);
        assert_relative_eq!(tle.eccentricity, 0.0006703, epsilon = 1e-15);
        assert_relative_eq!(tle.arg_perigee_deg, 130.536, epsilon = 1e-12);
        assert_relative_eq!(tle.mean_anomaly_deg, 325.0288, epsilon = 1e-12);
        assert_relative_eq!(tle.mean_motion_rev_day, 15.72125391, epsilon = 1e-12);
        assert_eq!(tle.orbit_number, 56353);
    }

    #[test]
    fn test_decode_noaa19() {
        let tle = decode(
            "1 33591U 09005A   16163.48990228  .00000077  00000-0  66998-4 0  9990",
            "2 33591  99.0394 120.2160 0013054 232.8317 127.1662 14.12079902378332",
        )
        .unwrap();
        assert_eq!(tle.catalog_number, "33591");
        assert_eq!(tle.epoch_year, 16);
        assert_relative_eq!(tle.epoch_day, 163.48990228, epsilon = 1e-12);
        assert_relative_eq!(tle.mean_motion_dot, 7.7e-7, epsilon = 1e-15);
        assert_relative_eq!(tle.bstar, 0.66998e-4, epsilon = 1e-15);
        assert_relative_eq!(tle.eccentricity, 0.0013054, epsilon = 1e-15);
        assert_relative_eq!(tle.mean_motion_rev_day, 14.12079902, epsilon = 1e-12);
        assert_eq!(tle.orbit_number, 37833);
    }

    #[test]
    fn test_decode_titan3c() {
        // Deep-space object: 1.2 rev/day
        let tle = decode(
            "1 04632U 70093B   04031.91070959 -.00000084  00000-0  10000-3 0  9955",
            "2 04632  11.4628 273.1101 1450506 207.6000 143.9350  1.20231981 44145",
        )
        .unwrap();
        assert_eq!(tle.catalog_number, "04632");
        assert_eq!(tle.epoch_year, 4);
        assert_relative_eq!(tle.mean_motion_dot, -8.4e-7, epsilon = 1e-15);
        assert_relative_eq!(tle.bstar, 1e-4, epsilon = 1e-15);
        assert_relative_eq!(tle.eccentricity, 0.1450506, epsilon = 1e-15);
        assert_relative_eq!(tle.mean_motion_rev_day, 1.20231981, epsilon = 1e-12);
        assert!(tle.period_minutes() >= 225.0);
    }

    #[test]
    fn test_epoch_year_pivot() {
        let mut tle = decode(ISS_LINE1, ISS_LINE2).unwrap();
        for (two_digit, full) in [(56, 2056), (57, 1957), (99, 1999), (0, 2000), (8, 2008)] {
            tle.epoch_year = two_digit;
            assert_eq!(tle.epoch_year_full(), full);
        }
    }

    #[test]
    fn test_epoch_datetime_with_fixed_clock() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        let tle = decode(ISS_LINE1, ISS_LINE2).unwrap();
        let epoch = tle.epoch_datetime(&clock);
        assert_eq!(epoch.year(), 2008);
        assert_eq!((epoch.month(), epoch.day()), (9, 20));

        // Epoch year within the forward window reads as future
        let mut future = tle.clone();
        future.epoch_year = 28;
        assert_eq!(future.epoch_datetime(&clock).year(), 2028);

        // Beyond the window it falls back a century
        let mut past = tle;
        past.epoch_year = 29;
        assert_eq!(past.epoch_datetime(&clock).year(), 1929);
    }

    #[test]
    fn test_short_line_names_field() {
        let err = decode("1 25544U 98067A   08264.51", ISS_LINE2).unwrap_err();
        match err {
            TleError::LineTooShort { field, .. } => assert_eq!(field, "epoch day"),
            other => panic!("expected LineTooShort, got {other}"),
        }
    }

    #[test]
    fn test_garbled_field_names_field() {
        let bad = ISS_LINE2.replace("0006703", "00x6703");
        let err = decode(ISS_LINE1, &bad).unwrap_err();
        match err {
            TleError::ParseField { field, .. } => assert_eq!(field, "eccentricity"),
            other => panic!("expected ParseField, got {other}"),
        }
    }

    #[test]
    fn test_packed_exponential_reconstruction() {
        assert_relative_eq!(
            reconstruct("-11606-4", Rule::PackedExponential).parse::<f64>().unwrap(),
            -0.11606e-4,
            epsilon = 1e-18
        );
        assert_relative_eq!(
            reconstruct(" 00000-0", Rule::PackedExponential).parse::<f64>().unwrap(),
            0.0,
            epsilon = 1e-18
        );
        assert_relative_eq!(
            reconstruct(" 66998-4", Rule::PackedExponential).parse::<f64>().unwrap(),
            0.66998e-4,
            epsilon = 1e-18
        );
    }

    /// Re-format decoded fields back to their packed text, checking the
    /// decode is lossless for the documented precisions.
    #[test]
    fn test_reformat_round_trip() {
        let tle = decode(ISS_LINE1, ISS_LINE2).unwrap();

        let ecc = format!("{:07.0}", tle.eccentricity * 1.0e7);
        assert_eq!(ecc, &ISS_LINE2[26..33]);

        let epoch = format!("{:012.8}", tle.epoch_day);
        assert_eq!(epoch, &ISS_LINE1[20..32]);

        // B* mantissa is five digits scaled so the exponent holds the rest
        let mantissa = (tle.bstar / 1e-5 * 1.0e4).round();
        let packed = format!("{:+06.0}-4", mantissa).replace('+', " ");
        assert_eq!(packed, &ISS_LINE1[53..61]);
    }
}

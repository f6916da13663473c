//! Julian date and sidereal time utilities.
//!
//! Two Greenwich sidereal time formulations are carried on purpose: the
//! IAU-82 polynomial ([`gstime`]) feeds the propagator's deep-space
//! initialization, while the 1992 Astronomical Almanac form
//! ([`theta_g_jd`]) feeds the observer transforms in [`crate::coords`].
//! They agree to well below a microradian but are kept separate so each
//! consumer reproduces its reference formula exactly.

use crate::constants::*;
use chrono::{DateTime, Datelike, Timelike, Utc};

/// Replaceable wall-clock source.
///
/// Only used to disambiguate two-digit TLE epoch years relative to "now"
/// (see [`crate::tle::OrbitalElements::epoch_datetime`]); everything else
/// in the crate is a pure function of its inputs.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock. Use only at the outermost boundary; inject a fixed
/// clock in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Decompose a fractional 1-based day-of-year into month, day, hour,
/// minute and second.
///
/// Leap years are years divisible by 4 with no century correction, which
/// is exact for 1901-2099 and so covers the whole TLE epoch range.
pub fn days_to_mdhms(year: i32, epoch_days: f64) -> (u32, u32, u32, u32, f64) {
    let month_lengths: [u32; 12] = if year % 4 == 0 {
        [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    } else {
        [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    };

    let day_of_year = epoch_days.floor();

    let mut month = 1usize;
    let mut days_before_month = 0.0;
    while month < 12 && day_of_year > days_before_month + f64::from(month_lengths[month - 1]) {
        days_before_month += f64::from(month_lengths[month - 1]);
        month += 1;
    }
    let day = day_of_year - days_before_month;

    let mut frac = (epoch_days - day_of_year) * 24.0;
    let hour = frac.floor();
    frac = (frac - hour) * 60.0;
    let minute = frac.floor();
    let second = (frac - minute) * 60.0;

    (month as u32, day as u32, hour as u32, minute as u32, second)
}

/// Julian date from proleptic Gregorian calendar components.
///
/// The Julian date counts elapsed days since noon, Jan 1, 4713 BC.
pub fn julian_date(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: f64) -> f64 {
    let fyear = f64::from(year);
    let fmonth = f64::from(month);
    let jd = 367.0 * fyear - (7.0 * (fyear + ((fmonth + 9.0) / 12.0).floor()) * 0.25).floor()
        + (275.0 * fmonth / 9.0).floor()
        + f64::from(day)
        + 1_721_013.5;
    let day_fraction =
        (second + f64::from(minute) * 60.0 + f64::from(hour) * 3600.0) / SECONDS_IN_DAY;
    jd + day_fraction
}

/// Julian date of a UTC timestamp (whole-second precision).
pub fn julian_date_from_datetime(t: &DateTime<Utc>) -> f64 {
    julian_date(
        t.year(),
        t.month(),
        t.day(),
        t.hour(),
        t.minute(),
        f64::from(t.second()),
    )
}

/// Greenwich mean sidereal time (IAU-82), radians in [0, 2π).
pub fn gstime(jdut1: f64) -> f64 {
    let tut1 = (jdut1 - JULIAN_DAY_JAN_1_2000) / JULIAN_CENTURY;
    let seconds = -6.2e-6 * tut1 * tut1 * tut1
        + 0.093104 * tut1 * tut1
        + (876_600.0 * 3600.0 + 8_640_184.812_866) * tut1
        + 67_310.548_41;
    // 360°/86400s = 1/240 deg per second
    let mut theta = (seconds * DEG2RAD / 240.0) % TWOPI;
    if theta < 0.0 {
        theta += TWOPI;
    }
    theta
}

/// Greenwich mean sidereal time from a Julian date, radians.
///
/// Reference: The 1992 Astronomical Almanac, page B6.
pub fn theta_g_jd(mut jday: f64) -> f64 {
    let ut = (jday + 0.5).fract();
    jday -= ut;
    let tu = (jday - JULIAN_DAY_JAN_1_2000) / JULIAN_CENTURY;
    let mut gmst = 24_110.548_41 + tu * (8_640_184.812_866 + tu * (0.093104 - tu * 6.2e-6));
    gmst = (gmst + SECONDS_IN_DAY * 1.002_737_909_34 * ut) % SECONDS_IN_DAY;
    TWOPI * gmst / SECONDS_IN_DAY
}

/// Greenwich mean sidereal time of a UTC timestamp, radians.
pub fn gstime_from_datetime(t: &DateTime<Utc>) -> f64 {
    gstime(julian_date_from_datetime(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use chrono::TimeZone;

    #[test]
    fn test_julian_date_j2000() {
        assert_relative_eq!(
            julian_date(2000, 1, 1, 12, 0, 0.0),
            JULIAN_DAY_JAN_1_2000,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_julian_date_from_datetime() {
        let t = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert_relative_eq!(
            julian_date_from_datetime(&t),
            JULIAN_DAY_JAN_1_2000,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_days_to_mdhms_leap_year() {
        // 2020 day 140.34419374 is May 19, 08:15:38.34
        let (month, day, hour, minute, second) = days_to_mdhms(2020, 140.34419374);
        assert_eq!((month, day, hour, minute), (5, 19, 8, 15));
        assert_abs_diff_eq!(second, 38.339, epsilon = 1e-3);
    }

    #[test]
    fn test_days_to_mdhms_non_leap_year() {
        // 2008 is a leap year, day 264 is Sep 20; 2009 day 264 is Sep 21
        let (month, day, _, _, _) = days_to_mdhms(2008, 264.5);
        assert_eq!((month, day), (9, 20));
        let (month, day, _, _, _) = days_to_mdhms(2009, 264.5);
        assert_eq!((month, day), (9, 21));
    }

    #[test]
    fn test_days_to_mdhms_january() {
        let (month, day, hour, minute, second) = days_to_mdhms(2024, 1.5);
        assert_eq!((month, day, hour, minute), (1, 1, 12, 0));
        assert_abs_diff_eq!(second, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_gstime_range() {
        for jd in [2_450_000.25, 2_451_545.0, 2_458_990.5, 2_460_000.75] {
            let theta = gstime(jd);
            assert!((0.0..TWOPI).contains(&theta), "gstime({jd}) = {theta}");
        }
    }

    #[test]
    fn test_gstime_formulations_agree() {
        for jd in [2_451_545.0, 2_458_992.849_733, 2_460_311.123] {
            assert_abs_diff_eq!(gstime(jd), theta_g_jd(jd), epsilon = 1e-6);
        }
    }
}

use chrono::Duration;
use tracing::warn;

use crate::{
    error::{ensure_non_negative, PlanError, PlanResult},
    model::duty_segment::ClockTime,
};

pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Longest span the planner converts, a little over a century.
pub const MAX_HOURS: f64 = 1e6;

/// Driving time for `miles` at a constant average speed.
pub fn hours_for_miles(miles: f64, avg_speed_mph: f64) -> f64 {
    miles / avg_speed_mph
}

/// Converts fractional hours to a duration rounded to the nearest minute.
///
/// Fails for non-finite values and for anything beyond [`MAX_HOURS`].
pub fn duration_from_hours(hours: f64) -> PlanResult<Duration> {
    if !(hours.is_finite() && hours.abs() <= MAX_HOURS) {
        return Err(PlanError::invalid("hours", hours, "out of range"));
    }
    Duration::try_minutes((hours * 60.0).round() as i64)
        .ok_or_else(|| PlanError::invalid("hours", hours, "out of range"))
}

pub fn hours_of(duration: Duration) -> f64 {
    duration.num_minutes() as f64 / 60.0
}

/// Adds `hours_to_add` to an `HH:MM` clock, returning the wrapped clock and
/// the number of midnights crossed.
///
/// An empty clock is treated as `00:00`.
pub fn add_time(clock: &str, hours_to_add: f64) -> PlanResult<(ClockTime, i64)> {
    ensure_non_negative("hours to add", hours_to_add)?;
    let clock = if clock.trim().is_empty() {
        warn!("empty clock passed to add_time, assuming 00:00");
        ClockTime::MIDNIGHT
    } else {
        let parsed: ClockTime = clock.parse()?;
        if parsed == ClockTime::END_OF_DAY {
            return Err(PlanError::invalid(
                "clock",
                clock,
                "24:00 only marks the end of a day and cannot be advanced",
            ));
        }
        parsed
    };

    let total = clock.minutes() + duration_from_hours(hours_to_add)?.num_minutes();
    let days = total.div_euclid(MINUTES_PER_DAY);
    let wrapped = ClockTime::from_minutes(total.rem_euclid(MINUTES_PER_DAY))?;
    Ok((wrapped, days))
}

#[test]
fn test_add_time_wraps_past_midnight() {
    assert_eq!(
        add_time("23:30", 1.0).unwrap(),
        ("00:30".parse().unwrap(), 1)
    );
    assert_eq!(
        add_time("10:00", 0.0).unwrap(),
        ("10:00".parse().unwrap(), 0)
    );
    assert_eq!(
        add_time("00:00", 24.0).unwrap(),
        (ClockTime::MIDNIGHT, 1)
    );
    assert_eq!(
        add_time("06:15", 50.0).unwrap(),
        ("08:15".parse().unwrap(), 2)
    );
}

#[test]
fn test_add_time_rounds_to_minutes() {
    // 50 miles at 60 mph
    let (clock, days) = add_time("08:00", hours_for_miles(50.0, 60.0)).unwrap();
    assert_eq!(clock.to_string(), "08:50");
    assert_eq!(days, 0);
}

#[test]
fn test_add_time_rejects_bad_input() {
    assert!(add_time("24:00", 1.0).is_err());
    assert!(add_time("25:00", 1.0).is_err());
    assert!(add_time("12:60", 1.0).is_err());
    assert!(add_time("noon", 1.0).is_err());
    assert!(add_time("10:00", -0.5).is_err());
    assert!(add_time("10:00", f64::NAN).is_err());
}

#[test]
fn test_add_time_empty_clock_defaults_to_midnight() {
    assert_eq!(add_time("", 0.0).unwrap(), (ClockTime::MIDNIGHT, 0));
    assert_eq!(add_time("  ", 1.5).unwrap(), ("01:30".parse().unwrap(), 0));
}

#[test]
fn test_hours_for_miles() {
    assert_eq!(hours_for_miles(600.0, 60.0), 10.0);
    assert_eq!(hours_for_miles(0.0, 60.0), 0.0);
    assert_eq!(
        duration_from_hours(hours_for_miles(50.0, 60.0)).unwrap(),
        Duration::minutes(50)
    );
    assert_eq!(hours_of(Duration::minutes(90)), 1.5);
}

#[test]
fn test_add_time_rejects_huge_hours() {
    assert!(matches!(
        add_time("00:00", 1e17),
        Err(PlanError::InvalidInput { .. })
    ));
    assert!(add_time("00:00", f64::INFINITY).is_err());
    // the largest accepted span still wraps cleanly
    let (clock, days) = add_time("00:00", MAX_HOURS).unwrap();
    assert_eq!(clock.to_string(), "16:00");
    assert_eq!(days, 41_666);
}

#[test]
fn test_duration_from_hours_range() {
    assert_eq!(duration_from_hours(0.0).unwrap(), Duration::zero());
    assert_eq!(duration_from_hours(0.001).unwrap(), Duration::zero());
    assert!(duration_from_hours(MAX_HOURS * 2.0).is_err());
    assert!(duration_from_hours(1e18).is_err());
    assert!(duration_from_hours(f64::NAN).is_err());
}

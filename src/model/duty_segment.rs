use std::{
    fmt::{Debug, Display},
    str::FromStr,
};

use chrono::{Duration, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::{
    error::{PlanError, PlanResult},
    utils::MINUTES_PER_DAY,
};

/// Wall-clock time of day at minute resolution.
///
/// `24:00` is a valid value and only ever appears as the end of a segment
/// that runs up to midnight.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClockTime(u16);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);
    pub const END_OF_DAY: ClockTime = ClockTime(MINUTES_PER_DAY as u16);

    pub fn from_minutes(minutes: i64) -> PlanResult<Self> {
        if !(0..=MINUTES_PER_DAY).contains(&minutes) {
            return Err(PlanError::invalid(
                "clock minutes",
                minutes,
                "must lie within a single day",
            ));
        }
        Ok(Self(minutes as u16))
    }

    pub fn minutes(&self) -> i64 {
        self.0 as i64
    }

    pub fn until_midnight(&self) -> Duration {
        Duration::minutes(MINUTES_PER_DAY - self.minutes())
    }

    /// Clock reached after `duration`; callers guarantee it does not pass `24:00`.
    pub(crate) fn advance(&self, duration: Duration) -> Self {
        let minutes = (self.minutes() + duration.num_minutes()).clamp(0, MINUTES_PER_DAY);
        Self(minutes as u16)
    }
}

impl From<NaiveTime> for ClockTime {
    fn from(value: NaiveTime) -> Self {
        Self((value.hour() * 60 + value.minute()) as u16)
    }
}

impl FromStr for ClockTime {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| PlanError::invalid("clock", s, reason);
        let (hours, minutes) = s.trim().split_once(':').ok_or_else(|| invalid("expected HH:MM"))?;
        let hours: i64 = hours.parse().map_err(|_| invalid("hours are not a number"))?;
        let minutes: i64 = minutes
            .parse()
            .map_err(|_| invalid("minutes are not a number"))?;
        if hours == 24 && minutes == 0 {
            return Ok(Self::END_OF_DAY);
        }
        if !(0..24).contains(&hours) {
            return Err(invalid("hours must be within 00..23"));
        }
        if !(0..60).contains(&minutes) {
            return Err(invalid("minutes must be within 00..59"));
        }
        Ok(Self((hours * 60 + minutes) as u16))
    }
}

impl Display for ClockTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl Debug for ClockTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.to_string(), f)
    }
}

impl Serialize for ClockTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let str = String::deserialize(deserializer)?;
        str.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum DutyStatus {
    Driving,
    OnDutyNotDriving,
    OffDuty,
}

impl DutyStatus {
    /// Driving and non-driving work both count against the on-duty window and the cycle.
    pub fn is_on_duty(&self) -> bool {
        !matches!(self, DutyStatus::OffDuty)
    }
}

impl Display for DutyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DutyStatus::Driving => "Driving",
            DutyStatus::OnDutyNotDriving => "On Duty (Not Driving)",
            DutyStatus::OffDuty => "Off Duty",
        };
        write!(f, "{s}")
    }
}

/// One line of the driver's daily log. Never spans two calendar dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutySegment {
    pub date: NaiveDate,
    pub start: ClockTime,
    pub end: ClockTime,
    pub status: DutyStatus,
    pub remarks: String,
}

impl DutySegment {
    pub fn duration(&self) -> Duration {
        Duration::minutes(self.end.minutes() - self.start.minutes())
    }
}

/// Checks the log invariants: positive lengths, and each segment picking up
/// exactly where the previous one stopped (`24:00` → `00:00` of the next date).
pub fn check_contiguous(segments: &[DutySegment]) -> PlanResult<()> {
    for segment in segments {
        if segment.end <= segment.start {
            return Err(PlanError::invalid(
                "segment",
                format!("{} {}-{}", segment.date, segment.start, segment.end),
                "must end after it starts",
            ));
        }
    }
    for pair in segments.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let continues_same_day = prev.date == next.date && prev.end == next.start;
        let continues_next_day = prev.end == ClockTime::END_OF_DAY
            && next.start == ClockTime::MIDNIGHT
            && prev.date.succ_opt() == Some(next.date);
        if !continues_same_day && !continues_next_day {
            return Err(PlanError::invalid(
                "segment",
                format!("{} {} after {} {}", next.date, next.start, prev.date, prev.end),
                "leaves a gap or overlaps the previous segment",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(date: NaiveDate, start: &str, end: &str, status: DutyStatus) -> DutySegment {
        DutySegment {
            date,
            start: start.parse().unwrap(),
            end: end.parse().unwrap(),
            status,
            remarks: String::new(),
        }
    }

    #[test]
    fn test_clock_parse_and_format() {
        let clock: ClockTime = "07:05".parse().unwrap();
        assert_eq!(clock.minutes(), 425);
        assert_eq!(clock.to_string(), "07:05");
        assert_eq!("24:00".parse::<ClockTime>().unwrap(), ClockTime::END_OF_DAY);
        assert_eq!(ClockTime::END_OF_DAY.to_string(), "24:00");
        assert!("24:01".parse::<ClockTime>().is_err());
        assert!("7".parse::<ClockTime>().is_err());
        assert!("-1:00".parse::<ClockTime>().is_err());
    }

    #[test]
    fn test_clock_serde_as_string() {
        let json = serde_json::to_string(&ClockTime::END_OF_DAY).unwrap();
        assert_eq!(json, "\"24:00\"");
        let clock: ClockTime = serde_json::from_str("\"13:45\"").unwrap();
        assert_eq!(clock.minutes(), 13 * 60 + 45);
        assert!(serde_json::from_str::<ClockTime>("\"99:00\"").is_err());
    }

    #[test]
    fn test_contiguity_across_midnight() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let next = day.succ_opt().unwrap();
        let segments = vec![
            segment(day, "20:00", "24:00", DutyStatus::Driving),
            segment(next, "00:00", "02:00", DutyStatus::Driving),
            segment(next, "02:00", "03:00", DutyStatus::OnDutyNotDriving),
        ];
        assert!(check_contiguous(&segments).is_ok());
        assert_eq!(segments[0].duration(), Duration::hours(4));
    }

    #[test]
    fn test_contiguity_rejects_gaps_and_empty_segments() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let gap = vec![
            segment(day, "08:00", "09:00", DutyStatus::Driving),
            segment(day, "09:30", "10:00", DutyStatus::OffDuty),
        ];
        assert!(check_contiguous(&gap).is_err());

        let empty = vec![segment(day, "08:00", "08:00", DutyStatus::Driving)];
        assert!(check_contiguous(&empty).is_err());

        let skipped_day = vec![
            segment(day, "20:00", "24:00", DutyStatus::Driving),
            segment(day + Duration::days(2), "00:00", "01:00", DutyStatus::Driving),
        ];
        assert!(check_contiguous(&skipped_day).is_err());
    }
}

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::{
    error::PlanResult,
    model::duty_segment::{ClockTime, DutySegment, DutyStatus},
};

/// Working state of one planning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleState {
    pub current_date: NaiveDate,
    pub clock: ClockTime,
    /// Days elapsed since departure.
    pub day_offset: u32,
    // since the last full rest
    pub driving_today: Duration,
    pub on_duty_today: Duration,
    // since the last midnight
    pub date_driving: Duration,
    pub date_on_duty: Duration,
    pub driving_since_break: Duration,
    /// Only ever grows.
    pub cycle_used: Duration,
}

impl ScheduleState {
    pub fn new(departure: NaiveDateTime, cycle_used: Duration) -> Self {
        Self {
            current_date: departure.date(),
            clock: departure.time().into(),
            day_offset: 0,
            driving_today: Duration::zero(),
            on_duty_today: Duration::zero(),
            date_driving: Duration::zero(),
            date_on_duty: Duration::zero(),
            driving_since_break: Duration::zero(),
            cycle_used,
        }
    }

    fn roll_over(&mut self) {
        self.current_date = self.current_date + Duration::days(1);
        self.clock = ClockTime::MIDNIGHT;
        self.day_offset += 1;
        self.date_driving = Duration::zero();
        self.date_on_duty = Duration::zero();
    }

    /// A full rest starts a fresh duty period.
    pub(crate) fn reset_duty_period(&mut self) {
        self.driving_today = Duration::zero();
        self.on_duty_today = Duration::zero();
        self.driving_since_break = Duration::zero();
    }

    pub(crate) fn record_on_duty(&mut self, length: Duration, driving: bool) {
        self.on_duty_today += length;
        self.cycle_used += length;
        if driving {
            self.driving_today += length;
            self.driving_since_break += length;
        }
    }
}

/// Segments produced by one step of the schedule together with the state
/// reached at its end.
#[derive(Debug, Clone)]
pub struct Leg {
    pub segments: Vec<DutySegment>,
    pub state: ScheduleState,
}

impl Leg {
    pub fn start(state: ScheduleState) -> Self {
        Self {
            segments: vec![],
            state,
        }
    }

    /// Runs the next step from the current state and appends its output.
    pub fn then<F>(mut self, step: F) -> PlanResult<Self>
    where
        F: FnOnce(ScheduleState) -> PlanResult<Leg>,
    {
        let next = step(self.state)?;
        self.segments.extend(next.segments);
        self.state = next.state;
        Ok(self)
    }

    /// Appends `length` of `status`, cutting it at every midnight it crosses.
    ///
    /// Only the per-date counters are updated here; duty-period and cycle
    /// accounting is up to the caller.
    pub(crate) fn push(&mut self, status: DutyStatus, length: Duration, remarks: &str) {
        let mut remaining = length;
        while remaining > Duration::zero() {
            let start = self.state.clock;
            let piece = remaining.min(start.until_midnight());
            let end = start.advance(piece);
            debug!(
                date = %self.state.current_date,
                %start,
                %end,
                %status,
                remarks,
                "emitting duty segment"
            );
            self.segments.push(DutySegment {
                date: self.state.current_date,
                start,
                end,
                status,
                remarks: remarks.to_string(),
            });

            if status.is_on_duty() {
                self.state.date_on_duty += piece;
            }
            if status == DutyStatus::Driving {
                self.state.date_driving += piece;
            }
            self.state.clock = end;
            remaining -= piece;
            if end == ClockTime::END_OF_DAY {
                self.state.roll_over();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn departure(time: &str) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 31)
            .unwrap()
            .and_time(chrono::NaiveTime::parse_from_str(time, "%H:%M").unwrap())
    }

    #[test]
    fn test_push_within_day() {
        let mut leg = Leg::start(ScheduleState::new(departure("08:00"), Duration::zero()));
        leg.push(DutyStatus::Driving, Duration::minutes(50), "to pickup");
        assert_eq!(leg.segments.len(), 1);
        assert_eq!(leg.segments[0].end.to_string(), "08:50");
        assert_eq!(leg.state.clock.to_string(), "08:50");
        assert_eq!(leg.state.date_driving, Duration::minutes(50));
        assert_eq!(leg.state.day_offset, 0);
    }

    #[test]
    fn test_push_splits_at_midnight() {
        let mut leg = Leg::start(ScheduleState::new(departure("21:20"), Duration::zero()));
        leg.push(DutyStatus::Driving, Duration::hours(10), "long haul");

        let [first, second] = leg.segments.as_slice() else {
            panic!("expected two pieces, got {:?}", leg.segments);
        };
        assert_eq!(first.start.to_string(), "21:20");
        assert_eq!(first.end, ClockTime::END_OF_DAY);
        assert_eq!(second.start, ClockTime::MIDNIGHT);
        assert_eq!(second.end.to_string(), "07:20");
        assert_eq!(second.date, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(leg.state.day_offset, 1);
        // only the piece after midnight counts for the new date
        assert_eq!(leg.state.date_driving, Duration::minutes(7 * 60 + 20));
    }

    #[test]
    fn test_push_ending_exactly_at_midnight() {
        let mut leg = Leg::start(ScheduleState::new(departure("22:00"), Duration::zero()));
        leg.push(DutyStatus::OffDuty, Duration::hours(2), "rest");
        assert_eq!(leg.segments.len(), 1);
        assert_eq!(leg.segments[0].end, ClockTime::END_OF_DAY);
        assert_eq!(leg.state.clock, ClockTime::MIDNIGHT);
        assert_eq!(leg.state.day_offset, 1);
    }

    #[test]
    fn test_push_spanning_several_days() {
        let mut leg = Leg::start(ScheduleState::new(departure("12:00"), Duration::zero()));
        leg.push(DutyStatus::OffDuty, Duration::hours(40), "reset");
        let ends: Vec<_> = leg.segments.iter().map(|s| s.end.to_string()).collect();
        assert_eq!(ends, vec!["24:00", "24:00", "04:00"]);
        assert_eq!(leg.state.day_offset, 2);
    }

    #[test]
    fn test_zero_length_emits_nothing() {
        let mut leg = Leg::start(ScheduleState::new(departure("10:00"), Duration::zero()));
        leg.push(DutyStatus::Driving, Duration::zero(), "nowhere");
        assert!(leg.segments.is_empty());
    }
}

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::utils::hours_of;

use super::{
    duty_segment::{ClockTime, DutySegment, DutyStatus},
    route_info::RouteGeometry,
    Coordinates,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuelingStop {
    pub location_label: String,
    /// Distance from the pickup, along the pickup → dropoff leg.
    pub approx_distance_miles: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    /// When the truck pulls in, once scheduled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival: Option<ClockTime>,
}

impl FuelingStop {
    pub fn at_mile(approx_distance_miles: f64) -> Self {
        Self {
            location_label: format!("Mile {:.0} (approx)", approx_distance_miles),
            approx_distance_miles,
            coordinates: None,
            date: None,
            arrival: None,
        }
    }
}

/// Per-date totals of one log sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyLog {
    pub date: NaiveDate,
    pub driving_hours: f64,
    pub on_duty_hours: f64,
    pub off_duty_hours: f64,
    pub segments: Vec<DutySegment>,
    /// Fueling stops the truck pulls into on this date.
    pub fueling_stops: Vec<FuelingStop>,
}

impl DailyLog {
    /// Groups an ordered segment list by calendar date.
    pub fn from_segments(segments: &[DutySegment]) -> Vec<DailyLog> {
        let mut logs: Vec<DailyLog> = vec![];
        for segment in segments {
            if logs.last().map(|log| log.date) != Some(segment.date) {
                logs.push(DailyLog {
                    date: segment.date,
                    driving_hours: 0.0,
                    on_duty_hours: 0.0,
                    off_duty_hours: 0.0,
                    segments: vec![],
                    fueling_stops: vec![],
                });
            }
            let Some(log) = logs.last_mut() else {
                continue;
            };
            let hours = hours_of(segment.duration());
            match segment.status {
                DutyStatus::Driving => log.driving_hours += hours,
                DutyStatus::OnDutyNotDriving => log.on_duty_hours += hours,
                DutyStatus::OffDuty => log.off_duty_hours += hours,
            }
            log.segments.push(segment.clone());
        }
        logs
    }

    /// Files every dated stop under the log sheet of its date.
    pub fn attach_fueling_stops(logs: &mut [DailyLog], stops: &[FuelingStop]) {
        for log in logs.iter_mut() {
            log.fueling_stops = stops
                .iter()
                .filter(|stop| stop.date == Some(log.date))
                .cloned()
                .collect();
        }
    }

    /// Driving plus non-driving on-duty time.
    pub fn total_on_duty_hours(&self) -> f64 {
        self.driving_hours + self.on_duty_hours
    }
}

/// Everything a caller needs to render the route map and the log sheets.
#[derive(Debug, Clone, Serialize)]
pub struct TripPlan {
    pub segments: Vec<DutySegment>,
    pub fueling_stops: Vec<FuelingStop>,
    pub daily_logs: Vec<DailyLog>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteGeometry>,
    pub total_distance: f64,
    pub total_driving_time: f64,
    pub total_on_duty_time: f64,
    pub remaining_cycle_hours: f64,
}

impl TripPlan {
    pub fn time_in(&self, status: DutyStatus) -> Duration {
        self.segments
            .iter()
            .filter(|s| s.status == status)
            .map(DutySegment::duration)
            .sum()
    }
}

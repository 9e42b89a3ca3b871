use chrono::Duration;
use tracing::debug;

use crate::{
    error::{PlanError, PlanResult},
    model::duty_segment::DutyStatus,
};

use super::{
    ensure_cycle, off_duty,
    state::{Leg, ScheduleState},
    DutyScheduler, HosConfig, Limits,
};

/// Keeps every duty period and every calendar date within the driving and
/// on-duty caps by inserting rests, and breaks up long stretches of driving.
#[derive(Debug, Default)]
pub struct HosScheduler {
    config: HosConfig,
}

/// How long the driver may keep driving right now.
fn driving_headroom(limits: &Limits, s: &ScheduleState) -> Duration {
    [
        limits.max_driving - s.driving_today,
        limits.max_driving - s.date_driving,
        limits.max_on_duty - s.on_duty_today,
        limits.max_on_duty - s.date_on_duty,
        limits.break_after_driving - s.driving_since_break,
    ]
    .into_iter()
    .min()
    .unwrap_or_else(Duration::zero)
}

fn period_blocked(limits: &Limits, s: &ScheduleState, need: Duration, driving: bool) -> bool {
    s.on_duty_today + need > limits.max_on_duty
        || (driving && s.driving_today + need > limits.max_driving)
}

fn date_blocked(limits: &Limits, s: &ScheduleState, need: Duration, driving: bool) -> bool {
    s.date_on_duty + need > limits.max_on_duty
        || (driving && s.date_driving + need > limits.max_driving)
}

fn no_room(need: Duration) -> PlanError {
    PlanError::invalid(
        "duty limits",
        format!("{} min", need.num_minutes()),
        "no duty window is long enough for the next activity",
    )
}

impl HosScheduler {
    pub fn new(config: HosConfig) -> Self {
        Self { config }
    }

    /// Inserts off-duty time so that `need` more on-duty time can follow.
    ///
    /// Fails when `need` does not fit even in a fresh duty period on a fresh
    /// date.
    fn make_room(&self, leg: Leg, need: Duration, driving: bool, limits: &Limits) -> PlanResult<Leg> {
        let mut leg = leg;

        if period_blocked(limits, &leg.state, need, driving) {
            debug!(
                date = %leg.state.current_date,
                clock = %leg.state.clock,
                "duty period exhausted, inserting rest"
            );
            let remarks = format!("Mandatory {}-hour rest", self.config.rest_hours);
            leg = leg.then(|s| Ok(off_duty(s, limits.rest, &remarks, limits)))?;
            if period_blocked(limits, &leg.state, need, driving) {
                return Err(no_room(need));
            }
        }

        if date_blocked(limits, &leg.state, need, driving) {
            debug!(
                date = %leg.state.current_date,
                "daily limit reached, off duty until midnight"
            );
            leg = leg.then(|s| {
                let length = s.clock.until_midnight();
                Ok(off_duty(
                    s,
                    length,
                    "Off duty until end of day (daily limit reached)",
                    limits,
                ))
            })?;
            if date_blocked(limits, &leg.state, need, driving) {
                return Err(no_room(need));
            }
        } else if driving && leg.state.driving_since_break >= limits.break_after_driving {
            leg = leg.then(|s| Ok(off_duty(s, limits.pause, &limits.break_remarks(), limits)))?;
        }

        Ok(leg)
    }
}

impl DutyScheduler for HosScheduler {
    fn config(&self) -> &HosConfig {
        &self.config
    }

    fn drive(&self, state: ScheduleState, length: Duration, remarks: &str) -> PlanResult<Leg> {
        let limits = self.config.limits()?;
        let mut remaining = length;
        let mut leg = Leg::start(state);
        while remaining > Duration::zero() {
            let headroom = driving_headroom(&limits, &leg.state);
            if headroom <= Duration::zero() {
                leg = self.make_room(leg, Duration::minutes(1), true, &limits)?;
                continue;
            }
            let chunk = remaining.min(headroom);
            ensure_cycle(leg.state.cycle_used, chunk, &limits)?;
            leg.push(DutyStatus::Driving, chunk, remarks);
            leg.state.record_on_duty(chunk, true);
            remaining -= chunk;
        }
        Ok(leg)
    }

    fn on_duty(&self, state: ScheduleState, length: Duration, remarks: &str) -> PlanResult<Leg> {
        let limits = self.config.limits()?;
        let mut leg = Leg::start(state);
        while period_blocked(&limits, &leg.state, length, false)
            || date_blocked(&limits, &leg.state, length, false)
        {
            leg = self.make_room(leg, length, false, &limits)?;
        }
        ensure_cycle(leg.state.cycle_used, length, &limits)?;
        leg.push(DutyStatus::OnDutyNotDriving, length, remarks);
        leg.state.record_on_duty(length, false);
        if length >= limits.pause {
            leg.state.driving_since_break = Duration::zero();
        }
        Ok(leg)
    }
}

use chrono::Duration;

use crate::{error::PlanResult, model::duty_segment::DutyStatus};

use super::{
    ensure_cycle,
    state::{Leg, ScheduleState},
    DutyScheduler, HosConfig,
};

/// Emits every leg at its full length. The daily caps are only kept
/// approximately, by the fueling cadence; the cycle limit is still enforced.
#[derive(Debug, Default)]
pub struct CadenceScheduler {
    config: HosConfig,
}

impl CadenceScheduler {
    pub fn new(config: HosConfig) -> Self {
        Self { config }
    }
}

impl DutyScheduler for CadenceScheduler {
    fn config(&self) -> &HosConfig {
        &self.config
    }

    fn drive(&self, state: ScheduleState, length: Duration, remarks: &str) -> PlanResult<Leg> {
        ensure_cycle(state.cycle_used, length, &self.config.limits()?)?;
        let mut leg = Leg::start(state);
        leg.push(DutyStatus::Driving, length, remarks);
        leg.state.record_on_duty(length, true);
        Ok(leg)
    }

    fn on_duty(&self, state: ScheduleState, length: Duration, remarks: &str) -> PlanResult<Leg> {
        ensure_cycle(state.cycle_used, length, &self.config.limits()?)?;
        let mut leg = Leg::start(state);
        leg.push(DutyStatus::OnDutyNotDriving, length, remarks);
        leg.state.record_on_duty(length, false);
        Ok(leg)
    }
}

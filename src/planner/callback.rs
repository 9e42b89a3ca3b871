use dyn_clone::DynClone;

use crate::{error::PlanError, model::trip_plan::TripPlan, schedule::ScheduleArgs};

/// Observer of planning runs. Implementations must not fail planning.
pub trait PlanCallback: DynClone {
    fn visit_plan_input(&mut self, _input: &ScheduleArgs) {}
    fn visit_plan_output(&mut self, _plan: &TripPlan) {}
    /// Called instead of `visit_plan_output` when planning fails.
    fn visit_plan_failure(&mut self, _input: &ScheduleArgs, _err: &PlanError) {}
}

dyn_clone::clone_trait_object!(PlanCallback);

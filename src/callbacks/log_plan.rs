use std::path::PathBuf;

use tracing::warn;

use serde_json::json;

use crate::{
    callbacks::dump_json, error::PlanError, model::trip_plan::TripPlan,
    planner::callback::PlanCallback, schedule::ScheduleArgs,
};

/// Writes every planning input and resulting plan under
/// `<root>/<name>/<iteration>/`.
pub struct LogPlanCallback {
    root: PathBuf,
    name: String,
    iteration: usize,
}

impl LogPlanCallback {
    pub fn new(name: String) -> Self {
        Self::with_root("logs", name)
    }

    pub fn with_root(root: impl Into<PathBuf>, name: String) -> Self {
        Self {
            root: root.into(),
            name,
            iteration: 0,
        }
    }

    pub fn get_file(&self, filename: &str) -> PathBuf {
        let mut dir = self.root.clone();
        dir.push(&self.name);
        dir.push(format!("{}", self.iteration));
        dir.push(filename);
        dir
    }
}

impl Clone for LogPlanCallback {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            name: format!("{}_fork", self.name),
            iteration: self.iteration,
        }
    }
}

impl PlanCallback for LogPlanCallback {
    fn visit_plan_input(&mut self, input: &ScheduleArgs) {
        if let Err(err) = dump_json(self.get_file("plan_input.json"), input) {
            warn!("failed to write plan input JSON file: {err:#}");
        }
    }

    fn visit_plan_output(&mut self, plan: &TripPlan) {
        if let Err(err) = dump_json(self.get_file("trip_plan.json"), plan) {
            warn!("failed to write trip plan JSON file: {err:#}");
        }
        self.iteration += 1
    }

    fn visit_plan_failure(&mut self, _input: &ScheduleArgs, err: &PlanError) {
        let report = json!({ "error": err.to_string() });
        if let Err(err) = dump_json(self.get_file("plan_error.json"), &report) {
            warn!("failed to write plan error JSON file: {err:#}");
        }
        self.iteration += 1
    }
}

#[test]
fn test_log_plan_paths() {
    let callback = LogPlanCallback::with_root("/tmp/plans", "nightly".into());
    assert_eq!(
        callback.get_file("trip_plan.json"),
        PathBuf::from("/tmp/plans/nightly/0/trip_plan.json")
    );
    let forked = callback.clone();
    assert_eq!(
        forked.get_file("trip_plan.json"),
        PathBuf::from("/tmp/plans/nightly_fork/0/trip_plan.json")
    );
}

#[test]
fn test_failed_plan_keeps_its_input() {
    use chrono::NaiveDate;

    let root = std::env::temp_dir().join(format!("log_plan_{}", std::process::id()));
    let mut callback = LogPlanCallback::with_root(&root, "failures".into());
    let args = ScheduleArgs {
        departure: NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap(),
        to_pickup_miles: 0.0,
        pickup_to_dropoff_miles: 300.0,
        cycle_used_hours: 69.5,
        pickup_label: "pickup".into(),
        dropoff_label: "dropoff".into(),
    };
    let err = PlanError::CycleExceeded {
        used_hours: 69.5,
        required_hours: 7.0,
        limit_hours: 70.0,
    };

    callback.visit_plan_input(&args);
    callback.visit_plan_failure(&args, &err);
    callback.visit_plan_input(&args);

    let run = |i: usize, file: &str| root.join("failures").join(i.to_string()).join(file);
    assert!(run(0, "plan_input.json").exists());
    assert!(run(1, "plan_input.json").exists());
    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(run(0, "plan_error.json")).unwrap()).unwrap();
    assert_eq!(report["error"], err.to_string());
    std::fs::remove_dir_all(root).ok();
}

pub mod cadence;
pub mod state;
pub mod stops;
pub mod strict;

use std::path::Path;

use anyhow::Context as _;
use chrono::{Duration, NaiveDateTime};
use derivative::Derivative;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ensure_non_negative, PlanError, PlanResult},
    model::{
        duty_segment::{ClockTime, DutySegment, DutyStatus},
        trip_plan::FuelingStop,
    },
    utils::{duration_from_hours, hours_for_miles, hours_of},
};

use self::{
    cadence::CadenceScheduler,
    state::{Leg, ScheduleState},
    stops::{plan_fueling_stops, FuelPlan},
    strict::HosScheduler,
};

/// How the daily driving and on-duty caps are honoured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Enforcement {
    /// Rests are inserted whenever a cap would be passed.
    #[default]
    Strict,
    /// Legs run at full length; only the fueling cadence breaks them up.
    StopCadence,
}

/// Regulatory limits and trip constants, in hours and miles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct HosConfig {
    #[derivative(Default(value = "60.0"))]
    pub avg_speed_mph: f64,
    #[derivative(Default(value = "1000.0"))]
    pub fuel_interval_miles: f64,
    #[derivative(Default(value = "11.0"))]
    pub max_driving_hours: f64,
    #[derivative(Default(value = "14.0"))]
    pub max_on_duty_hours: f64,
    #[derivative(Default(value = "70.0"))]
    pub cycle_limit_hours: f64,
    #[derivative(Default(value = "10.0"))]
    pub rest_hours: f64,
    #[derivative(Default(value = "0.5"))]
    pub break_hours: f64,
    #[derivative(Default(value = "8.0"))]
    pub break_after_driving_hours: f64,
    #[derivative(Default(value = "0.5"))]
    pub fuel_stop_hours: f64,
    #[derivative(Default(value = "1.0"))]
    pub pickup_dropoff_hours: f64,
    pub enforcement: Enforcement,
}

impl HosConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<HosConfig> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("unable to open HOS rules {}", path.display()))?;
        let config: HosConfig = serde_json::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("unable to parse HOS rules {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PlanResult<()> {
        let positive = [
            ("average speed", self.avg_speed_mph),
            ("fuel interval", self.fuel_interval_miles),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(PlanError::invalid(field, value, "must be positive"));
            }
        }
        // every span has to be at least a whole minute
        let spans = [
            ("max driving hours", self.max_driving_hours),
            ("max on-duty hours", self.max_on_duty_hours),
            ("cycle limit", self.cycle_limit_hours),
            ("rest hours", self.rest_hours),
            ("break hours", self.break_hours),
            ("break-after-driving hours", self.break_after_driving_hours),
        ];
        for (field, value) in spans {
            ensure_non_negative(field, value)?;
            if duration_from_hours(value)? < Duration::minutes(1) {
                return Err(PlanError::invalid(field, value, "must be at least one minute"));
            }
        }
        ensure_non_negative("fuel stop hours", self.fuel_stop_hours)?;
        ensure_non_negative("pickup/dropoff hours", self.pickup_dropoff_hours)?;
        if self.pickup_dropoff_hours > self.max_on_duty_hours {
            return Err(PlanError::invalid(
                "pickup/dropoff hours",
                self.pickup_dropoff_hours,
                "cannot fit in a single on-duty window",
            ));
        }
        Ok(())
    }

    /// The rules as durations.
    pub fn limits(&self) -> PlanResult<Limits> {
        Ok(Limits {
            max_driving: duration_from_hours(self.max_driving_hours)?,
            max_on_duty: duration_from_hours(self.max_on_duty_hours)?,
            cycle: duration_from_hours(self.cycle_limit_hours)?,
            rest: duration_from_hours(self.rest_hours)?,
            pause: duration_from_hours(self.break_hours)?,
            break_after_driving: duration_from_hours(self.break_after_driving_hours)?,
            fuel_stop: duration_from_hours(self.fuel_stop_hours)?,
            dwell: duration_from_hours(self.pickup_dropoff_hours)?,
        })
    }

    pub fn driving_time(&self, miles: f64) -> PlanResult<Duration> {
        duration_from_hours(hours_for_miles(miles, self.avg_speed_mph))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_driving: Duration,
    pub max_on_duty: Duration,
    pub cycle: Duration,
    pub rest: Duration,
    pub pause: Duration,
    pub break_after_driving: Duration,
    pub fuel_stop: Duration,
    pub dwell: Duration,
}

impl Limits {
    pub fn break_remarks(&self) -> String {
        format!("Mandatory {}-minute break", self.pause.num_minutes())
    }
}

/// Inputs of one scheduling run. Distances are already resolved.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleArgs {
    pub departure: NaiveDateTime,
    pub to_pickup_miles: f64,
    pub pickup_to_dropoff_miles: f64,
    pub cycle_used_hours: f64,
    pub pickup_label: String,
    pub dropoff_label: String,
}

#[derive(Debug, Clone)]
pub struct DutyLog {
    pub segments: Vec<DutySegment>,
    pub fuel_plan: FuelPlan,
    /// The planned stops, dated with the moment the truck pulls in.
    pub fueling_stops: Vec<FuelingStop>,
    pub final_state: ScheduleState,
}

pub trait DutyScheduler {
    fn config(&self) -> &HosConfig;

    /// Drives for `length` starting from `state`.
    fn drive(&self, state: ScheduleState, length: Duration, remarks: &str) -> PlanResult<Leg>;

    /// Non-driving work such as loading.
    fn on_duty(&self, state: ScheduleState, length: Duration, remarks: &str) -> PlanResult<Leg>;

    /// Walks the fixed leg sequence: drive to pickup, load, break, drive to
    /// dropoff with fueling stops, unload, close the day.
    fn schedule(&self, args: &ScheduleArgs) -> PlanResult<DutyLog> {
        let config = self.config();
        config.validate()?;
        let limits = config.limits()?;
        let to_pickup = ensure_non_negative("distance to pickup", args.to_pickup_miles)?;
        let to_dropoff = ensure_non_negative("distance to dropoff", args.pickup_to_dropoff_miles)?;
        let cycle_used = ensure_non_negative("cycle hours used", args.cycle_used_hours)?;

        let to_pickup_time = config.driving_time(to_pickup)?;
        let used = duration_from_hours(cycle_used)?;
        let required = to_pickup_time + config.driving_time(to_dropoff)? + limits.dwell * 2;
        ensure_cycle(used, required, &limits)?;

        let fuel_plan = plan_fueling_stops(to_dropoff, config.fuel_interval_miles)?;
        let sub_legs = fuel_plan.sub_leg_times(to_dropoff, config)?;
        let pause_remarks = limits.break_remarks();

        let driving_to_dropoff = format!("Driving towards {}", args.dropoff_label);
        let mut log = Leg::start(ScheduleState::new(args.departure, used))
            .then(|s| self.drive(s, to_pickup_time, &format!("Driving towards {}", args.pickup_label)))?
            .then(|s| self.on_duty(s, limits.dwell, &format!("Pickup at {}", args.pickup_label)))?
            .then(|s| Ok(off_duty(s, limits.pause, &pause_remarks, &limits)))?;

        let mut fueling_stops = fuel_plan.stops();
        for (i, &length) in sub_legs.iter().enumerate() {
            // a fueling pair sits between consecutive sub-legs
            if i > 0 {
                let stop = &mut fueling_stops[i - 1];
                stop.date = Some(log.state.current_date);
                stop.arrival = Some(log.state.clock);
                let remarks = format!("Fueling at {}", stop.location_label);
                log = log
                    .then(|s| Ok(off_duty(s, limits.fuel_stop, &remarks, &limits)))?
                    .then(|s| Ok(off_duty(s, limits.pause, &pause_remarks, &limits)))?;
            }
            log = log.then(|s| self.drive(s, length, &driving_to_dropoff))?;
        }

        let log = log
            .then(|s| self.on_duty(s, limits.dwell, &format!("Dropoff at {}", args.dropoff_label)))?
            .then(|s| Ok(closeout(s)))?;

        Ok(DutyLog {
            segments: log.segments,
            fuel_plan,
            fueling_stops,
            final_state: log.state,
        })
    }
}

/// Fails when `length` more on-duty time would take the cycle past its limit.
pub fn ensure_cycle(used: Duration, length: Duration, limits: &Limits) -> PlanResult<()> {
    if used + length > limits.cycle {
        return Err(PlanError::CycleExceeded {
            used_hours: hours_of(used),
            required_hours: hours_of(length),
            limit_hours: hours_of(limits.cycle),
        });
    }
    Ok(())
}

/// Off-duty time. A span of at least the rest duration starts a new duty
/// period; one of at least the break duration resets the break clock.
pub fn off_duty(state: ScheduleState, length: Duration, remarks: &str, limits: &Limits) -> Leg {
    let mut leg = Leg::start(state);
    leg.push(DutyStatus::OffDuty, length, remarks);
    if length >= limits.rest {
        leg.state.reset_duty_period();
    } else if length >= limits.pause {
        leg.state.driving_since_break = Duration::zero();
    }
    leg
}

/// Ends the displayed log at midnight, unless it already ends there.
pub fn closeout(state: ScheduleState) -> Leg {
    let mut leg = Leg::start(state);
    if leg.state.clock != ClockTime::MIDNIGHT {
        let length = leg.state.clock.until_midnight();
        leg.push(
            DutyStatus::OffDuty,
            length,
            "Off duty: end of day (HOS limit closeout)",
        );
    }
    leg
}

pub fn scheduler_for(config: HosConfig) -> Box<dyn DutyScheduler> {
    match config.enforcement {
        Enforcement::Strict => Box::new(HosScheduler::new(config)),
        Enforcement::StopCadence => Box::new(CadenceScheduler::new(config)),
    }
}

use chrono::Duration;
use serde::Serialize;

use crate::{
    error::{ensure_non_negative, PlanError, PlanResult},
    model::trip_plan::FuelingStop,
};

use super::HosConfig;

/// More stops than this on a single leg is treated as a bad request.
pub const MAX_FUEL_STOPS: usize = 10_000;

/// Where the truck has to stop for fuel on one leg.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuelPlan {
    pub stop_count: usize,
    /// Cumulative distance of each stop from the start of the leg, ascending.
    pub stop_distances: Vec<f64>,
}

impl FuelPlan {
    /// Driving time of each sub-leg. Rounded on the cumulative distance so the
    /// parts add up to the driving time of the whole leg.
    pub fn sub_leg_times(
        &self,
        total_distance_miles: f64,
        config: &HosConfig,
    ) -> PlanResult<Vec<Duration>> {
        let mut previous = Duration::zero();
        self.stop_distances
            .iter()
            .chain(Some(&total_distance_miles))
            .map(|&distance| {
                let at = config.driving_time(distance)?;
                let length = at - previous;
                previous = at;
                Ok(length)
            })
            .collect()
    }

    pub fn stops(&self) -> Vec<FuelingStop> {
        self.stop_distances
            .iter()
            .copied()
            .map(FuelingStop::at_mile)
            .collect()
    }
}

/// One stop per full `fuel_interval_miles`, spread evenly over the leg so that
/// no stop falls on either end.
pub fn plan_fueling_stops(total_distance_miles: f64, fuel_interval_miles: f64) -> PlanResult<FuelPlan> {
    let total = ensure_non_negative("leg distance", total_distance_miles)?;
    if !(fuel_interval_miles.is_finite() && fuel_interval_miles > 0.0) {
        return Err(PlanError::invalid(
            "fuel interval",
            fuel_interval_miles,
            "must be a positive number of miles",
        ));
    }

    let needed = (total / fuel_interval_miles).floor();
    if needed > MAX_FUEL_STOPS as f64 {
        return Err(PlanError::invalid(
            "leg distance",
            total,
            "needs more fueling stops than a single leg allows",
        ));
    }
    let stop_count = needed as usize;
    let distance_per_stop = total / (stop_count + 1) as f64;
    let stop_distances = (1..=stop_count)
        .map(|i| i as f64 * distance_per_stop)
        .collect();
    Ok(FuelPlan {
        stop_count,
        stop_distances,
    })
}

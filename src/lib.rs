pub mod callbacks;
pub mod config;
pub mod error;
pub mod model;
pub mod planner;
pub mod routing;
pub mod schedule;
pub mod utils;

pub use error::{PlanError, PlanResult};
pub use planner::{plan_trip, TripPlanner};

//! Command-line interface of the planner binary.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "hos_trip_planner",
    about = "Plan truck trips with Hours-of-Service duty logs"
)]
pub struct Cli {
    /// JSON file with HOS rules, overriding HOS_RULES_PATH
    #[arg(long, global = true)]
    pub rules: Option<PathBuf>,

    /// Run legs at full length and rely on the fueling cadence for the daily caps
    #[arg(long, global = true)]
    pub cadence: bool,

    /// Also write every plan under logs/<LOG_NAME>/
    #[arg(long, global = true)]
    pub log_name: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Plan a trip between three addresses
    Plan {
        #[arg(long)]
        current: String,
        #[arg(long)]
        pickup: String,
        #[arg(long)]
        dropoff: String,
        /// On-duty hours already used in the 8-day window
        #[arg(long, default_value_t = 0.0)]
        cycle_used: f64,
        /// Departure as YYYY-MM-DDTHH:MM, defaults to now
        #[arg(long, value_parser = parse_departure)]
        departure: Option<NaiveDateTime>,
        /// Use the offline mock instead of OpenRouteService
        #[arg(long)]
        offline: bool,
    },
    /// Plan from already known leg distances in miles
    Distances {
        #[arg(long)]
        to_pickup: f64,
        #[arg(long)]
        to_dropoff: f64,
        #[arg(long, default_value_t = 0.0)]
        cycle_used: f64,
        #[arg(long, value_parser = parse_departure)]
        departure: Option<NaiveDateTime>,
        /// Print the strict and the cadence schedule side by side
        #[arg(long)]
        compare: bool,
    },
    /// Plan every trip of a CSV file
    Batch {
        path: PathBuf,
        #[arg(long, value_parser = parse_departure)]
        departure: Option<NaiveDateTime>,
        #[arg(long)]
        offline: bool,
    },
}

pub fn parse_departure(s: &str) -> Result<NaiveDateTime, String> {
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .ok_or_else(|| format!("expected YYYY-MM-DDTHH:MM, got {s:?}"))
}

mod cli;

use anyhow::Context as _;
use chrono::{Local, NaiveDateTime};
use clap::Parser;
use hos_trip_planner::{
    callbacks::log_plan::LogPlanCallback,
    config::AppConfig,
    model::trip::TripRequest,
    planner::{callback::PlanCallback, TripPlanner},
    routing::{mock::MockRouting, openroute::OpenRouteServiceClient, Geocoder, RouteProvider},
    schedule::{Enforcement, HosConfig, ScheduleArgs},
};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    if let Some(path) = &cli.rules {
        config.rules = HosConfig::load(path)?;
    }
    if cli.cadence {
        config.rules.enforcement = Enforcement::StopCadence;
    }

    let callbacks: Vec<Box<dyn PlanCallback>> = cli
        .log_name
        .map(|name| Box::new(LogPlanCallback::new(name)) as Box<dyn PlanCallback>)
        .into_iter()
        .collect();
    let mut planner = TripPlanner::new(config.rules.clone(), callbacks);

    match cli.command {
        Command::Plan {
            current,
            pickup,
            dropoff,
            cycle_used,
            departure,
            offline,
        } => {
            let trip = TripRequest {
                current_location: current,
                pickup_location: pickup,
                dropoff_location: dropoff,
                cycle_used,
            };
            let (geocoder, router) = collaborators(&config, offline)?;
            let plan = planner.plan_route(
                &trip,
                departure_or_now(departure),
                geocoder.as_ref(),
                router.as_ref(),
            )?;
            print_json(&plan)
        }
        Command::Distances {
            to_pickup,
            to_dropoff,
            cycle_used,
            departure,
            compare,
        } => {
            let args = ScheduleArgs {
                departure: departure_or_now(departure),
                to_pickup_miles: to_pickup,
                pickup_to_dropoff_miles: to_dropoff,
                cycle_used_hours: cycle_used,
                pickup_label: "pickup".into(),
                dropoff_label: "dropoff".into(),
            };
            if compare {
                let with = |enforcement| {
                    planner
                        .fork(HosConfig {
                            enforcement,
                            ..config.rules.clone()
                        })
                        .plan(&args)
                };
                let strict = with(Enforcement::Strict)?;
                let cadence = with(Enforcement::StopCadence)?;
                print_json(&json!({ "strict": strict, "cadence": cadence }))
            } else {
                print_json(&planner.plan(&args)?)
            }
        }
        Command::Batch {
            path,
            departure,
            offline,
        } => {
            let trips = TripRequest::load(&path)
                .with_context(|| format!("unable to load trips from {}", path.display()))?;
            info!("planning {} trips from {}", trips.len(), path.display());
            let (geocoder, router) = collaborators(&config, offline)?;
            let departure = departure_or_now(departure);

            let mut results = Vec::with_capacity(trips.len());
            for trip in &trips {
                match planner.plan_route(trip, departure, geocoder.as_ref(), router.as_ref()) {
                    Ok(plan) => results.push(json!({ "trip": trip, "plan": plan })),
                    Err(err) => {
                        let err = anyhow::Error::from(err);
                        warn!("{trip}: {err:#}");
                        results.push(json!({ "trip": trip, "error": format!("{err:#}") }));
                    }
                }
            }
            print_json(&results)
        }
    }
}

fn departure_or_now(departure: Option<NaiveDateTime>) -> NaiveDateTime {
    departure.unwrap_or_else(|| Local::now().naive_local())
}

fn collaborators(
    config: &AppConfig,
    offline: bool,
) -> anyhow::Result<(Box<dyn Geocoder>, Box<dyn RouteProvider>)> {
    match (&config.ors_api_key, offline) {
        (Some(key), false) => {
            let client = OpenRouteServiceClient::new(&config.ors_url, key, config.http_timeout)?;
            Ok((Box::new(client.clone()), Box::new(client)))
        }
        (None, false) => {
            warn!("OPENROUTESERVICE_API_KEY is not set, using the offline mock router");
            Ok((Box::new(MockRouting::new()), Box::new(MockRouting::new())))
        }
        (_, true) => Ok((Box::new(MockRouting::new()), Box::new(MockRouting::new()))),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    serde_json::to_writer_pretty(stdout.lock(), value)?;
    println!();
    Ok(())
}

pub mod callback;

use std::time::Instant;

use chrono::{Duration, Local, NaiveDateTime};
use humantime::format_duration;
use tracing::info;

use crate::{
    error::{PlanError, PlanResult},
    model::{
        duty_segment::{DutySegment, DutyStatus},
        route_info::RouteInfo,
        trip::TripRequest,
        trip_plan::{DailyLog, TripPlan},
    },
    routing::{haversine_miles, interpolate_along_route, Geocoder, RouteProvider},
    schedule::{scheduler_for, DutyLog, DutyScheduler, HosConfig, ScheduleArgs},
    utils::hours_of,
};

use self::callback::PlanCallback;

/// Plans a trip from resolved distances with the default rules, departing now.
pub fn plan_trip(
    to_pickup_miles: f64,
    pickup_to_dropoff_miles: f64,
    cycle_used_hours: f64,
) -> PlanResult<TripPlan> {
    let args = ScheduleArgs {
        departure: Local::now().naive_local(),
        to_pickup_miles,
        pickup_to_dropoff_miles,
        cycle_used_hours,
        pickup_label: "pickup".into(),
        dropoff_label: "dropoff".into(),
    };
    TripPlanner::new(HosConfig::default(), vec![]).plan(&args)
}

pub struct TripPlanner {
    config: HosConfig,
    scheduler: Box<dyn DutyScheduler>,
    callbacks: Vec<Box<dyn PlanCallback>>,
}

impl TripPlanner {
    pub fn new(config: HosConfig, callbacks: Vec<Box<dyn PlanCallback>>) -> Self {
        Self {
            scheduler: scheduler_for(config.clone()),
            config,
            callbacks,
        }
    }

    pub fn config(&self) -> &HosConfig {
        &self.config
    }

    /// A planner with the same observers but different rules.
    pub fn fork(&self, config: HosConfig) -> Self {
        Self::new(config, self.callbacks.clone())
    }

    pub fn plan(&mut self, args: &ScheduleArgs) -> PlanResult<TripPlan> {
        self.plan_with_route(args, None)
    }

    /// Resolves the three addresses, routes through them and plans the result.
    pub fn plan_route(
        &mut self,
        trip: &TripRequest,
        departure: NaiveDateTime,
        geocoder: &dyn Geocoder,
        router: &dyn RouteProvider,
    ) -> PlanResult<TripPlan> {
        info!(
            geocoder = geocoder.name(),
            router = router.name(),
            "planning {trip}"
        );
        let waypoints = [
            geocoder.geocode(&trip.current_location)?,
            geocoder.geocode(&trip.pickup_location)?,
            geocoder.geocode(&trip.dropoff_location)?,
        ];
        let route = router.compute_route(&waypoints)?;
        let &[to_pickup_miles, pickup_to_dropoff_miles] = route.leg_distances_miles.as_slice() else {
            return Err(PlanError::Routing(anyhow::anyhow!(
                "expected 2 route legs, got {}",
                route.leg_distances_miles.len()
            )));
        };

        let args = ScheduleArgs {
            departure,
            to_pickup_miles,
            pickup_to_dropoff_miles,
            cycle_used_hours: trip.cycle_used,
            pickup_label: trip.pickup_location.clone(),
            dropoff_label: trip.dropoff_location.clone(),
        };
        self.plan_with_route(&args, Some(&route))
    }

    fn plan_with_route(
        &mut self,
        args: &ScheduleArgs,
        route: Option<&RouteInfo>,
    ) -> PlanResult<TripPlan> {
        let start = Instant::now();
        self.callbacks
            .iter_mut()
            .for_each(|cb| cb.visit_plan_input(args));

        let plan = match self
            .scheduler
            .schedule(args)
            .and_then(|log| assemble(args, log, route, &self.config))
        {
            Ok(plan) => plan,
            Err(err) => {
                self.callbacks
                    .iter_mut()
                    .for_each(|cb| cb.visit_plan_failure(args, &err));
                return Err(err);
            }
        };

        info!(
            segments = plan.segments.len(),
            days = plan.daily_logs.len(),
            driving_hours = plan.total_driving_time,
            remaining_cycle_hours = plan.remaining_cycle_hours,
            "trip planned in {}",
            format_duration(start.elapsed())
        );
        self.callbacks
            .iter_mut()
            .for_each(|cb| cb.visit_plan_output(&plan));
        Ok(plan)
    }
}

fn total_time(segments: &[DutySegment], include: impl Fn(DutyStatus) -> bool) -> Duration {
    segments
        .iter()
        .filter(|s| include(s.status))
        .map(DutySegment::duration)
        .sum()
}

/// Packages the schedule with totals, stop positions and route geometry.
fn assemble(
    args: &ScheduleArgs,
    log: DutyLog,
    route: Option<&RouteInfo>,
    config: &HosConfig,
) -> PlanResult<TripPlan> {
    let driving = hours_of(total_time(&log.segments, |s| s == DutyStatus::Driving));
    let on_duty = hours_of(total_time(&log.segments, |s| s.is_on_duty()));

    let mut fueling_stops = log.fueling_stops;
    if let Some(route) = route {
        // stop mileage is road distance; the polyline is measured as the crow flies
        let polyline_miles: f64 = route
            .polyline
            .windows(2)
            .map(|w| haversine_miles(&w[0], &w[1]))
            .sum();
        let scale = if route.distance_miles > 0.0 && polyline_miles > 0.0 {
            polyline_miles / route.distance_miles
        } else {
            1.0
        };
        for stop in fueling_stops.iter_mut() {
            let along = (args.to_pickup_miles + stop.approx_distance_miles) * scale;
            stop.coordinates = Some(interpolate_along_route(&route.polyline, along)?);
        }
    }

    let mut daily_logs = DailyLog::from_segments(&log.segments);
    DailyLog::attach_fueling_stops(&mut daily_logs, &fueling_stops);

    Ok(TripPlan {
        daily_logs,
        segments: log.segments,
        fueling_stops,
        route: route.map(RouteInfo::geometry),
        total_distance: route
            .map(|r| r.distance_miles)
            .unwrap_or(args.to_pickup_miles + args.pickup_to_dropoff_miles),
        total_driving_time: driving,
        total_on_duty_time: on_duty,
        remaining_cycle_hours: config.cycle_limit_hours - args.cycle_used_hours - on_duty,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use anyhow::anyhow;
    use chrono::NaiveDate;

    use crate::{
        model::{duty_segment::check_contiguous, Coordinates},
        routing::mock::MockRouting,
        schedule::Enforcement,
    };

    use super::*;

    #[derive(Clone, Default)]
    struct Recorder {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl PlanCallback for Recorder {
        fn visit_plan_input(&mut self, input: &ScheduleArgs) {
            self.events
                .lock()
                .unwrap()
                .push(format!("input {}", input.pickup_to_dropoff_miles));
        }

        fn visit_plan_output(&mut self, plan: &TripPlan) {
            self.events
                .lock()
                .unwrap()
                .push(format!("output {}", plan.segments.len()));
        }

        fn visit_plan_failure(&mut self, input: &ScheduleArgs, _err: &PlanError) {
            self.events
                .lock()
                .unwrap()
                .push(format!("failed {}", input.pickup_to_dropoff_miles));
        }
    }

    struct NowhereGeocoder;

    impl Geocoder for NowhereGeocoder {
        fn geocode(&self, address: &str) -> PlanResult<Coordinates> {
            Err(PlanError::Geocoding {
                address: address.to_string(),
                source: anyhow!("geocoder answered 404 Not Found"),
            })
        }

        fn name(&self) -> &str {
            "nowhere"
        }
    }

    fn args(to_pickup: f64, to_dropoff: f64, cycle_used: f64) -> ScheduleArgs {
        ScheduleArgs {
            departure: NaiveDate::from_ymd_opt(2026, 7, 1)
                .unwrap()
                .and_hms_opt(6, 0, 0)
                .unwrap(),
            to_pickup_miles: to_pickup,
            pickup_to_dropoff_miles: to_dropoff,
            cycle_used_hours: cycle_used,
            pickup_label: "Gary, IN".into(),
            dropoff_label: "Dallas, TX".into(),
        }
    }

    #[test]
    fn test_totals_for_reference_trip() {
        for enforcement in [Enforcement::Strict, Enforcement::StopCadence] {
            let config = HosConfig {
                enforcement,
                ..Default::default()
            };
            let plan = TripPlanner::new(config, vec![])
                .plan(&args(50.0, 1200.0, 10.0))
                .unwrap();
            check_contiguous(&plan.segments).unwrap();

            let expected_driving = (50.0 + 1200.0) / 60.0;
            assert!((plan.total_driving_time - expected_driving).abs() < 1e-9);
            assert!((plan.total_on_duty_time - (expected_driving + 2.0)).abs() < 1e-9);
            assert!(
                (plan.remaining_cycle_hours - (70.0 - 10.0 - expected_driving - 2.0)).abs() < 1e-9
            );
            assert_eq!(plan.total_distance, 1250.0);
            assert_eq!(plan.fueling_stops.len(), 1);
            assert!(plan.fueling_stops[0].coordinates.is_none());
            assert!(plan.route.is_none());
            assert_eq!(plan.daily_logs.len(), 2);
            assert_eq!(plan.daily_logs[0].fueling_stops, plan.fueling_stops);
            assert!(plan.daily_logs[1].fueling_stops.is_empty());
            assert_eq!(
                plan.time_in(DutyStatus::OnDutyNotDriving),
                Duration::hours(2)
            );
        }
    }

    #[test]
    fn test_callbacks_see_input_and_output() {
        let recorder = Recorder::default();
        let events = recorder.events.clone();
        let mut planner = TripPlanner::new(HosConfig::default(), vec![Box::new(recorder)]);

        planner.plan(&args(10.0, 100.0, 0.0)).unwrap();
        assert!(planner.plan(&args(0.0, 300.0, 69.5)).is_err());

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0], "input 100");
        assert!(events[1].starts_with("output "));
        assert_eq!(events[2], "input 300");
        assert_eq!(events[3], "failed 300");
    }

    #[test]
    fn test_fork_keeps_callbacks() {
        let recorder = Recorder::default();
        let events = recorder.events.clone();
        let planner = TripPlanner::new(HosConfig::default(), vec![Box::new(recorder)]);
        let mut cadence = planner.fork(HosConfig {
            enforcement: Enforcement::StopCadence,
            ..Default::default()
        });
        assert_eq!(cadence.config().enforcement, Enforcement::StopCadence);
        cadence.plan(&args(10.0, 100.0, 0.0)).unwrap();
        assert_eq!(events.lock().unwrap().len(), 2);
    }

    struct FixedGeocoder;

    impl Geocoder for FixedGeocoder {
        fn geocode(&self, address: &str) -> PlanResult<Coordinates> {
            match address {
                "Chicago, IL" => Ok(Coordinates::new(41.8781, -87.6298)),
                "Gary, IN" => Ok(Coordinates::new(41.5934, -87.3464)),
                "Dallas, TX" => Ok(Coordinates::new(32.7767, -96.7970)),
                _ => NowhereGeocoder.geocode(address),
            }
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_plan_route_with_mock_router() {
        let trip = TripRequest {
            current_location: "Chicago, IL".into(),
            pickup_location: "Gary, IN".into(),
            dropoff_location: "Dallas, TX".into(),
            cycle_used: 5.0,
        };
        let departure = args(0.0, 0.0, 0.0).departure;
        let plan = TripPlanner::new(HosConfig::default(), vec![])
            .plan_route(&trip, departure, &FixedGeocoder, &MockRouting::new())
            .unwrap();
        check_contiguous(&plan.segments).unwrap();

        let route = plan.route.as_ref().unwrap();
        assert_eq!(route.coordinates.len(), 3);
        assert!(plan.total_distance > 1000.0);
        assert_eq!(plan.fueling_stops.len(), 1);
        let stop = plan.fueling_stops[0].coordinates.unwrap();
        assert!(stop.lat > 32.7767 && stop.lat < 41.5934, "{stop:?}");
        assert_eq!(plan.segments[1].remarks, "Pickup at Gary, IN");
    }

    #[test]
    fn test_geocoding_errors_propagate() {
        let mock = MockRouting::new();
        let trip = TripRequest {
            current_location: "A".into(),
            pickup_location: "B".into(),
            dropoff_location: "C".into(),
            cycle_used: 0.0,
        };
        let err = TripPlanner::new(HosConfig::default(), vec![])
            .plan_route(&trip, args(0.0, 0.0, 0.0).departure, &NowhereGeocoder, &mock)
            .unwrap_err();
        assert!(matches!(err, PlanError::Geocoding { ref address, .. } if address == "A"));
    }

    #[test]
    fn test_plan_trip_defaults() {
        let plan = plan_trip(50.0, 1200.0, 0.0).unwrap();
        check_contiguous(&plan.segments).unwrap();
        assert!(matches!(
            plan_trip(0.0, 300.0, 69.5),
            Err(PlanError::CycleExceeded { .. })
        ));
        assert!(matches!(
            plan_trip(-3.0, 300.0, 0.0),
            Err(PlanError::InvalidInput { .. })
        ));
        assert!(matches!(
            plan_trip(1e18, 0.0, 0.0),
            Err(PlanError::InvalidInput { .. })
        ));
        assert!(matches!(
            plan_trip(0.0, 1e15, 0.0),
            Err(PlanError::InvalidInput { .. })
        ));
    }
}

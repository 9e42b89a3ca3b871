use std::hash::{DefaultHasher, Hash, Hasher};

use anyhow::anyhow;
use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::{
    error::{PlanError, PlanResult},
    model::{route_info::RouteInfo, Coordinates},
};

use super::{haversine_miles, Geocoder, RouteProvider};

/// Offline stand-in for the geocoding and routing services.
///
/// Addresses map to stable pseudo-random points inside the continental US;
/// routes are straight lines stretched by a road coefficient.
#[derive(Debug, Clone)]
pub struct MockRouting {
    road_coefficient: f64,
    average_speed_mph: f64,
}

impl Default for MockRouting {
    fn default() -> Self {
        Self {
            road_coefficient: 1.3,
            average_speed_mph: 60.0,
        }
    }
}

impl MockRouting {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Geocoder for MockRouting {
    fn geocode(&self, address: &str) -> PlanResult<Coordinates> {
        let normalized = address.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(PlanError::Geocoding {
                address: address.to_string(),
                source: anyhow!("no results"),
            });
        }
        let mut hasher = DefaultHasher::new();
        normalized.hash(&mut hasher);
        let mut rng = SmallRng::seed_from_u64(hasher.finish());
        Ok(Coordinates::new(
            rng.random_range(30.0..47.0),
            rng.random_range(-120.0..-75.0),
        ))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

impl RouteProvider for MockRouting {
    fn compute_route(&self, waypoints: &[Coordinates]) -> PlanResult<RouteInfo> {
        if waypoints.len() < 2 {
            return Err(PlanError::Routing(anyhow!(
                "need at least two waypoints, got {}",
                waypoints.len()
            )));
        }
        let leg_distances_miles: Vec<f64> = waypoints
            .windows(2)
            .map(|w| haversine_miles(&w[0], &w[1]) * self.road_coefficient)
            .collect();
        let distance_miles: f64 = leg_distances_miles.iter().sum();
        Ok(RouteInfo {
            polyline: waypoints.to_vec(),
            distance_miles,
            duration_hours: distance_miles / self.average_speed_mph,
            leg_distances_miles,
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_geocoder_is_deterministic() {
        let mock = MockRouting::new();
        let a = mock.geocode("Chicago, IL").unwrap();
        let b = mock.geocode("  chicago, il ").unwrap();
        assert_eq!(a, b);
        assert!((30.0..47.0).contains(&a.lat));
        assert!((-120.0..-75.0).contains(&a.lon));

        let c = mock.geocode("Dallas, TX").unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_mock_geocoder_rejects_empty_address() {
        let err = MockRouting::new().geocode("   ").unwrap_err();
        assert!(matches!(err, PlanError::Geocoding { .. }));
    }

    #[test]
    fn test_mock_route_legs() {
        let mock = MockRouting::new();
        let points = [
            Coordinates::new(40.0, -100.0),
            Coordinates::new(40.0, -99.0),
            Coordinates::new(41.0, -99.0),
        ];
        let route = mock.compute_route(&points).unwrap();
        assert_eq!(route.leg_distances_miles.len(), 2);
        let sum: f64 = route.leg_distances_miles.iter().sum();
        assert!((route.distance_miles - sum).abs() < 1e-9);
        assert!((route.duration_hours - route.distance_miles / 60.0).abs() < 1e-9);
        assert!(matches!(
            mock.compute_route(&points[..1]),
            Err(PlanError::Routing(_))
        ));
    }
}

use serde::Serialize;

use super::Coordinates;

/// Road route through an ordered list of waypoints.
#[derive(Debug, Clone, Serialize)]
pub struct RouteInfo {
    pub polyline: Vec<Coordinates>,
    pub distance_miles: f64,
    pub duration_hours: f64,
    /// Distance between consecutive waypoints; one entry per leg.
    pub leg_distances_miles: Vec<f64>,
}

impl RouteInfo {
    pub fn geometry(&self) -> RouteGeometry {
        RouteGeometry::from_coordinates(&self.polyline)
    }
}

/// Route polyline in GeoJSON `[lon, lat]` order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteGeometry {
    pub coordinates: Vec<[f64; 2]>,
}

impl RouteGeometry {
    pub fn from_coordinates(coords: &[Coordinates]) -> Self {
        Self {
            coordinates: coords.iter().map(|c| [c.lon, c.lat]).collect(),
        }
    }
}

#[test]
fn test_geometry_is_lon_lat() {
    let route = RouteInfo {
        polyline: vec![Coordinates::new(41.88, -87.63), Coordinates::new(32.78, -96.8)],
        distance_miles: 925.0,
        duration_hours: 14.0,
        leg_distances_miles: vec![925.0],
    };
    assert_eq!(
        route.geometry().coordinates,
        vec![[-87.63, 41.88], [-96.8, 32.78]]
    );
}

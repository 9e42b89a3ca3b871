//! Collaborators that turn addresses into coordinates and coordinates into
//! road routes, plus placement of points along a route.

pub mod mock;
pub mod openroute;

use crate::{
    error::{PlanError, PlanResult},
    model::{route_info::RouteInfo, Coordinates},
};

pub const EARTH_RADIUS_MILES: f64 = 3958.8;
pub const METERS_PER_MILE: f64 = 1609.34;

pub trait Geocoder {
    /// Fails with [`PlanError::Geocoding`] when nothing matches.
    fn geocode(&self, address: &str) -> PlanResult<Coordinates>;

    fn name(&self) -> &str;
}

pub trait RouteProvider {
    /// Road route visiting `waypoints` in order.
    fn compute_route(&self, waypoints: &[Coordinates]) -> PlanResult<RouteInfo>;

    fn name(&self) -> &str;
}

/// Great-circle distance in miles.
pub fn haversine_miles(from: &Coordinates, to: &Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lon - from.lon).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * a.sqrt().asin()
}

/// Point `target_miles` along `polyline`, linearly interpolated inside the
/// segment it falls on. Past the end of the line the last point is returned.
pub fn interpolate_along_route(polyline: &[Coordinates], target_miles: f64) -> PlanResult<Coordinates> {
    let (first, last) = match (polyline.first(), polyline.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => {
            return Err(PlanError::invalid(
                "polyline",
                "[]",
                "needs at least one point",
            ))
        }
    };
    if target_miles.is_nan() || target_miles <= 0.0 {
        return Ok(first);
    }

    let mut travelled = 0.0;
    for pair in polyline.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let length = haversine_miles(a, b);
        if travelled + length >= target_miles && length > 0.0 {
            let fraction = (target_miles - travelled) / length;
            return Ok(Coordinates::new(
                a.lat + (b.lat - a.lat) * fraction,
                a.lon + (b.lon - a.lon) * fraction,
            ));
        }
        travelled += length;
    }
    Ok(last)
}

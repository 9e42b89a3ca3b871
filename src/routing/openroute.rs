use std::time::Duration;

use anyhow::{anyhow, Context as _};
use reqwest::{blocking::Client, header::AUTHORIZATION};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::{
    error::{PlanError, PlanResult},
    model::{route_info::RouteInfo, Coordinates},
};

use super::{Geocoder, RouteProvider, METERS_PER_MILE};

/// Blocking client for the OpenRouteService geocoding and HGV directions APIs.
#[derive(Clone)]
pub struct OpenRouteServiceClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl OpenRouteServiceClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hos_trip_planner/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("unable to create HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    fn search(&self, address: &str) -> anyhow::Result<GeocodeResponse> {
        let response = self
            .client
            .get(format!("{}/geocode/search", self.base_url))
            .query(&[("api_key", self.api_key.as_str()), ("text", address), ("size", "1")])
            .send()
            .context("geocoding request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(anyhow!("geocoder answered {status}: {body}"));
        }
        response.json().context("unable to parse geocoding response")
    }

    fn directions(&self, waypoints: &[Coordinates]) -> anyhow::Result<DirectionsResponse> {
        let coordinates: Vec<[f64; 2]> = waypoints.iter().map(|c| [c.lon, c.lat]).collect();
        let response = self
            .client
            .post(format!(
                "{}/v2/directions/driving-hgv/geojson",
                self.base_url
            ))
            .header(AUTHORIZATION, &self.api_key)
            .json(&json!({ "coordinates": coordinates }))
            .send()
            .context("directions request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(anyhow!("router answered {status}: {body}"));
        }
        response.json().context("unable to parse directions response")
    }
}

impl Geocoder for OpenRouteServiceClient {
    fn geocode(&self, address: &str) -> PlanResult<Coordinates> {
        debug!(address, "geocoding");
        self.search(address)
            .and_then(GeocodeResponse::first_point)
            .map_err(|source| PlanError::Geocoding {
                address: address.to_string(),
                source,
            })
    }

    fn name(&self) -> &str {
        "openrouteservice"
    }
}

impl RouteProvider for OpenRouteServiceClient {
    fn compute_route(&self, waypoints: &[Coordinates]) -> PlanResult<RouteInfo> {
        let route = self
            .directions(waypoints)
            .and_then(DirectionsResponse::into_route)
            .map_err(PlanError::Routing)?;
        info!(
            distance_miles = route.distance_miles,
            duration_hours = route.duration_hours,
            points = route.polyline.len(),
            "route computed"
        );
        Ok(route)
    }

    fn name(&self) -> &str {
        "openrouteservice"
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    features: Vec<PointFeature>,
}

#[derive(Debug, Deserialize)]
struct PointFeature {
    geometry: PointGeometry,
}

#[derive(Debug, Deserialize)]
struct PointGeometry {
    coordinates: Vec<f64>,
}

impl GeocodeResponse {
    fn first_point(self) -> anyhow::Result<Coordinates> {
        let feature = self
            .features
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no results"))?;
        match feature.geometry.coordinates.as_slice() {
            [lon, lat, ..] => Ok(Coordinates::new(*lat, *lon)),
            other => Err(anyhow!("malformed point {other:?}")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    features: Vec<RouteFeature>,
}

#[derive(Debug, Deserialize)]
struct RouteFeature {
    geometry: LineGeometry,
    properties: RouteProperties,
}

#[derive(Debug, Deserialize)]
struct LineGeometry {
    coordinates: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct RouteProperties {
    summary: Summary,
    #[serde(default)]
    segments: Vec<Summary>,
}

/// Meters and seconds.
#[derive(Debug, Deserialize)]
struct Summary {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

impl DirectionsResponse {
    fn into_route(self) -> anyhow::Result<RouteInfo> {
        let feature = self
            .features
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no route found"))?;
        let polyline = feature
            .geometry
            .coordinates
            .iter()
            .map(|point| match point.as_slice() {
                [lon, lat, ..] => Ok(Coordinates::new(*lat, *lon)),
                other => Err(anyhow!("malformed route point {other:?}")),
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        let summary = &feature.properties.summary;
        Ok(RouteInfo {
            polyline,
            distance_miles: summary.distance / METERS_PER_MILE,
            duration_hours: summary.duration / 3600.0,
            leg_distances_miles: feature
                .properties
                .segments
                .iter()
                .map(|s| s.distance / METERS_PER_MILE)
                .collect(),
        })
    }
}

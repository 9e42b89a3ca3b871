use std::{fmt::Display, path::Path};

use serde::{Deserialize, Serialize};

use super::read_csv;

/// A trip as entered by the dispatcher: three free-form addresses and the
/// on-duty hours the driver already used in the current 8-day window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    pub current_location: String,
    pub pickup_location: String,
    pub dropoff_location: String,
    #[serde(default)]
    pub cycle_used: f64,
}

impl TripRequest {
    /// Reads a CSV with the columns
    /// `current_location,pickup_location,dropoff_location,cycle_used`.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Vec<TripRequest>> {
        read_csv(path)
    }
}

impl Display for TripRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Trip from {} to {} via {}",
            self.current_location, self.dropoff_location, self.pickup_location
        )
    }
}

#[test]
fn test_load_trip_requests() {
    let path = std::env::temp_dir().join(format!("trips_{}.csv", std::process::id()));
    std::fs::write(
        &path,
        "current_location,pickup_location,dropoff_location,cycle_used\n\
         \"Chicago, IL\",\"Gary, IN\",\"Dallas, TX\",12.5\n\
         Denver,Boulder,Phoenix,0\n",
    )
    .unwrap();

    let trips = TripRequest::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(trips.len(), 2);
    assert_eq!(trips[0].current_location, "Chicago, IL");
    assert_eq!(trips[0].cycle_used, 12.5);
    assert_eq!(trips[1].dropoff_location, "Phoenix");
    assert_eq!(
        trips[1].to_string(),
        "Trip from Denver to Phoenix via Boulder"
    );
}

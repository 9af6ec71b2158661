use geo_types::Point;
use serde::{Deserialize, Serialize};

use crate::{distance::is_valid_position, loose};

/// One stop on a route, in the order the service lists them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Stop {
    #[serde(rename = "location_name", default, deserialize_with = "loose::text")]
    pub name: Option<String>,
    #[serde(rename = "lat", default, deserialize_with = "loose::coordinate")]
    pub latitude: Option<f64>,
    #[serde(rename = "lon", default, deserialize_with = "loose::coordinate")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "loose::text")]
    pub arrival_time: Option<String>,
    #[serde(default, deserialize_with = "loose::text")]
    pub departure_time: Option<String>,
    #[serde(rename = "stop_sequence", default, deserialize_with = "loose::sequence")]
    pub sequence: Option<u32>,
}

impl Stop {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: Some(name.into()),
            latitude: Some(latitude),
            longitude: Some(longitude),
            ..Default::default()
        }
    }

    pub fn with_times(mut self, arrival: impl Into<String>, departure: impl Into<String>) -> Self {
        self.arrival_time = Some(arrival.into());
        self.departure_time = Some(departure.into());
        self
    }

    /// The stop's coordinates, if both are present and on the globe.
    pub fn position(&self) -> Option<Point> {
        let point = Point::new(self.longitude?, self.latitude?);
        is_valid_position(point).then_some(point)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed stop")
    }

    pub fn arrival_or_na(&self) -> &str {
        self.arrival_time.as_deref().unwrap_or("N/A")
    }

    pub fn departure_or_na(&self) -> &str {
        self.departure_time.as_deref().unwrap_or("N/A")
    }
}

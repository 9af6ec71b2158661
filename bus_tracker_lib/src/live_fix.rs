use chrono::{DateTime, Utc};
use geo_types::Point;
use serde::{Deserialize, Serialize};

/// A driver location sample. Superseded by the next one; never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveFix {
    pub position: Point,
    pub timestamp: DateTime<Utc>,
    pub bus_id: Option<String>,
}

impl LiveFix {
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            position: Point::new(longitude, latitude),
            timestamp,
            bus_id: None,
        }
    }

    pub fn tagged(mut self, bus_id: impl Into<String>) -> Self {
        self.bus_id = Some(bus_id.into());
        self
    }

    pub fn latitude(&self) -> f64 {
        self.position.y()
    }

    pub fn longitude(&self) -> f64 {
        self.position.x()
    }

    /// Untagged fixes belong to whichever bus is being watched.
    pub fn is_for(&self, bus_id: Option<&str>) -> bool {
        match (&self.bus_id, bus_id) {
            (Some(tag), Some(id)) => tag == id,
            _ => true,
        }
    }
}

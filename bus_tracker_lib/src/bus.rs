use serde::{Deserialize, Serialize};

use crate::{loose, stop::Stop};

/// A bus and its route as returned by the route service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Bus {
    #[serde(default, deserialize_with = "loose::text")]
    pub bus_id: Option<String>,
    #[serde(default, deserialize_with = "loose::text")]
    pub route_id: Option<String>,
    #[serde(default, deserialize_with = "loose::text")]
    pub route_name: Option<String>,
    #[serde(default, deserialize_with = "loose::text")]
    pub driver_id: Option<String>,
    #[serde(default, deserialize_with = "loose::text")]
    pub direction: Option<String>,
    #[serde(default, deserialize_with = "loose::text")]
    pub src: Option<String>,
    #[serde(default, deserialize_with = "loose::text")]
    pub dest: Option<String>,
    #[serde(default, deserialize_with = "loose::list")]
    pub stops: Vec<Stop>,
}

/// Partial bus metadata pushed over the live channel. Present fields replace the bus's.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BusUpdate {
    #[serde(default, deserialize_with = "loose::text")]
    pub bus_id: Option<String>,
    #[serde(default, deserialize_with = "loose::text")]
    pub route_id: Option<String>,
    #[serde(default, deserialize_with = "loose::text")]
    pub route_name: Option<String>,
    #[serde(default, deserialize_with = "loose::text")]
    pub driver_id: Option<String>,
    #[serde(default, deserialize_with = "loose::text")]
    pub direction: Option<String>,
    #[serde(default, deserialize_with = "loose::text")]
    pub src: Option<String>,
    #[serde(default, deserialize_with = "loose::text")]
    pub dest: Option<String>,
    #[serde(default)]
    pub stops: Option<Vec<Stop>>,
}

impl Bus {
    pub fn new(bus_id: impl Into<String>, route_name: impl Into<String>, stops: Vec<Stop>) -> Self {
        Self {
            bus_id: Some(bus_id.into()),
            route_name: Some(route_name.into()),
            stops,
            ..Default::default()
        }
    }

    /// The service answers an unknown bus number with `route_id: 0, bus_id: 0`.
    pub fn is_not_found(&self) -> bool {
        self.bus_id.as_deref() == Some("0") && self.route_id.as_deref() == Some("0")
    }

    /// The bus id, if it is present and not blank.
    pub fn id(&self) -> Option<&str> {
        self.bus_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    pub fn merge(&mut self, update: BusUpdate) {
        fn take(field: &mut Option<String>, value: Option<String>) {
            if value.is_some() {
                *field = value;
            }
        }

        take(&mut self.bus_id, update.bus_id);
        take(&mut self.route_id, update.route_id);
        take(&mut self.route_name, update.route_name);
        take(&mut self.driver_id, update.driver_id);
        take(&mut self.direction, update.direction);
        take(&mut self.src, update.src);
        take(&mut self.dest, update.dest);
        if let Some(stops) = update.stops {
            self.stops = stops;
        }
    }

    pub fn first_departure(&self) -> Option<&str> {
        self.stops.first().and_then(|stop| stop.departure_time.as_deref())
    }

    pub fn last_arrival(&self) -> Option<&str> {
        self.stops.last().and_then(|stop| stop.arrival_time.as_deref())
    }

    /// The first few stop names joined with arrows, with a trailing `...` when the route is longer.
    pub fn stop_preview(&self, count: usize) -> String {
        let mut preview = self
            .stops
            .iter()
            .take(count)
            .map(Stop::display_name)
            .collect::<Vec<_>>()
            .join(" → ");
        if self.stops.len() > count {
            preview.push_str(" ...");
        }
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn route() -> Bus {
        Bus::new(
            "27",
            "Ukkadam - Gandhipuram",
            vec![
                Stop::new("Ukkadam", 10.9893, 76.9614).with_times("08:00", "08:02"),
                Stop::new("Town Hall", 10.9946, 76.9629).with_times("08:06", "08:07"),
                Stop::new("Railway Station", 10.9968, 76.9672).with_times("08:12", "08:13"),
                Stop::new("Gandhipuram", 11.0168, 76.9558).with_times("08:25", "08:25"),
            ],
        )
    }

    #[test]
    fn sentinel_is_not_found() {
        let bus: Bus = serde_json::from_value(json!({ "route_id": 0, "bus_id": 0 })).unwrap();
        assert!(bus.is_not_found());
        assert!(bus.stops.is_empty());
        assert!(!route().is_not_found());
    }

    #[test]
    fn null_stops_decode_as_empty() {
        let bus: Bus = serde_json::from_value(json!({ "bus_id": 12, "stops": null })).unwrap();
        assert_eq!(bus.id(), Some("12"));
        assert!(bus.stops.is_empty());
    }

    #[test]
    fn merge_keeps_fields_missing_from_update() {
        let mut bus = route();
        bus.merge(BusUpdate {
            bus_id: Some("27".into()),
            direction: Some("up".into()),
            ..Default::default()
        });

        assert_eq!(bus.route_name.as_deref(), Some("Ukkadam - Gandhipuram"));
        assert_eq!(bus.direction.as_deref(), Some("up"));
        assert_eq!(bus.stops.len(), 4);
    }

    #[test]
    fn merge_replaces_stops_when_present() {
        let mut bus = route();
        bus.merge(BusUpdate {
            stops: Some(vec![Stop::new("Depot", 11.0, 77.0)]),
            ..Default::default()
        });
        assert_eq!(bus.stops.len(), 1);
    }

    #[test]
    fn list_row_summary() {
        let bus = route();
        assert_eq!(bus.first_departure(), Some("08:02"));
        assert_eq!(bus.last_arrival(), Some("08:25"));
        assert_eq!(bus.stop_preview(3), "Ukkadam → Town Hall → Railway Station ...");
        assert_eq!(bus.stop_preview(4), "Ukkadam → Town Hall → Railway Station → Gandhipuram");
    }

    #[test]
    fn blank_id_is_no_id() {
        let bus = Bus::new("  ", "Route", Vec::new());
        assert_eq!(bus.id(), None);
    }
}

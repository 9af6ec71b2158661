use chrono::{DateTime, Utc};
use geo_types::Point;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::{
    bus::{Bus, BusUpdate},
    distance::is_valid_position,
    live_fix::LiveFix,
    loose::{number_from_value, string_from_value},
};

/// A message received on the live channel.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    /// Search results pushed by the service.
    BusList(Vec<Bus>),
    /// Metadata for one bus, keyed by its id.
    RouteUpdate(BusUpdate),
    /// A driver location sample.
    PositionFix(LiveFix),
}

impl LiveEvent {
    /// Classifies a text frame. Frames that are not JSON or match no known shape yield `None`.
    pub fn parse(text: &str, received_at: DateTime<Utc>) -> Option<Self> {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Self::from_value(value, received_at),
            Err(err) => {
                debug!("Ignoring non-JSON live message: {err}");
                None
            }
        }
    }

    pub fn from_value(value: Value, received_at: DateTime<Utc>) -> Option<Self> {
        match value {
            Value::Array(items) => {
                let buses = items
                    .into_iter()
                    .filter_map(|item| match serde_json::from_value::<Bus>(item) {
                        Ok(bus) => Some(bus),
                        Err(err) => {
                            debug!("Skipping malformed bus in live list: {err}");
                            None
                        }
                    })
                    .collect();
                Some(LiveEvent::BusList(buses))
            }
            Value::Object(ref fields) if has_coordinates(fields) => {
                let latitude = fields.get("latitude").and_then(number_from_value);
                let longitude = fields.get("longitude").and_then(number_from_value);
                let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
                    debug!("Ignoring fix with unreadable coordinates");
                    return None;
                };
                if !is_valid_position(Point::new(longitude, latitude)) {
                    debug!("Ignoring fix outside the globe: {latitude}, {longitude}");
                    return None;
                }

                let mut fix = LiveFix::new(latitude, longitude, received_at);
                fix.bus_id = fields.get("bus_id").and_then(string_from_value);
                Some(LiveEvent::PositionFix(fix))
            }
            Value::Object(ref fields) if fields.get("bus_id").is_some_and(|id| !id.is_null()) => {
                match serde_json::from_value::<BusUpdate>(value) {
                    Ok(update) => Some(LiveEvent::RouteUpdate(update)),
                    Err(err) => {
                        debug!("Ignoring malformed route update: {err}");
                        None
                    }
                }
            }
            other => {
                debug!("Ignoring unrecognised live message: {other}");
                None
            }
        }
    }
}

fn has_coordinates(fields: &serde_json::Map<String, Value>) -> bool {
    let present = |key: &str| fields.get(key).is_some_and(|v| !v.is_null());
    present("latitude") && present("longitude")
}

/// A request sent to the live channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LiveCommand {
    SubscribeBus {
        bus_id: String,
    },
    SearchBuses {
        src: String,
        dest: String,
    },
    SelectBus {
        bus_id: String,
        route_id: Option<String>,
        route_name: Option<String>,
        driver_id: Option<String>,
        direction: Option<String>,
        timestamp: DateTime<Utc>,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum SelectError {
    #[error("Invalid bus data")]
    MissingBusId,
    #[error("No bus at position {0}")]
    NoSuchBus(usize),
}

impl LiveCommand {
    /// Announces that the user picked `bus` from the result list.
    pub fn select(bus: &Bus, timestamp: DateTime<Utc>) -> Result<Self, SelectError> {
        let bus_id = bus.id().ok_or(SelectError::MissingBusId)?;
        Ok(LiveCommand::SelectBus {
            bus_id: bus_id.to_owned(),
            route_id: bus.route_id.clone(),
            route_name: bus.route_name.clone(),
            driver_id: bus.driver_id.clone(),
            direction: bus.direction.clone(),
            timestamp,
        })
    }

    pub fn to_json(&self) -> String {
        // Every variant is plain strings and a timestamp, which always serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn array_is_bus_list() {
        let event = LiveEvent::parse(r#"[{"bus_id": 27, "route_name": "Town"}, "junk"]"#, now()).unwrap();
        let LiveEvent::BusList(buses) = event else {
            panic!("expected bus list, got {event:?}");
        };
        assert_eq!(buses.len(), 1);
        assert_eq!(buses[0].id(), Some("27"));
    }

    #[test]
    fn coordinates_make_a_fix() {
        let event = LiveEvent::from_value(json!({ "latitude": "11.0168", "longitude": 76.9558 }), now()).unwrap();
        let LiveEvent::PositionFix(fix) = event else {
            panic!("expected fix, got {event:?}");
        };
        assert_eq!(fix.latitude(), 11.0168);
        assert_eq!(fix.longitude(), 76.9558);
        assert_eq!(fix.timestamp, now());
        assert_eq!(fix.bus_id, None);
    }

    #[test]
    fn tagged_fix_keeps_bus_id() {
        let event = LiveEvent::from_value(json!({ "bus_id": 27, "latitude": 1.0, "longitude": 2.0 }), now()).unwrap();
        let LiveEvent::PositionFix(fix) = event else {
            panic!("expected fix, got {event:?}");
        };
        assert_eq!(fix.bus_id.as_deref(), Some("27"));
    }

    #[test]
    fn bus_id_without_coordinates_is_route_update() {
        let event = LiveEvent::from_value(
            json!({ "type": "bus_update", "bus_id": "27", "direction": "down", "latitude": null }),
            now(),
        )
        .unwrap();
        let LiveEvent::RouteUpdate(update) = event else {
            panic!("expected route update, got {event:?}");
        };
        assert_eq!(update.bus_id.as_deref(), Some("27"));
        assert_eq!(update.direction.as_deref(), Some("down"));
        assert_eq!(update.stops, None);
    }

    #[test]
    fn unreadable_coordinates_are_dropped() {
        assert_eq!(LiveEvent::from_value(json!({ "latitude": "x", "longitude": 2.0 }), now()), None);
        assert_eq!(LiveEvent::from_value(json!({ "latitude": 91.0, "longitude": 2.0 }), now()), None);
    }

    #[test]
    fn other_shapes_are_ignored() {
        assert_eq!(LiveEvent::parse("hello", now()), None);
        assert_eq!(LiveEvent::parse(r#"{"status": "ok"}"#, now()), None);
        assert_eq!(LiveEvent::parse("42", now()), None);
    }

    #[test]
    fn commands_carry_action_tag() {
        let value: Value = serde_json::from_str(&LiveCommand::SubscribeBus { bus_id: "27".into() }.to_json()).unwrap();
        assert_eq!(value, json!({ "action": "subscribe_bus", "bus_id": "27" }));

        let value: Value = serde_json::from_str(
            &LiveCommand::SearchBuses { src: "Ukkadam".into(), dest: "Gandhipuram".into() }.to_json(),
        )
        .unwrap();
        assert_eq!(value, json!({ "action": "search_buses", "src": "Ukkadam", "dest": "Gandhipuram" }));
    }

    #[test]
    fn select_requires_bus_id() {
        let mut bus = Bus::new("27", "Town", Vec::new());
        bus.route_id = Some("4".into());

        let value: Value = serde_json::from_str(&LiveCommand::select(&bus, now()).unwrap().to_json()).unwrap();
        assert_eq!(value["action"], "select_bus");
        assert_eq!(value["bus_id"], "27");
        assert_eq!(value["route_id"], "4");
        assert!(value["timestamp"].as_str().unwrap().starts_with("2023-11-14T22:13:20"));

        bus.bus_id = None;
        assert_eq!(LiveCommand::select(&bus, now()), Err(SelectError::MissingBusId));
    }
}

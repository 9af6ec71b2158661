use bus_tracker_lib::{Bus, LiveCommand, LiveEvent, SearchQuery, SelectError};
use chrono::{DateTime, Utc};

const PREVIEW_STOPS: usize = 3;

/// One rendered row of the result list.
#[derive(Debug, Clone, PartialEq)]
pub struct BusRow {
    pub label: String,
    pub stop_count: String,
    pub route_name: String,
    pub times: String,
    pub endpoints: String,
    pub preview: Option<String>,
}

/// Search results, kept current by live updates.
pub struct BusListSession {
    query: Option<SearchQuery>,
    buses: Vec<Bus>,
}

impl BusListSession {
    pub fn new(query: Option<SearchQuery>, buses: Vec<Bus>) -> Self {
        Self { query, buses }
    }

    pub fn buses(&self) -> &[Bus] {
        &self.buses
    }

    pub fn query(&self) -> Option<&SearchQuery> {
        self.query.as_ref()
    }

    /// Returns whether the list changed.
    pub fn apply(&mut self, event: LiveEvent) -> bool {
        match event {
            LiveEvent::BusList(buses) => {
                self.buses = buses;
                true
            }
            LiveEvent::RouteUpdate(update) => {
                let Some(bus) = self
                    .buses
                    .iter_mut()
                    .find(|bus| bus.bus_id.is_some() && bus.bus_id == update.bus_id)
                else {
                    return false;
                };
                bus.merge(update);
                true
            }
            LiveEvent::PositionFix(_) => false,
        }
    }

    pub fn title(&self) -> String {
        self.query.as_ref().map_or_else(|| "Available Buses".to_owned(), SearchQuery::title)
    }

    pub fn subtitle(&self) -> String {
        match &self.query {
            Some(query) => query.subtitle(self.buses.len()),
            None => {
                let plural = if self.buses.len() == 1 { "" } else { "es" };
                format!("{} bus{plural} found", self.buses.len())
            }
        }
    }

    pub fn rows(&self) -> Vec<BusRow> {
        self.buses.iter().map(|bus| self.row(bus)).collect()
    }

    fn row(&self, bus: &Bus) -> BusRow {
        let query_source = self.query.as_ref().and_then(SearchQuery::source);
        let query_destination = self.query.as_ref().and_then(SearchQuery::destination);
        let source = bus.src.as_deref().or(query_source).unwrap_or("?");
        let destination = bus.dest.as_deref().or(query_destination).unwrap_or("?");

        BusRow {
            label: format!("Bus #{}", bus.id().unwrap_or("?")),
            stop_count: format!("{} stops", bus.stops.len()),
            route_name: bus.route_name.clone().unwrap_or_default(),
            times: format!(
                "{} → {}",
                bus.first_departure().unwrap_or("N/A"),
                bus.last_arrival().unwrap_or("N/A")
            ),
            endpoints: format!("{source} → {destination}"),
            preview: (!bus.stops.is_empty()).then(|| bus.stop_preview(PREVIEW_STOPS)),
        }
    }

    /// Picks the bus at `index` and builds the selection announcement for the live channel.
    pub fn select(&self, index: usize, now: DateTime<Utc>) -> Result<(Bus, LiveCommand), SelectError> {
        let bus = self.buses.get(index).ok_or(SelectError::NoSuchBus(index))?;
        let command = LiveCommand::select(bus, now)?;
        Ok((bus.clone(), command))
    }
}

#[cfg(test)]
mod tests {
    use bus_tracker_lib::{BusUpdate, Stop};

    use super::*;

    fn results() -> Vec<Bus> {
        let stops = vec![
            Stop::new("Ukkadam", 10.9893, 76.9614).with_times("08:00", "08:02"),
            Stop::new("Town Hall", 10.9946, 76.9629).with_times("08:06", "08:07"),
            Stop::new("Railway Station", 10.9968, 76.9672).with_times("08:12", "08:13"),
            Stop::new("Gandhipuram", 11.0168, 76.9558).with_times("08:25", "08:25"),
        ];
        vec![Bus::new("27", "Ukkadam - Gandhipuram", stops), Bus::new("12", "Town - Depot", Vec::new())]
    }

    fn direct() -> SearchQuery {
        SearchQuery::direct("Ukkadam", "Gandhipuram").unwrap()
    }

    #[test]
    fn rows_describe_each_bus() {
        let list = BusListSession::new(Some(direct()), results());
        let rows = list.rows();

        assert_eq!(list.title(), "Ukkadam → Gandhipuram");
        assert_eq!(list.subtitle(), "2 buses found");
        assert_eq!(
            rows[0],
            BusRow {
                label: "Bus #27".into(),
                stop_count: "4 stops".into(),
                route_name: "Ukkadam - Gandhipuram".into(),
                times: "08:02 → 08:25".into(),
                endpoints: "Ukkadam → Gandhipuram".into(),
                preview: Some("Ukkadam → Town Hall → Railway Station ...".into()),
            }
        );
        assert_eq!(rows[1].times, "N/A → N/A");
        assert_eq!(rows[1].preview, None);
    }

    #[test]
    fn live_list_replaces_results() {
        let mut list = BusListSession::new(Some(direct()), results());
        assert!(list.apply(LiveEvent::BusList(vec![Bus::new("5", "Five", Vec::new())])));
        assert_eq!(list.buses().len(), 1);
        assert_eq!(list.subtitle(), "1 bus found");
    }

    #[test]
    fn route_update_merges_into_matching_bus() {
        let mut list = BusListSession::new(None, results());
        let update = BusUpdate {
            bus_id: Some("12".into()),
            src: Some("Town".into()),
            dest: Some("Depot".into()),
            ..Default::default()
        };

        assert!(list.apply(LiveEvent::RouteUpdate(update)));
        assert_eq!(list.rows()[1].endpoints, "Town → Depot");

        let unknown = BusUpdate {
            bus_id: Some("404".into()),
            ..Default::default()
        };
        assert!(!list.apply(LiveEvent::RouteUpdate(unknown)));
        assert_eq!(list.title(), "Available Buses");
    }

    #[test]
    fn selecting_announces_the_bus() {
        let list = BusListSession::new(Some(direct()), results());
        let (bus, command) = list.select(0, Utc::now()).unwrap();

        assert_eq!(bus.id(), Some("27"));
        assert!(matches!(command, LiveCommand::SelectBus { ref bus_id, .. } if bus_id == "27"));
        assert_eq!(list.select(7, Utc::now()).unwrap_err(), SelectError::NoSuchBus(7));
    }

    #[test]
    fn selecting_bus_without_id_fails() {
        let mut buses = results();
        buses[0].bus_id = None;
        let list = BusListSession::new(None, buses);
        assert_eq!(list.select(0, Utc::now()).unwrap_err(), SelectError::MissingBusId);
    }
}

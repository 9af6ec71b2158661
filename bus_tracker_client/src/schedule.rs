use std::time::Instant;

use bus_tracker_lib::{Bus, LegProgress, LiveEvent, LiveFix, MarkerAnimator, ProgressState, SearchQuery, Stop};
use tracing::{debug, info, warn};

use crate::{ClientConfig, ConnectionStatus, RouteClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopRowState {
    Completed,
    Current,
    Upcoming,
}

/// What applying a live event did to the schedule.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleChange {
    BusUpdated,
    /// The fix was recorded but could not be placed on the route.
    Located,
    Moved(LegProgress),
    Ignored,
}

/// Live view of one bus's schedule. Lives as long as the user watches it.
pub struct ScheduleSession {
    bus: Bus,
    query: Option<SearchQuery>,
    progress: ProgressState,
    marker: MarkerAnimator,
    location: Option<LiveFix>,
    status: ConnectionStatus,
}

impl ScheduleSession {
    pub fn new(bus: Bus, config: &ClientConfig) -> Self {
        Self {
            bus,
            query: None,
            progress: ProgressState::new(),
            marker: MarkerAnimator::new(config.row_height, config.transition),
            location: None,
            status: ConnectionStatus::Connecting,
        }
    }

    /// Starts a session, fetching the route first if the bus came without stops.
    ///
    /// A failed fetch is logged and the session starts with what it has.
    pub async fn load(bus: Bus, client: &RouteClient, config: &ClientConfig) -> Self {
        let mut bus = bus;
        if bus.stops.is_empty() {
            if let Some(bus_id) = bus.id().map(str::to_owned) {
                match client.get_route(&bus_id).await {
                    Ok(Some(fetched)) if !fetched.stops.is_empty() => {
                        info!("Loaded {} stops for bus {}", fetched.stops.len(), bus_id);
                        bus = fetched;
                    }
                    Ok(_) => debug!("Route service has no stops for bus {}", bus_id),
                    Err(err) => warn!("Failed to fetch bus details for {}: {err}", bus_id),
                }
            }
        }
        Self::new(bus, config)
    }

    /// Remembers what search led here, for the header.
    pub fn with_query(mut self, query: SearchQuery) -> Self {
        self.query = Some(query);
        self
    }

    pub fn apply(&mut self, event: LiveEvent, now: Instant) -> ScheduleChange {
        match event {
            LiveEvent::RouteUpdate(update) => {
                if update.bus_id.is_none() || update.bus_id.as_deref() != self.bus.id() {
                    return ScheduleChange::Ignored;
                }
                self.bus.merge(update);
                ScheduleChange::BusUpdated
            }
            LiveEvent::PositionFix(fix) => {
                if !fix.is_for(self.bus.id()) {
                    return ScheduleChange::Ignored;
                }
                let position = fix.position;
                self.location = Some(fix);

                match self.progress.apply_fix(&self.bus.stops, position) {
                    Some(leg) => {
                        self.marker.move_to_rows(leg.rows(), now);
                        ScheduleChange::Moved(leg)
                    }
                    None => ScheduleChange::Located,
                }
            }
            LiveEvent::BusList(_) => ScheduleChange::Ignored,
        }
    }

    pub fn set_status(&mut self, status: ConnectionStatus) {
        self.status = status;
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn stops(&self) -> &[Stop] {
        &self.bus.stops
    }

    pub fn location(&self) -> Option<&LiveFix> {
        self.location.as_ref()
    }

    pub fn current_stop_index(&self) -> usize {
        self.progress.current_stop_index()
    }

    pub fn marker(&self) -> &MarkerAnimator {
        &self.marker
    }

    pub fn title(&self) -> &str {
        self.bus.route_name.as_deref().unwrap_or("Bus Schedule")
    }

    pub fn header(&self) -> String {
        let bus_id = self.bus.id().unwrap_or("?");
        match &self.query {
            Some(SearchQuery::BusNumber(number)) => format!("Bus #{number} - Live Tracking"),
            Some(query) => match (query.source(), query.destination()) {
                (Some(source), Some(destination)) => format!("{source} → {destination}"),
                _ => format!("Bus #{bus_id} - Live Tracking"),
            },
            None => format!("Bus #{bus_id} - Live Tracking"),
        }
    }

    pub fn row_state(&self, index: usize) -> StopRowState {
        let current = self.current_stop_index();
        if index < current {
            StopRowState::Completed
        } else if index == current {
            StopRowState::Current
        } else {
            StopRowState::Upcoming
        }
    }

    /// One-based number of the current stop, for display.
    pub fn current_stop_number(&self) -> usize {
        self.current_stop_index() + 1
    }

    pub fn total_stops(&self) -> usize {
        self.bus.stops.len()
    }

    /// The stop the bus is at or heading for.
    pub fn next_stop_name(&self) -> Option<&str> {
        self.bus.stops.get(self.current_stop_index()).map(Stop::display_name)
    }
}

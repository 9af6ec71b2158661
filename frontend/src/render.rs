use std::{fmt::Write, time::Instant};

use bus_tracker_client::{BusListSession, ConnectionStatus, ScheduleSession, StopRowState};

pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub fn render_bus_list(list: &BusListSession) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", list.title());
    let _ = writeln!(out, "{}", list.subtitle());
    let _ = writeln!(out);

    for (i, row) in list.rows().iter().enumerate() {
        let _ = writeln!(out, "[{}] {}  ({})", i + 1, row.label, row.stop_count);
        if !row.route_name.is_empty() {
            let _ = writeln!(out, "    {}", row.route_name);
        }
        let _ = writeln!(out, "    {}", row.times);
        let _ = writeln!(out, "    {}", row.endpoints);
        if let Some(preview) = &row.preview {
            let _ = writeln!(out, "    {}", preview);
        }
    }

    out
}

pub fn render_schedule(session: &ScheduleSession, now: Instant) -> String {
    let mut out = String::new();
    let live = match session.status() {
        ConnectionStatus::Connected => "● Live",
        ConnectionStatus::Connecting => "○ Connecting",
        ConnectionStatus::Disconnected => "○ Offline",
    };

    let _ = writeln!(out, "{}", session.title());
    let _ = writeln!(out, "{}", session.header());
    let _ = writeln!(
        out,
        "Total Stops: {}   Current Stop: {}   {}",
        session.total_stops(),
        session.current_stop_number(),
        live
    );
    let _ = writeln!(out);

    let marker = session.marker();
    let marker_row = marker.is_tracking().then(|| {
        let rows = marker.position_at(now) / marker.row_height();
        (rows.floor().max(0.0) as usize).min(session.total_stops().saturating_sub(1))
    });

    for (i, stop) in session.stops().iter().enumerate() {
        let state = session.row_state(i);
        let dot = match state {
            StopRowState::Completed => "✔",
            StopRowState::Current => "●",
            StopRowState::Upcoming => "○",
        };
        let bus = if marker_row == Some(i) { "🚍" } else { "  " };
        let badge = if state == StopRowState::Current { "  CURRENT" } else { "" };

        let _ = writeln!(out, "{bus} {dot} {}{badge}", stop.display_name());
        let _ = writeln!(
            out,
            "     Arrival: {}   Departure: {}",
            stop.arrival_or_na(),
            stop.departure_or_na()
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Current Location:");
    match session.location() {
        Some(fix) => {
            let _ = writeln!(out, "Lat: {:.6}, Lon: {:.6}", fix.latitude(), fix.longitude());
        }
        None => {
            let _ = writeln!(out, "Waiting for GPS updates...");
        }
    }
    let _ = writeln!(out, "Next stop: {}", session.next_stop_name().unwrap_or("N/A"));

    out
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use bus_tracker_client::ClientConfig;
    use bus_tracker_lib::{Bus, LiveEvent, LiveFix, SearchQuery, Stop};
    use chrono::Utc;

    use super::*;

    fn bus() -> Bus {
        Bus::new(
            "27",
            "Ukkadam - Gandhipuram",
            vec![
                Stop::new("Ukkadam", 0.0, 0.0).with_times("08:00", "08:02"),
                Stop::new("Town Hall", 0.0, 1.0),
                Stop::new("Gandhipuram", 0.0, 2.0).with_times("08:25", "08:25"),
            ],
        )
    }

    #[test]
    fn list_shows_numbered_rows() {
        let list = BusListSession::new(Some(SearchQuery::direct("Ukkadam", "Gandhipuram").unwrap()), vec![bus()]);
        let text = render_bus_list(&list);

        assert!(text.starts_with("Ukkadam → Gandhipuram\n1 bus found\n"));
        assert!(text.contains("[1] Bus #27  (3 stops)"));
        assert!(text.contains("08:02 → 08:25"));
        assert!(text.contains("Ukkadam → Town Hall → Gandhipuram"));
    }

    #[test]
    fn schedule_before_first_fix() {
        let session = ScheduleSession::new(bus(), &ClientConfig::default());
        let text = render_schedule(&session, Instant::now());

        assert!(text.contains("Total Stops: 3   Current Stop: 1   ○ Connecting"));
        assert!(text.contains("Waiting for GPS updates..."));
        assert!(text.contains("Next stop: Ukkadam"));
        assert!(text.contains("Arrival: N/A   Departure: N/A"));
        assert!(!text.contains("🚍"));
    }

    #[test]
    fn schedule_draws_marker_on_current_leg() {
        let mut session = ScheduleSession::new(bus(), &ClientConfig::default());
        session.set_status(ConnectionStatus::Connected);
        let start = Instant::now();
        session.apply(LiveEvent::PositionFix(LiveFix::new(0.0, 0.5, Utc::now())), start);

        // Halfway along the first leg, so the marker still sits in the first row.
        let text = render_schedule(&session, start + ClientConfig::default().transition);
        assert!(text.contains("● Live"));
        assert!(text.contains("🚍 ● Ukkadam  CURRENT"));
        assert!(text.contains("   ○ Town Hall\n"));
        assert!(text.contains("Lat: 0.000000, Lon: 0.500000"));
    }
}

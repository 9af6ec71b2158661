use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::{Context, bail};
use api::SearchOutcome;
use bus_tracker_client::{
    BusListSession, ClientConfig, ConnectionStatus, DEFAULT_API_URL, DEFAULT_LIVE_URL, LiveHandle, LiveHub,
    RouteClient, ScheduleChange, ScheduleSession, Subscription,
};
use bus_tracker_lib::{Bus, LiveCommand, SearchQuery, SelectError};
use chrono::Utc;
use clap::{Parser, Subcommand};
use render::{CLEAR_SCREEN, render_bus_list, render_schedule};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod render;

const REDRAW_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Parser)]
#[command(name = "bus-tracker", version, about = "Find buses and follow them live")]
struct Cli {
    /// Route service base URL
    #[arg(long, global = true, env = "BUS_TRACKER_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Live channel WebSocket URL
    #[arg(long, global = true, env = "BUS_TRACKER_LIVE_URL", default_value = DEFAULT_LIVE_URL)]
    live_url: String,

    #[arg(long, global = true, env = "BUS_TRACKER_TIMEOUT_SECS", default_value_t = 15)]
    timeout_secs: u64,

    /// Also write logs to this file
    #[arg(long, global = true, env = "BUS_TRACKER_LOG_FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find buses running between two stops
    Search {
        source: String,
        destination: String,
        /// Only buses passing through this stop
        #[arg(long)]
        via: Option<String>,
        /// Swap source and destination
        #[arg(long)]
        reverse: bool,
        /// Keep the list open and apply live updates
        #[arg(long)]
        watch: bool,
        /// Track the bus at this position in the list (starting at 1)
        #[arg(long)]
        select: Option<usize>,
    },
    /// Look up a bus by its number
    Bus {
        number: String,
        /// Start tracking it right away
        #[arg(long)]
        track: bool,
    },
    /// Follow a bus live along its stops
    Track { bus_id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;

    let config = ClientConfig {
        api_url: cli.api_url,
        live_url: cli.live_url,
        request_timeout: Duration::from_secs(cli.timeout_secs),
        ..Default::default()
    };
    let client = RouteClient::new(&config)?;
    let hub = LiveHub::websocket(&config);

    match cli.command {
        Command::Search {
            source,
            destination,
            via,
            reverse,
            watch,
            select,
        } => {
            let query = match via {
                Some(stop) => SearchQuery::via(&source, &destination, &stop)?,
                None => SearchQuery::direct(&source, &destination)?,
            };
            let query = if reverse { query.reversed() } else { query };
            search(&hub, &client, &config, query, watch, select).await
        }
        Command::Bus { number, track } => {
            let query = SearchQuery::bus_number(&number)?;
            search(&hub, &client, &config, query, false, track.then_some(1)).await
        }
        Command::Track { bus_id } => {
            let query = SearchQuery::bus_number(&bus_id)?;
            let bus = api::get_bus(&client, &bus_id)
                .await
                .context("Failed to fetch bus details. Please try again.")?;
            let Some(bus) = bus else {
                bail!("No bus found with this number.");
            };
            let live = hub.acquire();
            let events = live.subscribe();
            track(live, events, &client, &config, bus, query).await
        }
    }
}

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Could not open log file {}", path.display()))?;
            Some(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("{}=info,bus_tracker_client=info,bus_tracker_lib=warn", env!("CARGO_CRATE_NAME")).into()
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(())
}

async fn search(
    hub: &LiveHub,
    client: &RouteClient,
    config: &ClientConfig,
    query: SearchQuery,
    watch: bool,
    select: Option<usize>,
) -> anyhow::Result<()> {
    // Direct searches are also announced live so the service can push result changes.
    // Subscribe before announcing so the pushed list is not missed.
    let live = match &query {
        SearchQuery::Direct { source, destination } => {
            let live = hub.acquire();
            let events = live.subscribe();
            let command = LiveCommand::SearchBuses {
                src: source.clone(),
                dest: destination.clone(),
            };
            if let Err(err) = live.send(command) {
                warn!("Could not announce search: {err}");
            }
            Some((live, events))
        }
        _ => None,
    };

    let outcome = api::find_buses(client, &query).await.map_err(|err| {
        error!("Search failed: {err}");
        anyhow::anyhow!("Failed to search for buses. Please try again.")
    })?;
    let buses = match outcome {
        SearchOutcome::Found(buses) => buses,
        SearchOutcome::NotFound(message) => {
            println!("{message}");
            if !keeps_watching_empty(&query, watch, select) {
                return Ok(());
            }
            Vec::new()
        }
    };

    let mut list = BusListSession::new(Some(query.clone()), buses);
    print!("{}", render_bus_list(&list));

    if let Some(position) = select {
        let (bus, command) = list.select(list_index(position)?, Utc::now())?;
        let (live, events) = live.unwrap_or_else(|| {
            let live = hub.acquire();
            let events = live.subscribe();
            (live, events)
        });
        if let Err(err) = live.send(command) {
            warn!("Could not announce selection: {err}");
        }
        return track(live, events, client, config, bus, query).await;
    }

    let Some((_, mut events)) = live.filter(|_| watch) else {
        return Ok(());
    };

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    println!("Live channel closed.");
                    break;
                };
                if list.apply(event) {
                    print!("{CLEAR_SCREEN}{}", render_bus_list(&list));
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

/// Whether a direct search that found nothing stays open under `--watch`.
fn keeps_watching_empty(query: &SearchQuery, watch: bool, select: Option<usize>) -> bool {
    watch && select.is_none() && matches!(query, SearchQuery::Direct { .. })
}

/// Turns a 1-based list position into an index.
fn list_index(position: usize) -> Result<usize, SelectError> {
    position.checked_sub(1).ok_or(SelectError::NoSuchBus(position))
}

async fn track(
    live: LiveHandle,
    mut events: Subscription,
    client: &RouteClient,
    config: &ClientConfig,
    bus: Bus,
    query: SearchQuery,
) -> anyhow::Result<()> {
    let mut session = ScheduleSession::load(bus, client, config).await.with_query(query);
    let mut status = live.watch_status();
    session.set_status(live.status());

    match session.bus().id() {
        Some(bus_id) => {
            info!("Tracking bus {bus_id}");
            if let Err(err) = live.send(LiveCommand::SubscribeBus { bus_id: bus_id.to_owned() }) {
                warn!("Could not subscribe to bus {bus_id}: {err}");
            }
        }
        None => warn!("Bus has no id, live updates cannot be requested"),
    }

    let mut redraw = tokio::time::interval(REDRAW_INTERVAL);
    let mut dirty = true;
    let mut animating = false;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    session.set_status(ConnectionStatus::Disconnected);
                    print!("{CLEAR_SCREEN}{}", render_schedule(&session, Instant::now()));
                    println!("Live channel closed.");
                    break;
                };
                if session.apply(event, Instant::now()) != ScheduleChange::Ignored {
                    dirty = true;
                }
            }
            Ok(()) = status.changed() => {
                let current = *status.borrow_and_update();
                session.set_status(current);
                dirty = true;
            }
            _ = redraw.tick() => {
                let now = Instant::now();
                // One more frame after the marker settles so it is drawn on its target.
                let moving = !session.marker().is_settled(now);
                if dirty || moving || animating {
                    print!("{CLEAR_SCREEN}{}", render_schedule(&session, now));
                    dirty = false;
                }
                animating = moving;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_positions_start_at_one() {
        assert_eq!(list_index(1), Ok(0));
        assert_eq!(list_index(3), Ok(2));
        assert_eq!(list_index(0), Err(SelectError::NoSuchBus(0)));
    }

    #[test]
    fn empty_direct_search_keeps_watching() {
        let direct = SearchQuery::direct("Ukkadam", "Gandhipuram").unwrap();
        let via = SearchQuery::via("Ukkadam", "Gandhipuram", "Town Hall").unwrap();

        assert!(keeps_watching_empty(&direct, true, None));
        assert!(!keeps_watching_empty(&direct, false, None));
        assert!(!keeps_watching_empty(&direct, true, Some(1)));
        assert!(!keeps_watching_empty(&via, true, None));
        assert!(!keeps_watching_empty(&SearchQuery::bus_number("27").unwrap(), true, None));
    }
}

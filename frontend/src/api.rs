use bus_tracker_client::{ApiError, RouteClient};
use bus_tracker_lib::{Bus, SearchQuery};

pub enum SearchOutcome {
    Found(Vec<Bus>),
    NotFound(&'static str),
}

/// Runs a search and tells "nothing matched" apart from a failed request.
pub async fn find_buses(client: &RouteClient, query: &SearchQuery) -> Result<SearchOutcome, ApiError> {
    let buses = client.search(query).await?;

    if !buses.is_empty() {
        return Ok(SearchOutcome::Found(buses));
    }

    let message = match query {
        SearchQuery::BusNumber(_) => "No bus found with this number.",
        _ => "No buses found for your search criteria.",
    };
    Ok(SearchOutcome::NotFound(message))
}

pub async fn get_bus(client: &RouteClient, bus_id: &str) -> Result<Option<Bus>, ApiError> {
    client.get_route(bus_id.trim()).await
}

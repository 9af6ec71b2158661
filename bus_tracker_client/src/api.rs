use bus_tracker_lib::{Bus, SearchQuery};
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{ApiError, ClientConfig};

/// Request/response client for the route service.
#[derive(Clone, Debug)]
pub struct RouteClient {
    http: reqwest::Client,
    base: Url,
}

impl RouteClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let base = Url::parse(&config.api_url).map_err(|err| ApiError::InvalidUrl(format!("{}: {err}", config.api_url)))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(config.api_url.clone()));
        }

        let http = reqwest::Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self { http, base })
    }

    /// Looks up a bus by number. `None` when the service does not know it.
    pub async fn get_route(&self, bus_id: &str) -> Result<Option<Bus>, ApiError> {
        let url = self.route_url(bus_id);
        let buses = decode_buses(self.make_request(url).await?);
        Ok(buses.into_iter().next())
    }

    pub async fn search_direct(&self, source: &str, destination: &str) -> Result<Vec<Bus>, ApiError> {
        let url = self.endpoint(&format!("src-{source}&dest-{destination}"));
        Ok(decode_buses(self.make_request(url).await?))
    }

    pub async fn search_via(&self, source: &str, destination: &str, stop: &str) -> Result<Vec<Bus>, ApiError> {
        let url = self.endpoint(&format!("src-{source}&dest-{destination}&stop-{stop}"));
        Ok(decode_buses(self.make_request(url).await?))
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<Bus>, ApiError> {
        match query {
            SearchQuery::Direct { source, destination } => self.search_direct(source, destination).await,
            SearchQuery::Via { source, destination, stop } => self.search_via(source, destination, stop).await,
            SearchQuery::BusNumber(number) => Ok(self.get_route(number).await?.into_iter().collect()),
        }
    }

    pub fn route_url(&self, bus_id: &str) -> Url {
        let mut url = self.endpoint("get-route");
        url.query_pairs_mut().append_pair("bus_id", bus_id);
        url
    }

    /// The base url with one more path segment. The segment is percent-encoded as needed.
    pub fn endpoint(&self, segment: &str) -> Url {
        let mut url = self.base.clone();
        // `new` rejected cannot-be-a-base urls, so the segments are always available.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(segment);
        }
        url
    }

    async fn make_request(&self, url: Url) -> Result<Value, ApiError> {
        debug!("GET {url}");
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }

        let body = response.text().await?;
        match serde_json::from_str(&body) {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!("Route service sent a malformed body: {err}");
                Ok(Value::Null)
            }
        }
    }
}

/// Normalises a route service response into a list of buses.
///
/// The service answers with a bus, an array of buses, `null`, or the string
/// `"null"`. Empty answers, "not found" sentinels and malformed entries are all
/// dropped, so an unknown search gives an empty list rather than an error.
pub fn decode_buses(value: Value) -> Vec<Bus> {
    let items = match value {
        Value::Null => return Vec::new(),
        Value::String(s) if s == "null" => return Vec::new(),
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        other => {
            warn!("Unexpected route service response: {other}");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Bus>(item) {
            Ok(bus) if bus.is_not_found() => None,
            Ok(bus) => Some(bus),
            Err(err) => {
                warn!("Skipping malformed bus: {err}");
                None
            }
        })
        .collect()
}

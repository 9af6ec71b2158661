use std::time::Duration;

use bus_tracker_lib::marker::{DEFAULT_ROW_HEIGHT, DEFAULT_TRANSITION};

use crate::{DEFAULT_API_URL, DEFAULT_LIVE_URL};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
/// Live events buffered per subscriber before the slowest one starts skipping.
pub const DEFAULT_EVENT_BUFFER: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub live_url: String,
    pub request_timeout: Duration,
    pub event_buffer: usize,
    pub row_height: f64,
    pub transition: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            live_url: DEFAULT_LIVE_URL.to_owned(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            event_buffer: DEFAULT_EVENT_BUFFER,
            row_height: DEFAULT_ROW_HEIGHT,
            transition: DEFAULT_TRANSITION,
        }
    }
}

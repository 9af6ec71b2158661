use const_format::concatcp;

pub mod api;
pub mod bus_list;
pub mod config;
pub mod live;
pub mod schedule;
mod error;

pub use api::RouteClient;
pub use bus_list::{BusListSession, BusRow};
pub use config::ClientConfig;
pub use error::{ApiError, ChannelError};
pub use live::{ConnectionStatus, Connector, LiveHandle, LiveHub, Subscription, Transport, WebSocketConnector};
pub use schedule::{ScheduleChange, ScheduleSession, StopRowState};

pub const SERVICE_HOST: &str = "yus.kwscloud.in";
pub const DEFAULT_API_URL: &str = concatcp!("https://", SERVICE_HOST, "/yus");
pub const DEFAULT_LIVE_URL: &str = concatcp!("wss://", SERVICE_HOST, "/yus/live");

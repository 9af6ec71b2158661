mod connector;
mod hub;

pub use connector::{Connector, TextSink, TextStream, Transport, WebSocketConnector};
pub use hub::{ConnectionStatus, LiveHandle, LiveHub, Subscription};

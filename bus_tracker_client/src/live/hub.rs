//! Shared live-channel connection.
//!
//! Screens do not open their own socket. They acquire a [`LiveHandle`] from the
//! [`LiveHub`], and the hub keeps one connection open for as long as any handle
//! or subscription is alive. When the last one is dropped the connection task is
//! aborted and the socket closes. The next acquisition opens a fresh one.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use bus_tracker_lib::{LiveCommand, LiveEvent};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use tokio::{
    sync::{
        broadcast::{self, error::RecvError},
        mpsc, watch,
    },
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use super::connector::{Connector, Transport, WebSocketConnector};
use crate::{ChannelError, ClientConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
}

pub struct LiveHub {
    connector: Arc<dyn Connector>,
    event_buffer: usize,
    current: Mutex<Weak<Connection>>,
}

impl LiveHub {
    pub fn new(connector: impl Connector, event_buffer: usize) -> Self {
        Self {
            connector: Arc::new(connector),
            event_buffer: event_buffer.max(1),
            current: Mutex::new(Weak::new()),
        }
    }

    pub fn websocket(config: &ClientConfig) -> Self {
        Self::new(WebSocketConnector::new(config.live_url.clone()), config.event_buffer)
    }

    /// Returns a handle to the shared connection, opening it if no one holds it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn acquire(&self) -> LiveHandle {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(connection) = current.upgrade() {
            return LiveHandle { connection };
        }

        debug!("Opening live connection");
        let connection = Arc::new(Connection::open(self.connector.clone(), self.event_buffer));
        *current = Arc::downgrade(&connection);
        LiveHandle { connection }
    }

    /// Whether a connection is currently held by some handle.
    pub fn is_active(&self) -> bool {
        self.current.lock().unwrap_or_else(PoisonError::into_inner).strong_count() > 0
    }
}

struct Connection {
    // Never read. Kept so new subscribers can be created after the pump owns the sender.
    template: broadcast::Receiver<LiveEvent>,
    commands: mpsc::UnboundedSender<LiveCommand>,
    status: watch::Receiver<ConnectionStatus>,
    pump: JoinHandle<()>,
}

impl Connection {
    fn open(connector: Arc<dyn Connector>, event_buffer: usize) -> Self {
        let (events, template) = broadcast::channel(event_buffer);
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(ConnectionStatus::Connecting);

        let pump = tokio::spawn(pump(connector, events, command_rx, status_tx));

        Self {
            template,
            commands,
            status,
            pump,
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.pump.abort();
        debug!("Live connection released");
    }
}

/// Moves frames between the transport and the connection's channels until either side ends.
async fn pump(
    connector: Arc<dyn Connector>,
    events: broadcast::Sender<LiveEvent>,
    mut commands: mpsc::UnboundedReceiver<LiveCommand>,
    status: watch::Sender<ConnectionStatus>,
) {
    let Transport { mut incoming, mut outgoing } = match connector.connect().await {
        Ok(transport) => transport,
        Err(err) => {
            warn!("{err}");
            status.send_replace(ConnectionStatus::Disconnected);
            return;
        }
    };

    status.send_replace(ConnectionStatus::Connected);
    info!("Live channel connected");

    loop {
        tokio::select! {
            frame = incoming.next() => match frame {
                Some(Ok(text)) => {
                    if let Some(event) = LiveEvent::parse(&text, Utc::now()) {
                        // Only the template receiver may be listening, that is fine.
                        let _ = events.send(event);
                    }
                }
                Some(Err(err)) => {
                    warn!("{err}");
                    break;
                }
                None => {
                    info!("Live channel closed by the server");
                    break;
                }
            },
            command = commands.recv() => {
                let Some(command) = command else {
                    break;
                };
                debug!("Sending {command:?}");
                if let Err(err) = outgoing.send(command.to_json()).await {
                    warn!("{err}");
                    break;
                }
            }
        }
    }

    status.send_replace(ConnectionStatus::Disconnected);
}

/// A share of the live connection. Clone freely; the connection closes after the last clone and subscription drop.
#[derive(Clone)]
pub struct LiveHandle {
    connection: Arc<Connection>,
}

impl LiveHandle {
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            events: self.connection.template.resubscribe(),
            _connection: self.connection.clone(),
        }
    }

    /// Queues a command. Commands sent while still connecting go out once connected.
    pub fn send(&self, command: LiveCommand) -> Result<(), ChannelError> {
        self.connection.commands.send(command).map_err(|_| ChannelError::Closed)
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.connection.status.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.connection.status.clone()
    }
}

/// Receives live events from the moment it was created. Dropping it unsubscribes.
pub struct Subscription {
    events: broadcast::Receiver<LiveEvent>,
    _connection: Arc<Connection>,
}

impl Subscription {
    /// The next event, or `None` once the connection has ended.
    ///
    /// A subscriber that falls behind skips the events it missed.
    pub async fn recv(&mut self) -> Option<LiveEvent> {
        loop {
            match self.events.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => warn!("Skipped {skipped} live events"),
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

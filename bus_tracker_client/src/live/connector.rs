use std::pin::Pin;

use futures::{
    future::{self, BoxFuture},
    stream::BoxStream,
    FutureExt, Sink, SinkExt, StreamExt,
};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info};

use crate::ChannelError;

pub type TextStream = BoxStream<'static, Result<String, ChannelError>>;
pub type TextSink = Pin<Box<dyn Sink<String, Error = ChannelError> + Send>>;

/// An open live channel: text frames in, text frames out.
pub struct Transport {
    pub incoming: TextStream,
    pub outgoing: TextSink,
}

/// Opens the transport behind a live connection.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self) -> BoxFuture<'static, Result<Transport, ChannelError>>;
}

#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    url: String,
}

impl WebSocketConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Connector for WebSocketConnector {
    fn connect(&self) -> BoxFuture<'static, Result<Transport, ChannelError>> {
        let url = self.url.clone();
        async move {
            let (socket, _response) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(|err| ChannelError::Connect(format!("{url}: {err}")))?;
            info!("Connected to {url}");

            let (sink, stream) = socket.split();

            let incoming = stream
                .filter_map(|message| async move {
                    match message {
                        Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                        Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                            Ok(text) => Some(Ok(text)),
                            Err(_) => {
                                debug!("Dropping non UTF-8 binary frame");
                                None
                            }
                        },
                        Ok(Message::Close(frame)) => {
                            debug!("Server closed live channel: {frame:?}");
                            None
                        }
                        Ok(_) => None,
                        Err(err) => Some(Err(ChannelError::Transport(err.to_string()))),
                    }
                })
                .boxed();

            let outgoing = sink
                .sink_map_err(|err| ChannelError::Transport(err.to_string()))
                .with(|text: String| future::ready(Ok::<_, ChannelError>(Message::Text(text.into()))));

            Ok(Transport {
                incoming,
                outgoing: Box::pin(outgoing),
            })
        }
        .boxed()
    }
}

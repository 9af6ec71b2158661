use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid service url: {0}")]
    InvalidUrl(String),
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Service answered with status {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Failed to connect to live channel: {0}")]
    Connect(String),
    #[error("Live channel transport error: {0}")]
    Transport(String),
    #[error("Live channel is closed")]
    Closed,
}

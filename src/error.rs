use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("RPC error: {0}")]
    Rpc(#[from] alloy_transport::TransportError),

    #[error("RPC call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Multicall failed: {0}")]
    Multicall(String),

    #[error("Alert feed error: {0}")]
    Feed(String),

    #[error("State store error: {0}")]
    State(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DetectorError>;

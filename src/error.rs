use thiserror::Error as ThisError;

/// Everything that can go wrong while refreshing readings from the source.
///
/// None of these are fatal: the poller logs them and keeps the last good reading.
#[derive(ThisError, Debug)]
pub enum FetchError {
    #[error("No sensor URL configured")]
    MissingUrl,

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Sensor endpoint returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("Malformed response body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("Field '{field}' is not a number: {reason}")]
    InvalidField { field: String, reason: String },
}

/// Startup errors of the bridge binaries.
#[derive(ThisError, Debug)]
pub enum BridgeError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

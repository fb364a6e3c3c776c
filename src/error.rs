use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to fetch airport dataset: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("failed to read airport dataset: {0}")]
    Read(#[from] std::io::Error),

    #[error("airport dataset contained no usable records")]
    Empty,
}

/// Reasons a requested route could not be drawn. None of these are fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("'{0}' is not a 3-letter airport code")]
    InvalidCode(String),

    #[error("unknown airport {0}")]
    UnknownAirport(String),

    #[error("airport data is still loading")]
    DatasetLoading,

    #[error("airport data unavailable")]
    DatasetUnavailable,
}

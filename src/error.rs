//! Error types
//!
//! Fetch failures are recovered by the refresher; configuration failures
//! are fatal at startup.

use std::time::Duration;
use thiserror::Error;

/// A single cost query failed
#[derive(Debug, Error)]
pub enum FetchError {
    /// The billing API call itself failed (network, auth, throttling)
    #[error("cost query failed: {0}")]
    Request(String),

    /// The response carried no result bucket
    #[error("response contained no results")]
    MissingResult,

    /// The result bucket had no amount for the requested metric
    #[error("result has no {metric} amount")]
    MissingAmount { metric: &'static str },

    /// The amount could not be parsed as a number
    #[error("invalid amount {value:?}")]
    InvalidAmount { value: String },

    /// The query did not complete in time
    #[error("cost query timed out after {0:?}")]
    Timeout(Duration),

    /// Period boundaries could not be computed or rejected by the API client
    #[error("invalid billing period: {0}")]
    InvalidPeriod(String),
}

/// Configuration could not be resolved
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be an integer number of seconds, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{0} must be > 0")]
    ZeroInterval(&'static str),

    #[error("{key} is not a valid socket address: {value:?}")]
    InvalidAddr { key: &'static str, value: String },

    #[error("unknown log format {0:?} (expected \"json\" or \"pretty\")")]
    UnknownLogFormat(String),

    #[error("invalid log level {value:?}: {reason}")]
    InvalidLogLevel { value: String, reason: String },

    #[error("aws region must not be empty")]
    EmptyRegion,
}

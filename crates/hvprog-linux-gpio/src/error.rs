//! Error types for the Linux GPIO backend

use thiserror::Error;

/// Linux GPIO backend errors
#[derive(Debug, Error)]
pub enum LinuxGpioError {
    /// Failed to request GPIO lines
    #[error("Failed to request GPIO lines on '{path}': {source}")]
    LineRequestFailed {
        path: String,
        #[source]
        source: gpiocdev::Error,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Missing required parameter
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// GPIO chip or device not specified
    #[error("No GPIO chip specified. Use dev=/dev/gpiochipN or gpiochip=N")]
    NoDevice,

    /// The same GPIO offset is assigned to two signals
    #[error("GPIO line {offset} is assigned to both {first} and {second}")]
    DuplicateLine {
        offset: u32,
        first: &'static str,
        second: &'static str,
    },

    /// Invalid timing parameters
    #[error("Timing below target minimum: {0}")]
    InvalidTiming(#[source] hvprog_core::Error),
}

/// Result type for Linux GPIO backend operations
pub type Result<T> = std::result::Result<T, LinuxGpioError>;

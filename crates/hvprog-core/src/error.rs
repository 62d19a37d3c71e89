//! Error types for hvprog-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The target never completed a ready/busy handshake
    ///
    /// Real hardware has no way to detect this and simply keeps polling;
    /// only backends that can observe the condition (the simulator, or a
    /// host backend with a watchdog) return it.
    TargetTimeout,
    /// The backend failed to drive or sample a line
    Io,
    /// A timing parameter is below the minimum required by the target
    InvalidTiming,
    /// Writing a response line to the command channel failed
    Output,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetTimeout => write!(f, "Target not responding (RDY/BSY stuck)"),
            Self::Io => write!(f, "Programmer I/O error"),
            Self::InvalidTiming => write!(f, "Timing below target minimum"),
            Self::Output => write!(f, "Failed to write response"),
        }
    }
}

impl From<fmt::Error> for Error {
    fn from(_: fmt::Error) -> Self {
        Error::Output
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;

//! Configuration errors for counters.

use thiserror::Error;

/// Errors raised while configuring a counter.
///
/// Counters never fail once they are in service; the only thing that can go
/// wrong is building one with a nonsensical shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WindowError {
    /// The requested number of buckets is less than one.
    #[error("invalid resolution {0}: a windowed counter needs at least 1 bucket")]
    InvalidResolution(i64),
}

/// Result type for counter configuration.
pub type Result<T> = std::result::Result<T, WindowError>;

//! Exporters turning a set of [`Observable`](crate::counters::Observable)
//! counters into text.
//!
//! - [`json`]: a [`MetricsSnapshot`](crate::snapshot::MetricsSnapshot)
//!   encoded with `serde_json` (feature `json`).

#[cfg(feature = "json")]
pub mod json;

//! Counter implementations and the traits shared by them.
//!
//! Two counters live here:
//!
//! - [`Scalar`](scalar::Scalar): a single atomic word mutated through
//!   add/reset/read. It is the building block of everything else.
//! - [`Windowed`](windowed::Windowed): a sliding-window counter made of a
//!   running total plus a ring of `Scalar` buckets that rotate as time passes.
//!
//! # Architecture
//!
//! ```text
//!                    ┌──────────────────────────────────────────┐
//!                    │             Windowed counter             │
//!                    ├──────────────────────────────────────────┤
//!   incr(delta) ──►  │ total  ██████████████████ (Scalar)       │
//!                    │                                          │
//!                    │ [b0] [b1] [b2] ... [current] ... [bN-1]  │
//!                    │   ▲                    ▲                 │
//!                    │   └── evicted next ────┘ new events      │
//!                    └──────────────────────────────────────────┘
//!                                        │
//!                                        ▼
//!                              rate() reads total
//! ```
//!
//! Every call to `incr` or `rate` first checks whether at least one
//! sub-interval has elapsed since the last rotation. If so, a single caller
//! wins the admission gate and advances the ring; everyone else carries on
//! with a slightly stale view instead of waiting.

pub mod scalar;
pub mod windowed;

use std::fmt::{Debug, Display};

/// How an observer should expose a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MetricKind {
    /// Accumulates over the process lifetime (until explicitly reset).
    #[default]
    Counter,
    /// Goes up and down on its own, like a windowed rate.
    Gauge,
}

impl Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricKind::Counter => f.write_str("counter"),
            MetricKind::Gauge => f.write_str("gauge"),
        }
    }
}

/// A trait for types that can be observed to retrieve their current value.
///
/// All counters in this crate implement `Observable`:
/// - [`Scalar`](scalar::Scalar) - returns its value, kind [`MetricKind::Counter`]
/// - [`Windowed`](windowed::Windowed) - returns the current rate, kind [`MetricKind::Gauge`]
///
/// # Examples
///
/// ```rust
/// use finestra::counters::Observable;
/// use finestra::counters::scalar::Scalar;
///
/// let counter = Scalar::new().with_name("requests");
/// counter.incr(5);
///
/// println!("Name: {}", counter.name());
/// println!("Value: {}", Observable::value(&counter));
///
/// let final_value = counter.value_and_reset();
/// assert_eq!(final_value, 5);
/// assert_eq!(Observable::value(&counter), 0);
/// ```
pub trait Observable: Debug + Send + Sync {
    /// Returns the name of this counter, or an empty string if none was set.
    fn name(&self) -> &str;

    /// Returns the current value of the counter.
    fn value(&self) -> i64;

    /// Returns the kind of metric this counter represents.
    fn metric_kind(&self) -> MetricKind {
        MetricKind::Counter
    }

    /// Returns the current value and resets the counter where that makes sense.
    ///
    /// Windowed counters return their rate without resetting.
    fn value_and_reset(&self) -> i64;
}

impl Display for dyn Observable + '_ {
    /// Formats the counter as `name:value` if named, or just `value` otherwise.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.name().is_empty() {
            write!(f, "{}:{}", self.name(), self.value())
        } else {
            write!(f, "{}", self.value())
        }
    }
}

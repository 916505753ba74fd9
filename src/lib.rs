//! # Finestra - Lock-Free Sliding-Window Rate Counters
//!
//! A Rust library answering "how many events happened in the last minute?"
//! from many threads at once, with constant memory and O(1) amortized work
//! per operation. No per-event timestamps are stored.
//!
//! ## The Problem
//!
//! Tracking a trailing-window rate exactly means remembering when every event
//! happened, then dropping the ones that fell out of the window. Memory grows
//! with the event rate, and the bookkeeping usually sits behind a lock that
//! every instrumented thread fights over.
//!
//! ## The Solution: Rotating Buckets
//!
//! The window is split into a fixed number of equal sub-intervals (the
//! **resolution**, 20 by default). Each sub-interval owns an atomic bucket,
//! and a running total mirrors the sum of all buckets:
//!
//! ```text
//!   ┌──────────────────────── window ────────────────────────┐
//!   │ [b0] [b1] [b2] [b3] ... [current] [next] ... [bN-1]     │
//!   └─────────────────────────────────────────────────────────┘
//!        total = b0 + b1 + ... + bN-1       rate() == total
//! ```
//!
//! As time moves on, the bucket after `current` is drained out of the total
//! and reused. Expiry therefore happens at bucket granularity: an event is
//! counted for at least `window - window / resolution` and at most `window`.
//!
//! ### Design Principles
//!
//! 1. **Atomics Only**: increments touch two atomic words, the total and the
//!    current bucket. There is no lock on the hot path.
//!
//! 2. **Skip, Don't Wait**: advancing the ring is guarded by an atomic flag
//!    claimed with compare-and-swap. A caller that finds someone else
//!    rotating simply proceeds with a slightly stale view.
//!
//! 3. **Bounded Catch-Up**: rotation never runs more than `resolution` steps,
//!    however long the counter sat idle.
//!
//! 4. **Cache Line Padding**: buckets are wrapped in
//!    [`crossbeam_utils::CachePadded`] so that neighbouring buckets never
//!    share a cache line.
//!
//! 5. **Injected Time**: counters read time through a [`Clock`](clock::Clock),
//!    so tests can drive rotation deterministically with a
//!    [`ManualClock`](clock::ManualClock).
//!
//! ## Available Counter Types
//!
//! | Type | Description | Use Case |
//! |------|-------------|----------|
//! | [`Scalar`](counters::scalar::Scalar) | Single atomic signed counter | Totals, gauges, building block |
//! | [`Windowed`](counters::windowed::Windowed) | Events in a trailing window | Requests per minute, throughput |
//!
//! ## Quick Start
//!
//! ```rust
//! use finestra::counters::windowed::Windowed;
//! use std::time::Duration;
//!
//! // Count requests over the last minute, in 60 one-second buckets
//! let requests = Windowed::new(Duration::from_secs(60))
//!     .with_resolution(60)
//!     .with_name("requests");
//!
//! requests.incr(1);
//! requests.incr(1);
//!
//! println!("Requests in the last minute: {}", requests);
//! assert_eq!(requests.rate(), 2);
//! ```
//!
//! ## Thread Safety
//!
//! All counter types are `Send + Sync` and can be shared across threads
//! with `Arc`. Reshaping a windowed counter with
//! [`with_resolution`](counters::windowed::Windowed::with_resolution) takes
//! it by value, so it can only happen before the counter is shared.
//!
//! ## Logging
//!
//! Rotations and reconfigurations emit [`tracing`] events at `trace` and
//! `debug` level. The library never installs a subscriber.
//!
//! ## Exporting
//!
//! Every counter implements [`Observable`](counters::Observable): a name, a
//! value and a [`MetricKind`](counters::MetricKind). Windowed rates report
//! as gauges since they fall as events expire. With the `serde` feature,
//! [`snapshot`] captures a set of observables at one instant; the `json`
//! feature adds [`observers::json::JsonObserver`] on top of it.
//!
//! ```rust,ignore
//! use finestra::counters::windowed::Windowed;
//! use finestra::counters::Observable;
//! use finestra::observers::json::JsonObserver;
//!
//! let rps = Windowed::new(Duration::from_secs(1)).with_name("http_rps");
//! rps.incr(1000);
//!
//! let counters: [&dyn Observable; 1] = [&rps];
//! println!("{}", JsonObserver::new().to_json(counters)?);
//! // {"counters":[{"name":"http_rps","kind":"gauge","value":1000}]}
//! ```

pub mod clock;
pub mod counters;
pub mod error;
pub mod observers;

#[cfg(feature = "serde")]
pub mod snapshot;

pub use error::{Result, WindowError};

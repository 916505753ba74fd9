//! Sliding-window rate counter.
//!
//! This module provides [`Windowed`], a counter that answers "how many events
//! happened in the last `window`?" with constant memory and no per-event
//! timestamps.
//!
//! # Design
//!
//! The window is split into `resolution` equal sub-intervals, each backed by
//! a cache-padded [`Scalar`] bucket. A separate running `total` holds the sum
//! of all buckets so that reading the rate is a single atomic load.
//!
//! ```text
//!   window = 1000ms, resolution = 10  →  sub-interval = 100ms
//!
//!   ┌────┬────┬────┬────┬────┬────┬────┬────┬────┬────┐
//!   │ b0 │ b1 │ b2 │ b3 │ b4 │ b5 │ b6 │ b7 │ b8 │ b9 │
//!   └────┴────┴────┴────┴────┴────┴────┴────┴────┴────┘
//!                        ▲    ▲
//!                  current    next to be evicted and reused
//! ```
//!
//! Whenever more than one sub-interval has elapsed since the last rotation,
//! the ring advances: the bucket after `current` is drained, its count is
//! subtracted from `total`, and it becomes the new `current`. The loop is
//! capped at `resolution` steps, so a counter left idle for hours catches up
//! in bounded time and ends up all zeroes.
//!
//! # Concurrency
//!
//! Rotation is guarded by an [`AtomicBool`] admission gate claimed with a
//! compare-and-swap. Callers that lose the race do not wait: they proceed
//! with a view that is at most one sub-interval stale. Draining a bucket is
//! a single atomic swap, so increments that race with a rotation are never
//! lost; `total` and the sum of the buckets only diverge transiently.
//!
//! # Examples
//!
//! ```rust
//! use finestra::counters::windowed::Windowed;
//! use std::time::Duration;
//!
//! let requests = Windowed::new(Duration::from_secs(60)).with_name("requests_last_minute");
//!
//! requests.incr(1);
//! requests.incr(1);
//!
//! assert_eq!(requests.rate(), 2);
//! assert_eq!(requests.to_string(), "2");
//! ```

use std::fmt::{Debug, Display};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crossbeam_utils::CachePadded;
use tracing::{debug, trace};

use crate::clock::{saturating_millis, Clock, SystemClock};
use crate::counters::scalar::Scalar;
use crate::counters::{MetricKind, Observable};
use crate::error::{Result, WindowError};

/// Number of buckets a new counter is created with.
pub const DEFAULT_RESOLUTION: usize = 20;

/// A thread-safe counter of the events recorded in a trailing time window.
///
/// `Windowed` is generic over its [`Clock`]; the default [`SystemClock`]
/// reads wall-clock milliseconds. Use [`Windowed::with_clock`] with a
/// [`ManualClock`](crate::clock::ManualClock) to drive time by hand.
///
/// # Accuracy
///
/// An event recorded at time `t` is reflected by [`rate`](Self::rate) for at
/// least `window - window / resolution` and at most `window` after `t`.
/// Higher resolutions tighten the bound at the cost of one cache line per
/// bucket.
///
/// # Examples
///
/// Multi-threaded usage:
///
/// ```rust
/// use finestra::counters::windowed::Windowed;
/// use std::sync::Arc;
/// use std::thread;
/// use std::time::Duration;
///
/// let counter = Arc::new(Windowed::new(Duration::from_secs(60)));
/// let mut handles = vec![];
///
/// for _ in 0..4 {
///     let c = Arc::clone(&counter);
///     handles.push(thread::spawn(move || {
///         for _ in 0..1000 {
///             c.incr(1);
///         }
///     }));
/// }
///
/// for h in handles {
///     h.join().unwrap();
/// }
///
/// assert_eq!(counter.rate(), 4000);
/// ```
pub struct Windowed<C: Clock = SystemClock> {
    name: &'static str,
    /// Sum of all buckets.
    total: Scalar,
    buckets: Box<[CachePadded<Scalar>]>,
    /// Index of the bucket receiving new events.
    current: AtomicUsize,
    /// Start of the current sub-interval, in milliseconds, stored as `f64` bits.
    last_rotation: AtomicU64,
    window_millis: u64,
    /// Admission gate: `true` while some caller is rotating the ring.
    rotating: AtomicBool,
    clock: C,
}

impl Windowed<SystemClock> {
    /// Creates a counter over the trailing `window`, measured by wall-clock time.
    ///
    /// The window is truncated to whole milliseconds and split into
    /// [`DEFAULT_RESOLUTION`] buckets.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use finestra::counters::windowed::{Windowed, DEFAULT_RESOLUTION};
    /// use std::time::Duration;
    ///
    /// let counter = Windowed::new(Duration::from_secs(1));
    /// assert_eq!(counter.resolution(), DEFAULT_RESOLUTION);
    /// assert_eq!(counter.rate(), 0);
    /// ```
    pub fn new(window: Duration) -> Self {
        Self::with_clock(window, SystemClock)
    }
}

impl<C: Clock> Windowed<C> {
    /// Creates a counter over the trailing `window`, measured by `clock`.
    pub fn with_clock(window: Duration, clock: C) -> Self {
        let now = clock.now_millis();
        Windowed {
            name: "",
            total: Scalar::new(),
            buckets: ring(DEFAULT_RESOLUTION),
            current: AtomicUsize::new(0),
            last_rotation: AtomicU64::new((now as f64).to_bits()),
            window_millis: saturating_millis(window),
            rotating: AtomicBool::new(false),
            clock,
        }
    }

    /// Sets the name of this counter, returning `self` for method chaining.
    pub fn with_name(self, name: &'static str) -> Self {
        Self { name, ..self }
    }

    /// Replaces the bucket ring with `resolution` fresh buckets.
    ///
    /// Anything counted so far is discarded. Taking `self` by value means the
    /// ring can only be reshaped before the counter is shared.
    ///
    /// # Panics
    ///
    /// Panics if `resolution < 1`. Use
    /// [`try_with_resolution`](Self::try_with_resolution) to get an error
    /// instead.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use finestra::counters::windowed::Windowed;
    /// use std::time::Duration;
    ///
    /// let counter = Windowed::new(Duration::from_secs(1)).with_resolution(10);
    /// assert_eq!(counter.resolution(), 10);
    /// assert_eq!(counter.sub_interval(), Duration::from_millis(100));
    /// ```
    ///
    /// ```rust,should_panic
    /// use finestra::counters::windowed::Windowed;
    /// use std::time::Duration;
    ///
    /// let _ = Windowed::new(Duration::from_secs(1)).with_resolution(0);
    /// ```
    pub fn with_resolution(self, resolution: i64) -> Self {
        match self.try_with_resolution(resolution) {
            Ok(counter) => counter,
            Err(err) => panic!("{err}"),
        }
    }

    /// Replaces the bucket ring with `resolution` fresh buckets, or returns
    /// [`WindowError::InvalidResolution`] if `resolution < 1`.
    pub fn try_with_resolution(self, resolution: i64) -> Result<Self> {
        let len = usize::try_from(resolution)
            .ok()
            .filter(|len| *len >= 1)
            .ok_or(WindowError::InvalidResolution(resolution))?;

        debug!(
            counter = self.name,
            resolution = len,
            window_ms = self.window_millis,
            "reshaped bucket ring"
        );

        Ok(Self {
            total: Scalar::new(),
            buckets: ring(len),
            current: AtomicUsize::new(0),
            ..self
        })
    }

    /// Records `delta` events. Negative deltas retract previously recorded ones.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use finestra::counters::windowed::Windowed;
    /// use std::time::Duration;
    ///
    /// let counter = Windowed::new(Duration::from_secs(60));
    /// counter.incr(5);
    /// counter.incr(-2);
    /// assert_eq!(counter.rate(), 3);
    /// ```
    #[inline]
    pub fn incr(&self, delta: i64) {
        self.total.incr(delta);
        self.rotate();
        let current = self.current.load(Ordering::Acquire);
        self.buckets[current].incr(delta);
    }

    /// Returns the number of events recorded in the trailing window.
    #[inline]
    pub fn rate(&self) -> i64 {
        self.rotate();
        self.total.value()
    }

    /// Returns the configured window, truncated to whole milliseconds.
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_millis)
    }

    /// Returns the number of buckets in the ring.
    pub fn resolution(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the span of time covered by a single bucket.
    pub fn sub_interval(&self) -> Duration {
        self.window() / u32::try_from(self.buckets.len()).unwrap_or(u32::MAX)
    }

    /// Returns the clock this counter reads time from.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    #[inline]
    fn sub_interval_millis(&self) -> f64 {
        self.window_millis as f64 / self.buckets.len() as f64
    }

    /// Milliseconds elapsed since the start of the current sub-interval.
    #[inline]
    fn elapsed_at(&self, now: f64) -> (f64, f64) {
        let last = f64::from_bits(self.last_rotation.load(Ordering::Acquire));
        ((now - last).max(0.0), last)
    }

    /// Advances the ring if at least one sub-interval has gone by.
    ///
    /// Only one caller rotates at a time; the others return immediately.
    fn rotate(&self) {
        let now = self.clock.now_millis() as f64;
        let sub_interval = self.sub_interval_millis();

        if self.elapsed_at(now).0 <= sub_interval {
            return;
        }

        let Some(_gate) = RotationGate::try_acquire(&self.rotating) else {
            trace!(counter = self.name, "rotation already in progress, skipping");
            return;
        };

        // Someone may have finished a rotation between our check and the gate.
        let (mut elapsed, last) = self.elapsed_at(now);
        if elapsed <= sub_interval {
            return;
        }

        let resolution = self.buckets.len();
        let mut current = self.current.load(Ordering::Acquire);
        let mut steps = 0;

        while elapsed > sub_interval && steps < resolution {
            current = (current + 1) % resolution;
            let evicted = self.buckets[current].take();
            self.total.decr(evicted);
            elapsed -= sub_interval;
            steps += 1;
        }

        // A capped loop means the whole window expired: restart it from now.
        let start = if elapsed > sub_interval {
            now
        } else {
            last + steps as f64 * sub_interval
        };

        self.current.store(current, Ordering::Release);
        self.last_rotation.store(start.to_bits(), Ordering::Release);

        trace!(counter = self.name, steps, current, "rotated bucket ring");
    }
}

/// Builds a zeroed ring of `len` cache-padded buckets.
fn ring(len: usize) -> Box<[CachePadded<Scalar>]> {
    (0..len).map(|_| CachePadded::new(Scalar::new())).collect()
}

/// Claim on the rotation gate, released on drop.
struct RotationGate<'a>(&'a AtomicBool);

impl<'a> RotationGate<'a> {
    #[inline]
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| RotationGate(flag))
    }
}

impl Drop for RotationGate<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<C: Clock> Observable for Windowed<C> {
    #[inline]
    fn name(&self) -> &str {
        self.name
    }

    /// Returns the current rate.
    #[inline]
    fn value(&self) -> i64 {
        self.rate()
    }

    /// Returns [`MetricKind::Gauge`] because the rate goes down as events expire.
    #[inline]
    fn metric_kind(&self) -> MetricKind {
        MetricKind::Gauge
    }

    /// Returns the current rate. The window drains by itself, nothing is reset.
    #[inline]
    fn value_and_reset(&self) -> i64 {
        self.rate()
    }
}

impl<C: Clock> Display for Windowed<C> {
    /// Formats the current rate in base 10.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.rate())
    }
}

impl<C: Clock> Debug for Windowed<C> {
    /// Formats the counter showing the total and the non-zero buckets.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{{ total:{} |", self.name, self.total.value())?;
        for (i, bucket) in self.buckets.iter().enumerate() {
            let val = bucket.value();
            if val != 0 {
                write!(f, " [{i}]:{val}")?;
            }
        }
        write!(f, " | current:{} }}", self.current.load(Ordering::Relaxed))
    }
}

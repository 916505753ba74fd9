//! Time sources for windowed counters.
//!
//! A [`Windowed`](crate::counters::windowed::Windowed) counter never asks the
//! operating system for the time directly: it goes through a [`Clock`]. The
//! default [`SystemClock`] reads wall-clock milliseconds, while
//! [`ManualClock`] only moves when told to, which makes rotation fully
//! deterministic in tests and simulations.
//!
//! # Examples
//!
//! ```rust
//! use finestra::clock::{Clock, ManualClock};
//! use std::time::Duration;
//!
//! let clock = ManualClock::new(1_000);
//! clock.advance(Duration::from_millis(250));
//! assert_eq!(clock.now_millis(), 1_250);
//! ```

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A source of monotonically non-decreasing millisecond timestamps.
///
/// Timestamps only need to be comparable with each other; the epoch is up
/// to the implementation. A clock that steps backwards is tolerated: the
/// counter treats negative elapsed time as zero.
pub trait Clock: Send + Sync {
    /// Returns the current time in milliseconds.
    fn now_millis(&self) -> u64;
}

/// Wall-clock time in milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(saturating_millis)
            .unwrap_or(0)
    }
}

/// A clock that only advances when told to.
///
/// Share it between the test and the counter through an `Arc` (or a plain
/// reference), since both `Arc<C>` and `&C` are clocks too.
///
/// # Examples
///
/// ```rust
/// use finestra::clock::ManualClock;
/// use finestra::counters::windowed::Windowed;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let clock = Arc::new(ManualClock::new(0));
/// let counter = Windowed::with_clock(Duration::from_secs(1), Arc::clone(&clock))
///     .with_resolution(10);
///
/// counter.incr(1);
/// clock.advance(Duration::from_millis(1_500));
/// assert_eq!(counter.rate(), 0);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Creates a clock frozen at `start_millis`.
    pub const fn new(start_millis: u64) -> Self {
        ManualClock {
            now: AtomicU64::new(start_millis),
        }
    }

    /// Moves the clock to an absolute timestamp, forwards or backwards.
    pub fn set(&self, millis: u64) {
        self.now.store(millis, Ordering::Release);
    }

    /// Moves the clock forward by `by`, truncated to whole milliseconds.
    /// Saturates at `u64::MAX` instead of wrapping.
    pub fn advance(&self, by: Duration) {
        let by = saturating_millis(by);
        let _ = self
            .now
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |now| {
                Some(now.saturating_add(by))
            });
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::Acquire)
    }
}

/// Whole milliseconds in `d`, clamped to `u64::MAX`.
#[inline]
pub(crate) fn saturating_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    #[inline]
    fn now_millis(&self) -> u64 {
        (**self).now_millis()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now_millis(&self) -> u64 {
        (**self).now_millis()
    }
}

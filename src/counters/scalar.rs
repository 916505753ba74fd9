//! Lock-free scalar counter.
//!
//! This module provides [`Scalar`], a single atomic word that can be
//! incremented by signed deltas, read and reset from any thread. It is the
//! storage unit of [`Windowed`](super::windowed::Windowed): the running total
//! and every bucket of the ring are `Scalar`s.

use std::fmt::{Debug, Display};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::counters::{MetricKind, Observable};

/// A thread-safe counter backed by a single `AtomicI64`.
///
/// Deltas are applied with wrapping arithmetic: the value is the sum of all
/// deltas modulo 2^64, and overflow is never reported. Because the delta is
/// signed, decrementing is just adding a negative number, and a counter that
/// dips below zero reads back negative until compensating increments arrive.
///
/// All operations use `Ordering::Relaxed`: increments are commutative, so
/// concurrent updates always accumulate to the same final sum regardless of
/// interleaving.
///
/// # Const Initialization
///
/// ```rust
/// use finestra::counters::scalar::Scalar;
///
/// static HITS: Scalar = Scalar::new().with_name("hits");
/// HITS.incr(1);
/// ```
///
/// # Examples
///
/// ```rust
/// use finestra::counters::scalar::Scalar;
/// use std::sync::Arc;
/// use std::thread;
///
/// let counter = Arc::new(Scalar::new());
/// let handles: Vec<_> = (1..=3)
///     .map(|delta| {
///         let c = Arc::clone(&counter);
///         thread::spawn(move || c.incr(delta))
///     })
///     .collect();
///
/// for h in handles {
///     h.join().unwrap();
/// }
///
/// assert_eq!(counter.value(), 6);
/// ```
pub struct Scalar {
    name: &'static str,
    value: AtomicI64,
}

impl Scalar {
    /// Creates a new counter initialized to zero, with no name.
    pub const fn new() -> Self {
        Scalar {
            name: "",
            value: AtomicI64::new(0),
        }
    }

    /// Sets the name of this counter, returning `self` for method chaining.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use finestra::counters::scalar::Scalar;
    /// use finestra::counters::Observable;
    ///
    /// let counter = Scalar::new().with_name("bytes_sent");
    /// assert_eq!(counter.name(), "bytes_sent");
    /// ```
    pub const fn with_name(self, name: &'static str) -> Self {
        Self { name, ..self }
    }

    /// Atomically adds `delta` to the counter. Negative deltas decrement.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use finestra::counters::scalar::Scalar;
    ///
    /// let counter = Scalar::new();
    /// counter.incr(10);
    /// counter.incr(-4);
    /// assert_eq!(counter.value(), 6);
    /// ```
    #[inline]
    pub fn incr(&self, delta: i64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    /// Atomically subtracts `delta` from the counter.
    #[inline]
    pub fn decr(&self, delta: i64) {
        self.value.fetch_sub(delta, Ordering::Relaxed);
    }

    /// Atomically sets the counter back to zero.
    #[inline]
    pub fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }

    /// Atomically reads the current value.
    #[inline]
    pub fn value(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Atomically reads the current value and resets the counter to zero.
    ///
    /// Unlike a `value()` followed by `reset()`, no concurrent increment can
    /// fall between the read and the reset.
    #[inline]
    pub fn take(&self) -> i64 {
        self.value.swap(0, Ordering::Relaxed)
    }
}

impl Observable for Scalar {
    #[inline]
    fn name(&self) -> &str {
        self.name
    }

    #[inline]
    fn value(&self) -> i64 {
        Scalar::value(self)
    }

    /// Returns [`MetricKind::Counter`].
    #[inline]
    fn metric_kind(&self) -> MetricKind {
        MetricKind::Counter
    }

    /// Returns the value and resets the counter to zero.
    #[inline]
    fn value_and_reset(&self) -> i64 {
        self.take()
    }
}

impl Default for Scalar {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Scalar {
    /// Formats the current value in base 10.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Scalar::value(self))
    }
}

impl Debug for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{{ {} }}", self.name, Scalar::value(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_new() {
        let counter = Scalar::new();
        assert_eq!(counter.value(), 0);
    }

    #[test]
    fn test_const_new() {
        static COUNTER: Scalar = Scalar::new().with_name("static");
        COUNTER.incr(1);
        assert!(COUNTER.value() >= 1);
        assert_eq!(COUNTER.name(), "static");
    }

    #[test]
    fn test_incr_sequence() {
        let counter = Scalar::new();
        assert_eq!(counter.value(), 0);
        counter.incr(1);
        assert_eq!(counter.value(), 1);
        counter.incr(9);
        assert_eq!(counter.value(), 10);
    }

    #[test]
    fn test_concurrent_incr() {
        let counter = Arc::new(Scalar::new());
        counter.incr(10);

        let handles: Vec<_> = (1..=3)
            .map(|delta| {
                let c = Arc::clone(&counter);
                thread::spawn(move || c.incr(delta))
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(counter.value(), 16);
    }

    #[test]
    fn test_multiple_threads() {
        let counter = Arc::new(Scalar::new());
        let mut handles = vec![];

        for i in 0..4 {
            let c = Arc::clone(&counter);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    if i % 2 == 0 {
                        c.incr(3);
                    } else {
                        c.decr(1);
                    }
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(counter.value(), 2 * 3000 - 2 * 1000);
    }

    #[test]
    fn test_negative_delta() {
        let counter = Scalar::new();
        counter.incr(-5);
        assert_eq!(counter.value(), -5);
        counter.incr(5);
        assert_eq!(counter.value(), 0);
    }

    #[test]
    fn test_wraparound() {
        let counter = Scalar::new();
        counter.incr(i64::MAX);
        counter.incr(1);
        assert_eq!(counter.value(), i64::MIN);
        counter.incr(-1);
        assert_eq!(counter.value(), i64::MAX);
    }

    #[test]
    fn test_reset() {
        let counter = Scalar::new();
        counter.incr(42);
        counter.reset();
        assert_eq!(counter.value(), 0);
    }

    #[test]
    fn test_take() {
        let counter = Scalar::new();
        counter.incr(42);
        assert_eq!(counter.take(), 42);
        assert_eq!(counter.value(), 0);
    }

    #[test]
    fn test_observable_impl() {
        let counter = Scalar::new().with_name("events");
        counter.incr(3);

        let observable: &dyn Observable = &counter;
        assert_eq!(observable.name(), "events");
        assert_eq!(observable.value(), 3);
        assert_eq!(observable.metric_kind(), MetricKind::Counter);
        assert_eq!(observable.value_and_reset(), 3);
        assert_eq!(counter.value(), 0);
    }

    #[test]
    fn test_display() {
        let counter = Scalar::new();
        counter.incr(-12);
        assert_eq!(counter.to_string(), "-12");
    }

    #[test]
    fn test_dyn_format() {
        let counter = Scalar::new().with_name("test_counter");
        counter.incr(2);
        let formatted = format!("{}", &counter as &dyn Observable);
        assert_eq!(formatted, "test_counter:2");
    }

    #[test]
    fn test_debug() {
        let counter = Scalar::new().with_name("dbg");
        counter.incr(5);
        assert_eq!(format!("{:?}", counter), "dbg{ 5 }");
    }

    #[test]
    fn test_default() {
        let counter = Scalar::default();
        assert_eq!(counter.value(), 0);
        assert_eq!(counter.name(), "");
    }
}

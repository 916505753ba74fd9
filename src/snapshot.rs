//! Point-in-time captures of counter values.
//!
//! A [`MetricsSnapshot`] freezes what a set of [`Observable`] counters report
//! at one instant, so the numbers can be shipped with any serde format. For a
//! windowed counter the captured value is its rate at collection time; the
//! snapshot does not expire with the window.
//!
//! Requires the `serde` feature.
//!
//! ```rust
//! use finestra::clock::ManualClock;
//! use finestra::counters::windowed::Windowed;
//! use finestra::counters::{MetricKind, Observable};
//! use finestra::snapshot::MetricsSnapshot;
//! use std::time::Duration;
//!
//! let clock = ManualClock::new(5_000);
//! let rps = Windowed::with_clock(Duration::from_secs(1), &clock).with_name("rps");
//! rps.incr(42);
//!
//! let counters: [&dyn Observable; 1] = [&rps];
//! let snapshot = MetricsSnapshot::collect(counters).at(&clock);
//!
//! assert_eq!(snapshot.timestamp_ms, Some(5_000));
//! assert_eq!(snapshot.value_of("rps"), Some(42));
//! assert_eq!(snapshot.get("rps").unwrap().kind, MetricKind::Gauge);
//! ```

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::counters::{MetricKind, Observable};

/// Name recorded for counters that were never given one.
pub const UNNAMED: &str = "(unnamed)";

/// One counter as seen at collection time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub name: String,
    /// Missing in older payloads, where every entry was a counter.
    #[serde(default)]
    pub kind: MetricKind,
    pub value: i64,
}

impl CounterSnapshot {
    pub fn new(name: impl Into<String>, kind: MetricKind, value: i64) -> Self {
        CounterSnapshot {
            name: name.into(),
            kind,
            value,
        }
    }

    /// Captures the current value of `counter`.
    pub fn read(counter: &dyn Observable) -> Self {
        Self::capture(counter, counter.value())
    }

    /// Captures `counter` through [`Observable::value_and_reset`]: scalars
    /// are zeroed, windowed counters are only read.
    pub fn read_and_reset(counter: &dyn Observable) -> Self {
        Self::capture(counter, counter.value_and_reset())
    }

    fn capture(counter: &dyn Observable, value: i64) -> Self {
        let name = match counter.name() {
            "" => UNNAMED,
            name => name,
        };
        Self::new(name, counter.metric_kind(), value)
    }
}

/// A set of counters collected together, optionally stamped with the time
/// of collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Milliseconds since the Unix epoch, as read from a [`Clock`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
    pub counters: Vec<CounterSnapshot>,
}

impl MetricsSnapshot {
    /// Reads every counter, in iteration order.
    pub fn collect<'a>(counters: impl IntoIterator<Item = &'a dyn Observable>) -> Self {
        MetricsSnapshot {
            timestamp_ms: None,
            counters: counters.into_iter().map(CounterSnapshot::read).collect(),
        }
    }

    /// Like [`collect`](Self::collect), resetting the counters that support it.
    pub fn collect_and_reset<'a>(counters: impl IntoIterator<Item = &'a dyn Observable>) -> Self {
        MetricsSnapshot {
            timestamp_ms: None,
            counters: counters
                .into_iter()
                .map(CounterSnapshot::read_and_reset)
                .collect(),
        }
    }

    /// Stamps the snapshot with the current time of `clock`.
    pub fn at(self, clock: &impl Clock) -> Self {
        MetricsSnapshot {
            timestamp_ms: Some(clock.now_millis()),
            ..self
        }
    }

    /// Finds a counter by name. The first match wins.
    pub fn get(&self, name: &str) -> Option<&CounterSnapshot> {
        self.counters.iter().find(|c| c.name == name)
    }

    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.get(name).map(|c| c.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::counters::scalar::Scalar;
    use crate::counters::windowed::Windowed;
    use std::time::Duration;

    #[test]
    fn test_read_scalar() {
        let counter = Scalar::new().with_name("requests");
        counter.incr(100);

        let snapshot = CounterSnapshot::read(&counter);
        assert_eq!(
            snapshot,
            CounterSnapshot::new("requests", MetricKind::Counter, 100)
        );
        assert_eq!(counter.value(), 100);
    }

    #[test]
    fn test_read_windowed_freezes_the_rate() {
        let clock = ManualClock::new(0);
        let counter = Windowed::with_clock(Duration::from_secs(1), &clock)
            .with_resolution(10)
            .with_name("rps");
        counter.incr(7);

        let snapshot = CounterSnapshot::read(&counter);
        clock.advance(Duration::from_secs(2));

        assert_eq!(snapshot.kind, MetricKind::Gauge);
        assert_eq!(snapshot.value, 7);
        assert_eq!(CounterSnapshot::read(&counter).value, 0);
    }

    #[test]
    fn test_unnamed() {
        let counter = Scalar::new();
        assert_eq!(CounterSnapshot::read(&counter).name, UNNAMED);
    }

    #[test]
    fn test_collect_and_reset() {
        let total = Scalar::new().with_name("total");
        let rpm = Windowed::new(Duration::from_secs(60)).with_name("rpm");
        total.incr(10);
        rpm.incr(3);

        let counters: [&dyn Observable; 2] = [&total, &rpm];
        let snapshot = MetricsSnapshot::collect_and_reset(counters);

        assert_eq!(snapshot.value_of("total"), Some(10));
        assert_eq!(snapshot.value_of("rpm"), Some(3));
        assert_eq!(total.value(), 0);
        assert_eq!(rpm.rate(), 3);
    }

    #[test]
    fn test_collect_keeps_order_and_stamps_time() {
        let clock = ManualClock::new(1_234_567_890);
        let a = Scalar::new().with_name("a");
        let b = Scalar::new().with_name("b");

        let counters: [&dyn Observable; 2] = [&b, &a];
        let snapshot = MetricsSnapshot::collect(counters).at(&clock);

        assert_eq!(snapshot.timestamp_ms, Some(1_234_567_890));
        let names: Vec<&str> = snapshot.counters.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(snapshot.value_of("missing"), None);
    }

    #[test]
    fn test_serialized_layout() {
        let snapshot = CounterSnapshot::new("rps", MetricKind::Gauge, 42);
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"name":"rps","kind":"gauge","value":42}"#);

        let untimed = MetricsSnapshot::default();
        assert_eq!(serde_json::to_string(&untimed).unwrap(), r#"{"counters":[]}"#);
    }

    #[test]
    fn test_json_round_trip_preserves_values() {
        let total = Scalar::new().with_name("total");
        let balance = Scalar::new().with_name("balance");
        let rps = Windowed::new(Duration::from_secs(1)).with_name("rps");
        total.incr(42);
        balance.incr(-5);

        let counters: [&dyn Observable; 3] = [&total, &balance, &rps];
        let snapshot = MetricsSnapshot::collect(counters).at(&ManualClock::new(99));

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: MetricsSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(back, snapshot);
        assert_eq!(back.value_of("total"), Some(42));
        assert_eq!(back.value_of("rps"), Some(0));
    }

    #[test]
    fn test_deserialize_without_kind() {
        let json = r#"{"counters":[{"name":"legacy","value":3}]}"#;
        let snapshot: MetricsSnapshot = serde_json::from_str(json).unwrap();

        assert_eq!(snapshot.timestamp_ms, None);
        assert_eq!(
            snapshot.counters,
            vec![CounterSnapshot::new("legacy", MetricKind::Counter, 3)]
        );
    }
}

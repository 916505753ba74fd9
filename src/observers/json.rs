//! JSON export of counter sets.
//!
//! [`JsonObserver`] collects a [`MetricsSnapshot`] from the given counters and
//! encodes it with `serde_json`. Requires the `json` feature.
//!
//! ```rust
//! use finestra::clock::ManualClock;
//! use finestra::counters::scalar::Scalar;
//! use finestra::counters::windowed::Windowed;
//! use finestra::counters::Observable;
//! use finestra::observers::json::JsonObserver;
//! use std::time::Duration;
//!
//! let clock = ManualClock::new(1_000);
//! let total = Scalar::new().with_name("requests_total");
//! let rpm = Windowed::with_clock(Duration::from_secs(60), &clock).with_name("requests_per_minute");
//! total.incr(5);
//! rpm.incr(5);
//!
//! let counters: [&dyn Observable; 2] = [&total, &rpm];
//! let json = JsonObserver::with_clock(&clock).timestamped(true).to_json(counters).unwrap();
//! assert_eq!(
//!     json,
//!     r#"{"timestamp_ms":1000,"counters":[{"name":"requests_total","kind":"counter","value":5},{"name":"requests_per_minute","kind":"gauge","value":5}]}"#
//! );
//! ```

use std::io::Write;

use tracing::trace;

use crate::clock::{Clock, SystemClock};
use crate::counters::Observable;
use crate::snapshot::MetricsSnapshot;

/// Encodes counters as a JSON [`MetricsSnapshot`] document.
///
/// The clock is only read when [`timestamped`](Self::timestamped) is on.
#[derive(Debug, Clone, Default)]
pub struct JsonObserver<C: Clock = SystemClock> {
    pretty: bool,
    timestamped: bool,
    clock: C,
}

impl JsonObserver<SystemClock> {
    /// Compact output, no timestamp, wall-clock time.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<C: Clock> JsonObserver<C> {
    /// Stamps snapshots with the time read from `clock`.
    pub fn with_clock(clock: C) -> Self {
        JsonObserver {
            pretty: false,
            timestamped: false,
            clock,
        }
    }

    pub fn pretty(self, enabled: bool) -> Self {
        Self {
            pretty: enabled,
            ..self
        }
    }

    /// Adds `timestamp_ms` to every document.
    pub fn timestamped(self, enabled: bool) -> Self {
        Self {
            timestamped: enabled,
            ..self
        }
    }

    /// Reads the counters into a snapshot, stamped if configured.
    pub fn snapshot<'a>(
        &self,
        counters: impl IntoIterator<Item = &'a dyn Observable>,
    ) -> MetricsSnapshot {
        self.stamp(MetricsSnapshot::collect(counters))
    }

    /// Encodes the counters as one JSON document.
    ///
    /// # Errors
    ///
    /// Fails only if `serde_json` does, which a snapshot never triggers in
    /// practice.
    pub fn to_json<'a>(
        &self,
        counters: impl IntoIterator<Item = &'a dyn Observable>,
    ) -> serde_json::Result<String> {
        self.encode(&self.snapshot(counters))
    }

    /// Like [`to_json`](Self::to_json), resetting the scalar counters.
    /// Windowed counters keep their window.
    pub fn to_json_and_reset<'a>(
        &self,
        counters: impl IntoIterator<Item = &'a dyn Observable>,
    ) -> serde_json::Result<String> {
        self.encode(&self.stamp(MetricsSnapshot::collect_and_reset(counters)))
    }

    /// Streams the document into `writer`, e.g. a socket or a response body.
    pub fn write_to<'a, W: Write>(
        &self,
        writer: W,
        counters: impl IntoIterator<Item = &'a dyn Observable>,
    ) -> serde_json::Result<()> {
        let snapshot = self.snapshot(counters);
        if self.pretty {
            serde_json::to_writer_pretty(writer, &snapshot)
        } else {
            serde_json::to_writer(writer, &snapshot)
        }
    }

    fn stamp(&self, snapshot: MetricsSnapshot) -> MetricsSnapshot {
        if self.timestamped {
            snapshot.at(&self.clock)
        } else {
            snapshot
        }
    }

    fn encode(&self, snapshot: &MetricsSnapshot) -> serde_json::Result<String> {
        trace!(counters = snapshot.counters.len(), "encoding snapshot");
        if self.pretty {
            serde_json::to_string_pretty(snapshot)
        } else {
            serde_json::to_string(snapshot)
        }
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
    fn test_empty() {
        let counters: [&dyn Observable; 0] = [];
        let json = JsonObserver::new().to_json(counters).unwrap();
        assert_eq!(json, r#"{"counters":[]}"#);
    }

    #[test]
    fn test_windowed_rate_follows_the_window() {
        let clock = ManualClock::new(0);
        let rps = Windowed::with_clock(Duration::from_secs(1), &clock)
            .with_resolution(10)
            .with_name("rps");
        rps.incr(3);

        let observer = JsonObserver::new();
        let counters: [&dyn Observable; 1] = [&rps];
        assert_eq!(
            observer.to_json(counters).unwrap(),
            r#"{"counters":[{"name":"rps","kind":"gauge","value":3}]}"#
        );

        clock.set(1_500);
        assert_eq!(
            observer.to_json(counters).unwrap(),
            r#"{"counters":[{"name":"rps","kind":"gauge","value":0}]}"#
        );
    }

    #[test]
    fn test_timestamp_comes_from_the_clock() {
        let clock = ManualClock::new(42);
        let total = Scalar::new().with_name("total");
        let counters: [&dyn Observable; 1] = [&total];

        let observer = JsonObserver::with_clock(&clock).timestamped(true);
        let first: MetricsSnapshot = serde_json::from_str(&observer.to_json(counters).unwrap()).unwrap();
        clock.advance(Duration::from_millis(8));
        let second: MetricsSnapshot = serde_json::from_str(&observer.to_json(counters).unwrap()).unwrap();

        assert_eq!(first.timestamp_ms, Some(42));
        assert_eq!(second.timestamp_ms, Some(50));
    }

    #[test]
    fn test_untimestamped_ignores_the_clock() {
        let observer = JsonObserver::with_clock(ManualClock::new(7));
        let counters: [&dyn Observable; 0] = [];
        assert!(!observer.to_json(counters).unwrap().contains("timestamp_ms"));
    }

    #[test]
    fn test_to_json_and_reset() {
        let total = Scalar::new().with_name("total");
        let rpm = Windowed::new(Duration::from_secs(60)).with_name("rpm");
        total.incr(75);
        rpm.incr(3);

        let counters: [&dyn Observable; 2] = [&total, &rpm];
        let json = JsonObserver::new().to_json_and_reset(counters).unwrap();
        let snapshot: MetricsSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(snapshot.value_of("total"), Some(75));
        assert_eq!(snapshot.value_of("rpm"), Some(3));
        assert_eq!(total.value(), 0);
        assert_eq!(rpm.rate(), 3);
    }

    #[test]
    fn test_pretty_and_writer_agree() {
        let balance = Scalar::new().with_name("balance");
        balance.incr(-100);
        let counters: [&dyn Observable; 1] = [&balance];

        let observer = JsonObserver::new().pretty(true);
        let text = observer.to_json(counters).unwrap();
        let mut bytes = Vec::new();
        observer.write_to(&mut bytes, counters).unwrap();

        assert!(text.contains('\n'));
        assert!(text.contains("-100"));
        assert_eq!(String::from_utf8(bytes).unwrap(), text);
    }
}

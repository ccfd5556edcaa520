//! User-visible status feed.
//!
//! Every orchestrator transition reports a [`StatusEvent`]. The feed
//! either keeps only the newest event (each new event replaces the
//! previous one) or a bounded history, per [`Retention`].

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// The raw millisecond count.
    #[must_use]
    pub const fn millis(self) -> u64 {
        self.0
    }
}

/// Source of the current time.
///
/// Production code uses [`SystemClock`]; tests pin time with a fixed
/// implementation so status events and cache-busting URLs are
/// reproducible.
pub trait Clock {
    /// The current wall-clock time.
    fn now(&self) -> Timestamp;
}

/// Wall clock backed by `web-time` (`Date.now()` on WASM,
/// `SystemTime` on native).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let millis = web_time::SystemTime::now()
            .duration_since(web_time::UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
        Timestamp(millis)
    }
}

/// How prominent a status message is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Progress report.
    Info,
    /// The run finished and produced results.
    Success,
    /// Something was skipped or rejected without aborting.
    Warning,
    /// The run (or a layer) failed.
    Error,
}

impl Severity {
    /// Whether hosts may hide messages of this severity after a delay.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Info | Self::Warning)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// One message in the status feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    /// When the event was emitted.
    pub timestamp: Timestamp,
    /// Human-readable message.
    pub message: String,
    /// Message prominence.
    pub severity: Severity,
}

/// How many events the feed keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Retention {
    /// Only the most recent event; each push clears the rest.
    #[default]
    Latest,
    /// Up to `capacity` events, oldest dropped first.
    History {
        /// Maximum number of retained events (at least 1).
        capacity: usize,
    },
}

/// Append-only feed of status events with a retention policy.
#[derive(Debug, Clone, Default)]
pub struct StatusFeed {
    retention: Retention,
    events: VecDeque<StatusEvent>,
}

impl StatusFeed {
    /// An empty feed.
    #[must_use]
    pub const fn new(retention: Retention) -> Self {
        Self {
            retention,
            events: VecDeque::new(),
        }
    }

    /// Append an event, dropping whatever the retention policy evicts.
    pub fn push(&mut self, event: StatusEvent) {
        let capacity = match self.retention {
            Retention::Latest => 1,
            Retention::History { capacity } => capacity.max(1),
        };
        while self.events.len() >= capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// The newest event, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&StatusEvent> {
        self.events.back()
    }

    /// Retained events, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &StatusEvent> {
        self.events.iter()
    }

    /// Number of retained events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if no event has been retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The active retention policy.
    #[must_use]
    pub const fn retention(&self) -> Retention {
        self.retention
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(n: u64, severity: Severity) -> StatusEvent {
        StatusEvent {
            timestamp: Timestamp(n),
            message: format!("event {n}"),
            severity,
        }
    }

    #[test]
    fn latest_retention_keeps_only_newest() {
        let mut feed = StatusFeed::new(Retention::Latest);
        feed.push(event(1, Severity::Info));
        feed.push(event(2, Severity::Error));
        assert_eq!(feed.len(), 1);
        assert_eq!(feed.latest().map(|e| e.timestamp), Some(Timestamp(2)));
    }

    #[test]
    fn history_retention_drops_oldest() {
        let mut feed = StatusFeed::new(Retention::History { capacity: 2 });
        for n in 1..=3 {
            feed.push(event(n, Severity::Info));
        }
        let kept: Vec<_> = feed.events().map(|e| e.timestamp.millis()).collect();
        assert_eq!(kept, [2, 3]);
    }

    #[test]
    fn zero_capacity_behaves_like_latest() {
        let mut feed = StatusFeed::new(Retention::History { capacity: 0 });
        feed.push(event(1, Severity::Info));
        feed.push(event(2, Severity::Info));
        assert_eq!(feed.len(), 1);
    }

    #[test]
    fn default_feed_is_empty_and_latest() {
        let feed = StatusFeed::default();
        assert!(feed.is_empty());
        assert!(feed.latest().is_none());
        assert_eq!(feed.retention(), Retention::Latest);
    }

    #[test]
    fn transient_severities() {
        assert!(Severity::Info.is_transient());
        assert!(Severity::Warning.is_transient());
        assert!(!Severity::Success.is_transient());
        assert!(!Severity::Error.is_transient());
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now().millis() > 1_577_836_800_000);
    }

    #[test]
    fn retention_serde_shape() {
        let json = serde_json::to_string(&Retention::History { capacity: 4 }).unwrap_or_default();
        assert_eq!(json, r#"{"mode":"history","capacity":4}"#);
    }
}

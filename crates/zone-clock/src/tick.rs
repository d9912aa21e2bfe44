//! A low frequency refresh signal for "now" relative displays.
use std::time::{Duration, Instant};

/// Default refresh period.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(60);

/// Polled by a presentation layer to know when to re-render "now" relative values (e.g. the
/// live times in city search results). It never touches the canonical instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticker {
    interval: Duration,
    next: Instant,
}

impl Ticker {
    /// First tick fires `interval` after `start`. A zero interval is bumped to one millisecond,
    /// and one too large to schedule is replaced with [`DEFAULT_TICK_INTERVAL`].
    pub fn new(interval: Duration, start: Instant) -> Self {
        let interval = interval.max(Duration::from_millis(1));

        match start.checked_add(interval) {
            Some(next) => Self { interval, next },
            None => {
                tracing::warn!(message = "tick interval out of range, using default", ?interval);
                Self {
                    interval: DEFAULT_TICK_INTERVAL,
                    next: start.checked_add(DEFAULT_TICK_INTERVAL).unwrap_or(start),
                }
            }
        }
    }

    /// The refresh period.
    #[inline]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// When the next tick is due.
    #[inline]
    pub const fn next_due(&self) -> Instant {
        self.next
    }

    /// Returns true if a tick is due at `now`. Missed ticks are coalesced into one, and the
    /// schedule stays aligned to the first tick. If the ticker fell too far behind to step
    /// forward, the schedule restarts from `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }

        let behind = now.duration_since(self.next);
        let missed = u32::try_from(behind.as_nanos() / self.interval.as_nanos()).unwrap_or(u32::MAX);

        self.next = missed
            .checked_add(1)
            .and_then(|steps| self.interval.checked_mul(steps))
            .and_then(|step| self.next.checked_add(step))
            .unwrap_or_else(|| now.checked_add(self.interval).unwrap_or(now));
        true
    }
}

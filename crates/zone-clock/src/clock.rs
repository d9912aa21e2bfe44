//! Time sources, and the shared [`ClockState`] every zone renders against.
use std::cell::Cell;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::convert::{apply_slider_minutes, minutes_since_midnight, parse_user_time_text};
use crate::CanonicalInstant;

/// Source of the current time.
pub trait Clock {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;

    /// Current monotonic time, used for the add/remove transitions.
    fn monotonic(&self) -> Instant {
        Instant::now()
    }
}

impl<C> Clock for &C
where
    C: Clock + ?Sized,
{
    fn now(&self) -> DateTime<Utc> {
        C::now(self)
    }

    fn monotonic(&self) -> Instant {
        C::monotonic(self)
    }
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    wall: Cell<DateTime<Utc>>,
    mono: Cell<Instant>,
}

impl ManualClock {
    /// Starts at `wall`.
    pub fn new(wall: DateTime<Utc>) -> Self {
        Self {
            wall: Cell::new(wall),
            mono: Cell::new(Instant::now()),
        }
    }

    /// Moves both the wall clock and the monotonic clock forward.
    pub fn advance(&self, by: Duration) {
        let delta = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::zero());
        self.wall.set(self.wall.get() + delta);
        self.mono.set(self.mono.get() + by);
    }

    /// Jumps the wall clock, leaving the monotonic clock alone.
    pub fn set(&self, wall: DateTime<Utc>) {
        self.wall.set(wall);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.wall.get()
    }

    fn monotonic(&self) -> Instant {
        self.mono.get()
    }
}

/// Detects the viewer's zone, falling back to UTC if the system zone can't be determined or
/// isn't known to `chrono-tz`.
pub fn local_timezone() -> Tz {
    match iana_time_zone::get_timezone() {
        Ok(name) => match name.parse::<Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                tracing::warn!(message = "unknown system time zone, using UTC", %name);
                Tz::UTC
            }
        },
        Err(error) => {
            tracing::warn!(message = "could not detect system time zone, using UTC", %error);
            Tz::UTC
        }
    }
}

/// The canonical instant of a session, and the only ways to change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockState {
    instant: CanonicalInstant,
    live: bool,
}

impl ClockState {
    /// Starts at `now`, anchored to the viewer's zone.
    pub fn new(now: DateTime<Utc>, anchor: Tz) -> Self {
        Self {
            instant: CanonicalInstant::new(now, anchor),
            live: true,
        }
    }

    /// The current shared instant.
    #[inline]
    pub const fn instant(&self) -> &CanonicalInstant {
        &self.instant
    }

    /// The viewer's zone.
    #[inline]
    pub const fn anchor(&self) -> Tz {
        self.instant.anchor()
    }

    /// False once the user moved the slider or edited a time, until the next reset.
    #[inline]
    pub const fn is_live(&self) -> bool {
        self.live
    }

    /// Slider position: minutes since midnight in the anchor zone.
    pub fn slider_minutes(&self) -> u16 {
        minutes_since_midnight(&self.instant, self.anchor())
    }

    /// Jumps back to `now`.
    pub fn reset_to_now(&mut self, now: DateTime<Utc>) {
        self.instant = CanonicalInstant::new(now, self.anchor());
        self.live = true;
    }

    /// Moves the anchor zone's clock to `minutes` past midnight.
    pub fn set_from_slider(&mut self, minutes: u16) {
        self.instant = apply_slider_minutes(&self.instant, minutes, self.anchor());
        self.live = false;
    }

    /// Sets the time as read in `tz` from user typed text. Returns false, leaving the instant
    /// untouched, if the text isn't a recognizable time.
    pub fn set_from_pill_edit(&mut self, tz: Tz, text: &str) -> bool {
        match parse_user_time_text(text, &self.instant, tz) {
            Ok(instant) => {
                self.instant = instant;
                self.live = false;
                true
            }
            Err(error) => {
                tracing::debug!(message = "ignoring time edit", zone = tz.name(), %error);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Timelike};

    use super::*;
    use crate::convert::localize;

    fn start() -> ClockState {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        ClockState::new(now, Tz::Asia__Kolkata)
    }

    #[test]
    fn test_slider_moves_anchor_clock() {
        let mut state = start();
        assert_eq!(state.slider_minutes(), 17 * 60 + 30);

        state.set_from_slider(6 * 60 + 15);
        assert_eq!(state.slider_minutes(), 6 * 60 + 15);
        assert_eq!(localize(state.instant(), Tz::Asia__Kolkata).hour_minute, "6:15 AM");
        assert!(!state.is_live());
    }

    #[test]
    fn test_pill_edit() {
        let mut state = start();

        assert!(state.set_from_pill_edit(Tz::Europe__London, "9:05 AM"));
        assert_eq!(state.instant().in_zone(Tz::Europe__London).hour(), 9);
        assert_eq!(state.instant().in_zone(Tz::Europe__London).minute(), 5);
        // the anchor is untouched, 9:05 BST is 13:35 IST
        assert_eq!(state.slider_minutes(), 13 * 60 + 35);
    }

    #[test]
    fn test_unrecognized_edit_keeps_instant() {
        let mut state = start();
        let before = *state.instant();

        assert!(!state.set_from_pill_edit(Tz::UTC, "tea time"));
        assert_eq!(*state.instant(), before);
        assert!(state.is_live());
    }

    #[test]
    fn test_reset_to_now() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap());
        let mut state = ClockState::new(clock.now(), Tz::UTC);

        state.set_from_slider(0);
        clock.advance(Duration::from_secs(90));
        state.reset_to_now(clock.now());

        assert!(state.is_live());
        assert_eq!(state.instant().utc(), Utc.with_ymd_and_hms(2024, 6, 15, 12, 1, 30).unwrap());
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let mono = clock.monotonic();

        clock.advance(Duration::from_millis(1500));
        assert_eq!(clock.monotonic() - mono, Duration::from_millis(1500));
        assert_eq!(clock.now().second(), 1);
    }

    #[test]
    fn test_local_timezone_is_usable() {
        // whatever the host says, we always get a zone back
        let tz = local_timezone();
        assert!(!tz.name().is_empty());
    }
}

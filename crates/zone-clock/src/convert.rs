//! Pure conversions between a [`CanonicalInstant`] and the wall-clock readings shown for each
//! zone.
//!
//! Edits always happen relative to one zone's local reading of the shared instant: editing the
//! time shown for zone X produces the instant at which X's clock reads the typed value, and every
//! other zone just re-localizes that same instant.
use std::str::FromStr;

use chrono::offset::LocalResult;
use chrono::{DateTime, NaiveDateTime, Offset, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::parse::{WallTime, parse_wall_time};
use crate::{CanonicalInstant, Error};

/// First local hour that counts as daytime.
pub const DAY_START_HOUR: u32 = 6;
/// First local hour that counts as night again.
pub const DAY_END_HOUR: u32 = 18;

/// How an instant reads in a specific zone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Localized {
    /// 12 hour clock time, e.g. `5:27 AM`.
    pub hour_minute: String,
    /// Whether the local hour falls in `[6, 18)`.
    pub is_daytime: bool,
}

/// Resolves an IANA zone id, e.g. `Asia/Kolkata`.
pub fn resolve_zone(id: &str) -> Result<Tz, Error> {
    Tz::from_str(id.trim()).map_err(|_| Error::UnknownTimeZone(id.to_owned()))
}

/// Returns true if `hour` (0..24) is a daytime hour.
#[inline]
pub const fn is_daytime_hour(hour: u32) -> bool {
    DAY_START_HOUR <= hour && hour < DAY_END_HOUR
}

/// Formats a zoned datetime the way every time pill shows it.
pub(crate) fn format_hour_minute<Z>(local: &DateTime<Z>) -> String
where
    Z: TimeZone,
    Z::Offset: std::fmt::Display,
{
    local.format("%-I:%M %p").to_string()
}

/// Reads `instant` in `tz`.
pub fn localize(instant: &CanonicalInstant, tz: Tz) -> Localized {
    let local = instant.in_zone(tz);

    Localized {
        hour_minute: format_hour_minute(&local),
        is_daytime: is_daytime_hour(local.hour()),
    }
}

/// Minutes since local midnight in `tz`, in `0..=1439`. Used to position the slider.
pub fn minutes_since_midnight(instant: &CanonicalInstant, tz: Tz) -> u16 {
    let local = instant.in_zone(tz);
    (local.hour() * 60 + local.minute()) as u16
}

/// Moves the instant so the anchor zone's clock reads `minutes` past midnight on the same local
/// date. Seconds and sub-seconds are kept.
pub fn apply_slider_minutes(instant: &CanonicalInstant, minutes: u16, anchor: Tz) -> CanonicalInstant {
    let wall = WallTime::from_minutes(minutes);
    let local = instant.in_zone(anchor);

    let utc = rewrite_wall_clock(&local, wall, local.second(), local.nanosecond());
    CanonicalInstant::new(utc, instant.anchor())
}

/// Parses user typed `text` as a wall-clock time in `tz`, and returns the instant at which `tz`
/// reads that time on the same local date. Seconds are reset to zero.
///
/// On failure the caller is expected to keep `current` as is.
pub fn parse_user_time_text(
    text: &str,
    current: &CanonicalInstant,
    tz: Tz,
) -> Result<CanonicalInstant, Error> {
    let wall = parse_wall_time(text).ok_or_else(|| Error::UnrecognizedTime(text.to_owned()))?;
    let local = current.in_zone(tz);

    let utc = rewrite_wall_clock(&local, wall, 0, 0);
    Ok(CanonicalInstant::new(utc, current.anchor()))
}

/// Replaces the time-of-day of `local`, keeping its date and zone.
///
/// Local times that occur twice (clocks falling back) keep the offset `local` already had when
/// possible, otherwise the earlier of the two is used. Local times that don't exist (clocks
/// springing forward) are interpreted with the offset `local` had, which lands just past the gap.
fn rewrite_wall_clock(local: &DateTime<Tz>, wall: WallTime, second: u32, nanos: u32) -> DateTime<Utc> {
    let tz = local.timezone();
    let current_offset = local.offset().fix();

    // 'wall' is always in range, and 'second'/'nanos' come from an existing datetime (or are 0),
    // so this only fails on a leap second; drop the sub-second part in that case.
    let naive = local
        .date_naive()
        .and_hms_nano_opt(wall.hour, wall.minute, second, nanos)
        .or_else(|| local.date_naive().and_hms_opt(wall.hour, wall.minute, second.min(59)))
        .unwrap_or_else(|| local.naive_local());

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, latest) => {
            if latest.offset().fix() == current_offset {
                latest.with_timezone(&Utc)
            } else {
                earliest.with_timezone(&Utc)
            }
        }
        LocalResult::None => {
            tracing::debug!(message = "wall clock time falls in a gap", %naive, zone = tz.name());
            assume_offset(naive, current_offset.local_minus_utc())
        }
    }
}

fn assume_offset(naive: NaiveDateTime, offset_seconds: i32) -> DateTime<Utc> {
    let utc_naive = naive - chrono::Duration::seconds(offset_seconds as i64);
    Utc.from_utc_datetime(&utc_naive)
}

//! Parsing of user typed wall-clock times, e.g. `5:27 PM` or `17:27`.

use time::format_description::{Component, FormatItem, modifier};
use time::parsing::Parsed;

/// An hour/minute pair on a 24 hour clock. Always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WallTime {
    /// `0..24`
    pub hour: u32,
    /// `0..60`
    pub minute: u32,
}

impl WallTime {
    /// Builds a [`WallTime`], returning [`None`] if either component is out of range.
    pub const fn new(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    /// Splits a number of minutes since midnight. Values past the end of the day are clamped to
    /// `23:59`.
    pub const fn from_minutes(minutes: u16) -> Self {
        let minutes = if minutes > MAX_MINUTES {
            MAX_MINUTES
        } else {
            minutes
        };

        Self {
            hour: (minutes / 60) as u32,
            minute: (minutes % 60) as u32,
        }
    }

    // 'h' hours are read like 24 hour ones; the period only shifts 1-11 PM forward and 12 AM
    // back to midnight, so '17:27 PM' is 17:27 and '0 AM' is midnight.
    fn from_parsed(parsed: &Parsed) -> Option<Self> {
        let hour = match (parsed.hour_24()?, parsed.hour_12_is_pm()) {
            (hour, Some(true)) if hour < 12 => hour + 12,
            (12, Some(false)) => 0,
            (hour, _) => hour,
        };

        Self::new(hour as u32, parsed.minute().unwrap_or(0) as u32)
    }
}

/// Last minute of the day, i.e. `23:59`.
pub const MAX_MINUTES: u16 = 24 * 60 - 1;

// hours are accepted with or without a leading zero ('5' and '05' are both fine), so the
// default (zero padded, exactly 2 digits) modifier doesn't work here.
#[inline(always)]
const fn unpadded_hour() -> modifier::Hour {
    let mut hour = modifier::Hour::default();
    hour.padding = modifier::Padding::None;
    hour.is_12_hour_clock = false;
    hour
}

// used for both 'h' and 'H'; see 'WallTime::from_parsed' for how a period applies.
const HOUR: FormatItem<'static> = FormatItem::Component(Component::Hour(unpadded_hour()));
// minutes are always 2 digits
const MINUTE: FormatItem<'static> =
    FormatItem::Component(Component::Minute(modifier::Minute::default()));
// input is uppercased before parsing, so the default (uppercase, case sensitive) is fine.
const PERIOD: FormatItem<'static> =
    FormatItem::Component(Component::Period(modifier::Period::default()));
const COLON: FormatItem<'static> = FormatItem::Literal(b":");
const SPACE: FormatItem<'static> = FormatItem::Literal(b" ");

/// Accepted formats, tried in this order. The first one that consumes the entire input wins,
/// so `17` falls all the way through to the bare 24 hour format.
const FORMATS: &[(&str, &[FormatItem<'static>])] = &[
    ("h:mm a", &[HOUR, COLON, MINUTE, SPACE, PERIOD]),
    ("h:mma", &[HOUR, COLON, MINUTE, PERIOD]),
    ("H:mm", &[HOUR, COLON, MINUTE]),
    ("h a", &[HOUR, SPACE, PERIOD]),
    ("ha", &[HOUR, PERIOD]),
    ("H", &[HOUR]),
];

fn parse_with(input: &[u8], items: &[FormatItem<'static>]) -> Option<WallTime> {
    let mut parsed = Parsed::new();
    let mut remaining = input;

    for item in items {
        remaining = parsed.parse_item(remaining, item).ok()?;
    }

    // trailing junk means this isn't the right format
    if !remaining.is_empty() {
        return None;
    }

    WallTime::from_parsed(&parsed)
}

/// Parses a wall-clock time typed by a user. Surrounding whitespace is ignored, as is case.
///
/// Returns [`None`] if no format matches.
pub fn parse_wall_time(text: &str) -> Option<WallTime> {
    let cleaned = text.trim().to_uppercase();

    FORMATS.iter().find_map(|(name, items)| {
        let wall = parse_with(cleaned.as_bytes(), items)?;
        tracing::trace!(message = "parsed wall time", format = name, ?wall);
        Some(wall)
    })
}

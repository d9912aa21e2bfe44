//! [`CanonicalInstant`] definition and associated impls.
use std::fmt;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;

use crate::Error;

/// The single absolute point in time every displayed zone renders against.
///
/// Internally this is a UTC datetime, plus the anchor zone (the viewer's own zone) that slider
/// positions are computed in. Two instants are equal if both the point in time and the anchor
/// match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CanonicalInstant {
    utc: DateTime<Utc>,
    anchor: Tz,
}

impl CanonicalInstant {
    /// Builds an instant from any chrono datetime.
    pub fn new<Z>(at: DateTime<Z>, anchor: Tz) -> Self
    where
        Z: TimeZone,
    {
        Self {
            utc: at.with_timezone(&Utc),
            anchor,
        }
    }

    /// The current system time.
    pub fn now(anchor: Tz) -> Self {
        Self::new(Utc::now(), anchor)
    }

    /// The point in time, as a UTC datetime.
    #[inline]
    pub const fn utc(&self) -> DateTime<Utc> {
        self.utc
    }

    /// The anchor (viewer) zone.
    #[inline]
    pub const fn anchor(&self) -> Tz {
        self.anchor
    }

    /// Returns a copy with a different anchor, leaving the point in time as is.
    #[inline]
    pub const fn with_anchor(self, anchor: Tz) -> Self {
        Self {
            utc: self.utc,
            anchor,
        }
    }

    /// The wall-clock reading of this instant in `tz`.
    #[inline]
    pub fn in_zone(&self, tz: Tz) -> DateTime<Tz> {
        self.utc.with_timezone(&tz)
    }

    /// The wall-clock reading in the anchor zone.
    #[inline]
    pub fn in_anchor(&self) -> DateTime<Tz> {
        self.in_zone(self.anchor)
    }

    /// Serializes as an RFC 3339 timestamp (millisecond precision), rendered with the anchor
    /// zone's offset, e.g. `2024-06-15T17:27:00.000+01:00`.
    pub fn to_iso(&self) -> String {
        self.in_anchor().to_rfc3339_opts(SecondsFormat::Millis, false)
    }

    /// Parses the output of [`CanonicalInstant::to_iso`] (or any RFC 3339 timestamp).
    pub fn parse_iso(text: &str, anchor: Tz) -> Result<Self, Error> {
        DateTime::parse_from_rfc3339(text.trim())
            .map(|dt| Self::new(dt, anchor))
            .map_err(|source| Error::Timestamp {
                text: text.to_owned(),
                source,
            })
    }
}

impl fmt::Display for CanonicalInstant {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(&self.to_iso())
    }
}

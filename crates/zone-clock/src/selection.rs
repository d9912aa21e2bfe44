//! The ordered list of zones a user has picked, and the per-zone add/remove lifecycle.
//!
//! Each zone moves through a tiny state machine:
//!
//! ```text
//! add ──► Entering ──(highlight window)──► Active ──request_removal──► Leaving ──(delay)──► dropped
//!                                            ▲                           │
//!                                            └──────cancel_removal───────┘
//! ```
//!
//! Transitions that depend on time only happen in [`Selection::settle`], with a caller supplied
//! `now`, so the list itself never owns a timer.
use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use zone_catalog::ZoneEntry;

/// Opaque, stable identifier for a selected zone. Never reused within a list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    /// Generates a new id for a zone with the given short code, e.g. `lon-5b1f...`.
    pub fn generate(short_code: &str) -> Self {
        Self(format!(
            "{}-{}",
            short_code.to_lowercase(),
            uuid::Uuid::new_v4().simple()
        ))
    }

    /// The id as a string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ZoneId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ZoneId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A zone in the user's list. Serialized with the same field names as the stored payload
/// (`id`, `abbreviation`, `timezone`, `fullName`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedZone {
    /// Stable identity.
    pub id: ZoneId,
    /// Catalog short code, e.g. `LON`.
    #[serde(rename = "abbreviation")]
    pub short_code: String,
    /// IANA zone id, e.g. `Europe/London`.
    pub timezone: String,
    /// Optional display label, e.g. `London, GB`.
    #[serde(
        rename = "fullName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub display_label: Option<String>,
}

impl SelectedZone {
    /// Builds a zone from a catalog entry, with a fresh id and the entry's label.
    pub fn from_entry(entry: &ZoneEntry) -> Self {
        Self {
            id: ZoneId::generate(entry.code),
            short_code: entry.code.to_owned(),
            timezone: entry.iana_id().to_owned(),
            display_label: Some(entry.label()),
        }
    }

    /// Like [`SelectedZone::from_entry`], but without a label (what a shared link restores).
    pub fn from_entry_unlabeled(entry: &ZoneEntry) -> Self {
        Self {
            display_label: None,
            ..Self::from_entry(entry)
        }
    }

    /// Returns true if this zone was picked from `entry`.
    pub fn is_entry(&self, entry: &ZoneEntry) -> bool {
        self.short_code == entry.code && self.timezone == entry.iana_id()
    }
}

/// The list used when nothing was shared or stored: India, Boston, San Francisco, London.
pub fn default_selection() -> Vec<SelectedZone> {
    const DEFAULTS: [(&str, &str, &str); 4] = [
        ("ind", "IND", "Asia/Kolkata"),
        ("bos", "BOS", "America/New_York"),
        ("sf", "SF", "America/Los_Angeles"),
        ("lon", "LON", "Europe/London"),
    ];

    DEFAULTS
        .iter()
        .map(|(id, code, tz)| SelectedZone {
            id: ZoneId::from(*id),
            short_code: (*code).to_owned(),
            timezone: (*tz).to_owned(),
            display_label: None,
        })
        .collect()
}

/// Where a zone is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Just added. Present in the list, flagged as new until `until`.
    Entering {
        /// End of the highlight window.
        until: Instant,
    },
    /// Present and settled.
    Active,
    /// Removal requested. Still present until `due`.
    Leaving {
        /// When the zone actually drops out of the list.
        due: Instant,
    },
}

impl Phase {
    /// Returns true if a removal is pending.
    #[inline]
    pub const fn is_leaving(&self) -> bool {
        matches!(self, Self::Leaving { .. })
    }

    /// Returns true if the zone was just added.
    #[inline]
    pub const fn is_entering(&self) -> bool {
        matches!(self, Self::Entering { .. })
    }

    const fn deadline(&self) -> Option<Instant> {
        match self {
            Self::Entering { until } => Some(*until),
            Self::Active => None,
            Self::Leaving { due } => Some(*due),
        }
    }
}

/// Outcome of [`Selection::request_removal`]. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The zone will be dropped at `due`.
    Scheduled {
        /// When [`Selection::settle`] will drop it.
        due: Instant,
    },
    /// A removal was already pending; nothing changed.
    AlreadyPending,
    /// No zone with that id; nothing changed.
    NotFound,
    /// Refused, since it would leave the list without any zone.
    LastZone,
}

/// What changed during [`Selection::settle`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settled {
    /// Zones whose removal delay elapsed, in list order.
    pub removed: Vec<SelectedZone>,
    /// Number of zones that finished entering.
    pub entered: usize,
}

impl Settled {
    /// Returns true if the list contents changed (and needs persisting).
    #[inline]
    pub fn list_changed(&self) -> bool {
        !self.removed.is_empty()
    }
}

#[derive(Debug, Clone)]
struct Slot {
    zone: SelectedZone,
    phase: Phase,
}

/// Timing of the add/remove transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// How long a newly added zone is flagged as entering.
    pub enter_window: Duration,
    /// How long a zone stays in the list after a removal request.
    pub removal_delay: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            enter_window: Duration::from_millis(50),
            removal_delay: Duration::from_millis(300),
        }
    }
}

/// The ordered list of selected zones. Order is display order.
#[derive(Debug, Clone)]
pub struct Selection {
    slots: Vec<Slot>,
    timing: Timing,
}

impl Selection {
    /// Builds a selection from already known zones, all of them active.
    ///
    /// Ids are kept as is, except that a repeated id is replaced with a freshly generated one so
    /// every id in the list is unique.
    pub fn new(zones: Vec<SelectedZone>, timing: Timing) -> Self {
        let mut seen = HashSet::with_capacity(zones.len());

        let slots = zones
            .into_iter()
            .map(|mut zone| {
                if !seen.insert(zone.id.clone()) {
                    let fresh = ZoneId::generate(&zone.short_code);
                    tracing::warn!(message = "duplicate zone id, reassigning", id = %zone.id, %fresh);
                    seen.insert(fresh.clone());
                    zone.id = fresh;
                }

                Slot {
                    zone,
                    phase: Phase::Active,
                }
            })
            .collect();

        Self { slots, timing }
    }

    /// The timing this selection was built with.
    #[inline]
    pub const fn timing(&self) -> Timing {
        self.timing
    }

    /// Number of zones in the list, including ones with a pending removal.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the list has no zones at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of zones that aren't on their way out.
    pub fn staying_len(&self) -> usize {
        self.slots.iter().filter(|s| !s.phase.is_leaving()).count()
    }

    /// Returns true if another zone may be removed without emptying the list.
    #[inline]
    pub fn can_remove(&self) -> bool {
        self.staying_len() > 1
    }

    /// Iterates over the zones, in display order.
    pub fn zones(&self) -> impl Iterator<Item = &SelectedZone> + '_ {
        self.slots.iter().map(|slot| &slot.zone)
    }

    /// Iterates over the zones along with their phase, in display order.
    pub fn iter(&self) -> impl Iterator<Item = (&SelectedZone, Phase)> + '_ {
        self.slots.iter().map(|slot| (&slot.zone, slot.phase))
    }

    /// Clones the zones out, in display order.
    pub fn to_vec(&self) -> Vec<SelectedZone> {
        self.zones().cloned().collect()
    }

    /// Looks up a zone by id.
    pub fn get(&self, id: &ZoneId) -> Option<&SelectedZone> {
        self.slot(id).map(|slot| &slot.zone)
    }

    /// The phase of a zone, if present.
    pub fn phase(&self, id: &ZoneId) -> Option<Phase> {
        self.slot(id).map(|slot| slot.phase)
    }

    /// Returns true if a zone was picked from this catalog entry already.
    pub fn contains_entry(&self, entry: &ZoneEntry) -> bool {
        self.zones().any(|zone| zone.is_entry(entry))
    }

    fn slot(&self, id: &ZoneId) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.zone.id == *id)
    }

    fn slot_mut(&mut self, id: &ZoneId) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|slot| slot.zone.id == *id)
    }

    /// Appends a zone to the end of the list. It's immediately present, and flagged as entering
    /// for the highlight window.
    ///
    /// If the id is already in the list, a fresh one is generated. Returns the id in use.
    pub fn add(&mut self, mut zone: SelectedZone, now: Instant) -> ZoneId {
        if self.slot(&zone.id).is_some() {
            zone.id = ZoneId::generate(&zone.short_code);
        }

        let id = zone.id.clone();
        self.slots.push(Slot {
            zone,
            phase: Phase::Entering {
                until: now + self.timing.enter_window,
            },
        });

        id
    }

    /// Starts the two-phase removal of a zone. The zone stays in the list until [`settle`] is
    /// called at or after the returned deadline.
    ///
    /// [`settle`]: Selection::settle
    pub fn request_removal(&mut self, id: &ZoneId, now: Instant) -> Removal {
        let can_remove = self.can_remove();
        let delay = self.timing.removal_delay;

        let Some(slot) = self.slot_mut(id) else {
            return Removal::NotFound;
        };

        match slot.phase {
            Phase::Leaving { .. } => Removal::AlreadyPending,
            _ if !can_remove => Removal::LastZone,
            _ => {
                let due = now + delay;
                slot.phase = Phase::Leaving { due };
                Removal::Scheduled { due }
            }
        }
    }

    /// Cancels a pending removal. Returns true if one was pending.
    pub fn cancel_removal(&mut self, id: &ZoneId) -> bool {
        match self.slot_mut(id) {
            Some(slot) if slot.phase.is_leaving() => {
                slot.phase = Phase::Active;
                true
            }
            _ => false,
        }
    }

    /// Applies every transition that's due at `now`: entering zones become active, leaving zones
    /// whose delay elapsed are dropped.
    pub fn settle(&mut self, now: Instant) -> Settled {
        let mut settled = Settled::default();

        let mut idx = 0;
        while idx < self.slots.len() {
            match self.slots[idx].phase {
                Phase::Leaving { due } if due <= now => {
                    settled.removed.push(self.slots.remove(idx).zone);
                    continue;
                }
                Phase::Entering { until } if until <= now => {
                    self.slots[idx].phase = Phase::Active;
                    settled.entered += 1;
                }
                _ => (),
            }

            idx += 1;
        }

        settled
    }

    /// The next time [`Selection::settle`] has something to do, if anything is pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots.iter().filter_map(|slot| slot.phase.deadline()).min()
    }
}

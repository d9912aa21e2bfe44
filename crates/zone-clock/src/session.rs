//! [`Session`] ties the zone list, the shared clock and persistence together.
//!
//! Every method here runs to completion synchronously. Time based work (finishing removals,
//! clearing the "new" flag, refresh ticks) only happens when the caller asks for it through
//! [`Session::settle`] and [`Session::tick`], using [`Session::next_deadline`] to know when.
use std::time::Instant;

use chrono_tz::Tz;
use zone_catalog::ZoneEntry;

use crate::clock::{Clock, ClockState, SystemClock};
use crate::config::Settings;
use crate::convert::{Localized, format_hour_minute, localize, resolve_zone};
use crate::persist::PersistenceAdapter;
use crate::selection::{Removal, SelectedZone, Selection, Settled, ZoneId};
use crate::tick::Ticker;
use crate::CanonicalInstant;

/// One line of the zone list, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneRow {
    /// Identity of the zone.
    pub id: ZoneId,
    /// Catalog short code.
    pub short_code: String,
    /// Optional display label.
    pub label: Option<String>,
    /// The shared instant as read in this zone. [`None`] if the stored zone id isn't a known
    /// IANA zone.
    pub localized: Option<Localized>,
    /// Just added, still inside the highlight window.
    pub entering: bool,
    /// Removal requested, waiting for the delay to pass.
    pub leaving: bool,
    /// Whether a remove control should be offered.
    pub can_remove: bool,
}

/// A city search result, with the city's current local time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// The matching catalog entry.
    pub entry: &'static ZoneEntry,
    /// Real current time in the city (not the shared instant).
    pub now: Localized,
}

/// A single converter session.
#[derive(Debug)]
pub struct Session<P, C = SystemClock> {
    persistence: P,
    clock: C,
    selection: Selection,
    time: ClockState,
    ticker: Ticker,
    search_limit: usize,
}

impl<P, C> Session<P, C>
where
    P: PersistenceAdapter,
    C: Clock,
{
    /// Loads the initial zone list, starts the shared clock at "now", and writes the list back
    /// out so the shareable address reflects it right away.
    pub fn start(persistence: P, clock: C, settings: &Settings) -> Self {
        Self::start_with_anchor(persistence, clock, settings, settings.anchor())
    }

    /// Like [`Session::start`], with an explicit viewer zone.
    pub fn start_with_anchor(mut persistence: P, clock: C, settings: &Settings, anchor: Tz) -> Self {
        let selection = Selection::new(persistence.load(), settings.timing());
        persistence.save(&selection.to_vec());

        let time = ClockState::new(clock.now(), anchor);
        let ticker = Ticker::new(settings.tick_interval(), clock.monotonic());

        tracing::debug!(
            message = "session started",
            zones = selection.len(),
            anchor = anchor.name(),
            instant = %time.instant(),
        );

        Self {
            persistence,
            clock,
            selection,
            time,
            ticker,
            search_limit: settings.search_limit,
        }
    }

    /// The zone list.
    #[inline]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The shared clock.
    #[inline]
    pub fn clock_state(&self) -> &ClockState {
        &self.time
    }

    /// The shared instant.
    #[inline]
    pub fn instant(&self) -> &CanonicalInstant {
        self.time.instant()
    }

    /// The persistence adapter.
    #[inline]
    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// The time source.
    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn persist(&mut self) {
        self.persistence.save(&self.selection.to_vec());
    }

    fn zone_tz(zone: &SelectedZone) -> Option<Tz> {
        match resolve_zone(&zone.timezone) {
            Ok(tz) => Some(tz),
            Err(error) => {
                tracing::warn!(message = "zone can't be displayed", id = %zone.id, %error);
                None
            }
        }
    }

    // ------------------------------------ rendering ------------------------------------- //

    /// The zone list, in display order, each with the shared instant localized.
    pub fn rows(&self) -> Vec<ZoneRow> {
        let can_remove = self.selection.can_remove();

        self.selection
            .iter()
            .map(|(zone, phase)| ZoneRow {
                id: zone.id.clone(),
                short_code: zone.short_code.clone(),
                label: zone.display_label.clone(),
                localized: Self::zone_tz(zone).map(|tz| localize(self.instant(), tz)),
                entering: phase.is_entering(),
                leaving: phase.is_leaving(),
                can_remove: can_remove && !phase.is_leaving(),
            })
            .collect()
    }

    /// The shared instant as read in one zone of the list.
    pub fn localize_zone(&self, id: &ZoneId) -> Option<Localized> {
        let zone = self.selection.get(id)?;
        Self::zone_tz(zone).map(|tz| localize(self.instant(), tz))
    }

    /// Slider position, in minutes since midnight in the viewer's zone.
    #[inline]
    pub fn slider_minutes(&self) -> u16 {
        self.time.slider_minutes()
    }

    /// The viewer's local time, as shown above the slider.
    pub fn slider_label(&self) -> String {
        format_hour_minute(&self.instant().in_anchor())
    }

    /// Catalog search, hiding cities already in the list.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let now = CanonicalInstant::new(self.clock.now(), self.time.anchor());

        zone_catalog::search(query, self.search_limit, |entry| self.selection.contains_entry(entry))
            .into_iter()
            .map(|entry| SearchHit {
                entry,
                now: localize(&now, entry.timezone),
            })
            .collect()
    }

    // ---------------------------------- clock mutators ---------------------------------- //

    /// Moves the viewer's clock to `minutes` past midnight.
    pub fn set_from_slider(&mut self, minutes: u16) {
        self.time.set_from_slider(minutes);
    }

    /// Sets the shared instant from text typed into a zone's time. Returns false (and changes
    /// nothing) if the zone is unknown or the text isn't a recognizable time.
    pub fn set_from_pill_edit(&mut self, id: &ZoneId, text: &str) -> bool {
        let Some(tz) = self.selection.get(id).and_then(Self::zone_tz) else {
            return false;
        };

        self.time.set_from_pill_edit(tz, text)
    }

    /// Jumps the shared instant back to the current time.
    pub fn reset_to_now(&mut self) {
        let now = self.clock.now();
        self.time.reset_to_now(now);
    }

    // -------------------------------- selection mutators -------------------------------- //

    /// Appends a city to the list, labeled with its name. Returns the new zone's id.
    pub fn add(&mut self, entry: &ZoneEntry) -> ZoneId {
        let id = self
            .selection
            .add(SelectedZone::from_entry(entry), self.clock.monotonic());

        tracing::debug!(message = "zone added", %id, code = entry.code);
        self.persist();
        id
    }

    /// Appends a city by short code. [`None`] if the code isn't in the catalog.
    pub fn add_by_code(&mut self, code: &str) -> Option<ZoneId> {
        let entry = zone_catalog::find_by_short_code(code)?;
        Some(self.add(entry))
    }

    /// Starts removing a zone. It stays listed (flagged as leaving) until [`Session::settle`]
    /// runs after the removal delay.
    pub fn remove(&mut self, id: &ZoneId) -> Removal {
        let removal = self.selection.request_removal(id, self.clock.monotonic());
        tracing::debug!(message = "zone removal requested", %id, ?removal);
        removal
    }

    /// Cancels a pending removal.
    pub fn cancel_removal(&mut self, id: &ZoneId) -> bool {
        self.selection.cancel_removal(id)
    }

    /// Completes any due transitions, persisting the list if zones were dropped.
    pub fn settle(&mut self) -> Settled {
        let settled = self.selection.settle(self.clock.monotonic());

        if settled.list_changed() {
            self.persist();
        }

        settled
    }

    /// When [`Session::settle`] next has work to do.
    #[inline]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.selection.next_deadline()
    }

    /// Returns true once per refresh interval. Never changes the shared instant.
    pub fn tick(&mut self) -> bool {
        self.ticker.poll(self.clock.monotonic())
    }
}

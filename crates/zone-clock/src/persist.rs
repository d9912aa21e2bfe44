//! Loading and saving the selected zone list.
//!
//! The list is kept in two places: a durable store (full payload, including display labels), and
//! the shareable address (short codes only). On startup the address wins over the store, which
//! wins over the built-in default list. Nothing here ever fails loudly: a broken payload or an
//! unavailable store is logged and skipped.
use crate::config::Settings;
use crate::location::Location;
use crate::selection::{SelectedZone, default_selection};
use crate::storage::Storage;

/// Default storage key for the serialized zone list.
pub const DEFAULT_STORAGE_KEY: &str = "timezone-converter-locations";

/// Where the session's zone list comes from and goes to.
pub trait PersistenceAdapter {
    /// Produces the initial list. Never empty.
    fn load(&self) -> Vec<SelectedZone>;

    /// Persists the current list. Best effort.
    fn save(&mut self, zones: &[SelectedZone]);
}

impl<P> PersistenceAdapter for &mut P
where
    P: PersistenceAdapter + ?Sized,
{
    fn load(&self) -> Vec<SelectedZone> {
        P::load(self)
    }

    fn save(&mut self, zones: &[SelectedZone]) {
        P::save(self, zones)
    }
}

/// Which tier of the precedence chain produced the initial list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// Short codes in the address.
    Location,
    /// The durable store.
    Storage,
    /// The built-in default list.
    Default,
}

/// [`PersistenceAdapter`] backed by a [`Storage`] and a [`Location`].
#[derive(Debug, Clone)]
pub struct Persistence<S> {
    storage: S,
    location: Location,
    key: String,
}

impl<S> Persistence<S>
where
    S: Storage,
{
    /// Persists under [`DEFAULT_STORAGE_KEY`].
    pub fn new(storage: S, location: Location) -> Self {
        Self::with_key(storage, location, DEFAULT_STORAGE_KEY)
    }

    /// Persists under a custom storage key.
    pub fn with_key(storage: S, location: Location, key: impl Into<String>) -> Self {
        Self {
            storage,
            location,
            key: key.into(),
        }
    }

    /// Uses the storage key and query parameter from `settings`.
    pub fn from_settings(storage: S, location: Location, settings: &Settings) -> Self {
        let location = location.with_param(settings.query_param.clone());
        Self::with_key(storage, location, settings.storage_key.as_str())
    }

    /// The underlying store.
    #[inline]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The current shareable address, reflecting the last saved list.
    #[inline]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Splits back into the store and the address.
    pub fn into_parts(self) -> (S, Location) {
        (self.storage, self.location)
    }

    /// Runs the precedence chain: address, then store, then the default list. Also reports
    /// which one was used.
    pub fn load_initial_selection(&self) -> (Source, Vec<SelectedZone>) {
        if let Some(zones) = self.load_from_location() {
            return (Source::Location, zones);
        }

        if let Some(zones) = self.load_from_storage() {
            return (Source::Storage, zones);
        }

        (Source::Default, default_selection())
    }

    /// Zones named in the address, each with a fresh id. Unknown codes are dropped; if none are
    /// known this returns [`None`].
    fn load_from_location(&self) -> Option<Vec<SelectedZone>> {
        let codes = self.location.zone_codes()?;

        let zones: Vec<SelectedZone> = codes
            .iter()
            .filter_map(|code| match zone_catalog::find_by_short_code(code) {
                Some(entry) => Some(SelectedZone::from_entry_unlabeled(entry)),
                None => {
                    tracing::debug!(message = "dropping unknown short code", %code);
                    None
                }
            })
            .collect();

        if zones.is_empty() {
            tracing::debug!(message = "no known zones in location", location = %self.location);
            return None;
        }

        Some(zones)
    }

    /// The stored list, verbatim, if there is a non-empty, well formed one.
    fn load_from_storage(&self) -> Option<Vec<SelectedZone>> {
        let payload = match self.storage.get(&self.key) {
            Ok(Some(payload)) => payload,
            Ok(None) => return None,
            Err(error) => {
                tracing::error!(message = "failed to read stored zones", key = %self.key, %error);
                return None;
            }
        };

        match serde_json::from_str::<Vec<SelectedZone>>(&payload) {
            Ok(zones) if !zones.is_empty() => Some(zones),
            Ok(_) => None,
            Err(error) => {
                tracing::error!(message = "failed to parse stored zones", key = %self.key, %error);
                None
            }
        }
    }

    /// Writes the list to the store, and its short codes to the address. Either write may fail
    /// independently; failures are logged.
    pub fn persist(&mut self, zones: &[SelectedZone]) {
        match serde_json::to_string(zones) {
            Ok(payload) => {
                if let Err(error) = self.storage.set(&self.key, &payload) {
                    tracing::error!(message = "failed to save zones", key = %self.key, %error);
                }
            }
            Err(error) => tracing::error!(message = "failed to serialize zones", %error),
        }

        self.location
            .set_zone_codes(zones.iter().map(|zone| zone.short_code.as_str()));
    }
}

impl<S> PersistenceAdapter for Persistence<S>
where
    S: Storage,
{
    fn load(&self) -> Vec<SelectedZone> {
        let (source, zones) = self.load_initial_selection();
        tracing::info!(message = "loaded zones", ?source, count = zones.len());
        zones
    }

    fn save(&mut self, zones: &[SelectedZone]) {
        self.persist(zones)
    }
}

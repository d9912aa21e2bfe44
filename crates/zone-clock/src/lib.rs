#![deny(clippy::suspicious, clippy::complexity, clippy::perf, clippy::style)]
#![deny(missing_docs)]
//! Keeps one shared instant consistent across a user picked list of time zones.
//!
//! The pieces, leaf to root:
//!
//! - [`zone_catalog`]: the fixed table of cities, looked up by short code.
//! - [`persist`]: loads/saves the zone list, from a shareable address ([`Location`]) and a
//!   durable [`Storage`] backend.
//! - [`convert`]: pure conversions between the shared [`CanonicalInstant`] and what each zone's
//!   clock reads, including parsing user typed times.
//! - [`selection`]: the ordered zone list, with a two-phase removal.
//! - [`clock`]: the shared instant and the only ways to change it.
//!
//! [`Session`] composes all of them.
//!
//! ```no_run
//! use zone_clock::{Location, MemoryStorage, Persistence, Session, Settings, SystemClock};
//!
//! let settings = Settings::load(None)?;
//! let location = Location::parse("https://example.com/?zones=LON,PAR")?;
//! let persistence = Persistence::from_settings(MemoryStorage::new(), location, &settings);
//! let mut session = Session::start(persistence, SystemClock, &settings);
//!
//! let paris = session.rows()[1].id.clone();
//! session.set_from_pill_edit(&paris, "5:27 PM");
//!
//! for row in session.rows() {
//!     println!("{} {:?}", row.short_code, row.localized);
//! }
//! # Ok::<(), zone_clock::Error>(())
//! ```

pub mod clock;
pub mod config;
pub mod convert;
pub mod error;
mod instant;
pub mod location;
pub mod logging;
pub mod parse;
pub mod persist;
pub mod selection;
pub mod session;
pub mod storage;
pub mod tick;

pub use zone_catalog;

pub use crate::clock::{Clock, ClockState, ManualClock, SystemClock};
pub use crate::config::Settings;
pub use crate::convert::Localized;
pub use crate::error::{Error, StorageError};
pub use crate::instant::CanonicalInstant;
pub use crate::location::Location;
pub use crate::persist::{Persistence, PersistenceAdapter, Source};
pub use crate::selection::{Removal, SelectedZone, Selection, ZoneId};
pub use crate::session::{SearchHit, Session, ZoneRow};
pub use crate::storage::{FileStorage, MemoryStorage, Storage};
pub use crate::tick::Ticker;

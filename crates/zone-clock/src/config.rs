//! Session [`Settings`], loaded from JSON with environment overrides.
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::Deserialize;

use crate::clock::local_timezone;
use crate::convert::resolve_zone;
use crate::location::DEFAULT_QUERY_PARAM;
use crate::persist::DEFAULT_STORAGE_KEY;
use crate::selection::Timing;
use crate::storage::FileStorage;
use crate::tick::DEFAULT_TICK_INTERVAL;
use crate::Error;

/// Prefix for environment variable overrides, e.g. `ZONE_CLOCK_ANCHOR_TIMEZONE`.
pub const ENV_PREFIX: &str = "ZONE_CLOCK_";

/// Tunables for a session. Every field has a default, so an empty JSON object is valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Storage key for the serialized zone list.
    pub storage_key: String,
    /// Query parameter carrying the short codes.
    pub query_param: String,
    /// Maximum number of city search results.
    pub search_limit: usize,
    /// Delay between a removal request and the zone leaving the list.
    pub removal_delay_ms: u64,
    /// How long a newly added zone is flagged as new.
    pub add_highlight_ms: u64,
    /// Refresh period for "now" relative displays.
    pub tick_interval_secs: u64,
    /// IANA id of the viewer's zone. Detected from the system when unset.
    pub anchor_timezone: Option<String>,
    /// Directory for file backed storage.
    pub storage_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        let timing = Timing::default();

        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_owned(),
            query_param: DEFAULT_QUERY_PARAM.to_owned(),
            search_limit: zone_catalog::DEFAULT_SEARCH_LIMIT,
            removal_delay_ms: timing.removal_delay.as_millis() as u64,
            add_highlight_ms: timing.enter_window.as_millis() as u64,
            tick_interval_secs: DEFAULT_TICK_INTERVAL.as_secs(),
            anchor_timezone: None,
            storage_dir: None,
        }
    }
}

impl Settings {
    /// Parses settings from a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads settings from an optional JSON file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let mut settings = match path {
            Some(path) => Self::from_json_str(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };

        settings.apply_overrides(std::env::vars());
        Ok(settings)
    }

    /// Applies `ZONE_CLOCK_*` overrides from `vars`. Values that don't parse are logged and
    /// ignored.
    pub fn apply_overrides<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        fn parse_num<T: std::str::FromStr>(name: &str, value: &str, dst: &mut T) {
            match value.trim().parse() {
                Ok(parsed) => *dst = parsed,
                Err(_) => tracing::warn!(message = "ignoring invalid setting override", setting = name, value),
            }
        }

        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref();

            match name {
                "STORAGE_KEY" => self.storage_key = value.to_owned(),
                "QUERY_PARAM" => self.query_param = value.to_owned(),
                "SEARCH_LIMIT" => parse_num(name, value, &mut self.search_limit),
                "REMOVAL_DELAY_MS" => parse_num(name, value, &mut self.removal_delay_ms),
                "ADD_HIGHLIGHT_MS" => parse_num(name, value, &mut self.add_highlight_ms),
                "TICK_INTERVAL_SECS" => parse_num(name, value, &mut self.tick_interval_secs),
                "ANCHOR_TIMEZONE" => self.anchor_timezone = Some(value.to_owned()),
                "STORAGE_DIR" => self.storage_dir = Some(PathBuf::from(value)),
                _ => tracing::debug!(message = "unknown setting override", setting = name),
            }
        }
    }

    /// Add/remove transition timing.
    pub fn timing(&self) -> Timing {
        Timing {
            enter_window: Duration::from_millis(self.add_highlight_ms),
            removal_delay: Duration::from_millis(self.removal_delay_ms),
        }
    }

    /// Refresh period for the [`Ticker`](crate::tick::Ticker).
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    /// File backed storage in [`Settings::storage_dir`], if one is configured.
    pub fn file_storage(&self) -> Option<FileStorage> {
        self.storage_dir.as_deref().map(FileStorage::new)
    }

    /// The viewer's zone: the configured one if it's valid, otherwise the system's.
    pub fn anchor(&self) -> Tz {
        match self.anchor_timezone.as_deref().map(resolve_zone) {
            Some(Ok(tz)) => tz,
            Some(Err(error)) => {
                tracing::warn!(message = "invalid anchor time zone, detecting instead", %error);
                local_timezone()
            }
            None => local_timezone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::from_json_str("{}").unwrap();

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.storage_key, "timezone-converter-locations");
        assert_eq!(settings.query_param, "zones");
        assert_eq!(settings.search_limit, 8);
        assert_eq!(settings.timing(), Timing::default());
        assert_eq!(settings.tick_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_partial_json() {
        let settings =
            Settings::from_json_str(r#"{ "removal_delay_ms": 0, "anchor_timezone": "Asia/Tokyo" }"#)
                .unwrap();

        assert_eq!(settings.timing().removal_delay, Duration::ZERO);
        assert_eq!(settings.anchor(), Tz::Asia__Tokyo);
        assert_eq!(settings.search_limit, 8);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(matches!(
            Settings::from_json_str(r#"{ "search_limt": 3 }"#),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings.apply_overrides([
            ("ZONE_CLOCK_SEARCH_LIMIT", "3"),
            ("ZONE_CLOCK_REMOVAL_DELAY_MS", "not a number"),
            ("ZONE_CLOCK_ANCHOR_TIMEZONE", "Europe/Berlin"),
            ("ZONE_CLOCK_STORAGE_DIR", "/tmp/zones"),
            ("PATH", "/usr/bin"),
        ]);

        assert_eq!(settings.search_limit, 3);
        assert_eq!(settings.removal_delay_ms, 300);
        assert_eq!(settings.anchor(), Tz::Europe__Berlin);
        assert_eq!(settings.storage_dir.as_deref(), Some(Path::new("/tmp/zones")));
        assert_eq!(settings.file_storage().unwrap().dir(), Path::new("/tmp/zones"));
        assert!(Settings::default().file_storage().is_none());
    }
}

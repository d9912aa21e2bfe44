//! The fixed table of cities a user can pick from, keyed by a short code (e.g. `LON`).
//!
//! The table never changes for the lifetime of the process. Lookups by code go through a
//! [`phf::Map`], while [`search`] walks the table in order so results are stable.
use std::fmt;

use chrono_tz::Tz;

/// Maximum number of results a city search returns, unless the caller asks otherwise.
pub const DEFAULT_SEARCH_LIMIT: usize = 8;

/// A single city in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZoneEntry {
    /// City name, as displayed.
    pub city: &'static str,
    /// ISO 3166-1 alpha-2 country code.
    pub country: &'static str,
    /// The IANA time zone the city observes.
    pub timezone: Tz,
    /// Short code, unique within the catalog.
    pub code: &'static str,
}

impl ZoneEntry {
    /// The IANA identifier of this entry's zone, e.g. `Europe/London`.
    #[inline]
    pub fn iana_id(&self) -> &'static str {
        self.timezone.name()
    }

    /// Human readable label, e.g. `London, GB`.
    pub fn label(&self) -> String {
        format!("{}, {}", self.city, self.country)
    }

    fn matches(&self, needle: &str) -> bool {
        self.city.to_lowercase().contains(needle)
            || self.country.to_lowercase().contains(needle)
            || self.code.to_lowercase().contains(needle)
    }
}

impl fmt::Display for ZoneEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code, self.city)
    }
}

// Expands one list into both the ordered table and the by-code index, so the two can't drift.
macro_rules! catalog {
    ($($code:tt => ($city:literal, $country:literal, $tz:ident)),+ $(,)?) => {
        static ENTRIES: &[ZoneEntry] = &[$(
            ZoneEntry { city: $city, country: $country, timezone: Tz::$tz, code: $code }
        ),+];

        /// Short code -> entry. Keys are uppercase.
        static BY_CODE: phf::Map<&'static str, ZoneEntry> = phf::phf_map! {$(
            $code => ZoneEntry { city: $city, country: $country, timezone: Tz::$tz, code: $code }
        ),+};
    };
}

catalog! {
    "NYC" => ("New York", "US", America__New_York),
    "LA" => ("Los Angeles", "US", America__Los_Angeles),
    "SF" => ("San Francisco", "US", America__Los_Angeles),
    "CHI" => ("Chicago", "US", America__Chicago),
    "BOS" => ("Boston", "US", America__New_York),
    "SEA" => ("Seattle", "US", America__Los_Angeles),
    "DEN" => ("Denver", "US", America__Denver),
    "MIA" => ("Miami", "US", America__New_York),
    "LON" => ("London", "GB", Europe__London),
    "PAR" => ("Paris", "FR", Europe__Paris),
    "BER" => ("Berlin", "DE", Europe__Berlin),
    "AMS" => ("Amsterdam", "NL", Europe__Amsterdam),
    "ROM" => ("Rome", "IT", Europe__Rome),
    "MAD" => ("Madrid", "ES", Europe__Madrid),
    "DUB" => ("Dublin", "IE", Europe__Dublin),
    "LIS" => ("Lisbon", "PT", Europe__Lisbon),
    "IND" => ("India", "IN", Asia__Kolkata),
    "BOM" => ("Mumbai", "IN", Asia__Kolkata),
    "DEL" => ("Delhi", "IN", Asia__Kolkata),
    "BLR" => ("Bangalore", "IN", Asia__Kolkata),
    "TYO" => ("Tokyo", "JP", Asia__Tokyo),
    "SIN" => ("Singapore", "SG", Asia__Singapore),
    "HKG" => ("Hong Kong", "HK", Asia__Hong_Kong),
    "SHA" => ("Shanghai", "CN", Asia__Shanghai),
    "BJS" => ("Beijing", "CN", Asia__Shanghai),
    "SEL" => ("Seoul", "KR", Asia__Seoul),
    "SYD" => ("Sydney", "AU", Australia__Sydney),
    "MEL" => ("Melbourne", "AU", Australia__Melbourne),
    "AKL" => ("Auckland", "NZ", Pacific__Auckland),
    "DXB" => ("Dubai", "AE", Asia__Dubai),
    "TLV" => ("Tel Aviv", "IL", Asia__Jerusalem),
    "SAO" => ("São Paulo", "BR", America__Sao_Paulo),
    "MEX" => ("Mexico City", "MX", America__Mexico_City),
    "YYZ" => ("Toronto", "CA", America__Toronto),
    "YVR" => ("Vancouver", "CA", America__Vancouver),
    "MOW" => ("Moscow", "RU", Europe__Moscow),
    "IST" => ("Istanbul", "TR", Europe__Istanbul),
    "CAI" => ("Cairo", "EG", Africa__Cairo),
    "LOS" => ("Lagos", "NG", Africa__Lagos),
    "JNB" => ("Johannesburg", "ZA", Africa__Johannesburg),
}

/// Every entry in the catalog, in display order.
#[inline]
pub fn entries() -> &'static [ZoneEntry] {
    ENTRIES
}

/// Looks up an entry by its short code. Matching ignores case and surrounding whitespace.
pub fn find_by_short_code(code: &str) -> Option<&'static ZoneEntry> {
    let code = code.trim().to_uppercase();
    BY_CODE.get(code.as_str())
}

/// Case-insensitive substring search over city name, country code and short code.
///
/// Entries for which `exclude` returns `true` are skipped (used to hide cities that are already
/// selected). At most `limit` entries are returned, in catalog order. An empty query matches
/// everything.
pub fn search<F>(query: &str, limit: usize, mut exclude: F) -> Vec<&'static ZoneEntry>
where
    F: FnMut(&ZoneEntry) -> bool,
{
    let needle = query.to_lowercase();

    ENTRIES
        .iter()
        .filter(|entry| entry.matches(&needle) && !exclude(*entry))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_index_matches_entries() {
        assert_eq!(ENTRIES.len(), 40);
        assert_eq!(BY_CODE.len(), ENTRIES.len());

        for entry in ENTRIES {
            assert_eq!(BY_CODE.get(entry.code), Some(entry), "{entry}");
        }
    }

    #[test]
    fn test_find_by_short_code() {
        let lon = find_by_short_code(" lon ").expect("LON is in the catalog");
        assert_eq!(lon.city, "London");
        assert_eq!(lon.iana_id(), "Europe/London");
        assert_eq!(lon.label(), "London, GB");

        assert!(find_by_short_code("XYZ").is_none());
        assert!(find_by_short_code("").is_none());
    }

    #[test]
    fn test_search_matches_city_country_and_code() {
        let hits = search("lon", DEFAULT_SEARCH_LIMIT, |_| false);
        assert!(hits.iter().any(|e| e.code == "LON"));

        // country code
        let hits = search("jp", DEFAULT_SEARCH_LIMIT, |_| false);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].code, "TYO");

        // short code only ("YYZ" appears nowhere in "Toronto")
        let hits = search("yyz", DEFAULT_SEARCH_LIMIT, |_| false);
        assert_eq!(hits[0].city, "Toronto");

        // accented city names still match
        assert_eq!(search("são", DEFAULT_SEARCH_LIMIT, |_| false)[0].code, "SAO");
    }

    #[test]
    fn test_search_excludes_and_caps() {
        let hits = search("lon", DEFAULT_SEARCH_LIMIT, |e| e.code == "LON");
        assert!(hits.iter().all(|e| e.code != "LON"));

        let all = search("", DEFAULT_SEARCH_LIMIT, |_| false);
        assert_eq!(all.len(), DEFAULT_SEARCH_LIMIT);
        assert_eq!(all[0].code, "NYC");

        assert!(search("zzzz", DEFAULT_SEARCH_LIMIT, |_| false).is_empty());
    }
}

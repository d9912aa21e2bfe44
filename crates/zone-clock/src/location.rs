//! The shareable address of the converter, and the zone list encoded in its query string
//! (`?zones=IND,BOS,SF,LON`).
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::Error;

/// Default query parameter holding the comma separated short codes.
pub const DEFAULT_QUERY_PARAM: &str = "zones";

/// A bookmarkable address. Updating the zone list rewrites the query string in place; nothing
/// else about the address changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    url: Url,
    param: Cow<'static, str>,
}

impl Location {
    /// Wraps a parsed URL, using the default `zones` parameter.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            param: Cow::Borrowed(DEFAULT_QUERY_PARAM),
        }
    }

    /// Parses an address, using the default `zones` parameter.
    pub fn parse(address: &str) -> Result<Self, Error> {
        Ok(Self::new(Url::parse(address)?))
    }

    /// Uses a different query parameter for the zone list.
    pub fn with_param(mut self, param: impl Into<Cow<'static, str>>) -> Self {
        self.param = param.into();
        self
    }

    /// The query parameter holding the zone list.
    #[inline]
    pub fn param(&self) -> &str {
        &self.param
    }

    /// The full address.
    #[inline]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Short codes listed in the query string, uppercased and trimmed, in order. Empty entries
    /// are skipped.
    ///
    /// Returns [`None`] if the parameter is missing or empty.
    pub fn zone_codes(&self) -> Option<Vec<String>> {
        let (_, value) = self
            .url
            .query_pairs()
            .find(|(key, _)| *key == *self.param)?;

        if value.is_empty() {
            return None;
        }

        let codes = value
            .split(',')
            .map(|code| code.trim().to_uppercase())
            .filter(|code| !code.is_empty())
            .collect();

        Some(codes)
    }

    /// Replaces the zone list in the query string with `codes`, comma joined. Other parameters
    /// keep their order; the zone parameter keeps its position if it was already present, or is
    /// appended otherwise.
    pub fn set_zone_codes<I, S>(&mut self, codes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = codes
            .into_iter()
            .map(|code| code.as_ref().to_owned())
            .collect::<Vec<_>>()
            .join(",");

        let mut replaced = false;
        let mut pairs: Vec<(String, String)> = Vec::new();

        for (key, value) in self.url.query_pairs() {
            if *key == *self.param {
                // only the first occurrence survives, the same as URLSearchParams.set
                if !replaced {
                    pairs.push((key.into_owned(), joined.clone()));
                    replaced = true;
                }
            } else {
                pairs.push((key.into_owned(), value.into_owned()));
            }
        }

        if !replaced {
            pairs.push((self.param.to_string(), joined));
        }

        self.url.query_pairs_mut().clear().extend_pairs(pairs);
    }
}

impl FromStr for Location {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.url, f)
    }
}

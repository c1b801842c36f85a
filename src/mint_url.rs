//! Mint url

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use url::{ParseError, Url};

/// Url Error
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Url error
    #[error(transparent)]
    Url(#[from] ParseError),
    /// Url path segments could not be joined
    #[error("Url path segments could not be joined")]
    UrlPathSegments,
}

/// Base url of a mint
///
/// Equality is on the url string with trailing slashes trimmed, so
/// `https://mint.example/` and `https://mint.example` are the same mint.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MintUrl(String);

impl MintUrl {
    /// New mint url
    pub fn new<S>(url: S) -> Self
    where
        S: Into<String>,
    {
        let url: String = url.into();
        Self(url.trim_end_matches('/').to_string())
    }

    /// Join segments onto the base url
    pub fn join_paths(&self, parts: &[&str]) -> Result<Url, Error> {
        let mut url: Url = self.try_into()?;
        url.path_segments_mut()
            .map_err(|_| Error::UrlPathSegments)?
            .extend(parts);
        Ok(url)
    }
}

impl<'de> Deserialize<'de> for MintUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(MintUrl::new(s))
    }
}

impl From<&str> for MintUrl {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl FromStr for MintUrl {
    type Err = Error;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(url))
    }
}

impl TryFrom<&MintUrl> for Url {
    type Error = Error;

    fn try_from(mint_url: &MintUrl) -> Result<Url, Self::Error> {
        Ok(Self::parse(mint_url.0.as_str())?)
    }
}

impl fmt::Display for MintUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_trim_trailing_slashes() {
        let very_unformatted_url = "http://url-to-check.com////";
        let unformatted_url = "http://url-to-check.com/";
        let formatted_url = "http://url-to-check.com";

        let very_trimmed_url = MintUrl::from_str(very_unformatted_url).unwrap();
        assert_eq!("http://url-to-check.com", very_trimmed_url.to_string());

        let trimmed_url = MintUrl::from_str(unformatted_url).unwrap();
        assert_eq!("http://url-to-check.com", trimmed_url.to_string());

        let unchanged_url = MintUrl::from_str(formatted_url).unwrap();
        assert_eq!("http://url-to-check.com", unchanged_url.to_string());

        assert_eq!(trimmed_url, unchanged_url);
    }

    #[test]
    fn test_join_paths() {
        let url = MintUrl::from_str("https://mint.example:3338").unwrap();
        let joined = url.join_paths(&["v1", "swap"]).unwrap();
        assert_eq!("https://mint.example:3338/v1/swap", joined.to_string());
    }
}

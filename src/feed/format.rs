use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The syndication formats a feed can be serialized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedFormat {
    Atom,
    Rss,
}

/// A format tag other than `atom` or `rss` was requested.
#[derive(Debug, Error)]
#[error("Unsupported feed format {0:?} (expected \"atom\" or \"rss\")")]
pub struct UnsupportedFormat(pub String);

impl FeedFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            FeedFormat::Atom => "atom",
            FeedFormat::Rss => "rss",
        }
    }

    /// Bare media type, as used in `<link type=...>`.
    pub fn mime_type(self) -> &'static str {
        match self {
            FeedFormat::Atom => "application/atom+xml",
            FeedFormat::Rss => "application/rss+xml",
        }
    }

    /// Value for the HTTP `Content-Type` header.
    pub fn content_type(self) -> &'static str {
        match self {
            FeedFormat::Atom => "application/atom+xml; charset=utf-8",
            FeedFormat::Rss => "application/rss+xml; charset=utf-8",
        }
    }

    /// Route the format is served on.
    pub fn path(self) -> &'static str {
        match self {
            FeedFormat::Atom => "/atom",
            FeedFormat::Rss => "/rss",
        }
    }
}

impl FromStr for FeedFormat {
    type Err = UnsupportedFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "atom" => Ok(FeedFormat::Atom),
            "rss" => Ok(FeedFormat::Rss),
            _ => Err(UnsupportedFormat(s.to_owned())),
        }
    }
}

impl fmt::Display for FeedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_formats() {
        assert_eq!("atom".parse::<FeedFormat>().unwrap(), FeedFormat::Atom);
        assert_eq!("rss".parse::<FeedFormat>().unwrap(), FeedFormat::Rss);
        assert_eq!("RSS".parse::<FeedFormat>().unwrap(), FeedFormat::Rss);
    }

    #[test]
    fn test_unsupported_format_has_no_fallback() {
        let err = "json".parse::<FeedFormat>().unwrap_err();
        assert_eq!(err.0, "json");
        assert!(err.to_string().contains("json"));

        assert!("".parse::<FeedFormat>().is_err());
        assert!(" atom".parse::<FeedFormat>().is_err());
    }

    #[test]
    fn test_content_types() {
        assert!(FeedFormat::Atom.content_type().starts_with("application/atom+xml"));
        assert!(FeedFormat::Rss.content_type().starts_with("application/rss+xml"));
        assert_eq!(FeedFormat::Rss.to_string(), "rss");
    }
}

use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors that can occur during URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// Plain HTTP to a non-loopback host would expose the bearer token.
    #[error("Insecure API URL: HTTPS required (except localhost for testing)")]
    InsecureApiUrl,
    /// The URL cannot have path segments appended (e.g. `mailto:`).
    #[error("URL cannot be used as a base: {0}")]
    NotABase(String),
}

/// Validates the base URL of the issue tracker API.
///
/// The access token is sent on every request to this URL, so plain HTTP is
/// only accepted for loopback hosts (used by tests and local proxies).
/// A trailing slash is removed so paths can be appended with `/issues`.
///
/// # Examples
///
/// ```
/// use issuefeed::util::validate_api_base_url;
///
/// assert!(validate_api_base_url("https://api.github.com").is_ok());
/// assert!(validate_api_base_url("http://127.0.0.1:9000").is_ok());
/// assert!(validate_api_base_url("http://api.example.com").is_err());
/// ```
pub fn validate_api_base_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = parse_http_base(url_str)?;

    if url.scheme() == "http" && !is_loopback_host(&url) {
        tracing::error!(api_base_url = %url, "Rejecting non-HTTPS API base URL");
        return Err(UrlValidationError::InsecureApiUrl);
    }

    Ok(url)
}

/// Validates the public base URL the feed links point at.
///
/// Unlike the API URL this may be plain HTTP on any host, since it is only
/// echoed into the feed document.
pub fn validate_public_base_url(url_str: &str) -> Result<Url, UrlValidationError> {
    parse_http_base(url_str)
}

fn parse_http_base(url_str: &str) -> Result<Url, UrlValidationError> {
    let mut url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
    if url.cannot_be_a_base() {
        return Err(UrlValidationError::NotABase(url_str.to_owned()));
    }

    let trimmed = url.path().trim_end_matches('/').to_owned();
    url.set_path(&trimmed);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn is_loopback_host(url: &Url) -> bool {
    match url.host_str() {
        Some("localhost") => true,
        Some(host) => {
            // Strip brackets from IPv6 addresses for parsing
            let host_for_parse = host
                .strip_prefix('[')
                .and_then(|h| h.strip_suffix(']'))
                .unwrap_or(host);
            host_for_parse
                .parse::<IpAddr>()
                .map(|ip| ip.is_loopback())
                .unwrap_or(false)
        }
        None => false,
    }
}

use crate::github::types::{Issue, IssueFilter, StateFilter};
use futures::StreamExt;
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, LINK};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_PER_PAGE: u8 = 10;
pub const DEFAULT_MAX_PAGES: u32 = 100;
pub const DEFAULT_PAGE_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_PAGE_SIZE: usize = 10 * 1024 * 1024; // 10MB
const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Errors that can occur while paginating through the issue list.
///
/// Any of these aborts the whole fetch; issues from earlier pages are
/// discarded rather than returned as a partial list.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// A single page exceeded the configured page timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body was not the expected JSON issue array
    #[error("Decode error: {0}")]
    Decode(String),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// The API kept reporting a next page past the configured maximum
    #[error("Page limit of {0} pages exceeded")]
    PageLimitExceeded(u32),
    /// The next-page cursor did not move forward
    #[error("Pagination stalled: page {page} reported next page {next}")]
    StalledPagination { page: u32, next: u32 },
    /// A `rel="next"` link was present but carried no usable page number
    #[error("Unusable next-page link: {0}")]
    InvalidCursor(String),
    /// The token cannot be sent as an HTTP header value
    #[error("Access token contains characters not allowed in an HTTP header")]
    InvalidToken,
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        match self {
            FetchError::Timeout => true,
            FetchError::Network(e) => e.is_timeout(),
            _ => false,
        }
    }
}

/// How the issue list is requested. Built once from configuration.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// API root, e.g. `https://api.github.com`. Must already be validated.
    pub api_base: Url,
    pub filter: IssueFilter,
    pub state: StateFilter,
    pub per_page: u8,
    /// Upper bound on pages fetched per request.
    pub max_pages: u32,
    pub page_timeout: Duration,
    pub skip_pull_requests: bool,
}

impl FetchSettings {
    pub fn new(api_base: Url) -> Self {
        Self {
            api_base,
            filter: IssueFilter::default(),
            state: StateFilter::default(),
            per_page: DEFAULT_PER_PAGE,
            max_pages: DEFAULT_MAX_PAGES,
            page_timeout: DEFAULT_PAGE_TIMEOUT,
            skip_pull_requests: false,
        }
    }
}

struct IssuePage {
    issues: Vec<Issue>,
    next_page: Option<u32>,
}

/// Fetches every issue of the authenticated user, following pagination.
///
/// Pages are requested starting at 1 and followed through the `Link`
/// header's `rel="next"` cursor until no next page is reported. Issues come
/// back in API order, concatenated page by page.
///
/// # Arguments
///
/// * `client` - HTTP client shared across requests
/// * `settings` - Endpoint, filters and pagination bounds
/// * `token` - Access token; `None` yields an empty list without any request
///
/// # Errors
///
/// The first failing page aborts the fetch:
/// - [`FetchError::Network`] / [`FetchError::Timeout`] - transport failures
/// - [`FetchError::HttpStatus`] - non-2xx response (bad token, rate limit, ...)
/// - [`FetchError::Decode`] - payload is not an issue array
/// - [`FetchError::PageLimitExceeded`] - more than `max_pages` pages
/// - [`FetchError::StalledPagination`] - the next cursor did not advance
/// - [`FetchError::InvalidCursor`] - a next link without a page number
pub async fn fetch_issues(
    client: &reqwest::Client,
    settings: &FetchSettings,
    token: Option<&SecretString>,
) -> Result<Vec<Issue>, FetchError> {
    let Some(token) = token else {
        tracing::debug!("No access token configured, returning empty issue list");
        return Ok(Vec::new());
    };

    let auth = bearer_header(token)?;
    let mut issues = Vec::new();
    let mut seen = HashSet::new();
    let mut page: u32 = 1;
    let mut fetched_pages: u32 = 0;

    loop {
        let IssuePage {
            issues: batch,
            next_page,
        } = fetch_page(client, settings, &auth, page).await?;
        fetched_pages += 1;

        let received = batch.len();
        for issue in batch {
            // Items can shift between pages while paginating
            if !seen.insert(issue.id) {
                tracing::debug!(issue_id = issue.id, page = page, "Dropping duplicate issue");
                continue;
            }
            if settings.skip_pull_requests && issue.is_pull_request() {
                continue;
            }
            issues.push(issue);
        }

        tracing::debug!(
            page = page,
            received = received,
            total = issues.len(),
            next_page = ?next_page,
            "Fetched issue page"
        );

        match next_page {
            None => break,
            Some(next) if next <= page => {
                return Err(FetchError::StalledPagination { page, next });
            }
            Some(_) if fetched_pages >= settings.max_pages => {
                tracing::warn!(
                    max_pages = settings.max_pages,
                    "Issue tracker still reports more pages, giving up"
                );
                return Err(FetchError::PageLimitExceeded(settings.max_pages));
            }
            Some(next) => page = next,
        }
    }

    tracing::info!(issues = issues.len(), pages = fetched_pages, "Fetched issues");
    Ok(issues)
}

fn bearer_header(token: &SecretString) -> Result<HeaderValue, FetchError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
        .map_err(|_| FetchError::InvalidToken)?;
    value.set_sensitive(true);
    Ok(value)
}

fn issues_url(settings: &FetchSettings, page: u32) -> Url {
    let mut url = settings.api_base.clone();
    let path = format!("{}/issues", settings.api_base.path().trim_end_matches('/'));
    url.set_path(&path);
    url.query_pairs_mut()
        .clear()
        .append_pair("filter", settings.filter.as_str())
        .append_pair("state", settings.state.as_str())
        .append_pair("per_page", &settings.per_page.to_string())
        .append_pair("page", &page.to_string());
    url
}

async fn fetch_page(
    client: &reqwest::Client,
    settings: &FetchSettings,
    auth: &HeaderValue,
    page: u32,
) -> Result<IssuePage, FetchError> {
    let request = client
        .get(issues_url(settings, page))
        .header(ACCEPT, GITHUB_ACCEPT)
        .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
        .header(AUTHORIZATION, auth.clone());

    let response = tokio::time::timeout(settings.page_timeout, request.send())
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(FetchError::Network)?;

    if !response.status().is_success() {
        tracing::warn!(
            page = page,
            status = %response.status(),
            "Issue tracker returned an error status"
        );
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    let next_page = match response.headers().get(LINK) {
        Some(value) => {
            let header = value
                .to_str()
                .map_err(|_| FetchError::InvalidCursor("non-ASCII Link header".to_string()))?;
            next_page_from_link(header)?
        }
        None => None,
    };

    let bytes = tokio::time::timeout(
        settings.page_timeout,
        read_limited_bytes(response, MAX_PAGE_SIZE),
    )
    .await
    .map_err(|_| FetchError::Timeout)??;

    let issues: Vec<Issue> =
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))?;

    Ok(IssuePage { issues, next_page })
}

/// Extracts the `page` query parameter of the `rel="next"` target in an
/// RFC 8288 `Link` header, as sent by GitHub.
///
/// Returns `Ok(None)` when there is no next link. A next link whose target
/// is not a URL or has no numeric `page` parameter is
/// [`FetchError::InvalidCursor`], since following it is impossible and
/// stopping would silently truncate the result.
pub fn next_page_from_link(header: &str) -> Result<Option<u32>, FetchError> {
    let Some(target) = next_link_target(header) else {
        return Ok(None);
    };

    let url = Url::parse(target).map_err(|_| FetchError::InvalidCursor(target.to_string()))?;
    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
        .map(Some)
        .ok_or_else(|| FetchError::InvalidCursor(target.to_string()))
}

fn next_link_target(header: &str) -> Option<&str> {
    header.split(',').find_map(|link| {
        let mut parts = link.split(';');
        let target = parts
            .next()?
            .trim()
            .strip_prefix('<')?
            .strip_suffix('>')?;

        let is_next = parts.any(|param| {
            param
                .trim()
                .strip_prefix("rel=")
                .map(|rel| rel.trim_matches('"').split_whitespace().any(|r| r == "next"))
                .unwrap_or(false)
        });
        is_next.then_some(target)
    })
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}

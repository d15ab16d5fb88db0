//! Configuration file parser for ~/.config/issuefeed/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Command-line flags and environment variables are applied on top by the
//! binary; this module turns the merged result into the typed settings the
//! fetcher, renderer and server consume.
use crate::feed::{Author, FeedMeta, DEFAULT_AUTHOR, DEFAULT_DESCRIPTION, DEFAULT_TITLE};
use crate::github::{
    FetchSettings, IssueFilter, StateFilter, DEFAULT_MAX_PAGES, DEFAULT_PAGE_TIMEOUT,
    DEFAULT_PER_PAGE,
};
use crate::util::{validate_api_base_url, validate_public_base_url};
use secrecy::SecretString;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8888;
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_REQUEST_DEADLINE_SECS: u64 = 60;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("No GitHub access token: pass --token, set GITHUB_TOKEN, or set github_token in the config file")]
    MissingToken,

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
///
/// Custom Debug impl masks `github_token` so the token never reaches logs.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub personal access token. CLI flag and `GITHUB_TOKEN` take precedence.
    pub github_token: Option<String>,

    /// Serve empty feeds instead of refusing to start when no token is set.
    pub allow_missing_token: bool,

    pub bind_address: String,
    pub port: u16,

    /// Public URL the feed links point at. Defaults to `http://localhost:<port>`.
    pub base_url: Option<String>,

    /// GitHub API root. Override for GitHub Enterprise.
    pub api_base_url: String,

    pub filter: IssueFilter,
    pub state: StateFilter,
    pub per_page: u8,
    pub max_pages: u32,
    pub page_timeout_secs: u64,

    /// Upper bound for fetching all pages of one request.
    pub request_deadline_secs: u64,

    pub skip_pull_requests: bool,

    pub feed_title: String,
    pub feed_description: String,
    pub author_name: String,
    pub author_email: Option<String>,

    pub render_markdown: bool,
    pub use_issue_timestamps: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_token: None,
            allow_missing_token: false,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            base_url: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            filter: IssueFilter::default(),
            state: StateFilter::default(),
            per_page: DEFAULT_PER_PAGE,
            max_pages: DEFAULT_MAX_PAGES,
            page_timeout_secs: DEFAULT_PAGE_TIMEOUT.as_secs(),
            request_deadline_secs: DEFAULT_REQUEST_DEADLINE_SECS,
            skip_pull_requests: false,
            feed_title: DEFAULT_TITLE.to_string(),
            feed_description: DEFAULT_DESCRIPTION.to_string(),
            author_name: DEFAULT_AUTHOR.to_string(),
            author_email: None,
            render_markdown: false,
            use_issue_timestamps: false,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field(
                "github_token",
                &self.github_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("allow_missing_token", &self.allow_missing_token)
            .field("bind_address", &self.bind_address)
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field("api_base_url", &self.api_base_url)
            .field("filter", &self.filter)
            .field("state", &self.state)
            .field("per_page", &self.per_page)
            .field("max_pages", &self.max_pages)
            .field("page_timeout_secs", &self.page_timeout_secs)
            .field("request_deadline_secs", &self.request_deadline_secs)
            .field("skip_pull_requests", &self.skip_pull_requests)
            .field("feed_title", &self.feed_title)
            .field("feed_description", &self.feed_description)
            .field("author_name", &self.author_name)
            .field("author_email", &self.author_email)
            .field("render_markdown", &self.render_markdown)
            .field("use_issue_timestamps", &self.use_issue_timestamps)
            .finish()
    }
}

const KNOWN_KEYS: &[&str] = &[
    "github_token",
    "allow_missing_token",
    "bind_address",
    "port",
    "base_url",
    "api_base_url",
    "filter",
    "state",
    "per_page",
    "max_pages",
    "page_timeout_secs",
    "request_deadline_secs",
    "skip_pull_requests",
    "feed_title",
    "feed_description",
    "author_name",
    "author_email",
    "render_markdown",
    "use_issue_timestamps",
];

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check size before reading so a corrupted file cannot exhaust memory
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Picks the access token: `cli` (flag or `GITHUB_TOKEN`) wins over the
    /// config file. Blank values count as absent.
    ///
    /// Returns `Ok(None)` only when `allow_missing_token` is set.
    pub fn resolve_token(&self, cli: Option<String>) -> Result<Option<SecretString>, ConfigError> {
        let token = cli
            .filter(|t| !t.trim().is_empty())
            .or_else(|| {
                self.github_token
                    .clone()
                    .filter(|t| !t.trim().is_empty())
            })
            .map(|t| SecretString::from(t.trim().to_string()));

        match token {
            Some(token) => Ok(Some(token)),
            None if self.allow_missing_token => {
                tracing::warn!("No GitHub access token configured, feeds will be empty");
                Ok(None)
            }
            None => Err(ConfigError::MissingToken),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .bind_address
            .trim()
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "bind_address",
                reason: e.to_string(),
            })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.request_deadline_secs)
    }

    pub fn fetch_settings(&self) -> Result<FetchSettings, ConfigError> {
        let api_base =
            validate_api_base_url(&self.api_base_url).map_err(|e| ConfigError::Invalid {
                key: "api_base_url",
                reason: e.to_string(),
            })?;

        if !(1..=100).contains(&self.per_page) {
            return Err(ConfigError::Invalid {
                key: "per_page",
                reason: format!("{} is outside 1..=100", self.per_page),
            });
        }
        if self.max_pages == 0 {
            return Err(ConfigError::Invalid {
                key: "max_pages",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.page_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "page_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        // A single page must be able to finish inside the request deadline
        if self.request_deadline_secs < self.page_timeout_secs {
            return Err(ConfigError::Invalid {
                key: "request_deadline_secs",
                reason: format!(
                    "{} is shorter than page_timeout_secs ({})",
                    self.request_deadline_secs, self.page_timeout_secs
                ),
            });
        }

        Ok(FetchSettings {
            api_base,
            filter: self.filter,
            state: self.state,
            per_page: self.per_page,
            max_pages: self.max_pages,
            page_timeout: Duration::from_secs(self.page_timeout_secs),
            skip_pull_requests: self.skip_pull_requests,
        })
    }

    pub fn feed_meta(&self) -> Result<FeedMeta, ConfigError> {
        let base = self
            .base_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.port));
        let base_url = validate_public_base_url(&base).map_err(|e| ConfigError::Invalid {
            key: "base_url",
            reason: e.to_string(),
        })?;

        let mut meta = FeedMeta::new(&base_url);
        meta.title = self.feed_title.clone();
        meta.description = self.feed_description.clone();
        meta.author = Author {
            name: self.author_name.clone(),
            email: self.author_email.clone().filter(|e| !e.is_empty()),
        };
        meta.render_markdown = self.render_markdown;
        meta.use_issue_timestamps = self.use_issue_timestamps;
        Ok(meta)
    }
}

// ============================================================================
// Tests
// ============================================================================

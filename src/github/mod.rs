//! Issue tracker client.
//!
//! Retrieves the authenticated user's issues from the GitHub REST API:
//!
//! - [`types`] - Serde models for the `GET /issues` payload and its filters
//! - [`fetcher`] - Paginated retrieval with per-page timeouts and a page cap
//!
//! No state is kept between calls; every call walks the pages from the start.

mod fetcher;
mod types;

pub use fetcher::{
    fetch_issues, next_page_from_link, FetchError, FetchSettings, DEFAULT_MAX_PAGES,
    DEFAULT_PAGE_TIMEOUT, DEFAULT_PER_PAGE,
};
pub use types::{Issue, IssueFilter, IssueState, PullRequestRef, Repository, StateFilter, User};

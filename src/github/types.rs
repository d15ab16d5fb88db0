use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Login shown for issues whose author account was deleted.
const GHOST_LOGIN: &str = "ghost";

/// An issue as returned by the `GET /issues` endpoint.
///
/// Only the fields the feed needs are deserialized; everything else in the
/// payload is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub id: u64,
    #[serde(default)]
    pub number: u64,
    /// API URL of the issue.
    pub url: String,
    /// Web URL of the issue. Empty on some enterprise payloads.
    #[serde(default)]
    pub html_url: String,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    pub state: IssueState,
    #[serde(default)]
    pub repository: Option<Repository>,
    /// Present when the "issue" is a pull request.
    #[serde(default)]
    pub pull_request: Option<PullRequestRef>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Issue {
    /// Web URL when present, API URL otherwise.
    pub fn web_url(&self) -> &str {
        if self.html_url.is_empty() {
            &self.url
        } else {
            &self.html_url
        }
    }

    pub fn author_login(&self) -> &str {
        self.user
            .as_ref()
            .map(|u| u.login.as_str())
            .unwrap_or(GHOST_LOGIN)
    }

    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestRef {
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

/// Which of the user's issues the `/issues` endpoint returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueFilter {
    /// Issues assigned to the authenticated user.
    #[default]
    Assigned,
    Created,
    Mentioned,
    Subscribed,
    /// Every issue the user can see, regardless of participation.
    All,
}

impl IssueFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueFilter::Assigned => "assigned",
            IssueFilter::Created => "created",
            IssueFilter::Mentioned => "mentioned",
            IssueFilter::Subscribed => "subscribed",
            IssueFilter::All => "all",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateFilter {
    #[default]
    Open,
    Closed,
    All,
}

impl StateFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            StateFilter::Open => "open",
            StateFilter::Closed => "closed",
            StateFilter::All => "all",
        }
    }
}

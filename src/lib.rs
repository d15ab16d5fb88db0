//! Serve the GitHub issues relevant to one user as an Atom or RSS feed.
//!
//! - [`github`] - Paginated issue fetching from the GitHub REST API
//! - [`feed`] - Feed model and Atom/RSS serialization
//! - [`server`] - HTTP routes, error mapping and graceful shutdown
//! - [`config`] - TOML config file and typed settings

pub mod config;
pub mod feed;
pub mod github;
pub mod server;
pub mod util;

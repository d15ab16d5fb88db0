use anyhow::{Context, Result};
use clap::Parser;
use issuefeed::config::Config;
use issuefeed::server::{self, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Get the default config file path (~/.config/issuefeed/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("issuefeed")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(
    name = "issuefeed",
    version,
    about = "Serve your GitHub issues as an Atom or RSS feed"
)]
struct Args {
    /// GitHub personal access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Port to listen on
    #[arg(long, short)]
    port: Option<u16>,

    /// Address to bind to
    #[arg(long, value_name = "IP")]
    bind: Option<String>,

    /// Public URL the feed links point at
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Config file (default: ~/.config/issuefeed/config.toml)
    #[arg(long, short, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, env = "ISSUEFEED_DEBUG")]
    debug: bool,

    /// Start without a token and serve empty feeds
    #[arg(long)]
    allow_missing_token: bool,
}

fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if args.base_url.is_some() {
        config.base_url = args.base_url;
    }
    config.allow_missing_token |= args.allow_missing_token;
    tracing::debug!(config = ?config, "Effective configuration");

    let token = config.resolve_token(args.token)?;
    let fetch = config.fetch_settings()?;
    let feed = config.feed_meta()?;
    let addr = config.socket_addr()?;

    let client = reqwest::Client::builder()
        .user_agent(concat!("issuefeed/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .timeout(fetch.page_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let state = Arc::new(AppState {
        client,
        token,
        fetch,
        feed,
        request_deadline: config.request_deadline(),
    });

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    server::serve(listener, state)
        .await
        .context("Server failed")?;
    Ok(())
}

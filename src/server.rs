//! HTTP front end.
//!
//! Every feed request triggers a fresh, complete fetch from GitHub. Nothing
//! is cached between requests, so concurrent requests never share state
//! beyond the immutable [`AppState`].
//!
//! Routes:
//!
//! | Path              | Response                     |
//! |-------------------|------------------------------|
//! | `/issues`         | Atom feed                    |
//! | `/atom`           | Atom feed                    |
//! | `/rss`            | RSS 2.0 feed                 |
//! | `/feed/{format}`  | Either, `400` for other tags |

use crate::feed::{render_issues, FeedFormat, FeedMeta, RenderError, UnsupportedFormat};
use crate::github::{fetch_issues, FetchError, FetchSettings};
use axum::body::Body;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::{header, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use secrecy::SecretString;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;

/// Immutable state shared by all request handlers.
pub struct AppState {
    pub client: reqwest::Client,
    pub token: Option<SecretString>,
    pub fetch: FetchSettings,
    pub feed: FeedMeta,
    /// Upper bound on fetching every page for one request.
    pub request_deadline: Duration,
}

/// A failed feed request, mapped onto an HTTP status.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("Failed to fetch issues: {0}")]
    Fetch(#[from] FetchError),

    #[error("Fetching issues took longer than {0:?}")]
    Deadline(Duration),

    #[error(transparent)]
    Format(#[from] UnsupportedFormat),

    #[error("Failed to render feed: {0}")]
    Render(#[from] RenderError),
}

impl ServeError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServeError::Fetch(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            ServeError::Fetch(_) => StatusCode::BAD_GATEWAY,
            ServeError::Deadline(_) => StatusCode::GATEWAY_TIMEOUT,
            ServeError::Format(_) => StatusCode::BAD_REQUEST,
            ServeError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Feed request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Rejected feed request");
        }
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/issues", get(atom_feed))
        .route("/atom", get(atom_feed))
        .route("/rss", get(rss_feed))
        .route("/feed/:format", get(feed_by_format))
        .layer(axum::middleware::from_fn(log_request))
        .with_state(state)
}

/// Serves until SIGINT or SIGTERM, then drains in-flight requests.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    serve_until(listener, state, wait_for_shutdown_signal()).await
}

/// Serves until `shutdown` resolves.
pub async fn serve_until<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "Serving issue feeds");
    }
    let app = router(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn atom_feed(State(state): State<Arc<AppState>>) -> Result<Response, ServeError> {
    respond(&state, FeedFormat::Atom).await
}

async fn rss_feed(State(state): State<Arc<AppState>>) -> Result<Response, ServeError> {
    respond(&state, FeedFormat::Rss).await
}

async fn feed_by_format(
    State(state): State<Arc<AppState>>,
    Path(format): Path<String>,
) -> Result<Response, ServeError> {
    let format: FeedFormat = format.parse()?;
    respond(&state, format).await
}

async fn respond(state: &AppState, format: FeedFormat) -> Result<Response, ServeError> {
    let now = Utc::now();
    let fetch = fetch_issues(&state.client, &state.fetch, state.token.as_ref());
    let issues = tokio::time::timeout(state.request_deadline, fetch)
        .await
        .map_err(|_| ServeError::Deadline(state.request_deadline))??;

    let body = render_issues(&state.feed, &issues, format, now)?;
    Ok(([(header::CONTENT_TYPE, format.content_type())], body).into_response())
}

async fn log_request(request: Request<Body>, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let started = Instant::now();

    let response = next.run(request).await;

    tracing::debug!(
        method = %method,
        path = %path,
        remote = %remote,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Handled request"
    );
    response
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                tracing::warn!("Could not register signal handlers, falling back to ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServeError::Fetch(FetchError::HttpStatus(500)).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ServeError::Fetch(FetchError::InvalidToken).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ServeError::Fetch(FetchError::Timeout).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ServeError::Deadline(Duration::from_secs(1)).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ServeError::Format(UnsupportedFormat("json".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServeError::Render(RenderError::InvalidUtf8).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_body_is_plain_text() {
        let response = ServeError::Format(UnsupportedFormat("json".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }
}

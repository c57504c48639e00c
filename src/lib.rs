//! otpgen is a time-based one-time password (RFC 6238) generator.
#![forbid(unsafe_code)]

pub mod clock;
pub mod config;
pub mod error;
mod router;
pub mod telemetry;
pub mod ticker;
pub mod totp;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{Method, StatusCode};
use error::ServerError;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

use crate::totp::{Totp, TotpConfig};

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use axum::http::header;
    use tower::util::ServiceExt;

    app.oneshot(
        Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

#[cfg(test)]
pub(crate) use axum::http::header;

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub totp: Arc<Totp>,
    /// Validated copy of `config.totp`.
    pub totp_config: TotpConfig,
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        // Bodies and headers carry secrets and are never recorded.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_request(DefaultOnRequest::new())
                .on_response(
                    DefaultOnResponse::new().latency_unit(LatencyUnit::Micros),
                ),
        )
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(10),
        ))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any),
        );

    router::router().with_state(state).layer(middleware)
}

/// Initialize the application state.
pub fn initialize_state(
    path: Option<PathBuf>,
) -> Result<AppState, Box<dyn std::error::Error>> {
    let mut config = config::Configuration::default();
    if let Some(path) = path {
        config = config.path(path);
    }

    // read configuration file. let it in memory.
    let config = config.read()?;
    let totp_config = config.totp_config()?;

    Ok(AppState {
        config,
        totp: Arc::new(Totp::new()),
        totp_config,
    })
}

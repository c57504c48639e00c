pub mod generate;
pub mod status;
pub mod validate;
pub mod verify;
pub mod window;

use axum::Router;
use axum::extract::{FromRequest, Json, Request};
use axum::routing::{get, post};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::totp::{OtpError, is_valid_secret};
use crate::{AppState, ServerError};

/// JSON body checked with `validator` before reaching the handler.
pub struct Valid<T>(pub T);

impl<T, S> FromRequest<S> for Valid<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(
        req: Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Valid(value))
    }
}

/// Reject secrets that do not look like a base32 key.
pub(crate) fn check_secret(secret: &str) -> Result<(), OtpError> {
    if is_valid_secret(secret) {
        Ok(())
    } else {
        Err(OtpError::ValidationFailure)
    }
}

/// Routes of the generation API.
pub fn router() -> Router<AppState> {
    Router::new()
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(status::handler))
        .route("/secret/validate", post(validate::handler))
        .route("/totp", post(generate::handler))
        .route("/totp/window", post(window::handler))
        .route("/totp/verify", post(verify::handler))
}

/// State with a clock pinned on `timestamp`.
#[cfg(test)]
pub(crate) fn state_at(timestamp: u64) -> AppState {
    use std::sync::Arc;

    use crate::clock::FixedClock;
    use crate::config::Configuration;
    use crate::totp::{HmacSha1, Totp, TotpConfig};

    AppState {
        config: Arc::new(Configuration::default()),
        totp: Arc::new(Totp::with(
            HmacSha1::new(),
            Arc::new(FixedClock::new(timestamp)),
        )),
        totp_config: TotpConfig::default(),
    }
}

#[cfg(test)]
pub(crate) async fn json_body(
    response: axum::http::Response<axum::body::Body>,
) -> serde_json::Value {
    use http_body_util::BodyExt;

    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[cfg(test)]
pub(crate) const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_malformed_body() {
        let app = app(state_at(59));
        let response =
            make_request(app, Method::POST, "/totp", "{\"secret\":".into())
                .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/problem+json"
        );
    }

    #[tokio::test]
    async fn test_secret_must_be_string() {
        let app = app(state_at(59));
        let response = make_request(
            app,
            Method::POST,
            "/totp",
            json!({ "secret": 1234 }).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = app(state_at(59));
        let response =
            make_request(app, Method::GET, "/login", String::default()).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

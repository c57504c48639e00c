use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::{Valid, check_secret};
use crate::totp::{Window, remaining_seconds_at};

#[derive(Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(length(max = 1024, message = "Secret key is too long."))]
    pub secret: String,
}

#[derive(Debug, Serialize)]
pub struct Response {
    #[serde(flatten)]
    pub window: Window,
    pub remaining: u64,
}

/// Handler generating previous, current and next codes at once.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>> {
    check_secret(&body.secret)?;

    let config = &state.totp_config;
    let now = state.totp.clock().now();
    let window = state
        .totp
        .generate_window_at(&body.secret, config, now)
        .await?;

    Ok(Json(Response {
        window,
        remaining: remaining_seconds_at(now, config.period()),
    }))
}

#[cfg(test)]
mod tests {
    use crate::router::{RFC_SECRET, json_body, state_at};
    use crate::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_window_handler() {
        let app = app(state_at(59));
        let response = make_request(
            app,
            Method::POST,
            "/totp/window",
            json!({ "secret": RFC_SECRET }).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["previous"], "755224");
        assert_eq!(body["current"], "287082");
        assert_eq!(body["next"], "359152");
        assert_eq!(body["remaining"], 1);
    }

    #[tokio::test]
    async fn test_window_invalid_secret() {
        let app = app(state_at(59));
        let response = make_request(
            app,
            Method::POST,
            "/totp/window",
            json!({ "secret": "" }).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

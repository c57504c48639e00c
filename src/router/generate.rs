use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::{Valid, check_secret};
use crate::totp::{Code, remaining_seconds_at};

#[derive(Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(length(max = 1024, message = "Secret key is too long."))]
    pub secret: String,
    #[validate(range(
        min = -1,
        max = 1,
        message = "Offset must be -1, 0 or 1."
    ))]
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct Response {
    pub code: Code,
    /// Seconds before `code` expires.
    pub remaining: u64,
    pub period: u64,
    pub digits: u8,
}

/// Handler generating the code of the current step, or a neighbour.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>> {
    check_secret(&body.secret)?;

    let config = &state.totp_config;
    let now = state.totp.clock().now();
    let code = state
        .totp
        .generate_at(&body.secret, body.offset.unwrap_or_default(), config, now)
        .await?;

    Ok(Json(Response {
        code,
        remaining: remaining_seconds_at(now, config.period()),
        period: config.period().get(),
        digits: config.digits(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::router::{RFC_SECRET, json_body, state_at};
    use crate::*;
    use axum::http::StatusCode;
    use serde_json::json;

    async fn generate(
        timestamp: u64,
        body: serde_json::Value,
    ) -> axum::http::Response<axum::body::Body> {
        let app = app(state_at(timestamp));
        make_request(app, Method::POST, "/totp", body.to_string()).await
    }

    #[tokio::test]
    async fn test_generate_handler() {
        let response = generate(59, json!({ "secret": RFC_SECRET })).await;

        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["code"], "287082");
        assert_eq!(body["remaining"], 1);
        assert_eq!(body["period"], 30);
        assert_eq!(body["digits"], 6);
    }

    #[tokio::test]
    async fn test_generate_with_offset() {
        let response =
            generate(1111111109, json!({ "secret": RFC_SECRET, "offset": 1 }))
                .await;
        assert_eq!(json_body(response).await["code"], "050471");

        let response =
            generate(59, json!({ "secret": RFC_SECRET, "offset": -1 })).await;
        assert_eq!(json_body(response).await["code"], "755224");
    }

    #[tokio::test]
    async fn test_offset_out_of_range() {
        let response =
            generate(59, json!({ "secret": RFC_SECRET, "offset": 2 })).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["errors"][0]["field"], "offset");
    }

    #[tokio::test]
    async fn test_invalid_secret() {
        let response =
            generate(59, json!({ "secret": "not a secret at all" })).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["title"], "Invalid secret key.");
    }
}

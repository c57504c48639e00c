use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::router::Valid;
use crate::totp::{format_secret, is_valid_secret};

#[derive(Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(length(max = 1024, message = "Secret key is too long."))]
    pub secret: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub valid: bool,
    /// Secret split in groups of four characters.
    pub formatted: String,
}

/// Check a secret format without generating anything.
pub async fn handler(Valid(body): Valid<Body>) -> Json<Response> {
    Json(Response {
        valid: is_valid_secret(&body.secret),
        formatted: format_secret(&body.secret),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::state_at;
    use crate::*;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use serde_json::json;

    async fn validate(secret: &str) -> (StatusCode, Option<Response>) {
        let app = app(state_at(0));
        let response = make_request(
            app,
            Method::POST,
            "/secret/validate",
            json!({ "secret": secret }).to_string(),
        )
        .await;

        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).ok())
    }

    #[tokio::test]
    async fn test_valid_secret() {
        let (status, body) = validate("jbsw y3dp ehpk 3pxp").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            Some(Response {
                valid: true,
                formatted: "jbsw y3dp ehpk 3pxp".into(),
            })
        );
    }

    #[tokio::test]
    async fn test_invalid_secret() {
        let (status, body) = validate("ABCDEFGH1JKLMNOP").await;

        assert_eq!(status, StatusCode::OK);
        let body = body.unwrap();
        assert!(!body.valid);
        assert_eq!(body.formatted, "ABCD EFGH 1JKL MNOP");
    }

    #[tokio::test]
    async fn test_too_long_secret() {
        let (status, _) = validate(&"A".repeat(1025)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

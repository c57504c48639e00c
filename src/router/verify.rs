use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::{Valid, check_secret};

#[derive(Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(length(max = 1024, message = "Secret key is too long."))]
    pub secret: String,
    #[validate(length(
        min = 4,
        max = 8,
        message = "Code must contain between 4 and 8 digits."
    ))]
    pub code: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub valid: bool,
}

/// Handler checking a code against the previous, current and next steps.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>> {
    check_secret(&body.secret)?;

    let valid = state
        .totp
        .verify(&body.code, &body.secret, &state.totp_config)
        .await?;

    Ok(Json(Response { valid }))
}

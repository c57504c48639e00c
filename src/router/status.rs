//! Public configuration page for front-end identification.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::AppState;
use crate::config::Configuration;

/// Structured configuration.
#[derive(Serialize)]
pub struct Status {
    name: String,
    version: String,
    period: u64,
    digits: u8,
}

/// Public server status (configuration).
pub async fn handler(
    State(config): State<Arc<Configuration>>,
    State(state): State<AppState>,
) -> Json<Status> {
    Json(Status {
        name: config.name.clone(),
        version: config.version().to_owned(),
        period: state.totp_config.period().get(),
        digits: state.totp_config.digits(),
    })
}

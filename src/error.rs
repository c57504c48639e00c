//! Error handler for the HTTP API.

use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::totp::OtpError;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Axum(#[from] JsonRejection),

    #[error(transparent)]
    Otp(#[from] OtpError),
}

/// Structure for detailed error responses.
#[derive(Debug, Serialize)]
pub struct ResponseError {
    r#type: Option<String>,
    title: String,
    status: u16,
    detail: String,
    instance: Option<String>,
    errors: Option<Vec<FieldError>>,
}

impl ResponseError {
    /// Update error status code.
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code.as_u16();
        self
    }

    /// Update `title` field.
    pub fn title(mut self, title: &str) -> Self {
        self.title = title.into();
        self
    }

    /// Add detailed error.
    pub fn details(mut self, description: &str) -> Self {
        self.detail = description.into();
        self
    }

    /// Automatically add errors field.
    pub fn errors(mut self, errors: &ValidationErrors) -> Self {
        self.errors = Some(parse_validation_errors(errors));
        self
    }
}

impl Default for ResponseError {
    fn default() -> Self {
        Self {
            r#type: None,
            title: "Internal server error.".to_owned(),
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            detail: String::default(),
            instance: None,
            errors: None,
        }
    }
}

impl IntoResponse for ResponseError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match serde_json::to_string(&self) {
            Ok(body) => (
                status,
                [(header::CONTENT_TYPE, "application/problem+json")],
                body,
            )
                .into_response(),
            Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

#[derive(Debug, Serialize)]
struct FieldError {
    field: String,
    message: String,
}

fn parse_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, issues)| {
            issues.iter().map(move |issue| FieldError {
                field: field.to_string(),
                message: issue
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| issue.code.to_string()),
            })
        })
        .collect()
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let response = ResponseError::default()
            .title("There were validation errors with your request.")
            .details(&self.to_string())
            .status(StatusCode::BAD_REQUEST);

        let response = match &self {
            ServerError::Validation(validation_errors) => {
                response.errors(validation_errors)
            },

            ServerError::Axum(rejection) => response
                .title("Request body is malformed.")
                .status(rejection.status()),

            ServerError::Otp(err) if err.is_recoverable() => {
                response.title("Invalid secret key.")
            },

            ServerError::Otp(err @ OtpError::CryptoUnavailable { .. }) => {
                tracing::error!(error = %err, "HMAC-SHA1 is unavailable");

                response
                    .title("Code generation is unavailable.")
                    .status(StatusCode::SERVICE_UNAVAILABLE)
            },

            ServerError::Otp(err) => {
                tracing::error!(error = %err, "server returned 500 status");

                ResponseError::default()
            },
        };

        response.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let status = |err: ServerError| err.into_response().status();

        assert_eq!(
            status(OtpError::ValidationFailure.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(OtpError::InvalidSecret.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(
                OtpError::CryptoUnavailable {
                    cause: "no provider".into()
                }
                .into()
            ),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status(
                OtpError::InvalidConfig {
                    field: "digits",
                    message: "digits must be between 4 and 8".into(),
                }
                .into()
            ),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

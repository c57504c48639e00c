//! TOTP (RFC 6238) codec.
//!
//! The codec is stateless: every call works on its own copy of the key bytes
//! and the timestamp. It never logs and never retries, callers decide what to
//! do with an [`OtpError`].

pub mod base32;
mod engine;
pub mod secret;
pub mod signer;

pub use self::base32::{DecodeError, DecodeMode};
pub use engine::{
    Code, TimeStep, Totp, TotpConfig, Window, next_boundary_at,
    remaining_seconds_at, truncate,
};
pub use secret::{MIN_SECRET_LENGTH, Secret, Session, format_secret, is_valid_secret};
pub use signer::{Digest, HmacSha1, HmacSigner};

pub type Result<T> = std::result::Result<T, OtpError>;

/// Failures surfaced by the codec, one per call.
#[derive(Debug, thiserror::Error)]
pub enum OtpError {
    #[error(
        "secret key must only contain base32 characters and be at least {MIN_SECRET_LENGTH} characters long"
    )]
    ValidationFailure,
    #[error("secret key does not decode to any key bytes")]
    InvalidSecret,
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("HMAC-SHA1 is unavailable: {cause}")]
    CryptoUnavailable { cause: String },
    #[error("invalid `{field}`: {message}")]
    InvalidConfig {
        field: &'static str,
        message: String,
    },
}

impl OtpError {
    /// Whether the user can fix the failure by changing the secret.
    ///
    /// `CryptoUnavailable` means the runtime cannot compute codes at all and
    /// the feature should be turned off instead of retried.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            OtpError::CryptoUnavailable { .. } | OtpError::InvalidConfig { .. }
        )
    }
}

//! Keyed-hash primitive used by the engine.

use std::future::{Future, ready};

use hmac::{Hmac, Mac};
use sha1::Sha1;

use super::{OtpError, Result};

/// Raw HMAC output.
pub type Digest = Vec<u8>;

/// Port for the HMAC computation.
///
/// Implementations may complete immediately or suspend, e.g. when the
/// primitive lives behind a platform crypto service.
pub trait HmacSigner: Send + Sync {
    /// Compute `HMAC(key, message)`.
    fn sign(
        &self,
        key: &[u8],
        message: &[u8],
    ) -> impl Future<Output = Result<Digest>> + Send;
}

/// HMAC-SHA1 signer backed by RustCrypto.
#[derive(Debug, Default, Clone, Copy)]
pub struct HmacSha1;

impl HmacSha1 {
    /// Length of a SHA-1 digest, in bytes.
    pub const DIGEST_LENGTH: usize = 20;

    pub fn new() -> Self {
        Self
    }

    /// Synchronous HMAC-SHA1.
    pub fn digest(&self, key: &[u8], message: &[u8]) -> Result<Digest> {
        let mut mac = Hmac::<Sha1>::new_from_slice(key).map_err(|err| {
            OtpError::CryptoUnavailable {
                cause: err.to_string(),
            }
        })?;

        mac.update(message);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

impl HmacSigner for HmacSha1 {
    fn sign(
        &self,
        key: &[u8],
        message: &[u8],
    ) -> impl Future<Output = Result<Digest>> + Send {
        ready(self.digest(key, message))
    }
}

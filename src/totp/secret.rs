//! Shared secret handling: format checks, display and key ownership.

use zeroize::Zeroizing;

use super::base32::{self, DecodeMode};
use super::engine::TotpConfig;
use super::{OtpError, Result};

/// Minimum count of base32 characters for a usable secret (80 bits).
pub const MIN_SECRET_LENGTH: usize = 16;
const GROUP_SIZE: usize = 4;

/// Strip whitespace and uppercase `input`.
pub fn normalize(input: &str) -> Zeroizing<String> {
    Zeroizing::new(base32::normalized(input).collect())
}

/// Check the format of a secret before any decoding.
///
/// Once normalized, `input` must consist only of `A-Z2-7` and be at least
/// [`MIN_SECRET_LENGTH`] characters long.
pub fn is_valid_secret(input: &str) -> bool {
    if input.is_empty() {
        return false;
    }

    let clean = normalize(input);
    clean.len() >= MIN_SECRET_LENGTH
        && clean
            .bytes()
            .all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(&b))
}

/// Group a secret by four characters for display, e.g. `JBSW Y3DP`.
pub fn format_secret(input: &str) -> String {
    let clean: Vec<char> =
        input.chars().filter(|&c| !base32::is_separator(c)).collect();

    clean
        .chunks(GROUP_SIZE)
        .map(|group| group.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decoded key bytes, wiped from memory on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Zeroizing<Vec<u8>>);

impl Secret {
    /// Decode a base32 secret.
    ///
    /// # Errors
    ///
    /// Returns `Err` if strict decoding rejects a character, or if nothing
    /// is left once decoded.
    pub fn from_base32(encoded: &str, mode: DecodeMode) -> Result<Self> {
        let bytes = base32::decode_with(encoded, mode)?;
        Self::from_bytes(bytes)
    }

    /// Wrap raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `bytes` is empty.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(OtpError::InvalidSecret);
        }

        Ok(Self(Zeroizing::new(bytes)))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Secret").field(&"[REDACTED]").finish()
    }
}

/// One user's generation session: the key and the parameters it is used
/// with.
#[derive(Debug, Clone)]
pub struct Session {
    secret: Secret,
    config: TotpConfig,
}

impl Session {
    /// Validate and decode `raw` for use with `config`.
    ///
    /// # Errors
    ///
    /// Returns `Err` with [`OtpError::ValidationFailure`] if the format check
    /// fails, or with the decoding error otherwise.
    pub fn open(raw: &str, config: TotpConfig) -> Result<Self> {
        if !is_valid_secret(raw) {
            return Err(OtpError::ValidationFailure);
        }

        let secret = Secret::from_base32(raw, config.decoding())?;
        Ok(Self { secret, config })
    }

    pub fn secret(&self) -> &Secret {
        &self.secret
    }

    pub fn config(&self) -> &TotpConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validator_length_boundary() {
        assert!(!is_valid_secret("JBSWY3DPEHPK3PX"));
        assert!(is_valid_secret("JBSWY3DPEHPK3PXP"));
        assert!(is_valid_secret("jbsw y3dp ehpk 3pxp"));
    }

    #[test]
    fn test_validator_rejects_foreign_characters() {
        assert!(!is_valid_secret("JBSWY3DPEHPK3PXP1BCD"));
        assert!(!is_valid_secret("JBSWY3DPEHPK3PXP===="));
        assert!(!is_valid_secret(""));
        assert!(!is_valid_secret("                    "));
    }

    #[test]
    fn test_validator_whitespace_set() {
        assert!(is_valid_secret("JBSWY3DPEHPK3PXP\u{feff}"));
        assert!(is_valid_secret("\u{feff}JBSW\u{a0}Y3DP\u{2029}EHPK3PXP"));
        assert!(!is_valid_secret("JBSWY3DPEHPK3PXP\u{85}"));
        assert_eq!(normalize("ab\u{feff}c").as_str(), "ABC");
        assert_eq!(format_secret("JBSW\u{feff}Y3DP"), "JBSW Y3DP");
    }

    #[test]
    fn test_format_secret() {
        assert_eq!(format_secret("JBSWY3DPEHPK3PXP"), "JBSW Y3DP EHPK 3PXP");
        assert_eq!(format_secret(" jbs wy3 dp"), "jbsw y3dp");
        assert_eq!(format_secret("ABCDEF"), "ABCD EF");
        assert_eq!(format_secret(""), "");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(" ab\tc7 ").as_str(), "ABC7");
    }

    #[test]
    fn test_secret_from_base32() {
        let secret =
            Secret::from_base32("NBSWY3DP", DecodeMode::Lenient).unwrap();
        assert_eq!(secret.as_bytes(), b"hello");
        assert_eq!(secret.len(), 5);

        assert!(matches!(
            Secret::from_base32("01890", DecodeMode::Lenient),
            Err(OtpError::InvalidSecret)
        ));
        assert!(matches!(
            Secret::from_base32("NBSWY3D1", DecodeMode::Strict),
            Err(OtpError::Decode(_))
        ));
    }

    #[test]
    fn test_secret_is_redacted() {
        let secret = Secret::from_bytes(b"hello".to_vec()).unwrap();
        assert_eq!(format!("{secret:?}"), "Secret(\"[REDACTED]\")");
    }

    #[test]
    fn test_session_open() {
        let session =
            Session::open("GEZD GNBV GY3T QOJQ", TotpConfig::default()).unwrap();
        assert_eq!(session.secret().as_bytes(), b"1234567890");

        assert!(matches!(
            Session::open("GEZDGNBV", TotpConfig::default()),
            Err(OtpError::ValidationFailure)
        ));
    }
}

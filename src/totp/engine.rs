//! TOTP generator (RFC 6238) on top of HOTP truncation (RFC 4226).

use std::num::NonZeroU64;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use super::base32::DecodeMode;
use super::secret::Secret;
use super::signer::{HmacSha1, HmacSigner};
use super::{OtpError, Result};
use crate::clock::{Clock, SystemClock};

const TRUNCATED_LENGTH: usize = 4;
const DEFAULT_STEP: NonZeroU64 =
    NonZeroU64::new(TotpConfig::DEFAULT_PERIOD).unwrap();

/// Parameters shared by every code of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TotpConfig {
    /// Time step in seconds (usually 30).
    period: NonZeroU64,
    /// Number of digits in the code (usually 6).
    digits: u8,
    /// How the base32 secret is decoded.
    decoding: DecodeMode,
}

impl TotpConfig {
    pub const DEFAULT_DIGITS: u8 = 6;
    /// Default time step as per RFC 6238.
    pub const DEFAULT_PERIOD: u64 = 30;

    /// Create a new TOTP configuration with validation.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `period` is zero or if `digits` is not contained
    /// between 4 and 8.
    pub fn new(period: u64, digits: u8, decoding: DecodeMode) -> Result<Self> {
        let period =
            NonZeroU64::new(period).ok_or_else(|| OtpError::InvalidConfig {
                field: "period",
                message: "time step must be greater than 0".into(),
            })?;

        if !(4..=8).contains(&digits) {
            return Err(OtpError::InvalidConfig {
                field: "digits",
                message: "digits must be between 4 and 8".into(),
            });
        }

        Ok(Self {
            period,
            digits,
            decoding,
        })
    }

    pub fn period(&self) -> NonZeroU64 {
        self.period
    }

    pub fn digits(&self) -> u8 {
        self.digits
    }

    pub fn decoding(&self) -> DecodeMode {
        self.decoding
    }
}

impl Default for TotpConfig {
    fn default() -> Self {
        Self {
            period: DEFAULT_STEP,
            digits: Self::DEFAULT_DIGITS,
            decoding: DecodeMode::Lenient,
        }
    }
}

/// HOTP counter derived from the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeStep(i64);

impl TimeStep {
    pub fn new(counter: i64) -> Self {
        Self(counter)
    }

    /// `floor(unix_seconds / period) + offset`.
    pub fn at(unix_seconds: u64, period: NonZeroU64, offset: i64) -> Self {
        let base = i64::try_from(unix_seconds / period).unwrap_or(i64::MAX);
        Self(base.saturating_add(offset))
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// 8-byte big-endian counter. The first four bytes are always zero,
    /// the low 32 bits of the step fill the rest.
    pub fn to_be_bytes(self) -> [u8; 8] {
        let mut buffer = [0u8; 8];
        buffer[4..].copy_from_slice(&(self.0 as u32).to_be_bytes());
        buffer
    }
}

/// A fixed-width, zero-padded decimal code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Code {
    value: String,
    digits: u8,
}

impl Code {
    /// Render `number` left-padded with zeros to `digits` characters.
    pub fn from_number(number: u32, digits: u8) -> Self {
        Self {
            value: format!("{:0>width$}", number, width = digits as usize),
            digits,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn digits(&self) -> u8 {
        self.digits
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

impl Serialize for Code {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

/// Codes of the previous, current and next time steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Window {
    pub previous: Code,
    pub current: Code,
    pub next: Code,
}

/// Dynamic truncation (RFC 4226 §5.3), reduced to `digits` decimal digits.
///
/// # Errors
///
/// Returns `Err` if `digest` is too short for the offset its last byte
/// selects.
pub fn truncate(digest: &[u8], digits: u8) -> Result<u32> {
    let too_short = || OtpError::CryptoUnavailable {
        cause: format!("digest of {} bytes is too short", digest.len()),
    };

    let last = digest.last().ok_or_else(too_short)?;
    let offset = (last & 0x0f) as usize;
    let bytes = digest
        .get(offset..offset + TRUNCATED_LENGTH)
        .ok_or_else(too_short)?;

    let binary_code = ((bytes[0] as u32 & 0x7f) << 24) |
        ((bytes[1] as u32) << 16) |
        ((bytes[2] as u32) << 8) |
        (bytes[3] as u32);

    match 10u32.checked_pow(digits as u32) {
        Some(modulus) => Ok(binary_code % modulus),
        // 31 bits never exceed ten digits.
        None => Ok(binary_code),
    }
}

/// Seconds left in the step containing `unix_seconds`, in `[1, period]`.
pub fn remaining_seconds_at(unix_seconds: u64, period: NonZeroU64) -> u64 {
    period.get() - (unix_seconds % period)
}

/// Start of the step following the one containing `unix_seconds`.
pub fn next_boundary_at(unix_seconds: u64, period: NonZeroU64) -> u64 {
    unix_seconds + remaining_seconds_at(unix_seconds, period)
}

/// TOTP engine built on an injected HMAC primitive and clock.
///
/// It holds no secret and no per-call state.
pub struct Totp<S = HmacSha1> {
    signer: S,
    clock: Arc<dyn Clock>,
}

impl Totp {
    /// Create a new [`Totp`] with HMAC-SHA1 and the system clock.
    pub fn new() -> Self {
        Self::with(HmacSha1::new(), Arc::new(SystemClock::new()))
    }
}

impl Default for Totp {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: HmacSigner> Totp<S> {
    pub fn with(signer: S, clock: Arc<dyn Clock>) -> Self {
        Self { signer, clock }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Generate the code of `secret` for the current step shifted by
    /// `offset`.
    pub async fn generate(
        &self,
        secret: &str,
        offset: i64,
        config: &TotpConfig,
    ) -> Result<Code> {
        self.generate_at(secret, offset, config, self.clock.now())
            .await
    }

    /// Generate the code of `secret` at `unix_seconds`, shifted by `offset`
    /// steps.
    pub async fn generate_at(
        &self,
        secret: &str,
        offset: i64,
        config: &TotpConfig,
        unix_seconds: u64,
    ) -> Result<Code> {
        let step = TimeStep::at(unix_seconds, config.period(), offset);
        let key = Secret::from_base32(secret, config.decoding())?;

        self.generate_with_key(&key, step, config.digits()).await
    }

    /// Generate the code of an already decoded key for `step`.
    pub async fn generate_with_key(
        &self,
        key: &Secret,
        step: TimeStep,
        digits: u8,
    ) -> Result<Code> {
        let counter = step.to_be_bytes();
        let digest = self.signer.sign(key.as_bytes(), &counter).await?;
        let number = truncate(&digest, digits)?;

        Ok(Code::from_number(number, digits))
    }

    /// Generate the codes of the previous, current and next steps.
    pub async fn generate_window(
        &self,
        secret: &str,
        config: &TotpConfig,
    ) -> Result<Window> {
        self.generate_window_at(secret, config, self.clock.now())
            .await
    }

    /// Same as [`Totp::generate_window`] at `unix_seconds`.
    ///
    /// All three steps derive from the same timestamp.
    pub async fn generate_window_at(
        &self,
        secret: &str,
        config: &TotpConfig,
        unix_seconds: u64,
    ) -> Result<Window> {
        let (previous, current, next) = tokio::try_join!(
            self.generate_at(secret, -1, config, unix_seconds),
            self.generate_at(secret, 0, config, unix_seconds),
            self.generate_at(secret, 1, config, unix_seconds),
        )?;

        Ok(Window {
            previous,
            current,
            next,
        })
    }

    /// Check `candidate` against the window around the current step.
    ///
    /// Every code of the window is compared in constant time. No replay
    /// state is kept.
    pub async fn verify(
        &self,
        candidate: &str,
        secret: &str,
        config: &TotpConfig,
    ) -> Result<bool> {
        let window = self.generate_window(secret, config).await?;

        let matches = [&window.previous, &window.current, &window.next]
            .iter()
            .fold(false, |found, code| {
                constant_time_eq::constant_time_eq(
                    code.value().as_bytes(),
                    candidate.as_bytes(),
                ) | found
            });

        Ok(matches)
    }

    /// Seconds left before the current code expires, in `[1, period]`.
    pub fn remaining_seconds(&self, period: NonZeroU64) -> u64 {
        remaining_seconds_at(self.clock.now(), period)
    }
}

//! Configuration manager for otpgen.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::FromRef;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::totp::{DecodeMode, OtpError, TotpConfig};

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_ADDRESS: &str = "0.0.0.0:8888";
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Errors that may occur during the configuration loading process.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to deserialize `config.yaml`: {0}")]
    Deserialize(#[from] serde_yaml::Error),
    #[error(transparent)]
    Totp(#[from] OtpError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Instance name.
    pub name: String,
    /// `host:port` the API listens on.
    pub address: String,
    /// Related to code generation.
    pub totp: Totp,
    #[serde(skip)]
    version: String,
    #[serde(skip)]
    path: PathBuf,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: env!("CARGO_CRATE_NAME").into(),
            address: DEFAULT_ADDRESS.into(),
            totp: Totp::default(),
            version: VERSION.to_owned(),
            path: PathBuf::default(),
        }
    }
}

/// TOTP configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Totp {
    /// Number of digits for the code.
    pub digits: u8,
    /// Validity of a code, in seconds.
    pub period: u64,
    /// Handling of characters outside of the base32 alphabet.
    pub decoding: DecodeMode,
}

impl Default for Totp {
    fn default() -> Self {
        Self {
            digits: TotpConfig::DEFAULT_DIGITS,
            period: TotpConfig::DEFAULT_PERIOD,
            decoding: DecodeMode::Lenient,
        }
    }
}

impl FromRef<AppState> for Arc<Configuration> {
    fn from_ref(state: &AppState) -> Arc<Configuration> {
        Arc::clone(&state.config)
    }
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Validated generation parameters.
    pub fn totp_config(&self) -> Result<TotpConfig, OtpError> {
        TotpConfig::new(self.totp.period, self.totp.digits, self.totp.decoding)
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    pub fn read(self) -> Result<Arc<Self>, ConfigError> {
        let file_path = if self.path.is_file() {
            &self.path
        } else {
            &Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
        };

        match File::open(file_path) {
            Ok(file) => {
                let mut config: Configuration = serde_yaml::from_reader(file)?;

                // set app version.
                config.version = VERSION.to_owned();
                config.path = file_path.clone();

                // reject unusable generation parameters on start.
                config.totp_config()?;

                Ok(Arc::new(config))
            },
            Err(err) => Ok(Arc::new(self.error(err))),
        }
    }

    /// Return a default configuration as fallback.
    fn error(&self, err: impl std::error::Error) -> Self {
        tracing::error!(error = %err, "`config.yaml` file not found");
        Self {
            path: self.path.clone(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = Configuration::default();

        assert_eq!(config.address, DEFAULT_ADDRESS);
        assert_eq!(config.version(), VERSION);
        assert_eq!(config.totp_config().unwrap(), TotpConfig::default());
    }

    #[test]
    fn test_deserialize() {
        let config: Configuration = serde_yaml::from_str(
            "name: otp\ntotp:\n  digits: 8\n  period: 60\n  decoding: strict\n",
        )
        .unwrap();

        assert_eq!(config.name, "otp");
        assert_eq!(config.address, DEFAULT_ADDRESS);

        let totp = config.totp_config().unwrap();
        assert_eq!(totp.digits(), 8);
        assert_eq!(totp.period().get(), 60);
        assert_eq!(totp.decoding(), DecodeMode::Strict);
    }

    #[test]
    fn test_invalid_totp_section() {
        let config: Configuration =
            serde_yaml::from_str("totp:\n  digits: 12\n").unwrap();

        assert!(matches!(
            config.totp_config(),
            Err(OtpError::InvalidConfig { field: "digits", .. })
        ));
    }

    #[test]
    fn test_missing_file_fallback() {
        let config = Configuration::default()
            .path(PathBuf::from("does/not/exist.yaml"))
            .read()
            .unwrap();

        assert_eq!(config.totp, Totp::default());
        assert_eq!(config.version(), VERSION);
    }
}

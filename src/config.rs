//! Runtime settings read from `FIBRORISK_*` environment variables.

use std::path::{Path, PathBuf};

use crate::adapters::artifact::verifying_key_from_b64;
use crate::adapters::sanitize::DEFAULT_SANITIZE_MAX_BYTES;
use crate::adapters::{ArtifactError, VerificationPolicy};

pub const LOG_MODE_ENV: &str = "FIBRORISK_LOG_MODE";
pub const LOG_FILE_ENV: &str = "FIBRORISK_LOG_FILE";
pub const SANITIZE_MAX_BYTES_ENV: &str = "FIBRORISK_SANITIZE_MAX_BYTES";
pub const MODEL_PATH_ENV: &str = "FIBRORISK_MODEL_PATH";
pub const ALLOW_UNSIGNED_MODELS_ENV: &str = "FIBRORISK_ALLOW_UNSIGNED_MODELS";
pub const PUBKEY_FILE_ENV: &str = "FIBRORISK_MODEL_SIGNING_PUBKEY_B64_FILE";
pub const PUBKEY_ENV: &str = "FIBRORISK_MODEL_SIGNING_PUBKEY_B64";
pub const SIGNING_KEY_FILE_ENV: &str = "FIBRORISK_MODEL_SIGNING_KEY_B64_FILE";

const DOCKER_SECRET_PUBKEY: &str = "/run/secrets/fibrorisk_model_signing_pubkey_b64";

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// File when stdout is a terminal (the TUI owns the screen), stdout otherwise.
    Auto,
    File,
    Stdout,
}

impl LogMode {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Self::File,
            "stdout" => Self::Stdout,
            _ => Self::Auto,
        }
    }

    /// Whether to log to a file, given whether stdout is interactive.
    #[must_use]
    pub fn use_file(&self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

/// `1`, `true` or `yes`, in any case.
#[must_use]
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub log_mode: LogMode,
    pub log_file: PathBuf,
    pub sanitize_max_bytes: usize,
    pub model_path: PathBuf,
    pub allow_unsigned_models: bool,
    pub pubkey_file: Option<PathBuf>,
    pub pubkey_b64: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Settings {
    /// Read settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, falling back to defaults for unset or
    /// unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            log_mode: non_empty(LOG_MODE_ENV)
                .map(|v| LogMode::parse(&v))
                .unwrap_or(LogMode::Auto),
            log_file: non_empty(LOG_FILE_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("fibrorisk.log")),
            sanitize_max_bytes: non_empty(SANITIZE_MAX_BYTES_ENV)
                .and_then(|v| v.trim().parse::<usize>().ok())
                .filter(|&v| v > 0)
                .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES),
            model_path: non_empty(MODEL_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("models")),
            allow_unsigned_models: non_empty(ALLOW_UNSIGNED_MODELS_ENV)
                .is_some_and(|v| parse_bool(&v)),
            pubkey_file: non_empty(PUBKEY_FILE_ENV).map(|v| PathBuf::from(v.trim())),
            pubkey_b64: non_empty(PUBKEY_ENV),
        }
    }

    /// Build the model verification policy, loading the verifying key.
    ///
    /// Key sources, first match wins: the key file setting, the inline key
    /// setting, then the Docker secret file. Signatures are only required
    /// once a key is configured; without one, an unsigned model directory
    /// loads with a warning.
    ///
    /// # Errors
    /// Returns `ArtifactError` if a configured key cannot be read or parsed.
    pub fn verification_policy(&self) -> Result<VerificationPolicy, ArtifactError> {
        let verifying_key = if let Some(path) = &self.pubkey_file {
            Some(verifying_key_from_b64(&read_key_file(path)?)?)
        } else if let Some(b64) = &self.pubkey_b64 {
            Some(verifying_key_from_b64(b64)?)
        } else if Path::new(DOCKER_SECRET_PUBKEY).exists() {
            Some(verifying_key_from_b64(&read_key_file(Path::new(
                DOCKER_SECRET_PUBKEY,
            ))?)?)
        } else {
            None
        };

        Ok(VerificationPolicy {
            allow_unsigned: self.allow_unsigned_models || verifying_key.is_none(),
            verifying_key,
        })
    }
}

fn read_key_file(path: &Path) -> Result<String, ArtifactError> {
    std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

//! Model artifact verification.
//!
//! A model directory holds `model.json` and, when signed, a `manifest.json`
//! binding SHA-256 hashes of the model files plus an Ed25519 signature over
//! the manifest bytes in `model.sig`.
//!
//! # Security
//!
//! - The bytes handed to the model parser are the bytes that were hashed
//! - Signed manifests must bind `model.json`
//! - Manifests dated more than five minutes in the future are refused
//! - Unsigned directories load only when the policy allows it

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const MODEL_FILE: &str = "model.json";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "model.sig";

/// Supported manifest format.
const MANIFEST_VERSION: u32 = 1;

/// Clock skew allowance for `created_at`.
const MAX_FUTURE_SKEW_SECS: i64 = 300;

const NONCE_LEN: usize = 16;

/// Errors raised while locating or verifying a model artifact.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("No {MODEL_FILE} found at {0:?}")]
    ModelNotFound(PathBuf),

    #[error("Model at {0:?} is unsigned; sign it with model_tool or set FIBRORISK_ALLOW_UNSIGNED_MODELS=true")]
    Unsigned(PathBuf),

    #[error("Model at {0:?} is signed but no verifying key is configured")]
    NoVerifyingKey(PathBuf),

    #[error("Only one of {MANIFEST_FILE} and {SIGNATURE_FILE} present in {0:?}")]
    IncompleteSignature(PathBuf),

    #[error("Invalid model signature")]
    BadSignature,

    #[error("Invalid manifest: {0}")]
    Manifest(String),

    #[error("File hash mismatch for {0}")]
    HashMismatch(String),

    #[error("Invalid key: {0}")]
    Key(String),

    #[error("Failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn read(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
    fs::write(path, bytes).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Seconds since the Unix epoch (0 if the clock is before it).
#[must_use]
pub fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Lowercase hex SHA-256 digest.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

// Constant-time compare for ASCII strings (SHA-256 hex digests).
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes().iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Parse a base64-encoded 32-byte Ed25519 public key.
///
/// # Errors
/// Returns `ArtifactError::Key` on bad base64, wrong length or an invalid point.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, ArtifactError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| ArtifactError::Key("invalid public key base64".into()))?;
    let pubkey: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| ArtifactError::Key("invalid public key length (expected 32 bytes)".into()))?;
    VerifyingKey::from_bytes(&pubkey).map_err(|_| ArtifactError::Key("invalid verifying key".into()))
}

/// Signed content: which files make up the model and their hashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub version: u32,
    /// Monotonic release number chosen by the signer.
    pub serial: u64,
    /// Signing time, Unix seconds.
    pub created_at: i64,
    /// 16 random bytes, base64.
    pub nonce_b64: String,
    /// Relative file name → lowercase hex SHA-256.
    pub files: BTreeMap<String, String>,
}

impl ModelManifest {
    /// Hash `files` (relative to `dir`) into a fresh manifest.
    ///
    /// # Errors
    /// Returns error if a file cannot be read.
    pub fn for_files(dir: &Path, files: &[&str], serial: u64) -> Result<Self, ArtifactError> {
        let mut hashes = BTreeMap::new();
        for rel in files {
            let bytes = read(&dir.join(rel))?;
            hashes.insert((*rel).to_string(), sha256_hex(&bytes));
        }

        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        Ok(Self {
            version: MANIFEST_VERSION,
            serial,
            created_at: unix_now(),
            nonce_b64: base64::engine::general_purpose::STANDARD.encode(nonce),
            files: hashes,
        })
    }

    /// Structural checks that do not touch the filesystem.
    ///
    /// # Errors
    /// Returns `ArtifactError::Manifest` describing the first violation.
    pub fn validate(&self, now: i64) -> Result<(), ArtifactError> {
        if self.version != MANIFEST_VERSION {
            return Err(ArtifactError::Manifest(format!(
                "unsupported manifest version {}",
                self.version
            )));
        }

        let nonce = base64::engine::general_purpose::STANDARD
            .decode(self.nonce_b64.trim())
            .map_err(|e| ArtifactError::Manifest(format!("invalid nonce base64: {e}")))?;
        if nonce.len() != NONCE_LEN {
            return Err(ArtifactError::Manifest(format!(
                "nonce must decode to exactly {NONCE_LEN} bytes"
            )));
        }

        if self.created_at > now + MAX_FUTURE_SKEW_SECS {
            return Err(ArtifactError::Manifest("created_at is in the future".into()));
        }

        if self.files.is_empty() {
            return Err(ArtifactError::Manifest("no files listed".into()));
        }
        if !self.files.contains_key(MODEL_FILE) {
            return Err(ArtifactError::Manifest(format!("must include {MODEL_FILE}")));
        }
        if let Some(bad) = self
            .files
            .keys()
            .find(|rel| Path::new(rel).components().count() != 1 || rel.contains(".."))
        {
            return Err(ArtifactError::Manifest(format!(
                "file {bad:?} is outside the model directory"
            )));
        }
        Ok(())
    }
}

/// Serialize `manifest`, sign it and write `manifest.json` plus `model.sig` into `dir`.
///
/// # Errors
/// Returns error if serialization or writing fails.
pub fn write_signed_manifest(
    dir: &Path,
    manifest: &ModelManifest,
    signing_key: &SigningKey,
) -> Result<(), ArtifactError> {
    let bytes = serde_json::to_vec_pretty(manifest)
        .map_err(|e| ArtifactError::Manifest(format!("serialize: {e}")))?;
    let signature: Signature = signing_key.sign(&bytes);

    write(&dir.join(MANIFEST_FILE), &bytes)?;
    write(&dir.join(SIGNATURE_FILE), &signature.to_bytes())?;
    Ok(())
}

/// What the loader accepts.
#[derive(Debug, Clone, Default)]
pub struct VerificationPolicy {
    /// Load directories without a manifest.
    pub allow_unsigned: bool,
    /// Key that signed manifests must verify against.
    pub verifying_key: Option<VerifyingKey>,
}

/// How a loaded model was vouched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    Signed { serial: u64, created_at: i64 },
    Unsigned,
}

/// Model file contents that passed the policy.
#[derive(Debug, Clone)]
pub struct VerifiedModel {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub provenance: Provenance,
}

/// Locate `model.json` under `model_path` and verify it against `policy`.
///
/// `model_path` may be the model directory or the model file itself.
///
/// # Errors
/// Returns `ArtifactError` if the model is missing, unsigned without
/// permission, or fails signature or hash checks.
pub fn open_model(
    model_path: &Path,
    policy: &VerificationPolicy,
) -> Result<VerifiedModel, ArtifactError> {
    let (base_dir, model_file) = if model_path.is_file() {
        (
            model_path.parent().unwrap_or(Path::new(".")).to_path_buf(),
            model_path.to_path_buf(),
        )
    } else {
        (model_path.to_path_buf(), model_path.join(MODEL_FILE))
    };

    let manifest_path = base_dir.join(MANIFEST_FILE);
    let sig_path = base_dir.join(SIGNATURE_FILE);

    match (manifest_path.exists(), sig_path.exists()) {
        (false, false) => {
            if !model_file.exists() {
                return Err(ArtifactError::ModelNotFound(model_path.to_path_buf()));
            }
            if !policy.allow_unsigned {
                tracing::error!("Model signature not found in {:?}", base_dir);
                return Err(ArtifactError::Unsigned(base_dir));
            }
            tracing::warn!("Loading UNSIGNED model from {:?}", base_dir);
            let bytes = read(&model_file)?;
            Ok(VerifiedModel {
                path: model_file,
                bytes,
                provenance: Provenance::Unsigned,
            })
        }
        (true, true) => verify_signed(&base_dir, &model_file, &manifest_path, &sig_path, policy),
        _ => Err(ArtifactError::IncompleteSignature(base_dir)),
    }
}

fn verify_signed(
    base_dir: &Path,
    model_file: &Path,
    manifest_path: &Path,
    sig_path: &Path,
    policy: &VerificationPolicy,
) -> Result<VerifiedModel, ArtifactError> {
    let public_key = policy
        .verifying_key
        .as_ref()
        .ok_or_else(|| ArtifactError::NoVerifyingKey(base_dir.to_path_buf()))?;

    let sig_bytes = read(sig_path)?;
    let sig_array: [u8; 64] = sig_bytes
        .as_slice()
        .try_into()
        .map_err(|_| ArtifactError::Manifest("invalid signature length (expected 64 bytes)".into()))?;
    let signature = Signature::from_bytes(&sig_array);

    // Verify the signed bytes before parsing them.
    let manifest_content = read(manifest_path)?;
    public_key
        .verify(&manifest_content, &signature)
        .map_err(|_| ArtifactError::BadSignature)?;

    let manifest: ModelManifest = serde_json::from_slice(&manifest_content)
        .map_err(|e| ArtifactError::Manifest(format!("invalid format: {e}")))?;
    manifest.validate(unix_now())?;

    let model_name = model_file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(MODEL_FILE);
    if !manifest.files.contains_key(model_name) {
        return Err(ArtifactError::Manifest(format!(
            "{model_name} is not bound by the manifest"
        )));
    }

    let mut model_bytes = None;
    for (rel, expected_hex) in &manifest.files {
        let bytes = read(&base_dir.join(rel))?;
        if !constant_time_eq_str(&sha256_hex(&bytes), expected_hex) {
            return Err(ArtifactError::HashMismatch(rel.clone()));
        }
        if rel == model_name {
            model_bytes = Some(bytes);
        }
    }
    let bytes = model_bytes.ok_or_else(|| ArtifactError::ModelNotFound(model_file.to_path_buf()))?;

    tracing::info!(
        "Model signature and hashes verified (serial={}, files={})",
        manifest.serial,
        manifest.files.len()
    );

    Ok(VerifiedModel {
        path: model_file.to_path_buf(),
        bytes,
        provenance: Provenance::Signed {
            serial: manifest.serial,
            created_at: manifest.created_at,
        },
    })
}

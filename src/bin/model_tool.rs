//! Model artifact utility: signing keys, signed manifests, verification.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin model_tool -- keygen --out-seed <path> [--out-pub <path>] [--force]
//! cargo run --bin model_tool -- sign <model_dir> [--serial <u64>]
//! cargo run --bin model_tool -- verify [<model_dir>]
//! ```
//!
//! `sign` reads the base64 Ed25519 seed from the file named by
//! `FIBRORISK_MODEL_SIGNING_KEY_B64_FILE`. `verify` uses the same settings
//! as the application (`FIBRORISK_MODEL_SIGNING_PUBKEY_B64_FILE` etc).
//!
//! Only non-secret material is ever printed.

use std::fs::OpenOptions;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::SigningKey;
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

use fibrorisk::adapters::artifact::{
    unix_now, write_signed_manifest, ModelManifest, MANIFEST_FILE, MODEL_FILE, SIGNATURE_FILE,
};
use fibrorisk::adapters::load_classifier;
use fibrorisk::config::{Settings, SIGNING_KEY_FILE_ENV};
use fibrorisk::ports::Classifier;

const USAGE: &str = "Usage:
  model_tool keygen --out-seed <path> [--out-pub <path>] [--force]
  model_tool sign <model_dir> [--serial <u64>]
  model_tool verify [<model_dir>]";

enum Command {
    Keygen {
        out_seed: PathBuf,
        out_pub: Option<PathBuf>,
        force: bool,
    },
    Sign {
        model_dir: PathBuf,
        serial: Option<u64>,
    },
    Verify {
        model_dir: Option<PathBuf>,
    },
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> Result<Command> {
    let sub = args.next().ok_or_else(|| anyhow!(USAGE))?;
    match sub.as_str() {
        "keygen" => {
            let mut out_seed = None;
            let mut out_pub = None;
            let mut force = false;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--out-seed" => out_seed = Some(PathBuf::from(value(&mut args, &arg)?)),
                    "--out-pub" => out_pub = Some(PathBuf::from(value(&mut args, &arg)?)),
                    "--force" => force = true,
                    _ => bail!("Unknown arg: {arg}\n{USAGE}"),
                }
            }
            Ok(Command::Keygen {
                out_seed: out_seed.ok_or_else(|| anyhow!("--out-seed is required\n{USAGE}"))?,
                out_pub,
                force,
            })
        }
        "sign" => {
            let mut model_dir = None;
            let mut serial = None;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--serial" => {
                        let v = value(&mut args, &arg)?;
                        serial = Some(
                            v.trim()
                                .parse::<u64>()
                                .map_err(|_| anyhow!("--serial must be a u64"))?,
                        );
                    }
                    _ if model_dir.is_none() && !arg.starts_with("--") => {
                        model_dir = Some(PathBuf::from(arg));
                    }
                    _ => bail!("Unknown arg: {arg}\n{USAGE}"),
                }
            }
            Ok(Command::Sign {
                model_dir: model_dir.ok_or_else(|| anyhow!("<model_dir> is required\n{USAGE}"))?,
                serial,
            })
        }
        "verify" => {
            let model_dir = args.next().map(PathBuf::from);
            if let Some(extra) = args.next() {
                bail!("Unknown arg: {extra}\n{USAGE}");
            }
            Ok(Command::Verify { model_dir })
        }
        _ => bail!("{USAGE}"),
    }
}

fn value<I: Iterator<Item = String>>(args: &mut I, flag: &str) -> Result<String> {
    args.next()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("{flag} needs a value\n{USAGE}"))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn write_new(path: &Path, contents: &[u8], mode: u32, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("Refusing to overwrite existing file {path:?}. Use --force.");
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("creating {parent:?}"))?;
    }

    let mut opts = OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    opts.mode(mode);
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = opts.open(path).with_context(|| format!("opening {path:?}"))?;
    file.write_all(contents)?;
    file.write_all(b"\n")?;
    Ok(())
}

fn keygen(out_seed: &Path, out_pub: Option<&Path>, force: bool) -> Result<()> {
    // Check both targets before writing either.
    for path in std::iter::once(out_seed).chain(out_pub) {
        if path.exists() && !force {
            bail!("Refusing to overwrite existing file {path:?}. Use --force.");
        }
    }

    let mut seed = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut seed);
    let verifying_key = SigningKey::from_bytes(&seed).verifying_key();
    let seed_b64 = Zeroizing::new(general_purpose::STANDARD.encode(seed));
    seed.zeroize();

    write_new(out_seed, seed_b64.as_bytes(), 0o600, force)?;
    println!("Wrote signing seed (base64) to {out_seed:?}");

    if let Some(path) = out_pub {
        let pub_b64 = general_purpose::STANDARD.encode(verifying_key.as_bytes());
        write_new(path, pub_b64.as_bytes(), 0o644, force)?;
        println!("Wrote public key (base64) to {path:?}");
    }
    println!("PUBKEY (hex)={}", to_hex(verifying_key.as_bytes()));
    Ok(())
}

fn read_signing_key() -> Result<SigningKey> {
    let path = std::env::var(SIGNING_KEY_FILE_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| anyhow!("Missing signing key. Set {SIGNING_KEY_FILE_ENV}."))?;

    let content = Zeroizing::new(
        std::fs::read_to_string(path.trim()).context("reading signing key file")?,
    );
    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(content.trim())
            .map_err(|e| anyhow!("Invalid base64 in signing key: {e}"))?,
    );
    let seed: &[u8; 32] = raw.as_slice().try_into().map_err(|_| {
        anyhow!(
            "Signing key seed must be 32 bytes after base64 decode (got {})",
            raw.len()
        )
    })?;
    Ok(SigningKey::from_bytes(seed))
}

fn sign(model_dir: &Path, serial: Option<u64>) -> Result<()> {
    let model_dir = if model_dir.is_file() {
        model_dir
            .parent()
            .ok_or_else(|| anyhow!("Model path has no parent directory"))?
    } else {
        model_dir
    };
    if !model_dir.join(MODEL_FILE).exists() {
        bail!("No {MODEL_FILE} found in {model_dir:?}");
    }

    let signing_key = read_signing_key()?;
    let serial = serial.unwrap_or_else(|| u64::try_from(unix_now()).unwrap_or(1).max(1));
    let manifest = ModelManifest::for_files(model_dir, &[MODEL_FILE], serial)?;
    write_signed_manifest(model_dir, &manifest, &signing_key)?;

    println!("Signed manifest: {:?}", model_dir.join(MANIFEST_FILE));
    println!("Wrote signature: {:?}", model_dir.join(SIGNATURE_FILE));
    println!("Serial: {serial}");
    println!(
        "PUBKEY (hex)={}",
        to_hex(signing_key.verifying_key().as_bytes())
    );
    Ok(())
}

fn verify(model_dir: Option<PathBuf>) -> Result<()> {
    let settings = Settings::from_env();
    let model_dir = model_dir.unwrap_or(settings.model_path.clone());
    let policy = settings.verification_policy()?;
    let model = load_classifier(&model_dir, &policy)
        .with_context(|| format!("verifying {model_dir:?}"))?;
    println!("OK: {}", model.describe());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match parse_args(std::env::args().skip(1))? {
        Command::Keygen {
            out_seed,
            out_pub,
            force,
        } => keygen(&out_seed, out_pub.as_deref(), force),
        Command::Sign { model_dir, serial } => sign(&model_dir, serial),
        Command::Verify { model_dir } => verify(model_dir),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| (*s).to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_sign() {
        match parse_args(args(&["sign", "models", "--serial", "7"])).unwrap() {
            Command::Sign { model_dir, serial } => {
                assert_eq!(model_dir, PathBuf::from("models"));
                assert_eq!(serial, Some(7));
            }
            _ => panic!("expected sign"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["keygen"])).is_err());
        assert!(parse_args(args(&["sign", "models", "--serial", "x"])).is_err());
        assert!(parse_args(args(&["keygen", "--out-seed"])).is_err());
        assert!(parse_args(args(&["frobnicate"])).is_err());
    }

    #[test]
    fn test_keygen_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let seed = dir.path().join("seed.b64");
        let public = dir.path().join("pub.b64");

        keygen(&seed, Some(&public), false).unwrap();
        let content = std::fs::read_to_string(&seed).unwrap();
        let raw = general_purpose::STANDARD.decode(content.trim()).unwrap();
        assert_eq!(raw.len(), 32);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&seed).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        assert!(keygen(&seed, None, false).is_err());
        assert_eq!(std::fs::read_to_string(&seed).unwrap(), content);
        keygen(&seed, None, true).unwrap();
        assert_ne!(std::fs::read_to_string(&seed).unwrap(), content);
    }
}

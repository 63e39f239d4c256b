//! Model artifact download and validity.
//!
//! Validity is two-tier: a recorded digest must match exactly; with no
//! recorded digest (models downloaded before digest tracking, or a reset
//! state store) a size floor stands in for provenance.
use crate::config::SetupConfig;
use crate::fingerprint::hash_file;
use anyhow::{anyhow, Context, Result};
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::path::Path;

const MODEL_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

/// Smallest plausible ggml model. Anything under this with no recorded
/// digest is a truncated or corrupt download.
pub const MIN_PLAUSIBLE_MODEL_BYTES: u64 = 100_000_000;

const DOWNLOAD_BUF_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactValidity {
    Valid,
    Missing,
    Invalid(String),
}

pub fn artifact_validity(path: &Path, stored_digest: &str) -> ArtifactValidity {
    validity_with_min(path, stored_digest, MIN_PLAUSIBLE_MODEL_BYTES)
}

fn validity_with_min(path: &Path, stored_digest: &str, min_bytes: u64) -> ArtifactValidity {
    let Ok(meta) = std::fs::metadata(path) else {
        return ArtifactValidity::Missing;
    };
    if !meta.is_file() {
        return ArtifactValidity::Missing;
    }
    if !stored_digest.is_empty() {
        return if hash_file(path) == stored_digest {
            ArtifactValidity::Valid
        } else {
            ArtifactValidity::Invalid("digest mismatch".to_string())
        };
    }
    if meta.len() >= min_bytes {
        ArtifactValidity::Valid
    } else {
        ArtifactValidity::Invalid(format!(
            "no recorded digest and only {} bytes on disk",
            meta.len()
        ))
    }
}

/// Download the model to its cache path, returning the SHA-256 digest of the
/// downloaded bytes. The transfer streams into a temp file that is only
/// renamed into place once complete.
pub fn download(config: &SetupConfig) -> Result<String> {
    let dest = config.model_path();
    let models_dir = config.models_dir();
    std::fs::create_dir_all(&models_dir)
        .with_context(|| format!("create {}", models_dir.display()))?;

    let url = format!("{}/{}", MODEL_BASE_URL, config.model_name);
    tracing::info!("downloading {} to {}", url, dest.display());

    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(config.timeouts.download))
        .build()
        .new_agent();
    let mut response = agent
        .get(&url)
        .call()
        .with_context(|| format!("fetch {url} (check network connectivity)"))?;
    let expected = response
        .headers()
        .get("content-length")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());

    let mut tmp = tempfile::NamedTempFile::new_in(&models_dir)
        .with_context(|| format!("create temp file in {}", models_dir.display()))?;
    let mut reader = response.body_mut().as_reader();
    let mut hasher = Sha256::new();
    let mut buf = [0u8; DOWNLOAD_BUF_BYTES];
    let mut downloaded = 0u64;
    loop {
        let n = reader.read(&mut buf).context("read model download")?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        tmp.write_all(&buf[..n]).context("write model download")?;
        downloaded += n as u64;
    }

    if let Some(expected) = expected {
        if downloaded != expected {
            return Err(anyhow!(
                "incomplete download: expected {expected} bytes, got {downloaded}"
            ));
        }
    }

    tmp.persist(&dest)
        .with_context(|| format!("publish {}", dest.display()))?;
    let digest = format!("{:x}", hasher.finalize());
    tracing::info!("model downloaded ({downloaded} bytes, sha256 {digest})");
    Ok(digest)
}

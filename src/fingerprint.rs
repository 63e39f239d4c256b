//! Content fingerprints for staleness detection.
//!
//! Fingerprints are always strings; the empty string is the one "unknown or
//! absent" fingerprint and never collides with a real digest or revision.
use crate::proc::{run, RunSpec};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

const READ_BUF_BYTES: usize = 64 * 1024;
const GIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Streaming SHA-256 of a file, or `""` when the file is absent or
/// unreadable. Unreadable inputs must not abort a dry run.
pub fn hash_file(path: &Path) -> String {
    let Ok(mut file) = File::open(path) else {
        return String::new();
    };
    let mut hasher = Sha256::new();
    let mut buf = [0u8; READ_BUF_BYTES];
    loop {
        match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buf[..n]),
            Err(_) => return String::new(),
        }
    }
    format!("{:x}", hasher.finalize())
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Current HEAD revision of a checkout, or `""` when the tree is missing or
/// not version-controlled.
pub fn git_revision(tree: &Path) -> String {
    if !tree.is_dir() {
        return String::new();
    }
    let spec = RunSpec::new("git")
        .arg("-C")
        .arg(tree.display().to_string())
        .args(["rev-parse", "HEAD"])
        .timeout(GIT_TIMEOUT);
    match run(&spec) {
        Ok(output) if output.success() => output.stdout.trim().to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn absent_file_hashes_to_empty() {
        let dir = TempDir::new().unwrap();
        assert_eq!(hash_file(&dir.path().join("nope")), "");
    }

    #[test]
    fn hash_is_stable_and_content_sensitive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("requirements.txt");
        fs::write(&path, "sounddevice==0.4.6\n").unwrap();
        let first = hash_file(&path);
        assert_eq!(first, hash_file(&path));

        fs::write(&path, "sounddevice==0.5.0\n").unwrap();
        let changed = hash_file(&path);
        assert_ne!(first, changed);

        // Byte-identical revert restores the original fingerprint.
        fs::write(&path, "sounddevice==0.4.6\n").unwrap();
        assert_eq!(first, hash_file(&path));
    }

    #[test]
    fn hash_bytes_known_answer() {
        assert_eq!(
            hash_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn missing_tree_has_no_revision() {
        let dir = TempDir::new().unwrap();
        assert_eq!(git_revision(&dir.path().join("whisper.cpp")), "");
    }
}

//! System package collaborator (pacman).
//!
//! Install-if-absent semantics: `pacman -T` reports what is missing and
//! `pacman -S --needed` skips anything already present, so the action is
//! idempotent by construction.
use crate::config::SetupConfig;
use crate::fingerprint::hash_bytes;
use crate::proc::{run, run_checked, RunSpec};
use anyhow::Result;

/// Packages the dictation stack needs: build toolchain for whisper.cpp,
/// Vulkan loader for the accelerated variant, python for the daemon, and
/// the Wayland text-injection utilities.
pub const REQUIRED_PACKAGES: &[&str] = &[
    "cmake",
    "git",
    "python",
    "shaderc",
    "vulkan-headers",
    "vulkan-icd-loader",
    "wl-clipboard",
    "wtype",
];

/// Fingerprint of the declared package set. Changing the set re-runs the
/// install; an unchanged set on a converged machine does not.
pub fn fingerprint() -> String {
    let mut names: Vec<&str> = REQUIRED_PACKAGES.to_vec();
    names.sort_unstable();
    hash_bytes(names.join("\n").as_bytes())
}

/// Packages not currently installed, per `pacman -T`.
pub fn missing(config: &SetupConfig) -> Result<Vec<String>> {
    let spec = RunSpec::new("pacman")
        .arg("-T")
        .args(REQUIRED_PACKAGES.iter().copied())
        .timeout(config.timeouts.query);
    let output = run(&spec)?;
    // Exit 127 means the query itself failed; 1 just means deps are missing.
    if output.timed_out || matches!(output.exit_code, None | Some(127)) {
        anyhow::bail!("pacman -T query failed");
    }
    Ok(output
        .stdout
        .split_whitespace()
        .map(str::to_string)
        .collect())
}

/// Install the full set; `--needed` leaves present packages alone.
pub fn install(config: &SetupConfig) -> Result<()> {
    tracing::info!("installing system packages");
    let spec = RunSpec::wrapped(&config.sudo, "pacman")
        .args(["-S", "--needed", "--noconfirm"])
        .args(REQUIRED_PACKAGES.iter().copied())
        .timeout(config.timeouts.package_install);
    run_checked(&spec)?;
    Ok(())
}

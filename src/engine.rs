//! Speech engine build (whisper.cpp).
//!
//! The accelerated (Vulkan) variant is attempted first; any configure,
//! build, or linkage failure discards the partial build directory and falls
//! back to the baseline CPU build. Success requires the binary to exist AND
//! its linkage to resolve, not merely a zero exit from cmake.
use crate::config::SetupConfig;
use crate::proc::{run, run_checked, RunSpec};
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;

const ENGINE_REPO_URL: &str = "https://github.com/ggml-org/whisper.cpp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildVariant {
    Accelerated,
    Baseline,
}

impl BuildVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildVariant::Accelerated => "vulkan",
            BuildVariant::Baseline => "cpu",
        }
    }
}

/// Clone the engine source if it is not on disk yet. Updating an existing
/// checkout is the user's call; the revision fingerprint picks it up.
pub fn ensure_source(config: &SetupConfig) -> Result<()> {
    let src = config.engine_src_dir();
    if src.is_dir() {
        return Ok(());
    }
    if let Some(parent) = src.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    tracing::info!("cloning whisper.cpp into {}", src.display());
    let spec = RunSpec::new("git")
        .args(["clone", "--depth", "1", ENGINE_REPO_URL])
        .arg(src.display().to_string())
        .timeout(config.timeouts.clone);
    run_checked(&spec).context("clone whisper.cpp (check network connectivity)")?;
    Ok(())
}

/// Build the engine, preferring the accelerated variant unless `--cpu-only`.
/// Returns the variant that actually produced a working binary.
pub fn build(config: &SetupConfig) -> Result<BuildVariant> {
    let variants: &[BuildVariant] = if config.cpu_only {
        &[BuildVariant::Baseline]
    } else {
        &[BuildVariant::Accelerated, BuildVariant::Baseline]
    };
    build_with_fallback(variants, |variant| build_variant(config, variant))
}

/// Try variants in order, returning the first that succeeds. Each failure is
/// logged; the last error is surfaced when every variant fails.
pub fn build_with_fallback<F>(variants: &[BuildVariant], mut attempt: F) -> Result<BuildVariant>
where
    F: FnMut(BuildVariant) -> Result<()>,
{
    let mut last_err = anyhow!("no build variant configured");
    for &variant in variants {
        match attempt(variant) {
            Ok(()) => return Ok(variant),
            Err(err) => {
                tracing::warn!("{} build failed: {err:#}", variant.as_str());
                last_err = err;
            }
        }
    }
    Err(last_err.context("engine build failed for every variant"))
}

fn build_variant(config: &SetupConfig, variant: BuildVariant) -> Result<()> {
    let src = config.engine_src_dir();
    let build_dir = config.engine_build_dir();

    // Discard partial output from a previous attempt or variant.
    if build_dir.exists() {
        fs::remove_dir_all(&build_dir)
            .with_context(|| format!("discard {}", build_dir.display()))?;
    }

    tracing::info!("configuring {} engine build", variant.as_str());
    let mut configure = RunSpec::new("cmake")
        .arg("-S")
        .arg(src.display().to_string())
        .arg("-B")
        .arg(build_dir.display().to_string())
        .arg("-DCMAKE_BUILD_TYPE=Release")
        .timeout(config.timeouts.build);
    if variant == BuildVariant::Accelerated {
        configure = configure.arg("-DGGML_VULKAN=1");
    }
    run_checked(&configure).context("configure engine build")?;

    tracing::info!("building {} engine", variant.as_str());
    let compile = RunSpec::new("cmake")
        .args(["--build"])
        .arg(build_dir.display().to_string())
        .args(["--config", "Release", "--parallel"])
        .timeout(config.timeouts.build);
    run_checked(&compile).context("build engine")?;

    let binary = config.engine_binary();
    if !binary.is_file() {
        return Err(anyhow!("build produced no binary at {}", binary.display()));
    }
    linkage_check(config, &binary, variant)
}

/// The produced binary must resolve its shared libraries; the accelerated
/// variant must additionally link the Vulkan loader.
pub fn linkage_check(config: &SetupConfig, binary: &Path, variant: BuildVariant) -> Result<()> {
    let spec = RunSpec::new("ldd")
        .arg(binary.display().to_string())
        .timeout(config.timeouts.query);
    let output = run(&spec).context("run ldd")?;
    if !output.success() {
        return Err(anyhow!("ldd failed for {}", binary.display()));
    }
    if output.stdout.contains("not found") {
        return Err(anyhow!("unresolved linkage in {}", binary.display()));
    }
    if variant == BuildVariant::Accelerated && !output.stdout.contains("libvulkan") {
        return Err(anyhow!(
            "{} is not linked against the Vulkan loader",
            binary.display()
        ));
    }
    Ok(())
}

//! CLI argument parsing for the installer.
//!
//! The CLI is intentionally thin: mode selection and a handful of overrides.
//! All policy lives behind `SetupConfig` so the same convergence loop can be
//! driven identically from tests.
use clap::Parser;
use std::path::PathBuf;

/// Default model artifact downloaded when `--model` is not given.
pub const DEFAULT_MODEL: &str = "ggml-base.en.bin";

/// Root CLI entrypoint.
///
/// The default invocation converges the machine (apply). `--check` renders
/// the plan without mutating anything; `--validate` runs only the
/// post-install checks; `--reset` drops the recorded installation state.
#[derive(Parser, Debug)]
#[command(
    name = "murmur-setup",
    version,
    about = "Install and converge the murmur dictation stack",
    after_help = "Examples:\n  murmur-setup --app-root ~/src/murmur\n  murmur-setup --app-root ~/src/murmur --check\n  murmur-setup --app-root ~/src/murmur --check --json\n  murmur-setup --app-root ~/src/murmur --validate\n  murmur-setup --reset"
)]
pub struct RootArgs {
    /// Murmur checkout containing requirements.txt and share/ templates
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub app_root: PathBuf,

    /// Render the convergence plan and exit without mutating anything
    #[arg(long)]
    pub check: bool,

    /// Run only the post-install validation checks (read-only)
    #[arg(long, conflicts_with = "check")]
    pub validate: bool,

    /// Delete the recorded installation state and exit
    #[arg(long, conflicts_with_all = ["check", "validate"])]
    pub reset: bool,

    /// Model artifact to download
    #[arg(long, value_name = "NAME", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Skip the Vulkan build variant and build the CPU-only engine
    #[arg(long)]
    pub cpu_only: bool,

    /// Privilege escalation command used for package installs
    #[arg(long, value_name = "CMD", default_value = "sudo")]
    pub sudo: String,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,

    /// Emit a verbose transcript of the run
    #[arg(long)]
    pub verbose: bool,
}

//! Input-device access for hardware-level shortcut capture.
//!
//! The daemon reads /dev/input devices directly, which requires membership
//! in the `input` group. The probe queries the user database rather than
//! the current session so a grant is visible before the next login.
use crate::config::SetupConfig;
use crate::proc::{run, run_checked, RunSpec};
use anyhow::{anyhow, Context, Result};

const INPUT_GROUP: &str = "input";

fn current_user(config: &SetupConfig) -> Result<String> {
    if let Ok(user) = std::env::var("USER") {
        if !user.is_empty() {
            return Ok(user);
        }
    }
    let output = run_checked(&RunSpec::new("id").arg("-un").timeout(config.timeouts.query))
        .context("resolve current user")?;
    let user = output.stdout.trim().to_string();
    if user.is_empty() {
        return Err(anyhow!("cannot determine current user"));
    }
    Ok(user)
}

pub fn in_input_group(config: &SetupConfig) -> bool {
    let Ok(user) = current_user(config) else {
        return false;
    };
    let spec = RunSpec::new("id")
        .arg("-nG")
        .arg(user)
        .timeout(config.timeouts.query);
    match run(&spec) {
        Ok(output) if output.success() => output
            .stdout
            .split_whitespace()
            .any(|group| group == INPUT_GROUP),
        _ => false,
    }
}

pub fn grant(config: &SetupConfig) -> Result<()> {
    let user = current_user(config)?;
    tracing::info!("adding {user} to the {INPUT_GROUP} group");
    let spec = RunSpec::wrapped(&config.sudo, "usermod")
        .args(["-aG", INPUT_GROUP])
        .arg(user)
        .timeout(config.timeouts.query);
    run_checked(&spec).context("add user to input group")?;
    tracing::info!("group change takes effect after the next login");
    Ok(())
}

//! Systemd user service enablement.
//!
//! The unit template carries placeholder tokens for the venv interpreter and
//! the app checkout; rendering happens here so the template stays a plain
//! file the service manager never sees unexpanded.
use crate::config::SetupConfig;
use crate::proc::{run, run_checked, RunSpec};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub const SERVICE_NAME: &str = "murmur.service";

pub fn unit_installed(config: &SetupConfig) -> bool {
    config.service_unit_path().is_file()
}

pub fn enabled(config: &SetupConfig) -> bool {
    let spec = RunSpec::new("systemctl")
        .args(["--user", "is-enabled", SERVICE_NAME])
        .timeout(config.timeouts.query);
    matches!(run(&spec), Ok(output) if output.success())
}

/// Render the unit from its template. Tokens: `@VENV_PYTHON@`, `@APP_ROOT@`.
pub fn render_unit(template: &str, venv_python: &Path, app_root: &Path) -> String {
    template
        .replace("@VENV_PYTHON@", &venv_python.display().to_string())
        .replace("@APP_ROOT@", &app_root.display().to_string())
}

pub fn install_and_enable(config: &SetupConfig) -> Result<()> {
    let template_path = config.share_template("murmur.service");
    let template = fs::read_to_string(&template_path)
        .with_context(|| format!("read template {}", template_path.display()))?;
    let rendered = render_unit(&template, &config.venv_python(), &config.app_root);

    let dest = config.service_unit_path();
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(&dest, rendered.as_bytes())
        .with_context(|| format!("write {}", dest.display()))?;

    tracing::info!("enabling {SERVICE_NAME}");
    let reload = RunSpec::new("systemctl")
        .args(["--user", "daemon-reload"])
        .timeout(config.timeouts.query);
    run_checked(&reload).context("systemd daemon-reload")?;

    let enable = RunSpec::new("systemctl")
        .args(["--user", "enable", "--now", SERVICE_NAME])
        .timeout(config.timeouts.query);
    run_checked(&enable).context("enable murmur service")?;
    Ok(())
}

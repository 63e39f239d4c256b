//! Python environment for the murmur daemon.
use crate::config::SetupConfig;
use crate::proc::{run_checked, RunSpec};
use anyhow::{Context, Result};

pub fn venv_present(config: &SetupConfig) -> bool {
    config.venv_python().is_file()
}

/// Create the venv if needed and sync it to requirements.txt.
pub fn sync(config: &SetupConfig) -> Result<()> {
    if !venv_present(config) {
        tracing::info!("creating venv at {}", config.venv_dir().display());
        let venv_dir = config.venv_dir();
        if let Some(data_dir) = venv_dir.parent() {
            std::fs::create_dir_all(data_dir)
                .with_context(|| format!("create {}", data_dir.display()))?;
        }
        let spec = RunSpec::new("python3")
            .args(["-m", "venv"])
            .arg(config.venv_dir().display().to_string())
            .timeout(config.timeouts.venv);
        run_checked(&spec).context("create virtualenv")?;
    }

    tracing::info!("syncing venv to {}", config.requirements_path().display());
    let spec = RunSpec::new(config.venv_pip().display().to_string())
        .args(["install", "--upgrade", "-r"])
        .arg(config.requirements_path().display().to_string())
        .timeout(config.timeouts.venv);
    run_checked(&spec).context("install python requirements")?;
    Ok(())
}

//! Resolved installer configuration.
//!
//! Every path and knob is derived once from the CLI arguments and the
//! environment and carried in a single struct; components never consult
//! globals.
use crate::cli::RootArgs;
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Template files the installer expects under `<app-root>/share/`.
pub const SHARE_TEMPLATES: &[&str] = &[
    "murmur-waybar.jsonc",
    "murmur-hyprland.conf",
    "murmur-toggle.sh",
    "murmur.service",
];

/// Upper bounds on collaborator invocations. A command that outlives its
/// bound is killed and treated as failed.
#[derive(Debug, Clone)]
pub struct Timeouts {
    pub query: Duration,
    pub package_install: Duration,
    pub venv: Duration,
    pub clone: Duration,
    pub build: Duration,
    pub download: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            query: Duration::from_secs(30),
            package_install: Duration::from_secs(900),
            venv: Duration::from_secs(900),
            clone: Duration::from_secs(600),
            build: Duration::from_secs(3600),
            download: Duration::from_secs(1800),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SetupConfig {
    pub app_root: PathBuf,
    pub data_dir: PathBuf,
    pub config_dir: PathBuf,
    pub state_path: PathBuf,
    pub model_name: String,
    pub cpu_only: bool,
    /// Privilege escalation prefix, empty when already running as root.
    pub sudo: Vec<String>,
    pub timeouts: Timeouts,
}

impl SetupConfig {
    pub fn resolve(args: &RootArgs) -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("cannot resolve home directory"))?;
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| home.join(".local/share"))
            .join("murmur");
        let state_path = dirs::state_dir()
            .unwrap_or_else(|| home.join(".local/state"))
            .join("murmur")
            .join("install-state.json");
        let config_dir = dirs::config_dir().unwrap_or_else(|| home.join(".config"));

        let euid = unsafe { libc::geteuid() };
        let sudo = if euid == 0 {
            Vec::new()
        } else {
            shell_words::split(&args.sudo)
                .with_context(|| format!("parse --sudo command {:?}", args.sudo))?
        };

        Ok(SetupConfig {
            app_root: args.app_root.clone(),
            data_dir,
            config_dir,
            state_path,
            model_name: args.model.clone(),
            cpu_only: args.cpu_only,
            sudo,
            timeouts: Timeouts::default(),
        })
    }

    /// Abort before any mutation if the environment cannot host the stack.
    pub fn ensure_preconditions(&self) -> Result<()> {
        if which::which("pacman").is_err() {
            return Err(anyhow!(
                "pacman not found on PATH: murmur-setup supports pacman-based systems only"
            ));
        }
        if !self.requirements_path().is_file() {
            return Err(anyhow!(
                "missing {} (pass --app-root pointing at a murmur checkout)",
                self.requirements_path().display()
            ));
        }
        for name in SHARE_TEMPLATES {
            let path = self.share_dir().join(name);
            if !path.is_file() {
                return Err(anyhow!("missing template {}", path.display()));
            }
        }
        Ok(())
    }

    pub fn share_dir(&self) -> PathBuf {
        self.app_root.join("share")
    }

    pub fn requirements_path(&self) -> PathBuf {
        self.app_root.join("requirements.txt")
    }

    pub fn venv_dir(&self) -> PathBuf {
        self.data_dir.join("venv")
    }

    pub fn venv_python(&self) -> PathBuf {
        self.venv_dir().join("bin/python")
    }

    pub fn venv_pip(&self) -> PathBuf {
        self.venv_dir().join("bin/pip")
    }

    pub fn engine_src_dir(&self) -> PathBuf {
        self.data_dir.join("whisper.cpp")
    }

    pub fn engine_build_dir(&self) -> PathBuf {
        self.engine_src_dir().join("build")
    }

    pub fn engine_binary(&self) -> PathBuf {
        self.engine_build_dir().join("bin/whisper-cli")
    }

    pub fn models_dir(&self) -> PathBuf {
        self.data_dir.join("models")
    }

    pub fn model_path(&self) -> PathBuf {
        self.models_dir().join(&self.model_name)
    }

    pub fn waybar_module_path(&self) -> PathBuf {
        self.config_dir.join("waybar/murmur.jsonc")
    }

    pub fn hypr_include_path(&self) -> PathBuf {
        self.config_dir.join("hypr/murmur.conf")
    }

    pub fn hyprland_conf_path(&self) -> PathBuf {
        self.config_dir.join("hypr/hyprland.conf")
    }

    pub fn toggle_script_path(&self) -> PathBuf {
        self.config_dir.join("murmur/murmur-toggle.sh")
    }

    pub fn service_unit_path(&self) -> PathBuf {
        self.config_dir.join("systemd/user/murmur.service")
    }

    pub fn share_template(&self, name: &str) -> PathBuf {
        self.share_dir().join(name)
    }
}

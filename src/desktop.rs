//! Desktop integration files.
//!
//! Static templates from `<app-root>/share/` are copied into the user's
//! config tree; the only content-aware step is patching a `source` line into
//! hyprland.conf so the keybinding include is loaded.
use crate::config::SetupConfig;
use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Template-to-destination pairs, destinations under the user config dir.
pub fn integration_files(config: &SetupConfig) -> Vec<(PathBuf, PathBuf)> {
    vec![
        (
            config.share_template("murmur-waybar.jsonc"),
            config.waybar_module_path(),
        ),
        (
            config.share_template("murmur-hyprland.conf"),
            config.hypr_include_path(),
        ),
        (
            config.share_template("murmur-toggle.sh"),
            config.toggle_script_path(),
        ),
    ]
}

pub fn installed(config: &SetupConfig) -> bool {
    integration_files(config)
        .iter()
        .all(|(_, dest)| dest.is_file())
        && hypr_sourced(config)
}

pub fn install(config: &SetupConfig) -> Result<()> {
    for (src, dest) in integration_files(config) {
        copy_atomic(&src, &dest)?;
    }
    make_executable(&config.toggle_script_path())?;
    ensure_hypr_source_line(config)?;
    Ok(())
}

fn hypr_sourced(config: &SetupConfig) -> bool {
    let Ok(content) = fs::read_to_string(config.hyprland_conf_path()) else {
        return false;
    };
    source_line_regex().is_match(&content)
}

fn source_line_regex() -> Regex {
    // Unwrap is fine for a fixed pattern.
    Regex::new(r"(?m)^\s*source\s*=\s*\S*murmur\.conf\s*$").unwrap()
}

fn ensure_hypr_source_line(config: &SetupConfig) -> Result<()> {
    let conf = config.hyprland_conf_path();
    let mut content = fs::read_to_string(&conf).unwrap_or_default();
    if source_line_regex().is_match(&content) {
        return Ok(());
    }
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(&format!(
        "source = {}\n",
        config.hypr_include_path().display()
    ));
    if let Some(parent) = conf.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    tracing::info!("patching {} to source the murmur include", conf.display());
    write_atomic(&conf, content.as_bytes())
}

fn copy_atomic(src: &Path, dest: &Path) -> Result<()> {
    let bytes = fs::read(src).with_context(|| format!("read template {}", src.display()))?;
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    write_atomic(dest, &bytes)
}

fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = dest
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("staged");
    let tmp_path = dest
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!(".{file_name}.tmp"));
    fs::write(&tmp_path, bytes).with_context(|| format!("write {}", tmp_path.display()))?;
    fs::rename(&tmp_path, dest).with_context(|| format!("publish {}", dest.display()))?;
    Ok(())
}

fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let meta = fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
    let mut perms = meta.permissions();
    perms.set_mode(perms.mode() | 0o755);
    fs::set_permissions(path, perms).with_context(|| format!("chmod {}", path.display()))?;
    Ok(())
}

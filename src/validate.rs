//! Post-install validation.
//!
//! Checks are deliberately independent of the evaluator's fingerprints: they
//! ask whether the system behaves installed, not whether the bookkeeping
//! says so. Failures report remediation hints; remediation itself is always
//! a re-run of apply.
use crate::config::SetupConfig;
use crate::model::{artifact_validity, ArtifactValidity};
use crate::proc::{run, RunSpec};
use crate::state::StateStore;
use crate::units::UnitId;
use crate::{access, desktop, engine, packages, service};
use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ValidationResult {
    pub unit: &'static str,
    pub passed: bool,
    pub detail: String,
}

pub fn run_validation(config: &SetupConfig, state: &StateStore) -> Vec<ValidationResult> {
    UnitId::ALL
        .iter()
        .map(|&id| {
            let (passed, detail) = check_unit(config, state, id);
            ValidationResult {
                unit: id.as_str(),
                passed,
                detail,
            }
        })
        .collect()
}

fn check_unit(config: &SetupConfig, state: &StateStore, id: UnitId) -> (bool, String) {
    match id {
        UnitId::SystemPackages => match packages::missing(config) {
            Ok(missing) if missing.is_empty() => (true, "all packages installed".to_string()),
            Ok(missing) => (false, format!("packages missing: {}", missing.join(" "))),
            Err(err) => (false, format!("package query failed: {err:#}")),
        },
        UnitId::PythonEnv => {
            let python = config.venv_python();
            if !python.is_file() {
                return (false, format!("no interpreter at {}", python.display()));
            }
            let spec = RunSpec::new(python.display().to_string())
                .arg("--version")
                .timeout(config.timeouts.query);
            match run(&spec) {
                Ok(output) if output.success() => (true, "venv interpreter responds".to_string()),
                _ => (false, "venv interpreter does not respond".to_string()),
            }
        }
        UnitId::SpeechEngine => {
            let binary = config.engine_binary();
            if !binary.is_file() {
                return (false, format!("no engine binary at {}", binary.display()));
            }
            let variant = match state.get("engine_variant") {
                "vulkan" => engine::BuildVariant::Accelerated,
                _ => engine::BuildVariant::Baseline,
            };
            match engine::linkage_check(config, &binary, variant) {
                Ok(()) => (true, "engine binary links cleanly".to_string()),
                Err(err) => (false, format!("{err:#}")),
            }
        }
        UnitId::Model => match artifact_validity(&config.model_path(), state.get("model_digest")) {
            ArtifactValidity::Valid => (true, "model artifact valid".to_string()),
            ArtifactValidity::Missing => (
                false,
                format!("no model at {}", config.model_path().display()),
            ),
            ArtifactValidity::Invalid(reason) => (false, reason),
        },
        UnitId::InputAccess => {
            if access::in_input_group(config) {
                (true, "input group member".to_string())
            } else {
                (
                    false,
                    "not in the input group (re-run apply, then log out and in)".to_string(),
                )
            }
        }
        UnitId::DesktopIntegration => {
            let missing: Vec<String> = desktop::integration_files(config)
                .iter()
                .filter(|(_, dest)| !dest.is_file())
                .map(|(_, dest)| dest.display().to_string())
                .collect();
            if !missing.is_empty() {
                return (false, format!("missing files: {}", missing.join(" ")));
            }
            if !desktop::installed(config) {
                return (false, "hyprland.conf does not source the murmur include".to_string());
            }
            (true, "integration files present".to_string())
        }
        UnitId::ServiceEnablement => {
            if !service::unit_installed(config) {
                return (
                    false,
                    format!("no unit file at {}", config.service_unit_path().display()),
                );
            }
            if !service::enabled(config) {
                return (false, format!("{} is not enabled", service::SERVICE_NAME));
            }
            (true, "service enabled".to_string())
        }
    }
}

pub fn render(results: &[ValidationResult], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }
    for result in results {
        println!(
            "{:<20} {:<5} {}",
            result.unit,
            if result.passed { "pass" } else { "FAIL" },
            result.detail
        );
    }
    Ok(())
}

pub fn failed_count(results: &[ValidationResult]) -> usize {
    results.iter().filter(|result| !result.passed).count()
}

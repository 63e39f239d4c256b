//! Read-only evaluation of every unit against the desired end-state.
//!
//! Probes inspect the filesystem and run query-only collaborator commands;
//! nothing here mutates. Probe faults degrade to "unknown" observations so a
//! dry run can always produce a report.
use crate::config::SetupConfig;
use crate::model::{artifact_validity, ArtifactValidity};
use crate::state::StateStore;
use crate::units::{classify, UnitClass, UnitId, UnitStatus};
use crate::{access, desktop, fingerprint, packages, pyenv, service};

pub fn evaluate_all(config: &SetupConfig, state: &StateStore) -> Vec<UnitStatus> {
    UnitId::ALL
        .iter()
        .map(|&id| evaluate_unit(config, state, id))
        .collect()
}

fn evaluate_unit(config: &SetupConfig, state: &StateStore, id: UnitId) -> UnitStatus {
    match id {
        UnitId::SystemPackages => eval_packages(config, state),
        UnitId::PythonEnv => eval_python_env(config, state),
        UnitId::SpeechEngine => eval_engine(config, state),
        UnitId::Model => eval_model(config, state),
        UnitId::InputAccess => eval_input_access(config),
        UnitId::DesktopIntegration => eval_desktop(config),
        UnitId::ServiceEnablement => eval_service(config),
    }
}

fn status(id: UnitId, class: UnitClass, reason: impl Into<String>) -> UnitStatus {
    UnitStatus {
        id,
        class,
        reason: reason.into(),
    }
}

fn eval_packages(config: &SetupConfig, state: &StateStore) -> UnitStatus {
    let id = UnitId::SystemPackages;
    let missing = match packages::missing(config) {
        Ok(missing) => missing,
        Err(err) => {
            tracing::debug!("package query failed: {err:#}");
            return status(id, UnitClass::NeedsInstall, "package query failed");
        }
    };
    let current = packages::fingerprint();
    let stored = state.get("packages_hash");
    let class = classify(missing.is_empty(), Some((&current, stored)));
    let reason = match class {
        UnitClass::NeedsInstall => format!("packages missing: {}", missing.join(" ")),
        UnitClass::NeedsUpdate => "package set changed".to_string(),
        UnitClass::UpToDate => "package set unchanged".to_string(),
    };
    status(id, class, reason)
}

fn eval_python_env(config: &SetupConfig, state: &StateStore) -> UnitStatus {
    let id = UnitId::PythonEnv;
    let current = fingerprint::hash_file(&config.requirements_path());
    let stored = state.get("requirements_hash");
    let class = classify(pyenv::venv_present(config), Some((&current, stored)));
    let reason = match class {
        UnitClass::NeedsInstall => "venv not created",
        UnitClass::NeedsUpdate => "requirements changed",
        UnitClass::UpToDate => "requirements unchanged",
    };
    status(id, class, reason)
}

fn eval_engine(config: &SetupConfig, state: &StateStore) -> UnitStatus {
    let id = UnitId::SpeechEngine;
    let current = fingerprint::git_revision(&config.engine_src_dir());
    let stored = state.get("engine_revision");
    let exists = config.engine_binary().is_file();
    let class = classify(exists, Some((&current, stored)));
    let reason = match class {
        UnitClass::NeedsInstall if !config.engine_src_dir().is_dir() => "not cloned",
        UnitClass::NeedsInstall => "not built",
        UnitClass::NeedsUpdate => "source revision changed",
        UnitClass::UpToDate => "revision unchanged",
    };
    status(id, class, reason)
}

fn eval_model(config: &SetupConfig, state: &StateStore) -> UnitStatus {
    let id = UnitId::Model;
    match artifact_validity(&config.model_path(), state.get("model_digest")) {
        ArtifactValidity::Missing => status(id, UnitClass::NeedsInstall, "not downloaded"),
        ArtifactValidity::Invalid(reason) => {
            status(id, UnitClass::NeedsUpdate, format!("missing or corrupted ({reason})"))
        }
        ArtifactValidity::Valid if state.get("model_digest").is_empty() => {
            status(id, UnitClass::UpToDate, "size plausible")
        }
        ArtifactValidity::Valid => status(id, UnitClass::UpToDate, "digest verified"),
    }
}

fn eval_input_access(config: &SetupConfig) -> UnitStatus {
    let id = UnitId::InputAccess;
    let class = classify(access::in_input_group(config), None);
    let reason = match class {
        UnitClass::UpToDate => "input group member",
        _ => "not in input group",
    };
    status(id, class, reason)
}

fn eval_desktop(config: &SetupConfig) -> UnitStatus {
    let id = UnitId::DesktopIntegration;
    let class = classify(desktop::installed(config), None);
    let reason = match class {
        UnitClass::UpToDate => "integration files present",
        _ => "integration files missing",
    };
    status(id, class, reason)
}

fn eval_service(config: &SetupConfig) -> UnitStatus {
    let id = UnitId::ServiceEnablement;
    let installed = service::unit_installed(config);
    let class = classify(installed && service::enabled(config), None);
    let reason = match class {
        UnitClass::UpToDate => "service enabled",
        _ if !installed => "unit not installed",
        _ => "service not enabled",
    };
    status(id, class, reason)
}

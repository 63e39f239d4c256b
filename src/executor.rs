//! Mutating apply loop.
//!
//! Units run in dependency order. A unit's fingerprint is committed to the
//! state store only after its action succeeds; a fatal failure aborts the
//! run, a soft failure degrades it and execution continues.
use crate::config::SetupConfig;
use crate::state::StateStore;
use crate::units::{Severity, UnitId, UnitStatus};
use crate::{access, desktop, engine, fingerprint, model, packages, pyenv, service};
use anyhow::{Context, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    AlreadyCurrent,
    Converged,
    SoftFailed(String),
}

#[derive(Debug, Clone)]
pub struct UnitOutcome {
    pub id: UnitId,
    pub outcome: Outcome,
}

#[derive(Debug, Default)]
pub struct ApplyReport {
    pub outcomes: Vec<UnitOutcome>,
}

impl ApplyReport {
    pub fn degraded(&self) -> bool {
        self.outcomes
            .iter()
            .any(|unit| matches!(unit.outcome, Outcome::SoftFailed(_)))
    }

    pub fn converged_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|unit| unit.outcome == Outcome::Converged)
            .count()
    }
}

pub fn run_apply(
    config: &SetupConfig,
    state: &mut StateStore,
    statuses: &[UnitStatus],
) -> Result<ApplyReport> {
    let mut report = ApplyReport::default();
    for status in statuses {
        if !status.class.pending() {
            tracing::debug!("{} up-to-date, skipping", status.id);
            report.outcomes.push(UnitOutcome {
                id: status.id,
                outcome: Outcome::AlreadyCurrent,
            });
            continue;
        }

        tracing::info!("{}: {} ({})", status.id, status.class, status.reason);
        match converge_unit(config, state, status.id) {
            Ok(()) => report.outcomes.push(UnitOutcome {
                id: status.id,
                outcome: Outcome::Converged,
            }),
            Err(err) => match status.id.severity() {
                Severity::Fatal => {
                    return Err(err.context(format!("unit {} failed", status.id)));
                }
                Severity::Soft => {
                    tracing::warn!("unit {} failed, continuing degraded: {err:#}", status.id);
                    report.outcomes.push(UnitOutcome {
                        id: status.id,
                        outcome: Outcome::SoftFailed(format!("{err:#}")),
                    });
                }
            },
        }
    }
    Ok(report)
}

/// Run one unit's action and, on success, record its fresh fingerprint.
/// Fingerprints are recomputed after the action so the store reflects what
/// was actually converged, not what was predicted.
fn converge_unit(config: &SetupConfig, state: &mut StateStore, id: UnitId) -> Result<()> {
    match id {
        UnitId::SystemPackages => {
            packages::install(config)?;
            state.set("packages_hash", &packages::fingerprint());
        }
        UnitId::PythonEnv => {
            pyenv::sync(config)?;
            let digest = fingerprint::hash_file(&config.requirements_path());
            state.set("requirements_hash", &digest);
        }
        UnitId::SpeechEngine => {
            engine::ensure_source(config)?;
            let variant = engine::build(config)?;
            let revision = fingerprint::git_revision(&config.engine_src_dir());
            state.set("engine_revision", &revision);
            state.set("engine_variant", variant.as_str());
        }
        UnitId::Model => {
            let digest = model::download(config).context("download model")?;
            state.set("model_digest", &digest);
        }
        UnitId::InputAccess => access::grant(config)?,
        UnitId::DesktopIntegration => desktop::install(config)?,
        UnitId::ServiceEnablement => service::install_and_enable(config)?,
    }
    Ok(())
}

//! Installable units and their classification.
use serde::{Deserialize, Serialize};
use std::fmt;

/// One trackable installable thing, listed in dependency order: packages
/// before the build that needs them, the build before the artifacts and
/// integrations that need its binary.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum UnitId {
    SystemPackages,
    PythonEnv,
    SpeechEngine,
    Model,
    InputAccess,
    DesktopIntegration,
    ServiceEnablement,
}

impl UnitId {
    pub const ALL: [UnitId; 7] = [
        UnitId::SystemPackages,
        UnitId::PythonEnv,
        UnitId::SpeechEngine,
        UnitId::Model,
        UnitId::InputAccess,
        UnitId::DesktopIntegration,
        UnitId::ServiceEnablement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitId::SystemPackages => "system-packages",
            UnitId::PythonEnv => "python-env",
            UnitId::SpeechEngine => "speech-engine",
            UnitId::Model => "model",
            UnitId::InputAccess => "input-access",
            UnitId::DesktopIntegration => "desktop-integration",
            UnitId::ServiceEnablement => "service-enablement",
        }
    }

    /// State-store key holding the unit's last-known-good fingerprint.
    /// Existence-checked units carry no fingerprint.
    pub fn state_key(&self) -> Option<&'static str> {
        match self {
            UnitId::SystemPackages => Some("packages_hash"),
            UnitId::PythonEnv => Some("requirements_hash"),
            UnitId::SpeechEngine => Some("engine_revision"),
            UnitId::Model => Some("model_digest"),
            UnitId::InputAccess | UnitId::DesktopIntegration | UnitId::ServiceEnablement => None,
        }
    }

    /// Whether a failed action aborts the run or degrades it.
    pub fn severity(&self) -> Severity {
        match self {
            UnitId::SystemPackages | UnitId::PythonEnv | UnitId::SpeechEngine | UnitId::Model => {
                Severity::Fatal
            }
            UnitId::InputAccess | UnitId::DesktopIntegration | UnitId::ServiceEnablement => {
                Severity::Soft
            }
        }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum UnitClass {
    UpToDate,
    NeedsUpdate,
    NeedsInstall,
}

impl UnitClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitClass::UpToDate => "up-to-date",
            UnitClass::NeedsUpdate => "needs-update",
            UnitClass::NeedsInstall => "needs-install",
        }
    }

    pub fn pending(&self) -> bool {
        !matches!(self, UnitClass::UpToDate)
    }
}

impl fmt::Display for UnitClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Fatal,
    Soft,
}

/// Pure classification from observed facts. Missing artifacts win over
/// fingerprint drift so the report distinguishes first installs from
/// updates; both trigger the same action.
pub fn classify(exists: bool, fingerprint: Option<(&str, &str)>) -> UnitClass {
    if !exists {
        return UnitClass::NeedsInstall;
    }
    match fingerprint {
        Some((current, stored)) if stored.is_empty() || stored != current => UnitClass::NeedsUpdate,
        _ => UnitClass::UpToDate,
    }
}

/// One row of the evaluated plan.
#[derive(Debug, Clone)]
pub struct UnitStatus {
    pub id: UnitId,
    pub class: UnitClass,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_artifact_classifies_needs_install() {
        assert_eq!(classify(false, None), UnitClass::NeedsInstall);
        // Existence wins over fingerprint agreement for reporting.
        assert_eq!(classify(false, Some(("abc", "abc"))), UnitClass::NeedsInstall);
    }

    #[test]
    fn empty_stored_fingerprint_classifies_needs_update() {
        assert_eq!(classify(true, Some(("abc123", ""))), UnitClass::NeedsUpdate);
    }

    #[test]
    fn fingerprint_drift_classifies_needs_update() {
        assert_eq!(
            classify(true, Some(("abc123", "def456"))),
            UnitClass::NeedsUpdate
        );
    }

    #[test]
    fn matching_fingerprint_is_up_to_date() {
        assert_eq!(classify(true, Some(("abc123", "abc123"))), UnitClass::UpToDate);
    }

    #[test]
    fn existence_only_units_are_up_to_date_when_present() {
        assert_eq!(classify(true, None), UnitClass::UpToDate);
    }

    #[test]
    fn classification_is_stable_without_intervening_writes() {
        for _ in 0..3 {
            assert_eq!(classify(true, Some(("a", "a"))), UnitClass::UpToDate);
            assert_eq!(classify(true, Some(("a", "b"))), UnitClass::NeedsUpdate);
        }
    }
}

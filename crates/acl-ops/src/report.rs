//! Operation reports.
//!
//! Grant and Revoke report per target, since one certificate path can fan
//! out to several backing files and one of them may fail while the others
//! succeed.

use acl_core::{Diagnostic, EntrySummary, SecurableObjectKind};
use serde::{Deserialize, Serialize};

/// What happened to one target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TargetStatus {
    /// Already in the desired state; nothing written.
    Unchanged,
    /// Changes written.
    Changed,
    /// Changes planned but not written (dry run).
    WouldChange,
    /// Processing failed; other targets are unaffected.
    Failed {
        /// Stable error code.
        code: String,
        /// Error message.
        message: String,
    },
}

/// Outcome of a Grant or Revoke on one target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetReport {
    /// Object path.
    pub path: String,
    /// Description shared by targets derived from the same certificate.
    pub description: String,
    /// Object kind.
    pub kind: SecurableObjectKind,
    /// What happened.
    #[serde(flatten)]
    pub status: TargetStatus,
    /// The planned changes, one line each.
    pub changes: Vec<String>,
    /// Conditions noticed for this target.
    pub diagnostics: Vec<Diagnostic>,
}

impl TargetReport {
    /// Check if the target ended up (or would end up) modified.
    pub fn is_changed(&self) -> bool {
        matches!(self.status, TargetStatus::Changed | TargetStatus::WouldChange)
    }

    /// Check if processing the target failed.
    pub fn is_failed(&self) -> bool {
        matches!(self.status, TargetStatus::Failed { .. })
    }
}

/// Outcome of a Grant or Revoke on one caller path.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeReport {
    /// The caller's path.
    pub path: String,
    /// Per-target outcomes, in processing order.
    pub targets: Vec<TargetReport>,
    /// Certificates that were skipped.
    pub diagnostics: Vec<Diagnostic>,
}

impl ChangeReport {
    /// Check if every target succeeded.
    pub fn is_success(&self) -> bool {
        !self.targets.iter().any(TargetReport::is_failed)
    }

    /// Check if any target was (or would be) modified.
    pub fn is_changed(&self) -> bool {
        self.targets.iter().any(TargetReport::is_changed)
    }

    /// Targets that failed.
    pub fn failures(&self) -> Vec<&TargetReport> {
        self.targets.iter().filter(|t| t.is_failed()).collect()
    }

    /// Render as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Entries on one target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetEntries {
    /// Object path.
    pub path: String,
    /// Target description.
    pub description: String,
    /// Object kind.
    pub kind: SecurableObjectKind,
    /// Entry summaries, in platform order.
    pub entries: Vec<EntrySummary>,
}

/// Outcome of a Get on one caller path.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GetReport {
    /// The caller's path.
    pub path: String,
    /// Entries per target.
    pub targets: Vec<TargetEntries>,
    /// Certificates that were skipped.
    pub diagnostics: Vec<Diagnostic>,
}

impl GetReport {
    /// All entry summaries across targets.
    pub fn entries(&self) -> impl Iterator<Item = &EntrySummary> {
        self.targets.iter().flat_map(|t| t.entries.iter())
    }
}

/// Outcome of a Test on one caller path.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestReport {
    /// True when every target grants the rights. False with no targets.
    pub granted: bool,
    /// Per-target results.
    pub targets: Vec<(String, bool)>,
    /// Warnings, including ignored flag checks on leaf objects.
    pub diagnostics: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(status: TargetStatus) -> TargetReport {
        TargetReport {
            path: "C:\\Keys\\a".to_string(),
            description: "CN=a (AAA)".to_string(),
            kind: SecurableObjectKind::FileSystem,
            status,
            changes: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn test_change_report_flags() {
        let report = ChangeReport {
            path: "cert:\\LocalMachine\\My\\AAA".to_string(),
            targets: vec![
                target(TargetStatus::Changed),
                target(TargetStatus::Failed {
                    code: "PLATFORM_WRITE_FAILURE".to_string(),
                    message: "Access is denied".to_string(),
                }),
            ],
            diagnostics: Vec::new(),
        };
        assert!(report.is_changed());
        assert!(!report.is_success());
        assert_eq!(report.failures().len(), 1);
    }

    #[test]
    fn test_json_rendering() {
        let report = ChangeReport {
            path: "C:\\X".to_string(),
            targets: vec![target(TargetStatus::WouldChange)],
            diagnostics: Vec::new(),
        };
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["targets"][0]["status"], "would_change");
        assert_eq!(json["targets"][0]["kind"], "FileSystem");
    }
}

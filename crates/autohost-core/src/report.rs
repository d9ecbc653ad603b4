//! Structured readiness and provisioning reports.
//!
//! Shared by `autohost doctor` (prerequisite checks) and `autohost setup` (one entry per
//! provisioning step) so both render the same way in human and JSON output.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pass,
    Fail,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub id: String,
    pub severity: Severity,
    pub status: Status,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remediation: Vec<String>,
}

impl Check {
    pub fn pass(id: impl Into<String>, severity: Severity, summary: impl Into<String>) -> Self {
        Self::new(id, severity, Status::Pass, summary)
    }

    pub fn fail(id: impl Into<String>, severity: Severity, summary: impl Into<String>) -> Self {
        Self::new(id, severity, Status::Fail, summary)
    }

    pub fn skip(id: impl Into<String>, severity: Severity, summary: impl Into<String>) -> Self {
        Self::new(id, severity, Status::Skip, summary)
    }

    fn new(
        id: impl Into<String>,
        severity: Severity,
        status: Status,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            status,
            summary: summary.into(),
            details: None,
            remediation: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    #[must_use]
    pub fn with_remediation(mut self, command: impl Into<String>) -> Self {
        self.remediation.push(command.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub checks: Vec<Check>,
}

impl Report {
    pub fn push(&mut self, check: Check) {
        self.checks.push(check);
    }

    #[must_use]
    pub fn has_critical_failures(&self) -> bool {
        self.checks
            .iter()
            .any(|c| c.status == Status::Fail && c.severity == Severity::Critical)
    }

    #[must_use]
    pub fn first_failure(&self) -> Option<&Check> {
        self.checks.iter().find(|c| c.status == Status::Fail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn severity() -> impl Strategy<Value = Severity> {
        prop_oneof![
            Just(Severity::Critical),
            Just(Severity::Warning),
            Just(Severity::Info),
        ]
    }

    fn status() -> impl Strategy<Value = Status> {
        prop_oneof![Just(Status::Pass), Just(Status::Fail), Just(Status::Skip)]
    }

    proptest! {
        #[test]
        fn critical_failure_detection_matches_checks(
            entries in proptest::collection::vec((severity(), status()), 0..12)
        ) {
            let mut report = Report::default();
            for (i, (severity, status)) in entries.iter().enumerate() {
                report.push(Check::new(format!("check.{i}"), *severity, *status, "summary"));
            }
            let expected = entries
                .iter()
                .any(|(sev, st)| *sev == Severity::Critical && *st == Status::Fail);
            prop_assert_eq!(report.has_critical_failures(), expected);
        }
    }

    #[test]
    fn serializes_snake_case_and_omits_empty_fields() {
        let check = Check::fail("docker.cli", Severity::Critical, "docker is not installed")
            .with_remediation("autohost docker install");
        let yaml = serde_yaml::to_string(&check).unwrap();
        assert!(yaml.contains("severity: critical"));
        assert!(yaml.contains("status: fail"));
        assert!(!yaml.contains("details"));
    }
}

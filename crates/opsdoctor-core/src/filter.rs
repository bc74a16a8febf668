//! Post-processing applied to findings before they reach a reporter.

use serde::{Deserialize, Serialize};

use crate::{engine::ModuleReport, finding::Finding, severity::Severity};

/// Lowest level kept when quiet mode is enabled.
pub const QUIET_THRESHOLD: Severity = Severity::High;

/// Drop findings whose `check_name` exactly matches an ignored name.
pub fn by_ignore(findings: &[Finding], ignore: &[String]) -> Vec<Finding> {
    findings
        .iter()
        .filter(|finding| !ignore.iter().any(|name| *name == finding.check_name))
        .cloned()
        .collect()
}

/// When `quiet` is set, keep only findings at or above [`QUIET_THRESHOLD`].
pub fn by_quiet(findings: &[Finding], quiet: bool) -> Vec<Finding> {
    if !quiet {
        return findings.to_vec();
    }
    findings
        .iter()
        .filter(|finding| finding.severity.is_some_and(|level| level >= QUIET_THRESHOLD))
        .cloned()
        .collect()
}

/// Filter parameters sourced from configuration and command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    #[serde(default)]
    pub ignore: Vec<String>,
    #[serde(default)]
    pub quiet: bool,
}

impl FilterOptions {
    pub fn apply(&self, findings: &[Finding]) -> Vec<Finding> {
        by_quiet(&by_ignore(findings, &self.ignore), self.quiet)
    }

    /// Filter the findings of every report; errors are carried over untouched.
    pub fn apply_reports(&self, reports: &[ModuleReport]) -> Vec<ModuleReport> {
        reports
            .iter()
            .map(|report| ModuleReport {
                module: report.module.clone(),
                findings: self.apply(&report.findings),
                error: report.error.clone(),
            })
            .collect()
    }
}

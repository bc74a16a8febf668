use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    engine::ModuleReport,
    severity::{self, Severity},
};

/// Aggregate counts derived from one run's module reports.
///
/// `score` is additive (four LOW findings outweigh one CRITICAL); the
/// worst-case gate is [`exit_code`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_findings: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub score: u32,
    pub modules_failed: usize,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub module_errors: BTreeMap<String, String>,
}

impl Summary {
    /// Count for a single level.
    pub fn count(&self, level: Severity) -> usize {
        match level {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    fn record(&mut self, level: Option<Severity>) {
        self.total_findings += 1;
        let Some(level) = level else {
            return;
        };
        match level {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
        self.score += level.weight();
    }
}

/// Reduce reports into a [`Summary`].
///
/// A report carrying an error counts as a failed module and its findings are
/// discarded. Findings with an unrecognized severity still count toward
/// `total_findings` but toward no bucket and add nothing to `score`.
pub fn compute_summary(reports: &[ModuleReport]) -> Summary {
    let mut summary = Summary::default();

    for report in reports {
        if report.is_failed() {
            summary.modules_failed += 1;
            summary
                .module_errors
                .insert(report.module.clone(), report.error.clone());
            continue;
        }

        for finding in &report.findings {
            summary.record(finding.severity);
        }
    }

    summary
}

/// Highest severity across every finding of every report.
pub fn highest_severity(reports: &[ModuleReport]) -> Option<Severity> {
    severity::highest(
        reports
            .iter()
            .flat_map(|report| report.findings.iter().map(|finding| finding.severity)),
    )
}

/// Process exit code for a run: 0 when nothing was found, otherwise the exit
/// code of the highest severity observed.
pub fn exit_code(reports: &[ModuleReport]) -> i32 {
    severity::exit_code_of(highest_severity(reports))
}

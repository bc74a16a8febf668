use serde::{Deserialize, Serialize};

use crate::severity::{self, Severity};

/// A single reported violation produced by a check.
///
/// `check_name` identifies the rule, not the instance; `resource_id` points at
/// the offending artifact (a file and line, a branch, a bucket).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub check_name: String,
    /// `None` when the producer emitted a value outside the four canonical levels.
    #[serde(with = "severity::lenient", default)]
    pub severity: Option<Severity>,
    pub resource_id: String,
    pub message: String,
    #[serde(default)]
    pub recommendation: String,
}

impl Finding {
    pub fn new(
        check_name: impl Into<String>,
        severity: Severity,
        resource_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            check_name: check_name.into(),
            severity: Some(severity),
            resource_id: resource_id.into(),
            message: message.into(),
            recommendation: String::new(),
        }
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = recommendation.into();
        self
    }

    /// Scoring weight of this finding (0 for unrecognized severities).
    pub fn weight(&self) -> u32 {
        severity::weight_of(self.severity)
    }

    /// Severity as displayed by reporters.
    pub fn severity_label(&self) -> &'static str {
        self.severity.map_or("UNKNOWN", Severity::as_str)
    }
}

/// Findings of one module, as handed to a [`crate::Reporter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub module: String,
    #[serde(rename = "results")]
    pub findings: Vec<Finding>,
}

impl Report {
    pub fn new(module: impl Into<String>, findings: Vec<Finding>) -> Self {
        Self {
            module: module.into(),
            findings,
        }
    }
}

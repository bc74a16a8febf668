use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, instrument, warn, Instrument};

use crate::{
    failure::{FailedUnit, FailureScope, PartialFailure},
    finding::{Finding, Report},
    module::RunContext,
    registry::Registry,
};

/// Outcome of one module within one engine run.
///
/// An empty `error` means the module succeeded; a failed module carries no
/// findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleReport {
    pub module: String,
    #[serde(rename = "results", default)]
    pub findings: Vec<Finding>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl ModuleReport {
    pub fn succeeded(module: impl Into<String>, findings: Vec<Finding>) -> Self {
        Self {
            module: module.into(),
            findings,
            error: String::new(),
        }
    }

    pub fn failed(module: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            findings: Vec::new(),
            error: error.into(),
        }
    }

    pub fn is_failed(&self) -> bool {
        !self.error.is_empty()
    }

    /// View of this report as handed to a [`crate::Reporter`].
    pub fn to_report(&self) -> Report {
        Report::new(self.module.clone(), self.findings.clone())
    }
}

/// Reports from one [`Engine::run_all`], plus the advisory aggregate error
/// when any module failed.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub reports: Vec<ModuleReport>,
    pub failure: Option<PartialFailure>,
}

impl RunOutcome {
    pub fn is_clean(&self) -> bool {
        self.failure.is_none()
    }

    pub fn into_parts(self) -> (Vec<ModuleReport>, Option<PartialFailure>) {
        (self.reports, self.failure)
    }
}

/// Runs every registered module in registry order, isolating failures.
#[derive(Debug, Default)]
pub struct Engine {
    registry: Registry,
}

impl Engine {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Execute all modules sequentially.
    ///
    /// A failing module is recorded on its own report and never stops the
    /// remaining modules. Reports keep the registry's enumeration order.
    #[instrument(name = "engine_run", skip(self, ctx), fields(modules = self.registry.len()))]
    pub async fn run_all(&self, ctx: &RunContext) -> RunOutcome {
        let mut reports = Vec::with_capacity(self.registry.len());

        for name in self.registry.list() {
            let Some(module) = self.registry.get(&name) else {
                continue;
            };

            let result = module
                .run(ctx)
                .instrument(info_span!("module", module = %name))
                .await;

            let report = match result {
                Ok(findings) => {
                    debug!(module = %name, findings = findings.len(), "module completed");
                    ModuleReport::succeeded(name, findings)
                }
                Err(err) => {
                    warn!(module = %name, error = %err, "module failed");
                    ModuleReport::failed(name, err.to_string())
                }
            };
            reports.push(report);
        }

        let failures = reports
            .iter()
            .filter(|report| report.is_failed())
            .map(|report| FailedUnit {
                name: report.module.clone(),
                message: report.error.clone(),
            })
            .collect();

        RunOutcome {
            failure: PartialFailure::from_failures(FailureScope::Modules, failures),
            reports,
        }
    }
}

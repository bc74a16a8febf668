use tracing::{trace, warn};

use crate::{
    failure::{FailedUnit, FailureScope, PartialFailure},
    finding::Finding,
    module::{ModuleError, RunContext},
};

/// Signature of a single check run against a shared subject.
pub type CheckFn<S> = fn(&S) -> Result<Vec<Finding>, ModuleError>;

/// A named check inside a [`CheckSuite`].
pub struct Check<S> {
    pub name: &'static str,
    pub run: CheckFn<S>,
}

/// Findings collected by a suite, plus the failures of individual checks.
#[derive(Debug, Default)]
pub struct SuiteOutcome {
    pub findings: Vec<Finding>,
    pub failure: Option<PartialFailure>,
}

impl SuiteOutcome {
    /// All-or-nothing view used when a suite backs an engine module.
    pub fn into_result(self) -> Result<Vec<Finding>, ModuleError> {
        match self.failure {
            Some(failure) => Err(ModuleError::Other(failure.into())),
            None => Ok(self.findings),
        }
    }
}

/// Ordered list of checks over one subject (a parsed Dockerfile, a set of
/// Terraform sources). A failing check is recorded and the rest still run.
pub struct CheckSuite<S> {
    checks: Vec<Check<S>>,
}

impl<S> Default for CheckSuite<S> {
    fn default() -> Self {
        Self { checks: Vec::new() }
    }
}

impl<S> CheckSuite<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_check(mut self, name: &'static str, run: CheckFn<S>) -> Self {
        self.checks.push(Check { name, run });
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.checks.iter().map(|check| check.name)
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn run(&self, subject: &S, ctx: &RunContext) -> SuiteOutcome {
        let mut findings = Vec::new();
        let mut failures = Vec::new();

        for check in &self.checks {
            let result = ctx.check().and_then(|()| (check.run)(subject));
            match result {
                Ok(found) => {
                    trace!(check = check.name, findings = found.len(), "check completed");
                    findings.extend(found);
                }
                Err(err) => {
                    warn!(check = check.name, error = %err, "check failed");
                    failures.push(FailedUnit {
                        name: check.name.to_string(),
                        message: err.to_string(),
                    });
                }
            }
        }

        SuiteOutcome {
            findings,
            failure: PartialFailure::from_failures(FailureScope::Checks, failures),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::severity::Severity;

    fn one_low(subject: &&str) -> Result<Vec<Finding>, ModuleError> {
        Ok(vec![Finding::new("low", Severity::Low, *subject, "low")])
    }

    fn broken(_: &&str) -> Result<Vec<Finding>, ModuleError> {
        Err(ModuleError::InvalidInput("unparseable".into()))
    }

    fn one_high(subject: &&str) -> Result<Vec<Finding>, ModuleError> {
        Ok(vec![Finding::new("high", Severity::High, *subject, "high")])
    }

    fn suite() -> CheckSuite<&'static str> {
        CheckSuite::new()
            .with_check("first", one_low)
            .with_check("broken", broken)
            .with_check("last", one_high)
    }

    #[test]
    fn continues_past_failing_check() {
        let outcome = suite().run(&"subject", &RunContext::new());
        let checks: Vec<_> = outcome.findings.iter().map(|f| f.check_name.as_str()).collect();
        assert_eq!(checks, vec!["low", "high"]);

        let failure = outcome.failure.expect("broken check should be reported");
        assert_eq!(
            failure.to_string(),
            "some checks failed: broken: invalid input: unparseable"
        );
    }

    #[test]
    fn module_view_is_all_or_nothing() {
        let err = suite()
            .run(&"subject", &RunContext::new())
            .into_result()
            .unwrap_err();
        assert!(err.to_string().starts_with("some checks failed"));

        let clean = CheckSuite::new().with_check("first", one_low);
        let findings = clean
            .run(&"subject", &RunContext::new())
            .into_result()
            .unwrap();
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn cancelled_context_fails_every_check() {
        let ctx = RunContext::new();
        ctx.cancel();
        let outcome = suite().run(&"subject", &ctx);
        assert!(outcome.findings.is_empty());
        let failure = outcome.failure.unwrap();
        assert_eq!(failure.len(), 3);
        assert!(failure.failures.iter().all(|f| f.message == "run cancelled"));
    }

    #[test]
    fn names_keep_insertion_order() {
        assert_eq!(suite().names().collect::<Vec<_>>(), vec!["first", "broken", "last"]);
    }
}

use serde::Serialize;
use thiserror::Error;

/// Which layer produced a [`PartialFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureScope {
    Modules,
    Checks,
}

impl FailureScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Modules => "modules",
            Self::Checks => "checks",
        }
    }
}

/// One failed unit inside a partially failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedUnit {
    pub name: String,
    pub message: String,
}

/// Advisory error returned next to the results of a run in which some units
/// failed and others succeeded. Callers holding the results should not treat
/// it as fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("some {} failed: {}", .scope.as_str(), join_failures(.failures))]
pub struct PartialFailure {
    pub scope: FailureScope,
    pub failures: Vec<FailedUnit>,
}

fn join_failures(failures: &[FailedUnit]) -> String {
    failures
        .iter()
        .map(|unit| format!("{}: {}", unit.name, unit.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl PartialFailure {
    /// Returns `None` when `failures` is empty.
    pub fn from_failures(scope: FailureScope, failures: Vec<FailedUnit>) -> Option<Self> {
        if failures.is_empty() {
            None
        } else {
            Some(Self { scope, failures })
        }
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|unit| unit.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(name: &str, message: &str) -> FailedUnit {
        FailedUnit {
            name: name.into(),
            message: message.into(),
        }
    }

    #[test]
    fn empty_failure_list_is_not_an_error() {
        assert!(PartialFailure::from_failures(FailureScope::Modules, Vec::new()).is_none());
    }

    #[test]
    fn checks_scope_is_named_in_message() {
        let failure = PartialFailure::from_failures(
            FailureScope::Checks,
            vec![unit("risky-expose", "run cancelled")],
        )
        .unwrap();
        assert_eq!(failure.to_string(), "some checks failed: risky-expose: run cancelled");
        let err: anyhow::Error = failure.into();
        assert!(err.downcast_ref::<PartialFailure>().is_some());
    }

    #[test]
    fn display_joins_name_message_pairs() {
        let failure = PartialFailure::from_failures(
            FailureScope::Modules,
            vec![unit("aws", "access denied"), unit("git", "not a repository")],
        )
        .unwrap();
        assert_eq!(
            failure.to_string(),
            "some modules failed: aws: access denied; git: not a repository"
        );
        assert_eq!(failure.names().collect::<Vec<_>>(), vec!["aws", "git"]);
    }
}

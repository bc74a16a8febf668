pub mod dockerfile;
pub mod engine;
pub mod failure;
pub mod filter;
pub mod finding;
pub mod module;
pub mod registry;
pub mod report;
pub mod scoring;
pub mod severity;
pub mod suite;
pub mod terraform;

pub use dockerfile::{DockerModule, DockerOptions};
pub use engine::{Engine, ModuleReport, RunOutcome};
pub use failure::{FailedUnit, FailureScope, PartialFailure};
pub use filter::FilterOptions;
pub use finding::{Finding, Report};
pub use module::{Module, ModuleError, RunContext};
pub use registry::{Registry, RegistryError};
pub use report::{reporter_for, render_summary_json, OutputFormat, Reporter};
pub use scoring::{compute_summary, exit_code, highest_severity, Summary};
pub use severity::{Severity, SeverityParseError};
pub use suite::{CheckSuite, SuiteOutcome};
pub use terraform::{TerraformModule, TerraformOptions};

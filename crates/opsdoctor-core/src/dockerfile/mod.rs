//! Static Dockerfile audit exposed as the `docker` module.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    finding::Finding,
    module::{Module, ModuleError, RunContext},
    suite::{CheckSuite, SuiteOutcome},
};

pub mod checks;
mod parser;

pub use parser::{Instruction, ParsedDockerfile};

pub const MODULE_NAME: &str = "docker";

/// `dockerfile` section of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerOptions {
    pub enabled: bool,
    pub path: PathBuf,
}

impl Default for DockerOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("Dockerfile"),
        }
    }
}

pub fn suite() -> CheckSuite<ParsedDockerfile> {
    CheckSuite::new()
        .with_check("latest-tag", checks::latest_tag)
        .with_check("runs-as-root", checks::runs_as_root)
        .with_check("no-healthcheck", checks::no_healthcheck)
        .with_check("no-multi-stage", checks::no_multi_stage)
        .with_check("risky-expose", checks::risky_expose)
}

pub struct DockerModule {
    path: PathBuf,
    suite: CheckSuite<ParsedDockerfile>,
}

impl DockerModule {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            suite: suite(),
        }
    }

    pub fn from_options(options: &DockerOptions) -> Self {
        Self::new(options.path.clone())
    }

    /// Parse the Dockerfile and run every check. Only a parse failure is an
    /// error; check failures are reported on the outcome.
    pub async fn audit(&self, ctx: &RunContext) -> Result<SuiteOutcome, ModuleError> {
        let parsed = ctx.guard(ParsedDockerfile::load(&self.path)).await?;
        debug!(
            path = %self.path.display(),
            instructions = parsed.instructions.len(),
            "parsed dockerfile"
        );
        Ok(self.suite.run(&parsed, ctx))
    }
}

#[async_trait]
impl Module for DockerModule {
    fn name(&self) -> &str {
        MODULE_NAME
    }

    async fn run(&self, ctx: &RunContext) -> Result<Vec<Finding>, ModuleError> {
        self.audit(ctx).await?.into_result()
    }
}

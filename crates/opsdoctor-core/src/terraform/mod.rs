//! Static Terraform validation exposed as the `terraform` module.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    finding::Finding,
    module::{Module, ModuleError, RunContext},
    suite::{CheckSuite, SuiteOutcome},
};

pub mod checks;

pub const MODULE_NAME: &str = "terraform";

/// `terraform` section of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerraformOptions {
    pub enabled: bool,
    pub dir: PathBuf,
}

impl Default for TerraformOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub contents: String,
}

/// The `*.tf` files found directly inside one directory, sorted by path.
#[derive(Debug, Clone, Default)]
pub struct TerraformSources {
    pub dir: PathBuf,
    pub files: Vec<SourceFile>,
}

impl TerraformSources {
    pub async fn load(dir: impl AsRef<Path>) -> Result<Self, ModuleError> {
        let dir = dir.as_ref();
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|source| ModuleError::io(dir, source))?;

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| ModuleError::io(dir, source))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "tf") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            match tokio::fs::read_to_string(&path).await {
                Ok(contents) => files.push(SourceFile { path, contents }),
                Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable terraform file"),
            }
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            files,
        })
    }
}

pub fn suite() -> CheckSuite<TerraformSources> {
    CheckSuite::new()
        .with_check("provider-version", checks::provider_version)
        .with_check("hardcoded-credentials", checks::hardcoded_credentials)
}

pub struct TerraformModule {
    dir: PathBuf,
    suite: CheckSuite<TerraformSources>,
}

impl TerraformModule {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            suite: suite(),
        }
    }

    pub fn from_options(options: &TerraformOptions) -> Self {
        Self::new(options.dir.clone())
    }

    /// Load the directory and run every check. Only a missing or unreadable
    /// directory is an error.
    pub async fn validate(&self, ctx: &RunContext) -> Result<SuiteOutcome, ModuleError> {
        let sources = ctx.guard(TerraformSources::load(&self.dir)).await?;
        debug!(dir = %self.dir.display(), files = sources.files.len(), "loaded terraform sources");
        Ok(self.suite.run(&sources, ctx))
    }
}

#[async_trait]
impl Module for TerraformModule {
    fn name(&self) -> &str {
        MODULE_NAME
    }

    async fn run(&self, ctx: &RunContext) -> Result<Vec<Finding>, ModuleError> {
        self.validate(ctx).await?.into_result()
    }
}
